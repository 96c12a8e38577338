//! # Error Taxonomy
//!
//! Setup faults abort the session, candidate faults skip a single file.

/// Faults that prevent a patch session from starting. Nothing has been mutated
/// when one of these is returned.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    #[error("no ACPI 2.0 root system description pointer is available")]
    RootNotFound,
    #[error("the root system description pointer has an invalid signature")]
    InvalidRootSignature,
    #[error("the root system description pointer carries no XSDT address")]
    NullExtendedTable,
    #[error("the XSDT has an invalid signature")]
    InvalidExtendedTableSignature,
    #[error("the XSDT declares a length of {length} bytes, below the header size")]
    MalformedExtendedTable { length: u32 },
    #[error("no FADT is referenced by the XSDT")]
    FixedTableNotFound,
    #[error("the FADT declares a length of {length} bytes, too short for a DSDT pointer")]
    MalformedFixedTable { length: u32 },
    #[error("the ACPI table directory could not be opened")]
    DirectoryUnavailable,
    #[error("the ACPI table directory could not be listed: {0}")]
    ListingFailed(#[source] SourceError),
}

/// Reasons a candidate buffer fails the generic SDT header contract.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("buffer of {len} bytes cannot hold an SDT header")]
    MalformedInput { len: usize },
    #[error("table signature is zero")]
    InvalidSignature,
    #[error("declared table length {length} is below the SDT header size")]
    LengthTooSmall { length: u32 },
    #[error("declared table length {length} exceeds the buffer of {buffer} bytes")]
    LengthExceedsBuffer { length: u32, buffer: usize },
}

/// Failures reported by a [`TableSource`](crate::patcher::TableSource).
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("not found")]
    NotFound,
    #[error("not a regular file")]
    NotAFile,
    #[error("short read: {read} of {expected} bytes")]
    ShortRead { read: usize, expected: usize },
    #[error("device error")]
    Device,
}

/// Failures reported by a [`TableMemory`](crate::patcher::TableMemory).
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InstallError {
    #[error("out of memory for a {len} byte table")]
    OutOfResources { len: usize },
}

/// Per-candidate faults. The candidate is skipped and the session continues.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CandidateError {
    #[error("failed to open file: {0}")]
    Open(#[source] SourceError),
    #[error("failed to read file: {0}")]
    Read(#[source] SourceError),
    #[error("file of {size} bytes is too large for this architecture")]
    SizeUnsupported { size: u64 },
    #[error("invalid ACPI table: {0}")]
    Invalid(#[from] ValidationError),
    #[error("maximum XSDT entries reached ({capacity})")]
    CapacityExceeded { capacity: u32 },
    #[error("failed to install table: {0}")]
    Install(#[from] InstallError),
    #[error("table address {address:#x} does not fit the 32-bit DSDT field")]
    DsdtAddressOutOfRange { address: u64 },
}
