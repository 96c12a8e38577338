//! # ACPI Table Patching Engine
//!
//! This crate discovers the platform's ACPI table graph in memory and mutates it
//! before an operating system loader consumes it: the DSDT referenced by the FADT
//! can be replaced, and additional description tables (SSDTs and friends) can be
//! appended to the XSDT.
//!
//! ## Architecture
//!
//! ```text
//! UEFI Configuration Table (ACPI 2.0 GUID)
//!     ↓
//! RSDP ("RSD PTR ")            rsdp::RootPointer         read-only
//!     ↓
//! XSDT ("XSDT")                xsdt::ExtendedTable       entries appended in place
//!     ↓
//! FADT ("FACP")                fadt::FixedTable          DSDT pointers replaced
//!     ↓
//! DSDT, SSDT, ...
//! ```
//!
//! A [`session::PatchSession`] is built once by locating the three root
//! structures. [`session::PatchSession::apply`] then walks the candidate files
//! exposed through a [`patcher::TableSource`], validates each against the generic
//! SDT header contract ([`sdt::validate`]), and either replaces the DSDT or
//! appends the table address to the XSDT through a capacity-bounded
//! [`table_list::TableList`]. Checksums of every mutated structure are
//! recomputed at the end ([`checksum::recompute`]).
//!
//! ## Memory Access
//!
//! Firmware structures are addressed physically and mapped on demand through
//! [`PhysMap`]. Nothing holds a reference into firmware memory across a
//! mutation; every operation maps exactly the range it touches. Accepted
//! candidates are copied into permanent memory through
//! [`patcher::TableMemory`] and never released.
//!
//! ## Firmware Generations
//!
//! Older EFI 1.x firmware reserves less scratch space after the XSDT. The
//! [`generation::FirmwareGeneration`] derived from the firmware revision selects
//! the growth limit of the XSDT and enables a size advisory for large tables.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

extern crate alloc;

pub mod checksum;
pub mod config;
pub mod error;
pub mod fadt;
pub mod generation;
pub mod hexdump;
pub mod patcher;
pub mod rsdp;
pub mod sdt;
pub mod session;
pub mod table_list;
pub mod xsdt;

pub use config::{CapacityPolicy, PatchConfig};
pub use error::{CandidateError, InstallError, SetupError, SourceError, ValidationError};
pub use generation::{FirmwareGeneration, FirmwareRevision};
pub use patcher::{DirEntry, PatchSummary, TableMemory, TableSource};
pub use session::PatchSession;

/// Map a physical region and return a byte slice for its contents.
/// You provide the implementation (identity map, arena, etc.).
pub trait PhysMap {
    /// # Safety
    /// The implementor must ensure the returned slice is valid for `len` bytes.
    unsafe fn map_ro<'a>(&self, paddr: u64, len: usize) -> &'a [u8];

    /// # Safety
    /// The implementor must ensure the returned slice is valid and writable for
    /// `len` bytes, and the caller must not hold any other slice over the same
    /// range while the returned one is alive.
    unsafe fn map_rw<'a>(&self, paddr: u64, len: usize) -> &'a mut [u8];
}

pub(crate) fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(raw)
}

pub(crate) fn read_u64(bytes: &[u8], offset: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_le_bytes(raw)
}

pub(crate) fn write_u32(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

pub(crate) fn write_u64(bytes: &mut [u8], offset: usize, value: u64) {
    bytes[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}
