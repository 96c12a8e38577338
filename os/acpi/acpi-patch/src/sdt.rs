//! # System Description Table Header
//!
//! Every ACPI table except the RSDP starts with the same 36-byte header. This
//! module parses that header and checks candidate buffers against it.

use crate::error::ValidationError;
use crate::hexdump::HexDump;
use crate::{PhysMap, checksum, read_u32};
use core::fmt;
use log::{Level, debug, info, log_enabled, trace, warn};

/// A four-character table signature such as `FACP` or `SSDT`.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Signature(pub [u8; 4]);

impl Signature {
    pub const XSDT: Self = Self(*b"XSDT");
    pub const FADT: Self = Self(*b"FACP");

    #[must_use]
    pub const fn is_zero(self) -> bool {
        u32::from_le_bytes(self.0) == 0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            let c = if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            };
            fmt::Write::write_char(f, c)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

/// Parsed generic SDT header.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SdtHeader {
    pub signature: Signature,
    /// Total length of the table including this header.
    pub length: u32,
    pub revision: u8,
    pub checksum: u8,
    pub oem_id: [u8; 6],
    pub oem_table_id: [u8; 8],
    pub oem_revision: u32,
    pub creator_id: u32,
    pub creator_revision: u32,
}

impl SdtHeader {
    pub const SIZE: usize = 36;
    pub const LENGTH_OFFSET: usize = 4;
    pub const CHECKSUM_OFFSET: usize = 9;

    /// Parse a header from the start of `bytes`.
    ///
    /// Returns `None` if fewer than [`SdtHeader::SIZE`] bytes are available.
    #[must_use]
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }

        let mut signature = [0u8; 4];
        signature.copy_from_slice(&bytes[0..4]);
        let mut oem_id = [0u8; 6];
        oem_id.copy_from_slice(&bytes[10..16]);
        let mut oem_table_id = [0u8; 8];
        oem_table_id.copy_from_slice(&bytes[16..24]);

        Some(Self {
            signature: Signature(signature),
            length: read_u32(bytes, Self::LENGTH_OFFSET),
            revision: bytes[8],
            checksum: bytes[Self::CHECKSUM_OFFSET],
            oem_id,
            oem_table_id,
            oem_revision: read_u32(bytes, 24),
            creator_id: read_u32(bytes, 28),
            creator_revision: read_u32(bytes, 32),
        })
    }

    /// Read the header of the table at `paddr`.
    ///
    /// Returns `None` if the mapping yields fewer than [`SdtHeader::SIZE`] bytes.
    ///
    /// # Safety
    /// `paddr` must point to at least [`SdtHeader::SIZE`] mapped bytes.
    #[must_use]
    pub unsafe fn read_at(map: &impl PhysMap, paddr: u64) -> Option<Self> {
        let bytes = unsafe { map.map_ro(paddr, Self::SIZE) };
        Self::parse(bytes)
    }

    /// Length in bytes, as `usize`.
    #[must_use]
    pub const fn byte_len(&self) -> usize {
        self.length as usize
    }
}

/// Printable view of a fixed-width OEM string.
pub struct OemStr<'a>(pub &'a [u8]);

impl fmt::Display for OemStr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in self.0 {
            if b == 0 {
                break;
            }
            let c = if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '?'
            };
            fmt::Write::write_char(f, c)?;
        }
        Ok(())
    }
}

/// Validate a candidate table buffer against the generic SDT header contract.
///
/// The checks run in order and the first failure is returned. A checksum
/// mismatch is only reported as a warning: the checksum is recomputed once the
/// table is linked into the table graph.
///
/// # Errors
/// Returns the [`ValidationError`] describing the first failed check.
pub fn validate(bytes: &[u8]) -> Result<SdtHeader, ValidationError> {
    trace!("Validating ACPI table buffer, size {} bytes", bytes.len());

    let Some(header) = SdtHeader::parse(bytes) else {
        return Err(ValidationError::MalformedInput { len: bytes.len() });
    };

    info!("  Table signature: {}", header.signature);
    info!("  Table length: {} bytes", header.length);
    info!("  Table revision: {}", header.revision);
    debug!("  OEM ID: {}", OemStr(&header.oem_id));
    debug!("  OEM Table ID: {}", OemStr(&header.oem_table_id));
    debug!("  OEM Revision: {:#x}", header.oem_revision);

    if header.signature.is_zero() {
        return Err(ValidationError::InvalidSignature);
    }

    if header.byte_len() < SdtHeader::SIZE {
        return Err(ValidationError::LengthTooSmall {
            length: header.length,
        });
    }

    if header.byte_len() > bytes.len() {
        return Err(ValidationError::LengthExceedsBuffer {
            length: header.length,
            buffer: bytes.len(),
        });
    }

    let table = &bytes[..header.byte_len()];
    let sum = checksum::sum(table);
    if sum == 0 {
        trace!("  Checksum validation passed");
    } else {
        warn!("ACPI table checksum validation failed ({sum:#04x}), it will be recomputed");
    }

    if log_enabled!(Level::Trace) {
        trace!("{}", HexDump::new(&table[..table.len().min(64)], 0));
    }

    Ok(header)
}
