//! # Firmware Generation
//!
//! EFI 1.x firmware (e.g. older Mac Pro models) predates the 2.0 revision and
//! tends to reserve less room behind the XSDT. The generation is derived once
//! per session and handed to everything whose behavior depends on it.

use core::fmt;

/// The 32-bit firmware revision as reported in the system table.
///
/// Layout (LSB→MSB):
/// - bits 0..16: minor revision
/// - bits 16..32: major revision
#[bitfield_struct::bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct FirmwareRevision {
    #[bits(16)]
    pub minor: u16,
    #[bits(16)]
    pub major: u16,
}

impl fmt::Display for FirmwareRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} ({:#010x})", self.major(), self.minor(), self.into_bits())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FirmwareGeneration {
    /// EFI 1.x, revision below 2.0.
    Legacy,
    /// UEFI 2.0 or later.
    Modern,
}

impl FirmwareGeneration {
    const MODERN_MAJOR: u16 = 2;

    #[must_use]
    pub const fn classify(revision: FirmwareRevision) -> Self {
        if revision.major() < Self::MODERN_MAJOR {
            Self::Legacy
        } else {
            Self::Modern
        }
    }

    #[must_use]
    pub const fn is_legacy(self) -> bool {
        matches!(self, Self::Legacy)
    }
}
