//! # RSDP/XSDP (Root/Extended System Description Pointer)

use crate::error::SetupError;
use crate::{PhysMap, checksum, read_u32, read_u64};
use log::{debug, warn};

/// Validated ACPI 2.0+ root pointer. Never mutated by the patcher.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RootPointer {
    pub addr: u64,
    pub checksum: u8,
    pub revision: u8,
    pub length: u32,
    pub xsdt_addr: u64,
}

impl RootPointer {
    pub const SIGNATURE: &'static [u8; 8] = b"RSD PTR ";

    /// Size of the ACPI 1.0 portion covered by the legacy checksum.
    const V1_SIZE: usize = 20;
    /// Size of the ACPI 2.0 structure.
    pub const V2_SIZE: usize = 36;

    const CHECKSUM_OFFSET: usize = 8;
    const REVISION_OFFSET: usize = 15;
    const LENGTH_OFFSET: usize = 20;
    const XSDT_OFFSET: usize = 24;

    /// Validate the RSDP at the physical address obtained from the firmware.
    ///
    /// Only the signature is authoritative. A legacy checksum mismatch is
    /// reported but tolerated, as is the case on several shipping firmwares.
    /// A revision below 2 carries no XSDT address; this yields an XSDT address
    /// of zero.
    ///
    /// # Safety
    /// A non-zero `rsdp_addr` must point to at least [`RootPointer::V2_SIZE`]
    /// mapped bytes.
    ///
    /// # Errors
    /// [`SetupError::RootNotFound`] for a zero address and
    /// [`SetupError::InvalidRootSignature`] if the signature does not match.
    pub unsafe fn parse(map: &impl PhysMap, rsdp_addr: u64) -> Result<Self, SetupError> {
        if rsdp_addr == 0 {
            return Err(SetupError::RootNotFound);
        }

        let v1 = unsafe { map.map_ro(rsdp_addr, Self::V1_SIZE) };
        if &v1[0..8] != Self::SIGNATURE {
            return Err(SetupError::InvalidRootSignature);
        }
        debug!("RSDP signature validation passed");

        let sum = checksum::sum(v1);
        if sum != 0 {
            warn!("RSDP checksum mismatch ({sum:#04x}), continuing");
        }

        let revision = v1[Self::REVISION_OFFSET];
        let checksum = v1[Self::CHECKSUM_OFFSET];
        if revision < 2 {
            warn!("RSDP revision {revision} predates ACPI 2.0 and carries no XSDT");
            return Ok(Self {
                addr: rsdp_addr,
                checksum,
                revision,
                length: 0,
                xsdt_addr: 0,
            });
        }

        let v2 = unsafe { map.map_ro(rsdp_addr, Self::V2_SIZE) };
        Ok(Self {
            addr: rsdp_addr,
            checksum,
            revision,
            length: read_u32(v2, Self::LENGTH_OFFSET),
            xsdt_addr: read_u64(v2, Self::XSDT_OFFSET),
        })
    }
}
