//! # FADT (Fixed ACPI Description Table)
//!
//! The FADT references the DSDT twice: through the 32-bit `DSDT` field present
//! since ACPI 1.0, and through the 64-bit `X_DSDT` field added in ACPI 2.0.

use crate::error::{CandidateError, SetupError};
use crate::sdt::SdtHeader;
use crate::{PhysMap, read_u32, read_u64, write_u32, write_u64};
use log::{debug, info, trace};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FixedTable {
    pub addr: u64,
    pub length: u32,
}

/// Current DSDT pointers of a FADT.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DsdtPointers {
    pub dsdt: u32,
    /// `None` if the FADT is too short to carry the field.
    pub x_dsdt: Option<u64>,
}

impl FixedTable {
    const FIRMWARE_CTRL_OFFSET: usize = 36;
    const DSDT_OFFSET: usize = 40;
    const X_FIRMWARE_CTRL_OFFSET: usize = 132;
    const X_DSDT_OFFSET: usize = 140;

    /// Minimum length to carry the 32-bit DSDT field.
    pub const MIN_LENGTH: usize = Self::DSDT_OFFSET + 4;
    /// Minimum length to carry the 64-bit `X_DSDT` field.
    pub const X_DSDT_MIN_LENGTH: usize = Self::X_DSDT_OFFSET + 8;

    /// # Safety
    /// `addr` must point to a FADT mapped over its declared length.
    pub(crate) unsafe fn from_header(
        map: &impl PhysMap,
        addr: u64,
        header: &SdtHeader,
    ) -> Result<Self, SetupError> {
        if header.byte_len() < Self::MIN_LENGTH {
            return Err(SetupError::MalformedFixedTable {
                length: header.length,
            });
        }

        let table = Self {
            addr,
            length: header.length,
        };

        info!("Found FADT at address: {addr:#x}");
        debug!("  FADT length: {} bytes", header.length);
        debug!("  FADT revision: {}", header.revision);

        let pointers = unsafe { table.dsdt_pointers(map) };
        debug!("  Current DSDT (32-bit): {:#x}", pointers.dsdt);
        if let Some(x_dsdt) = pointers.x_dsdt {
            debug!("  Current DSDT (64-bit): {x_dsdt:#x}");
        }

        let bytes = unsafe { map.map_ro(addr, header.byte_len()) };
        trace!(
            "  Firmware Control: {:#x}",
            read_u32(bytes, Self::FIRMWARE_CTRL_OFFSET)
        );
        if bytes.len() >= Self::X_FIRMWARE_CTRL_OFFSET + 8 {
            trace!(
                "  X_Firmware Control: {:#x}",
                read_u64(bytes, Self::X_FIRMWARE_CTRL_OFFSET)
            );
        }

        Ok(table)
    }

    #[must_use]
    pub const fn has_x_dsdt(&self) -> bool {
        self.length as usize >= Self::X_DSDT_MIN_LENGTH
    }

    /// # Safety
    /// The FADT must still be mapped over its declared length.
    #[must_use]
    pub unsafe fn dsdt_pointers(&self, map: &impl PhysMap) -> DsdtPointers {
        let bytes = unsafe { map.map_ro(self.addr, self.length as usize) };
        DsdtPointers {
            dsdt: read_u32(bytes, Self::DSDT_OFFSET),
            x_dsdt: self
                .has_x_dsdt()
                .then(|| read_u64(bytes, Self::X_DSDT_OFFSET)),
        }
    }

    /// Point both DSDT fields at `dsdt_addr`. The checksum is left stale and
    /// must be recomputed before the session ends.
    ///
    /// # Safety
    /// The FADT must be mapped writable over its declared length.
    ///
    /// # Errors
    /// [`CandidateError::DsdtAddressOutOfRange`] if the address cannot be stored
    /// in the 32-bit field. The table is left untouched in that case.
    pub unsafe fn replace_dsdt(
        &self,
        map: &impl PhysMap,
        dsdt_addr: u64,
    ) -> Result<DsdtPointers, CandidateError> {
        let Ok(legacy) = u32::try_from(dsdt_addr) else {
            return Err(CandidateError::DsdtAddressOutOfRange { address: dsdt_addr });
        };

        let old = unsafe { self.dsdt_pointers(map) };
        debug!("  Old DSDT address (32-bit): {:#x}", old.dsdt);
        if let Some(x_dsdt) = old.x_dsdt {
            debug!("  Old DSDT address (64-bit): {x_dsdt:#x}");
        }

        let bytes = unsafe { map.map_rw(self.addr, self.length as usize) };
        write_u32(bytes, Self::DSDT_OFFSET, legacy);
        if self.has_x_dsdt() {
            write_u64(bytes, Self::X_DSDT_OFFSET, dsdt_addr);
        }

        info!("  Updated DSDT address: {dsdt_addr:#x}");
        Ok(old)
    }
}
