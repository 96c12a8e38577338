//! # XSDT (Extended System Description Table)
//!
//! A generic SDT header followed by an array of 64-bit table addresses. The
//! entries start at offset 36 and are therefore not naturally aligned.

use crate::error::SetupError;
use crate::fadt::FixedTable;
use crate::rsdp::RootPointer;
use crate::sdt::{OemStr, SdtHeader, Signature};
use crate::{PhysMap, read_u64};
use log::{debug, info, trace, warn};

/// Size of one XSDT entry in bytes.
pub const ENTRY_SIZE: usize = size_of::<u64>();

/// Location of the XSDT as discovered at session start.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ExtendedTable {
    pub addr: u64,
    /// Declared length at discovery time.
    pub length: u32,
}

impl ExtendedTable {
    /// Follow the root pointer to the XSDT and validate its header.
    ///
    /// # Safety
    /// A non-zero XSDT address in `root` must point to a mapped table header.
    ///
    /// # Errors
    /// [`SetupError::NullExtendedTable`] if the root carries no address,
    /// [`SetupError::InvalidExtendedTableSignature`] if the header is not `XSDT`
    /// or cannot be read,
    /// and [`SetupError::MalformedExtendedTable`] if the declared length cannot
    /// even hold the header.
    pub unsafe fn locate(map: &impl PhysMap, root: &RootPointer) -> Result<Self, SetupError> {
        if root.xsdt_addr == 0 {
            return Err(SetupError::NullExtendedTable);
        }

        let Some(header) = (unsafe { SdtHeader::read_at(map, root.xsdt_addr) }) else {
            return Err(SetupError::InvalidExtendedTableSignature);
        };
        if header.signature != Signature::XSDT {
            return Err(SetupError::InvalidExtendedTableSignature);
        }
        if header.byte_len() < SdtHeader::SIZE {
            return Err(SetupError::MalformedExtendedTable {
                length: header.length,
            });
        }

        info!("XSDT validation passed");
        info!("  Size: {:#x} ({} bytes)", header.length, header.length);
        debug!("  Revision: {}", header.revision);
        debug!("  Checksum: {:#04x}", header.checksum);
        debug!("  OEM ID: {}", OemStr(&header.oem_id));

        if (header.byte_len() - SdtHeader::SIZE) % ENTRY_SIZE != 0 {
            warn!(
                "XSDT length {} leaves a partial entry, trailing bytes are ignored",
                header.length
            );
        }

        Ok(Self {
            addr: root.xsdt_addr,
            length: header.length,
        })
    }

    /// Number of complete entries within the declared length.
    #[must_use]
    pub const fn entry_count(&self) -> u32 {
        entry_count(self.length)
    }

    /// First byte past the declared table, where the next entry would go.
    #[must_use]
    pub const fn end_addr(&self) -> u64 {
        self.addr + self.length as u64
    }

    /// Read all entries.
    ///
    /// # Safety
    /// The XSDT must still be mapped over its declared length.
    #[must_use]
    pub unsafe fn entries(&self, map: &impl PhysMap) -> alloc::vec::Vec<u64> {
        let table = unsafe { map.map_ro(self.addr, self.length as usize) };
        table[SdtHeader::SIZE..]
            .chunks_exact(ENTRY_SIZE)
            .map(|entry| read_u64(entry, 0))
            .collect()
    }

    /// Scan the entries in ascending order for the FADT. Zero entries are
    /// skipped; the first `FACP` match wins.
    ///
    /// # Safety
    /// Every non-zero entry must point to a mapped table header.
    ///
    /// # Errors
    /// [`SetupError::FixedTableNotFound`] if no entry refers to a FADT, or
    /// [`SetupError::MalformedFixedTable`] if the match is too short to carry a
    /// DSDT pointer.
    pub unsafe fn find_fixed_table(&self, map: &impl PhysMap) -> Result<FixedTable, SetupError> {
        let entries = unsafe { self.entries(map) };
        debug!("XSDT contains {} entries", entries.len());

        for (index, &entry) in entries.iter().enumerate() {
            if entry == 0 {
                trace!("  Entry {index}: NULL pointer, skipping");
                continue;
            }

            let Some(header) = (unsafe { SdtHeader::read_at(map, entry) }) else {
                warn!("  Entry {index}: {entry:#x} has no readable header, skipping");
                continue;
            };
            trace!(
                "  Entry {index}: {entry:#x} -> Signature: {}, Length: {}",
                header.signature,
                header.length
            );

            if header.signature == Signature::FADT {
                return unsafe { FixedTable::from_header(map, entry, &header) };
            }
        }

        warn!("FADT not found in XSDT (scanned {} entries)", entries.len());
        Err(SetupError::FixedTableNotFound)
    }
}

/// Number of complete entries in an XSDT of the given declared length.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn entry_count(length: u32) -> u32 {
    let length = length as usize;
    if length < SdtHeader::SIZE {
        return 0;
    }
    ((length - SdtHeader::SIZE) / ENTRY_SIZE) as u32
}
