//! # XSDT Entry List
//!
//! Grows the XSDT in place. The XSDT is never reallocated: each appended entry
//! is written into the scratch memory directly behind the last declared entry,
//! so the number of appends is bounded by a [`CapacityPolicy`] ceiling checked
//! before every write.
//!
//! ```text
//!  xsdt_addr                          next_free        region_end
//!  ├── header (36) ──┼── entries ──────┼── scratch ──────┤
//!                     0 .. entries      entries .. capacity
//! ```

use crate::config::CapacityPolicy;
use crate::error::CandidateError;
use crate::generation::FirmwareGeneration;
use crate::sdt::SdtHeader;
use crate::xsdt::{ENTRY_SIZE, ExtendedTable};
use crate::{PhysMap, read_u32, write_u32, write_u64};
use log::trace;

#[derive(Debug, Clone)]
pub struct TableList {
    xsdt_addr: u64,
    entries: u32,
    capacity: u32,
    next_free: u64,
}

impl TableList {
    #[must_use]
    pub const fn new(
        xsdt: &ExtendedTable,
        generation: FirmwareGeneration,
        policy: &CapacityPolicy,
    ) -> Self {
        let entries = xsdt.entry_count();
        Self {
            xsdt_addr: xsdt.addr,
            entries,
            capacity: policy.ceiling(generation, entries),
            // Partial trailing bytes are dropped: the next entry directly
            // follows the last complete one.
            next_free: xsdt.addr + (SdtHeader::SIZE + entries as usize * ENTRY_SIZE) as u64,
        }
    }

    #[must_use]
    pub const fn entries(&self) -> u32 {
        self.entries
    }

    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    #[must_use]
    pub const fn available(&self) -> u32 {
        self.capacity - self.entries
    }

    #[must_use]
    pub const fn has_room(&self) -> bool {
        self.entries < self.capacity
    }

    /// Address the next entry will be written to.
    #[must_use]
    pub const fn next_free(&self) -> u64 {
        self.next_free
    }

    /// Append a table address to the XSDT.
    ///
    /// The slot is written before the declared length grows, so the length
    /// never covers an unwritten slot. The new length is derived from the entry
    /// count, which also drops any partial trailing bytes the firmware left behind.
    ///
    /// # Safety
    /// The XSDT header and the scratch region up to the capacity ceiling must be
    /// mapped writable.
    ///
    /// # Errors
    /// [`CandidateError::CapacityExceeded`] once the ceiling is reached; the
    /// XSDT is left untouched.
    #[allow(clippy::cast_possible_truncation)]
    pub unsafe fn append(
        &mut self,
        map: &impl PhysMap,
        table_addr: u64,
    ) -> Result<(), CandidateError> {
        if !self.has_room() {
            return Err(CandidateError::CapacityExceeded {
                capacity: self.capacity,
            });
        }

        trace!("  Adding table to XSDT entry {}", self.entries);
        trace!("  XSDT entry address: {:#x}", self.next_free);

        let slot = unsafe { map.map_rw(self.next_free, ENTRY_SIZE) };
        write_u64(slot, 0, table_addr);

        let length_field = unsafe {
            map.map_rw(self.xsdt_addr + SdtHeader::LENGTH_OFFSET as u64, size_of::<u32>())
        };
        let old_length = read_u32(length_field, 0);
        let length = (SdtHeader::SIZE + (self.entries as usize + 1) * ENTRY_SIZE) as u32;
        write_u32(length_field, 0, length);

        self.next_free += ENTRY_SIZE as u64;
        self.entries += 1;

        trace!("  New XSDT length: {old_length} -> {length} bytes");
        trace!("  New XSDT end: {:#x}", self.next_free);
        Ok(())
    }
}
