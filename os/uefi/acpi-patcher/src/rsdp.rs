//! # Root System Description Pointer

use uefi::prelude::*;
use uefi::table::cfg::ACPI2_GUID;

/// Returns the physical address of the ACPI 2.0 RSDP if published, else 0.
///
/// The ACPI 1.0 entry is ignored; it carries no XSDT.
pub fn find_rsdp_addr() -> u64 {
    system::with_config_table(|table| {
        table
            .iter()
            .find(|entry| entry.guid == ACPI2_GUID)
            .map_or(0, |entry| entry.address as usize as u64)
    })
}
