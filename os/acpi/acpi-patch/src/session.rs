//! # Patch Session
//!
//! All state of one patch run: the located root structures, the XSDT growth
//! cursor and the firmware generation. Built once by [`PatchSession::locate`]
//! and consumed by [`PatchSession::apply`](crate::patcher).

use crate::PhysMap;
use crate::checksum;
use crate::config::PatchConfig;
use crate::error::SetupError;
use crate::fadt::FixedTable;
use crate::generation::FirmwareGeneration;
use crate::rsdp::RootPointer;
use crate::table_list::TableList;
use crate::xsdt::ExtendedTable;
use log::{debug, error, info};

#[derive(Debug, Clone)]
pub struct PatchSession<'c> {
    pub root: RootPointer,
    pub xsdt: ExtendedTable,
    pub fadt: FixedTable,
    pub(crate) tables: TableList,
    pub(crate) generation: FirmwareGeneration,
    pub(crate) config: PatchConfig<'c>,
    pub(crate) dsdt_replaced: bool,
}

impl<'c> PatchSession<'c> {
    /// Locate RSDP, XSDT and FADT in that order.
    ///
    /// # Safety
    /// `rsdp_addr` must be zero or the address the firmware published for the
    /// ACPI 2.0 RSDP, and the table graph it refers to must be mapped through
    /// `map`.
    ///
    /// # Errors
    /// Any [`SetupError`] raised while locating one of the three structures.
    /// Nothing is mutated.
    pub unsafe fn locate(
        map: &impl PhysMap,
        rsdp_addr: u64,
        generation: FirmwareGeneration,
        config: PatchConfig<'c>,
    ) -> Result<Self, SetupError> {
        info!("Locating RSDP...");
        let root = unsafe { RootPointer::parse(map, rsdp_addr)? };
        info!("Found RSDP at address: {:#x}", root.addr);
        debug!("  Checksum: {:#04x}", root.checksum);
        debug!("  Revision: {}", root.revision);
        debug!("  Length: {}", root.length);

        info!("Locating XSDT...");
        let xsdt = unsafe { ExtendedTable::locate(map, &root)? };
        info!("Found XSDT at address: {:#x}", xsdt.addr);
        debug!("  XSDT end address: {:#x}", xsdt.end_addr());

        info!("Searching for FADT...");
        let fadt = unsafe { xsdt.find_fixed_table(map)? };

        let tables = TableList::new(&xsdt, generation, &config.capacity);
        info!("XSDT analysis:");
        info!("  Current entries: {}", tables.entries());
        info!("  Maximum entries allowed: {}", tables.capacity());
        info!("  Available slots: {}", tables.available());
        if generation.is_legacy() {
            info!(
                "EFI 1.x detected: Limiting additional tables to {}",
                config.capacity.additional(generation)
            );
        }

        Ok(Self {
            root,
            xsdt,
            fadt,
            tables,
            generation,
            config,
            dsdt_replaced: false,
        })
    }

    #[must_use]
    pub const fn tables(&self) -> &TableList {
        &self.tables
    }

    /// Recompute the checksums of the mutated structures: FADT first if its
    /// DSDT pointers changed, then the XSDT.
    ///
    /// # Safety
    /// FADT and XSDT must be mapped writable over their declared lengths.
    pub(crate) unsafe fn finalize(&self, map: &impl PhysMap) {
        info!("Updating table checksums...");
        if self.dsdt_replaced {
            unsafe { Self::update_checksum(map, "FADT", self.fadt.addr) };
        }
        unsafe { Self::update_checksum(map, "XSDT", self.xsdt.addr) };
    }

    /// # Safety
    /// The table at `addr` must be mapped writable over its declared length.
    unsafe fn update_checksum(map: &impl PhysMap, name: &str, addr: u64) {
        match unsafe { checksum::recompute(map, addr) } {
            Some((old, new)) => {
                debug!("{name} checksum: {old:#04x} -> {new:#04x}");
                info!("Updated {name} checksum");
            }
            None => error!("{name} at {addr:#x} could not be mapped, checksum left stale"),
        }
    }
}
