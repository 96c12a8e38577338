use acpi_patch::{InstallError, PhysMap, TableMemory};
use core::ptr::{self, NonNull};
use log::{trace, warn};
use uefi::boot::{self, AllocateType, MemoryType, PAGE_SIZE};

/// Boot services run with physical memory identity-mapped.
pub struct IdentityMap;

impl PhysMap for IdentityMap {
    #[allow(clippy::cast_possible_truncation)]
    unsafe fn map_ro<'a>(&self, paddr: u64, len: usize) -> &'a [u8] {
        let ptr = ptr::with_exposed_provenance::<u8>(paddr as usize);
        unsafe { core::slice::from_raw_parts(ptr, len) }
    }

    #[allow(clippy::cast_possible_truncation)]
    unsafe fn map_rw<'a>(&self, paddr: u64, len: usize) -> &'a mut [u8] {
        let ptr = ptr::with_exposed_provenance_mut::<u8>(paddr as usize);
        unsafe { core::slice::from_raw_parts_mut(ptr, len) }
    }
}

/// Installs accepted tables into `ACPI_RECLAIM` pages that stay allocated
/// after the patcher exits, so the operating system finds them in its memory
/// map.
pub struct AcpiReclaimMemory;

impl AcpiReclaimMemory {
    /// Highest address an installed table may occupy, so that the address also
    /// fits the 32-bit `DSDT` field of the FADT.
    const CEILING: u64 = 0xFFFF_FFFF;
}

impl TableMemory for AcpiReclaimMemory {
    fn install(&mut self, table: &[u8]) -> Result<u64, InstallError> {
        let pages = table.len().div_ceil(PAGE_SIZE);
        let base = boot::allocate_pages(
            AllocateType::MaxAddress(Self::CEILING),
            MemoryType::ACPI_RECLAIM,
            pages,
        )
        .map_err(|e| {
            warn!("Failed to allocate {pages} page(s) of ACPI memory: {:?}", e.status());
            InstallError::OutOfResources { len: table.len() }
        })?;

        // SAFETY: freshly allocated, at least `table.len()` bytes.
        unsafe {
            ptr::copy_nonoverlapping(table.as_ptr(), base.as_ptr(), table.len());
        }

        let addr = base.as_ptr().expose_provenance() as u64;
        trace!("  Copied {} bytes to {addr:#x} ({pages} page(s))", table.len());
        Ok(addr)
    }

    #[allow(clippy::cast_possible_truncation)]
    unsafe fn release(&mut self, addr: u64, len: usize) {
        let Some(base) = NonNull::new(ptr::with_exposed_provenance_mut::<u8>(addr as usize)) else {
            return;
        };
        let pages = len.div_ceil(PAGE_SIZE);
        if let Err(e) = unsafe { boot::free_pages(base, pages) } {
            warn!("Failed to release table memory at {addr:#x}: {:?}", e.status());
        }
    }
}
