//! # Patch Orchestration
//!
//! Walks the candidate files of a [`TableSource`] and routes every accepted
//! table either to the DSDT replacement or to the XSDT append path.
//!
//! ```text
//! entries() ─→ filter ─┬─ skipped (hidden, "_" prefix, not *.aml, directory)
//!                      └─ processed ─→ open/read ─→ validate ─┬─ DSDT.aml ─→ FADT.{DSDT,X_DSDT}
//!                                                             └─ other    ─→ XSDT entry
//! ```
//!
//! Per-candidate failures are logged, recorded in the [`PatchSummary`] and
//! skipped; checksums are recomputed once after the last candidate.

use crate::PhysMap;
use crate::config::PatchConfig;
use crate::error::{CandidateError, InstallError, SetupError, SourceError};
use crate::sdt;
use crate::session::PatchSession;
use alloc::string::String;
use alloc::vec::Vec;
use log::{error, info, trace, warn};

/// One directory entry as listed by a [`TableSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub size: u64,
    pub is_hidden: bool,
    pub is_directory: bool,
}

/// File access for the directory holding the candidate tables.
pub trait TableSource {
    /// An open file; closed when dropped.
    type File;

    /// List the directory from the start.
    ///
    /// # Errors
    /// Any failure while enumerating the directory.
    fn entries(&mut self) -> Result<Vec<DirEntry>, SourceError>;

    /// Open a file of this directory by name.
    ///
    /// # Errors
    /// [`SourceError::NotFound`] or any other open failure.
    fn open(&mut self, name: &str) -> Result<Self::File, SourceError>;

    /// Read exactly `size` bytes from the start of `file`.
    ///
    /// # Errors
    /// Any read failure, including a short read.
    fn read_all(&mut self, file: &mut Self::File, size: usize) -> Result<Vec<u8>, SourceError>;
}

/// Permanent storage for accepted tables.
pub trait TableMemory {
    /// Copy `table` into memory that outlives the firmware session and return
    /// its physical address.
    ///
    /// # Errors
    /// [`InstallError::OutOfResources`] if no suitable memory is available.
    fn install(&mut self, table: &[u8]) -> Result<u64, InstallError>;

    /// Return an installed table that could not be linked.
    ///
    /// # Safety
    /// `addr` and `len` must describe a table returned by [`TableMemory::install`]
    /// that is not referenced by any ACPI structure.
    unsafe fn release(&mut self, addr: u64, len: usize);
}

/// Where an accepted directory entry is linked.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Route {
    /// Replaces the DSDT referenced by the FADT.
    Dsdt,
    /// Appended to the XSDT.
    Table,
}

impl Route {
    /// Filter a directory entry: names starting with `.` or `_`, names without
    /// the table extension and directories are skipped (`None`). The exact DSDT
    /// file name replaces the DSDT; everything else is appended.
    #[must_use]
    pub fn classify(entry: &DirEntry, config: &PatchConfig<'_>) -> Option<Self> {
        if entry.name.starts_with('.')
            || entry.name.starts_with('_')
            || !entry.name.contains(config.table_extension)
            || entry.is_directory
        {
            None
        } else if entry.name == config.dsdt_file_name {
            Some(Self::Dsdt)
        } else {
            Some(Self::Table)
        }
    }
}

/// A candidate that was processed but not linked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub name: String,
    pub error: CandidateError,
}

/// Outcome of a session whose setup succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchSummary {
    /// Entries that passed the filter.
    pub processed: u32,
    /// Entries rejected by the filter.
    pub skipped: u32,
    /// Tables appended to the XSDT plus DSDT replacements.
    pub added: u32,
    pub dsdt_replaced: bool,
    /// XSDT entry count after the session.
    pub final_entries: u32,
    pub rejected: Vec<Rejection>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Linked {
    Dsdt,
    Entry(u64),
}

impl PatchSession<'_> {
    /// Process every candidate of `source` and finalize checksums.
    ///
    /// # Safety
    /// The structures located by this session must be mapped writable through
    /// `map`, including the scratch region behind the XSDT up to the capacity
    /// ceiling.
    ///
    /// # Errors
    /// [`SetupError::ListingFailed`] if the directory cannot be listed. This
    /// happens before any mutation.
    pub unsafe fn apply<S: TableSource>(
        mut self,
        map: &impl PhysMap,
        memory: &mut impl TableMemory,
        source: &mut S,
    ) -> Result<PatchSummary, SetupError> {
        info!("Starting ACPI patching process...");
        info!("Scanning ACPI directory for {} files...", self.config.table_extension);

        let entries = source.entries().map_err(SetupError::ListingFailed)?;
        let mut summary = PatchSummary::default();

        for entry in &entries {
            trace!("Found directory entry: {}", entry.name);
            trace!("  File size: {} bytes", entry.size);
            trace!("  Hidden: {}, Directory: {}", entry.is_hidden, entry.is_directory);

            let Some(route) = Route::classify(entry, &self.config) else {
                trace!("  Skipping file: {}", entry.name);
                summary.skipped += 1;
                continue;
            };

            info!("Processing file: {} ({} bytes)", entry.name, entry.size);
            summary.processed += 1;

            match unsafe { self.ingest(map, memory, source, entry, route) } {
                Ok(Linked::Dsdt) => {
                    summary.added += 1;
                    summary.dsdt_replaced = true;
                }
                Ok(Linked::Entry(addr)) => {
                    info!("  Added table at address: {addr:#x}");
                    summary.added += 1;
                }
                Err(e) => {
                    if matches!(e, CandidateError::CapacityExceeded { .. }) {
                        warn!("{e}, skipping {}", entry.name);
                    } else {
                        error!("Failed to process {}: {e}", entry.name);
                    }
                    summary.rejected.push(Rejection {
                        name: entry.name.clone(),
                        error: e,
                    });
                }
            }
        }

        unsafe { self.finalize(map) };
        summary.final_entries = self.tables.entries();

        info!("ACPI patching summary:");
        info!("  Files processed: {}", summary.processed);
        info!("  Files skipped: {}", summary.skipped);
        info!("  Tables added/replaced: {}", summary.added);
        info!("  Final XSDT entries: {}", summary.final_entries);
        Ok(summary)
    }

    unsafe fn ingest<S: TableSource>(
        &mut self,
        map: &impl PhysMap,
        memory: &mut impl TableMemory,
        source: &mut S,
        entry: &DirEntry,
        route: Route,
    ) -> Result<Linked, CandidateError> {
        let size = buffer_size::<usize>(entry.size)?;

        let mut file = source.open(&entry.name).map_err(CandidateError::Open)?;
        let bytes = source.read_all(&mut file, size);
        drop(file);
        let bytes = bytes.map_err(CandidateError::Read)?;

        if self.config.exceeds_legacy_size(self.generation, entry.size) {
            warn!(
                "File {} is {} bytes (>{} KiB) - may have issues on EFI 1.x firmware",
                entry.name,
                entry.size,
                self.config.legacy_size_warning / 1024
            );
            warn!("Consider reducing ACPI table size for better EFI 1.x compatibility");
        }

        let header = sdt::validate(&bytes)?;
        let table = &bytes[..header.byte_len()];

        match route {
            Route::Dsdt => {
                info!("  Processing as DSDT replacement");
                let addr = memory.install(table)?;
                if let Err(e) = unsafe { self.fadt.replace_dsdt(map, addr) } {
                    unsafe { memory.release(addr, table.len()) };
                    return Err(e);
                }
                self.dsdt_replaced = true;
                Ok(Linked::Dsdt)
            }
            Route::Table => {
                if !self.tables.has_room() {
                    return Err(CandidateError::CapacityExceeded {
                        capacity: self.tables.capacity(),
                    });
                }
                let addr = memory.install(table)?;
                if let Err(e) = unsafe { self.tables.append(map, addr) } {
                    unsafe { memory.release(addr, table.len()) };
                    return Err(e);
                }
                Ok(Linked::Entry(addr))
            }
        }
    }
}

/// Convert a reported file size into a buffer length of type `T`.
fn buffer_size<T: TryFrom<u64>>(size: u64) -> Result<T, CandidateError> {
    T::try_from(size).map_err(|_| CandidateError::SizeUnsupported { size })
}
