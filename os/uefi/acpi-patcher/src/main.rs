//! # ACPI Patcher UEFI Application
//!
//! Runs from the EFI shell or as a boot entry before the operating system
//! loader and patches the firmware's ACPI tables in place with the `.aml` files
//! found in the `ACPI` folder next to the image:
//!
//! ```text
//! firmware revision ─→ generation (EFI 1.x / UEFI 2.x+)
//! configuration table ─→ RSDP ─→ XSDT ─→ FADT        (PatchSession::locate)
//! <image dir>\ACPI\*.aml ─→ DSDT replacement | XSDT append (PatchSession::apply)
//! ```
//!
//! Accepted tables are copied into `ACPI_RECLAIM` memory below 4 GiB. Log
//! output goes to the firmware console and, with the `qemu` feature, to QEMU's
//! debug console. The `verbose` feature raises the log level to `Trace`.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![no_main]
#![allow(unsafe_code)]
extern crate alloc;

mod file_system;
mod logger;
mod memory;
mod rsdp;

use crate::file_system::AcpiDirectory;
use crate::logger::UefiLogger;
use crate::memory::{AcpiReclaimMemory, IdentityMap};
use crate::rsdp::find_rsdp_addr;
use acpi_patch::{
    FirmwareGeneration, FirmwareRevision, PatchConfig, PatchSession, PatchSummary, SetupError,
};
use log::{LevelFilter, debug, error, info, warn};
use uefi::prelude::*;

/// Name of the candidate folder next to the image.
const ACPI_DIRECTORY: &str = "ACPI";

#[cfg(feature = "verbose")]
const MAX_LEVEL: LevelFilter = LevelFilter::Trace;
#[cfg(not(feature = "verbose"))]
const MAX_LEVEL: LevelFilter = LevelFilter::Info;

static LOGGER: UefiLogger = UefiLogger::new(MAX_LEVEL);

#[entry]
fn efi_main() -> Status {
    if uefi::helpers::init().is_err() {
        return Status::UNSUPPORTED;
    }
    if UefiLogger::init(&LOGGER).is_err() {
        return Status::ABORTED;
    }

    info!("=== ACPI Patcher v{} starting ===", env!("CARGO_PKG_VERSION"));
    debug!("Image handle: {:?}", boot::image_handle());
    debug!("Log level: {MAX_LEVEL}");
    if debugcon::is_enabled() {
        debug!("Mirroring log output to the QEMU debug console");
    }

    match run() {
        Ok(summary) => {
            if !summary.rejected.is_empty() {
                warn!("{} file(s) were rejected", summary.rejected.len());
            }
            info!("=== ACPI patching completed successfully ===");
            Status::SUCCESS
        }
        Err(e) => {
            error!("ACPI patching failed: {e}");
            exit_status(e)
        }
    }
}

fn run() -> Result<PatchSummary, SetupError> {
    let revision = FirmwareRevision::from_bits(system::firmware_revision());
    let generation = FirmwareGeneration::classify(revision);
    if generation.is_legacy() {
        info!("Detected EFI 1.x firmware (revision {revision}), applying compatibility limits");
    } else {
        info!("Detected UEFI 2.x+ firmware (revision {revision})");
    }

    let rsdp_addr = find_rsdp_addr();
    let session = unsafe {
        PatchSession::locate(&IdentityMap, rsdp_addr, generation, PatchConfig::DEFAULT)?
    };

    info!("Opening {ACPI_DIRECTORY} folder...");
    let mut directory = AcpiDirectory::open(ACPI_DIRECTORY).map_err(|e| {
        error!("Could not open {ACPI_DIRECTORY} folder: {e}");
        info!("Please ensure '{ACPI_DIRECTORY}' directory exists with .aml files");
        SetupError::DirectoryUnavailable
    })?;

    // SAFETY: boot services identity-map all physical memory, including the
    // firmware's ACPI tables and the scratch space behind the XSDT.
    unsafe { session.apply(&IdentityMap, &mut AcpiReclaimMemory, &mut directory) }
}

/// Exit status reported to the firmware for a fault that aborted the session.
const fn exit_status(error: SetupError) -> Status {
    match error {
        SetupError::RootNotFound
        | SetupError::FixedTableNotFound
        | SetupError::DirectoryUnavailable => Status::NOT_FOUND,
        SetupError::InvalidRootSignature
        | SetupError::NullExtendedTable
        | SetupError::InvalidExtendedTableSignature
        | SetupError::MalformedExtendedTable { .. }
        | SetupError::MalformedFixedTable { .. } => Status::INVALID_PARAMETER,
        SetupError::ListingFailed(_) => Status::DEVICE_ERROR,
    }
}
