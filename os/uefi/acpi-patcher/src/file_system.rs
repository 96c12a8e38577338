//! # File access for the candidate tables
//!
//! The candidate directory lives next to the patcher image:
//!
//! ```text
//! \EFI\Patcher\acpi-patcher.efi
//! \EFI\Patcher\ACPI\DSDT.aml
//! \EFI\Patcher\ACPI\SSDT-1.aml
//! ```

use acpi_patch::{DirEntry, SourceError, TableSource};
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use log::{debug, trace};
use uefi::proto::device_path::text::{AllowShortcuts, DisplayOnly};
use uefi::proto::loaded_image::LoadedImage;
use uefi::proto::media::file::{Directory, File, FileAttribute, FileMode, RegularFile};
use uefi::{CString16, Status, boot};

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("the loaded image protocol is unavailable")]
    LoadedImage(#[source] uefi::Error),
    #[error("the image carries no usable file path")]
    ImagePath,
    #[error("failed to get the image file system")]
    FileSystem(#[source] uefi::Error),
    #[error("failed to open {0}")]
    Open(String, #[source] uefi::Error),
    #[error("{0} is not a directory")]
    NotADirectory(String),
}

/// The directory holding the candidate `.aml` files.
pub struct AcpiDirectory {
    dir: Directory,
}

impl AcpiDirectory {
    /// Open the subdirectory `name` of the directory the patcher was loaded from.
    ///
    /// # Errors
    /// Any [`DirectoryError`] raised while resolving the image directory or
    /// opening `name` inside it.
    pub fn open(name: &str) -> Result<Self, DirectoryError> {
        let mut own = own_directory()?;
        let dir = open_directory(&mut own, name)?;
        debug!("{name} folder opened successfully");
        Ok(Self { dir })
    }
}

/// The directory containing the running image.
fn own_directory() -> Result<Directory, DirectoryError> {
    let image = boot::image_handle();

    let image_path = {
        let loaded = boot::open_protocol_exclusive::<LoadedImage>(image)
            .map_err(DirectoryError::LoadedImage)?;
        let path = loaded.file_path().ok_or(DirectoryError::ImagePath)?;
        let text = path
            .to_string(DisplayOnly(true), AllowShortcuts(false))
            .map_err(|_| DirectoryError::ImagePath)?;
        String::from(&*text)
    };
    debug!("Image path: {image_path}");

    let mut fs = boot::get_image_file_system(image).map_err(DirectoryError::FileSystem)?;
    let mut volume = fs.open_volume().map_err(DirectoryError::FileSystem)?;

    let parent = parent_directory(&image_path);
    if parent.is_empty() {
        return Ok(volume);
    }
    open_directory(&mut volume, parent)
}

/// Everything before the last path separator, without a leading one.
fn parent_directory(path: &str) -> &str {
    let path = path.trim_start_matches('\\');
    path.rfind('\\').map_or("", |at| &path[..at])
}

fn open_directory(parent: &mut Directory, name: &str) -> Result<Directory, DirectoryError> {
    let path = CString16::try_from(name).map_err(|_| DirectoryError::ImagePath)?;
    parent
        .open(&path, FileMode::Read, FileAttribute::empty())
        .map_err(|e| DirectoryError::Open(String::from(name), e))?
        .into_directory()
        .ok_or_else(|| DirectoryError::NotADirectory(String::from(name)))
}

fn source_error(status: Status) -> SourceError {
    trace!("  File system status: {status:?}");
    match status {
        Status::NOT_FOUND => SourceError::NotFound,
        _ => SourceError::Device,
    }
}

impl TableSource for AcpiDirectory {
    type File = RegularFile;

    fn entries(&mut self) -> Result<Vec<DirEntry>, SourceError> {
        self.dir
            .reset_entry_readout()
            .map_err(|e| source_error(e.status()))?;

        let mut entries = Vec::new();
        while let Some(info) = self
            .dir
            .read_entry_boxed()
            .map_err(|e| source_error(e.status()))?
        {
            let attribute = info.attribute();
            entries.push(DirEntry {
                name: String::from(info.file_name()),
                size: info.file_size(),
                is_hidden: attribute.contains(FileAttribute::HIDDEN),
                is_directory: attribute.contains(FileAttribute::DIRECTORY),
            });
        }
        trace!("End of directory reached");
        Ok(entries)
    }

    fn open(&mut self, name: &str) -> Result<RegularFile, SourceError> {
        let path = CString16::try_from(name).map_err(|_| SourceError::NotFound)?;
        let handle = self
            .dir
            .open(&path, FileMode::Read, FileAttribute::empty())
            .map_err(|e| source_error(e.status()))?;
        trace!("  File opened successfully");
        handle.into_regular_file().ok_or(SourceError::NotAFile)
    }

    fn read_all(&mut self, file: &mut RegularFile, size: usize) -> Result<Vec<u8>, SourceError> {
        let mut buf = vec![0u8; size];
        let mut read = 0;
        while read < size {
            let n = file
                .read(&mut buf[read..])
                .map_err(|e| source_error(e.status()))?;
            if n == 0 {
                break;
            }
            read += n;
        }

        if read != size {
            return Err(SourceError::ShortRead {
                read,
                expected: size,
            });
        }
        Ok(buf)
    }
}
