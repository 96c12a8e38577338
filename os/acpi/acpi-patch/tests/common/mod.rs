#![allow(dead_code)]

use acpi_patch::checksum;
use acpi_patch::sdt::SdtHeader;
use acpi_patch::{DirEntry, InstallError, PhysMap, SourceError, TableMemory, TableSource};

pub const RSDP_ADDR: u64 = 0x100;
pub const XSDT_ADDR: u64 = 0x200;
pub const FADT_ADDR: u64 = 0x400;
pub const DSDT_ADDR: u64 = 0x600;
pub const APIC_ADDR: u64 = 0x700;
pub const HPET_ADDR: u64 = 0x780;
pub const INSTALL_BASE: u64 = 0x1000;

pub const FADT_LENGTH: u32 = 276;
pub const DSDT_OFFSET: usize = 40;
pub const X_DSDT_OFFSET: usize = 140;

/// A flat byte arena standing in for physical memory. Physical addresses are
/// offsets into the arena; address 0 is never handed out.
pub struct Arena {
    ptr: *mut u8,
    len: usize,
}

impl Arena {
    pub fn new(len: usize) -> Self {
        let boxed = vec![0u8; len].into_boxed_slice();
        let ptr = Box::into_raw(boxed).cast::<u8>();
        Self { ptr, len }
    }

    fn check(&self, paddr: u64, len: usize) -> usize {
        let start = usize::try_from(paddr).expect("address fits usize");
        assert!(start != 0, "null physical address");
        assert!(start + len <= self.len, "access {start:#x}+{len} outside arena");
        start
    }

    pub fn bytes(&self, paddr: u64, len: usize) -> Vec<u8> {
        unsafe { self.map_ro(paddr, len) }.to_vec()
    }

    pub fn write(&self, paddr: u64, bytes: &[u8]) {
        unsafe { self.map_rw(paddr, bytes.len()) }.copy_from_slice(bytes);
    }

    pub fn read_u32(&self, paddr: u64) -> u32 {
        u32::from_le_bytes(self.bytes(paddr, 4).try_into().unwrap())
    }

    pub fn read_u64(&self, paddr: u64) -> u64 {
        u64::from_le_bytes(self.bytes(paddr, 8).try_into().unwrap())
    }

    /// Byte sum of the SDT at `paddr` over its declared length.
    pub fn table_sum(&self, paddr: u64) -> u8 {
        let length = self.read_u32(paddr + 4) as usize;
        checksum::sum(&self.bytes(paddr, length))
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        unsafe {
            drop(Box::from_raw(core::ptr::slice_from_raw_parts_mut(
                self.ptr, self.len,
            )));
        }
    }
}

impl PhysMap for Arena {
    unsafe fn map_ro<'a>(&self, paddr: u64, len: usize) -> &'a [u8] {
        let start = self.check(paddr, len);
        unsafe { core::slice::from_raw_parts(self.ptr.add(start), len) }
    }

    unsafe fn map_rw<'a>(&self, paddr: u64, len: usize) -> &'a mut [u8] {
        let start = self.check(paddr, len);
        unsafe { core::slice::from_raw_parts_mut(self.ptr.add(start), len) }
    }
}

/// Bump allocator over the upper part of the arena.
pub struct Installer<'a> {
    arena: &'a Arena,
    next: u64,
    end: u64,
    pub installed: Vec<(u64, usize)>,
    pub released: Vec<(u64, usize)>,
}

impl<'a> Installer<'a> {
    pub fn new(arena: &'a Arena) -> Self {
        Self {
            arena,
            next: INSTALL_BASE,
            end: arena.len as u64,
            installed: Vec::new(),
            released: Vec::new(),
        }
    }
}

impl TableMemory for Installer<'_> {
    fn install(&mut self, table: &[u8]) -> Result<u64, InstallError> {
        let addr = self.next;
        let end = addr + table.len() as u64;
        if end > self.end {
            return Err(InstallError::OutOfResources { len: table.len() });
        }
        self.arena.write(addr, table);
        self.next = (end + 7) & !7;
        self.installed.push((addr, table.len()));
        Ok(addr)
    }

    unsafe fn release(&mut self, addr: u64, len: usize) {
        self.released.push((addr, len));
    }
}

/// Hands out addresses at and above 4 GiB without backing memory. Useful only
/// where the installed table is never touched through the arena.
pub struct HighMemory {
    next: u64,
    pub installed: Vec<(u64, usize)>,
    pub released: Vec<(u64, usize)>,
}

impl HighMemory {
    pub const BASE: u64 = 0x1_0000_0000;

    pub fn new() -> Self {
        Self {
            next: Self::BASE,
            installed: Vec::new(),
            released: Vec::new(),
        }
    }
}

impl TableMemory for HighMemory {
    fn install(&mut self, table: &[u8]) -> Result<u64, InstallError> {
        let addr = self.next;
        self.next = (addr + table.len() as u64 + 7) & !7;
        self.installed.push((addr, table.len()));
        Ok(addr)
    }

    unsafe fn release(&mut self, addr: u64, len: usize) {
        self.released.push((addr, len));
    }
}

/// Build an SDT with the given signature and declared length inside a buffer
/// of `buffer` bytes. The checksum is fixed whenever the declared length fits.
pub fn table(signature: &[u8; 4], length: u32, buffer: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; buffer];
    let header = buffer.min(SdtHeader::SIZE);
    let mut head = [0u8; SdtHeader::SIZE];
    head[0..4].copy_from_slice(signature);
    head[4..8].copy_from_slice(&length.to_le_bytes());
    head[8] = 2;
    head[10..16].copy_from_slice(b"TESTOE");
    head[16..24].copy_from_slice(b"PATCHTBL");
    bytes[..header].copy_from_slice(&head[..header]);
    for (i, b) in bytes.iter_mut().enumerate().skip(SdtHeader::SIZE) {
        *b = (i % 251) as u8;
    }
    let length = length as usize;
    if (SdtHeader::SIZE..=buffer).contains(&length) {
        checksum::fix(&mut bytes[..length], SdtHeader::CHECKSUM_OFFSET);
    }
    bytes
}

pub struct Firmware {
    pub arena: Arena,
}

impl Firmware {
    /// RSDP → XSDT [FACP, APIC, HPET] → FADT → DSDT.
    pub fn standard() -> Self {
        Self::with_entries(&[FADT_ADDR, APIC_ADDR, HPET_ADDR], FADT_LENGTH)
    }

    pub fn with_entries(entries: &[u64], fadt_length: u32) -> Self {
        let arena = Arena::new(0x4_0000);
        let fw = Self { arena };

        fw.write_rsdp(2, XSDT_ADDR);
        fw.write_xsdt(b"XSDT", entries);

        let mut fadt = table(b"FACP", fadt_length, fadt_length as usize);
        fadt[DSDT_OFFSET..DSDT_OFFSET + 4].copy_from_slice(&(DSDT_ADDR as u32).to_le_bytes());
        if fadt.len() >= X_DSDT_OFFSET + 8 {
            fadt[X_DSDT_OFFSET..X_DSDT_OFFSET + 8].copy_from_slice(&DSDT_ADDR.to_le_bytes());
        }
        checksum::fix(&mut fadt, SdtHeader::CHECKSUM_OFFSET);
        fw.arena.write(FADT_ADDR, &fadt);

        fw.arena.write(DSDT_ADDR, &table(b"DSDT", 64, 64));
        fw.arena.write(APIC_ADDR, &table(b"APIC", 44, 44));
        fw.arena.write(HPET_ADDR, &table(b"HPET", 56, 56));
        fw
    }

    pub fn write_rsdp(&self, revision: u8, xsdt: u64) {
        let mut rsdp = [0u8; 36];
        rsdp[0..8].copy_from_slice(b"RSD PTR ");
        rsdp[9..15].copy_from_slice(b"TESTOE");
        rsdp[15] = revision;
        rsdp[20..24].copy_from_slice(&36u32.to_le_bytes());
        rsdp[24..32].copy_from_slice(&xsdt.to_le_bytes());
        checksum::fix(&mut rsdp[..20], 8);
        checksum::fix(&mut rsdp, 32);
        self.arena.write(RSDP_ADDR, &rsdp);
    }

    pub fn write_xsdt(&self, signature: &[u8; 4], entries: &[u64]) {
        let length = SdtHeader::SIZE + entries.len() * 8;
        let mut xsdt = table(signature, length as u32, length);
        for (i, entry) in entries.iter().enumerate() {
            let at = SdtHeader::SIZE + i * 8;
            xsdt[at..at + 8].copy_from_slice(&entry.to_le_bytes());
        }
        checksum::fix(&mut xsdt, SdtHeader::CHECKSUM_OFFSET);
        self.arena.write(XSDT_ADDR, &xsdt);
    }

    pub fn xsdt_length(&self) -> u32 {
        self.arena.read_u32(XSDT_ADDR + 4)
    }

    pub fn xsdt_entries(&self) -> Vec<u64> {
        let count = (self.xsdt_length() as usize - SdtHeader::SIZE) / 8;
        (0..count)
            .map(|i| self.arena.read_u64(XSDT_ADDR + (SdtHeader::SIZE + i * 8) as u64))
            .collect()
    }

    pub fn dsdt(&self) -> u32 {
        self.arena.read_u32(FADT_ADDR + DSDT_OFFSET as u64)
    }

    pub fn x_dsdt(&self) -> u64 {
        self.arena.read_u64(FADT_ADDR + X_DSDT_OFFSET as u64)
    }
}

pub struct MemFile {
    pub entry: DirEntry,
    pub bytes: Vec<u8>,
    pub fail_open: bool,
    pub fail_read: bool,
}

/// In-memory stand-in for the `ACPI` directory.
#[derive(Default)]
pub struct MemDir {
    pub files: Vec<MemFile>,
    pub fail_listing: bool,
    opened: Vec<usize>,
}

impl MemDir {
    pub fn with(mut self, name: &str, bytes: Vec<u8>) -> Self {
        self.files.push(MemFile {
            entry: DirEntry {
                name: name.to_string(),
                size: bytes.len() as u64,
                is_hidden: false,
                is_directory: false,
            },
            bytes,
            fail_open: false,
            fail_read: false,
        });
        self
    }

    pub fn failing_listing() -> Self {
        Self {
            fail_listing: true,
            ..Self::default()
        }
    }

    pub fn failing_open(mut self, name: &str) -> Self {
        self = self.with(name, table(b"SSDT", 36, 36));
        self.files.last_mut().unwrap().fail_open = true;
        self
    }

    pub fn failing_read(mut self, name: &str) -> Self {
        self = self.with(name, table(b"SSDT", 36, 36));
        self.files.last_mut().unwrap().fail_read = true;
        self
    }
}

impl TableSource for MemDir {
    type File = usize;

    fn entries(&mut self) -> Result<Vec<DirEntry>, SourceError> {
        if self.fail_listing {
            return Err(SourceError::Device);
        }
        Ok(self.files.iter().map(|f| f.entry.clone()).collect())
    }

    /// Duplicate names are opened in listing order.
    fn open(&mut self, name: &str) -> Result<usize, SourceError> {
        let index = self
            .files
            .iter()
            .enumerate()
            .position(|(i, f)| f.entry.name == name && !self.opened.contains(&i))
            .ok_or(SourceError::NotFound)?;
        self.opened.push(index);
        if self.files[index].fail_open {
            return Err(SourceError::NotFound);
        }
        Ok(index)
    }

    fn read_all(&mut self, file: &mut usize, size: usize) -> Result<Vec<u8>, SourceError> {
        let file = &self.files[*file];
        if file.fail_read {
            return Err(SourceError::Device);
        }
        if file.bytes.len() != size {
            return Err(SourceError::ShortRead {
                read: file.bytes.len(),
                expected: size,
            });
        }
        Ok(file.bytes.clone())
    }
}
