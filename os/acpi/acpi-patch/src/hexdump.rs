//! # Hex Dump
//!
//! Renders bytes as `offset: hex bytes |ascii|`, 16 bytes per line.

use core::fmt;

pub struct HexDump<'a> {
    bytes: &'a [u8],
    origin: u64,
}

impl<'a> HexDump<'a> {
    const BYTES_PER_LINE: usize = 16;

    /// `origin` is the address printed for the first byte.
    #[must_use]
    pub const fn new(bytes: &'a [u8], origin: u64) -> Self {
        Self { bytes, origin }
    }
}

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Memory dump at {:#x} ({} bytes):", self.origin, self.bytes.len())?;

        let mut offset = self.origin;
        for line in self.bytes.chunks(Self::BYTES_PER_LINE) {
            write!(f, "\n{offset:08x}: ")?;
            for b in line {
                write!(f, "{b:02x} ")?;
            }
            for _ in line.len()..Self::BYTES_PER_LINE {
                f.write_str("   ")?;
            }

            f.write_str(" |")?;
            for &b in line {
                let c = if (32..=126).contains(&b) { b as char } else { '.' };
                fmt::Write::write_char(f, c)?;
            }
            f.write_str("|")?;

            offset += line.len() as u64;
        }
        Ok(())
    }
}
