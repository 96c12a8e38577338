//! # Checksum Finalizer
//!
//! Every ACPI structure carries a one-byte checksum chosen so that the unsigned
//! sum of all bytes within its declared length is zero modulo 256.

use crate::PhysMap;
use crate::sdt::SdtHeader;

/// Sum all bytes modulo 256.
#[must_use]
pub fn sum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |a, &b| a.wrapping_add(b))
}

/// Recompute the checksum of a structure in a byte buffer in place.
///
/// Returns the previous and the new checksum byte.
pub fn fix(bytes: &mut [u8], field: usize) -> (u8, u8) {
    let old = bytes[field];
    bytes[field] = 0;
    let new = sum(bytes).wrapping_neg();
    bytes[field] = new;
    (old, new)
}

/// Recompute the header checksum of the SDT at `paddr` over its declared length.
///
/// Returns the previous and the new checksum byte, or `None` if the header or
/// the declared range cannot be mapped. Nothing is written in that case.
///
/// # Safety
/// `paddr` must point to a mapped SDT whose declared length is readable and writable.
#[must_use]
pub unsafe fn recompute(map: &impl PhysMap, paddr: u64) -> Option<(u8, u8)> {
    let length = unsafe { SdtHeader::read_at(map, paddr) }?.byte_len();
    if length < SdtHeader::SIZE {
        return None;
    }
    let table = unsafe { map.map_rw(paddr, length) };
    if table.len() != length {
        return None;
    }
    Some(fix(table, SdtHeader::CHECKSUM_OFFSET))
}
