//! # Patch Configuration

use crate::generation::FirmwareGeneration;

/// How many entries the XSDT may grow by in one session.
///
/// The XSDT is grown in place, so every appended entry lands in memory the
/// firmware must have left unused behind the table. No platform reports the size
/// of that region; these limits are a policy, not a discovered bound.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CapacityPolicy {
    /// Additional entries permitted on UEFI 2.x+ firmware.
    pub modern_extra: u32,
    /// Upper bound for additional entries on EFI 1.x firmware.
    pub legacy_extra: u32,
}

impl CapacityPolicy {
    pub const DEFAULT: Self = Self {
        modern_extra: 16,
        legacy_extra: 8,
    };

    /// Number of entries that may be appended for the given generation.
    #[must_use]
    pub const fn additional(&self, generation: FirmwareGeneration) -> u32 {
        match generation {
            FirmwareGeneration::Modern => self.modern_extra,
            FirmwareGeneration::Legacy => {
                if self.legacy_extra < self.modern_extra {
                    self.legacy_extra
                } else {
                    self.modern_extra
                }
            }
        }
    }

    /// Total entry ceiling for an XSDT currently holding `current` entries.
    #[must_use]
    pub const fn ceiling(&self, generation: FirmwareGeneration, current: u32) -> u32 {
        current.saturating_add(self.additional(generation))
    }
}

impl Default for CapacityPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PatchConfig<'a> {
    /// File name routed to the DSDT replacement path.
    pub dsdt_file_name: &'a str,
    /// Substring a file name must contain to be considered a table.
    pub table_extension: &'a str,
    pub capacity: CapacityPolicy,
    /// Tables larger than this trigger an advisory on EFI 1.x firmware.
    pub legacy_size_warning: u64,
}

impl PatchConfig<'static> {
    pub const DEFAULT: Self = Self {
        dsdt_file_name: "DSDT.aml",
        table_extension: ".aml",
        capacity: CapacityPolicy::DEFAULT,
        legacy_size_warning: 64 * 1024,
    };
}

impl PatchConfig<'_> {
    /// Whether a table of `size` bytes triggers the EFI 1.x size advisory.
    #[must_use]
    pub const fn exceeds_legacy_size(&self, generation: FirmwareGeneration, size: u64) -> bool {
        generation.is_legacy() && size > self.legacy_size_warning
    }
}

impl Default for PatchConfig<'static> {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modern_grows_by_sixteen() {
        let policy = CapacityPolicy::DEFAULT;
        assert_eq!(policy.ceiling(FirmwareGeneration::Modern, 3), 19);
    }

    #[test]
    fn legacy_grows_by_eight() {
        let policy = CapacityPolicy::DEFAULT;
        assert_eq!(policy.ceiling(FirmwareGeneration::Legacy, 3), 11);
    }

    #[test]
    fn legacy_never_exceeds_modern() {
        let policy = CapacityPolicy {
            modern_extra: 4,
            legacy_extra: 8,
        };
        assert_eq!(policy.additional(FirmwareGeneration::Legacy), 4);
    }

    #[test]
    fn legacy_size_advisory_starts_above_64_kib() {
        let config = PatchConfig::DEFAULT;
        assert!(!config.exceeds_legacy_size(FirmwareGeneration::Legacy, 64 * 1024));
        assert!(config.exceeds_legacy_size(FirmwareGeneration::Legacy, 64 * 1024 + 1));
        assert!(!config.exceeds_legacy_size(FirmwareGeneration::Modern, 1 << 20));
    }

    #[test]
    fn ceiling_saturates() {
        let policy = CapacityPolicy::DEFAULT;
        assert_eq!(policy.ceiling(FirmwareGeneration::Modern, u32::MAX - 1), u32::MAX);
    }
}
