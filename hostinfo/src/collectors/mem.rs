use crate::{reading::Reading, sys};
use serde::Serialize;
use tracing::debug;

const MB: u64 = 1024 * 1024;

/// OS memory figures. Everything is in KiB except `memory_load`, a percentage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemoryStats {
    pub memory_load: u32,
    pub total_physical: u64,
    pub avail_physical: u64,
    pub total_page_file: u64,
    pub avail_page_file: u64,
    pub total_virtual: u64,
    pub avail_virtual: u64,
    pub avail_extended_virtual: u64,
}

impl MemoryStats {
    pub(crate) fn from_raw(raw: &sys::RawMemoryStatus) -> Self {
        Self {
            memory_load: raw.memory_load,
            total_physical: raw.total_phys >> 10,
            avail_physical: raw.avail_phys >> 10,
            total_page_file: raw.total_page_file >> 10,
            avail_page_file: raw.avail_page_file >> 10,
            total_virtual: raw.total_virtual >> 10,
            avail_virtual: raw.avail_virtual >> 10,
            avail_extended_virtual: raw.avail_extended_virtual >> 10,
        }
    }
}

/// Physical memory in MB, snapped to a multiple of 16. The OS total is often a
/// meg or two short of the installed amount.
pub fn ram_mb_from_bytes(total_bytes: u64) -> u32 {
    let mb = (total_bytes / MB).min(u32::MAX as u64 - 15) as u32;
    (mb + 8) & !15
}

pub fn system_ram_mb() -> u32 {
    let total = match sys::memory_status() {
        Ok(raw) => raw.total_phys,
        Err(e) => {
            debug!(error = ?e, "memory status query failed");
            0
        }
    };
    ram_mb_from_bytes(total)
}

pub fn probe_memory_status() -> Reading<MemoryStats> {
    match sys::memory_status() {
        Ok(raw) => Reading::measured(MemoryStats::from_raw(&raw)),
        Err(e) => {
            debug!(error = ?e, "memory status query failed, reporting zeros");
            Reading::fallback(MemoryStats::default())
        }
    }
}

pub fn current_memory_status() -> MemoryStats {
    probe_memory_status().into_value()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rounds_to_nearest_sixteen() {
        assert_eq!(ram_mb_from_bytes(16_382 * MB), 16_384);
        assert_eq!(ram_mb_from_bytes(8_190 * MB + 12_345), 8_192);
        assert_eq!(ram_mb_from_bytes(4_096 * MB), 4_096);
        assert_eq!(ram_mb_from_bytes(0), 0);
    }

    #[test]
    fn system_ram_is_a_multiple_of_sixteen() {
        let mb = system_ram_mb();
        assert_eq!(mb % 16, 0);
        assert!(mb > 0);
    }

    #[test]
    fn raw_bytes_are_reported_in_kib() {
        let raw = sys::RawMemoryStatus {
            memory_load: 42,
            total_phys: 8 * 1024 * MB,
            avail_phys: 3 * 1024 * MB + 1023,
            total_page_file: 12 * 1024 * MB,
            avail_page_file: 5 * MB,
            total_virtual: 1 << 47,
            avail_virtual: (1 << 47) - 4096,
            avail_extended_virtual: 0,
        };
        let s = MemoryStats::from_raw(&raw);
        assert_eq!(s.memory_load, 42);
        assert_eq!(s.total_physical, 8 * 1024 * 1024);
        assert_eq!(s.avail_physical, 3 * 1024 * 1024);
        assert_eq!(s.avail_page_file, 5 * 1024);
        assert_eq!(s.avail_virtual, ((1u64 << 47) - 4096) / 1024);
        assert_eq!(s.avail_extended_virtual, 0);
    }

    #[test]
    fn live_status_is_consistent() {
        let r = probe_memory_status();
        assert!(r.is_measured());
        let s = r.value;
        assert!(s.memory_load <= 100);
        assert!(s.total_physical > 0);
        assert!(s.avail_physical <= s.total_physical);
        assert!(s.total_page_file >= s.avail_page_file);
        assert!(s.total_virtual >= s.avail_virtual);
    }

    proptest! {
        #[test]
        fn rounding_always_lands_on_sixteen(bytes in 0u64..(1u64 << 50)) {
            let mb = ram_mb_from_bytes(bytes);
            prop_assert_eq!(mb % 16, 0);
            prop_assert!((mb as i64 - (bytes / MB) as i64).abs() <= 8);
        }

        #[test]
        fn kib_is_bytes_over_1024(bytes in any::<u64>()) {
            let raw = sys::RawMemoryStatus { total_phys: bytes, ..Default::default() };
            prop_assert_eq!(MemoryStats::from_raw(&raw).total_physical, bytes / 1024);
        }
    }
}
