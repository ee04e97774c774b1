//! Thin OS bindings. Everything `unsafe` in the crate lives under this module;
//! the collectors above it only see `anyhow::Result` values.

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use unix::*;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use self::windows::*;

/// Raw memory figures in bytes, as the OS reports them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawMemoryStatus {
    pub memory_load: u32,
    pub total_phys: u64,
    pub avail_phys: u64,
    pub total_page_file: u64,
    pub avail_page_file: u64,
    pub total_virtual: u64,
    pub avail_virtual: u64,
    pub avail_extended_virtual: u64,
}

/// Percentage of physical memory in use, 0..=100.
#[cfg_attr(windows, allow(dead_code))]
pub fn memory_load(total: u64, avail: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    let used = total.saturating_sub(avail) as u128;
    (used * 100 / total as u128) as u32
}
