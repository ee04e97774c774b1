use crate::sys;
use anyhow::Result;
use tracing::debug;

/// Pins `region` in physical memory. Returns whether the OS agreed.
pub fn lock_memory(region: &[u8]) -> bool {
    match sys::lock_region(region) {
        Ok(()) => true,
        Err(e) => {
            debug!(len = region.len(), error = ?e, "lock failed");
            false
        }
    }
}

pub fn unlock_memory(region: &[u8]) -> bool {
    match sys::unlock_region(region) {
        Ok(()) => true,
        Err(e) => {
            debug!(len = region.len(), error = ?e, "unlock failed");
            false
        }
    }
}

/// A region that stays locked for as long as the guard lives.
#[derive(Debug)]
pub struct LockedRegion<'a> {
    region: &'a [u8],
}

impl<'a> LockedRegion<'a> {
    /// Returns `None` when the OS refuses the lock.
    pub fn new(region: &'a [u8]) -> Option<Self> {
        lock_memory(region).then_some(Self { region })
    }

    pub fn len(&self) -> usize {
        self.region.len()
    }

    pub fn is_empty(&self) -> bool {
        self.region.is_empty()
    }
}

impl Drop for LockedRegion<'_> {
    fn drop(&mut self) {
        unlock_memory(self.region);
    }
}

pub fn try_set_working_set_size(min_bytes: usize, max_bytes: usize) -> Result<()> {
    sys::set_working_set_size(min_bytes, max_bytes)
}

/// Advises the OS of working-set bounds for this process. Best-effort; on
/// Linux the kernel ignores the resulting RSS limit.
pub fn set_working_set_size(min_bytes: usize, max_bytes: usize) {
    if let Err(e) = try_set_working_set_size(min_bytes, max_bytes) {
        debug!(min_bytes, max_bytes, error = ?e, "working set request ignored");
    }
}
