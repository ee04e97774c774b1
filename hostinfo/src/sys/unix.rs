use super::{memory_load, RawMemoryStatus};
use anyhow::{anyhow, bail, Context, Result};
use std::{io, mem::MaybeUninit, path::Path};
use sysinfo::{Disks, System};

// Size of the user half of the address space on common 64-bit targets.
#[cfg(target_pointer_width = "64")]
const USER_ADDRESS_SPACE: u64 = 1 << 47;
#[cfg(not(target_pointer_width = "64"))]
const USER_ADDRESS_SPACE: u64 = 1 << 32;

pub fn memory_status() -> Result<RawMemoryStatus> {
    let mut sys = System::new();
    sys.refresh_memory();
    let total_phys = sys.total_memory();
    if total_phys == 0 {
        bail!("sysinfo reported zero physical memory");
    }
    let avail_phys = sys.available_memory();

    let total_virtual = address_space_limit().unwrap_or(USER_ADDRESS_SPACE);
    let pid = sysinfo::get_current_pid().map_err(|e| anyhow!(e))?;
    sys.refresh_process(pid);
    let used_virtual = sys.process(pid).map(|p| p.virtual_memory()).unwrap_or(0);

    // Page file follows the commit-limit convention: physical plus swap.
    Ok(RawMemoryStatus {
        memory_load: memory_load(total_phys, avail_phys),
        total_phys,
        avail_phys,
        total_page_file: total_phys.saturating_add(sys.total_swap()),
        avail_page_file: avail_phys.saturating_add(sys.free_swap()),
        total_virtual,
        avail_virtual: total_virtual.saturating_sub(used_virtual),
        avail_extended_virtual: 0,
    })
}

#[allow(clippy::unnecessary_cast)]
fn address_space_limit() -> Option<u64> {
    let mut lim = MaybeUninit::<libc::rlimit>::uninit();
    // SAFETY: getrlimit writes a full rlimit on success.
    let rc = unsafe { libc::getrlimit(libc::RLIMIT_AS, lim.as_mut_ptr()) };
    if rc != 0 {
        return None;
    }
    // SAFETY: rc == 0 means the struct was initialised.
    let lim = unsafe { lim.assume_init() };
    if lim.rlim_cur == libc::RLIM_INFINITY {
        return None;
    }
    Some((lim.rlim_cur as u64).min(USER_ADDRESS_SPACE))
}

pub fn disk_free_bytes(path: &Path) -> Result<u64> {
    let path = path
        .canonicalize()
        .with_context(|| format!("resolving {}", path.display()))?;
    let disks = Disks::new_with_refreshed_list();
    let mounts = disks.iter().map(|d| (d.mount_point(), d.available_space()));
    volume_available(&path, mounts)
        .with_context(|| format!("no mounted volume holds {}", path.display()))
}

/// Available bytes of the mount with the longest prefix of `path`.
fn volume_available<'a>(path: &Path, mounts: impl IntoIterator<Item = (&'a Path, u64)>) -> Option<u64> {
    mounts
        .into_iter()
        .filter(|(mount, _)| path.starts_with(mount))
        .max_by_key(|(mount, _)| mount.components().count())
        .map(|(_, avail)| avail)
}

pub fn lock_region(region: &[u8]) -> Result<()> {
    // SAFETY: the slice is a live borrow; mlock only changes residency.
    let rc = unsafe { libc::mlock(region.as_ptr().cast(), region.len()) };
    if rc != 0 {
        return Err(io::Error::last_os_error()).context("mlock");
    }
    Ok(())
}

pub fn unlock_region(region: &[u8]) -> Result<()> {
    // SAFETY: as for mlock.
    let rc = unsafe { libc::munlock(region.as_ptr().cast(), region.len()) };
    if rc != 0 {
        return Err(io::Error::last_os_error()).context("munlock");
    }
    Ok(())
}

/// Unix has no working-set minimum; the maximum becomes the soft RSS limit,
/// clamped to the hard limit. Linux has ignored `RLIMIT_RSS` since 2.6, so
/// there the call succeeds without bounding anything.
pub fn set_working_set_size(_min_bytes: usize, max_bytes: usize) -> Result<()> {
    let mut lim = MaybeUninit::<libc::rlimit>::uninit();
    // SAFETY: getrlimit writes a full rlimit on success.
    if unsafe { libc::getrlimit(libc::RLIMIT_RSS, lim.as_mut_ptr()) } != 0 {
        return Err(io::Error::last_os_error()).context("getrlimit(RLIMIT_RSS)");
    }
    // SAFETY: getrlimit succeeded.
    let mut lim = unsafe { lim.assume_init() };
    lim.rlim_cur = (max_bytes as libc::rlim_t).min(lim.rlim_max);
    // SAFETY: lim is a valid rlimit.
    if unsafe { libc::setrlimit(libc::RLIMIT_RSS, &lim) } != 0 {
        return Err(io::Error::last_os_error()).context("setrlimit(RLIMIT_RSS)");
    }
    Ok(())
}

pub fn user_name() -> Result<String> {
    let name = users::get_current_username().context("no passwd entry for the current uid")?;
    Ok(name.to_string_lossy().into_owned())
}
