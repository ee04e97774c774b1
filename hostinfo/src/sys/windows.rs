use super::RawMemoryStatus;
use anyhow::{Context, Result};
use std::{io, iter, mem, os::windows::ffi::OsStrExt, path::Path};
use windows_sys::Win32::{
    Storage::FileSystem::GetDiskFreeSpaceExW,
    System::{
        Memory::{VirtualLock, VirtualUnlock},
        SystemInformation::{GlobalMemoryStatusEx, MEMORYSTATUSEX},
        Threading::{GetCurrentProcess, SetProcessWorkingSetSize},
        WindowsProgramming::GetUserNameW,
    },
};

// UNLEN + 1
const USER_NAME_CAPACITY: usize = 257;

pub fn memory_status() -> Result<RawMemoryStatus> {
    // SAFETY: MEMORYSTATUSEX is plain data; all-zero is a valid value.
    let mut st: MEMORYSTATUSEX = unsafe { mem::zeroed() };
    st.dwLength = mem::size_of::<MEMORYSTATUSEX>() as u32;
    // SAFETY: st is initialised with the right dwLength.
    if unsafe { GlobalMemoryStatusEx(&mut st) } == 0 {
        return Err(io::Error::last_os_error()).context("GlobalMemoryStatusEx");
    }
    Ok(RawMemoryStatus {
        memory_load: st.dwMemoryLoad,
        total_phys: st.ullTotalPhys,
        avail_phys: st.ullAvailPhys,
        total_page_file: st.ullTotalPageFile,
        avail_page_file: st.ullAvailPageFile,
        total_virtual: st.ullTotalVirtual,
        avail_virtual: st.ullAvailVirtual,
        avail_extended_virtual: st.ullAvailExtendedVirtual,
    })
}

pub fn disk_free_bytes(path: &Path) -> Result<u64> {
    let wide: Vec<u16> = path.as_os_str().encode_wide().chain(iter::once(0)).collect();
    let (mut avail, mut total, mut total_free) = (0u64, 0u64, 0u64);
    // SAFETY: wide is NUL-terminated; the out pointers are valid u64s.
    let ok = unsafe { GetDiskFreeSpaceExW(wide.as_ptr(), &mut avail, &mut total, &mut total_free) };
    if ok == 0 {
        return Err(io::Error::last_os_error())
            .with_context(|| format!("GetDiskFreeSpaceExW {}", path.display()));
    }
    Ok(avail)
}

pub fn lock_region(region: &[u8]) -> Result<()> {
    // SAFETY: the slice is a live borrow; VirtualLock only changes residency.
    if unsafe { VirtualLock(region.as_ptr().cast(), region.len()) } == 0 {
        return Err(io::Error::last_os_error()).context("VirtualLock");
    }
    Ok(())
}

pub fn unlock_region(region: &[u8]) -> Result<()> {
    // SAFETY: as for VirtualLock.
    if unsafe { VirtualUnlock(region.as_ptr().cast(), region.len()) } == 0 {
        return Err(io::Error::last_os_error()).context("VirtualUnlock");
    }
    Ok(())
}

pub fn set_working_set_size(min_bytes: usize, max_bytes: usize) -> Result<()> {
    // SAFETY: the pseudo-handle from GetCurrentProcess needs no cleanup.
    let ok = unsafe { SetProcessWorkingSetSize(GetCurrentProcess(), min_bytes, max_bytes) };
    if ok == 0 {
        return Err(io::Error::last_os_error()).context("SetProcessWorkingSetSize");
    }
    Ok(())
}

pub fn user_name() -> Result<String> {
    let mut buf = [0u16; USER_NAME_CAPACITY];
    let mut len = buf.len() as u32;
    // SAFETY: len describes buf's capacity in u16 units.
    if unsafe { GetUserNameW(buf.as_mut_ptr(), &mut len) } == 0 {
        return Err(io::Error::last_os_error()).context("GetUserNameW");
    }
    // len counts the terminating NUL.
    let n = (len as usize).saturating_sub(1).min(buf.len());
    Ok(String::from_utf16_lossy(&buf[..n]))
}
