use crate::{reading::Reading, sys};
use std::path::Path;
use tracing::debug;

/// Reported when the volume cannot be queried. Historical value, kept as is.
pub const DEFAULT_DISK_FREE_MB: u64 = 26;

/// Megabytes available to the caller on the volume holding `path`.
pub fn probe_drive_free_space_mb(path: impl AsRef<Path>, fallback_mb: u64) -> Reading<u64> {
    let path = path.as_ref();
    match sys::disk_free_bytes(path) {
        Ok(bytes) => Reading::measured(bytes).map(|b| (b as f64 / (1024.0 * 1024.0)) as u64),
        Err(e) => {
            debug!(path = %path.display(), error = ?e, fallback_mb, "free space query failed");
            Reading::fallback(fallback_mb)
        }
    }
}

pub fn drive_free_space_mb(path: impl AsRef<Path>) -> u64 {
    probe_drive_free_space_mb(path, DEFAULT_DISK_FREE_MB).into_value()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_reports_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("no").join("such").join("dir");
        assert_eq!(drive_free_space_mb(&gone), DEFAULT_DISK_FREE_MB);
        let r = probe_drive_free_space_mb(&gone, 7);
        assert_eq!(r, Reading::fallback(7));
    }

    #[cfg(unix)]
    #[test]
    fn directory_on_root_volume_is_measured() {
        let disks = sysinfo::Disks::new_with_refreshed_list();
        if disks.iter().any(|d| d.mount_point() == Path::new("/")) {
            let r = probe_drive_free_space_mb("/", DEFAULT_DISK_FREE_MB);
            assert!(r.is_measured());
        }
    }

    #[cfg(windows)]
    #[test]
    fn existing_directory_is_measured() {
        let dir = tempfile::tempdir().unwrap();
        let r = probe_drive_free_space_mb(dir.path(), DEFAULT_DISK_FREE_MB);
        assert!(r.is_measured());
    }

    #[cfg(unix)]
    #[test]
    fn interior_nul_reports_fallback() {
        assert_eq!(drive_free_space_mb("bad\0path"), DEFAULT_DISK_FREE_MB);
    }
}
