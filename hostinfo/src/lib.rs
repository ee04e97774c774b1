//! Machine introspection queries for the engine: physical RAM, free disk
//! space, video memory, memory statistics, memory locking, working-set
//! bounds and the current user name.
//!
//! Every query is a single blocking OS call that degrades to a fixed default
//! instead of failing. The `probe_*` variants return a [`Reading`] that says
//! whether the value was measured or substituted.

pub mod collectors;
pub mod config;
pub mod logging;
pub mod reading;
mod sys;

pub use collectors::{
    disk::{drive_free_space_mb, probe_drive_free_space_mb, DEFAULT_DISK_FREE_MB},
    lock::{lock_memory, set_working_set_size, try_set_working_set_size, unlock_memory, LockedRegion},
    mem::{current_memory_status, probe_memory_status, system_ram_mb, MemoryStats},
    user::{current_user, probe_current_user_with, IdentitySource, OsIdentity, DEFAULT_USER_NAME},
    video::{video_ram_mb, VideoRamStrategy, DEFAULT_VIDEO_RAM_MB},
    HostSnapshot,
};
pub use reading::{Origin, Reading};
