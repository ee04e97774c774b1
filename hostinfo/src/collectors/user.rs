use crate::{reading::Reading, sys};
use anyhow::Result;
use tracing::debug;

/// Substituted when the OS has no usable answer.
pub const DEFAULT_USER_NAME: &str = "player";

/// Something that can name the current user.
pub trait IdentitySource {
    fn user_name(&self) -> Result<String>;
}

/// The operating system's account database.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsIdentity;

impl IdentitySource for OsIdentity {
    fn user_name(&self) -> Result<String> {
        sys::user_name()
    }
}

pub fn probe_current_user_with<S: IdentitySource + ?Sized>(source: &S, default: &str) -> Reading<String> {
    match source.user_name() {
        Ok(name) if !name.is_empty() => Reading::measured(name),
        Ok(_) => {
            debug!(default, "identity source returned an empty name");
            Reading::fallback(default.to_owned())
        }
        Err(e) => {
            debug!(error = ?e, default, "user name query failed");
            Reading::fallback(default.to_owned())
        }
    }
}

pub fn current_user() -> String {
    probe_current_user_with(&OsIdentity, DEFAULT_USER_NAME).into_value()
}
