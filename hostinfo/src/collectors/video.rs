//! Video memory size through a strategy picked once at start-up.
//!
//! `FullQuery` asks the platform's management interface about the first
//! display adapter: CIM `Win32_VideoController.AdapterRAM` on Windows (via
//! PowerShell, then `wmic`), DRM `mem_info_vram_total` in sysfs on Linux.
//! Any failure along the way, or a reported size of zero, yields the default.

use crate::{config::VideoStrategySetting, reading::Reading};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::{fmt, path::Path};
use tracing::{debug, info};

/// Assumed when the adapter cannot be asked: the minimum supported card.
pub const DEFAULT_VIDEO_RAM_MB: u32 = 64;

const MB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoRamStrategy {
    /// No display at all; always 0.
    Headless,
    /// No management interface; always the default.
    BasicDefault,
    /// Ask the management interface, falling back to the default.
    FullQuery,
}

impl VideoRamStrategy {
    pub fn detect(setting: VideoStrategySetting) -> Self {
        let strategy = if cfg!(feature = "headless") {
            Self::Headless
        } else {
            match setting {
                VideoStrategySetting::Headless => Self::Headless,
                VideoStrategySetting::Basic => Self::BasicDefault,
                VideoStrategySetting::Query | VideoStrategySetting::Auto => {
                    if full_query_available() {
                        Self::FullQuery
                    } else {
                        Self::BasicDefault
                    }
                }
            }
        };
        info!(?setting, strategy = %strategy, "video memory strategy selected");
        strategy
    }

    pub fn probe(self, fallback_mb: u32) -> Reading<u32> {
        match self {
            Self::Headless => Reading::measured(0),
            Self::BasicDefault => Reading::fallback(fallback_mb),
            Self::FullQuery => {
                resolve_adapter_ram(query_adapter_ram_bytes(), fallback_mb)
            }
        }
    }
}

impl fmt::Display for VideoRamStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Headless => "headless",
            Self::BasicDefault => "basic-default",
            Self::FullQuery => "full-query",
        })
    }
}

pub fn video_ram_mb() -> u32 {
    VideoRamStrategy::detect(VideoStrategySetting::Auto)
        .probe(DEFAULT_VIDEO_RAM_MB)
        .into_value()
}

fn resolve_adapter_ram(bytes: Result<u64>, fallback_mb: u32) -> Reading<u32> {
    match bytes {
        Ok(b) => match u32::try_from(b / MB) {
            Ok(0) => {
                debug!(bytes = b, fallback_mb, "adapter reported no memory");
                Reading::fallback(fallback_mb)
            }
            Ok(mb) => Reading::measured(mb),
            Err(_) => Reading::measured(u32::MAX),
        },
        Err(e) => {
            debug!(error = ?e, fallback_mb, "adapter memory query failed");
            Reading::fallback(fallback_mb)
        }
    }
}

fn full_query_available() -> bool {
    if !cfg!(feature = "video-query") {
        return false;
    }
    if cfg!(windows) {
        true
    } else if cfg!(target_os = "linux") {
        Path::new(DRM_CLASS_DIR).is_dir()
    } else {
        false
    }
}

const DRM_CLASS_DIR: &str = "/sys/class/drm";

#[cfg(windows)]
fn query_adapter_ram_bytes() -> Result<u64> {
    use std::process::Command;

    let ps = Command::new("powershell")
        .args([
            "-NoProfile",
            "-Command",
            "Get-CimInstance Win32_VideoController | Select-Object -First 1 -ExpandProperty AdapterRAM",
        ])
        .output();
    if let Ok(out) = ps {
        if out.status.success() {
            let text = String::from_utf8_lossy(&out.stdout);
            if let Some(first) = text.lines().map(str::trim).find(|l| !l.is_empty()) {
                return first.parse::<u64>().with_context(|| format!("AdapterRAM {first:?}"));
            }
        }
    }
    // Older systems without Get-CimInstance.
    let out = Command::new("wmic")
        .args(["path", "win32_VideoController", "get", "AdapterRAM", "/value"])
        .output()
        .context("running wmic")?;
    if !out.status.success() {
        bail!("wmic exited with {}", out.status);
    }
    parse_wmic_value(&String::from_utf8_lossy(&out.stdout))
}

#[cfg(not(windows))]
fn query_adapter_ram_bytes() -> Result<u64> {
    let mut cards: Vec<_> = std::fs::read_dir(DRM_CLASS_DIR)
        .with_context(|| format!("reading {DRM_CLASS_DIR}"))?
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.join("device").join("mem_info_vram_total").is_file())
        .collect();
    cards.sort();
    let Some(card) = cards.first() else {
        bail!("no DRM card exposes mem_info_vram_total");
    };
    let path = card.join("device").join("mem_info_vram_total");
    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    raw.trim()
        .parse::<u64>()
        .with_context(|| format!("parsing {}", path.display()))
}

/// Pulls the first `AdapterRAM=<n>` out of `wmic ... /value` output.
#[cfg_attr(not(windows), allow(dead_code))]
fn parse_wmic_value(text: &str) -> Result<u64> {
    for line in text.lines() {
        if let Some(v) = line.trim().strip_prefix("AdapterRAM=") {
            if v.is_empty() {
                continue;
            }
            return v.parse::<u64>().with_context(|| format!("AdapterRAM {v:?}"));
        }
    }
    bail!("no AdapterRAM in wmic output")
}
