use crate::collectors::{disk::DEFAULT_DISK_FREE_MB, user::DEFAULT_USER_NAME, video::DEFAULT_VIDEO_RAM_MB};
use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf, str::FromStr};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostInfoConfig {
    pub common: Common,
    pub fallbacks: Fallbacks,
    pub video: Video,
    pub output: Output,
}
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Common {
    pub instance_id: String,
    pub interval_secs: u64,
    /// Volume reported in snapshots.
    pub disk_path: PathBuf,
}
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fallbacks {
    pub disk_free_mb: u64,
    pub video_ram_mb: u32,
    pub user_name: String,
}
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Video {
    pub strategy: VideoStrategySetting,
}
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Output {
    pub mode: String,
    pub file_path: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoStrategySetting {
    #[default]
    Auto,
    Headless,
    Basic,
    Query,
}

impl FromStr for VideoStrategySetting {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "auto" => Self::Auto,
            "headless" => Self::Headless,
            "basic" => Self::Basic,
            "query" => Self::Query,
            other => bail!("unknown video strategy {other:?}"),
        })
    }
}

impl Default for Common {
    fn default() -> Self {
        Self {
            instance_id: "hostinfo-default".into(),
            interval_secs: 5,
            disk_path: ".".into(),
        }
    }
}
impl Default for Fallbacks {
    fn default() -> Self {
        Self {
            disk_free_mb: DEFAULT_DISK_FREE_MB,
            video_ram_mb: DEFAULT_VIDEO_RAM_MB,
            user_name: DEFAULT_USER_NAME.into(),
        }
    }
}
impl Default for Output {
    fn default() -> Self {
        let pd = ProjectDirs::from("io", "hostinfo", "hostinfo")
            .map(|p| p.data_dir().to_path_buf())
            .unwrap_or_else(|| "./data".into());
        Self {
            mode: "stdout".into(),
            file_path: Some(pd.join("logs").join("hostinfo.jsonl")),
        }
    }
}

fn read_config_file(p: &PathBuf, base: &HostInfoConfig) -> Result<HostInfoConfig> {
    let s = fs::read_to_string(p).with_context(|| format!("reading config file {}", p.display()))?;
    let f: HostInfoConfig = toml::from_str(&s).context("parsing config TOML")?;
    Ok(merge_config(base, &f))
}

pub fn load_config_with_precedence(cli: Option<&PathBuf>) -> Result<HostInfoConfig> {
    let mut cfg = HostInfoConfig::default();
    if let Some(p) = cli {
        if p.exists() {
            cfg = read_config_file(p, &cfg)?;
        }
    } else if let Ok(env_path) = env::var("HOSTINFO_CONFIG") {
        let p: PathBuf = env_path.into();
        if p.exists() {
            cfg = read_config_file(&p, &cfg)?;
        }
    }
    if let Ok(v) = env::var("HOSTINFO_INTERVAL_SECS") {
        if let Ok(n) = v.parse::<u64>() {
            cfg.common.interval_secs = n;
        }
    }
    if let Ok(v) = env::var("HOSTINFO_VIDEO_STRATEGY") {
        cfg.video.strategy = v.parse().context("HOSTINFO_VIDEO_STRATEGY")?;
    }
    Ok(cfg)
}

pub fn merge_config(a: &HostInfoConfig, b: &HostInfoConfig) -> HostInfoConfig {
    let mut out = a.clone();
    out.common = b.common.clone();
    out.fallbacks = b.fallbacks.clone();
    out.video = b.video.clone();
    out.output = b.output.clone();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_historical_fallbacks() {
        let cfg = HostInfoConfig::default();
        assert_eq!(cfg.fallbacks.disk_free_mb, 26);
        assert_eq!(cfg.fallbacks.video_ram_mb, 64);
        assert_eq!(cfg.fallbacks.user_name, "player");
        assert_eq!(cfg.video.strategy, VideoStrategySetting::Auto);
    }

    #[test]
    fn file_overrides_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        let mut cfg = HostInfoConfig::default();
        cfg.common.instance_id = "rig-7".into();
        cfg.fallbacks.user_name = "guest".into();
        cfg.video.strategy = VideoStrategySetting::Basic;
        f.write_all(toml::to_string(&cfg).unwrap().as_bytes()).unwrap();
        let loaded = load_config_with_precedence(Some(&f.path().to_path_buf())).unwrap();
        assert_eq!(loaded.common.instance_id, "rig-7");
        assert_eq!(loaded.fallbacks.user_name, "guest");
        assert_eq!(loaded.video.strategy, VideoStrategySetting::Basic);
    }

    #[test]
    fn partial_file_overrides_only_what_it_names() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"[video]\nstrategy = \"basic\"\n\n[fallbacks]\nuser_name = \"guest\"\n").unwrap();
        let loaded = load_config_with_precedence(Some(&f.path().to_path_buf())).unwrap();
        let defaults = HostInfoConfig::default();
        assert_eq!(loaded.video.strategy, VideoStrategySetting::Basic);
        assert_eq!(loaded.fallbacks.user_name, "guest");
        assert_eq!(loaded.fallbacks.disk_free_mb, 26);
        assert_eq!(loaded.fallbacks.video_ram_mb, 64);
        assert_eq!(loaded.common, defaults.common);
        assert_eq!(loaded.output, defaults.output);
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let f = tempfile::NamedTempFile::new().unwrap();
        let loaded = load_config_with_precedence(Some(&f.path().to_path_buf())).unwrap();
        assert_eq!(loaded.fallbacks, HostInfoConfig::default().fallbacks);
        assert_eq!(loaded.common, HostInfoConfig::default().common);
    }

    #[test]
    fn missing_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("absent.toml");
        let loaded = load_config_with_precedence(Some(&p)).unwrap();
        assert_eq!(loaded.fallbacks, HostInfoConfig::default().fallbacks);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"[common\ninstance_id = ").unwrap();
        let err = load_config_with_precedence(Some(&f.path().to_path_buf())).unwrap_err();
        assert!(format!("{err:#}").contains("parsing config TOML"));
    }

    #[test]
    fn strategy_names_parse() {
        assert_eq!("Query".parse::<VideoStrategySetting>().unwrap(), VideoStrategySetting::Query);
        assert_eq!("headless".parse::<VideoStrategySetting>().unwrap(), VideoStrategySetting::Headless);
        assert!("fancy".parse::<VideoStrategySetting>().is_err());
    }
}
