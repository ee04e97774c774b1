use crate::{config::HostInfoConfig, reading::Reading};
use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::info;
use uuid::Uuid;

pub mod disk;
pub mod lock;
pub mod mem;
pub mod user;
pub mod video;

use self::{mem::MemoryStats, video::VideoRamStrategy};

/// One pass over every read-only query.
#[derive(Debug, Clone, Serialize)]
pub struct HostSnapshot {
    pub system_ram_mb: u32,
    pub disk_path: String,
    pub drive_free_mb: Reading<u64>,
    pub video_strategy: VideoRamStrategy,
    pub video_ram_mb: Reading<u32>,
    pub memory: Reading<MemoryStats>,
    pub user: Reading<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct TelemetryEnvelope<T: Serialize> {
    pub ts: String,
    pub event_id: String,
    pub instance_id: String,
    pub kind: String,
    pub body: T,
}

fn now_iso() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_else(|_| "1970-01-01T00:00:00Z".into())
}

pub fn collect(cfg: &HostInfoConfig, strategy: VideoRamStrategy) -> HostSnapshot {
    let fb = &cfg.fallbacks;
    HostSnapshot {
        system_ram_mb: mem::system_ram_mb(),
        disk_path: cfg.common.disk_path.display().to_string(),
        drive_free_mb: disk::probe_drive_free_space_mb(&cfg.common.disk_path, fb.disk_free_mb),
        video_strategy: strategy,
        video_ram_mb: strategy.probe(fb.video_ram_mb),
        memory: mem::probe_memory_status(),
        user: user::probe_current_user_with(&user::OsIdentity, &fb.user_name),
    }
}

/// Serialises `body` as one NDJSON envelope line.
pub fn envelope_line<T: Serialize>(instance_id: &str, kind: &str, body: &T) -> Result<Vec<u8>> {
    let env = TelemetryEnvelope {
        ts: now_iso(),
        event_id: Uuid::new_v4().to_string(),
        instance_id: instance_id.to_string(),
        kind: kind.to_string(),
        body,
    };
    let mut line = serde_json::to_vec(&env)?;
    line.push(b'\n');
    Ok(line)
}

pub fn emit<T: Serialize, W: Write>(out: &mut W, instance_id: &str, kind: &str, body: &T) -> Result<()> {
    let line = envelope_line(instance_id, kind, body)?;
    info!(event = %kind, size = line.len(), "report");
    out.write_all(&line)?;
    out.flush()?;
    Ok(())
}

pub async fn run_watch_loop(cfg: HostInfoConfig, strategy: VideoRamStrategy) -> Result<()> {
    let interval = std::time::Duration::from_secs(cfg.common.interval_secs.max(1));
    loop {
        let snap = collect(&cfg, strategy);
        emit(&mut std::io::stdout().lock(), &cfg.common.instance_id, "snapshot", &snap)?;
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VideoStrategySetting;

    #[test]
    fn snapshot_honours_configured_fallbacks() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = HostInfoConfig::default();
        cfg.common.disk_path = dir.path().join("missing");
        cfg.fallbacks.disk_free_mb = 11;
        cfg.fallbacks.video_ram_mb = 128;
        let snap = collect(&cfg, VideoRamStrategy::BasicDefault);
        assert_eq!(snap.drive_free_mb, Reading::fallback(11));
        assert_eq!(snap.video_ram_mb, Reading::fallback(128));
        assert_eq!(snap.system_ram_mb % 16, 0);
        assert!(!snap.user.value.is_empty());
    }

    #[test]
    fn envelope_is_one_json_line() {
        let cfg = HostInfoConfig::default();
        let strategy = VideoRamStrategy::detect(VideoStrategySetting::Basic);
        let snap = collect(&cfg, strategy);
        let line = envelope_line("rig-1", "snapshot", &snap).unwrap();
        assert_eq!(line.last(), Some(&b'\n'));
        assert_eq!(line.iter().filter(|b| **b == b'\n').count(), 1);
        let v: serde_json::Value = serde_json::from_slice(&line).unwrap();
        assert_eq!(v["instance_id"], "rig-1");
        assert_eq!(v["kind"], "snapshot");
        assert!(v["body"]["memory"]["value"]["total_physical"].as_u64().unwrap() > 0);
        assert!(v["body"]["video_ram_mb"]["origin"].is_string());
    }

    #[test]
    fn emit_writes_to_the_given_sink() {
        let mut sink = Vec::new();
        emit(&mut sink, "rig-2", "ram", &mem::system_ram_mb()).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&sink).unwrap();
        assert_eq!(v["kind"], "ram");
        assert_eq!(v["body"].as_u64().unwrap() % 16, 0);
    }
}
