use crate::config::HostInfoConfig;
use anyhow::{Context, Result};
use std::{fs, path::Path};

pub fn init_tracing(cfg: &HostInfoConfig) -> Result<()> {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info,hostinfo=info".into());
    // Reports go to stdout, so logs go to stderr unless a file is configured.
    if cfg.output.mode == "file" {
        if let Some(path) = &cfg.output.file_path {
            let dir = path.parent().unwrap_or(Path::new("."));
            fs::create_dir_all(dir).with_context(|| format!("creating log dir {}", dir.display()))?;
            let name = path.file_name().context("log file path has no file name")?;
            let file_appender = tracing_appender::rolling::never(dir, name);
            let (nb, guard) = tracing_appender::non_blocking(file_appender);
            Box::leak(Box::new(guard));
            tracing_subscriber::fmt().with_env_filter(env_filter).with_writer(nb).json().flatten_event(true).init();
            return Ok(());
        }
    }
    tracing_subscriber::fmt().with_env_filter(env_filter).with_writer(std::io::stderr).json().init();
    Ok(())
}
