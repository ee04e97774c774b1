use anyhow::Result;
use clap::{Parser, Subcommand};
use hostinfo::{
    collectors::{self, emit, run_watch_loop, video::VideoRamStrategy},
    config::{load_config_with_precedence, VideoStrategySetting},
    logging::init_tracing,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "hostinfo", version, about = "Machine introspection queries")]
struct Cli {
    #[arg(short, long, env = "HOSTINFO_CONFIG")]
    config: Option<PathBuf>,
    /// Override the configured video memory strategy.
    #[arg(long)]
    video_strategy: Option<VideoStrategySetting>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print one full snapshot.
    Report,
    /// Print a snapshot every interval.
    Watch {
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Physical RAM in MB.
    Ram,
    /// Video RAM in MB.
    Vram,
    /// Memory statistics in KiB.
    Mem,
    /// Current user name.
    User,
    /// Free space in MB on the volume holding PATH.
    Disk { path: PathBuf },
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut cfg = load_config_with_precedence(cli.config.as_ref())?;
    if let Some(s) = cli.video_strategy {
        cfg.video.strategy = s;
    }
    init_tracing(&cfg)?;
    let strategy = VideoRamStrategy::detect(cfg.video.strategy);
    let id = cfg.common.instance_id.clone();
    let mut out = std::io::stdout().lock();
    match cli.command.unwrap_or(Commands::Report) {
        Commands::Report => emit(&mut out, &id, "snapshot", &collectors::collect(&cfg, strategy))?,
        Commands::Watch { interval } => {
            drop(out);
            if let Some(n) = interval {
                cfg.common.interval_secs = n;
            }
            run_watch_loop(cfg, strategy).await?;
        }
        Commands::Ram => emit(&mut out, &id, "ram", &hostinfo::system_ram_mb())?,
        Commands::Vram => emit(&mut out, &id, "vram", &strategy.probe(cfg.fallbacks.video_ram_mb))?,
        Commands::Mem => emit(&mut out, &id, "mem", &hostinfo::probe_memory_status())?,
        Commands::User => emit(
            &mut out,
            &id,
            "user",
            &hostinfo::probe_current_user_with(&hostinfo::OsIdentity, &cfg.fallbacks.user_name),
        )?,
        Commands::Disk { path } => emit(
            &mut out,
            &id,
            "disk",
            &hostinfo::probe_drive_free_space_mb(&path, cfg.fallbacks.disk_free_mb),
        )?,
    }
    Ok(())
}
