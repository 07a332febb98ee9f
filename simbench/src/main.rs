use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use server::ServerConfig;
use simbench::{run, SimConfig, Summary};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "simbench",
    version,
    about = "svframe lossy-network simulation harness"
)]
struct Cli {
    /// Number of connected clients.
    #[arg(long, default_value_t = 4)]
    clients: u32,
    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 350)]
    ticks: u64,
    /// Probability that an unordered frame or an ack is lost.
    #[arg(long, default_value_t = 0.05)]
    loss: f32,
    /// RNG seed for deterministic results.
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Number of simulated map objects.
    #[arg(long, default_value_t = 64)]
    mobjs: u32,
    /// Link capacity per client and tick.
    #[arg(long, default_value_t = 2048)]
    link_bytes: usize,
    /// Change the map at this tick.
    #[arg(long)]
    map_change_at: Option<u64>,
    /// Server configuration as JSON; missing fields take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output directory for summary.json.
    #[arg(long, default_value = "target/simbench")]
    out_dir: PathBuf,
    /// Fail if p95 frame size exceeds this value.
    #[arg(long)]
    max_p95_frame_bytes: Option<u64>,
    /// Fail if average frame size exceeds this value.
    #[arg(long)]
    max_avg_frame_bytes: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let server = match &cli.config {
        Some(path) => load_server_config(path)?,
        None => ServerConfig::default(),
    };
    let config = SimConfig {
        clients: cli.clients,
        ticks: cli.ticks,
        seed: cli.seed,
        loss: cli.loss.clamp(0.0, 1.0),
        mobjs: cli.mobjs,
        link_bytes_per_tick: cli.link_bytes,
        map_change_at: cli.map_change_at,
        server,
        ..SimConfig::default()
    };

    fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("create output dir {}", cli.out_dir.display()))?;
    let summary = run(&config)?;
    write_summary_json(&cli.out_dir, &summary)?;

    println!(
        "frames: {} (lost {}), avg {} bytes, p95 {} bytes, max {} bytes",
        summary.frames_sent,
        summary.frames_lost,
        summary.avg_frame_bytes,
        summary.p95_frame_bytes,
        summary.max_frame_bytes
    );
    println!(
        "deltas: {} sent, {} delivered, {} duplicates, {} resent, {} pending at end",
        summary.deltas_sent,
        summary.deltas_delivered,
        summary.duplicates_filtered,
        summary.resent_records,
        summary.pending_at_end
    );

    summary.assert_budgets(cli.max_p95_frame_bytes, cli.max_avg_frame_bytes)?;
    Ok(())
}

fn load_server_config(path: &Path) -> Result<ServerConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let config: ServerConfig = serde_json::from_str(&contents)
        .with_context(|| format!("parse config {}", path.display()))?;
    config.validate().context("invalid server config")?;
    Ok(config)
}

fn write_summary_json(out_dir: &Path, summary: &Summary) -> Result<()> {
    let path = out_dir.join("summary.json");
    let contents = serde_json::to_string_pretty(summary).context("serialize summary")?;
    fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
