//! sigview - multi-channel signal playback from the command line

mod app;
mod export;
mod loader;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sigview", version, about = "Multi-channel signal playback and splicing")]
pub struct Cli {
    /// Two-column series file for Graph 1
    #[arg(long)]
    pub graph1: Option<PathBuf>,

    /// Two-column series file for Graph 2
    #[arg(long)]
    pub graph2: Option<PathBuf>,

    /// Two-column series file for Graph 3
    #[arg(long)]
    pub graph3: Option<PathBuf>,

    /// Single-column file for the circular display
    #[arg(long)]
    pub circular: Option<PathBuf>,

    /// Engine configuration (JSON)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Live feed URL, overrides the configured one
    #[arg(long)]
    pub feed_url: Option<String>,

    /// Playback speed in samples per second
    #[arg(long)]
    pub speed: Option<f64>,

    /// Link Graph 1 and Graph 2
    #[arg(long)]
    pub link: bool,

    /// Synthetic preset played on channels without a file (sine, ramp, bursts, ...)
    #[arg(long)]
    pub demo: Option<String>,

    /// Seconds to play before exiting
    #[arg(long, default_value_t = 10.0)]
    pub duration: f64,

    /// Write a snapshot and a report of every plotted channel on exit
    #[arg(long)]
    pub export: bool,

    /// Directory receiving snapshots/ and reports/
    #[arg(long, default_value = ".")]
    pub output: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    app::run(cli).await
}
