//! Headless viewer session: load the inputs, play them on the cine driver
//! and export what was plotted

use crate::{export, loader, Cli};
use anyhow::{bail, Context};
use sigview_cine::{
    generate_series, start_cine_driver, start_feed_poller, EngineCommand, HttpFeed, RenderSink,
    SignalEngine, SignalPattern, SynthConfig, DEFAULT_VIEWPORT,
};
use sigview_core::{ChannelColor, ChannelId, SamplePoint};
use sigview_processing::{CirclePoint, EngineConfig, PixelSize, SelectionRect};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, trace};

/// Render sink for a terminal session: reports progress through tracing
#[derive(Debug)]
pub struct LogSink {
    size: PixelSize,
    updates: u64,
    log_every: u64,
}

impl LogSink {
    pub fn new(size: PixelSize, log_every: u64) -> Self {
        Self {
            size,
            updates: 0,
            log_every: log_every.max(1),
        }
    }
}

impl RenderSink for LogSink {
    fn on_channel_updated(&mut self, id: ChannelId, plotted: &[SamplePoint], color: &ChannelColor) {
        self.updates += 1;
        trace!(channel = %id, points = plotted.len(), %color, "channel updated");
        if self.updates % self.log_every == 0 {
            info!(
                channel = %id,
                points = plotted.len(),
                last = ?plotted.last().map(|p| (p.time, p.value)),
                "playback"
            );
        }
    }

    fn on_selection_rectangles_changed(&mut self, rects: &[SelectionRect]) {
        debug!(count = rects.len(), "selection changed");
    }

    fn viewport_size(&self, _id: ChannelId) -> PixelSize {
        self.size
    }

    fn on_circular_updated(&mut self, points: &[CirclePoint], current: usize) {
        trace!(visible = points.len(), current, "circular sweep");
    }
}

/// Read an engine configuration file, or fall back to the defaults
pub fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = EngineConfig::from_json(&json)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    info!(profile = %config.name, path = %path.display(), "configuration loaded");
    Ok(config)
}

/// Run one session as described by the command line
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let Ok(duration) = Duration::try_from_secs_f64(cli.duration) else {
        bail!("Duration must be a non-negative number of seconds");
    };

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(url) = &cli.feed_url {
        config.feed.url = Some(url.clone());
    }

    let mut engine = SignalEngine::new(config.clone(), LogSink::new(DEFAULT_VIEWPORT, 50))?;
    let loaded = load_inputs(&mut engine, &cli)?;
    if loaded == 0 && cli.circular.is_none() && config.feed.url.is_none() {
        info!("nothing to play; pass series files, --demo or --feed-url");
    }

    let feed = match &config.feed.url {
        Some(_) => Some(start_feed_poller(HttpFeed::new(&config.feed)?, &config.feed)?),
        None => None,
    };
    let (commands, handle) = start_cine_driver(engine, feed);

    tokio::select! {
        _ = tokio::time::sleep(duration) => {}
        _ = tokio::signal::ctrl_c() => info!("interrupted"),
    }

    commands
        .send(EngineCommand::Shutdown)
        .await
        .context("Cine driver stopped early")?;
    let engine = handle.await.context("Cine driver failed")?;

    if cli.export {
        export_all(&engine, &cli.output)?;
    }
    Ok(())
}

/// Load files (or demo signals) into the graph channels and start them
fn load_inputs<S: RenderSink>(engine: &mut SignalEngine<S>, cli: &Cli) -> anyhow::Result<usize> {
    let demo = match &cli.demo {
        Some(name) => Some(
            SignalPattern::preset(name).with_context(|| format!("Unknown demo preset '{}'", name))?,
        ),
        None => None,
    };
    let synth = SynthConfig {
        sampling_rate: engine.config().playback.sampling_rate,
        ..Default::default()
    };

    let sources = [
        (ChannelId::Graph1, &cli.graph1),
        (ChannelId::Graph2, &cli.graph2),
        (ChannelId::Graph3, &cli.graph3),
    ];
    let mut loaded = 0;
    for (id, path) in sources {
        let (times, values) = match (path, demo) {
            (Some(path), _) => loader::load_series(path)?,
            (None, Some(pattern)) => generate_series(pattern, &synth)?,
            (None, None) => continue,
        };
        engine.load(id, &times, &values, false)?;
        engine.play(id)?;
        loaded += 1;
        info!(channel = %id, samples = times.len(), "channel loaded");
    }

    if let Some(path) = &cli.circular {
        engine.load_circular(loader::load_circular_series(path)?);
    }
    if let Some(speed) = cli.speed {
        let interval = engine.set_speed(speed)?;
        info!(interval_ms = interval.as_millis() as u64, "speed set");
    }
    if cli.link {
        engine.link_channels()?;
    }
    Ok(loaded)
}

/// Snapshot and report every channel with plotted points
fn export_all<S: RenderSink>(engine: &SignalEngine<S>, dir: &Path) -> anyhow::Result<()> {
    for id in engine.store().ids() {
        let snapshot = engine.snapshot(id)?;
        if snapshot.plotted.is_empty() {
            continue;
        }
        let csv = export::write_snapshot(dir, &snapshot)?;
        let report = export::ChannelReport::from_snapshot(&snapshot);
        let json = export::write_report(dir, &report)?;
        info!(
            channel = %id,
            snapshot = %csv.display(),
            report = %json.display(),
            "exported"
        );
    }
    Ok(())
}
