//! CineDriver: async actor that owns a [`SignalEngine`] and fires its ticks
//! on time

use crate::engine::{ChannelSnapshot, SignalEngine};
use crate::feed::FeedSample;
use crate::sink::RenderSink;
use sigview_core::{Axis, ChannelColor, ChannelId, SigResult};
use sigview_processing::PixelPoint;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

/// Commands accepted by the driver
#[derive(Debug)]
pub enum EngineCommand {
    Load {
        channel: ChannelId,
        times: Vec<f64>,
        values: Vec<f64>,
        append: bool,
    },
    Clear(ChannelId),
    Play(ChannelId),
    Pause(ChannelId),
    Rewind(ChannelId),
    TogglePlayPause(ChannelId),
    ZoomIn(ChannelId),
    ZoomOut(ChannelId),
    Recenter(ChannelId),
    Pan {
        channel: ChannelId,
        axis: Axis,
        steps: f64,
    },
    SetView {
        channel: ChannelId,
        min: f64,
        max: f64,
    },
    ToggleVisibility(ChannelId),
    SetColor(ChannelId, ChannelColor),
    Link,
    Unlink,
    MoveSignal {
        from: ChannelId,
        to: ChannelId,
    },
    SetIntervalMs(u64),
    SetSpeed(f64),
    ToggleSelectionMode,
    BeginSelection(ChannelId, PixelPoint),
    UpdateSelection(PixelPoint),
    FinalizeSelection,
    Splice {
        gap: Option<f64>,
        order: Option<usize>,
    },
    LoadCircular(Vec<f64>),
    StopCircular,
    Snapshot(ChannelId, oneshot::Sender<SigResult<ChannelSnapshot>>),
    Shutdown,
}

#[derive(Debug, Clone, Copy)]
struct Deadline {
    due: Instant,
    generation: u64,
}

/// Single task that owns the engine. Commands, feed samples and tick
/// deadlines are handled one at a time.
pub struct CineDriver<S> {
    engine: SignalEngine<S>,
    commands: mpsc::Receiver<EngineCommand>,
    feed: Option<mpsc::Receiver<FeedSample>>,
    deadlines: BTreeMap<ChannelId, Deadline>,
    circular_due: Option<Instant>,
}

impl<S: RenderSink> CineDriver<S> {
    /// Create a driver and the sender used to control it
    pub fn new(engine: SignalEngine<S>) -> (Self, mpsc::Sender<EngineCommand>) {
        let (sender, commands) = mpsc::channel(64);
        let driver = Self {
            engine,
            commands,
            feed: None,
            deadlines: BTreeMap::new(),
            circular_due: None,
        };
        (driver, sender)
    }

    /// Attach a live feed
    pub fn with_feed(mut self, feed: mpsc::Receiver<FeedSample>) -> Self {
        self.feed = Some(feed);
        self
    }

    pub fn engine(&self) -> &SignalEngine<S> {
        &self.engine
    }

    /// Run until shut down or until every command sender is dropped.
    /// Returns the engine in its final state.
    pub async fn run(mut self) -> SignalEngine<S> {
        info!("cine driver started");

        loop {
            self.sync_schedule(Instant::now());
            let next = self.next_deadline();

            tokio::select! {
                _ = sleep_until(next.unwrap_or_else(far_future)), if next.is_some() => {
                    self.fire_due(Instant::now());
                }

                command = self.commands.recv() => {
                    match command {
                        Some(EngineCommand::Shutdown) | None => break,
                        Some(command) => self.handle(command),
                    }
                }

                sample = next_sample(&mut self.feed) => {
                    match sample {
                        Some(sample) => {
                            if let Err(e) = self.engine.ingest_feed_sample(sample) {
                                warn!(error = %e, "feed sample rejected");
                            }
                        }
                        None => {
                            info!("live feed closed");
                            self.feed = None;
                        }
                    }
                }
            }
        }

        info!("cine driver stopped");
        self.engine
    }

    fn handle(&mut self, command: EngineCommand) {
        debug!(?command, "engine command");
        let engine = &mut self.engine;
        let result = match command {
            EngineCommand::Load {
                channel,
                times,
                values,
                append,
            } => engine.load(channel, &times, &values, append),
            EngineCommand::Clear(id) => engine.clear(id),
            EngineCommand::Play(id) => engine.play(id),
            EngineCommand::Pause(id) => engine.pause(id),
            EngineCommand::Rewind(id) => engine.rewind(id),
            EngineCommand::TogglePlayPause(id) => engine.toggle_play_pause(id),
            EngineCommand::ZoomIn(id) => engine.zoom_in(id).map(drop),
            EngineCommand::ZoomOut(id) => engine.zoom_out(id).map(drop),
            EngineCommand::Recenter(id) => engine.recenter(id).map(drop),
            EngineCommand::Pan {
                channel,
                axis,
                steps,
            } => engine.pan(channel, axis, steps).map(drop),
            EngineCommand::SetView { channel, min, max } => {
                engine.set_view(channel, min, max).map(drop)
            }
            EngineCommand::ToggleVisibility(id) => engine.toggle_visibility(id).map(drop),
            EngineCommand::SetColor(id, color) => engine.set_color(id, color),
            EngineCommand::Link => engine.link_channels(),
            EngineCommand::Unlink => {
                engine.unlink_channels();
                Ok(())
            }
            EngineCommand::MoveSignal { from, to } => engine.move_signal(from, to).map(drop),
            EngineCommand::SetIntervalMs(ms) => engine.set_interval(ms),
            EngineCommand::SetSpeed(speed) => engine.set_speed(speed).map(drop),
            EngineCommand::ToggleSelectionMode => {
                engine.toggle_selection_mode();
                Ok(())
            }
            EngineCommand::BeginSelection(id, point) => engine.begin_selection(id, point).map(drop),
            EngineCommand::UpdateSelection(point) => {
                engine.update_selection(point);
                Ok(())
            }
            EngineCommand::FinalizeSelection => engine.finalize_selection().map(drop),
            EngineCommand::Splice { gap, order } => engine.splice_selected(gap, order).map(drop),
            EngineCommand::LoadCircular(values) => {
                engine.load_circular(values);
                Ok(())
            }
            EngineCommand::StopCircular => {
                engine.stop_circular();
                Ok(())
            }
            EngineCommand::Snapshot(id, reply) => {
                // Receiver may have given up waiting
                let _ = reply.send(engine.snapshot(id));
                Ok(())
            }
            EngineCommand::Shutdown => Ok(()),
        };

        if let Err(e) = result {
            if e.is_caller_error() {
                error!(error = %e, "engine command failed");
            } else {
                warn!(error = %e, "engine command failed");
            }
        }
    }

    /// Align deadlines with the engine's active tick sources. New or
    /// restarted sources get their first deadline one interval from `now`.
    fn sync_schedule(&mut self, now: Instant) {
        let sources: BTreeMap<_, _> = self.engine.playback().tick_sources().collect();
        self.deadlines.retain(|id, deadline| {
            sources
                .get(id)
                .is_some_and(|source| source.generation == deadline.generation)
        });
        for (id, source) in sources {
            self.deadlines.entry(id).or_insert(Deadline {
                due: now + source.interval,
                generation: source.generation,
            });
        }

        if !self.engine.is_circular_running() {
            self.circular_due = None;
        } else if self.circular_due.is_none() {
            self.circular_due = Some(now + self.circular_interval());
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.deadlines
            .values()
            .map(|d| d.due)
            .chain(self.circular_due)
            .min()
    }

    /// Fire every tick that is due. A late source skips ahead instead of
    /// bursting through the missed ticks.
    fn fire_due(&mut self, now: Instant) {
        let due: Vec<ChannelId> = self
            .deadlines
            .iter()
            .filter(|(_, d)| d.due <= now)
            .map(|(&id, _)| id)
            .collect();

        for id in due {
            if let Err(e) = self.engine.tick(id) {
                warn!(channel = %id, error = %e, "tick failed");
            }
            let interval = self.engine.playback().tick_source(id).map(|s| s.interval);
            if let (Some(deadline), Some(interval)) = (self.deadlines.get_mut(&id), interval) {
                deadline.due = next_due(deadline.due, interval, now);
            }
        }

        if let Some(due) = self.circular_due.filter(|&due| due <= now) {
            if self.engine.tick_circular() {
                self.circular_due = Some(next_due(due, self.circular_interval(), now));
            } else {
                self.circular_due = None;
            }
        }
    }

    fn circular_interval(&self) -> Duration {
        Duration::from_millis(self.engine.config().playback.circular_interval_ms)
    }
}

fn next_due(previous: Instant, interval: Duration, now: Instant) -> Instant {
    let next = previous + interval;
    if next <= now {
        now + interval
    } else {
        next
    }
}

fn far_future() -> Instant {
    Instant::now() + Duration::from_secs(86400 * 365)
}

async fn next_sample(feed: &mut Option<mpsc::Receiver<FeedSample>>) -> Option<FeedSample> {
    match feed {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}

/// Helper function to start a driver in the background
pub fn start_cine_driver<S>(
    engine: SignalEngine<S>,
    feed: Option<mpsc::Receiver<FeedSample>>,
) -> (mpsc::Sender<EngineCommand>, JoinHandle<SignalEngine<S>>)
where
    S: RenderSink + Send + 'static,
{
    let (mut driver, sender) = CineDriver::new(engine);
    if let Some(feed) = feed {
        driver = driver.with_feed(feed);
    }
    let handle = tokio::spawn(driver.run());
    (sender, handle)
}
