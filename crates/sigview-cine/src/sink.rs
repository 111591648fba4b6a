//! Render sink: where the engine hands plotted data for display

use sigview_core::{ChannelColor, ChannelId, SamplePoint};
use sigview_processing::{CirclePoint, PixelSize, SelectionRect};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Surface size reported when a sink has no better idea
pub const DEFAULT_VIEWPORT: PixelSize = PixelSize {
    width: 800.0,
    height: 300.0,
};

/// Receiver of everything the engine wants drawn.
///
/// Calls arrive strictly one at a time from the task that owns the engine.
pub trait RenderSink {
    /// A channel's plotted prefix changed. `plotted` is empty while the
    /// channel is hidden.
    fn on_channel_updated(&mut self, id: ChannelId, plotted: &[SamplePoint], color: &ChannelColor);

    /// The set of selection rectangles changed
    fn on_selection_rectangles_changed(&mut self, rects: &[SelectionRect]);

    /// Pixel size of the surface showing `id`
    fn viewport_size(&self, id: ChannelId) -> PixelSize;

    /// The circular sweep moved
    fn on_circular_updated(&mut self, _points: &[CirclePoint], _current: usize) {}
}

/// Sink that draws nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn on_channel_updated(&mut self, _id: ChannelId, _plotted: &[SamplePoint], _color: &ChannelColor) {}

    fn on_selection_rectangles_changed(&mut self, _rects: &[SelectionRect]) {}

    fn viewport_size(&self, _id: ChannelId) -> PixelSize {
        DEFAULT_VIEWPORT
    }
}

/// Latest state pushed to a [`RecordingSink`]
#[derive(Debug, Clone, Default)]
pub struct SinkLog {
    /// Last plotted slice per channel
    pub plotted: BTreeMap<ChannelId, Vec<SamplePoint>>,
    /// Last color per channel
    pub colors: BTreeMap<ChannelId, ChannelColor>,
    /// Number of updates per channel
    pub updates: BTreeMap<ChannelId, usize>,
    /// Last rectangle set
    pub rectangles: Vec<SelectionRect>,
    /// Last circular frame
    pub circle: Vec<CirclePoint>,
}

impl SinkLog {
    pub fn plotted(&self, id: ChannelId) -> &[SamplePoint] {
        self.plotted.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn update_count(&self, id: ChannelId) -> usize {
        self.updates.get(&id).copied().unwrap_or(0)
    }
}

/// Sink that remembers the latest frame of every channel.
///
/// Clones share the same log, so a handle kept outside the engine sees
/// what the engine emitted.
#[derive(Debug, Clone)]
pub struct RecordingSink {
    log: Arc<Mutex<SinkLog>>,
    size: PixelSize,
}

impl RecordingSink {
    pub fn new(size: PixelSize) -> Self {
        Self {
            log: Arc::new(Mutex::new(SinkLog::default())),
            size,
        }
    }

    /// Copy of the current log
    pub fn log(&self) -> SinkLog {
        match self.log.lock() {
            Ok(log) => log.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn with_log(&self, f: impl FnOnce(&mut SinkLog)) {
        match self.log.lock() {
            Ok(mut log) => f(&mut *log),
            Err(poisoned) => f(&mut *poisoned.into_inner()),
        }
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new(DEFAULT_VIEWPORT)
    }
}

impl RenderSink for RecordingSink {
    fn on_channel_updated(&mut self, id: ChannelId, plotted: &[SamplePoint], color: &ChannelColor) {
        self.with_log(|log| {
            log.plotted.insert(id, plotted.to_vec());
            log.colors.insert(id, color.clone());
            *log.updates.entry(id).or_insert(0) += 1;
        });
    }

    fn on_selection_rectangles_changed(&mut self, rects: &[SelectionRect]) {
        self.with_log(|log| log.rectangles = rects.to_vec());
    }

    fn viewport_size(&self, _id: ChannelId) -> PixelSize {
        self.size
    }

    fn on_circular_updated(&mut self, points: &[CirclePoint], _current: usize) {
        self.with_log(|log| log.circle = points.to_vec());
    }
}
