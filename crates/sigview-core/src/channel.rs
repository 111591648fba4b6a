//! Channel: a named playback lane holding one signal buffer and its
//! display/playback state

use crate::error::{SigError, SigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of one of the engine's fixed plot surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChannelId {
    Graph1,
    Graph2,
    /// Target of spliced signals
    Glued,
    Graph3,
}

impl ChannelId {
    /// Every channel, in display order
    pub const ALL: [ChannelId; 4] = [
        ChannelId::Graph1,
        ChannelId::Graph2,
        ChannelId::Glued,
        ChannelId::Graph3,
    ];

    /// Display name of the channel
    pub fn name(&self) -> &'static str {
        match self {
            ChannelId::Graph1 => "Graph 1",
            ChannelId::Graph2 => "Graph 2",
            ChannelId::Glued => "Glued Signals",
            ChannelId::Graph3 => "Graph 3",
        }
    }

    /// Color a channel starts with
    pub fn default_color(&self) -> ChannelColor {
        let token = match self {
            ChannelId::Graph1 => "r",
            ChannelId::Graph2 => "g",
            ChannelId::Glued => "b",
            ChannelId::Graph3 => "y",
        };
        ChannelColor::new(token)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChannelId {
    type Err = SigError;

    fn from_str(s: &str) -> SigResult<Self> {
        match s.trim() {
            "Graph 1" | "graph1" => Ok(ChannelId::Graph1),
            "Graph 2" | "graph2" => Ok(ChannelId::Graph2),
            "Glued Signals" | "Glued" | "glued" | "glued_signal" => Ok(ChannelId::Glued),
            "Graph 3" | "graph3" => Ok(ChannelId::Graph3),
            other => Err(SigError::UnknownChannel {
                name: other.to_string(),
            }),
        }
    }
}

/// Opaque display token (a color name or `#rrggbb` string)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelColor(String);

impl ChannelColor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One `(time, value)` sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    pub time: f64,
    pub value: f64,
}

impl SamplePoint {
    pub fn new(time: f64, value: f64) -> Self {
        Self { time, value }
    }
}

impl From<(f64, f64)> for SamplePoint {
    fn from((time, value): (f64, f64)) -> Self {
        Self { time, value }
    }
}

/// Plot axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    /// Horizontal, data-space time
    Time,
    /// Vertical, data-space value
    Value,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Time => f.write_str("time"),
            Axis::Value => f.write_str("value"),
        }
    }
}

/// Visible data-space window along one axis. `min <= max` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewRange {
    pub min: f64,
    pub max: f64,
}

impl ViewRange {
    /// Create a range, swapping the ends if given in reverse
    pub fn new(a: f64, b: f64) -> Self {
        if a <= b {
            Self { min: a, max: b }
        } else {
            Self { min: b, max: a }
        }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    /// Clamp both ends into `[lo, hi]`. The bounds may come in either
    /// order; a non-finite bound leaves the range unclamped.
    pub fn clamp_to(&self, (a, b): (f64, f64)) -> Self {
        if !(a.is_finite() && b.is_finite()) {
            return *self;
        }
        let (lo, hi) = (a.min(b), a.max(b));
        Self::new(self.min.clamp(lo, hi), self.max.clamp(lo, hi))
    }

    /// Widen around the midpoint so the span is at least `min_span`
    pub fn with_min_span(&self, min_span: f64) -> Self {
        if self.span() >= min_span {
            *self
        } else {
            let half = min_span / 2.0;
            let mid = self.midpoint();
            Self {
                min: mid - half,
                max: mid + half,
            }
        }
    }
}

impl Default for ViewRange {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

/// Data and presentation state of one channel
#[derive(Debug, Clone)]
pub struct Channel {
    id: ChannelId,
    buffer: Vec<SamplePoint>,
    cursor: usize,
    playing: bool,
    visible: bool,
    color: ChannelColor,
    streamed: bool,
    view: ViewRange,
    value_view: ViewRange,
}

impl Channel {
    /// Create an empty channel with its default color
    pub fn new(id: ChannelId) -> Self {
        Self {
            id,
            buffer: Vec::new(),
            cursor: 0,
            playing: false,
            visible: true,
            color: id.default_color(),
            streamed: false,
            view: ViewRange::default(),
            value_view: ViewRange::default(),
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn buffer(&self) -> &[SamplePoint] {
        &self.buffer
    }

    /// Points already handed to the render sink: always `buffer[..cursor]`
    pub fn plotted(&self) -> &[SamplePoint] {
        &self.buffer[..self.cursor]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_streamed(&self) -> bool {
        self.streamed
    }

    pub fn color(&self) -> &ChannelColor {
        &self.color
    }

    /// Whether every sample has been played
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.buffer.len()
    }

    /// Most recently plotted sample
    pub fn last_plotted(&self) -> Option<SamplePoint> {
        self.plotted().last().copied()
    }

    /// Earliest and latest sample time, `(0, 1)` when there is no finite
    /// time. Equals the first and last time of an ordered buffer.
    pub fn bounds(&self) -> (f64, f64) {
        finite_extent(self.buffer.iter().map(|p| p.time))
    }

    /// Smallest and largest value, `(0, 1)` when there is no finite value
    pub fn value_bounds(&self) -> (f64, f64) {
        finite_extent(self.buffer.iter().map(|p| p.value))
    }

    /// Current time-axis view
    pub fn view(&self) -> ViewRange {
        self.view
    }

    /// Current value-axis view
    pub fn value_view(&self) -> ViewRange {
        self.value_view
    }

    /// Apply a time-axis view, clamped to the channel bounds
    pub fn set_view(&mut self, range: ViewRange) -> ViewRange {
        self.view = range.clamp_to(self.bounds());
        self.view
    }

    /// Apply a value-axis view (values are unbounded)
    pub fn set_value_view(&mut self, range: ViewRange) {
        self.value_view = range;
    }

    /// Move the cursor forward one sample, returning the sample just plotted
    pub fn advance(&mut self) -> Option<SamplePoint> {
        let point = self.buffer.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(point)
    }

    /// Reset playback to the first sample
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Mark the whole buffer as plotted
    pub fn seek_end(&mut self) {
        self.cursor = self.buffer.len();
    }

    pub(crate) fn replace_buffer(&mut self, buffer: Vec<SamplePoint>) {
        self.buffer = buffer;
        self.cursor = 0;
        self.streamed = false;
    }

    pub(crate) fn extend_buffer(&mut self, points: impl IntoIterator<Item = SamplePoint>) {
        self.buffer.extend(points);
        self.cursor = 0;
    }

    pub(crate) fn push_streamed(&mut self, point: SamplePoint) {
        self.buffer.push(point);
        self.cursor = self.buffer.len();
        self.streamed = true;
    }

    pub(crate) fn take_buffer(&mut self) -> Vec<SamplePoint> {
        self.cursor = 0;
        self.streamed = false;
        std::mem::take(&mut self.buffer)
    }

    /// Reset both view ranges to fit the buffer
    pub(crate) fn fit_views(&mut self, value_padding: f64) {
        let (t0, t1) = self.bounds();
        self.view = ViewRange::new(t0, t1);
        let (v0, v1) = self.value_bounds();
        self.value_view = ViewRange::new(v0 - value_padding, v1 + value_padding);
    }

    pub(crate) fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub(crate) fn set_color(&mut self, color: ChannelColor) {
        self.color = color;
    }
}

fn finite_extent(xs: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = xs
        .filter(|x| x.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
            (lo.min(x), hi.max(x))
        });
    if lo <= hi {
        (lo, hi)
    } else {
        (0.0, 1.0)
    }
}
