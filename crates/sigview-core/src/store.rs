//! ChannelStore: single owner of every channel's data and presentation state

use crate::channel::{Channel, ChannelColor, ChannelId, SamplePoint};
use crate::error::{SigError, SigResult};
use std::collections::BTreeMap;
use tracing::debug;

/// Vertical padding added around the value bounds when a buffer is fitted
pub const DEFAULT_VALUE_PADDING: f64 = 0.1;

/// Holds one record per channel of a fixed channel set
#[derive(Debug, Clone)]
pub struct ChannelStore {
    channels: BTreeMap<ChannelId, Channel>,
    value_padding: f64,
}

impl ChannelStore {
    /// Store holding every known channel
    pub fn new() -> Self {
        Self::with_channels(&ChannelId::ALL)
    }

    /// Store holding only the given channels
    pub fn with_channels(ids: &[ChannelId]) -> Self {
        Self {
            channels: ids.iter().map(|&id| (id, Channel::new(id))).collect(),
            value_padding: DEFAULT_VALUE_PADDING,
        }
    }

    pub fn with_value_padding(mut self, padding: f64) -> Self {
        self.value_padding = padding;
        self
    }

    /// Channel identifiers in display order
    pub fn ids(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.channels.keys().copied()
    }

    pub fn contains(&self, id: ChannelId) -> bool {
        self.channels.contains_key(&id)
    }

    pub fn channel(&self, id: ChannelId) -> SigResult<&Channel> {
        self.channels.get(&id).ok_or_else(|| unknown(id))
    }

    pub fn channel_mut(&mut self, id: ChannelId) -> SigResult<&mut Channel> {
        self.channels.get_mut(&id).ok_or_else(|| unknown(id))
    }

    /// Load a time/value pair of arrays into a channel.
    ///
    /// Replaces the buffer unless `append` is set and the channel already
    /// holds samples. Cursor and plotted prefix are reset either way; the
    /// playing flag is left untouched.
    pub fn load(
        &mut self,
        id: ChannelId,
        times: &[f64],
        values: &[f64],
        append: bool,
    ) -> SigResult<()> {
        if times.len() != values.len() {
            return Err(SigError::ShapeMismatch {
                times: times.len(),
                values: values.len(),
            });
        }

        let points = times
            .iter()
            .zip(values)
            .map(|(&time, &value)| SamplePoint::new(time, value));
        let padding = self.value_padding;
        let channel = self.channel_mut(id)?;

        if append && !channel.is_empty() {
            channel.extend_buffer(points);
        } else {
            channel.replace_buffer(points.collect());
        }
        channel.fit_views(padding);

        debug!(channel = %id, samples = channel.len(), append, "loaded series");
        Ok(())
    }

    /// Replace a channel's buffer with ready-made points
    pub fn load_points(&mut self, id: ChannelId, points: Vec<SamplePoint>) -> SigResult<()> {
        let padding = self.value_padding;
        let channel = self.channel_mut(id)?;
        channel.replace_buffer(points);
        channel.fit_views(padding);
        debug!(channel = %id, samples = channel.len(), "loaded points");
        Ok(())
    }

    /// Append one live sample; the sample counts as plotted immediately
    pub fn append_stream(&mut self, id: ChannelId, point: SamplePoint) -> SigResult<()> {
        let padding = self.value_padding;
        let channel = self.channel_mut(id)?;
        channel.push_streamed(point);
        channel.fit_views(padding);
        Ok(())
    }

    /// First and last sample time of a channel, `(0, 1)` when empty
    pub fn bounds(&self, id: ChannelId) -> SigResult<(f64, f64)> {
        Ok(self.channel(id)?.bounds())
    }

    pub fn set_visible(&mut self, id: ChannelId, visible: bool) -> SigResult<()> {
        self.channel_mut(id)?.set_visible(visible);
        Ok(())
    }

    /// Flip visibility, returning the new state
    pub fn toggle_visible(&mut self, id: ChannelId) -> SigResult<bool> {
        let channel = self.channel_mut(id)?;
        let visible = !channel.is_visible();
        channel.set_visible(visible);
        Ok(visible)
    }

    pub fn set_color(&mut self, id: ChannelId, color: ChannelColor) -> SigResult<()> {
        self.channel_mut(id)?.set_color(color);
        Ok(())
    }

    pub fn set_playing(&mut self, id: ChannelId, playing: bool) -> SigResult<()> {
        self.channel_mut(id)?.set_playing(playing);
        Ok(())
    }

    pub fn is_playing(&self, id: ChannelId) -> SigResult<bool> {
        Ok(self.channel(id)?.is_playing())
    }

    /// Empty a channel's buffer and reset its cursor
    pub fn clear(&mut self, id: ChannelId) -> SigResult<()> {
        let padding = self.value_padding;
        let channel = self.channel_mut(id)?;
        channel.take_buffer();
        channel.fit_views(padding);
        Ok(())
    }

    /// Hand a playing channel's signal over to another channel.
    ///
    /// The destination replays the source buffer from the start and begins
    /// playing; the source is emptied and stopped. Returns `false` when
    /// nothing moved (same channel, or source not playing).
    pub fn move_signal(&mut self, source: ChannelId, destination: ChannelId) -> SigResult<bool> {
        self.channel(destination)?;
        if source == destination || !self.is_playing(source)? {
            return Ok(false);
        }

        let padding = self.value_padding;
        let src = self.channel_mut(source)?;
        let buffer = src.take_buffer();
        src.set_playing(false);
        src.fit_views(padding);

        let dst = self.channel_mut(destination)?;
        dst.replace_buffer(buffer);
        dst.fit_views(padding);
        dst.set_playing(true);

        debug!(from = %source, to = %destination, "moved signal");
        Ok(true)
    }
}

impl Default for ChannelStore {
    fn default() -> Self {
        Self::new()
    }
}

fn unknown(id: ChannelId) -> SigError {
    SigError::UnknownChannel {
        name: id.name().to_string(),
    }
}
