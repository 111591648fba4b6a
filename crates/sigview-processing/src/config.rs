//! Configuration management for the playback engine

use serde::{Deserialize, Serialize};
use sigview_core::{config_error, ChannelColor, ChannelId, SigResult};
use std::collections::BTreeMap;
use std::time::Duration;

/// Global engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Configuration name/profile
    pub name: String,
    /// Cine playback timing
    pub playback: PlaybackParams,
    /// Zoom, pan and mapping parameters
    pub viewport: ViewportParams,
    /// Signal gluing parameters
    pub glue: GlueParams,
    /// Members of the link group; the first one's view wins
    pub link_pair: (ChannelId, ChannelId),
    /// Initial color per channel
    pub colors: BTreeMap<ChannelId, ChannelColor>,
    /// Live feed polling
    pub feed: FeedParams,
}

/// Cine playback timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackParams {
    /// Samples plotted per second at startup
    pub sampling_rate: f64,
    /// Lowest value accepted from the speed control
    pub min_speed: f64,
    /// Highest value accepted from the speed control
    pub max_speed: f64,
    /// Interval of the circular sweep (ms)
    pub circular_interval_ms: u64,
}

/// Zoom, pan and mapping parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportParams {
    /// Fraction of the span removed from each edge on zoom in
    pub zoom_factor: f64,
    /// Smallest span used for coordinate mapping
    pub min_span: f64,
    /// Padding around the value bounds when fitting a channel
    pub value_padding: f64,
    /// Time shift per scroll step
    pub pan_time_step: f64,
    /// Value shift per scroll step
    pub pan_value_step: f64,
}

/// Signal gluing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlueParams {
    /// Value jump above which a bridge is interpolated
    pub threshold: f64,
    /// Gap/overlap used when the host gives none
    pub default_gap: f64,
    /// Bridge point count used when the host gives none
    pub default_order: usize,
}

/// Live feed polling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedParams {
    /// Endpoint returning a JSON object
    pub url: Option<String>,
    /// Channel receiving feed samples
    pub channel: ChannelId,
    /// JSON field holding the numeric value
    pub field: String,
    /// Delay between polls (ms)
    pub poll_interval_ms: u64,
    /// Per-request timeout (ms)
    pub timeout_ms: u64,
}

impl EngineConfig {
    /// Tick interval for the configured sampling rate
    pub fn tick_interval(&self) -> SigResult<Duration> {
        rate_to_interval(self.playback.sampling_rate)
    }

    /// Tick interval for a speed control value, `1000 / speed` ms
    pub fn interval_for_speed(&self, speed: f64) -> SigResult<Duration> {
        let PlaybackParams {
            min_speed,
            max_speed,
            ..
        } = self.playback;
        if !(min_speed..=max_speed).contains(&speed) {
            return Err(config_error!(
                "speed {} outside {}-{}",
                speed,
                min_speed,
                max_speed
            ));
        }
        rate_to_interval(speed)
    }

    /// Color for a channel, falling back to its built-in default
    pub fn color_for(&self, id: ChannelId) -> ChannelColor {
        self.colors
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.default_color())
    }

    /// Validate entire configuration
    pub fn validate(&self) -> SigResult<()> {
        let playback = &self.playback;
        if !(playback.sampling_rate > 0.0) {
            return Err(config_error!("Sampling rate must be positive"));
        }
        if !(playback.min_speed > 0.0) || playback.min_speed > playback.max_speed {
            return Err(config_error!(
                "Invalid speed range {}-{}",
                playback.min_speed,
                playback.max_speed
            ));
        }
        self.tick_interval()?;
        rate_to_interval(playback.min_speed)?;
        rate_to_interval(playback.max_speed)?;
        if playback.circular_interval_ms == 0 {
            return Err(config_error!("Circular interval must be positive"));
        }

        let viewport = &self.viewport;
        if !(viewport.zoom_factor > 0.0 && viewport.zoom_factor < 0.5) {
            return Err(config_error!(
                "Zoom factor must be in (0, 0.5), got {}",
                viewport.zoom_factor
            ));
        }
        if !(viewport.min_span > 0.0) {
            return Err(config_error!("Minimum span must be positive"));
        }
        if viewport.value_padding < 0.0 {
            return Err(config_error!("Value padding must not be negative"));
        }

        if self.glue.threshold < 0.0 {
            return Err(config_error!("Glue threshold must not be negative"));
        }

        if self.link_pair.0 == self.link_pair.1 {
            return Err(config_error!(
                "Link pair needs two distinct channels, got {} twice",
                self.link_pair.0
            ));
        }

        if self.feed.field.is_empty() {
            return Err(config_error!("Feed field name must not be empty"));
        }
        if self.feed.poll_interval_ms == 0 {
            return Err(config_error!("Feed poll interval must be positive"));
        }

        Ok(())
    }

    /// Export configuration to JSON
    pub fn to_json(&self) -> SigResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| config_error!("Failed to serialize configuration: {}", e))
    }

    /// Import configuration from JSON
    pub fn from_json(json: &str) -> SigResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| config_error!("Failed to deserialize configuration: {}", e))?;
        config.validate()?;
        Ok(config)
    }
}

/// `1 / rate` seconds, rejecting rates whose period is zero or does not
/// fit in a `Duration`
fn rate_to_interval(rate: f64) -> SigResult<Duration> {
    let interval = Duration::try_from_secs_f64(1.0 / rate)
        .map_err(|e| config_error!("Rate {} has no usable interval: {}", rate, e))?;
    if interval.is_zero() {
        return Err(config_error!("Rate {} is too high", rate));
    }
    Ok(interval)
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            playback: PlaybackParams::default(),
            viewport: ViewportParams::default(),
            glue: GlueParams::default(),
            link_pair: (ChannelId::Graph1, ChannelId::Graph2),
            colors: ChannelId::ALL
                .iter()
                .map(|&id| (id, id.default_color()))
                .collect(),
            feed: FeedParams::default(),
        }
    }
}

impl Default for PlaybackParams {
    fn default() -> Self {
        Self {
            sampling_rate: 50.0,
            min_speed: 1.0,
            max_speed: 100.0,
            circular_interval_ms: 100,
        }
    }
}

impl Default for ViewportParams {
    fn default() -> Self {
        Self {
            zoom_factor: 0.25,
            min_span: 1e-9,
            value_padding: 0.1,
            pan_time_step: 0.1,
            pan_value_step: 1.0,
        }
    }
}

impl Default for GlueParams {
    fn default() -> Self {
        Self {
            threshold: 20.0,
            default_gap: 0.0,
            default_order: 1,
        }
    }
}

impl Default for FeedParams {
    fn default() -> Self {
        Self {
            url: None,
            channel: ChannelId::Graph1,
            field: "price".to_string(),
            poll_interval_ms: 1000,
            timeout_ms: 5000,
        }
    }
}
