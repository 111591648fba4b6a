//! sigview-cine: Cine playback of signal channels
//!
//! Playback state machine, the engine facade hosts drive, the async driver
//! that fires ticks, live feed polling and synthetic demo signals.

pub mod driver;
pub mod engine;
pub mod feed;
pub mod playback;
pub mod sink;
pub mod synth;

pub use driver::{start_cine_driver, CineDriver, EngineCommand};
pub use engine::{ChannelSnapshot, SignalEngine};
pub use feed::{
    parse_feed_payload, start_feed_poller, validate_feed_url, FeedPoller, FeedSample, HttpFeed,
    LiveFeed,
};
pub use playback::{PlaybackController, TickSource};
pub use sink::{NullSink, RecordingSink, RenderSink, SinkLog, DEFAULT_VIEWPORT};
pub use synth::{generate_series, SignalPattern, SynthConfig};
