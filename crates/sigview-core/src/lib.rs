//! sigview-core: Foundation types for multi-channel signal playback
//!
//! Channel model, the channel store, link groups and the shared error type.

pub mod channel;
pub mod error;
pub mod link;
pub mod stats;
pub mod store;

pub use channel::*;
pub use error::{SigError, SigResult};
pub use link::LinkGroup;
pub use stats::ChannelStats;
pub use store::ChannelStore;
