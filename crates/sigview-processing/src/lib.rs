//! sigview-processing: Numerical core of the viewer
//!
//! Data/pixel mapping, region selection, signal gluing, the circular sweep
//! and the engine configuration.

pub mod circular;
pub mod config;
pub mod glue;
pub mod selection;
pub mod viewport;

pub use circular::{CirclePoint, CircleSweep};
pub use config::{EngineConfig, FeedParams, GlueParams, PlaybackParams, ViewportParams};
pub use glue::GlueEngine;
pub use selection::{RegionSelector, SelectionRect, SelectionState};
pub use viewport::{PixelPoint, PixelSize, ViewportMapper};
