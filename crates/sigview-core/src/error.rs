//! Error handling for the sigview engine
//!
//! Every fallible engine operation returns [`SigResult`]. Only
//! `UnknownChannel` and `ShapeMismatch` are meant to reach the host as
//! programming/input errors; the rest are recoverable inside the engine.

use crate::channel::Axis;
use thiserror::Error;

/// Result type alias for sigview operations
pub type SigResult<T> = Result<T, SigError>;

/// Error type for all engine operations
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum SigError {
    /// Channel name is not part of the engine's channel set
    #[error("Unknown channel: {name}")]
    UnknownChannel {
        /// Name that failed to resolve
        name: String,
    },

    /// Time and value arrays of a load differ in length
    #[error("Shape mismatch: {times} time samples vs {values} values")]
    ShapeMismatch {
        /// Length of the time array
        times: usize,
        /// Length of the value array
        values: usize,
    },

    /// An operation needed points and got none
    #[error("Empty input: {reason}")]
    EmptyInput {
        /// What was empty
        reason: &'static str,
    },

    /// A coordinate mapping was asked to divide by a zero-span range
    #[error("Degenerate {axis} range at {at}: span is zero")]
    DegenerateRange {
        /// Axis whose range collapsed
        axis: Axis,
        /// Position of the collapsed range
        at: f64,
    },

    /// Live feed request or payload failure
    #[error("Feed error: {reason}")]
    FeedError {
        /// Description of the failure
        reason: String,
    },

    /// Invalid engine configuration or parameter
    #[error("Configuration error: {message}")]
    ConfigurationError {
        /// Description of the configuration problem
        message: String,
    },

    /// A series file could not be read or parsed
    #[error("Failed to load {path}: {reason}")]
    LoadError {
        /// Path of the file
        path: String,
        /// Description of the failure
        reason: String,
    },
}

impl SigError {
    /// Whether the error is a caller mistake that should surface to the host
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            SigError::UnknownChannel { .. } | SigError::ShapeMismatch { .. }
        )
    }
}

/// Convenience macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::error::SigError::ConfigurationError {
            message: format!($($arg)*),
        }
    };
}

/// Convenience macro for creating feed errors
#[macro_export]
macro_rules! feed_error {
    ($($arg:tt)*) => {
        $crate::error::SigError::FeedError {
            reason: format!($($arg)*),
        }
    };
}
