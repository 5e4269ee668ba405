// src/error.rs

//! Error taxonomy for the visualization pipeline.
//!
//! `ConfigFetchFailure`, `InvalidTopology` and `BufferTooLarge` are fatal at
//! startup.
//! `FrameSizeMismatch` is recoverable: the frame is dropped and the pixel
//! buffer keeps its last good content. An empty topology is not an error.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisualizerError {
    /// The settings endpoint could not be reached, answered with a non-200
    /// status, or returned a body that is not the expected JSON document.
    ConfigFetchFailure(String),

    /// A device entry declared a negative or non-integer count, or a count
    /// too large for the pixel buffer to hold.
    InvalidTopology {
        entry: usize,
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    /// No pixel buffer can be allocated for this many LEDs.
    BufferTooLarge { led_count: usize },

    /// An incoming frame does not have the length the pixel buffer expects.
    FrameSizeMismatch { expected: usize, actual: usize },
}

impl fmt::Display for VisualizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisualizerError::ConfigFetchFailure(reason) => {
                write!(f, "failed to fetch device configuration: {}", reason)
            }
            VisualizerError::InvalidTopology {
                entry,
                field,
                value,
                reason,
            } => write!(
                f,
                "invalid topology: device_config[{}].{} = {} {}",
                entry, field, value, reason
            ),
            VisualizerError::BufferTooLarge { led_count } => {
                write!(f, "no pixel buffer can hold {} LEDs", led_count)
            }
            VisualizerError::FrameSizeMismatch { expected, actual } => write!(
                f,
                "frame size mismatch: expected {} bytes, got {}",
                expected, actual
            ),
        }
    }
}

impl std::error::Error for VisualizerError {}
