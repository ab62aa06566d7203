//! Synthesis error types
//!
//! Error types for buffer synthesis and configuration loading using
//! `thiserror`. Malformed numeric fields never surface here: they resolve to
//! defaults or zero. Only loading, cancellation and allocation limits fail.

use thiserror::Error;

/// Binaural synthesis error types
#[derive(Error, Debug)]
pub enum SynthesisError {
    /// Render stopped because its cancel token was triggered
    #[error("Synthesis cancelled at frame {at_frame} of {total_frames}")]
    Cancelled {
        /// Global frame index at which cancellation was observed
        at_frame: usize,
        /// Frames the full buffer would have held
        total_frames: usize,
    },

    /// Requested buffer exceeds the per-render frame limit
    #[error("Requested {requested} frames exceeds the limit of {max} frames per buffer")]
    TooManyFrames {
        /// Frames implied by sample rate and duration
        requested: usize,
        /// Maximum frames per buffer
        max: usize,
    },

    /// Configuration document could not be parsed
    #[error("Invalid synthesis config: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type for synthesis operations
pub type SynthesisResult<T> = Result<T, SynthesisError>;
