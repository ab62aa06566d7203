//! Dreamspectre Audio - Binaural-beat buffer synthesis
//!
//! This crate renders stereo sleep-induction buffers:
//! - Two detuned sine carriers (one per ear)
//! - Linear fade-in / fade-out envelope
//! - White or brown noise, decorrelated per channel
//! - Seeded chunked rendering, parallel with the `parallel` feature
//!
//! # Modules
//!
//! - [`config`]: Optional-field configs and their resolution to parameters
//! - [`envelope`]: Gain envelope and ramp overlap policy
//! - [`noise`]: Noise sources
//! - [`synth`]: Buffer renderer
//! - [`cancel`]: Cooperative cancellation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

pub mod cancel;
pub mod config;
pub mod envelope;
pub mod error;
pub mod noise;
pub mod synth;

pub use cancel::CancelToken;
pub use config::{NoiseConfig, NoiseType, SynthesisConfig, SynthesisParams};
pub use envelope::{Envelope, RampOverlap};
pub use error::{SynthesisError, SynthesisResult};
pub use noise::{BrownIntegrator, NoiseChannel, StereoNoise};
pub use synth::{
    generate_binaural_buffer, BinauralBuffer, BinauralSynthesizer, BufferStats, ChannelStats,
};
