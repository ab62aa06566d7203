//! DreamSpectre Core - `no_std` sleep-depth indices and epoch fingerprints
//!
//! This crate turns classifier posteriors and spectral epoch features into
//! the values the neuro-entrainment stimulus is gated on, plus a
//! tamper-evident audit record. It is allocation-free and designed to work in
//! `no_std` environments as well as `std` environments.
//!
//! # Modules
//!
//! - [`math`]: Unit-interval clamping and fixed-width wrapping
//! - [`sleep`]: Posterior normalization and sleep-depth indices
//! - [`spectral`]: Epoch feature vectors and the spectral fingerprint
//! - [`audit`]: Epoch audit records
//! - [`error`]: Error types
//!
//! # Features
//!
//! - `std`: Enable standard library support (`std::error::Error` impls)
//!
//! # Example
//!
//! ```rust
//! use dreamspectre_core::{build_epoch_audit_record, EpochFeatures, PosteriorDistribution};
//!
//! let features = EpochFeatures { delta_norm: 0.42, slow_wave: 0.63, ..Default::default() };
//! let posteriors = PosteriorDistribution { p_n2: 0.6, p_n3: 0.3, p_n1: 0.1, ..Default::default() };
//!
//! let record = build_epoch_audit_record(&features, &posteriors);
//! assert!(record.indices.g_safe > 0.5);
//! assert_eq!(record.spectral_hex.as_str().len(), 16);
//! ```

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

#[cfg(feature = "std")]
extern crate std;

pub mod audit;
pub mod error;
pub mod math;
pub mod sleep;
pub mod spectral;

// Re-export commonly used types at crate root
pub use audit::{build_epoch_audit_record, EpochAuditRecord, HEX_GROUNDING_TAG};
pub use error::FingerprintParseError;
pub use math::clamp01;
pub use sleep::{
    compute_sleep_indices, NormalizedPosteriors, PosteriorDistribution, SleepIndices, SleepStage,
};
pub use spectral::{hash_spectral_vector, EpochFeatureVector, EpochFeatures, SpectralFingerprint};
