//! Epoch audit records
//!
//! An audit record ties the biometric state that triggered a stimulus epoch
//! (its sleep indices) to a fingerprint of the exact feature vector that
//! produced them. XR/BCI logging consumes it as JSON:
//!
//! ```json
//! {
//!   "indices": { "iN1": 0.1, "iN2": 0.5, "iN3": 0.3, "iN2N3": 0.55, "iQuestion": 0.5, "gSafe": 0.8 },
//!   "spectralHex": "a8975c8a253ef7d6"
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::sleep::{compute_sleep_indices, PosteriorDistribution, SleepIndices};
use crate::spectral::{EpochFeatureVector, EpochFeatures, SpectralFingerprint};

/// Reference hex grounding tag distributed with the engine: `0x` and 96 hex digits.
pub const HEX_GROUNDING_TAG: &str =
    "0x47a1c3be92d5f8041e7b2c9d5fa0836e29c4b7ad3e16f9a0c5d2e8f173ab904c8f1d2e3a4b596c7d8091a2b3c4d5e6f7";

/// Sleep indices plus the feature-vector fingerprint for one epoch.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochAuditRecord {
    /// Indices derived from the epoch posteriors
    pub indices: SleepIndices,
    /// Fingerprint of the 12-element epoch feature vector
    pub spectral_hex: SpectralFingerprint,
}

impl EpochAuditRecord {
    /// Check this record against the inputs it claims to describe.
    ///
    /// Recomputes both fields and compares them exactly; the computation is
    /// deterministic so any difference means the record or the inputs changed.
    #[must_use]
    pub fn verify(&self, features: &EpochFeatures, posteriors: &PosteriorDistribution) -> bool {
        *self == build_epoch_audit_record(features, posteriors)
    }
}

/// Build the audit record for one epoch.
///
/// The fingerprint covers the raw posteriors as received (`pN1`, `pN2`,
/// `pN3`), not their normalized values.
#[must_use]
pub fn build_epoch_audit_record(
    features: &EpochFeatures,
    posteriors: &PosteriorDistribution,
) -> EpochAuditRecord {
    EpochAuditRecord {
        indices: compute_sleep_indices(posteriors),
        spectral_hex: EpochFeatureVector::assemble(features, posteriors).fingerprint(),
    }
}

// ============================================================================
// Tests
// ============================================================================
