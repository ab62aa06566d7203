//! Sleep-stage posteriors and derived depth indices
//!
//! An external classifier emits five posteriors per epoch (Wake, N1, N2, N3,
//! REM). They arrive unnormalized and possibly malformed; this module clamps,
//! normalizes and folds them into a small set of unit-interval indices:
//!
//! - `iN1`, `iN2`, `iN3`: normalized stage mass, passed through
//! - `iN2N3`: weighted deep-sleep indicator (N3 counts fully, N2 half)
//! - `iQuestion`: classifier uncertainty, `1 - max(stage mass)`
//! - `gSafe`: conservative gate for intensifying the stimulus
//!
//! # Example
//!
//! ```
//! use dreamspectre_core::sleep::{compute_sleep_indices, PosteriorDistribution};
//!
//! let posteriors = PosteriorDistribution { p_n2: 1.0, ..Default::default() };
//! let indices = compute_sleep_indices(&posteriors);
//!
//! assert_eq!(indices.i_n2n3, 0.5);
//! assert_eq!(indices.i_question, 0.0);
//! assert_eq!(indices.g_safe, 1.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::math::{clamp01, constants::NORMALIZATION_EPSILON, max_or_zero, nullable_f64};

// ============================================================================
// Sleep Stages
// ============================================================================

/// Sleep stage scored by the upstream classifier.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SleepStage {
    /// Wakefulness
    Wake,
    /// Light sleep, stage 1
    N1,
    /// Light sleep, stage 2 (spindles, K-complexes)
    N2,
    /// Slow-wave sleep
    N3,
    /// Rapid eye movement sleep
    Rem,
}

impl SleepStage {
    /// All stages in canonical order.
    pub const ALL: [Self; 5] = [Self::Wake, Self::N1, Self::N2, Self::N3, Self::Rem];

    /// Get the conventional stage label.
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Wake => "W",
            Self::N1 => "N1",
            Self::N2 => "N2",
            Self::N3 => "N3",
            Self::Rem => "REM",
        }
    }

    /// Whether this stage counts toward the deep-sleep indicator.
    #[inline]
    #[must_use]
    pub const fn is_deep(self) -> bool {
        matches!(self, Self::N2 | Self::N3)
    }
}

// ============================================================================
// Posterior Distribution
// ============================================================================

/// Raw stage posteriors for one epoch.
///
/// Fields are not required to sum to 1 and may be absent (read as 0) in the
/// serialized form.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PosteriorDistribution {
    /// P(Wake)
    #[serde(rename = "pWake", deserialize_with = "nullable_f64")]
    pub p_wake: f64,
    /// P(N1)
    #[serde(rename = "pN1", deserialize_with = "nullable_f64")]
    pub p_n1: f64,
    /// P(N2)
    #[serde(rename = "pN2", deserialize_with = "nullable_f64")]
    pub p_n2: f64,
    /// P(N3)
    #[serde(rename = "pN3", deserialize_with = "nullable_f64")]
    pub p_n3: f64,
    /// P(REM)
    #[serde(rename = "pREM", deserialize_with = "nullable_f64")]
    pub p_rem: f64,
}

impl PosteriorDistribution {
    /// Create a distribution from the five stage posteriors in canonical order.
    #[inline]
    #[must_use]
    pub const fn new(p_wake: f64, p_n1: f64, p_n2: f64, p_n3: f64, p_rem: f64) -> Self {
        Self { p_wake, p_n1, p_n2, p_n3, p_rem }
    }

    /// Create a distribution with all mass on one stage.
    #[must_use]
    pub fn certain(stage: SleepStage) -> Self {
        let mut dist = Self::default();
        *dist.get_mut(stage) = 1.0;
        dist
    }

    /// Get the raw posterior for a stage.
    #[inline]
    #[must_use]
    pub const fn get(&self, stage: SleepStage) -> f64 {
        match stage {
            SleepStage::Wake => self.p_wake,
            SleepStage::N1 => self.p_n1,
            SleepStage::N2 => self.p_n2,
            SleepStage::N3 => self.p_n3,
            SleepStage::Rem => self.p_rem,
        }
    }

    fn get_mut(&mut self, stage: SleepStage) -> &mut f64 {
        match stage {
            SleepStage::Wake => &mut self.p_wake,
            SleepStage::N1 => &mut self.p_n1,
            SleepStage::N2 => &mut self.p_n2,
            SleepStage::N3 => &mut self.p_n3,
            SleepStage::Rem => &mut self.p_rem,
        }
    }

    /// Clamp every posterior to `[0, 1]` and rescale so the five sum to 1.
    ///
    /// When the clamped sum is at or below [`NORMALIZATION_EPSILON`] the
    /// epsilon is used as divisor, so an all-zero input normalizes to zeros
    /// instead of dividing by zero.
    #[must_use]
    pub fn normalize(&self) -> NormalizedPosteriors {
        let clamped = SleepStage::ALL.map(|stage| clamp01(self.get(stage)));

        let sum: f64 = clamped.iter().sum();
        let divisor = if sum <= NORMALIZATION_EPSILON {
            NORMALIZATION_EPSILON
        } else {
            sum
        };

        let [wake, n1, n2, n3, rem] = clamped.map(|p| p / divisor);
        NormalizedPosteriors { wake, n1, n2, n3, rem }
    }
}

// ============================================================================
// Normalized Posteriors
// ============================================================================

/// Stage posteriors after clamping and normalization.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPosteriors {
    /// Normalized Wake mass
    pub wake: f64,
    /// Normalized N1 mass
    pub n1: f64,
    /// Normalized N2 mass
    pub n2: f64,
    /// Normalized N3 mass
    pub n3: f64,
    /// Normalized REM mass
    pub rem: f64,
}

impl NormalizedPosteriors {
    /// Get the normalized mass for a stage.
    #[inline]
    #[must_use]
    pub const fn mass(&self, stage: SleepStage) -> f64 {
        match stage {
            SleepStage::Wake => self.wake,
            SleepStage::N1 => self.n1,
            SleepStage::N2 => self.n2,
            SleepStage::N3 => self.n3,
            SleepStage::Rem => self.rem,
        }
    }

    /// Largest stage mass.
    #[must_use]
    pub fn max_mass(&self) -> f64 {
        max_or_zero(&SleepStage::ALL.map(|stage| self.mass(stage)))
    }

    /// Stage holding the largest mass.
    ///
    /// Ties go to the earliest stage in canonical order. Returns `None` when
    /// every stage has zero mass.
    #[must_use]
    pub fn dominant_stage(&self) -> Option<SleepStage> {
        let mut best: Option<(SleepStage, f64)> = None;
        for stage in SleepStage::ALL {
            let mass = self.mass(stage);
            if mass > best.map_or(0.0, |(_, m)| m) {
                best = Some((stage, mass));
            }
        }
        best.map(|(stage, _)| stage)
    }
}

// ============================================================================
// Sleep Indices
// ============================================================================

/// Derived sleep-depth indices, each in `[0, 1]`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SleepIndices {
    /// Normalized N1 mass
    #[serde(rename = "iN1")]
    pub i_n1: f64,
    /// Normalized N2 mass
    #[serde(rename = "iN2")]
    pub i_n2: f64,
    /// Normalized N3 mass
    #[serde(rename = "iN3")]
    pub i_n3: f64,
    /// Deep-sleep indicator: `0.5·N2 + N3`
    #[serde(rename = "iN2N3")]
    pub i_n2n3: f64,
    /// Classifier uncertainty: `1 - max(stage mass)`
    #[serde(rename = "iQuestion")]
    pub i_question: f64,
    /// Stimulus intensification gate
    #[serde(rename = "gSafe")]
    pub g_safe: f64,
}

impl SleepIndices {
    /// Weight of N2 in the deep-sleep indicator
    pub const N2_WEIGHT: f64 = 0.5;

    /// Weight of N3 in the deep-sleep indicator
    pub const N3_WEIGHT: f64 = 1.0;

    /// Weight of classifier certainty in the safety gate
    pub const CERTAINTY_WEIGHT: f64 = 0.5;

    /// Derive indices from already-normalized posteriors.
    #[must_use]
    pub fn from_normalized(n: &NormalizedPosteriors) -> Self {
        let i_n2n3 = clamp01(Self::N2_WEIGHT * n.n2 + Self::N3_WEIGHT * n.n3);
        let i_question = clamp01(1.0 - n.max_mass());
        let g_safe = (i_n2n3 + Self::CERTAINTY_WEIGHT * (1.0 - i_question)).min(1.0);

        Self {
            i_n1: n.n1,
            i_n2: n.n2,
            i_n3: n.n3,
            i_n2n3,
            i_question,
            g_safe,
        }
    }

    /// All six indices in declaration order.
    #[inline]
    #[must_use]
    pub const fn as_array(&self) -> [f64; 6] {
        [self.i_n1, self.i_n2, self.i_n3, self.i_n2n3, self.i_question, self.g_safe]
    }
}

/// Clamp, normalize and derive the sleep-depth indices for one epoch.
#[must_use]
pub fn compute_sleep_indices(posteriors: &PosteriorDistribution) -> SleepIndices {
    SleepIndices::from_normalized(&posteriors.normalize())
}

// ============================================================================
// Tests
// ============================================================================
