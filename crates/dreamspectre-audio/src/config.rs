//! Synthesis configuration
//!
//! [`SynthesisConfig`] is the loosely-typed document a caller supplies: every
//! field is optional and the JSON layout matches the engine's stored
//! configs.
//!
//! ```json
//! {
//!   "sample_rate": 48000,
//!   "duration_seconds": 600,
//!   "carrier_hz": 210.0,
//!   "beat_hz": 10.0,
//!   "ramp_up_seconds": 60,
//!   "ramp_down_seconds": 60,
//!   "noise": { "type": "brown", "level": 0.15 }
//! }
//! ```
//!
//! It resolves into [`SynthesisParams`], which has every value filled in.
//! Two resolution rules exist:
//!
//! - [`SynthesisConfig::resolve`]: a default replaces a field only when
//!   the field is absent. An explicit `beat_hz: 0` stays 0 (monaural output).
//! - [`SynthesisConfig::resolve_legacy`]: a default also replaces 0 and NaN,
//!   which reproduces buffers rendered from configs stored by earlier engine
//!   versions.
//!
//! Whichever rule is used, non-finite values that survive resolution are
//! treated as 0. An unrecognized `noise.type` reads as absent, so it
//! resolves to brown noise.

use dreamspectre_core::math::finite_or_zero;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::envelope::{Envelope, RampOverlap};
use crate::error::SynthesisResult;

// ============================================================================
// Defaults
// ============================================================================

/// Default sampling rate in Hz
pub const DEFAULT_SAMPLE_RATE: f64 = 48_000.0;
/// Default buffer duration in seconds
pub const DEFAULT_DURATION_SECONDS: f64 = 600.0;
/// Default left-ear carrier in Hz
pub const DEFAULT_CARRIER_HZ: f64 = 210.0;
/// Default interaural offset (alpha band) in Hz
pub const DEFAULT_BEAT_HZ: f64 = 10.0;
/// Default fade-in length in seconds
pub const DEFAULT_RAMP_UP_SECONDS: f64 = 60.0;
/// Default fade-out length in seconds
pub const DEFAULT_RAMP_DOWN_SECONDS: f64 = 60.0;
/// Default noise amplitude relative to the tone
pub const DEFAULT_NOISE_LEVEL: f64 = 0.15;

// ============================================================================
// Noise Type
// ============================================================================

/// Colored-noise flavor mixed under the tones.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseType {
    /// Independent uniform draws
    White,
    /// Leaky-integrated random walk
    #[default]
    Brown,
}

impl NoiseType {
    /// Get the configuration name.
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Brown => "brown",
        }
    }

    /// Look up a flavor by its exact configuration name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "white" => Some(Self::White),
            "brown" => Some(Self::Brown),
            _ => None,
        }
    }
}

/// Deserialize `noise.type`, reading any unrecognized value as absent.
fn lenient_noise_type<'de, D>(deserializer: D) -> Result<Option<NoiseType>, D::Error>
where
    D: Deserializer<'de>,
{
    let kind = match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(name) => {
            let kind = NoiseType::from_name(&name);
            if kind.is_none() {
                warn!("Unknown noise type {:?}, falling back to {}", name, NoiseType::default().name());
            }
            kind
        }
        other => {
            warn!("Non-string noise type {}, falling back to {}", other, NoiseType::default().name());
            None
        }
    };
    Ok(kind)
}

/// Noise section of a synthesis config.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Noise flavor
    #[serde(
        rename = "type",
        deserialize_with = "lenient_noise_type",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<NoiseType>,
    /// Noise amplitude relative to the tone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<f64>,
}

// ============================================================================
// Synthesis Config
// ============================================================================

/// Caller-supplied synthesis configuration. All fields are optional.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Sampling rate in Hz
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<f64>,
    /// Buffer duration in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    /// Left-ear tone frequency in Hz
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier_hz: Option<f64>,
    /// Right-ear offset above the carrier in Hz
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beat_hz: Option<f64>,
    /// Fade-in length in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ramp_up_seconds: Option<f64>,
    /// Fade-out length in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ramp_down_seconds: Option<f64>,
    /// Noise section
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise: Option<NoiseConfig>,
    /// Envelope precedence when the ramp windows overlap
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ramp_overlap: Option<RampOverlap>,
}

impl SynthesisConfig {
    /// Create an empty config (every field resolves to its default).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SynthesisError::Config`](crate::SynthesisError::Config) if the
    /// document is not valid JSON or a numeric field has the wrong type.
    pub fn from_json(json: &str) -> SynthesisResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set sampling rate
    #[must_use]
    pub fn with_sample_rate(mut self, hz: f64) -> Self {
        self.sample_rate = Some(hz);
        self
    }

    /// Set duration
    #[must_use]
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    /// Set carrier and beat frequencies
    #[must_use]
    pub fn with_tones(mut self, carrier_hz: f64, beat_hz: f64) -> Self {
        self.carrier_hz = Some(carrier_hz);
        self.beat_hz = Some(beat_hz);
        self
    }

    /// Set fade-in and fade-out lengths
    #[must_use]
    pub fn with_ramps(mut self, up_seconds: f64, down_seconds: f64) -> Self {
        self.ramp_up_seconds = Some(up_seconds);
        self.ramp_down_seconds = Some(down_seconds);
        self
    }

    /// Set noise flavor and level
    #[must_use]
    pub fn with_noise(mut self, kind: NoiseType, level: f64) -> Self {
        self.noise = Some(NoiseConfig { kind: Some(kind), level: Some(level) });
        self
    }

    /// Set noise level, keeping the configured flavor
    #[must_use]
    pub fn with_noise_level(mut self, level: f64) -> Self {
        self.noise.get_or_insert_with(NoiseConfig::default).level = Some(level);
        self
    }

    /// Set ramp overlap precedence
    #[must_use]
    pub fn with_ramp_overlap(mut self, overlap: RampOverlap) -> Self {
        self.ramp_overlap = Some(overlap);
        self
    }

    fn noise_kind(&self) -> Option<NoiseType> {
        self.noise.and_then(|n| n.kind)
    }

    fn noise_level(&self) -> Option<f64> {
        self.noise.and_then(|n| n.level)
    }

    /// Resolve, substituting defaults only for absent fields.
    #[must_use]
    pub fn resolve(&self) -> SynthesisParams {
        let pick = |value: Option<f64>, default: f64| finite_or_zero(value.unwrap_or(default));

        SynthesisParams {
            sample_rate: pick(self.sample_rate, DEFAULT_SAMPLE_RATE),
            duration_seconds: pick(self.duration_seconds, DEFAULT_DURATION_SECONDS),
            carrier_hz: pick(self.carrier_hz, DEFAULT_CARRIER_HZ),
            beat_hz: pick(self.beat_hz, DEFAULT_BEAT_HZ),
            ramp_up_seconds: pick(self.ramp_up_seconds, DEFAULT_RAMP_UP_SECONDS),
            ramp_down_seconds: pick(self.ramp_down_seconds, DEFAULT_RAMP_DOWN_SECONDS),
            noise_type: self.noise_kind().unwrap_or_default(),
            noise_level: pick(self.noise_level(), DEFAULT_NOISE_LEVEL),
            ramp_overlap: self.ramp_overlap.unwrap_or_default(),
        }
    }

    /// Resolve with the legacy rule: 0 and NaN also fall back to defaults.
    #[must_use]
    pub fn resolve_legacy(&self) -> SynthesisParams {
        let pick = |value: Option<f64>, default: f64| match value {
            Some(v) if v != 0.0 && !v.is_nan() => finite_or_zero(v),
            _ => default,
        };

        SynthesisParams {
            sample_rate: pick(self.sample_rate, DEFAULT_SAMPLE_RATE),
            duration_seconds: pick(self.duration_seconds, DEFAULT_DURATION_SECONDS),
            carrier_hz: pick(self.carrier_hz, DEFAULT_CARRIER_HZ),
            beat_hz: pick(self.beat_hz, DEFAULT_BEAT_HZ),
            ramp_up_seconds: pick(self.ramp_up_seconds, DEFAULT_RAMP_UP_SECONDS),
            ramp_down_seconds: pick(self.ramp_down_seconds, DEFAULT_RAMP_DOWN_SECONDS),
            noise_type: self.noise_kind().unwrap_or_default(),
            noise_level: pick(self.noise_level(), DEFAULT_NOISE_LEVEL),
            ramp_overlap: self.ramp_overlap.unwrap_or_default(),
        }
    }
}

// ============================================================================
// Resolved Parameters
// ============================================================================

/// Fully resolved synthesis parameters. Every scalar is finite.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SynthesisParams {
    /// Sampling rate in Hz
    pub sample_rate: f64,
    /// Buffer duration in seconds
    pub duration_seconds: f64,
    /// Left-ear tone frequency in Hz
    pub carrier_hz: f64,
    /// Right-ear offset above the carrier in Hz
    pub beat_hz: f64,
    /// Fade-in length in seconds
    pub ramp_up_seconds: f64,
    /// Fade-out length in seconds
    pub ramp_down_seconds: f64,
    /// Noise flavor
    pub noise_type: NoiseType,
    /// Noise amplitude relative to the tone
    pub noise_level: f64,
    /// Envelope precedence when ramps overlap
    pub ramp_overlap: RampOverlap,
}

impl Default for SynthesisParams {
    fn default() -> Self {
        SynthesisConfig::default().resolve()
    }
}

impl SynthesisParams {
    /// Frames per channel: `floor(sample_rate · duration_seconds)`.
    ///
    /// A non-positive sample rate or duration yields 0.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        if self.sample_rate <= 0.0 || self.duration_seconds <= 0.0 {
            return 0;
        }
        let frames = (self.sample_rate * self.duration_seconds).floor();
        if frames.is_finite() && frames > 0.0 {
            frames as usize
        } else {
            0
        }
    }

    /// Right-ear tone frequency in Hz.
    #[inline]
    #[must_use]
    pub fn right_hz(&self) -> f64 {
        self.carrier_hz + self.beat_hz
    }

    /// Gain envelope for these parameters.
    #[must_use]
    pub fn envelope(&self) -> Envelope {
        Envelope::new(self.duration_seconds, self.ramp_up_seconds, self.ramp_down_seconds)
            .with_overlap(self.ramp_overlap)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_resolves_to_defaults() {
        let params = SynthesisConfig::new().resolve();

        assert_eq!(params.sample_rate, 48_000.0);
        assert_eq!(params.duration_seconds, 600.0);
        assert_eq!(params.carrier_hz, 210.0);
        assert_eq!(params.beat_hz, 10.0);
        assert_eq!(params.ramp_up_seconds, 60.0);
        assert_eq!(params.ramp_down_seconds, 60.0);
        assert_eq!(params.noise_type, NoiseType::Brown);
        assert_eq!(params.noise_level, 0.15);
        assert_eq!(params.ramp_overlap, RampOverlap::FadeInFirst);
        assert_eq!(params.frame_count(), 28_800_000);
    }

    #[test]
    fn test_explicit_zero_is_kept() {
        let config = SynthesisConfig::new().with_tones(200.0, 0.0).with_noise_level(0.0);
        let params = config.resolve();

        assert_eq!(params.beat_hz, 0.0);
        assert_eq!(params.right_hz(), 200.0);
        assert_eq!(params.noise_level, 0.0);
        assert_eq!(params.noise_type, NoiseType::Brown);
    }

    #[test]
    fn test_legacy_resolution_replaces_zero() {
        let config = SynthesisConfig::new().with_tones(200.0, 0.0).with_noise_level(0.0);
        let params = config.resolve_legacy();

        assert_eq!(params.beat_hz, DEFAULT_BEAT_HZ);
        assert_eq!(params.noise_level, DEFAULT_NOISE_LEVEL);
        assert_eq!(params.carrier_hz, 200.0);

        let nan = SynthesisConfig::new().with_sample_rate(f64::NAN).resolve_legacy();
        assert_eq!(nan.sample_rate, DEFAULT_SAMPLE_RATE);
    }

    #[test]
    fn test_non_finite_fields_become_zero() {
        let params = SynthesisConfig::new()
            .with_sample_rate(f64::INFINITY)
            .with_noise_level(f64::NAN)
            .resolve();

        assert_eq!(params.sample_rate, 0.0);
        assert_eq!(params.noise_level, 0.0);
        assert_eq!(params.frame_count(), 0);
    }

    #[test]
    fn test_frame_count_floors() {
        let params = SynthesisConfig::new().with_sample_rate(1000.0).with_duration(0.0125).resolve();
        assert_eq!(params.frame_count(), 12);

        let negative = SynthesisConfig::new().with_duration(-3.0).resolve();
        assert_eq!(negative.frame_count(), 0);

        // Two negatives must not multiply into a positive count
        let both_negative =
            SynthesisConfig::new().with_sample_rate(-1000.0).with_duration(-1.0).resolve();
        assert_eq!(both_negative.frame_count(), 0);
        assert_eq!(
            SynthesisConfig::new().with_sample_rate(-1000.0).with_duration(1.0).resolve().frame_count(),
            0
        );
    }

    #[test]
    fn test_from_json_nested_noise() {
        let config = SynthesisConfig::from_json(
            r#"{"sample_rate": 44100, "beat_hz": 4.5, "noise": {"type": "white"}}"#,
        )
        .unwrap();
        let params = config.resolve();

        assert_eq!(params.sample_rate, 44_100.0);
        assert_eq!(params.beat_hz, 4.5);
        assert_eq!(params.noise_type, NoiseType::White);
        assert_eq!(params.noise_level, DEFAULT_NOISE_LEVEL);
    }

    #[test]
    fn test_from_json_ramp_overlap() {
        let config = SynthesisConfig::from_json(r#"{"ramp_overlap": "shortest"}"#).unwrap();
        assert_eq!(config.resolve().ramp_overlap, RampOverlap::Shortest);
    }

    #[test]
    fn test_unknown_noise_type_falls_back_to_brown() {
        for doc in [
            r#"{"noise": {"type": "pink", "level": 0.3}}"#,
            r#"{"noise": {"type": "", "level": 0.3}}"#,
            r#"{"noise": {"type": "White", "level": 0.3}}"#,
            r#"{"noise": {"type": 7, "level": 0.3}}"#,
            r#"{"noise": {"type": null, "level": 0.3}}"#,
        ] {
            let config = SynthesisConfig::from_json(doc).unwrap();
            assert_eq!(config.noise.and_then(|n| n.kind), None, "{doc}");

            for params in [config.resolve(), config.resolve_legacy()] {
                assert_eq!(params.noise_type, NoiseType::Brown, "{doc}");
                assert_eq!(params.noise_level, 0.3, "{doc}");
            }
        }
    }

    #[test]
    fn test_from_json_rejects_malformed_documents() {
        let err = SynthesisConfig::from_json(r#"{"noise": "#).unwrap_err();
        assert!(err.to_string().starts_with("Invalid synthesis config"));

        assert!(SynthesisConfig::from_json(r#"{"sample_rate": "fast"}"#).is_err());
    }

    #[test]
    fn test_serialize_skips_absent_fields() {
        let json = serde_json::to_value(SynthesisConfig::new().with_duration(30.0)).unwrap();
        assert_eq!(json, serde_json::json!({ "duration_seconds": 30.0 }));
    }
}
