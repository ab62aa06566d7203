//! Epoch feature vectors and their spectral fingerprint
//!
//! The fingerprint folds an ordered vector of reals into 64 bits using only
//! wrapping `u32` arithmetic, so every platform produces the same 16 hex
//! characters for the same input. It is an integrity and correlation tag for
//! audit trails, not a cryptographic digest.
//!
//! # Algorithm
//!
//! ```text
//! h = 0
//! for v in vector:
//!     h = (h + wrap_u32(trunc(v · 1e6))) · 0x9e3779b1
//!     h = h ^ (h >> 16)
//! hi = (h · 0xa5a5a5a5) ^ 0x85ebca6b
//! lo = (h · 0x27d4eb2f) ^ 0xc2b2ae35
//! fingerprint = hex8(hi) ‖ hex8(lo)
//! ```

use core::fmt;
use core::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::FingerprintParseError;
use crate::math::{nullable_f64, quantize_feature};
use crate::sleep::PosteriorDistribution;

// ============================================================================
// Hash Constants
// ============================================================================

/// Per-element multiplier (golden-ratio derived)
const MIX_MULTIPLIER: u32 = 0x9e37_79b1;

/// Finalizer multiplier for the high half
const HI_MULTIPLIER: u32 = 0xa5a5_a5a5;

/// Finalizer whitening for the high half
const HI_WHITENING: u32 = 0x85eb_ca6b;

/// Finalizer multiplier for the low half
const LO_MULTIPLIER: u32 = 0x27d4_eb2f;

/// Finalizer whitening for the low half
const LO_WHITENING: u32 = 0xc2b2_ae35;

/// Number of hexadecimal characters in a fingerprint
pub const FINGERPRINT_HEX_LEN: usize = 16;

/// Number of elements in an epoch feature vector
pub const FEATURE_VECTOR_LEN: usize = 12;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

// ============================================================================
// Spectral Fingerprint
// ============================================================================

/// 64-bit spectral fingerprint, held as 16 lowercase ASCII hex characters.
///
/// Always displays and serializes as its hex string.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpectralFingerprint([u8; FINGERPRINT_HEX_LEN]);

impl SpectralFingerprint {
    /// Build a fingerprint from its two 32-bit halves.
    #[must_use]
    pub fn from_halves(hi: u32, lo: u32) -> Self {
        let mut hex = [0u8; FINGERPRINT_HEX_LEN];
        write_hex_u32(&mut hex[..8], hi);
        write_hex_u32(&mut hex[8..], lo);
        Self(hex)
    }

    /// High 32-bit half.
    #[must_use]
    pub fn hi(&self) -> u32 {
        read_hex_u32(&self.0[..8])
    }

    /// Low 32-bit half.
    #[must_use]
    pub fn lo(&self) -> u32 {
        read_hex_u32(&self.0[8..])
    }

    /// The fingerprint as a 64-bit integer (`hi << 32 | lo`).
    #[must_use]
    pub fn to_u64(&self) -> u64 {
        (u64::from(self.hi()) << 32) | u64::from(self.lo())
    }

    /// The fingerprint as a hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Construction only ever writes ASCII hex digits
        core::str::from_utf8(&self.0).unwrap_or_default()
    }
}

fn write_hex_u32(out: &mut [u8], value: u32) {
    for (i, slot) in out.iter_mut().enumerate() {
        let shift = 28 - 4 * i as u32;
        *slot = HEX_DIGITS[((value >> shift) & 0xF) as usize];
    }
}

fn read_hex_u32(hex: &[u8]) -> u32 {
    hex.iter().fold(0u32, |acc, &b| (acc << 4) | u32::from(hex_value(b).unwrap_or(0)))
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}

impl fmt::Display for SpectralFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for SpectralFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpectralFingerprint({})", self.as_str())
    }
}

impl FromStr for SpectralFingerprint {
    type Err = FingerprintParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != FINGERPRINT_HEX_LEN {
            return Err(FingerprintParseError::InvalidLength {
                got: bytes.len(),
                expected: FINGERPRINT_HEX_LEN,
            });
        }

        let mut hex = [0u8; FINGERPRINT_HEX_LEN];
        for (position, (&byte, slot)) in bytes.iter().zip(hex.iter_mut()).enumerate() {
            if hex_value(byte).is_none() {
                return Err(FingerprintParseError::InvalidCharacter { position, byte });
            }
            *slot = byte;
        }

        Ok(Self(hex))
    }
}

impl Serialize for SpectralFingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SpectralFingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FingerprintVisitor;

        impl Visitor<'_> for FingerprintVisitor {
            type Value = SpectralFingerprint;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a 16-character lowercase hex fingerprint")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(FingerprintVisitor)
    }
}

// ============================================================================
// Hasher
// ============================================================================

/// Fold an ordered vector of reals into a [`SpectralFingerprint`].
///
/// Each element is quantized to 1e-6 resolution (truncated toward zero and
/// wrapped modulo 2^32). Non-finite elements count as 0. The result depends
/// on element order.
///
/// # Example
///
/// ```
/// use dreamspectre_core::spectral::hash_spectral_vector;
///
/// let a = hash_spectral_vector(&[0.5, 0.25]);
/// let b = hash_spectral_vector(&[0.25, 0.5]);
/// assert_ne!(a, b);
/// assert_eq!(hash_spectral_vector(&[]).as_str(), "85ebca6bc2b2ae35");
/// ```
#[must_use]
pub fn hash_spectral_vector(values: &[f64]) -> SpectralFingerprint {
    let h = values.iter().fold(0u32, |h, &v| {
        let h = h.wrapping_add(quantize_feature(v)).wrapping_mul(MIX_MULTIPLIER);
        h ^ (h >> 16)
    });

    let hi = h.wrapping_mul(HI_MULTIPLIER) ^ HI_WHITENING;
    let lo = h.wrapping_mul(LO_MULTIPLIER) ^ LO_WHITENING;
    SpectralFingerprint::from_halves(hi, lo)
}

// ============================================================================
// Epoch Features
// ============================================================================

/// Spectral and physiological features extracted for one epoch.
///
/// Band powers are expected pre-normalized by the upstream feature pipeline.
/// Absent or `null` fields read as 0.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EpochFeatures {
    /// Normalized delta band power (0.5-4 Hz)
    #[serde(deserialize_with = "nullable_f64")]
    pub delta_norm: f64,
    /// Normalized theta band power (4-8 Hz)
    #[serde(deserialize_with = "nullable_f64")]
    pub theta_norm: f64,
    /// Normalized alpha band power (8-12 Hz)
    #[serde(deserialize_with = "nullable_f64")]
    pub alpha_norm: f64,
    /// Normalized sigma band power (12-15 Hz, spindles)
    #[serde(deserialize_with = "nullable_f64")]
    pub sigma_norm: f64,
    /// Normalized beta band power (15-30 Hz)
    #[serde(deserialize_with = "nullable_f64")]
    pub beta_norm: f64,
    /// Normalized gamma band power (>30 Hz)
    #[serde(deserialize_with = "nullable_f64")]
    pub gamma_norm: f64,
    /// Slow-wave activity measure
    #[serde(deserialize_with = "nullable_f64")]
    pub slow_wave: f64,
    /// EMG (muscle tone) level
    #[serde(deserialize_with = "nullable_f64")]
    pub emg: f64,
    /// EOG (eye movement) level
    #[serde(deserialize_with = "nullable_f64")]
    pub eog: f64,
}

/// The fixed-order 12-element vector hashed into an epoch fingerprint.
///
/// Layout: `[deltaNorm, thetaNorm, alphaNorm, sigmaNorm, betaNorm, gammaNorm,
/// slowWave, emg, eog, pN1, pN2, pN3]`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct EpochFeatureVector([f64; FEATURE_VECTOR_LEN]);

impl EpochFeatureVector {
    /// Assemble the vector from epoch features and raw (unclamped) posteriors.
    #[must_use]
    pub const fn assemble(features: &EpochFeatures, posteriors: &PosteriorDistribution) -> Self {
        Self::from_array([
            features.delta_norm,
            features.theta_norm,
            features.alpha_norm,
            features.sigma_norm,
            features.beta_norm,
            features.gamma_norm,
            features.slow_wave,
            features.emg,
            features.eog,
            posteriors.p_n1,
            posteriors.p_n2,
            posteriors.p_n3,
        ])
    }

    /// Wrap an already-ordered array.
    #[inline]
    #[must_use]
    pub const fn from_array(values: [f64; FEATURE_VECTOR_LEN]) -> Self {
        Self(values)
    }

    /// The ordered elements.
    #[inline]
    #[must_use]
    pub const fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Hash this vector.
    #[must_use]
    pub fn fingerprint(&self) -> SpectralFingerprint {
        hash_spectral_vector(&self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
