//! Scalar guards and fixed-width arithmetic (`no_std` compatible)
//!
//! This module provides:
//! - Unit-interval clamping with non-finite guarding
//! - Two's-complement wrapping of reals into `u32` for the fingerprint
//! - Small helpers shared by the index calculator

use serde::de::{Deserialize, Deserializer};

// ============================================================================
// Constants
// ============================================================================

/// Numeric constants shared across the core
pub mod constants {
    /// Floor for the posterior normalization divisor
    pub const NORMALIZATION_EPSILON: f64 = 1e-9;

    /// Scale applied to each feature before truncation (1e-6 resolution)
    pub const FEATURE_SCALE: f64 = 1_000_000.0;

    /// 2^32 as a real, the modulus for `u32` wrapping
    pub const TWO_POW_32: f64 = 4_294_967_296.0;
}

// ============================================================================
// Clamping
// ============================================================================

/// Bound a scalar to `[0, 1]`.
///
/// Non-finite input (NaN, ±∞) maps to 0.
///
/// # Example
///
/// ```
/// use dreamspectre_core::math::clamp01;
///
/// assert_eq!(clamp01(0.25), 0.25);
/// assert_eq!(clamp01(-3.0), 0.0);
/// assert_eq!(clamp01(7.0), 1.0);
/// assert_eq!(clamp01(f64::NAN), 0.0);
/// ```
#[inline]
#[must_use]
pub fn clamp01(x: f64) -> f64 {
    if !x.is_finite() || x <= 0.0 {
        0.0
    } else if x >= 1.0 {
        1.0
    } else {
        x
    }
}

/// Replace a non-finite value with 0.
#[inline]
#[must_use]
pub fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

// ============================================================================
// Fixed-Width Wrapping
// ============================================================================

/// Truncate toward zero and reduce modulo 2^32 into a `u32`.
///
/// Out-of-range values wrap rather than saturate, and negative values map to
/// their two's-complement bit pattern, so `-1.0` becomes `0xFFFF_FFFF`.
/// Non-finite input maps to 0.
#[inline]
#[must_use]
pub fn wrap_to_u32(x: f64) -> u32 {
    if !x.is_finite() {
        return 0;
    }

    let truncated = libm::trunc(x);
    // fmod is exact for integral operands below 2^53 and keeps the sign of x
    let mut r = libm::fmod(truncated, constants::TWO_POW_32);
    if r < 0.0 {
        r += constants::TWO_POW_32;
    }

    r as u32
}

/// Scale a feature to 1e-6 resolution and wrap it into a `u32`.
#[inline]
#[must_use]
pub fn quantize_feature(v: f64) -> u32 {
    wrap_to_u32(finite_or_zero(v) * constants::FEATURE_SCALE)
}

/// Maximum of a slice of reals, or 0 for an empty slice.
#[must_use]
pub fn max_or_zero(values: &[f64]) -> f64 {
    values.iter().copied().fold(0.0, f64::max)
}

// ============================================================================
// Serde Helpers
// ============================================================================

/// Deserialize an `f64` that may be `null`, mapping `null` to 0.
///
/// Used on every optional numeric input field so that absent and `null`
/// values both read as 0.
pub(crate) fn nullable_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

// ============================================================================
// Tests
// ============================================================================
