//! Colored noise sources
//!
//! White noise is a uniform draw in `[-1, 1]`. Brown noise integrates those
//! draws through a leaky one-pole integrator,
//!
//! ```text
//! s[n] = (s[n-1] + w[n]) · 0.98
//! ```
//!
//! which tilts the spectrum toward low frequencies. Each stereo channel owns
//! its integrator so the two ears receive decorrelated noise. The random
//! source is always passed in by the caller.

use rand::Rng;

use crate::config::NoiseType;

/// Leak factor of the brown-noise integrator
pub const BROWN_DECAY: f64 = 0.98;

/// Draw one uniform sample in `[-1, 1]`.
#[inline]
pub fn uniform_sample<R: Rng>(rng: &mut R) -> f64 {
    rng.gen_range(-1.0..=1.0)
}

// ============================================================================
// Brown Integrator
// ============================================================================

/// Leaky random-walk integrator state for one channel.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct BrownIntegrator {
    state: f64,
}

impl BrownIntegrator {
    /// Create an integrator at rest.
    #[must_use]
    pub const fn new() -> Self {
        Self { state: 0.0 }
    }

    /// Fold one white draw into the state and return the new state.
    #[inline]
    pub fn step(&mut self, white: f64) -> f64 {
        self.state = (self.state + white) * BROWN_DECAY;
        self.state
    }

    /// Current state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> f64 {
        self.state
    }

    /// Return to rest.
    #[inline]
    pub fn reset(&mut self) {
        self.state = 0.0;
    }
}

// ============================================================================
// Noise Channels
// ============================================================================

/// Noise generator for a single output channel.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NoiseChannel {
    kind: NoiseType,
    integrator: BrownIntegrator,
}

impl NoiseChannel {
    /// Create a channel of the given flavor with fresh state.
    #[must_use]
    pub const fn new(kind: NoiseType) -> Self {
        Self {
            kind,
            integrator: BrownIntegrator::new(),
        }
    }

    /// Integrator state (always 0 for white noise).
    #[inline]
    #[must_use]
    pub const fn integrator(&self) -> BrownIntegrator {
        self.integrator
    }

    /// Draw the next sample.
    #[inline]
    pub fn next_sample<R: Rng>(&mut self, rng: &mut R) -> f64 {
        let white = uniform_sample(rng);
        match self.kind {
            NoiseType::White => white,
            NoiseType::Brown => self.integrator.step(white),
        }
    }
}

/// Independent left/right noise channels.
///
/// Each frame consumes two draws from the stream, left first.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StereoNoise {
    /// Left-ear channel
    pub left: NoiseChannel,
    /// Right-ear channel
    pub right: NoiseChannel,
}

impl StereoNoise {
    /// Create a stereo pair of the given flavor.
    #[must_use]
    pub const fn new(kind: NoiseType) -> Self {
        Self {
            left: NoiseChannel::new(kind),
            right: NoiseChannel::new(kind),
        }
    }

    /// Draw the next `(left, right)` frame.
    #[inline]
    pub fn next_frame<R: Rng>(&mut self, rng: &mut R) -> (f64, f64) {
        let left = self.left.next_sample(rng);
        let right = self.right.next_sample(rng);
        (left, right)
    }
}

// ============================================================================
// Tests
// ============================================================================
