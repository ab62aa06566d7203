//! Buffer gain envelope
//!
//! Linear fade-in over `ramp_up` seconds and linear fade-out over the last
//! `ramp_down` seconds, unity gain in between:
//!
//! ```text
//! gain
//!  1.0 ┤      ┌──────────────────┐
//!      │     ╱                    ╲
//!      │    ╱                      ╲
//!  0.0 ┼───┴────────────────────────┴──▶ t
//!      0  ramp_up            D-ramp_down  D
//! ```
//!
//! When `ramp_up + ramp_down > D` the two windows overlap and the envelope
//! depends on [`RampOverlap`]:
//!
//! - [`RampOverlap::FadeInFirst`]: fade-in holds until `ramp_up`, then the
//!   fade-out takes over. This can step down sharply at `t = ramp_up`.
//! - [`RampOverlap::Shortest`]: the gain is the lower of the two ramps,
//!   giving a continuous triangle that peaks below 1.
//!
//! Both policies agree everywhere when the windows do not overlap.

use serde::{Deserialize, Serialize};

/// Envelope precedence inside overlapping ramp windows.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RampOverlap {
    /// Fade-in wins until `ramp_up` elapses
    #[default]
    FadeInFirst,
    /// Lower of the two ramps wins
    Shortest,
}

/// Piecewise-linear gain envelope over a buffer of known duration.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Envelope {
    duration_s: f64,
    ramp_up_s: f64,
    ramp_down_s: f64,
    overlap: RampOverlap,
}

impl Envelope {
    /// Create an envelope. A zero or negative ramp disables that ramp.
    #[must_use]
    pub const fn new(duration_s: f64, ramp_up_s: f64, ramp_down_s: f64) -> Self {
        Self {
            duration_s,
            ramp_up_s,
            ramp_down_s,
            overlap: RampOverlap::FadeInFirst,
        }
    }

    /// Set overlap precedence.
    #[must_use]
    pub const fn with_overlap(mut self, overlap: RampOverlap) -> Self {
        self.overlap = overlap;
        self
    }

    /// Overlap precedence in effect.
    #[inline]
    #[must_use]
    pub const fn overlap(&self) -> RampOverlap {
        self.overlap
    }

    /// Whether the fade-in and fade-out windows overlap.
    #[must_use]
    pub fn ramps_overlap(&self) -> bool {
        self.ramp_up_s.max(0.0) + self.ramp_down_s.max(0.0) > self.duration_s
    }

    /// Fade-in ramp alone: rises from 0 to 1 over `ramp_up`.
    #[inline]
    fn fade_in(&self, t: f64) -> f64 {
        // t >= 0 here, so t < ramp_up implies ramp_up > 0
        if t < self.ramp_up_s {
            t / self.ramp_up_s
        } else {
            1.0
        }
    }

    /// Fade-out ramp alone: falls to 0 at `duration`, never negative.
    #[inline]
    fn fade_out(&self, t: f64) -> f64 {
        if t > self.duration_s - self.ramp_down_s {
            let remaining = self.duration_s - t;
            if remaining > 0.0 {
                remaining / self.ramp_down_s
            } else {
                0.0
            }
        } else {
            1.0
        }
    }

    /// Gain at `t` seconds from the start of the buffer.
    ///
    /// Times before the start read as 0.
    #[inline]
    #[must_use]
    pub fn gain(&self, t: f64) -> f64 {
        if t < 0.0 {
            return 0.0;
        }

        match self.overlap {
            RampOverlap::FadeInFirst => {
                if t < self.ramp_up_s {
                    self.fade_in(t)
                } else {
                    self.fade_out(t)
                }
            }
            RampOverlap::Shortest => self.fade_in(t).min(self.fade_out(t)),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
