//! Binaural buffer synthesis
//!
//! Renders two detuned sine tones, one per ear, each mixed with its own
//! colored-noise channel and shaped by the buffer envelope:
//!
//! ```text
//! t        = i / sample_rate
//! left[i]  = (sin(2π·f_c·t)       + level·noise_L) · env(t)
//! right[i] = (sin(2π·(f_c+f_b)·t) + level·noise_R) · env(t)
//! ```
//!
//! The interaural offset `f_b` is perceived as a beat at `f_b` Hz.
//!
//! # Render Modes
//!
//! - [`BinauralSynthesizer::render`] draws all noise from one caller-supplied
//!   random stream, in frame order.
//! - [`BinauralSynthesizer::render_seeded`] splits the buffer into
//!   [`CHUNK_FRAMES`]-sized chunks. Each chunk seeds its own stream from
//!   `(seed, chunk index)` and starts from fresh integrators, so chunks can be
//!   rendered concurrently (feature `parallel`) with output bit-identical to
//!   [`BinauralSynthesizer::render_seeded_sequential`].
//!
//! Both modes poll the cancel token every [`CANCEL_POLL_FRAMES`] frames.

use std::f64::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::config::{SynthesisConfig, SynthesisParams};
use crate::envelope::Envelope;
use crate::error::{SynthesisError, SynthesisResult};
use crate::noise::StereoNoise;

/// Frames per independently seeded chunk
pub const CHUNK_FRAMES: usize = 1 << 16;

/// Frames between cancellation checks
pub const CANCEL_POLL_FRAMES: usize = 4096;

/// Upper bound on frames per buffer (four hours at 48 kHz)
pub const MAX_FRAMES: usize = 48_000 * 60 * 60 * 4;

// ============================================================================
// Buffer
// ============================================================================

/// Stereo sample buffer produced by one synthesis call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinauralBuffer {
    /// Sampling rate in Hz
    pub sample_rate: f64,
    /// Left-ear samples
    pub left: Vec<f32>,
    /// Right-ear samples
    pub right: Vec<f32>,
}

impl BinauralBuffer {
    fn silent(sample_rate: f64, frames: usize) -> Self {
        Self {
            sample_rate,
            left: vec![0.0; frames],
            right: vec![0.0; frames],
        }
    }

    /// Frames per channel.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.left.len()
    }

    /// Whether the buffer holds no frames.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Playback duration in seconds.
    #[must_use]
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate > 0.0 {
            self.len() as f64 / self.sample_rate
        } else {
            0.0
        }
    }

    /// Peak and RMS levels per channel.
    #[must_use]
    pub fn stats(&self) -> BufferStats {
        BufferStats {
            frames: self.len(),
            sample_rate: self.sample_rate,
            duration_seconds: self.duration_seconds(),
            left: ChannelStats::measure(&self.left),
            right: ChannelStats::measure(&self.right),
        }
    }
}

/// Level summary of one channel.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    /// Largest absolute sample
    pub peak: f64,
    /// Root mean square level
    pub rms: f64,
}

impl ChannelStats {
    /// Measure a channel.
    #[must_use]
    pub fn measure(samples: &[f32]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let (peak, sum_sq) = samples.iter().fold((0.0f64, 0.0f64), |(peak, sum_sq), &s| {
            let s = f64::from(s);
            (peak.max(s.abs()), sum_sq + s * s)
        });

        Self {
            peak,
            rms: (sum_sq / samples.len() as f64).sqrt(),
        }
    }
}

/// Level summary of a whole buffer.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BufferStats {
    /// Frames per channel
    pub frames: usize,
    /// Sampling rate in Hz
    pub sample_rate: f64,
    /// Playback duration in seconds
    pub duration_seconds: f64,
    /// Left-ear levels
    pub left: ChannelStats,
    /// Right-ear levels
    pub right: ChannelStats,
}

// ============================================================================
// Synthesizer
// ============================================================================

/// Binaural buffer renderer for one set of resolved parameters.
#[derive(Clone, Debug)]
pub struct BinauralSynthesizer {
    params: SynthesisParams,
    envelope: Envelope,
    cancel: CancelToken,
}

impl BinauralSynthesizer {
    /// Create a synthesizer from resolved parameters.
    #[must_use]
    pub fn new(params: SynthesisParams) -> Self {
        Self {
            envelope: params.envelope(),
            params,
            cancel: CancelToken::new(),
        }
    }

    /// Create a synthesizer from a config (absent fields take defaults).
    #[must_use]
    pub fn from_config(config: &SynthesisConfig) -> Self {
        Self::new(config.resolve())
    }

    /// Attach a cancel token.
    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Resolved parameters.
    #[inline]
    #[must_use]
    pub const fn params(&self) -> &SynthesisParams {
        &self.params
    }

    /// Gain envelope.
    #[inline]
    #[must_use]
    pub const fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Frames per channel the buffer will hold.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.params.frame_count()
    }

    /// Render with noise drawn from a single caller-supplied stream.
    ///
    /// # Errors
    ///
    /// Returns [`SynthesisError::TooManyFrames`] if the buffer would exceed
    /// [`MAX_FRAMES`], or [`SynthesisError::Cancelled`] if the cancel token
    /// fires during the render.
    pub fn render<R: Rng>(&self, rng: &mut R) -> SynthesisResult<BinauralBuffer> {
        let mut buffer = self.allocate()?;
        let total_frames = buffer.len();

        let mut noise = StereoNoise::new(self.params.noise_type);
        self.render_block(0, &mut buffer.left, &mut buffer.right, &mut noise, rng)
            .map_err(|at_frame| self.cancelled(at_frame, total_frames))?;

        info!("Rendered {} frames ({:.1}s)", total_frames, buffer.duration_seconds());
        Ok(buffer)
    }

    /// Render in independently seeded chunks.
    ///
    /// Chunks render concurrently when the `parallel` feature is enabled; the
    /// output is bit-identical to [`Self::render_seeded_sequential`].
    ///
    /// # Errors
    ///
    /// See [`Self::render`].
    pub fn render_seeded(&self, seed: u64) -> SynthesisResult<BinauralBuffer> {
        #[cfg(feature = "parallel")]
        {
            self.render_seeded_parallel(seed)
        }
        #[cfg(not(feature = "parallel"))]
        {
            self.render_seeded_sequential(seed)
        }
    }

    /// Render in independently seeded chunks, one after another.
    ///
    /// # Errors
    ///
    /// See [`Self::render`].
    pub fn render_seeded_sequential(&self, seed: u64) -> SynthesisResult<BinauralBuffer> {
        let mut buffer = self.allocate()?;
        let total_frames = buffer.len();

        buffer
            .left
            .chunks_mut(CHUNK_FRAMES)
            .zip(buffer.right.chunks_mut(CHUNK_FRAMES))
            .enumerate()
            .try_for_each(|(index, (left, right))| self.render_chunk(seed, index, left, right))
            .map_err(|at_frame| self.cancelled(at_frame, total_frames))?;

        info!("Rendered {} frames in {} chunks", total_frames, total_frames.div_ceil(CHUNK_FRAMES));
        Ok(buffer)
    }

    #[cfg(feature = "parallel")]
    fn render_seeded_parallel(&self, seed: u64) -> SynthesisResult<BinauralBuffer> {
        use rayon::prelude::*;

        let mut buffer = self.allocate()?;
        let total_frames = buffer.len();

        buffer
            .left
            .par_chunks_mut(CHUNK_FRAMES)
            .zip(buffer.right.par_chunks_mut(CHUNK_FRAMES))
            .enumerate()
            .try_for_each(|(index, (left, right))| self.render_chunk(seed, index, left, right))
            .map_err(|at_frame| self.cancelled(at_frame, total_frames))?;

        info!(
            "Rendered {} frames in {} parallel chunks",
            total_frames,
            total_frames.div_ceil(CHUNK_FRAMES)
        );
        Ok(buffer)
    }

    /// Allocate the output buffer after validating its size.
    fn allocate(&self) -> SynthesisResult<BinauralBuffer> {
        let p = &self.params;
        let frames = p.frame_count();

        if frames > MAX_FRAMES {
            return Err(SynthesisError::TooManyFrames { requested: frames, max: MAX_FRAMES });
        }
        if frames == 0 {
            warn!(
                "Empty buffer: sample_rate={} duration={}s",
                p.sample_rate, p.duration_seconds
            );
        }
        if self.envelope.ramps_overlap() {
            warn!(
                "Ramp windows overlap ({}s up + {}s down > {}s), using {:?} precedence",
                p.ramp_up_seconds,
                p.ramp_down_seconds,
                p.duration_seconds,
                self.envelope.overlap()
            );
        }

        debug!(
            "Rendering {} frames at {} Hz: carrier={} Hz beat={} Hz noise={}@{}",
            frames,
            p.sample_rate,
            p.carrier_hz,
            p.beat_hz,
            p.noise_type.name(),
            p.noise_level
        );

        Ok(BinauralBuffer::silent(p.sample_rate, frames))
    }

    fn cancelled(&self, at_frame: usize, total_frames: usize) -> SynthesisError {
        warn!("Synthesis cancelled at frame {} of {}", at_frame, total_frames);
        SynthesisError::Cancelled { at_frame, total_frames }
    }

    /// Render one chunk with its own seeded stream and fresh noise state.
    fn render_chunk(
        &self,
        seed: u64,
        index: usize,
        left: &mut [f32],
        right: &mut [f32],
    ) -> Result<(), usize> {
        let mut rng = StdRng::seed_from_u64(chunk_seed(seed, index));
        let mut noise = StereoNoise::new(self.params.noise_type);
        self.render_block(index * CHUNK_FRAMES, left, right, &mut noise, &mut rng)
    }

    /// Fill `left`/`right` starting at global frame `start_frame`.
    ///
    /// On cancellation returns the global frame at which it was observed.
    fn render_block<R: Rng>(
        &self,
        start_frame: usize,
        left: &mut [f32],
        right: &mut [f32],
        noise: &mut StereoNoise,
        rng: &mut R,
    ) -> Result<(), usize> {
        let p = &self.params;
        let omega_left = TAU * p.carrier_hz;
        let omega_right = TAU * p.right_hz();

        for (offset, (l, r)) in left.iter_mut().zip(right.iter_mut()).enumerate() {
            if offset % CANCEL_POLL_FRAMES == 0 && self.cancel.is_cancelled() {
                return Err(start_frame + offset);
            }

            let t = (start_frame + offset) as f64 / p.sample_rate;
            let gain = self.envelope.gain(t);
            let (noise_left, noise_right) = noise.next_frame(rng);

            *l = (((omega_left * t).sin() + p.noise_level * noise_left) * gain) as f32;
            *r = (((omega_right * t).sin() + p.noise_level * noise_right) * gain) as f32;
        }

        Ok(())
    }
}

/// Derive the stream seed for one chunk (SplitMix64 finalizer).
#[must_use]
pub fn chunk_seed(seed: u64, chunk_index: usize) -> u64 {
    let mut z = seed.wrapping_add((chunk_index as u64).wrapping_add(1).wrapping_mul(0x9e37_79b9_7f4a_7c15));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Render a buffer for `config`, drawing noise from `rng`.
///
/// Absent config fields take their defaults; explicit zeros are kept.
///
/// # Errors
///
/// See [`BinauralSynthesizer::render`].
///
/// # Example
///
/// ```
/// use dreamspectre_audio::{generate_binaural_buffer, SynthesisConfig};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let config = SynthesisConfig::new()
///     .with_sample_rate(1000.0)
///     .with_duration(1.0)
///     .with_ramps(0.1, 0.1)
///     .with_tones(100.0, 10.0)
///     .with_noise_level(0.0);
///
/// let buffer = generate_binaural_buffer(&config, &mut StdRng::seed_from_u64(1)).unwrap();
/// assert_eq!(buffer.left.len(), 1000);
/// assert_eq!(buffer.right.len(), 1000);
/// ```
pub fn generate_binaural_buffer<R: Rng>(
    config: &SynthesisConfig,
    rng: &mut R,
) -> SynthesisResult<BinauralBuffer> {
    BinauralSynthesizer::from_config(config).render(rng)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NoiseType;
    use crate::envelope::RampOverlap;
    use rand::RngCore;

    fn short_config() -> SynthesisConfig {
        SynthesisConfig::new()
            .with_sample_rate(1000.0)
            .with_duration(1.0)
            .with_ramps(0.1, 0.1)
            .with_tones(100.0, 10.0)
            .with_noise_level(0.0)
    }

    fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    #[test]
    fn test_short_buffer_shape_and_tones() {
        let buffer = generate_binaural_buffer(&short_config(), &mut rng(1)).unwrap();

        assert_eq!(buffer.left.len(), 1000);
        assert_eq!(buffer.right.len(), 1000);
        assert_eq!(buffer.sample_rate, 1000.0);
        assert!(buffer.left[0].abs() < 1e-6);
        assert!(buffer.right[0].abs() < 1e-6);

        // Midpoint: unity gain, pure tones
        for i in [497usize, 500, 503] {
            let t = i as f64 / 1000.0;
            let expected_left = (TAU * 100.0 * t).sin();
            let expected_right = (TAU * 110.0 * t).sin();
            assert!((f64::from(buffer.left[i]) - expected_left).abs() < 1e-6);
            assert!((f64::from(buffer.right[i]) - expected_right).abs() < 1e-6);
        }
    }

    #[test]
    fn test_envelope_shapes_samples() {
        let synth = BinauralSynthesizer::from_config(&short_config());
        let buffer = synth.render(&mut rng(1)).unwrap();

        for i in (0..1000).step_by(7) {
            let t = i as f64 / 1000.0;
            let expected = (TAU * 100.0 * t).sin() * synth.envelope().gain(t);
            assert!((f64::from(buffer.left[i]) - expected).abs() < 1e-6, "frame {i}");
        }
        assert!(buffer.left.iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn test_noise_free_renders_are_bit_identical() {
        let a = generate_binaural_buffer(&short_config(), &mut rng(1)).unwrap();
        let b = generate_binaural_buffer(&short_config(), &mut rng(999)).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_seeded_render_is_reproducible() {
        let config = short_config().with_noise(NoiseType::Brown, 0.15);

        let a = generate_binaural_buffer(&config, &mut rng(42)).unwrap();
        let b = generate_binaural_buffer(&config, &mut rng(42)).unwrap();
        let c = generate_binaural_buffer(&config, &mut rng(43)).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_channels_get_independent_noise() {
        // Zero beat: any left/right difference comes from noise alone
        let config = short_config().with_tones(100.0, 0.0).with_noise(NoiseType::Brown, 0.5);
        let buffer = generate_binaural_buffer(&config, &mut rng(8)).unwrap();

        let differing = buffer.left.iter().zip(&buffer.right).filter(|(l, r)| l != r).count();
        assert!(differing > 900);
    }

    #[test]
    fn test_monaural_with_explicit_zero_beat() {
        let config = short_config().with_tones(100.0, 0.0);
        let buffer = generate_binaural_buffer(&config, &mut rng(1)).unwrap();

        assert_eq!(buffer.left, buffer.right);
    }

    #[test]
    fn test_white_noise_bounds() {
        let config = short_config().with_noise(NoiseType::White, 0.25);
        let buffer = generate_binaural_buffer(&config, &mut rng(2)).unwrap();

        assert!(buffer.left.iter().chain(&buffer.right).all(|s| s.abs() <= 1.25 + 1e-6));
    }

    #[test]
    fn test_sequential_and_parallel_chunks_match() {
        let config = SynthesisConfig::new()
            .with_sample_rate(48_000.0)
            .with_duration(3.5)
            .with_ramps(0.5, 0.5)
            .with_noise(NoiseType::Brown, 0.15);
        let synth = BinauralSynthesizer::from_config(&config);
        assert!(synth.frame_count() > 2 * CHUNK_FRAMES);

        let sequential = synth.render_seeded_sequential(77).unwrap();
        let chunked = synth.render_seeded(77).unwrap();

        assert_eq!(sequential.len(), 168_000);
        assert_eq!(sequential, chunked);
        assert_ne!(sequential, synth.render_seeded_sequential(78).unwrap());
    }

    #[test]
    fn test_chunk_seeds_are_distinct() {
        let seeds: Vec<u64> = (0..64).map(|i| chunk_seed(1, i)).collect();
        for (i, a) in seeds.iter().enumerate() {
            for b in &seeds[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_ne!(chunk_seed(1, 0), chunk_seed(2, 0));
    }

    #[test]
    fn test_cancelled_render() {
        let token = CancelToken::new();
        token.cancel();

        let synth = BinauralSynthesizer::from_config(&short_config()).with_cancel_token(token);

        match synth.render(&mut rng(1)) {
            Err(SynthesisError::Cancelled { at_frame, total_frames }) => {
                assert_eq!(at_frame, 0);
                assert_eq!(total_frames, 1000);
            }
            other => panic!("expected cancellation, got {other:?}"),
        }
        assert!(matches!(
            synth.render_seeded(1),
            Err(SynthesisError::Cancelled { .. })
        ));
    }

    /// Stream that triggers a cancel token once it has served `limit` draws.
    struct CancellingRng {
        inner: StdRng,
        draws: usize,
        limit: usize,
        cancel: CancelToken,
    }

    impl CancellingRng {
        fn tick(&mut self) {
            self.draws += 1;
            if self.draws == self.limit {
                self.cancel.cancel();
            }
        }
    }

    impl RngCore for CancellingRng {
        fn next_u32(&mut self) -> u32 {
            self.tick();
            self.inner.next_u32()
        }

        fn next_u64(&mut self) -> u64 {
            self.tick();
            self.inner.next_u64()
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            self.tick();
            self.inner.fill_bytes(dest);
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.tick();
            self.inner.try_fill_bytes(dest)
        }
    }

    #[test]
    fn test_cancel_during_render_stops_at_poll_boundary() {
        let token = CancelToken::new();
        let config = short_config()
            .with_sample_rate(48_000.0)
            .with_noise(NoiseType::Brown, 0.15);
        let synth = BinauralSynthesizer::from_config(&config).with_cancel_token(token.clone());
        let mut rng = CancellingRng {
            inner: rng(3),
            draws: 0,
            limit: 10_000,
            cancel: token,
        };

        match synth.render(&mut rng) {
            Err(SynthesisError::Cancelled { at_frame, total_frames }) => {
                assert_eq!(total_frames, 48_000);
                assert!(at_frame > 0);
                assert!(at_frame < total_frames);
                assert_eq!(at_frame % CANCEL_POLL_FRAMES, 0);
            }
            other => panic!("expected cancellation, got {other:?}"),
        }
        // Rendering stopped at the poll, long before the whole buffer was drawn
        assert!(rng.draws < 2 * 48_000);
    }

    #[test]
    fn test_degenerate_configs_yield_empty_buffers() {
        let zero_rate = short_config().with_sample_rate(0.0);
        let buffer = generate_binaural_buffer(&zero_rate, &mut rng(1)).unwrap();
        assert!(buffer.is_empty());
        assert_eq!(buffer.duration_seconds(), 0.0);

        let negative = short_config().with_duration(-1.0);
        assert!(generate_binaural_buffer(&negative, &mut rng(1)).unwrap().is_empty());

        let both_negative = short_config().with_sample_rate(-1000.0).with_duration(-1.0);
        assert!(generate_binaural_buffer(&both_negative, &mut rng(1)).unwrap().is_empty());
    }

    #[test]
    fn test_frame_limit() {
        let config = SynthesisConfig::new().with_duration(1.0e9);
        match generate_binaural_buffer(&config, &mut rng(1)) {
            Err(SynthesisError::TooManyFrames { max, .. }) => assert_eq!(max, MAX_FRAMES),
            other => panic!("expected frame limit error, got {other:?}"),
        }
    }

    #[test]
    fn test_overlapping_ramps_follow_policy() {
        let base = short_config().with_ramps(0.8, 0.8);

        let first = generate_binaural_buffer(&base, &mut rng(1)).unwrap();
        let shortest =
            generate_binaural_buffer(&base.with_ramp_overlap(RampOverlap::Shortest), &mut rng(1))
                .unwrap();

        // Identical inside the shared fade-in, diverging once the fade-out bites
        assert_eq!(first.left[100], shortest.left[100]);
        assert_ne!(first.left[300..800], shortest.left[300..800]);
    }

    #[test]
    fn test_buffer_stats() {
        let buffer = generate_binaural_buffer(&short_config().with_ramps(0.0, 0.0), &mut rng(1))
            .unwrap();
        let stats = buffer.stats();

        assert_eq!(stats.frames, 1000);
        assert!((stats.duration_seconds - 1.0).abs() < 1e-12);
        // 100 Hz at 1 kHz steps 36° per frame, so the top sample is sin(72°)
        assert!(stats.left.peak <= 1.0 && stats.left.peak > 0.95);
        // Full-scale sine: RMS ≈ 1/√2
        assert!((stats.left.rms - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-3);
        assert_eq!(ChannelStats::measure(&[]), ChannelStats::default());
    }
}
