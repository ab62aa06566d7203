//! Benchmarks for buffer synthesis and epoch hashing

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use dreamspectre_audio::{BinauralSynthesizer, NoiseType, StereoNoise, SynthesisConfig};
use dreamspectre_core::{hash_spectral_vector, EpochFeatureVector, EpochFeatures, PosteriorDistribution};

/// Short buffer config at the default 48 kHz rate
fn config_for(seconds: f64) -> SynthesisConfig {
    SynthesisConfig::new()
        .with_duration(seconds)
        .with_ramps(seconds / 10.0, seconds / 10.0)
        .with_noise(NoiseType::Brown, 0.15)
}

fn bench_noise(c: &mut Criterion) {
    let mut group = c.benchmark_group("noise");

    for kind in [NoiseType::White, NoiseType::Brown] {
        group.bench_function(kind.name(), |b| {
            let mut rng = StdRng::seed_from_u64(1);
            let mut noise = StereoNoise::new(kind);
            b.iter(|| black_box(noise.next_frame(&mut rng)));
        });
    }

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    group.sample_size(10);

    for seconds in [1.0, 5.0, 20.0] {
        let synth = BinauralSynthesizer::from_config(&config_for(seconds));

        group.bench_with_input(BenchmarkId::new("stream", seconds), &synth, |b, synth| {
            b.iter(|| {
                let mut rng = StdRng::seed_from_u64(7);
                black_box(synth.render(&mut rng))
            });
        });

        group.bench_with_input(BenchmarkId::new("sequential", seconds), &synth, |b, synth| {
            b.iter(|| black_box(synth.render_seeded_sequential(7)));
        });

        group.bench_with_input(BenchmarkId::new("seeded", seconds), &synth, |b, synth| {
            b.iter(|| black_box(synth.render_seeded(7)));
        });
    }

    group.finish();
}

fn bench_spectral_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("spectral_hash");

    let features = EpochFeatures {
        delta_norm: 0.42,
        theta_norm: 0.18,
        alpha_norm: 0.07,
        sigma_norm: 0.11,
        beta_norm: 0.05,
        gamma_norm: 0.02,
        slow_wave: 0.63,
        emg: 0.12,
        eog: 0.04,
    };
    let posteriors = PosteriorDistribution::new(0.1, 0.1, 0.5, 0.3, 0.0);
    let vector = EpochFeatureVector::assemble(&features, &posteriors);

    group.bench_function("epoch_vector", |b| {
        b.iter(|| black_box(hash_spectral_vector(black_box(vector.as_slice()))));
    });

    let long: Vec<f64> = (0..1024).map(|i| f64::from(i) * 0.001).collect();
    group.bench_function("vector_1024", |b| {
        b.iter(|| black_box(hash_spectral_vector(black_box(&long))));
    });

    group.finish();
}

criterion_group!(benches, bench_noise, bench_render, bench_spectral_hash);

criterion_main!(benches);
