//! DreamSpectre Application
//!
//! Command-line harness over the DreamSpectre core and synthesis crates.
//! Results go to stdout as JSON; logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Sleep-depth indices for one epoch
//! echo '{"pWake":0.1,"pN1":0.1,"pN2":0.5,"pN3":0.3,"pREM":0}' | dreamspectre indices -
//!
//! # Fingerprint of a numeric vector
//! dreamspectre hash 0.5 0.25
//!
//! # Audit record for an epoch, checked against a stored fingerprint
//! dreamspectre audit epoch.json --expect a8975c8a253ef7d6
//!
//! # Render a buffer in memory and report its levels
//! dreamspectre synth --config session.json --seed 42
//! ```

use std::fs;
use std::io::{self, Read};
use std::str::FromStr;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use dreamspectre_audio::{BinauralSynthesizer, CancelToken, SynthesisConfig, SynthesisParams};
use dreamspectre_core::{
    build_epoch_audit_record, compute_sleep_indices, hash_spectral_vector, EpochFeatures,
    PosteriorDistribution, SleepIndices, SleepStage, SpectralFingerprint,
};

/// DreamSpectre Application
#[derive(Parser, Debug)]
#[command(name = "dreamspectre")]
#[command(author, version, about = "Sleep-depth indices, epoch fingerprints and binaural synthesis", long_about = None)]
struct Cli {
    /// Logging verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute sleep-depth indices from a posterior distribution
    Indices {
        /// JSON file with pWake/pN1/pN2/pN3/pREM, or - for stdin
        input: String,
    },

    /// Fingerprint a numeric vector
    Hash {
        /// Vector elements, in order
        #[arg(allow_hyphen_values = true)]
        values: Vec<f64>,
    },

    /// Build the audit record for one epoch
    Audit {
        /// JSON file with `features` and `posteriors`, or - for stdin
        input: String,

        /// Fail unless the record's fingerprint equals this hex string
        #[arg(long)]
        expect: Option<String>,
    },

    /// Render a binaural buffer in memory and print its statistics
    Synth {
        /// JSON synthesis config, or - for stdin (defaults if omitted)
        #[arg(short, long)]
        config: Option<String>,

        /// Noise seed (random if omitted)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Treat zero and NaN config fields as absent
        #[arg(long)]
        legacy_defaults: bool,

        /// Render chunks one after another
        #[arg(long)]
        sequential: bool,

        /// Cancel the render after this many seconds
        #[arg(long)]
        timeout_secs: Option<f64>,
    },
}

/// Input document for the `audit` command.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EpochInput {
    features: EpochFeatures,
    posteriors: PosteriorDistribution,
}

/// Output of the `indices` command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IndicesReport {
    #[serde(flatten)]
    indices: SleepIndices,
    dominant_stage: Option<&'static str>,
}

impl IndicesReport {
    fn new(posteriors: &PosteriorDistribution) -> Self {
        Self {
            indices: compute_sleep_indices(posteriors),
            dominant_stage: posteriors.normalize().dominant_stage().map(SleepStage::name),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    debug!("DreamSpectre v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Indices { input } => run_indices(&input),
        Commands::Hash { values } => run_hash(&values),
        Commands::Audit { input, expect } => run_audit(&input, expect.as_deref()),
        Commands::Synth {
            config,
            seed,
            legacy_defaults,
            sequential,
            timeout_secs,
        } => run_synth(config.as_deref(), seed, legacy_defaults, sequential, timeout_secs),
    }
}

/// Read a whole file, or stdin for `-`.
fn read_input(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        Ok(text)
    } else {
        fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_indices(input: &str) -> anyhow::Result<()> {
    let posteriors: PosteriorDistribution = serde_json::from_str(&read_input(input)?)
        .with_context(|| format!("Invalid posterior distribution in {input}"))?;

    print_json(&IndicesReport::new(&posteriors))
}

fn run_hash(values: &[f64]) -> anyhow::Result<()> {
    println!("{}", hash_spectral_vector(values));
    Ok(())
}

fn run_audit(input: &str, expect: Option<&str>) -> anyhow::Result<()> {
    let epoch: EpochInput = serde_json::from_str(&read_input(input)?)
        .with_context(|| format!("Invalid epoch document in {input}"))?;

    let record = build_epoch_audit_record(&epoch.features, &epoch.posteriors);
    print_json(&record)?;

    if let Some(expected) = expect {
        let expected = SpectralFingerprint::from_str(expected)
            .with_context(|| format!("Invalid expected fingerprint {expected:?}"))?;
        if record.spectral_hex != expected {
            bail!("Fingerprint mismatch: expected {expected}, got {}", record.spectral_hex);
        }
        info!("Fingerprint {} verified", expected);
    }

    Ok(())
}

fn load_params(config: Option<&str>, legacy_defaults: bool) -> anyhow::Result<SynthesisParams> {
    let config = match config {
        Some(path) => SynthesisConfig::from_json(&read_input(path)?)
            .with_context(|| format!("Failed to load synthesis config from {path}"))?,
        None => SynthesisConfig::new(),
    };

    Ok(if legacy_defaults {
        config.resolve_legacy()
    } else {
        config.resolve()
    })
}

fn run_synth(
    config: Option<&str>,
    seed: Option<u64>,
    legacy_defaults: bool,
    sequential: bool,
    timeout_secs: Option<f64>,
) -> anyhow::Result<()> {
    let params = load_params(config, legacy_defaults)?;
    let seed = seed.unwrap_or_else(rand::random);
    info!("Synthesizing with seed {}", seed);

    let cancel = CancelToken::new();
    if let Some(secs) = timeout_secs {
        let timeout = Duration::try_from_secs_f64(secs)
            .with_context(|| format!("Invalid timeout {secs}"))?;
        let watchdog = cancel.clone();
        thread::spawn(move || {
            thread::sleep(timeout);
            watchdog.cancel();
        });
    }

    let synth = BinauralSynthesizer::new(params).with_cancel_token(cancel);
    let buffer = if sequential {
        synth.render_seeded_sequential(seed)
    } else {
        synth.render_seeded(seed)
    }
    .context("Synthesis failed")?;

    print_json(&buffer.stats())
}
