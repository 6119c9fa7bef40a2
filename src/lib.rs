//! BMV noise budget
//!
//! Models the acceleration noise floor of a mechanically isolated, cryogenic
//! inertial sensor. A seeded synthesizer produces the time series, Welch's
//! method turns it into an amplitude spectral density, and the band-averaged
//! floor is compared against a detection threshold.

pub mod config;
pub mod filter;
pub mod logging;
pub mod output;
pub mod sim;
pub mod spectrum;
pub mod verdict;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::info;

// Re-export main types
pub use config::{Band, PlotRange, SimConfig};
pub use sim::{synthesize, synthesize_components, NoiseComponents};
pub use spectrum::{DirectDft, FftTransform, PowerTransform, Spectrum, WelchConfig, WelchEstimator};
pub use verdict::{evaluate, Verdict};

/// Fatal pipeline failures. Nothing is retried and no partial result is kept.
#[derive(Debug, Error)]
pub enum BudgetError {
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("domain error: {0}")]
    Domain(String),
    #[error("estimator: segment length {segment_len} exceeds series length {series_len}")]
    InsufficientData { segment_len: usize, series_len: usize },
    #[error(
        "evaluator: band ({low_hz}, {high_hz}) Hz selects no bins at {resolution_hz} Hz resolution"
    )]
    EmptyBand {
        low_hz: f64,
        high_hz: f64,
        resolution_hz: f64,
    },
}

/// Everything one pipeline run produces.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub spectrum: Spectrum,
    pub verdict: Verdict,
}

/// Synthesize, estimate and evaluate with a caller-supplied generator.
pub fn run_pipeline<R: Rng + ?Sized>(config: &SimConfig, rng: &mut R) -> Result<Outcome, BudgetError> {
    config.validate()?;
    info!(
        samples = config.samples(),
        mass_kg = config.mass_kg,
        temperature_k = config.temperature_k,
        "starting noise-budget run"
    );

    let series = synthesize(config, rng)?;

    let mut estimator = WelchEstimator::new(WelchConfig::from_sim(config));
    let spectrum = estimator.estimate(&series, config.sample_rate_hz)?;

    let verdict = evaluate(&spectrum, config.band, config.threshold)?;

    Ok(Outcome { spectrum, verdict })
}

/// Run the pipeline with a ChaCha8 generator seeded from `config.seed`.
pub fn run_seeded(config: &SimConfig) -> Result<Outcome, BudgetError> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    run_pipeline(config, &mut rng)
}
