//! Signal synthesizer
//!
//! Generates the total acceleration noise seen by the test mass: ground
//! vibration shaped by a low-pass, suppressed by the isolation stage, plus
//! Langevin noise from the thermal bath.

use rand::Rng;
use rand_distr::StandardNormal;
use tracing::{debug, info};

use crate::config::{SimConfig, BOLTZMANN};
use crate::filter::FirstOrderLowPass;
use crate::BudgetError;

/// Every intermediate series of one synthesis run.
#[derive(Debug, Clone)]
pub struct NoiseComponents {
    /// Filtered and calibrated ground vibration [m/s^2]
    pub ground: Vec<f64>,
    /// Ground vibration after the isolation stage [m/s^2]
    pub leakage: Vec<f64>,
    /// Langevin acceleration [m/s^2]
    pub thermal: Vec<f64>,
    /// `leakage + thermal` [m/s^2]
    pub total: Vec<f64>,
}

/// Per-sample variance of the thermal acceleration,
/// `2 kB T gamma / (m dt)` with `gamma = 2 pi f0 / Q`.
pub fn thermal_variance(config: &SimConfig) -> Result<f64, BudgetError> {
    let gamma = config.damping_rate();
    if !gamma.is_finite() {
        return Err(BudgetError::Domain(format!(
            "synthesizer: damping rate is not finite (f0 = {} Hz, Q = {})",
            config.trap_frequency_hz, config.quality_factor
        )));
    }

    let denom = config.mass_kg * config.dt();
    if denom == 0.0 {
        return Err(BudgetError::Domain(format!(
            "synthesizer: thermal variance divides by m * dt = 0 (mass = {} kg)",
            config.mass_kg
        )));
    }

    let variance = 2.0 * BOLTZMANN * config.temperature_k * gamma / denom;
    if !variance.is_finite() || variance < 0.0 {
        return Err(BudgetError::Domain(format!(
            "synthesizer: thermal variance {variance} is not a finite non-negative value"
        )));
    }

    Ok(variance)
}

/// Synthesize the total acceleration noise series.
pub fn synthesize<R: Rng + ?Sized>(config: &SimConfig, rng: &mut R) -> Result<Vec<f64>, BudgetError> {
    synthesize_components(config, rng).map(|components| components.total)
}

/// Synthesize and keep each contribution.
///
/// The ground draw is taken in full before the thermal draw, so both use
/// independent stretches of the generator.
pub fn synthesize_components<R: Rng + ?Sized>(
    config: &SimConfig,
    rng: &mut R,
) -> Result<NoiseComponents, BudgetError> {
    let n = config.samples();

    // Fail before consuming any randomness.
    let sigma_thermal = thermal_variance(config)?.sqrt();

    let white = standard_normal(n, rng);
    let lowpass = FirstOrderLowPass::butterworth(config.ground_cutoff);
    debug!(b0 = lowpass.b0, a1 = lowpass.a1, "ground low-pass designed");

    let ground: Vec<f64> = lowpass
        .apply(&white)
        .into_iter()
        .map(|v| v * config.ground_scale)
        .collect();
    let leakage: Vec<f64> = ground.iter().map(|&g| g * config.attenuation).collect();

    debug!(sigma_thermal, "thermal noise scale");
    let thermal: Vec<f64> = standard_normal(n, rng)
        .into_iter()
        .map(|v| v * sigma_thermal)
        .collect();

    let total: Vec<f64> = leakage
        .iter()
        .zip(thermal.iter())
        .map(|(&l, &t)| l + t)
        .collect();

    info!(
        samples = n,
        seed = config.seed,
        leakage_rms = rms(&leakage),
        thermal_rms = rms(&thermal),
        "noise series synthesized"
    );

    Ok(NoiseComponents {
        ground,
        leakage,
        thermal,
        total,
    })
}

fn standard_normal<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<f64> {
    (0..n).map(|_| rng.sample::<f64, _>(StandardNormal)).collect()
}

fn rms(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = values.iter().map(|&v| v * v).sum();
    (sum_sq / values.len() as f64).sqrt()
}
