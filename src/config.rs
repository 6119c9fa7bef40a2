//! Simulation configuration
//!
//! Every physical and numerical constant of the noise budget lives here. The
//! defaults reproduce the reference scenario: a 250 mg test mass at 10 mK in a
//! 0.2 Hz trap, sampled at 10 kHz for 10 s.

use serde::{Deserialize, Serialize};

use crate::BudgetError;

/// Boltzmann constant [J/K]
pub const BOLTZMANN: f64 = 1.380649e-23;

/// Measurement band, exclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    /// Lower bound [Hz]
    pub low_hz: f64,
    /// Upper bound [Hz]
    pub high_hz: f64,
}

impl Band {
    pub fn new(low_hz: f64, high_hz: f64) -> Self {
        Self { low_hz, high_hz }
    }

    /// True when `freq_hz` lies strictly inside the band.
    pub fn contains(&self, freq_hz: f64) -> bool {
        freq_hz > self.low_hz && freq_hz < self.high_hz
    }
}

/// Axis ranges handed to the plotting collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotRange {
    pub freq_min_hz: f64,
    pub freq_max_hz: f64,
    pub asd_min: f64,
    pub asd_max: f64,
}

impl PlotRange {
    /// Both axes are log-scaled, so each range must be positive and ordered.
    pub fn validate(&self) -> Result<(), BudgetError> {
        let axes = [
            ("freq", self.freq_min_hz, self.freq_max_hz),
            ("asd", self.asd_min, self.asd_max),
        ];
        for (axis, min, max) in axes {
            if !(min.is_finite() && max.is_finite() && min > 0.0 && min < max) {
                return Err(BudgetError::Configuration(format!(
                    "plot {axis} range must satisfy 0 < min < max, got ({min}, {max})"
                )));
            }
        }
        Ok(())
    }
}

impl Default for PlotRange {
    fn default() -> Self {
        Self {
            freq_min_hz: 1.0,
            freq_max_hz: 1000.0,
            asd_min: 1e-18,
            asd_max: 1e-12,
        }
    }
}

/// Runtime configuration for the noise-budget pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Sampling rate [Hz]
    pub sample_rate_hz: f64,
    /// Simulated duration [s]
    pub duration_s: f64,
    /// RNG seed for reproducibility
    pub seed: u64,
    /// Test mass [kg]
    pub mass_kg: f64,
    /// Bath temperature [K]
    pub temperature_k: f64,
    /// Trap resonance frequency [Hz]
    pub trap_frequency_hz: f64,
    /// Trap quality factor
    pub quality_factor: f64,
    /// Ground-noise low-pass cutoff, as a fraction of Nyquist
    pub ground_cutoff: f64,
    /// Raw ground-vibration calibration [m/s^2]
    pub ground_scale: f64,
    /// Isolation-stage suppression applied to ground noise
    pub attenuation: f64,
    /// Welch segment length [s]
    pub segment_seconds: f64,
    /// Welch segment overlap, fraction of the segment length
    pub overlap_fraction: f64,
    /// Detection threshold [m s^-2 Hz^-1/2]
    pub threshold: f64,
    /// Band over which the noise floor is averaged
    pub band: Band,
    /// Plot axis ranges
    pub plot: PlotRange,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 10_000.0,
            duration_s: 10.0,
            seed: 42,
            mass_kg: 2.5e-4,
            temperature_k: 0.010,
            trap_frequency_hz: 0.2,
            quality_factor: 1e10,
            ground_cutoff: 0.1,
            ground_scale: 1e-5,
            attenuation: 1e-9,
            segment_seconds: 2.0,
            overlap_fraction: 0.5,
            threshold: 1.0e-15,
            band: Band::new(20.0, 500.0),
            plot: PlotRange::default(),
        }
    }
}

impl SimConfig {
    /// Checks every invariant the pipeline relies on.
    ///
    /// A zero mass passes; the synthesizer reports it as
    /// [`BudgetError::Domain`] when the thermal variance is computed.
    pub fn validate(&self) -> Result<(), BudgetError> {
        positive("sample_rate_hz", self.sample_rate_hz)?;
        positive("duration_s", self.duration_s)?;
        positive("temperature_k", self.temperature_k)?;
        positive("trap_frequency_hz", self.trap_frequency_hz)?;
        positive("quality_factor", self.quality_factor)?;
        positive("ground_scale", self.ground_scale)?;
        positive("attenuation", self.attenuation)?;
        positive("segment_seconds", self.segment_seconds)?;
        positive("threshold", self.threshold)?;

        if !self.mass_kg.is_finite() || self.mass_kg < 0.0 {
            return Err(BudgetError::Configuration(format!(
                "mass_kg must be finite and non-negative, got {}",
                self.mass_kg
            )));
        }

        if !(self.ground_cutoff > 0.0 && self.ground_cutoff < 1.0) {
            return Err(BudgetError::Configuration(format!(
                "ground_cutoff must be in (0, 1), got {}",
                self.ground_cutoff
            )));
        }

        if !(self.overlap_fraction >= 0.0 && self.overlap_fraction < 1.0) {
            return Err(BudgetError::Configuration(format!(
                "overlap_fraction must be in [0, 1), got {}",
                self.overlap_fraction
            )));
        }

        if self.samples() == 0 {
            return Err(BudgetError::Configuration(
                "sample_rate_hz * duration_s must yield at least one sample".to_string(),
            ));
        }

        if self.segment_len() == 0 {
            return Err(BudgetError::Configuration(
                "segment_seconds * sample_rate_hz must yield at least one sample".to_string(),
            ));
        }

        let Band { low_hz, high_hz } = self.band;
        if !low_hz.is_finite() || !high_hz.is_finite() || low_hz >= high_hz {
            return Err(BudgetError::Configuration(format!(
                "band lower bound {low_hz} Hz must be below upper bound {high_hz} Hz"
            )));
        }
        if low_hz < 0.0 || high_hz > self.nyquist_hz() {
            return Err(BudgetError::Configuration(format!(
                "band ({low_hz}, {high_hz}) Hz must lie within [0, {}] Hz",
                self.nyquist_hz()
            )));
        }

        self.plot.validate()
    }

    /// Number of samples, `floor(rate * duration)`.
    pub fn samples(&self) -> usize {
        (self.sample_rate_hz * self.duration_s).floor() as usize
    }

    /// Sampling interval [s]
    pub fn dt(&self) -> f64 {
        1.0 / self.sample_rate_hz
    }

    pub fn nyquist_hz(&self) -> f64 {
        self.sample_rate_hz / 2.0
    }

    /// Samples per Welch segment.
    pub fn segment_len(&self) -> usize {
        (self.segment_seconds * self.sample_rate_hz).round() as usize
    }

    /// Samples shared by consecutive Welch segments.
    pub fn overlap_len(&self) -> usize {
        (self.segment_len() as f64 * self.overlap_fraction).floor() as usize
    }

    /// Trap damping rate `2 pi f0 / Q` [1/s]
    pub fn damping_rate(&self) -> f64 {
        2.0 * std::f64::consts::PI * self.trap_frequency_hz / self.quality_factor
    }
}

fn positive(name: &str, value: f64) -> Result<(), BudgetError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(BudgetError::Configuration(format!(
            "{name} must be finite and > 0, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_reference_scenario() {
        let cfg = SimConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.samples(), 100_000);
        assert_eq!(cfg.segment_len(), 20_000);
        assert_eq!(cfg.overlap_len(), 10_000);
        assert!((cfg.dt() - 1e-4).abs() < 1e-18);
    }

    #[test]
    fn test_samples_are_floored() {
        let cfg = SimConfig {
            sample_rate_hz: 1000.0,
            duration_s: 1.0005,
            ..Default::default()
        };
        assert_eq!(cfg.samples(), 1000);
    }

    #[test]
    fn test_rejects_non_positive_constants() {
        let cfg = SimConfig {
            temperature_k: 0.0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(BudgetError::Configuration(_))));

        let cfg = SimConfig {
            sample_rate_hz: -1.0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(BudgetError::Configuration(_))));

        let cfg = SimConfig {
            mass_kg: -2.5e-4,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(BudgetError::Configuration(_))));
    }

    #[test]
    fn test_zero_mass_passes_validation() {
        let cfg = SimConfig {
            mass_kg: 0.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_band() {
        let inverted = SimConfig {
            band: Band::new(500.0, 20.0),
            ..Default::default()
        };
        assert!(matches!(inverted.validate(), Err(BudgetError::Configuration(_))));

        let above_nyquist = SimConfig {
            band: Band::new(20.0, 6000.0),
            ..Default::default()
        };
        assert!(matches!(above_nyquist.validate(), Err(BudgetError::Configuration(_))));
    }

    #[test]
    fn test_rejects_bad_plot_range() {
        let inverted = SimConfig {
            plot: PlotRange {
                asd_min: 1e-12,
                asd_max: 1e-18,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(inverted.validate(), Err(BudgetError::Configuration(_))));

        let zero_freq = SimConfig {
            plot: PlotRange {
                freq_min_hz: 0.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(zero_freq.validate(), Err(BudgetError::Configuration(_))));

        let zero_asd = SimConfig {
            plot: PlotRange {
                asd_min: 0.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(zero_asd.validate(), Err(BudgetError::Configuration(_))));
    }

    #[test]
    fn test_band_is_exclusive() {
        let band = Band::new(20.0, 500.0);
        assert!(!band.contains(20.0));
        assert!(band.contains(20.5));
        assert!(band.contains(499.5));
        assert!(!band.contains(500.0));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let cfg: SimConfig = serde_json::from_str(r#"{ "seed": 7, "mass_kg": 1e-3 }"#).unwrap();
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.mass_kg, 1e-3);
        assert_eq!(cfg.sample_rate_hz, 10_000.0);
        assert_eq!(cfg.band, Band::new(20.0, 500.0));
    }
}
