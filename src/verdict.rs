//! Verdict evaluator
//!
//! Reduces a spectrum to the mean ASD over the measurement band and compares
//! it with the detection threshold.

use std::fmt;

use serde::Serialize;
use tracing::info;

use crate::config::Band;
use crate::spectrum::Spectrum;
use crate::BudgetError;

/// Outcome of the threshold comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Verdict {
    pub band: Band,
    /// Mean ASD over the band [m s^-2 Hz^-1/2]
    pub noise_floor: f64,
    pub threshold: f64,
    /// Bins strictly inside the band
    pub bins: usize,
    /// `noise_floor < threshold`
    pub pass: bool,
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        if self.pass {
            "[SUCCESS]"
        } else {
            "[FAILURE]"
        }
    }

    /// Multi-line report: band, measured floor, threshold and verdict.
    pub fn report(&self) -> String {
        format!(
            " > Measurement band : {} Hz - {} Hz ({} bins)\n \
             > Measured noise   : {:.3e} m/s^2/sqrt(Hz)\n \
             > Target threshold : {:.3e} m/s^2/sqrt(Hz)\n \
             >>> VERDICT : {}",
            self.band.low_hz,
            self.band.high_hz,
            self.bins,
            self.noise_floor,
            self.threshold,
            self.label(),
        )
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.report())
    }
}

/// Arithmetic mean of the ASD over bins strictly inside `band`.
pub fn band_mean(spectrum: &Spectrum, band: Band) -> Result<(f64, usize), BudgetError> {
    let (sum, count) = spectrum
        .points()
        .filter(|&(f, _)| band.contains(f))
        .fold((0.0, 0usize), |(sum, count), (_, a)| (sum + a, count + 1));

    if count == 0 {
        return Err(BudgetError::EmptyBand {
            low_hz: band.low_hz,
            high_hz: band.high_hz,
            resolution_hz: spectrum.resolution_hz,
        });
    }

    Ok((sum / count as f64, count))
}

/// Compare the band mean of `spectrum` against `threshold`.
pub fn evaluate(spectrum: &Spectrum, band: Band, threshold: f64) -> Result<Verdict, BudgetError> {
    let (noise_floor, bins) = band_mean(spectrum, band)?;
    let verdict = Verdict {
        band,
        noise_floor,
        threshold,
        bins,
        pass: noise_floor < threshold,
    };

    info!(
        noise_floor,
        threshold,
        bins,
        pass = verdict.pass,
        "verdict evaluated"
    );

    Ok(verdict)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 0.5 Hz bins up to 1000 Hz; 1.0 inside (20, 500), 100.0 elsewhere.
    fn stepped_spectrum() -> Spectrum {
        let frequencies: Vec<f64> = (0..=2000).map(|k| k as f64 * 0.5).collect();
        let asd = frequencies
            .iter()
            .map(|&f| if f > 20.0 && f < 500.0 { 1.0 + f * 1e-3 } else { 100.0 })
            .collect();
        Spectrum {
            frequencies,
            asd,
            segments: 1,
            resolution_hz: 0.5,
        }
    }

    #[test]
    fn test_band_mean_excludes_boundaries() {
        let spec = stepped_spectrum();
        let (mean, bins) = band_mean(&spec, Band::new(20.0, 500.0)).unwrap();

        // 20.5 ..= 499.5 in 0.5 Hz steps
        assert_eq!(bins, 959);
        let expected: f64 = (41..=999)
            .map(|k| 1.0 + k as f64 * 0.5 * 1e-3)
            .sum::<f64>()
            / 959.0;
        assert!((mean - expected).abs() < 1e-12);
    }

    #[test]
    fn test_empty_band() {
        let spec = stepped_spectrum();
        let err = band_mean(&spec, Band::new(100.1, 100.2)).unwrap_err();
        assert!(matches!(err, BudgetError::EmptyBand { .. }));
    }

    #[test]
    fn test_threshold_monotonicity() {
        let spec = stepped_spectrum();
        let band = Band::new(20.0, 500.0);
        let (mean, _) = band_mean(&spec, band).unwrap();

        let tight = evaluate(&spec, band, mean).unwrap();
        let loose = evaluate(&spec, band, mean * 1.01).unwrap();
        assert!(!tight.pass);
        assert!(loose.pass);
        assert_eq!(tight.noise_floor, loose.noise_floor);
    }

    #[test]
    fn test_report_contents() {
        let spec = stepped_spectrum();
        let verdict = evaluate(&spec, Band::new(20.0, 500.0), 1.0e-15).unwrap();
        let report = verdict.report();
        assert!(report.contains("20 Hz - 500 Hz"));
        assert!(report.contains("1.000e-15"));
        assert!(report.contains("[FAILURE]"));
        assert_eq!(verdict.to_string(), report);
    }
}
