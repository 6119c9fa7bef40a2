//! Spectral estimator
//!
//! Welch's method: split the series into overlapping segments, detrend and
//! window each one, average the one-sided periodograms and take the square
//! root to get an amplitude spectral density.
//!
//! The transform itself sits behind [`PowerTransform`] so the averaging and
//! scaling can be checked against a direct DFT on hand-sized inputs.

use std::f64::consts::PI;
use std::fmt;

use rustfft::num_complex::Complex64;
use rustfft::FftPlanner;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::SimConfig;
use crate::BudgetError;

/// Squared DFT magnitudes of a real segment.
pub trait PowerTransform {
    /// Returns `|X_k|^2` for `k = 0..=n/2`, where `n = segment.len()`.
    fn power(&mut self, segment: &[f64]) -> Vec<f64>;
}

/// FFT-backed transform. Plans are cached per segment length.
pub struct FftTransform {
    planner: FftPlanner<f64>,
    buffer: Vec<Complex64>,
    scratch: Vec<Complex64>,
}

impl fmt::Debug for FftTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FftTransform")
            .field("buffer_len", &self.buffer.len())
            .finish()
    }
}

impl FftTransform {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
            buffer: Vec::new(),
            scratch: Vec::new(),
        }
    }
}

impl Default for FftTransform {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerTransform for FftTransform {
    fn power(&mut self, segment: &[f64]) -> Vec<f64> {
        let n = segment.len();
        let fft = self.planner.plan_fft_forward(n);

        self.buffer.clear();
        self.buffer
            .extend(segment.iter().map(|&x| Complex64::new(x, 0.0)));
        self.scratch
            .resize(fft.get_inplace_scratch_len(), Complex64::new(0.0, 0.0));
        fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        self.buffer[..n / 2 + 1].iter().map(|x| x.norm_sqr()).collect()
    }
}

/// O(n^2) reference transform.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectDft;

impl PowerTransform for DirectDft {
    fn power(&mut self, segment: &[f64]) -> Vec<f64> {
        let n = segment.len();
        (0..=n / 2)
            .map(|k| {
                let mut acc = Complex64::new(0.0, 0.0);
                for (j, &x) in segment.iter().enumerate() {
                    let angle = -2.0 * PI * (k * j) as f64 / n as f64;
                    acc += Complex64::new(angle.cos(), angle.sin()) * x;
                }
                acc.norm_sqr()
            })
            .collect()
    }
}

/// Segment taper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Window {
    /// Periodic Hann
    Hann,
    Rectangular,
}

impl Window {
    pub fn coefficients(self, size: usize) -> Vec<f64> {
        (0..size)
            .map(|i| match self {
                Window::Hann => 0.5 - 0.5 * (2.0 * PI * i as f64 / size as f64).cos(),
                Window::Rectangular => 1.0,
            })
            .collect()
    }
}

/// Per-segment detrending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Detrend {
    None,
    /// Subtract the segment mean
    Constant,
}

/// Welch estimator settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WelchConfig {
    /// Samples per segment
    pub segment_len: usize,
    /// Samples shared by consecutive segments
    pub overlap_len: usize,
    pub window: Window,
    pub detrend: Detrend,
}

impl WelchConfig {
    /// Hann window, constant detrend, segment and overlap from `config`.
    pub fn from_sim(config: &SimConfig) -> Self {
        Self {
            segment_len: config.segment_len(),
            overlap_len: config.overlap_len(),
            window: Window::Hann,
            detrend: Detrend::Constant,
        }
    }

    /// Half-overlapped Hann segments of `segment_len` samples.
    pub fn hann(segment_len: usize) -> Self {
        Self {
            segment_len,
            overlap_len: segment_len / 2,
            window: Window::Hann,
            detrend: Detrend::Constant,
        }
    }
}

/// One-sided amplitude spectral density.
#[derive(Debug, Clone, Serialize)]
pub struct Spectrum {
    /// Bin frequencies [Hz], ascending from 0 to at most Nyquist
    pub frequencies: Vec<f64>,
    /// Amplitude spectral density per bin [signal / sqrt(Hz)]
    pub asd: Vec<f64>,
    /// Number of averaged segments
    pub segments: usize,
    /// Bin spacing [Hz]
    pub resolution_hz: f64,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Power spectral density, the square of the ASD.
    pub fn psd(&self) -> Vec<f64> {
        self.asd.iter().map(|a| a * a).collect()
    }

    /// `(frequency, asd)` pairs.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.frequencies.iter().copied().zip(self.asd.iter().copied())
    }
}

/// Welch ASD estimator over an arbitrary [`PowerTransform`].
#[derive(Debug)]
pub struct WelchEstimator<T: PowerTransform = FftTransform> {
    config: WelchConfig,
    window: Vec<f64>,
    window_power: f64,
    transform: T,
}

impl WelchEstimator<FftTransform> {
    pub fn new(config: WelchConfig) -> Self {
        Self::with_transform(config, FftTransform::new())
    }
}

impl<T: PowerTransform> WelchEstimator<T> {
    pub fn with_transform(config: WelchConfig, transform: T) -> Self {
        let window = config.window.coefficients(config.segment_len);
        let window_power = window.iter().map(|w| w * w).sum();
        Self {
            config,
            window,
            window_power,
            transform,
        }
    }

    /// Estimate the ASD of `series` sampled at `sample_rate_hz`.
    pub fn estimate(&mut self, series: &[f64], sample_rate_hz: f64) -> Result<Spectrum, BudgetError> {
        let n = self.config.segment_len;
        if n == 0 {
            return Err(BudgetError::Configuration(
                "estimator: segment length must be at least one sample".to_string(),
            ));
        }
        if self.config.overlap_len >= n {
            return Err(BudgetError::Configuration(format!(
                "estimator: overlap {} must be shorter than the segment length {n}",
                self.config.overlap_len
            )));
        }
        if !(sample_rate_hz.is_finite() && sample_rate_hz > 0.0) {
            return Err(BudgetError::Configuration(format!(
                "estimator: sample rate must be finite and > 0, got {sample_rate_hz}"
            )));
        }
        if self.window_power <= 0.0 {
            return Err(BudgetError::Configuration(format!(
                "estimator: {:?} window of length {n} has zero energy",
                self.config.window
            )));
        }
        if n > series.len() {
            return Err(BudgetError::InsufficientData {
                segment_len: n,
                series_len: series.len(),
            });
        }

        let step = n - self.config.overlap_len;
        let segments = (series.len() - n) / step + 1;
        let bins = n / 2 + 1;
        debug!(segment_len = n, step, segments, "welch segmentation");

        let mut accum = vec![0.0f64; bins];
        let mut tapered = vec![0.0f64; n];

        for seg in 0..segments {
            let chunk = &series[seg * step..seg * step + n];
            let offset = match self.config.detrend {
                Detrend::None => 0.0,
                Detrend::Constant => chunk.iter().sum::<f64>() / n as f64,
            };

            for ((dst, &x), &w) in tapered.iter_mut().zip(chunk).zip(&self.window) {
                *dst = (x - offset) * w;
            }

            for (acc, p) in accum.iter_mut().zip(self.transform.power(&tapered)) {
                *acc += p;
            }
        }

        let scale = 1.0 / (sample_rate_hz * self.window_power * segments as f64);
        // DC is never doubled, Nyquist only exists for even lengths.
        let last_doubled = if n % 2 == 0 { bins - 1 } else { bins };

        let asd: Vec<f64> = accum
            .iter()
            .enumerate()
            .map(|(k, &p)| {
                let one_sided = if k > 0 && k < last_doubled { 2.0 } else { 1.0 };
                (p * scale * one_sided).max(0.0).sqrt()
            })
            .collect();

        let resolution_hz = sample_rate_hz / n as f64;
        let frequencies: Vec<f64> = (0..bins).map(|k| k as f64 * resolution_hz).collect();

        info!(bins, segments, resolution_hz, "spectrum estimated");

        Ok(Spectrum {
            frequencies,
            asd,
            segments,
            resolution_hz,
        })
    }
}
