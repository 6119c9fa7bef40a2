//! First-order IIR low-pass used to shape ground vibration

/// First-order Butterworth low-pass in direct form:
/// `y[n] = b0 x[n] + b1 x[n-1] - a1 y[n-1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirstOrderLowPass {
    pub b0: f64,
    pub b1: f64,
    pub a1: f64,
}

impl FirstOrderLowPass {
    /// Design via the bilinear transform with prewarping.
    ///
    /// `cutoff` is normalized to Nyquist and must lie in (0, 1).
    pub fn butterworth(cutoff: f64) -> Self {
        let k = (std::f64::consts::PI * cutoff / 2.0).tan();
        let b = k / (1.0 + k);
        Self {
            b0: b,
            b1: b,
            a1: (k - 1.0) / (k + 1.0),
        }
    }

    /// Filter `input` starting from rest.
    pub fn apply(&self, input: &[f64]) -> Vec<f64> {
        let mut output = Vec::with_capacity(input.len());
        let mut x_prev = 0.0;
        let mut y_prev = 0.0;

        for &x in input {
            let y = self.b0 * x + self.b1 * x_prev - self.a1 * y_prev;
            output.push(y);
            x_prev = x;
            y_prev = y;
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dc_gain(lp: &FirstOrderLowPass) -> f64 {
        (lp.b0 + lp.b1) / (1.0 + lp.a1)
    }

    #[test]
    fn test_butterworth_coefficients() {
        // Reference values for Wn = 0.1
        let lp = FirstOrderLowPass::butterworth(0.1);
        assert!((lp.b0 - 0.136_728_735_997_319_6).abs() < 1e-12);
        assert!((lp.b1 - lp.b0).abs() < 1e-15);
        assert!((lp.a1 + 0.726_542_528_005_360_8).abs() < 1e-12);
    }

    #[test]
    fn test_unity_dc_gain() {
        for cutoff in [0.01, 0.1, 0.5, 0.9] {
            let lp = FirstOrderLowPass::butterworth(cutoff);
            assert!((dc_gain(&lp) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_step_response_settles() {
        let lp = FirstOrderLowPass::butterworth(0.1);
        let out = lp.apply(&vec![1.0; 500]);
        assert_eq!(out.len(), 500);
        assert!((out[0] - lp.b0).abs() < 1e-15);
        assert!((out[499] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_nyquist_is_rejected() {
        let lp = FirstOrderLowPass::butterworth(0.1);
        let alternating: Vec<f64> = (0..400).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let out = lp.apply(&alternating);
        assert!(out[399].abs() < 1e-9);
    }
}
