//! Kaiser analysis windows.
//!
//! The analysis window is parameterized by its sidelobe attenuation (dB) and
//! its main-lobe width (Hz, zero-to-zero). The attenuation fixes the Kaiser
//! shape parameter beta; the main-lobe width and the sample rate fix the
//! window length. Wider windows resolve closer partials at the cost of time
//! resolution.

use std::f64::consts::PI;

/// A Kaiser window with its sampled coefficients and derivative.
///
/// The derivative is needed by frequency reassignment; it is computed by
/// central differences over the sampled window, which is accurate to the
/// same order as the reassignment estimates themselves.
#[derive(Debug, Clone)]
pub struct KaiserWindow {
    samples: Vec<f64>,
    derivative: Vec<f64>,
    beta: f64,
}

impl KaiserWindow {
    /// Build a window whose main lobe spans `main_lobe_hz` (zero-to-zero) at
    /// `sample_rate`, with the given sidelobe attenuation in positive dB.
    ///
    /// The length is always odd so the window has an exact center sample.
    pub fn for_main_lobe(main_lobe_hz: f64, sidelobe_db: f64, sample_rate: f64) -> Self {
        let beta = Self::beta_for_attenuation(sidelobe_db);
        // First zero of the Kaiser transform sits at f = sqrt(beta^2 + pi^2)
        // / (N * pi) in normalized frequency, so the zero-to-zero main lobe
        // is twice that.
        let len = (2.0 * sample_rate * (beta * beta + PI * PI).sqrt() / (PI * main_lobe_hz)).ceil()
            as usize;
        let len = if len % 2 == 0 { len + 1 } else { len }.max(3);
        Self::with_length(len, beta)
    }

    /// Build a window of exactly `len` samples (forced odd) with shape
    /// parameter `beta`.
    pub fn with_length(len: usize, beta: f64) -> Self {
        let len = if len % 2 == 0 { len + 1 } else { len }.max(3);
        let norm = bessel_i0(beta);
        let half = (len - 1) as f64 / 2.0;
        let samples: Vec<f64> = (0..len)
            .map(|n| {
                let x = (n as f64 - half) / half;
                bessel_i0(beta * (1.0 - x * x).max(0.0).sqrt()) / norm
            })
            .collect();

        let mut derivative = vec![0.0; len];
        for n in 0..len {
            derivative[n] = match n {
                0 => samples[1] - samples[0],
                _ if n == len - 1 => samples[len - 1] - samples[len - 2],
                _ => (samples[n + 1] - samples[n - 1]) / 2.0,
            };
        }

        Self {
            samples,
            derivative,
            beta,
        }
    }

    /// Kaiser's empirical beta for a target sidelobe attenuation in dB.
    pub fn beta_for_attenuation(atten_db: f64) -> f64 {
        if atten_db > 50.0 {
            0.1102 * (atten_db - 8.7)
        } else if atten_db >= 21.0 {
            0.5842 * (atten_db - 21.0).powf(0.4) + 0.07886 * (atten_db - 21.0)
        } else {
            0.0
        }
    }

    /// Window length in samples (always odd).
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when the window is empty (never the case after construction).
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Index of the center sample.
    pub fn center(&self) -> usize {
        (self.samples.len() - 1) / 2
    }

    /// The window coefficients.
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Per-sample derivative of the window.
    pub fn derivative(&self) -> &[f64] {
        &self.derivative
    }

    /// Shape parameter.
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Sum of the coefficients. Normalizes spectral magnitudes so a
    /// full-scale sine measures amplitude 1.0.
    pub fn coefficient_sum(&self) -> f64 {
        self.samples.iter().sum()
    }

    /// Sum of squared coefficients.
    pub fn squared_sum(&self) -> f64 {
        self.samples.iter().map(|w| w * w).sum()
    }
}

/// Zeroth-order modified Bessel function of the first kind, by power series.
///
/// Converges quickly for the beta range of audio analysis windows (< 20).
fn bessel_i0(x: f64) -> f64 {
    let half_x = x / 2.0;
    let mut sum = 1.0;
    let mut term = 1.0;
    for k in 1..=32 {
        term *= half_x / k as f64;
        let contribution = term * term;
        sum += contribution;
        if contribution < sum * 1e-16 {
            break;
        }
    }
    sum
}
