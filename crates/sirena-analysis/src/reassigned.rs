//! Time-frequency reassigned short-time spectra.
//!
//! A plain short-time transform smears each spectral component across the
//! window's main lobe in frequency and across the window length in time.
//! Reassignment sharpens both: transforming the frame against the window,
//! the time-ramped window, and the window derivative yields per-bin
//! corrections that relocate each bin's energy to the component's actual
//! time and frequency (the Auger-Flandrin ratio estimates). A bin whose
//! corrected time sits far from the window center is energy from a
//! transient or noise, not a steady sinusoid, and gets discarded upstream
//! by the crop test.

use crate::fft::Fft;
use crate::window::KaiserWindow;
use rustfft::num_complex::Complex;
use std::f64::consts::TAU;

/// Reassigned short-time spectrum of one analysis frame.
pub struct ReassignedSpectrum {
    window: KaiserWindow,
    fft: Fft,
    plain: Vec<Complex<f64>>,
    ramped: Vec<Complex<f64>>,
    derived: Vec<Complex<f64>>,
}

impl ReassignedSpectrum {
    /// Create a reassigned-spectrum processor for the given analysis window.
    ///
    /// The transform size is the window length rounded up to a power of two
    /// and doubled, which oversamples the spectrum enough for accurate
    /// magnitude interpolation at peaks.
    pub fn new(window: KaiserWindow) -> Self {
        let fft_size = (2 * window.len()).next_power_of_two();
        Self {
            fft: Fft::new(fft_size),
            window,
            plain: Vec::new(),
            ramped: Vec::new(),
            derived: Vec::new(),
        }
    }

    /// The analysis window.
    pub fn window(&self) -> &KaiserWindow {
        &self.window
    }

    /// Transform size.
    pub fn fft_size(&self) -> usize {
        self.fft.size()
    }

    /// Number of positive-frequency bins available after [`Self::transform`].
    pub fn num_bins(&self) -> usize {
        self.plain.len()
    }

    /// Analyze one frame of samples. `frame` must be exactly as long as the
    /// analysis window; the caller zero-pads at buffer edges.
    pub fn transform(&mut self, frame: &[f64]) {
        debug_assert_eq!(frame.len(), self.window.len());
        let n = self.window.len();
        let center = self.window.center() as f64;

        let mut windowed = vec![0.0; n];
        for i in 0..n {
            windowed[i] = frame[i] * self.window.samples()[i];
        }
        self.plain = self.fft.forward(&windowed);

        for i in 0..n {
            windowed[i] = frame[i] * (i as f64 - center) * self.window.samples()[i];
        }
        self.ramped = self.fft.forward(&windowed);

        for i in 0..n {
            windowed[i] = frame[i] * self.window.derivative()[i];
        }
        self.derived = self.fft.forward(&windowed);
    }

    /// Raw magnitude of bin `k`.
    pub fn magnitude(&self, k: usize) -> f64 {
        self.plain[k].norm()
    }

    /// Sinusoidal amplitude estimate at the peak bin `k`, parabolically
    /// interpolated over the log magnitudes of the three bins around the
    /// peak and normalized so a unit-amplitude sine measures 1.0.
    pub fn peak_amplitude(&self, k: usize) -> f64 {
        let scale = 2.0 / self.window.coefficient_sum();
        if k == 0 || k + 1 >= self.plain.len() {
            return self.magnitude(k) * scale;
        }
        let a = self.magnitude(k - 1).max(1e-300).ln();
        let b = self.magnitude(k).max(1e-300).ln();
        let c = self.magnitude(k + 1).max(1e-300).ln();
        let denom = a - 2.0 * b + c;
        if denom.abs() < 1e-12 {
            return self.magnitude(k) * scale;
        }
        let p = 0.5 * (a - c) / denom;
        (b - 0.25 * (a - c) * p).exp() * scale
    }

    /// Reassigned frequency of bin `k`, in fractional bins of the transform.
    pub fn fractional_frequency(&self, k: usize) -> f64 {
        let x = self.plain[k];
        let power = x.norm_sqr();
        if power <= 0.0 {
            return k as f64;
        }
        // omega_hat = omega_k - Im(X_dw * conj(X_w)) / |X_w|^2, in
        // radians per sample; converted back to transform bins.
        let correction = (self.derived[k] * x.conj()).im / power;
        k as f64 - correction * self.fft.size() as f64 / TAU
    }

    /// Reassigned time of bin `k`, in samples relative to the window center.
    pub fn time_correction(&self, k: usize) -> f64 {
        let x = self.plain[k];
        let power = x.norm_sqr();
        if power <= 0.0 {
            return 0.0;
        }
        (self.ramped[k] * x.conj()).re / power
    }

    /// Phase of bin `k` at the window center, in radians.
    pub fn phase_at_center(&self, k: usize) -> f64 {
        let raw = self.plain[k].arg();
        let rotation = TAU * k as f64 * self.window.center() as f64 / self.fft.size() as f64;
        raw + rotation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze_sine(freq: f64, sample_rate: f64, phase0: f64) -> (ReassignedSpectrum, usize) {
        let window = KaiserWindow::for_main_lobe(200.0, 80.0, sample_rate);
        let n = window.len();
        let frame: Vec<f64> = (0..n)
            .map(|i| (TAU * freq * i as f64 / sample_rate + phase0).cos())
            .collect();

        let mut spectrum = ReassignedSpectrum::new(window);
        spectrum.transform(&frame);

        let peak = (1..spectrum.num_bins() - 1)
            .max_by(|&a, &b| {
                spectrum
                    .magnitude(a)
                    .partial_cmp(&spectrum.magnitude(b))
                    .unwrap()
            })
            .unwrap();
        (spectrum, peak)
    }

    #[test]
    fn reassigned_frequency_hits_off_bin_sine() {
        let sample_rate = 44100.0;
        let freq = 441.3; // deliberately between bins
        let (spectrum, peak) = analyze_sine(freq, sample_rate, 0.0);

        let est = spectrum.fractional_frequency(peak) * sample_rate / spectrum.fft_size() as f64;
        assert!(
            (est - freq).abs() < 0.5,
            "estimated {est:.3} Hz, expected {freq}"
        );
    }

    #[test]
    fn amplitude_estimate_is_accurate() {
        let (spectrum, peak) = analyze_sine(440.0, 44100.0, 0.0);
        let amp = spectrum.peak_amplitude(peak);
        assert!((amp - 1.0).abs() < 0.02, "estimated amplitude {amp:.4}");
    }

    #[test]
    fn time_correction_near_zero_for_steady_sine() {
        let (spectrum, peak) = analyze_sine(440.0, 44100.0, 0.0);
        // A stationary sinusoid is centered on the window.
        let t = spectrum.time_correction(peak);
        assert!(t.abs() < 2.0, "time correction {t} samples");
    }

    #[test]
    fn phase_recovered_at_window_center() {
        let sample_rate = 44100.0;
        let freq = 1000.0;
        let phase0 = 0.7;
        let (spectrum, peak) = analyze_sine(freq, sample_rate, phase0);

        // Expected cosine phase at the window center sample.
        let center = spectrum.window().center() as f64;
        let expected = (TAU * freq * center / sample_rate + phase0) % TAU;
        let measured = spectrum.phase_at_center(peak).rem_euclid(TAU);

        let mut diff = (measured - expected).abs() % TAU;
        if diff > TAU / 2.0 {
            diff = TAU - diff;
        }
        assert!(diff < 0.1, "phase off by {diff:.4} rad");
    }
}
