//! Thin FFT wrapper over rustfft, planned once per analysis.

use rustfft::{FftPlanner, num_complex::Complex};
use std::sync::Arc;

/// Forward FFT for real input, retaining the positive-frequency half.
pub struct Fft {
    fft: Arc<dyn rustfft::Fft<f64>>,
    size: usize,
}

impl Fft {
    /// Plan a forward FFT of the given size.
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        Self { fft, size }
    }

    /// Transform size.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Forward transform of real input, zero-padded (or truncated) to the
    /// planned size. Returns bins 0..=size/2 (DC through Nyquist).
    pub fn forward(&self, input: &[f64]) -> Vec<Complex<f64>> {
        let mut buffer: Vec<Complex<f64>> =
            input.iter().map(|&x| Complex::new(x, 0.0)).collect();
        buffer.resize(self.size, Complex::new(0.0, 0.0));

        self.fft.process(&mut buffer);

        buffer.truncate(self.size / 2 + 1);
        buffer
    }
}
