//! The bandwidth-enhanced oscillator.

use crate::noise::NoiseModulator;
use std::f64::consts::TAU;

/// A phase-accumulating oscillator with noise modulation.
///
/// Each rendered sample is
///
/// ```text
/// amp * (sqrt(1 - bw) + sqrt(2 * bw) * noise) * cos(phase)
/// ```
///
/// where `noise` is unit-variance lowpass-filtered gaussian noise. The
/// carrier multiplication centers the noise band on the oscillator
/// frequency, and the sqrt(2) keeps total energy equal to `amp^2`
/// regardless of how the bandwidth splits it between sine and noise.
///
/// Phase is accumulated by integrating the frequency ramp sample by sample,
/// never looked up per sample from absolute time, so frequency changes can
/// not produce phase discontinuities.
#[derive(Debug, Clone)]
pub struct Oscillator {
    sample_rate: f64,
    phase: f64,
    modulator: NoiseModulator,
}

impl Oscillator {
    /// Create an oscillator with a per-partial noise seed.
    pub fn new(sample_rate: f64, seed: u64) -> Self {
        Self {
            sample_rate,
            phase: 0.0,
            modulator: NoiseModulator::new(sample_rate, seed),
        }
    }

    /// Set the accumulated phase, in radians.
    pub fn set_phase(&mut self, phase: f64) {
        self.phase = phase;
    }

    /// Current accumulated phase, in radians.
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Render one segment, adding into `out`.
    ///
    /// Frequency (Hz), amplitude, and bandwidth each ramp linearly from
    /// `from` to `to` across the segment's samples.
    pub fn render_segment(
        &mut self,
        out: &mut [f64],
        from: (f64, f64, f64),
        to: (f64, f64, f64),
    ) {
        let n = out.len();
        if n == 0 {
            return;
        }
        let (f0, a0, b0) = from;
        let (f1, a1, b1) = to;
        let inv = 1.0 / n as f64;

        for (i, slot) in out.iter_mut().enumerate() {
            let alpha = i as f64 * inv;
            let freq = f0 + alpha * (f1 - f0);
            let amp = a0 + alpha * (a1 - a0);
            let bw = (b0 + alpha * (b1 - b0)).clamp(0.0, 1.0);

            let carrier = self.phase.cos();
            let envelope = if bw > 0.0 {
                amp * ((1.0 - bw).sqrt() + (2.0 * bw).sqrt() * self.modulator.next())
            } else {
                amp
            };
            *slot += envelope * carrier;

            self.phase += TAU * freq / self.sample_rate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_sine_segment_is_a_cosine() {
        let sample_rate = 44100.0;
        let freq = 441.0;
        let mut osc = Oscillator::new(sample_rate, 1);
        osc.set_phase(0.0);

        let mut out = vec![0.0; 4410];
        osc.render_segment(&mut out, (freq, 0.5, 0.0), (freq, 0.5, 0.0));

        for (i, &y) in out.iter().enumerate() {
            let expected = 0.5 * (TAU * freq * i as f64 / sample_rate).cos();
            assert!(
                (y - expected).abs() < 1e-9,
                "sample {i}: {y} vs {expected}"
            );
        }
    }

    #[test]
    fn phase_is_continuous_across_segments() {
        let sample_rate = 44100.0;
        let mut osc = Oscillator::new(sample_rate, 1);

        let mut first = vec![0.0; 100];
        osc.render_segment(&mut first, (440.0, 1.0, 0.0), (440.0, 1.0, 0.0));
        let phase_after = osc.phase();

        let expected = TAU * 440.0 * 100.0 / sample_rate;
        assert!((phase_after - expected).abs() < 1e-9);

        // Rendering a frequency ramp keeps accumulating smoothly.
        let mut second = vec![0.0; 100];
        osc.render_segment(&mut second, (440.0, 1.0, 0.0), (880.0, 1.0, 0.0));
        assert!(osc.phase() > phase_after);
    }

    #[test]
    fn amplitude_ramp_is_linear() {
        let mut osc = Oscillator::new(44100.0, 1);
        let mut out = vec![0.0; 1000];
        // Frequency 0 keeps the carrier at cos(0) = 1, exposing the ramp.
        osc.render_segment(&mut out, (0.0, 0.0, 0.0), (0.0, 1.0, 0.0));

        for (i, &y) in out.iter().enumerate() {
            let expected = i as f64 / 1000.0;
            assert!((y - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn full_bandwidth_preserves_energy() {
        let sample_rate = 44100.0;
        let mut osc = Oscillator::new(sample_rate, 12345);
        // Settle the noise filter.
        let mut warmup = vec![0.0; 2000];
        osc.render_segment(&mut warmup, (440.0, 1.0, 1.0), (440.0, 1.0, 1.0));

        let mut out = vec![0.0; 88200];
        osc.render_segment(&mut out, (440.0, 0.5, 1.0), (440.0, 0.5, 1.0));

        let rms = (out.iter().map(|y| y * y).sum::<f64>() / out.len() as f64).sqrt();
        // Expect rms near amp / sqrt(2) * sqrt(2) * ... = amp * sqrt(E[nu^2] * E[cos^2] * 2)
        // = amp; allow generous tolerance for the finite sample.
        assert!(
            (rms - 0.5).abs() < 0.1,
            "rms {rms}, expected near 0.5"
        );
    }

    #[test]
    fn rendering_adds_into_the_buffer() {
        let mut osc = Oscillator::new(44100.0, 1);
        let mut out = vec![1.0; 10];
        osc.render_segment(&mut out, (0.0, 0.5, 0.0), (0.0, 0.5, 0.0));
        for &y in &out {
            assert!((y - 1.5).abs() < 1e-12);
        }
    }
}
