//! Maximum-likelihood fundamental frequency estimation.
//!
//! The estimator works on peaks that the spectral analysis has already
//! extracted, not on raw samples: given the amplitudes and frequencies of
//! one frame's sinusoids, it searches [fmin, fmax] for the fundamental that
//! best explains them as harmonics, scoring candidates by an
//! amplitude-squared-weighted harmonic comb likelihood.

use sirena_core::BreakpointEnvelope;

/// A fundamental frequency estimate with its normalized confidence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct F0Estimate {
    frequency: f64,
    confidence: f64,
}

impl F0Estimate {
    /// Estimate the fundamental from one frame's sinusoidal peaks.
    ///
    /// The likelihood at a candidate f0 is
    /// `sum(a_i^2 * cos(2*pi*f_i/f0)) / sum(a_i^2)`, which reaches 1.0 when
    /// every peak frequency is a perfect harmonic of f0. A coarse grid over
    /// [fmin, fmax] locates the peak of the likelihood; iterative step
    /// halving refines it until the step is below `resolution` Hz. Returns
    /// a zero-confidence estimate when no peaks are given or the band is
    /// degenerate.
    pub fn from_peaks(
        amps: &[f64],
        freqs: &[f64],
        fmin: f64,
        fmax: f64,
        resolution: f64,
    ) -> Self {
        let zero = Self {
            frequency: 0.0,
            confidence: 0.0,
        };
        if amps.is_empty() || amps.len() != freqs.len() || fmin <= 0.0 || fmax <= fmin {
            return zero;
        }
        let total: f64 = amps.iter().map(|a| a * a).sum();
        if total <= 0.0 {
            return zero;
        }

        let likelihood = |f0: f64| -> f64 {
            let mut q = 0.0;
            for (a, f) in amps.iter().zip(freqs) {
                q += a * a * (std::f64::consts::TAU * f / f0).cos();
            }
            q / total
        };

        // Coarse grid; ties go to the higher candidate so a subharmonic
        // never beats the true fundamental on equal evidence. The comb
        // likelihood oscillates in f0 with period ~ fmin^2 / f_max, so the
        // grid step must resolve that, not the requested resolution.
        let f_top = freqs.iter().fold(fmin, |m, &f| m.max(f));
        let coarse_step = (fmin * fmin / f_top / 4.0).clamp(1e-3, (fmax - fmin).max(1e-3));
        let mut best_f = fmin;
        let mut best_q = likelihood(fmin);
        let mut f = fmin + coarse_step;
        while f <= fmax {
            let q = likelihood(f);
            if q >= best_q {
                best_q = q;
                best_f = f;
            }
            f += coarse_step;
        }

        // Refine by step halving around the coarse winner.
        let mut step = coarse_step / 2.0;
        while step > resolution * 0.01 {
            for candidate in [best_f - step, best_f + step] {
                if candidate >= fmin && candidate <= fmax {
                    let q = likelihood(candidate);
                    if q > best_q {
                        best_q = q;
                        best_f = candidate;
                    }
                }
            }
            step /= 2.0;
        }

        Self {
            frequency: best_f,
            confidence: best_q.clamp(0.0, 1.0),
        }
    }

    /// Estimated fundamental in Hz.
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Normalized confidence in [0, 1]; 1.0 means every peak is a perfect
    /// harmonic of the estimate.
    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

/// Parameters for building a fundamental envelope during analysis.
#[derive(Debug, Clone, Copy)]
pub struct FundamentalParams {
    /// Lower bound on the fundamental estimate, Hz.
    pub fmin: f64,
    /// Upper bound on the fundamental estimate, Hz.
    pub fmax: f64,
    /// Peaks quieter than this (dB, negative) do not contribute; very quiet
    /// peaks have unreliable frequency estimates.
    pub thresh_db: f64,
    /// Peaks above this frequency (Hz) do not contribute.
    pub thresh_hz: f64,
}

impl FundamentalParams {
    /// Bounds with the default contribution thresholds (-60 dB, 8 kHz).
    pub fn new(fmin: f64, fmax: f64) -> Self {
        Self {
            fmin,
            fmax,
            thresh_db: -60.0,
            thresh_hz: 8000.0,
        }
    }
}

/// Accumulates per-frame fundamental estimates into an envelope.
///
/// Frames whose estimate has confidence below 0.9 contribute no point, so
/// octave errors in quiet or noisy frames don't corrupt the contour.
pub struct FundamentalBuilder {
    params: FundamentalParams,
    envelope: BreakpointEnvelope,
}

impl FundamentalBuilder {
    /// Minimum confidence for an estimate to be recorded.
    pub const MIN_CONFIDENCE: f64 = 0.9;

    /// Create a builder for the given estimation parameters.
    pub fn new(params: FundamentalParams) -> Self {
        Self {
            params,
            envelope: BreakpointEnvelope::new(),
        }
    }

    /// Consider one frame of (amplitude, frequency) peaks at `time`.
    pub fn add_frame(&mut self, time: f64, amps_freqs: impl Iterator<Item = (f64, f64)>) {
        let floor = 10.0_f64.powf(self.params.thresh_db / 20.0);
        let mut amps = Vec::new();
        let mut freqs = Vec::new();
        for (a, f) in amps_freqs {
            if a >= floor && f <= self.params.thresh_hz {
                amps.push(a);
                freqs.push(f);
            }
        }
        let est = F0Estimate::from_peaks(
            &amps,
            &freqs,
            self.params.fmin,
            self.params.fmax,
            0.1,
        );
        if est.confidence() >= Self::MIN_CONFIDENCE {
            self.envelope.insert(time, est.frequency());
        }
    }

    /// The accumulated fundamental envelope.
    pub fn finish(self) -> BreakpointEnvelope {
        self.envelope
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_harmonics_estimate_exactly() {
        let amps = [1.0, 0.5, 0.25, 0.1];
        let freqs = [440.0, 880.0, 1320.0, 1760.0];
        let est = F0Estimate::from_peaks(&amps, &freqs, 300.0, 600.0, 0.1);

        assert!(
            (est.frequency() - 440.0).abs() < 0.5,
            "estimated {}",
            est.frequency()
        );
        assert!(est.confidence() > 0.99);
    }

    #[test]
    fn missing_fundamental_still_found() {
        // Harmonics 2..5 of 200 Hz, fundamental absent.
        let amps = [1.0, 0.8, 0.6, 0.4];
        let freqs = [400.0, 600.0, 800.0, 1000.0];
        let est = F0Estimate::from_peaks(&amps, &freqs, 150.0, 350.0, 0.1);

        assert!(
            (est.frequency() - 200.0).abs() < 1.0,
            "estimated {}",
            est.frequency()
        );
    }

    #[test]
    fn inharmonic_peaks_have_low_confidence() {
        let amps = [1.0, 1.0, 1.0];
        let freqs = [440.0, 617.0, 941.0];
        let est = F0Estimate::from_peaks(&amps, &freqs, 100.0, 500.0, 0.1);
        assert!(est.confidence() < 0.99);
    }

    #[test]
    fn empty_input_is_zero_confidence() {
        let est = F0Estimate::from_peaks(&[], &[], 100.0, 500.0, 0.1);
        assert_eq!(est.confidence(), 0.0);
    }

    #[test]
    fn builder_skips_low_confidence_frames() {
        let mut builder = FundamentalBuilder::new(FundamentalParams::new(300.0, 600.0));

        // Clean harmonic frame.
        builder.add_frame(0.0, [(1.0, 440.0), (0.5, 880.0)].into_iter());
        // Garbage frame: no point recorded.
        builder.add_frame(0.1, [(1.0, 433.0), (1.0, 650.0), (1.0, 1100.0)].into_iter());

        let env = builder.finish();
        assert_eq!(env.len(), 1);
        assert!((env.value_at(0.0) - 440.0).abs() < 1.0);
    }

    #[test]
    fn builder_ignores_peaks_beyond_thresholds() {
        let mut builder = FundamentalBuilder::new(FundamentalParams::new(300.0, 600.0));
        // One good harmonic pair plus an ultrasonic and a sub-floor peak
        // that must not disturb the estimate.
        builder.add_frame(
            0.0,
            [(1.0, 440.0), (0.5, 880.0), (1.0, 9500.0), (1e-5, 517.0)].into_iter(),
        );

        let env = builder.finish();
        assert_eq!(env.len(), 1);
        assert!((env.value_at(0.0) - 440.0).abs() < 1.0);
    }
}
