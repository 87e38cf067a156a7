//! Reassigned bandwidth-enhanced analysis.

use crate::bandwidth::associate_bandwidth;
use crate::config::AnalyzerConfig;
use crate::fundamental::{FundamentalBuilder, FundamentalParams};
use crate::peaks::{PeakSelection, extract_peaks};
use crate::reassigned::ReassignedSpectrum;
use crate::tracker::{GuidedTracker, Tracker};
use crate::window::KaiserWindow;
use sirena_core::{
    BreakpointEnvelope, CancelToken, Error, Partial, PartialCollection, Result,
};
use std::f64::consts::TAU;
use tracing::{debug, info};

/// Performs reassigned bandwidth-enhanced analysis of sampled sounds.
///
/// Analysis yields a [`PartialCollection`]: each partial is a trio of
/// synchronous, non-uniformly sampled breakpoint envelopes for the
/// time-varying frequency, amplitude, and noisiness of one
/// bandwidth-enhanced sinusoid.
///
/// # Example
///
/// ```rust,ignore
/// use sirena_analysis::Analyzer;
///
/// let mut analyzer = Analyzer::with_window(240.0, 300.0);
/// analyzer.build_fundamental_env(150.0, 450.0);
/// let partials = analyzer.analyze(&samples, 44100.0)?;
/// let reference = analyzer.fundamental_env().clone();
/// ```
pub struct Analyzer {
    config: AnalyzerConfig,
    fundamental_params: Option<FundamentalParams>,
    amp_env_enabled: bool,
    fundamental_env: BreakpointEnvelope,
    amp_env: BreakpointEnvelope,
    cancel: Option<CancelToken>,
}

impl Analyzer {
    /// Analyzer with the given frequency resolution; the window width
    /// defaults to the resolution and all other parameters derive from it.
    pub fn new(freq_resolution: f64) -> Self {
        Self::from_config(AnalyzerConfig::new(freq_resolution))
    }

    /// Analyzer with the given frequency resolution and main-lobe window
    /// width in Hz.
    pub fn with_window(freq_resolution: f64, window_width: f64) -> Self {
        Self::from_config(AnalyzerConfig::with_window(freq_resolution, window_width))
    }

    /// Analyzer from a fully explicit configuration (e.g. a loaded preset).
    pub fn from_config(config: AnalyzerConfig) -> Self {
        Self {
            config,
            fundamental_params: None,
            amp_env_enabled: false,
            fundamental_env: BreakpointEnvelope::new(),
            amp_env: BreakpointEnvelope::new(),
            cancel: None,
        }
    }

    /// Re-derive all parameters from a new resolution and window width.
    pub fn configure(&mut self, freq_resolution: f64, window_width: f64) {
        self.config = AnalyzerConfig::with_window(freq_resolution, window_width);
    }

    /// The current configuration.
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Mutable access for tweaking individual parameters after
    /// construction.
    pub fn config_mut(&mut self) -> &mut AnalyzerConfig {
        &mut self.config
    }

    /// Estimate a fundamental frequency envelope in [fmin, fmax] during
    /// analysis, with default contribution thresholds. Retrieve it with
    /// [`Analyzer::fundamental_env`] afterwards.
    pub fn build_fundamental_env(&mut self, fmin: f64, fmax: f64) {
        self.fundamental_params = Some(FundamentalParams::new(fmin, fmax));
    }

    /// Estimate the fundamental with explicit parameters.
    pub fn build_fundamental_env_with(&mut self, params: FundamentalParams) {
        self.fundamental_params = Some(params);
    }

    /// Estimate an overall amplitude envelope during analysis. Retrieve it
    /// with [`Analyzer::amp_env`] afterwards.
    pub fn build_amp_env(&mut self, enabled: bool) {
        self.amp_env_enabled = enabled;
    }

    /// Install a cooperative cancellation token, checked once per frame.
    pub fn set_cancel_token(&mut self, token: CancelToken) {
        self.cancel = Some(token);
    }

    /// Fundamental estimate from the most recent analysis. Empty unless
    /// [`Analyzer::build_fundamental_env`] was requested.
    pub fn fundamental_env(&self) -> &BreakpointEnvelope {
        &self.fundamental_env
    }

    /// Amplitude estimate from the most recent analysis. Empty unless
    /// [`Analyzer::build_amp_env`] was requested.
    pub fn amp_env(&self) -> &BreakpointEnvelope {
        &self.amp_env
    }

    /// Analyze mono samples, free-running.
    pub fn analyze(&mut self, samples: &[f64], sample_rate: f64) -> Result<PartialCollection> {
        self.run(samples, sample_rate, None)
    }

    /// Analyze mono samples with tracking locked to a reference frequency
    /// contour (the expected fundamental of the resulting partials).
    pub fn analyze_tracked(
        &mut self,
        samples: &[f64],
        sample_rate: f64,
        reference: &BreakpointEnvelope,
    ) -> Result<PartialCollection> {
        if reference.is_empty() {
            return Err(Error::invalid_argument(
                "tracking reference envelope is empty",
            ));
        }
        self.run(samples, sample_rate, Some(reference))
    }

    fn run(
        &mut self,
        samples: &[f64],
        sample_rate: f64,
        reference: Option<&BreakpointEnvelope>,
    ) -> Result<PartialCollection> {
        self.config.validate()?;
        if samples.is_empty() {
            return Err(Error::invalid_configuration("sample buffer is empty"));
        }
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(Error::invalid_configuration(format!(
                "sample rate must be positive, got {sample_rate}"
            )));
        }

        let window = KaiserWindow::for_main_lobe(
            self.config.window_width,
            self.config.sidelobe_level,
            sample_rate,
        );
        let window_len = window.len();
        let window_center = window.center();
        let mut spectrum = ReassignedSpectrum::new(window);

        let selection = PeakSelection {
            amp_floor: self.config.amp_floor_linear(),
            freq_floor: self.config.freq_floor,
            crop_time: self.config.crop_time,
            resolution: self.config.freq_resolution,
        };
        let hop = ((self.config.hop_time * sample_rate).round() as usize).max(1);

        let mut free_tracker = Tracker::new(self.config.freq_drift);
        let mut guided_tracker = GuidedTracker::new();

        let mut f0_builder = self.fundamental_params.map(FundamentalBuilder::new);
        let mut amp_env = BreakpointEnvelope::new();

        debug!(
            window_len,
            fft_size = spectrum.fft_size(),
            hop,
            "analysis configured"
        );

        let mut frame = vec![0.0; window_len];
        let mut num_frames = 0_usize;
        let mut center = 0_usize;
        while center < samples.len() {
            if let Some(token) = &self.cancel
                && token.is_cancelled()
            {
                return Err(Error::Cancelled);
            }

            for (i, slot) in frame.iter_mut().enumerate() {
                let idx = center as i64 + i as i64 - window_center as i64;
                *slot = if idx >= 0 && (idx as usize) < samples.len() {
                    samples[idx as usize]
                } else {
                    0.0
                };
            }

            spectrum.transform(&frame);
            let frame_time = center as f64 / sample_rate;
            let mut peaks = extract_peaks(&spectrum, frame_time, sample_rate, &selection);
            if self.config.bw_region_width > 0.0 {
                associate_bandwidth(
                    &mut peaks,
                    &spectrum,
                    sample_rate,
                    self.config.bw_region_width,
                );
            }

            if let Some(builder) = &mut f0_builder {
                builder.add_frame(frame_time, peaks.iter().map(|p| (p.amplitude, p.frequency)));
            }
            if self.amp_env_enabled {
                let rms = peaks
                    .iter()
                    .map(|p| p.amplitude * p.amplitude)
                    .sum::<f64>()
                    .sqrt();
                amp_env.insert(frame_time, rms);
            }

            match reference {
                Some(env) => guided_tracker.advance(&peaks, env.value_at(frame_time)),
                None => free_tracker.advance(&peaks),
            }

            num_frames += 1;
            center += hop;
        }

        let mut partials: Vec<Partial> = match reference {
            Some(_) => guided_tracker.finish(),
            None => free_tracker.finish(),
        };

        if self.config.phase_correct {
            for partial in &mut partials {
                fix_phases(partial);
            }
        }

        info!(
            num_frames,
            num_partials = partials.len(),
            tracked = reference.is_some(),
            "analysis complete"
        );

        self.fundamental_env = f0_builder.map(FundamentalBuilder::finish).unwrap_or_default();
        self.amp_env = amp_env;

        Ok(partials.into_iter().collect())
    }
}

/// Recompute breakpoint phases by trapezoidal integration of the frequency
/// envelope from the first breakpoint, so phase and frequency agree
/// everywhere along the partial.
fn fix_phases(partial: &mut Partial) {
    let mut prev: Option<(f64, f64, f64)> = None; // (time, frequency, phase)
    for bp in partial.iter_mut() {
        if let Some((t, f, phase)) = prev {
            bp.phase = phase + TAU * 0.5 * (f + bp.frequency) * (bp.time - t);
        }
        prev = Some((bp.time, bp.frequency, bp.phase));
    }
}
