//! Rendering partial collections into sample buffers.

use crate::oscillator::Oscillator;
use rayon::prelude::*;
use sirena_core::{CancelToken, Error, Partial, PartialCollection, Result};
use std::f64::consts::TAU;
use tracing::{debug, info};

/// Additive-plus-noise synthesizer.
///
/// Each partial renders independently through a bandwidth-enhanced
/// oscillator and the contributions sum into one buffer. Partials are
/// independent work units, so rendering fans out across a thread pool and
/// merges the per-partial buffers afterwards; with per-partial noise seeds
/// the result is identical no matter how the work is scheduled.
///
/// # Example
///
/// ```rust,ignore
/// use sirena_synth::Synthesizer;
///
/// let synth = Synthesizer::new(44100.0);
/// let samples = synth.synthesize(&partials)?;
/// ```
pub struct Synthesizer {
    sample_rate: f64,
    fade_time: f64,
    cancel: Option<CancelToken>,
}

impl Synthesizer {
    /// Default partial fade-in/out, one millisecond.
    pub const DEFAULT_FADE_TIME: f64 = 0.001;

    /// Create a synthesizer for the given output sample rate.
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            fade_time: Self::DEFAULT_FADE_TIME,
            cancel: None,
        }
    }

    /// Set the fade applied at each partial's onset and release.
    ///
    /// A partial whose first or last breakpoint has non-zero amplitude
    /// would otherwise start or stop with a click; the fade ramps amplitude
    /// from and to zero at constant frequency just outside the partial's
    /// span. Zero disables fading.
    pub fn set_fade_time(&mut self, fade_time: f64) -> Result<()> {
        if !fade_time.is_finite() || fade_time < 0.0 {
            return Err(Error::invalid_configuration(format!(
                "fade time must be non-negative, got {fade_time}"
            )));
        }
        self.fade_time = fade_time;
        Ok(())
    }

    /// The configured fade time in seconds.
    pub fn fade_time(&self) -> f64 {
        self.fade_time
    }

    /// Install a cooperative cancellation token, checked per partial.
    pub fn set_cancel_token(&mut self, token: CancelToken) {
        self.cancel = Some(token);
    }

    /// Render the collection from time zero through the end of its latest
    /// partial (plus the release fade).
    pub fn synthesize(&self, collection: &PartialCollection) -> Result<Vec<f64>> {
        let duration = collection
            .span()
            .map_or(0.0, |(_, end)| (end + self.fade_time).max(0.0));
        self.synthesize_with_duration(collection, duration)
    }

    /// Render the collection into a buffer of exactly
    /// `ceil(duration * sample_rate)` samples; partial content beyond the
    /// duration is dropped.
    pub fn synthesize_with_duration(
        &self,
        collection: &PartialCollection,
        duration: f64,
    ) -> Result<Vec<f64>> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(Error::invalid_configuration(format!(
                "sample rate must be positive, got {}",
                self.sample_rate
            )));
        }
        if !duration.is_finite() || duration < 0.0 {
            return Err(Error::invalid_configuration(format!(
                "duration must be non-negative, got {duration}"
            )));
        }

        let num_samples = (duration * self.sample_rate).ceil() as usize;
        let mut output = vec![0.0; num_samples];

        // Every partial renders into its own buffer; merging happens after
        // the parallel section, so no worker ever touches shared state.
        let rendered: Result<Vec<(usize, Vec<f64>)>> = collection
            .partials()
            .par_iter()
            .enumerate()
            .map(|(index, partial)| {
                if let Some(token) = &self.cancel
                    && token.is_cancelled()
                {
                    return Err(Error::Cancelled);
                }
                self.render_partial(partial, partial_seed(index))
            })
            .collect();

        for (offset, buffer) in rendered? {
            for (j, sample) in buffer.into_iter().enumerate() {
                if let Some(slot) = output.get_mut(offset + j) {
                    *slot += sample;
                }
            }
        }

        info!(
            partials = collection.len(),
            num_samples, "synthesis complete"
        );
        Ok(output)
    }

    /// Render one partial. Returns the starting sample offset and the
    /// rendered local buffer.
    fn render_partial(&self, partial: &Partial, seed: u64) -> Result<(usize, Vec<f64>)> {
        if partial.is_empty() || partial.end_time() < 0.0 {
            return Ok((0, Vec::new()));
        }
        for bp in partial {
            if !bp.is_finite() {
                return Err(Error::NumericalInstability { stage: "synthesis" });
            }
        }

        // Parameter nodes: the breakpoints themselves, bracketed by
        // zero-amplitude fade nodes at constant frequency.
        let mut nodes: Vec<(f64, f64, f64, f64)> = Vec::with_capacity(partial.len() + 2);
        let start = partial.start_time();
        let initial_phase;
        if start < 0.0 {
            // Clip pre-zero content and pick up the partial mid-flight.
            nodes.push((
                0.0,
                partial.frequency_at(0.0),
                partial.amplitude_at(0.0),
                partial.bandwidth_at(0.0),
            ));
            for bp in partial.iter().filter(|bp| bp.time > 0.0) {
                nodes.push((bp.time, bp.frequency, bp.amplitude, bp.bandwidth));
            }
            initial_phase = partial.phase_at(0.0);
        } else {
            let Some(&first) = partial.first() else {
                return Ok((0, Vec::new()));
            };
            let fade_start = (start - self.fade_time).max(0.0);
            if fade_start < start {
                nodes.push((fade_start, first.frequency, 0.0, first.bandwidth));
                initial_phase = first.phase - TAU * first.frequency * (start - fade_start);
            } else {
                initial_phase = first.phase;
            }
            for bp in partial {
                nodes.push((bp.time, bp.frequency, bp.amplitude, bp.bandwidth));
            }
        }
        if self.fade_time > 0.0
            && let Some(&(t, f, _, b)) = nodes.last()
        {
            nodes.push((t + self.fade_time, f, 0.0, b));
        }
        if nodes.is_empty() {
            return Ok((0, Vec::new()));
        }

        let first_index = (nodes[0].0 * self.sample_rate).round() as usize;
        let last_index = (nodes[nodes.len() - 1].0 * self.sample_rate).round() as usize;
        let mut buffer = vec![0.0; last_index.saturating_sub(first_index)];

        let mut oscillator = Oscillator::new(self.sample_rate, seed);
        oscillator.set_phase(initial_phase);

        for pair in nodes.windows(2) {
            let (ta, fa, aa, ba) = pair[0];
            let (tb, fb, ab, bb) = pair[1];
            let ia = ((ta * self.sample_rate).round() as usize).saturating_sub(first_index);
            let ib = ((tb * self.sample_rate).round() as usize).saturating_sub(first_index);
            let ib = ib.min(buffer.len());
            if ia >= ib {
                continue;
            }
            oscillator.render_segment(&mut buffer[ia..ib], (fa, aa, ba), (fb, ab, bb));
        }

        if buffer.iter().any(|y| !y.is_finite()) {
            return Err(Error::NumericalInstability { stage: "synthesis" });
        }

        debug!(
            breakpoints = partial.len(),
            samples = buffer.len(),
            "partial rendered"
        );
        Ok((first_index, buffer))
    }
}

/// Deterministic per-partial noise seed derived from the partial's position
/// in the collection.
fn partial_seed(index: usize) -> u64 {
    (index as u64 + 1).wrapping_mul(0x9E3779B97F4A7C15)
}
