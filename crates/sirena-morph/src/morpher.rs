//! Sound morphing by labeled-partial parameter interpolation.

use sirena_core::{
    Breakpoint, BreakpointEnvelope, Error, Partial, PartialCollection, Result,
};
use std::collections::BTreeMap;
use tracing::info;

/// Performs sound morphing between two labeled partial collections.
///
/// Morphing interpolates the time-varying frequencies, amplitudes, and
/// bandwidths of corresponding partials under three independent weight
/// functions, one per parameter, each running from 0 (all source) to 1
/// (all target). Correspondences are established by labeling, so inputs
/// normally come out of channelization and distillation.
///
/// Phase is never blended - absolute phase of independent signals carries
/// no morphable meaning - instead each morphed breakpoint takes the phase
/// of whichever side the frequency weight currently favors, and synthesis
/// re-integrates phase from frequency anyway.
///
/// # Example
///
/// ```rust,ignore
/// use sirena_core::BreakpointEnvelope;
/// use sirena_morph::Morpher;
///
/// let mut ramp = BreakpointEnvelope::new();
/// ramp.insert(0.6, 0.0);
/// ramp.insert(2.0, 1.0);
///
/// let morpher = Morpher::uniform(ramp);
/// let morphed = morpher.morph(&clarinet, &flute)?;
/// ```
pub struct Morpher {
    freq_env: BreakpointEnvelope,
    amp_env: BreakpointEnvelope,
    bw_env: BreakpointEnvelope,
    amp_shape: f64,
    min_breakpoint_gap: f64,
}

impl Morpher {
    /// Default shaping constant for the log-domain amplitude blend.
    pub const DEFAULT_AMP_SHAPE: f64 = 1e-5;

    /// Default minimum spacing between morphed breakpoints, 0.1 ms.
    pub const DEFAULT_MIN_BREAKPOINT_GAP: f64 = 1e-4;

    /// Morpher with independent weight functions for frequency, amplitude,
    /// and bandwidth.
    pub fn new(
        freq_env: BreakpointEnvelope,
        amp_env: BreakpointEnvelope,
        bw_env: BreakpointEnvelope,
    ) -> Self {
        Self {
            freq_env,
            amp_env,
            bw_env,
            amp_shape: Self::DEFAULT_AMP_SHAPE,
            min_breakpoint_gap: Self::DEFAULT_MIN_BREAKPOINT_GAP,
        }
    }

    /// Morpher using the same weight function for all three parameters.
    pub fn uniform(env: BreakpointEnvelope) -> Self {
        Self::new(env.clone(), env.clone(), env)
    }

    /// Set the amplitude morph shaping constant.
    ///
    /// Amplitudes blend in the log domain, offset by this constant. Values
    /// much smaller than typical amplitudes make the blend follow loudness
    /// perception; values greater than 1 approach a plain linear blend.
    pub fn set_amp_shape(&mut self, shape: f64) -> Result<()> {
        if !shape.is_finite() || shape <= 0.0 {
            return Err(Error::invalid_argument(format!(
                "amplitude shape must be positive, got {shape}"
            )));
        }
        self.amp_shape = shape;
        Ok(())
    }

    /// Set the minimum time gap between breakpoints of a morphed partial.
    ///
    /// Morphing takes breakpoints at the union of both sources' times;
    /// without a floor on their spacing, two dense analyses would produce
    /// enormous morphs.
    pub fn set_min_breakpoint_gap(&mut self, gap: f64) -> Result<()> {
        if !gap.is_finite() || gap <= 0.0 {
            return Err(Error::invalid_argument(format!(
                "breakpoint gap must be positive, got {gap}"
            )));
        }
        self.min_breakpoint_gap = gap;
        Ok(())
    }

    /// Morph two labeled collections into a new one. Inputs are untouched.
    ///
    /// Partials sharing a non-zero label pair up in collection order; a
    /// labeled partial with no counterpart keeps its own parameters and
    /// fades with the amplitude weight. Label-0 partials on either side
    /// have no correspondence to morph along and are crossfaded the same
    /// way, coming out with label 0.
    pub fn morph(
        &self,
        source: &PartialCollection,
        target: &PartialCollection,
    ) -> Result<PartialCollection> {
        if source.is_empty() && target.is_empty() {
            return Err(Error::invalid_argument(
                "cannot morph two empty collections",
            ));
        }

        let mut by_label_src: BTreeMap<u32, Vec<&Partial>> = BTreeMap::new();
        for partial in source {
            by_label_src.entry(partial.label()).or_default().push(partial);
        }
        let mut by_label_tgt: BTreeMap<u32, Vec<&Partial>> = BTreeMap::new();
        for partial in target {
            by_label_tgt.entry(partial.label()).or_default().push(partial);
        }

        let labels: Vec<u32> = by_label_src
            .keys()
            .chain(by_label_tgt.keys())
            .copied()
            .collect::<std::collections::BTreeSet<u32>>()
            .into_iter()
            .collect();

        let mut result = PartialCollection::new();
        let mut num_pairs = 0_usize;
        let mut num_faded = 0_usize;
        for label in labels {
            let empty = Vec::new();
            let srcs = by_label_src.get(&label).unwrap_or(&empty);
            let tgts = by_label_tgt.get(&label).unwrap_or(&empty);

            if label == 0 {
                // No correspondence to morph along: crossfade.
                for &partial in srcs {
                    result.push(self.fade(partial, Side::Source, 0)?);
                    num_faded += 1;
                }
                for &partial in tgts {
                    result.push(self.fade(partial, Side::Target, 0)?);
                    num_faded += 1;
                }
                continue;
            }

            let paired = srcs.len().min(tgts.len());
            for i in 0..paired {
                result.push(self.morph_partials(srcs[i], tgts[i], label)?);
                num_pairs += 1;
            }
            for &partial in &srcs[paired..] {
                result.push(self.fade(partial, Side::Source, label)?);
                num_faded += 1;
            }
            for &partial in &tgts[paired..] {
                result.push(self.fade(partial, Side::Target, label)?);
                num_faded += 1;
            }
        }

        info!(num_pairs, num_faded, "morph complete");
        Ok(result)
    }

    /// Morph one pair of corresponding partials.
    ///
    /// The morphed partial has a breakpoint at every time either source has
    /// one (omitting those closer than the minimum gap to a predecessor),
    /// with each parameter blended under its own weight function.
    pub fn morph_partials(&self, source: &Partial, target: &Partial, label: u32) -> Result<Partial> {
        let mut times: Vec<f64> = source
            .iter()
            .chain(target.iter())
            .map(|bp| bp.time)
            .collect();
        times.sort_by(|a, b| a.partial_cmp(b).unwrap());

        let mut morphed = Partial::with_label(label);
        let mut last_time = f64::NEG_INFINITY;
        for time in times {
            if time - last_time < self.min_breakpoint_gap {
                continue;
            }
            last_time = time;

            let wf = self.freq_env.value_at(time);
            let wa = self.amp_env.value_at(time);
            let wb = self.bw_env.value_at(time);

            let frequency = match (source.is_empty(), target.is_empty()) {
                (false, false) => {
                    (1.0 - wf) * source.frequency_at(time) + wf * target.frequency_at(time)
                }
                (false, true) => source.frequency_at(time),
                (true, false) => target.frequency_at(time),
                (true, true) => 0.0,
            };
            let amplitude =
                self.blend_amplitude(source.amplitude_at(time), target.amplitude_at(time), wa);
            let bandwidth = ((1.0 - wb) * source.bandwidth_at(time)
                + wb * target.bandwidth_at(time))
            .clamp(0.0, 1.0);
            let phase = if target.is_empty() || (wf < 0.5 && !source.is_empty()) {
                source.phase_at(time)
            } else {
                target.phase_at(time)
            };

            let bp = Breakpoint::new(time, frequency, amplitude, phase, bandwidth);
            if !bp.is_finite() {
                return Err(Error::NumericalInstability { stage: "morph" });
            }
            morphed.insert(bp);
        }
        Ok(morphed)
    }

    /// Shaped log-domain amplitude blend. Exact at the endpoints and the
    /// identity when both amplitudes agree, which keeps self-morphs
    /// lossless.
    fn blend_amplitude(&self, a0: f64, a1: f64, w: f64) -> f64 {
        let s = self.amp_shape;
        let blended = ((1.0 - w) * (a0 + s).ln() + w * (a1 + s).ln()).exp() - s;
        blended.max(0.0)
    }

    fn fade(&self, partial: &Partial, side: Side, label: u32) -> Result<Partial> {
        let mut faded = Partial::with_label(label);
        let mut last_time = f64::NEG_INFINITY;
        for bp in partial {
            if bp.time - last_time < self.min_breakpoint_gap {
                continue;
            }
            last_time = bp.time;

            let w = self.amp_env.value_at(bp.time);
            let gain = match side {
                Side::Source => 1.0 - w,
                Side::Target => w,
            };
            let out = Breakpoint::new(
                bp.time,
                bp.frequency,
                (bp.amplitude * gain).max(0.0),
                bp.phase,
                bp.bandwidth,
            );
            if !out.is_finite() {
                return Err(Error::NumericalInstability { stage: "morph" });
            }
            faded.insert(out);
        }
        Ok(faded)
    }
}

#[derive(Clone, Copy)]
enum Side {
    Source,
    Target,
}
