//! Pitch shifting and amplitude scaling under control envelopes.

use sirena_core::{BreakpointEnvelope, Error, PartialCollection, Result};
use tracing::debug;

/// Shift every breakpoint's frequency by the envelope's value in cents at
/// that breakpoint's time, in place.
///
/// The multiplier is `2^(cents / 1200)`; amplitude and bandwidth are
/// unaffected. All shifted frequencies are staged and checked before any
/// partial is touched, so a non-finite result (from a runaway envelope)
/// fails with `NumericalInstability` and leaves the collection unchanged.
pub fn shift_pitch(collection: &mut PartialCollection, cents: &BreakpointEnvelope) -> Result<()> {
    // Stage: one frequency list per partial.
    let mut staged: Vec<Vec<f64>> = Vec::with_capacity(collection.len());
    for partial in collection.iter() {
        let mut freqs = Vec::with_capacity(partial.len());
        for bp in partial {
            let factor = (cents.value_at(bp.time) / 1200.0).exp2();
            let shifted = bp.frequency * factor;
            if !shifted.is_finite() {
                return Err(Error::NumericalInstability {
                    stage: "pitch shift",
                });
            }
            freqs.push(shifted);
        }
        staged.push(freqs);
    }

    for (partial, freqs) in collection.iter_mut().zip(staged) {
        for (bp, freq) in partial.iter_mut().zip(freqs) {
            bp.frequency = freq;
        }
    }

    debug!(partials = collection.len(), "pitch shifted");
    Ok(())
}

/// Scale every breakpoint's amplitude by the envelope's value at that
/// breakpoint's time, in place.
///
/// Negative envelope values are rejected as `InvalidArgument` (amplitudes
/// are non-negative by construction); non-finite products surface as
/// `NumericalInstability`. Either way, nothing is mutated on failure.
pub fn scale_amplitude(
    collection: &mut PartialCollection,
    scale: &BreakpointEnvelope,
) -> Result<()> {
    if let Some((lo, _)) = scale.value_range()
        && lo < 0.0
    {
        return Err(Error::invalid_argument(
            "amplitude scale envelope must be non-negative",
        ));
    }

    let mut staged: Vec<Vec<f64>> = Vec::with_capacity(collection.len());
    for partial in collection.iter() {
        let mut amps = Vec::with_capacity(partial.len());
        for bp in partial {
            let scaled = bp.amplitude * scale.value_at(bp.time);
            if !scaled.is_finite() {
                return Err(Error::NumericalInstability {
                    stage: "amplitude scaling",
                });
            }
            amps.push(scaled);
        }
        staged.push(amps);
    }

    for (partial, amps) in collection.iter_mut().zip(staged) {
        for (bp, amp) in partial.iter_mut().zip(amps) {
            bp.amplitude = amp;
        }
    }
    Ok(())
}
