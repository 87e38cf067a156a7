//! Reference frequency envelopes built from analyzed partials.

use sirena_core::{BreakpointEnvelope, Error, PartialCollection, Result};

/// Build a reference frequency envelope by following the most prominent
/// partial inside a frequency band.
///
/// At each of `num_samples` uniformly spaced times across the collection's
/// span, the partial with the greatest amplitude whose frequency lies in
/// `[fmin, fmax]` contributes one envelope point. The result is the usual
/// channelization reference for quasi-harmonic sounds: bracket the expected
/// fundamental with the band and the envelope traces it.
///
/// Fails with `InvalidArgument` when the band is inverted, `num_samples` is
/// zero, the collection has no breakpoints, or no partial ever enters the
/// band.
pub fn create_freq_reference(
    collection: &PartialCollection,
    fmin: f64,
    fmax: f64,
    num_samples: usize,
) -> Result<BreakpointEnvelope> {
    if fmax <= fmin || fmin < 0.0 {
        return Err(Error::invalid_argument(format!(
            "frequency band [{fmin}, {fmax}] is not a valid range"
        )));
    }
    if num_samples == 0 {
        return Err(Error::invalid_argument(
            "reference envelope needs at least one sample point",
        ));
    }
    let Some((start, end)) = collection.span() else {
        return Err(Error::invalid_argument(
            "cannot build a reference from an empty collection",
        ));
    };

    let mut envelope = BreakpointEnvelope::new();
    for i in 0..num_samples {
        let time = if num_samples == 1 {
            (start + end) / 2.0
        } else {
            start + (end - start) * i as f64 / (num_samples - 1) as f64
        };

        let mut best: Option<(f64, f64)> = None; // (amplitude, frequency)
        for partial in collection {
            let amp = partial.amplitude_at(time);
            if amp <= 0.0 {
                continue;
            }
            let freq = partial.frequency_at(time);
            if freq < fmin || freq > fmax {
                continue;
            }
            if best.is_none_or(|(a, _)| amp > a) {
                best = Some((amp, freq));
            }
        }
        if let Some((_, freq)) = best {
            envelope.insert(time, freq);
        }
    }

    if envelope.is_empty() {
        return Err(Error::invalid_argument(format!(
            "no partial enters the band [{fmin}, {fmax}]"
        )));
    }
    Ok(envelope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sirena_core::{Breakpoint, Partial};

    fn constant_partial(freq: f64, amp: f64, start: f64, end: f64) -> Partial {
        let mut p = Partial::new();
        p.insert(Breakpoint::new(start, freq, amp, 0.0, 0.0));
        p.insert(Breakpoint::new(end, freq, amp, 0.0, 0.0));
        p
    }

    fn collection(partials: Vec<Partial>) -> PartialCollection {
        partials.into_iter().collect()
    }

    #[test]
    fn follows_the_loudest_in_band_partial() {
        let c = collection(vec![
            constant_partial(440.0, 1.0, 0.0, 1.0),
            constant_partial(880.0, 0.5, 0.0, 1.0),
            constant_partial(460.0, 0.1, 0.0, 1.0),
        ]);

        let env = create_freq_reference(&c, 300.0, 600.0, 50).unwrap();
        assert!((env.value_at(0.5) - 440.0).abs() < 1e-9);
        assert!((env.value_at(0.0) - 440.0).abs() < 1e-9);
    }

    #[test]
    fn band_excludes_out_of_range_partials() {
        let c = collection(vec![
            constant_partial(100.0, 1.0, 0.0, 1.0),
            constant_partial(440.0, 0.2, 0.0, 1.0),
        ]);

        let env = create_freq_reference(&c, 300.0, 600.0, 10).unwrap();
        assert!((env.value_at(0.5) - 440.0).abs() < 1e-9);
    }

    #[test]
    fn empty_collection_is_an_error() {
        let c = PartialCollection::new();
        assert!(create_freq_reference(&c, 300.0, 600.0, 10).is_err());
    }

    #[test]
    fn inverted_band_is_an_error() {
        let c = collection(vec![constant_partial(440.0, 1.0, 0.0, 1.0)]);
        assert!(create_freq_reference(&c, 600.0, 300.0, 10).is_err());
    }

    #[test]
    fn vacant_band_is_an_error() {
        let c = collection(vec![constant_partial(440.0, 1.0, 0.0, 1.0)]);
        assert!(create_freq_reference(&c, 5000.0, 6000.0, 10).is_err());
    }
}
