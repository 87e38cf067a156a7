//! Uniform resampling of partial envelopes.

use sirena_core::{Breakpoint, Error, Partial, PartialCollection, Result};
use std::f64::consts::TAU;
use tracing::debug;

/// Resample every partial's breakpoints onto a uniform time grid, in place.
///
/// Each partial is replaced by breakpoints at multiples of `interval`
/// covering its span, with frequency, amplitude, and bandwidth interpolated
/// from the original envelope and phase re-integrated from the resampled
/// frequencies (anchored at the first grid point's original phase).
/// Partials shorter than one interval collapse to a single breakpoint at
/// the nearest grid point.
///
/// Uniform breakpoint spacing is what legacy streaming exporters expect,
/// and it bounds the data rate of very dense analyses.
pub fn resample(collection: &mut PartialCollection, interval: f64) -> Result<()> {
    if !interval.is_finite() || interval <= 0.0 {
        return Err(Error::invalid_argument(format!(
            "resampling interval must be positive, got {interval}"
        )));
    }

    for partial in collection.iter_mut() {
        if partial.is_empty() {
            continue;
        }
        let label = partial.label();
        let first_grid = (partial.start_time() / interval).round() as i64;
        let last_grid = ((partial.end_time() / interval).round() as i64).max(first_grid);

        let mut resampled = Partial::with_label(label);
        let mut prev: Option<(f64, f64, f64)> = None; // (time, frequency, phase)
        for grid in first_grid..=last_grid {
            let time = grid as f64 * interval;
            let frequency = partial.frequency_at(time);
            let phase = match prev {
                None => partial.phase_at(time),
                Some((t, f, p)) => p + TAU * 0.5 * (f + frequency) * (time - t),
            };
            resampled.insert(Breakpoint::new(
                time,
                frequency,
                partial.amplitude_at(time),
                phase,
                partial.bandwidth_at(time),
            ));
            prev = Some((time, frequency, phase));
        }
        *partial = resampled;
    }

    debug!(partials = collection.len(), interval, "resampled");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_is_uniform_and_covers_span() {
        let mut p = Partial::with_label(3);
        p.insert(Breakpoint::new(0.013, 440.0, 1.0, 0.0, 0.0));
        p.insert(Breakpoint::new(0.258, 450.0, 0.5, 0.0, 0.1));
        let mut c: PartialCollection = vec![p].into_iter().collect();

        resample(&mut c, 0.01).unwrap();

        let p = &c.partials()[0];
        assert_eq!(p.label(), 3);
        for pair in p.breakpoints().windows(2) {
            assert!((pair[1].time - pair[0].time - 0.01).abs() < 1e-9);
        }
        assert!((p.start_time() - 0.01).abs() < 1e-9);
        assert!((p.end_time() - 0.26).abs() < 1e-9);
    }

    #[test]
    fn values_are_interpolated_from_the_original() {
        let mut p = Partial::new();
        p.insert(Breakpoint::new(0.0, 400.0, 0.0, 0.0, 0.0));
        p.insert(Breakpoint::new(1.0, 500.0, 1.0, 0.0, 0.5));
        let mut c: PartialCollection = vec![p].into_iter().collect();

        resample(&mut c, 0.25).unwrap();

        let p = &c.partials()[0];
        assert_eq!(p.len(), 5);
        let mid = p.breakpoints()[2];
        assert!((mid.time - 0.5).abs() < 1e-12);
        assert!((mid.frequency - 450.0).abs() < 1e-9);
        assert!((mid.amplitude - 0.5).abs() < 1e-9);
        assert!((mid.bandwidth - 0.25).abs() < 1e-9);
    }

    #[test]
    fn phases_are_reintegrated_from_frequency() {
        let mut p = Partial::new();
        p.insert(Breakpoint::new(0.0, 100.0, 1.0, 0.0, 0.0));
        p.insert(Breakpoint::new(1.0, 100.0, 1.0, TAU * 100.0, 0.0));
        let mut c: PartialCollection = vec![p].into_iter().collect();

        resample(&mut c, 0.1).unwrap();

        let p = &c.partials()[0];
        for pair in p.breakpoints().windows(2) {
            let expected = pair[0].phase + TAU * 100.0 * 0.1;
            assert!((pair[1].phase - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn short_partial_collapses_to_one_point() {
        let mut p = Partial::new();
        p.insert(Breakpoint::new(0.101, 440.0, 1.0, 0.0, 0.0));
        p.insert(Breakpoint::new(0.103, 441.0, 1.0, 0.0, 0.0));
        let mut c: PartialCollection = vec![p].into_iter().collect();

        resample(&mut c, 0.1).unwrap();
        assert_eq!(c.partials()[0].len(), 1);
        assert!((c.partials()[0].start_time() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn zero_interval_is_an_error() {
        let mut c = PartialCollection::new();
        assert!(resample(&mut c, 0.0).is_err());
    }
}
