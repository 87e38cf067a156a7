//! Distillation: one partial per channel.

use sirena_core::{Breakpoint, Error, Partial, PartialCollection, Result};
use std::collections::BTreeMap;
use tracing::debug;

/// Default seam fade, one millisecond.
pub const DEFAULT_FADE_TIME: f64 = 0.001;

/// Gaps shorter than this are spliced without a zero-amplitude seam.
const MIN_GAP: f64 = 1e-6;

/// Distill with the default 1 ms seam fade. See [`distill_with_fade`].
pub fn distill(collection: &mut PartialCollection) -> Result<()> {
    distill_with_fade(collection, DEFAULT_FADE_TIME)
}

/// Merge all same-labeled partials into a single partial per non-zero
/// label, in place.
///
/// Partials sharing a label are merged in start-time order. Where two spans
/// overlap, the earlier partial keeps the region up to the later partial's
/// start and the later partial takes over from there - no overlap is
/// retained (a partial fully inside an earlier one contributes nothing).
/// Gaps between spans are bridged at zero amplitude, ramping down within
/// `fade_time` of the last real breakpoint and back up within `fade_time`
/// of the next, so a distilled partial never jumps discontinuously out of
/// or into silence.
///
/// Label-0 (noise) partials have no channel to merge into and pass through
/// untouched; drop them first with
/// [`remove_labeled`](crate::sifter::remove_labeled) if they are not
/// wanted.
///
/// Distillation is idempotent: distilling a distilled collection is a
/// no-op.
pub fn distill_with_fade(collection: &mut PartialCollection, fade_time: f64) -> Result<()> {
    if !fade_time.is_finite() || fade_time <= 0.0 {
        return Err(Error::invalid_argument(format!(
            "fade time must be positive, got {fade_time}"
        )));
    }

    let mut unlabeled: Vec<Partial> = Vec::new();
    let mut channels: BTreeMap<u32, Vec<Partial>> = BTreeMap::new();
    for partial in collection.take() {
        if partial.label() == 0 {
            unlabeled.push(partial);
        } else {
            channels.entry(partial.label()).or_default().push(partial);
        }
    }

    let num_channels = channels.len();
    let mut result = unlabeled;
    for (label, mut group) in channels {
        group.sort_by(|a, b| {
            a.start_time()
                .partial_cmp(&b.start_time())
                .unwrap()
                .then(a.end_time().partial_cmp(&b.end_time()).unwrap())
        });

        let mut merged = Partial::with_label(label);
        for partial in group {
            merge_into(&mut merged, &partial, fade_time);
        }
        result.push(merged);
    }

    debug!(
        channels = num_channels,
        partials = result.len(),
        "distilled"
    );
    collection.replace(result);
    Ok(())
}

fn merge_into(merged: &mut Partial, addition: &Partial, fade_time: f64) {
    if addition.is_empty() {
        return;
    }
    if merged.is_empty() {
        for bp in addition {
            merged.insert(*bp);
        }
        return;
    }

    let boundary = addition.start_time();
    let merged_end = merged.end_time();

    if boundary > merged_end + MIN_GAP {
        // Gap: bridge at zero amplitude with a short fade on each side.
        let gap = boundary - merged_end;
        let (Some(&last), Some(&first)) = (merged.last(), addition.first()) else {
            return;
        };
        if gap > 2.0 * fade_time {
            merged.insert(Breakpoint::new(
                merged_end + fade_time,
                last.frequency,
                0.0,
                last.phase,
                last.bandwidth,
            ));
            merged.insert(Breakpoint::new(
                boundary - fade_time,
                first.frequency,
                0.0,
                first.phase,
                first.bandwidth,
            ));
        } else {
            let mid = (merged_end + boundary) / 2.0;
            merged.insert(Breakpoint::new(
                mid,
                (last.frequency + first.frequency) / 2.0,
                0.0,
                last.phase,
                (last.bandwidth + first.bandwidth) / 2.0,
            ));
        }
        for bp in addition {
            merged.insert(*bp);
        }
    } else if addition.end_time() <= merged_end {
        // Fully contained in coverage already claimed: contributes nothing.
    } else {
        // Overlap: the earlier partial keeps everything before the
        // boundary, the later one takes over from the boundary on.
        merged.truncate_at(boundary);
        for bp in addition {
            merged.insert(*bp);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labeled_partial(label: u32, start: f64, end: f64, freq: f64) -> Partial {
        let mut p = Partial::with_label(label);
        p.insert(Breakpoint::new(start, freq, 1.0, 0.0, 0.0));
        p.insert(Breakpoint::new(end, freq, 1.0, 0.0, 0.0));
        p
    }

    #[test]
    fn one_partial_per_label_after_distilling() {
        let mut c: PartialCollection = vec![
            labeled_partial(1, 0.0, 1.0, 440.0),
            labeled_partial(1, 2.0, 3.0, 445.0),
            labeled_partial(2, 0.0, 1.0, 880.0),
        ]
        .into_iter()
        .collect();

        distill(&mut c).unwrap();

        assert_eq!(c.len(), 2);
        let labels = c.labels();
        assert_eq!(labels, vec![1, 2]);
    }

    #[test]
    fn gap_is_bridged_at_zero_amplitude() {
        let mut c: PartialCollection = vec![
            labeled_partial(1, 0.0, 1.0, 440.0),
            labeled_partial(1, 2.0, 3.0, 440.0),
        ]
        .into_iter()
        .collect();

        distill(&mut c).unwrap();

        let p = &c.partials()[0];
        assert_eq!(p.start_time(), 0.0);
        assert_eq!(p.end_time(), 3.0);
        // Mid-gap amplitude is exactly zero.
        assert_eq!(p.amplitude_at(1.5), 0.0);
        // Inside the spans it is still 1.0.
        assert!((p.amplitude_at(0.5) - 1.0).abs() < 1e-12);
        assert!((p.amplitude_at(2.5) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn short_gap_gets_single_seam_point() {
        let mut c: PartialCollection = vec![
            labeled_partial(1, 0.0, 1.0, 440.0),
            labeled_partial(1, 1.001, 2.0, 440.0),
        ]
        .into_iter()
        .collect();

        distill_with_fade(&mut c, 0.001).unwrap();

        let p = &c.partials()[0];
        assert_eq!(p.amplitude_at(1.0005), 0.0);
        assert_eq!(p.len(), 5);
    }

    #[test]
    fn overlap_keeps_earlier_until_later_starts() {
        let mut a = Partial::with_label(1);
        a.insert(Breakpoint::new(0.0, 440.0, 1.0, 0.0, 0.0));
        a.insert(Breakpoint::new(0.4, 440.0, 1.0, 0.0, 0.0));
        a.insert(Breakpoint::new(1.0, 440.0, 1.0, 0.0, 0.0));
        let mut b = Partial::with_label(1);
        b.insert(Breakpoint::new(0.5, 460.0, 0.5, 0.0, 0.0));
        b.insert(Breakpoint::new(1.5, 460.0, 0.5, 0.0, 0.0));

        let mut c: PartialCollection = vec![a, b].into_iter().collect();
        distill(&mut c).unwrap();

        let p = &c.partials()[0];
        // Before the boundary: the earlier partial's data.
        assert!((p.frequency_at(0.2) - 440.0).abs() < 1e-9);
        // After the boundary: the later partial's data, with the earlier
        // partial's post-boundary breakpoints gone.
        assert!((p.frequency_at(1.2) - 460.0).abs() < 1e-9);
        assert!(!p.iter().any(|bp| bp.time == 1.0 && bp.frequency == 440.0));
    }

    #[test]
    fn contained_partial_contributes_nothing() {
        let long = labeled_partial(1, 0.0, 2.0, 440.0);
        let short = labeled_partial(1, 0.5, 1.0, 900.0);

        let mut c: PartialCollection = vec![long, short].into_iter().collect();
        distill(&mut c).unwrap();

        let p = &c.partials()[0];
        assert_eq!(p.len(), 2);
        assert!((p.frequency_at(0.7) - 440.0).abs() < 1e-9);
    }

    #[test]
    fn label_zero_passes_through_unmerged() {
        let mut c: PartialCollection = vec![
            labeled_partial(0, 0.0, 1.0, 300.0),
            labeled_partial(0, 0.5, 2.0, 500.0),
            labeled_partial(1, 0.0, 1.0, 440.0),
        ]
        .into_iter()
        .collect();

        distill(&mut c).unwrap();
        assert_eq!(c.len(), 3);
        assert_eq!(c.iter().filter(|p| p.label() == 0).count(), 2);
    }

    #[test]
    fn distillation_is_idempotent() {
        let mut c: PartialCollection = vec![
            labeled_partial(1, 0.0, 1.0, 440.0),
            labeled_partial(1, 1.5, 2.5, 440.0),
            labeled_partial(2, 0.2, 0.8, 880.0),
            labeled_partial(0, 0.0, 0.5, 111.0),
        ]
        .into_iter()
        .collect();

        distill(&mut c).unwrap();
        let once = c.clone();
        distill(&mut c).unwrap();

        assert_eq!(c, once);
    }

    #[test]
    fn nonpositive_fade_is_an_error() {
        let mut c: PartialCollection =
            vec![labeled_partial(1, 0.0, 1.0, 440.0)].into_iter().collect();
        assert!(distill_with_fade(&mut c, 0.0).is_err());
        assert!(distill_with_fade(&mut c, f64::NAN).is_err());
    }
}
