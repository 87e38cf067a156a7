//! Sifting: one reliable track per channel, the rest demoted to noise.

use sirena_core::PartialCollection;
use std::collections::HashSet;
use tracing::debug;

/// Demote all but the best contender in every channel to label 0.
///
/// Channelization can hand several overlapping partials the same label;
/// harmonic distillation needs at most one track per channel at any time.
/// For each non-zero label, contenders are ranked by mean amplitude
/// (ties: earlier start time, then collection order) and retained greedily;
/// a contender overlapping in time with an already-retained partial of its
/// label is relabeled 0 wholly. Non-overlapping same-label partials all
/// stay - distillation will chain them end to end.
///
/// The demoted partials keep their breakpoint data and can be dropped with
/// [`remove_labeled`] or retained as noise.
pub fn sift(collection: &mut PartialCollection) {
    let mut order: Vec<usize> = (0..collection.len())
        .filter(|&i| collection.partials()[i].label() != 0)
        .collect();
    order.sort_by(|&a, &b| {
        let pa = &collection.partials()[a];
        let pb = &collection.partials()[b];
        pb.mean_amplitude()
            .partial_cmp(&pa.mean_amplitude())
            .unwrap()
            .then(pa.start_time().partial_cmp(&pb.start_time()).unwrap())
            .then(a.cmp(&b))
    });

    let mut retained: Vec<usize> = Vec::new();
    let mut demoted: Vec<usize> = Vec::new();
    for &idx in &order {
        let candidate = &collection.partials()[idx];
        let contested = retained.iter().any(|&kept| {
            let keeper = &collection.partials()[kept];
            keeper.label() == candidate.label() && keeper.overlaps(candidate)
        });
        if contested {
            demoted.push(idx);
        } else {
            retained.push(idx);
        }
    }

    let num_demoted = demoted.len();
    let demote: HashSet<usize> = demoted.into_iter().collect();
    for (i, partial) in collection.iter_mut().enumerate() {
        if demote.contains(&i) {
            partial.set_label(0);
        }
    }

    debug!(retained = retained.len(), demoted = num_demoted, "sifted");
}

/// Delete every partial carrying the given label. Typically used to discard
/// label-0 noise partials after sifting.
pub fn remove_labeled(collection: &mut PartialCollection, label: u32) {
    let before = collection.len();
    collection.retain(|p| p.label() != label);
    debug!(removed = before - collection.len(), label, "removed labeled");
}
