//! Channel assignment against a reference frequency contour.

use sirena_core::{BreakpointEnvelope, Error, PartialCollection, Result};
use std::collections::HashMap;
use tracing::debug;

/// Assign each partial a channel label from a reference frequency envelope.
///
/// The reference traces the (approximate) fundamental of the sound. Each
/// breakpoint votes for the channel `round(freq / (ref(t) / N))` where `N`
/// is `channels_per_harmonic`; the channel with the most votes becomes the
/// partial's label, ties breaking toward the lowest channel number. With
/// `N = 1`, channel k collects the partials near harmonic k; larger `N`
/// reserves N channels per harmonic for bandwidth-enhanced sounds that
/// need several partials clustered around each harmonic.
///
/// Labels are rewritten in place; breakpoint data is untouched. Fails with
/// `InvalidArgument` (before mutating anything) when `channels_per_harmonic`
/// is zero or the reference is empty or non-positive anywhere a breakpoint
/// needs it.
pub fn channelize(
    collection: &mut PartialCollection,
    reference: &BreakpointEnvelope,
    channels_per_harmonic: u32,
) -> Result<()> {
    if channels_per_harmonic == 0 {
        return Err(Error::invalid_argument(
            "channels_per_harmonic must be at least 1",
        ));
    }
    if reference.is_empty() {
        return Err(Error::invalid_argument("reference envelope is empty"));
    }
    if let Some((lo, _)) = reference.value_range()
        && lo <= 0.0
    {
        return Err(Error::invalid_argument(
            "reference envelope must be positive everywhere",
        ));
    }

    // Stage all labels first; a vote can't fail after validation, but the
    // two-pass shape keeps the commit trivially all-or-nothing.
    let labels: Vec<u32> = collection
        .iter()
        .map(|partial| {
            let mut votes: HashMap<u32, usize> = HashMap::new();
            for bp in partial {
                let channel_width = reference.value_at(bp.time) / f64::from(channels_per_harmonic);
                let channel = (bp.frequency / channel_width).round();
                if channel >= 1.0 && channel <= f64::from(u32::MAX) {
                    *votes.entry(channel as u32).or_insert(0) += 1;
                }
            }
            votes
                .into_iter()
                .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
                .map_or(0, |(channel, _)| channel)
        })
        .collect();

    for (partial, label) in collection.iter_mut().zip(labels) {
        partial.set_label(label);
    }

    debug!(
        partials = collection.len(),
        channels_per_harmonic, "channelized"
    );
    Ok(())
}
