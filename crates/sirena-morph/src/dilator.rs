//! Time-axis dilation through piecewise-linear warps.

use sirena_core::{Breakpoint, Error, Partial, PartialCollection, Result};
use tracing::debug;

/// A strictly increasing piecewise-linear map of time onto time.
///
/// Between control points the map interpolates linearly; before the first
/// and after the last it extrapolates along the boundary segment's slope,
/// so material outside the controlled range keeps moving at the nearest
/// defined rate. A single control point degenerates to a translation and no
/// control points to the identity.
#[derive(Debug, Clone)]
pub struct TimeWarp {
    source: Vec<f64>,
    target: Vec<f64>,
}

impl TimeWarp {
    /// Build a warp mapping each `source[i]` onto `target[i]`.
    ///
    /// Fails with `InvalidArgument` when the sequences differ in length or
    /// either is not strictly increasing.
    pub fn new(source: &[f64], target: &[f64]) -> Result<Self> {
        if source.len() != target.len() {
            return Err(Error::invalid_argument(format!(
                "time point sequences differ in length ({} vs {})",
                source.len(),
                target.len()
            )));
        }
        for seq in [source, target] {
            if seq.iter().any(|t| !t.is_finite()) {
                return Err(Error::invalid_argument("time points must be finite"));
            }
            if seq.windows(2).any(|w| w[0] >= w[1]) {
                return Err(Error::invalid_argument(
                    "time points must be strictly increasing",
                ));
            }
        }
        Ok(Self {
            source: source.to_vec(),
            target: target.to_vec(),
        })
    }

    /// Map a source time to its warped position.
    pub fn map(&self, time: f64) -> f64 {
        match self.source.len() {
            0 => time,
            1 => time + self.target[0] - self.source[0],
            n => {
                // Segment index for interior times; boundary segments
                // extrapolate outward.
                let seg = match self.source.partition_point(|&s| s <= time) {
                    0 => 0,
                    i if i >= n => n - 2,
                    i => i - 1,
                };
                let (s0, s1) = (self.source[seg], self.source[seg + 1]);
                let (t0, t1) = (self.target[seg], self.target[seg + 1]);
                t0 + (time - s0) * (t1 - t0) / (s1 - s0)
            }
        }
    }
}

/// Remap every breakpoint time in the collection through the piecewise
/// linear warp defined by `source_times` -> `target_times`, in place.
///
/// Validation happens before any partial is touched; on error the
/// collection is unchanged.
pub fn dilate(
    collection: &mut PartialCollection,
    source_times: &[f64],
    target_times: &[f64],
) -> Result<()> {
    let warp = TimeWarp::new(source_times, target_times)?;

    for partial in collection.iter_mut() {
        // The warp is strictly increasing, so remapping preserves
        // breakpoint order; rebuilding through insert keeps the ordering
        // invariant checked.
        let label = partial.label();
        let warped: Partial = partial
            .iter()
            .map(|bp| Breakpoint::new(warp.map(bp.time), bp.frequency, bp.amplitude, bp.phase, bp.bandwidth))
            .collect();
        *partial = warped;
        partial.set_label(label);
    }

    debug!(
        control_points = source_times.len(),
        partials = collection.len(),
        "dilated"
    );
    Ok(())
}

/// Shift every breakpoint in the collection later by `offset` seconds
/// (earlier when negative), in place.
pub fn shift_time(collection: &mut PartialCollection, offset: f64) -> Result<()> {
    if !offset.is_finite() {
        return Err(Error::invalid_argument("time offset must be finite"));
    }
    for partial in collection.iter_mut() {
        for bp in partial.iter_mut() {
            bp.time += offset;
        }
    }
    Ok(())
}
