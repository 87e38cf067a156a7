//! Sparse, linearly-interpolated control curves.

/// Two control-point times closer than this collapse into one.
const TIME_EPSILON: f64 = 1e-9;

/// A sparse scalar function of time: ordered control points with linear
/// interpolation between them and constant extrapolation outside.
///
/// Used throughout the pipeline as a control curve - reference frequency for
/// channelization, morph weight functions, pitch-shift amounts. A constant
/// envelope is the degenerate one-control-point case, built with
/// [`BreakpointEnvelope::constant`].
///
/// # Example
///
/// ```rust
/// use sirena_core::BreakpointEnvelope;
///
/// let mut env = BreakpointEnvelope::new();
/// env.insert(0.6, 0.0);
/// env.insert(2.0, 1.0);
///
/// assert_eq!(env.value_at(0.0), 0.0);   // constant before the first point
/// assert!((env.value_at(1.3) - 0.5).abs() < 1e-12);
/// assert_eq!(env.value_at(5.0), 1.0);   // constant after the last point
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BreakpointEnvelope {
    points: Vec<(f64, f64)>,
}

impl BreakpointEnvelope {
    /// Create an empty envelope. Evaluates to 0.0 everywhere until a control
    /// point is inserted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an envelope that evaluates to `value` for all time.
    pub fn constant(value: f64) -> Self {
        Self {
            points: vec![(0.0, value)],
        }
    }

    /// Insert a control point, replacing one at a coincident time.
    pub fn insert(&mut self, time: f64, value: f64) {
        let idx = self
            .points
            .partition_point(|&(t, _)| t < time - TIME_EPSILON);
        if let Some(existing) = self.points.get_mut(idx)
            && (existing.0 - time).abs() <= TIME_EPSILON
        {
            existing.1 = value;
            return;
        }
        self.points.insert(idx, (time, value));
    }

    /// Evaluate the envelope at `time`.
    ///
    /// Linear interpolation between bracketing control points; constant
    /// extrapolation outside the controlled range; 0.0 for an empty
    /// envelope.
    pub fn value_at(&self, time: f64) -> f64 {
        match self.points.as_slice() {
            [] => 0.0,
            [(_, v)] => *v,
            points => {
                let (t0, v0) = points[0];
                let (tn, vn) = points[points.len() - 1];
                if time <= t0 {
                    return v0;
                }
                if time >= tn {
                    return vn;
                }
                let idx = points.partition_point(|&(t, _)| t <= time);
                let (ta, va) = points[idx - 1];
                let (tb, vb) = points[idx];
                va + (vb - va) * (time - ta) / (tb - ta)
            }
        }
    }

    /// Number of control points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the envelope has no control points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The control points as ordered (time, value) pairs.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Smallest and largest values over the control points, or `None` for an
    /// empty envelope. (Linear interpolation never exceeds the control-point
    /// range, so this bounds the envelope everywhere.)
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.points
            .iter()
            .map(|&(_, v)| v)
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

impl FromIterator<(f64, f64)> for BreakpointEnvelope {
    fn from_iter<T: IntoIterator<Item = (f64, f64)>>(iter: T) -> Self {
        let mut env = BreakpointEnvelope::new();
        for (t, v) in iter {
            env.insert(t, v);
        }
        env
    }
}
