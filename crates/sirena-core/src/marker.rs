//! Opaque time-stamped metadata.

/// A (time, name) pair attached to a sample buffer's metadata.
///
/// Markers are opaque to the engine: pipeline stages pass them through
/// unmodified from input metadata to output metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// Position in seconds.
    pub time: f64,
    /// Marker name.
    pub name: String,
}

impl Marker {
    /// Create a marker.
    pub fn new(time: f64, name: impl Into<String>) -> Self {
        Self {
            time,
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction() {
        let m = Marker::new(1.5, "attack");
        assert_eq!(m.time, 1.5);
        assert_eq!(m.name, "attack");
    }
}
