//! Error types shared by all pipeline stages.

use thiserror::Error;

/// Errors reported by engine operations.
///
/// Every failure is reported synchronously from the failing operation, and
/// no operation partially mutates its target on failure: stages either
/// validate before touching anything or stage their output and commit on
/// success. There is no retry logic here - these are deterministic numerical
/// algorithms, so a failure on given inputs will recur until the caller
/// adjusts parameters.
#[derive(Debug, Error)]
pub enum Error {
    /// An analyzer or synthesizer was configured with non-physical
    /// parameters.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Description of the offending parameter.
        reason: String,
    },

    /// An operation received a malformed argument (mismatched dilation time
    /// sequences, an empty collection where a label must exist, a
    /// non-positive reference frequency).
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Description of what was malformed.
        reason: String,
    },

    /// Interpolation or noise filtering produced a NaN or infinity. Surfaced,
    /// never silently clamped.
    #[error("numerical instability in {stage}: non-finite value encountered")]
    NumericalInstability {
        /// Pipeline stage that produced the non-finite value.
        stage: &'static str,
    },

    /// A cooperative cancellation token was triggered mid-batch.
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// Create an [`Error::InvalidConfiguration`].
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Error::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// Create an [`Error::InvalidArgument`].
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            reason: reason.into(),
        }
    }
}

/// Convenience result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_configuration_display() {
        let err = Error::invalid_configuration("resolution must be positive");
        assert_eq!(
            err.to_string(),
            "invalid configuration: resolution must be positive"
        );
    }

    #[test]
    fn invalid_argument_display() {
        let err = Error::invalid_argument("time points must be strictly increasing");
        assert_eq!(
            err.to_string(),
            "invalid argument: time points must be strictly increasing"
        );
    }

    #[test]
    fn numerical_instability_names_stage() {
        let err = Error::NumericalInstability { stage: "synthesis" };
        assert!(err.to_string().contains("synthesis"));
    }

    #[test]
    fn cancelled_display() {
        assert_eq!(Error::Cancelled.to_string(), "operation cancelled");
    }
}
