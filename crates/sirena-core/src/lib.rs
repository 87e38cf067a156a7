//! Sirena Core - data model for the bandwidth-enhanced additive sound model
//!
//! This crate provides the entities every pipeline stage consumes and
//! produces:
//!
//! - [`Breakpoint`] - one time-stamped sample of a partial's instantaneous
//!   frequency, amplitude, phase, and noisiness
//! - [`Partial`] - a labeled, time-ordered sequence of breakpoints describing
//!   one sinusoidal(+noise) trajectory
//! - [`PartialCollection`] - an insertion-ordered set of partials, the unit
//!   of work for analysis, labeling, morphing, and synthesis
//! - [`BreakpointEnvelope`] - a sparse, linearly-interpolated control curve
//!   (reference frequency, morph weight, pitch-shift amount)
//! - [`Marker`] - opaque (time, name) metadata passed through unmodified
//! - [`Error`] / [`Result`] - the error vocabulary shared by all stages
//! - [`CancelToken`] - cooperative cancellation for long batch operations
//!
//! # Example
//!
//! ```rust
//! use sirena_core::{Breakpoint, Partial, PartialCollection};
//!
//! let mut partial = Partial::new();
//! partial.insert(Breakpoint::new(0.0, 440.0, 0.5, 0.0, 0.0));
//! partial.insert(Breakpoint::new(1.0, 442.0, 0.4, 0.0, 0.0));
//!
//! assert_eq!(partial.start_time(), 0.0);
//! assert!((partial.frequency_at(0.5) - 441.0).abs() < 1e-9);
//!
//! let mut collection = PartialCollection::new();
//! collection.push(partial);
//! ```
//!
//! # Design Notes
//!
//! - Breakpoint times within a partial are strictly increasing; every
//!   mutation preserves this.
//! - Labels are plain integer tags: 0 means "unlabeled / noise", N means
//!   channel N. Behavioral differences are conditionals on the tag, not a
//!   type hierarchy.
//! - All entities are value-like aggregates; nothing here aliases anything.

pub mod breakpoint;
pub mod cancel;
pub mod collection;
pub mod envelope;
pub mod error;
pub mod marker;
pub mod partial;

pub use breakpoint::Breakpoint;
pub use cancel::CancelToken;
pub use collection::PartialCollection;
pub use envelope::BreakpointEnvelope;
pub use error::{Error, Result};
pub use marker::Marker;
pub use partial::Partial;
