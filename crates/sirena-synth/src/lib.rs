//! Sirena Synth - bandwidth-enhanced additive resynthesis
//!
//! Turns a [`PartialCollection`](sirena_core::PartialCollection) back into
//! samples:
//!
//! - [`synthesizer`] - the [`Synthesizer`]: per-partial rendering, onset and
//!   release fades, parallel mixdown
//! - [`oscillator`] - the phase-accumulating bandwidth-enhanced oscillator
//! - [`noise`] - deterministic filtered-noise modulation sources
//!
//! Each partial contributes
//! `amp * (sqrt(1 - bw) + sqrt(2 * bw) * noise) * cos(phase)` per sample,
//! with frequency, amplitude, and bandwidth interpolated between its
//! breakpoints and phase accumulated by integrating frequency. At zero
//! bandwidth this is a clean additive oscillator bank; at full bandwidth it
//! is narrowband noise centered on the partial's frequency contour.
//!
//! # Example
//!
//! ```rust
//! use sirena_core::{Breakpoint, Partial, PartialCollection};
//! use sirena_synth::Synthesizer;
//!
//! let mut partial = Partial::new();
//! partial.insert(Breakpoint::new(0.0, 440.0, 0.5, 0.0, 0.0));
//! partial.insert(Breakpoint::new(1.0, 440.0, 0.5, 0.0, 0.0));
//! let mut collection = PartialCollection::new();
//! collection.push(partial);
//!
//! let synth = Synthesizer::new(44100.0);
//! let samples = synth.synthesize(&collection).unwrap();
//! assert!(samples.len() >= 44100);
//! ```

pub mod noise;
pub mod oscillator;
pub mod synthesizer;

pub use noise::{NoiseModulator, NoiseSource};
pub use oscillator::Oscillator;
pub use synthesizer::Synthesizer;
