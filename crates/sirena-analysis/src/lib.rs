//! Sirena Analysis - reassigned spectral analysis for the additive model
//!
//! This crate turns sampled sound into [`PartialCollection`]s:
//!
//! - [`analyzer`] - the [`Analyzer`]: configuration plus the full analysis
//!   pipeline (windowed frames, reassignment, peak selection, track
//!   linking, bandwidth association, phase correction)
//! - [`window`] - Kaiser analysis windows parameterized by main-lobe width
//!   and sidelobe attenuation
//! - [`reassigned`] - time-frequency reassigned short-time spectra
//! - [`peaks`] - peak extraction and resolution thinning
//! - [`tracker`] - frame-to-frame linking (free-running and
//!   reference-guided)
//! - [`bandwidth`] - noise-energy association into breakpoint bandwidth
//! - [`fundamental`] - maximum-likelihood fundamental estimation
//! - [`reference`] - reference frequency envelopes from analyzed partials
//! - [`config`] - analyzer parameter sets and TOML presets
//!
//! ## Example Workflow
//!
//! ```rust,ignore
//! use sirena_analysis::{Analyzer, create_freq_reference};
//!
//! // Analyze at 240 Hz resolution with a 300 Hz window.
//! let mut analyzer = Analyzer::with_window(240.0, 300.0);
//! let partials = analyzer.analyze(&samples, 44100.0)?;
//!
//! // Build a channelization reference around the expected fundamental.
//! let reference = create_freq_reference(&partials, 150.0, 450.0, 100)?;
//! ```

pub mod analyzer;
pub mod bandwidth;
pub mod config;
pub mod fft;
pub mod fundamental;
pub mod peaks;
pub mod reassigned;
pub mod reference;
pub mod tracker;
pub mod window;

pub use analyzer::Analyzer;
pub use config::{AnalyzerConfig, ConfigError, load_preset, save_preset};
pub use fundamental::{F0Estimate, FundamentalParams};
pub use peaks::{PeakSelection, SpectralPeak};
pub use reference::create_freq_reference;
pub use window::KaiserWindow;

// Re-exported so analysis clients don't need a separate sirena-core import
// for the common types.
pub use sirena_core::{BreakpointEnvelope, PartialCollection};
