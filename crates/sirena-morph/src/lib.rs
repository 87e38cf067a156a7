//! Sirena Morph - label-driven operations on partial collections
//!
//! Everything between analysis and synthesis lives here: assigning partials
//! to harmonic channels, reducing each channel to one continuous track, and
//! reshaping or blending the results.
//!
//! - [`channelizer`] - [`channelize`]: label partials against a reference
//!   frequency contour
//! - [`sifter`] - [`sift`] / [`remove_labeled`]: one reliable track per
//!   channel, losers demoted to noise
//! - [`distiller`] - [`distill`]: merge each channel into a single partial
//! - [`dilator`] - [`dilate`] / [`shift_time`]: piecewise-linear time warps
//! - [`pitch`] - [`shift_pitch`] / [`scale_amplitude`]: envelope-driven
//!   frequency and amplitude modification
//! - [`resample`] - uniform breakpoint grids
//! - [`morpher`] - [`Morpher`]: weighted interpolation between two sounds
//!
//! ## Typical pipeline
//!
//! ```rust,ignore
//! use sirena_morph::{Morpher, channelize, distill, remove_labeled, sift};
//!
//! channelize(&mut partials, &reference, 1)?;
//! sift(&mut partials);
//! remove_labeled(&mut partials, 0);
//! distill(&mut partials)?;
//! let morphed = Morpher::uniform(weight).morph(&partials, &other)?;
//! ```

pub mod channelizer;
pub mod dilator;
pub mod distiller;
pub mod morpher;
pub mod pitch;
pub mod resample;
pub mod sifter;

pub use channelizer::channelize;
pub use dilator::{TimeWarp, dilate, shift_time};
pub use distiller::{DEFAULT_FADE_TIME, distill, distill_with_fade};
pub use morpher::Morpher;
pub use pitch::{scale_amplitude, shift_pitch};
pub use resample::resample;
pub use sifter::{remove_labeled, sift};
