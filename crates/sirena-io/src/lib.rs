//! Sample file I/O for the sirena sound model.
//!
//! The engine's only boundary to the outside world is the
//! [`SampleBuffer`]: mono floating-point samples, a sample rate, and
//! optional opaque markers. This crate realizes that boundary for WAV
//! files:
//!
//! - [`read_wav`] loads a WAV file (multi-channel content is mixed down to
//!   mono - the engine models single-channel signal content only)
//! - [`write_wav`] saves a buffer as 16-bit PCM or 32-bit float
//!
//! Markers ride on the in-memory buffer and pass through engine stages
//! untouched; the WAV container itself does not persist them.

mod wav;

pub use wav::{SampleBuffer, read_wav, write_wav};

/// Error types for sample file I/O.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested bit depth is not supported.
    #[error("unsupported bit depth: {0} (use 16 or 32)")]
    UnsupportedBitDepth(u16),
}

/// Convenience result type for sample file I/O.
pub type Result<T> = std::result::Result<T, Error>;
