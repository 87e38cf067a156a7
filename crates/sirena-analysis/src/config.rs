//! Analyzer configuration and TOML presets.

use serde::{Deserialize, Serialize};
use sirena_core::{Error, Result};
use std::path::{Path, PathBuf};
use thiserror::Error as ThisError;

/// The full parameter set of a reassigned analysis.
///
/// The core parameter is the frequency resolution - the minimum
/// instantaneous frequency spacing between simultaneously tracked partials.
/// All other parameters derive from the resolution (and the window width,
/// when given) at construction time; subsequent mutation of any parameter is
/// independent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Minimum frequency spacing between tracked partials, Hz.
    pub freq_resolution: f64,
    /// Main-lobe width (zero-to-zero) of the analysis window, Hz.
    pub window_width: f64,
    /// Lowest detected spectral amplitude, dB relative to a full-scale sine
    /// (negative).
    pub amp_floor_db: f64,
    /// Minimum trackable frequency, Hz.
    pub freq_floor: f64,
    /// Maximum frequency difference between consecutive breakpoints of one
    /// track, Hz.
    pub freq_drift: f64,
    /// Time between successive analysis frames, seconds.
    pub hop_time: f64,
    /// Maximum |time correction| for a data point to be considered
    /// reliable, seconds.
    pub crop_time: f64,
    /// Width of the bandwidth association regions, Hz; 0 disables noise
    /// association.
    pub bw_region_width: f64,
    /// Kaiser window sidelobe attenuation, positive dB.
    pub sidelobe_level: f64,
    /// Rewrite breakpoint phases after analysis so phase and frequency are
    /// mutually consistent.
    pub phase_correct: bool,
}

impl AnalyzerConfig {
    /// Configuration for the given frequency resolution, with the window
    /// width equal to the resolution and everything else derived.
    pub fn new(freq_resolution: f64) -> Self {
        Self::with_window(freq_resolution, freq_resolution)
    }

    /// Configuration for the given resolution and window width; the
    /// remaining parameters are derived from those two.
    pub fn with_window(freq_resolution: f64, window_width: f64) -> Self {
        let hop_time = if window_width > 0.0 {
            1.0 / window_width
        } else {
            0.0
        };
        Self {
            freq_resolution,
            window_width,
            amp_floor_db: -90.0,
            freq_floor: freq_resolution,
            freq_drift: 0.2 * freq_resolution,
            hop_time,
            crop_time: hop_time,
            bw_region_width: 2000.0,
            sidelobe_level: 90.0,
            phase_correct: true,
        }
    }

    /// The amplitude floor as a linear amplitude.
    pub fn amp_floor_linear(&self) -> f64 {
        10.0_f64.powf(self.amp_floor_db / 20.0)
    }

    /// Check that the configuration is physically meaningful.
    ///
    /// No silent substitution happens anywhere: a degenerate configuration
    /// is an error, reported before any analysis work starts.
    pub fn validate(&self) -> Result<()> {
        fn positive(name: &str, value: f64) -> Result<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(Error::invalid_configuration(format!(
                    "{name} must be positive and finite, got {value}"
                )))
            }
        }

        positive("freq_resolution", self.freq_resolution)?;
        positive("window_width", self.window_width)?;
        positive("freq_drift", self.freq_drift)?;
        positive("hop_time", self.hop_time)?;
        positive("crop_time", self.crop_time)?;
        positive("sidelobe_level", self.sidelobe_level)?;
        if !self.freq_floor.is_finite() || self.freq_floor < 0.0 {
            return Err(Error::invalid_configuration(format!(
                "freq_floor must be non-negative, got {}",
                self.freq_floor
            )));
        }
        if !self.bw_region_width.is_finite() || self.bw_region_width < 0.0 {
            return Err(Error::invalid_configuration(format!(
                "bw_region_width must be non-negative, got {}",
                self.bw_region_width
            )));
        }
        if !self.amp_floor_db.is_finite() || self.amp_floor_db >= 0.0 {
            return Err(Error::invalid_configuration(format!(
                "amp_floor_db must be negative, got {}",
                self.amp_floor_db
            )));
        }
        Ok(())
    }
}

/// Errors from loading or saving analyzer presets.
#[derive(Debug, ThisError)]
pub enum ConfigError {
    /// Failed to read a preset file.
    #[error("failed to read preset '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a preset file.
    #[error("failed to write preset '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML.
    #[error("failed to parse preset TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// Failed to serialize TOML.
    #[error("failed to serialize preset TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The preset parsed but describes a degenerate analysis.
    #[error(transparent)]
    Invalid(#[from] Error),
}

/// Load and validate an analyzer preset from a TOML file.
pub fn load_preset<P: AsRef<Path>>(path: P) -> std::result::Result<AnalyzerConfig, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let config: AnalyzerConfig = toml::from_str(&text)?;
    config.validate()?;
    Ok(config)
}

/// Validate and save an analyzer preset to a TOML file.
pub fn save_preset<P: AsRef<Path>>(
    path: P,
    config: &AnalyzerConfig,
) -> std::result::Result<(), ConfigError> {
    config.validate()?;
    let path = path.as_ref();
    let text = toml::to_string_pretty(config)?;
    std::fs::write(path, text).map_err(|source| ConfigError::WriteFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}
