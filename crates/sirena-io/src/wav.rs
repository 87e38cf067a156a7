//! WAV reading and writing around the engine's sample-buffer boundary.

use crate::Result;
use hound::{SampleFormat, WavReader, WavWriter};
use sirena_core::Marker;
use std::path::Path;
use tracing::debug;

/// A mono sample buffer with its sample rate and passthrough markers.
#[derive(Debug, Clone, Default)]
pub struct SampleBuffer {
    /// Amplitude samples, nominally in [-1, 1].
    pub samples: Vec<f64>,
    /// Sample rate in Hz.
    pub sample_rate: f64,
    /// Opaque (time, name) metadata, passed through unmodified.
    pub markers: Vec<Marker>,
}

impl SampleBuffer {
    /// Create a buffer without markers.
    pub fn new(samples: Vec<f64>, sample_rate: f64) -> Self {
        Self {
            samples,
            sample_rate,
            markers: Vec::new(),
        }
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate > 0.0 {
            self.samples.len() as f64 / self.sample_rate
        } else {
            0.0
        }
    }

    /// Replace the markers, e.g. to carry an input file's markers across to
    /// an output file.
    pub fn set_markers(&mut self, markers: Vec<Marker>) {
        self.markers = markers;
    }
}

/// Read a WAV file into a mono [`SampleBuffer`].
///
/// Multi-channel files are mixed down by averaging channels; the engine
/// only models single-channel signal content.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<SampleBuffer> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels as usize;

    let samples: Vec<f64> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f64;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| f64::from(v) / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    let mono: Vec<f64> = if channels > 1 {
        samples
            .chunks(channels)
            .map(|chunk| chunk.iter().sum::<f64>() / channels as f64)
            .collect()
    } else {
        samples
    };

    debug!(
        samples = mono.len(),
        sample_rate = spec.sample_rate,
        channels,
        "read wav"
    );
    Ok(SampleBuffer::new(mono, f64::from(spec.sample_rate)))
}

/// Write a [`SampleBuffer`] to a WAV file.
///
/// `bits_per_sample` selects the encoding: 16 for PCM, 32 for IEEE float.
pub fn write_wav<P: AsRef<Path>>(
    path: P,
    buffer: &SampleBuffer,
    bits_per_sample: u16,
) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate as u32,
        bits_per_sample,
        sample_format: match bits_per_sample {
            16 => SampleFormat::Int,
            32 => SampleFormat::Float,
            other => return Err(crate::Error::UnsupportedBitDepth(other)),
        },
    };

    let mut writer = WavWriter::create(path, spec)?;
    if bits_per_sample == 32 {
        for &sample in &buffer.samples {
            writer.write_sample(sample as f32)?;
        }
    } else {
        let max_val = f64::from(1i32 << 15);
        for &sample in &buffer.samples {
            let quantized = (sample * max_val).clamp(-max_val, max_val - 1.0) as i16;
            writer.write_sample(quantized)?;
        }
    }
    writer.finalize()?;

    debug!(samples = buffer.samples.len(), bits_per_sample, "wrote wav");
    Ok(())
}
