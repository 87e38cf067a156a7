//! Spectral peak extraction and thinning.

use crate::reassigned::ReassignedSpectrum;

/// One extracted time-frequency data point: a candidate breakpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralPeak {
    /// Reassigned time in seconds (absolute within the analyzed buffer).
    pub time: f64,
    /// Reassigned frequency in Hz.
    pub frequency: f64,
    /// Sinusoidal amplitude (linear, full-scale sine = 1.0).
    pub amplitude: f64,
    /// Phase in radians at the reassigned time.
    pub phase: f64,
    /// Noise-to-total energy ratio, filled in by bandwidth association.
    pub bandwidth: f64,
}

/// Selection thresholds applied while extracting peaks from one frame.
#[derive(Debug, Clone, Copy)]
pub struct PeakSelection {
    /// Minimum amplitude (linear).
    pub amp_floor: f64,
    /// Minimum frequency in Hz.
    pub freq_floor: f64,
    /// Maximum |time correction| in seconds for a data point to count as
    /// reliable.
    pub crop_time: f64,
    /// Minimum frequency separation between retained peaks, in Hz.
    pub resolution: f64,
}

/// Extract reassigned peaks from a transformed frame.
///
/// `frame_center_time` is the absolute time of the window center. Local
/// magnitude maxima above the floor become candidate peaks; candidates whose
/// reassigned time strays beyond the crop limit (transients, noise) or whose
/// frequency falls below the floor are discarded. The survivors are thinned
/// so no two retained peaks sit within the frequency resolution of each
/// other, keeping the strongest of each cluster.
pub fn extract_peaks(
    spectrum: &ReassignedSpectrum,
    frame_center_time: f64,
    sample_rate: f64,
    selection: &PeakSelection,
) -> Vec<SpectralPeak> {
    let bin_hz = sample_rate / spectrum.fft_size() as f64;
    let nyquist = sample_rate / 2.0;
    let num_bins = spectrum.num_bins();

    let mut candidates = Vec::new();
    for k in 1..num_bins.saturating_sub(1) {
        let mag = spectrum.magnitude(k);
        if mag <= spectrum.magnitude(k - 1) || mag < spectrum.magnitude(k + 1) {
            continue;
        }

        let amplitude = spectrum.peak_amplitude(k);
        if amplitude < selection.amp_floor {
            continue;
        }

        let frequency = spectrum.fractional_frequency(k) * bin_hz;
        if frequency < selection.freq_floor || frequency >= nyquist {
            continue;
        }

        let time_offset = spectrum.time_correction(k) / sample_rate;
        if time_offset.abs() > selection.crop_time {
            continue;
        }

        // Carry the phase to the reassigned time so breakpoints report the
        // phase where they actually sit.
        let omega = std::f64::consts::TAU * frequency;
        let phase = spectrum.phase_at_center(k) + omega * time_offset;

        let peak = SpectralPeak {
            time: frame_center_time + time_offset,
            frequency,
            amplitude,
            phase,
            bandwidth: 0.0,
        };
        if peak.time.is_finite() && peak.frequency.is_finite() && peak.amplitude.is_finite() {
            candidates.push(peak);
        }
    }

    thin_by_resolution(candidates, selection.resolution)
}

/// Keep the strongest peak of every cluster closer than `resolution` Hz,
/// returning the survivors in ascending frequency order.
fn thin_by_resolution(mut candidates: Vec<SpectralPeak>, resolution: f64) -> Vec<SpectralPeak> {
    candidates.sort_by(|a, b| b.amplitude.partial_cmp(&a.amplitude).unwrap());

    let mut retained: Vec<SpectralPeak> = Vec::with_capacity(candidates.len());
    for peak in candidates {
        let crowded = retained
            .iter()
            .any(|kept| (kept.frequency - peak.frequency).abs() < resolution);
        if !crowded {
            retained.push(peak);
        }
    }

    retained.sort_by(|a, b| a.frequency.partial_cmp(&b.frequency).unwrap());
    retained
}
