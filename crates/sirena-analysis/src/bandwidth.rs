//! Bandwidth association: folding residual noise energy into peaks.
//!
//! After peak selection, the spectral energy in each association region that
//! the retained sinusoids do not account for is treated as noise and
//! distributed among those sinusoids in proportion to their energy. Each
//! peak's bandwidth becomes `noise / (noise + signal)`, the fraction of its
//! total energy that the synthesizer must realize as noise modulation
//! rather than a clean sinusoid.

use crate::peaks::SpectralPeak;
use crate::reassigned::ReassignedSpectrum;

/// Distribute surplus spectral energy into the peaks' bandwidth values.
///
/// `region_width` is the width in Hz of the disjoint association regions;
/// the caller disables association entirely by never calling this.
pub fn associate_bandwidth(
    peaks: &mut [SpectralPeak],
    spectrum: &ReassignedSpectrum,
    sample_rate: f64,
    region_width: f64,
) {
    if peaks.is_empty() || region_width <= 0.0 {
        return;
    }

    let bin_hz = sample_rate / spectrum.fft_size() as f64;
    let window = spectrum.window();
    // Equivalent noise bandwidth of the window, in transform bins. Dividing
    // summed bin energies by this makes a unit sine measure exactly 1.0, so
    // bin energies and peak amplitudes share one scale.
    let enbw = spectrum.fft_size() as f64 * window.squared_sum()
        / (window.coefficient_sum() * window.coefficient_sum());
    let amp_scale = 2.0 / window.coefficient_sum();

    let num_regions = (sample_rate / 2.0 / region_width).ceil() as usize + 1;
    let mut region_energy = vec![0.0_f64; num_regions];
    for k in 0..spectrum.num_bins() {
        let amp = spectrum.magnitude(k) * amp_scale;
        let region = ((k as f64 * bin_hz) / region_width) as usize;
        if region < num_regions {
            region_energy[region] += amp * amp / enbw;
        }
    }

    let mut region_signal = vec![0.0_f64; num_regions];
    for peak in peaks.iter() {
        let region = (peak.frequency / region_width) as usize;
        if region < num_regions {
            region_signal[region] += peak.amplitude * peak.amplitude;
        }
    }

    for peak in peaks.iter_mut() {
        let region = (peak.frequency / region_width) as usize;
        if region >= num_regions || region_signal[region] <= 0.0 {
            continue;
        }
        let noise = (region_energy[region] - region_signal[region]).max(0.0);
        let energy = peak.amplitude * peak.amplitude;
        let share = noise * energy / region_signal[region];
        peak.bandwidth = share / (share + energy).max(f64::MIN_POSITIVE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peaks::{PeakSelection, extract_peaks};
    use crate::window::KaiserWindow;
    use std::f64::consts::TAU;

    fn analyze(signal_at: impl Fn(f64) -> f64, sample_rate: f64) -> Vec<SpectralPeak> {
        let window = KaiserWindow::for_main_lobe(200.0, 80.0, sample_rate);
        let n = window.len();
        let frame: Vec<f64> = (0..n).map(|i| signal_at(i as f64 / sample_rate)).collect();

        let mut spectrum = ReassignedSpectrum::new(window);
        spectrum.transform(&frame);

        let selection = PeakSelection {
            amp_floor: 0.05,
            freq_floor: 50.0,
            crop_time: 0.1,
            resolution: 100.0,
        };
        let mut peaks = extract_peaks(&spectrum, 0.0, sample_rate, &selection);
        associate_bandwidth(&mut peaks, &spectrum, sample_rate, 2000.0);
        peaks
    }

    #[test]
    fn pure_sine_has_negligible_bandwidth() {
        let peaks = analyze(|t| (TAU * 440.0 * t).cos(), 44100.0);
        assert_eq!(peaks.len(), 1);
        assert!(
            peaks[0].bandwidth < 0.02,
            "pure sine bandwidth {}",
            peaks[0].bandwidth
        );
    }

    #[test]
    fn noisy_sine_gets_nonzero_bandwidth() {
        // Deterministic pseudo-noise, uniform in [-1, 1].
        let mut state = 0x2545F4914F6CDD1D_u64;
        let mut noise = move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0
        };
        let sample_rate = 44100.0;
        let window = KaiserWindow::for_main_lobe(200.0, 80.0, sample_rate);
        let n = window.len();
        let frame: Vec<f64> = (0..n)
            .map(|i| 0.5 * (TAU * 440.0 * i as f64 / sample_rate).cos() + noise())
            .collect();

        let mut spectrum = ReassignedSpectrum::new(window);
        spectrum.transform(&frame);
        let selection = PeakSelection {
            amp_floor: 0.2,
            freq_floor: 50.0,
            crop_time: 0.1,
            resolution: 100.0,
        };
        let mut peaks = extract_peaks(&spectrum, 0.0, sample_rate, &selection);
        associate_bandwidth(&mut peaks, &spectrum, sample_rate, 2000.0);

        let tone = peaks
            .iter()
            .find(|p| (p.frequency - 440.0).abs() < 20.0)
            .expect("tone peak present");
        assert!(
            tone.bandwidth > 0.03 && tone.bandwidth < 0.95,
            "bandwidth {}",
            tone.bandwidth
        );
    }

    #[test]
    fn bandwidth_stays_in_unit_interval() {
        let peaks = analyze(
            |t| (TAU * 300.0 * t).cos() + 0.3 * (TAU * 700.0 * t).cos(),
            44100.0,
        );
        for peak in peaks {
            assert!((0.0..=1.0).contains(&peak.bandwidth));
        }
    }
}
