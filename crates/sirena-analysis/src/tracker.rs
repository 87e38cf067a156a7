//! Frame-to-frame linking of spectral peaks into partial tracks.
//!
//! Linking is a stateful sequential scan: each frame's peaks either continue
//! an open track, start a new one, or (for tracks that find no continuation)
//! close the track. Tracks live in an indexed arena with stable handles, so
//! closing and opening never invalidates references to other tracks.

use crate::peaks::SpectralPeak;
use sirena_core::{Breakpoint, Partial};
use std::collections::HashMap;

struct Track {
    partial: Partial,
    last_frequency: f64,
}

impl Track {
    fn start(peak: &SpectralPeak) -> Self {
        let mut partial = Partial::new();
        partial.insert(breakpoint_from(peak));
        Self {
            partial,
            last_frequency: peak.frequency,
        }
    }

    fn extend(&mut self, peak: &SpectralPeak) {
        self.partial.insert(breakpoint_from(peak));
        self.last_frequency = peak.frequency;
    }
}

fn breakpoint_from(peak: &SpectralPeak) -> Breakpoint {
    Breakpoint::new(
        peak.time,
        peak.frequency,
        peak.amplitude,
        peak.phase,
        peak.bandwidth,
    )
}

/// Free-running greedy tracker.
///
/// Peaks continue the open track with the nearest last frequency, provided
/// the jump stays within the configured drift; closest pairs match first, so
/// an ambiguous peak never steals a track from a better continuation.
pub struct Tracker {
    freq_drift: f64,
    tracks: Vec<Track>,
    active: Vec<usize>,
}

impl Tracker {
    /// Create a tracker allowing at most `freq_drift` Hz between consecutive
    /// breakpoints of one track.
    pub fn new(freq_drift: f64) -> Self {
        Self {
            freq_drift,
            tracks: Vec::new(),
            active: Vec::new(),
        }
    }

    /// Link one frame's peaks.
    pub fn advance(&mut self, peaks: &[SpectralPeak]) {
        // All (track, peak) pairs within drift, closest first.
        let mut pairs: Vec<(f64, usize, usize)> = Vec::new();
        for (slot, &track_idx) in self.active.iter().enumerate() {
            let last = self.tracks[track_idx].last_frequency;
            for (peak_idx, peak) in peaks.iter().enumerate() {
                let delta = (peak.frequency - last).abs();
                if delta <= self.freq_drift {
                    pairs.push((delta, slot, peak_idx));
                }
            }
        }
        pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

        let mut slot_taken = vec![false; self.active.len()];
        let mut peak_taken = vec![false; peaks.len()];
        for &(_, slot, peak_idx) in &pairs {
            if slot_taken[slot] || peak_taken[peak_idx] {
                continue;
            }
            slot_taken[slot] = true;
            peak_taken[peak_idx] = true;
            let track_idx = self.active[slot];
            self.tracks[track_idx].extend(&peaks[peak_idx]);
        }

        // Tracks that found no continuation close; unmatched peaks open new
        // tracks.
        let survivors: Vec<usize> = self
            .active
            .iter()
            .enumerate()
            .filter(|&(slot, _)| slot_taken[slot])
            .map(|(_, &idx)| idx)
            .collect();
        self.active = survivors;

        for (peak_idx, peak) in peaks.iter().enumerate() {
            if !peak_taken[peak_idx] {
                self.tracks.push(Track::start(peak));
                self.active.push(self.tracks.len() - 1);
            }
        }
    }

    /// Number of tracks currently open.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Close all tracks and return the collected partials.
    pub fn finish(self) -> Vec<Partial> {
        self.tracks
            .into_iter()
            .map(|t| t.partial)
            .filter(|p| !p.is_empty())
            .collect()
    }
}

/// Reference-guided tracker.
///
/// Tracks are keyed by harmonic number `round(f / reference)`; a peak
/// continues the open track in its harmonic slot rather than chasing the
/// nearest frequency. This locks tracking to expected harmonic positions
/// and is markedly more robust for noisy or breathy sources whose peak
/// frequencies wobble.
pub struct GuidedTracker {
    tracks: Vec<Track>,
    active: HashMap<u32, usize>,
}

impl GuidedTracker {
    /// Create an empty guided tracker.
    pub fn new() -> Self {
        Self {
            tracks: Vec::new(),
            active: HashMap::new(),
        }
    }

    /// Link one frame's peaks against the local reference frequency.
    ///
    /// Peaks below half the reference have no harmonic slot and are
    /// dropped. When several peaks land in one slot, the one closest to the
    /// slot's expected frequency wins; the rest are dropped for this frame.
    pub fn advance(&mut self, peaks: &[SpectralPeak], reference_hz: f64) {
        if reference_hz <= 0.0 {
            return;
        }

        // Best peak per harmonic slot.
        let mut chosen: HashMap<u32, usize> = HashMap::new();
        for (peak_idx, peak) in peaks.iter().enumerate() {
            let harmonic = (peak.frequency / reference_hz).round() as i64;
            if harmonic < 1 {
                continue;
            }
            let harmonic = harmonic as u32;
            let expected = f64::from(harmonic) * reference_hz;
            let better = match chosen.get(&harmonic) {
                None => true,
                Some(&prev) => {
                    (peak.frequency - expected).abs()
                        < (peaks[prev].frequency - expected).abs()
                }
            };
            if better {
                chosen.insert(harmonic, peak_idx);
            }
        }

        let mut next_active: HashMap<u32, usize> = HashMap::new();
        for (harmonic, peak_idx) in chosen {
            let peak = &peaks[peak_idx];
            match self.active.get(&harmonic) {
                Some(&track_idx) => {
                    self.tracks[track_idx].extend(peak);
                    next_active.insert(harmonic, track_idx);
                }
                None => {
                    self.tracks.push(Track::start(peak));
                    next_active.insert(harmonic, self.tracks.len() - 1);
                }
            }
        }
        self.active = next_active;
    }

    /// Close all tracks and return the collected partials.
    pub fn finish(self) -> Vec<Partial> {
        self.tracks
            .into_iter()
            .map(|t| t.partial)
            .filter(|p| !p.is_empty())
            .collect()
    }
}

impl Default for GuidedTracker {
    fn default() -> Self {
        Self::new()
    }
}
