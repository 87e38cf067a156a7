//! Integration tests: the channelize / sift / distill pipeline on analyzed
//! and synthetic collections, plus dilation and morphing end to end.

use sirena_analysis::{Analyzer, create_freq_reference};
use sirena_core::{Breakpoint, BreakpointEnvelope, Partial, PartialCollection};
use sirena_morph::{Morpher, channelize, dilate, distill, remove_labeled, shift_pitch, sift};
use std::f64::consts::{PI, TAU};

fn faded_tone(components: &[(f64, f64)], duration: f64, sample_rate: f64) -> Vec<f64> {
    let n = (duration * sample_rate) as usize;
    let ramp = (0.05 * sample_rate) as usize;
    (0..n)
        .map(|i| {
            let t = i as f64 / sample_rate;
            let fade_in = if i < ramp {
                0.5 - 0.5 * (PI * i as f64 / ramp as f64).cos()
            } else {
                1.0
            };
            let fade_out = if i + ramp > n {
                let j = n - i;
                0.5 - 0.5 * (PI * j as f64 / ramp as f64).cos()
            } else {
                1.0
            };
            let sample: f64 = components
                .iter()
                .map(|&(f, a)| a * (TAU * f * t).cos())
                .sum();
            fade_in * fade_out * sample
        })
        .collect()
}

fn constant_partial(label: u32, freq: f64, amp: f64, start: f64, end: f64) -> Partial {
    let mut p = Partial::with_label(label);
    p.insert(Breakpoint::new(start, freq, amp, 0.0, 0.0));
    p.insert(Breakpoint::new(end, freq, amp, 0.0, 0.0));
    p
}

#[test]
fn analyze_channelize_distill_labels_harmonics() {
    let sample_rate = 44100.0;
    let samples = faded_tone(&[(440.0, 1.0), (880.0, 0.5)], 0.6, sample_rate);

    let mut analyzer = Analyzer::new(100.0);
    analyzer.config_mut().amp_floor_db = -50.0;
    let mut partials = analyzer.analyze(&samples, sample_rate).unwrap();

    let reference = create_freq_reference(&partials, 300.0, 600.0, 100).unwrap();
    channelize(&mut partials, &reference, 1).unwrap();
    sift(&mut partials);
    remove_labeled(&mut partials, 0);
    distill(&mut partials).unwrap();

    assert_eq!(partials.labels(), vec![1, 2]);
    assert_eq!(partials.len(), 2);

    let h1 = partials.iter().find(|p| p.label() == 1).unwrap();
    let h2 = partials.iter().find(|p| p.label() == 2).unwrap();
    assert!((h1.weighted_mean_frequency() - 440.0).abs() < 2.0);
    assert!((h2.weighted_mean_frequency() - 880.0).abs() < 2.0);
}

#[test]
fn channelize_f_and_2f_against_constant_reference() {
    let mut c: PartialCollection = vec![
        constant_partial(0, 440.0, 1.0, 0.0, 1.0),
        constant_partial(0, 880.0, 0.5, 0.0, 1.0),
    ]
    .into_iter()
    .collect();

    channelize(&mut c, &BreakpointEnvelope::constant(440.0), 1).unwrap();

    let labels: Vec<u32> = c.iter().map(|p| p.label()).collect();
    assert_eq!(labels, vec![1, 2]);
}

#[test]
fn sift_then_distill_leaves_one_partial_per_channel() {
    let mut c: PartialCollection = vec![
        constant_partial(1, 440.0, 1.0, 0.0, 1.0),
        constant_partial(1, 444.0, 0.3, 0.2, 0.8), // weaker contender
        constant_partial(1, 441.0, 0.9, 1.5, 2.0), // later, uncontested
        constant_partial(2, 880.0, 0.5, 0.0, 1.0),
    ]
    .into_iter()
    .collect();

    sift(&mut c);
    remove_labeled(&mut c, 0);
    distill(&mut c).unwrap();

    assert_eq!(c.labels(), vec![1, 2]);
    assert_eq!(c.len(), 2);

    // The channel-1 partial covers both retained spans, bridged over the gap.
    let h1 = c.iter().find(|p| p.label() == 1).unwrap();
    assert_eq!(h1.start_time(), 0.0);
    assert_eq!(h1.end_time(), 2.0);
    assert_eq!(h1.amplitude_at(1.25), 0.0);
}

#[test]
fn dilate_then_morph_matched_sounds() {
    let a: PartialCollection = vec![
        constant_partial(1, 440.0, 0.8, 0.2, 1.0),
        constant_partial(2, 880.0, 0.4, 0.2, 1.0),
    ]
    .into_iter()
    .collect();
    let b: PartialCollection = vec![
        constant_partial(1, 330.0, 0.6, 0.3, 1.2),
        constant_partial(2, 660.0, 0.3, 0.3, 1.2),
    ]
    .into_iter()
    .collect();

    // Align both onto a common time base before morphing.
    let mut a = a;
    let mut b = b;
    dilate(&mut a, &[0.2, 1.0], &[0.25, 1.1]).unwrap();
    dilate(&mut b, &[0.3, 1.2], &[0.25, 1.1]).unwrap();

    let mut weight = BreakpointEnvelope::new();
    weight.insert(0.25, 0.0);
    weight.insert(1.1, 1.0);
    let morphed = Morpher::uniform(weight).morph(&a, &b).unwrap();

    assert_eq!(morphed.labels(), vec![1, 2]);
    let h1 = morphed.iter().find(|p| p.label() == 1).unwrap();
    // Starts at the source frequency, ends at the target's.
    assert!((h1.frequency_at(0.25) - 440.0).abs() < 1.0);
    assert!((h1.frequency_at(1.1) - 330.0).abs() < 1.0);
}

#[test]
fn pitch_shift_after_distillation() {
    let mut c: PartialCollection = vec![
        constant_partial(1, 440.0, 1.0, 0.0, 1.0),
        constant_partial(2, 880.0, 0.5, 0.0, 1.0),
    ]
    .into_iter()
    .collect();

    distill(&mut c).unwrap();
    shift_pitch(&mut c, &BreakpointEnvelope::constant(-600.0)).unwrap();

    // -600 cents is a factor of 2^(-1/2).
    let expected = 440.0 * (-0.5_f64).exp2();
    let h1 = c.iter().find(|p| p.label() == 1).unwrap();
    let got = h1.first().unwrap().frequency;
    assert!(
        (got - expected).abs() < 1e-6,
        "got {got}, expected {expected}"
    );
}

#[test]
fn full_pipeline_morph_of_two_analyzed_tones() {
    let sample_rate = 44100.0;
    let clar = faded_tone(&[(330.0, 0.9), (660.0, 0.45)], 0.5, sample_rate);
    let flut = faded_tone(&[(294.0, 0.8), (588.0, 0.2)], 0.5, sample_rate);

    let mut analyzer = Analyzer::new(100.0);
    analyzer.config_mut().amp_floor_db = -50.0;

    let mut a = analyzer.analyze(&clar, sample_rate).unwrap();
    let ref_a = create_freq_reference(&a, 200.0, 450.0, 50).unwrap();
    channelize(&mut a, &ref_a, 1).unwrap();
    distill(&mut a).unwrap();

    let mut b = analyzer.analyze(&flut, sample_rate).unwrap();
    let ref_b = create_freq_reference(&b, 200.0, 450.0, 50).unwrap();
    channelize(&mut b, &ref_b, 1).unwrap();
    distill(&mut b).unwrap();

    let mut weight = BreakpointEnvelope::new();
    weight.insert(0.1, 0.0);
    weight.insert(0.4, 1.0);
    let morphed = Morpher::uniform(weight).morph(&a, &b).unwrap();

    assert!(!morphed.is_empty());
    let h1 = morphed.iter().find(|p| p.label() == 1).unwrap();
    // Early in the morph the fundamental is near the source's 330 Hz,
    // late it approaches the target's 294 Hz.
    assert!((h1.frequency_at(0.12) - 330.0).abs() < 8.0);
    assert!((h1.frequency_at(0.38) - 294.0).abs() < 8.0);
}
