//! Morph demo: analyze two synthetic tones, label them, and morph between
//! them, printing the morphed fundamental's trajectory.
//!
//! Run with: cargo run -p sirena-morph --example morph_demo

use sirena_analysis::{Analyzer, create_freq_reference};
use sirena_core::BreakpointEnvelope;
use sirena_morph::{Morpher, channelize, distill};
use std::f64::consts::TAU;

fn tone(fundamental: f64, duration: f64, sample_rate: f64) -> Vec<f64> {
    let n = (duration * sample_rate) as usize;
    let ramp = (0.05 * sample_rate) as usize;
    (0..n)
        .map(|i| {
            let t = i as f64 / sample_rate;
            let fade = (i.min(n - i).min(ramp)) as f64 / ramp as f64;
            fade * (1..=4)
                .map(|h| (TAU * fundamental * h as f64 * t).cos() / h as f64)
                .sum::<f64>()
        })
        .collect()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let sample_rate = 44100.0;
    let mut analyzer = Analyzer::with_window(100.0, 200.0);
    analyzer.config_mut().amp_floor_db = -50.0;

    println!("analyzing 330 Hz tone");
    let mut src = analyzer.analyze(&tone(330.0, 1.0, sample_rate), sample_rate).expect("analysis");
    let src_ref = create_freq_reference(&src, 200.0, 450.0, 100).expect("reference");
    channelize(&mut src, &src_ref, 1).expect("channelize");
    distill(&mut src).expect("distill");

    println!("analyzing 294 Hz tone");
    let mut tgt = analyzer.analyze(&tone(294.0, 1.0, sample_rate), sample_rate).expect("analysis");
    let tgt_ref = create_freq_reference(&tgt, 200.0, 450.0, 100).expect("reference");
    channelize(&mut tgt, &tgt_ref, 1).expect("channelize");
    distill(&mut tgt).expect("distill");

    let mut weight = BreakpointEnvelope::new();
    weight.insert(0.2, 0.0);
    weight.insert(0.8, 1.0);

    println!("morphing");
    let morphed = Morpher::uniform(weight).morph(&src, &tgt).expect("morph");

    println!("\n{:>8} {:>12}", "time (s)", "f1 (Hz)");
    if let Some(h1) = morphed.iter().find(|p| p.label() == 1) {
        let mut t = 0.1;
        while t <= 0.9 {
            println!("{t:>8.2} {:>12.2}", h1.frequency_at(t));
            t += 0.1;
        }
    }
    println!("\n{} morphed partials", morphed.len());
}
