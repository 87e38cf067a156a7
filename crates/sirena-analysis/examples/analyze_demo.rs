//! Analysis demo: analyze a synthetic harmonic tone and print its partials.
//!
//! Run with: cargo run -p sirena-analysis --example analyze_demo

use sirena_analysis::{Analyzer, create_freq_reference};
use std::f64::consts::TAU;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let sample_rate = 44100.0;
    let fundamental = 220.0;

    // One second of a decaying 5-harmonic tone.
    let n = sample_rate as usize;
    let samples: Vec<f64> = (0..n)
        .map(|i| {
            let t = i as f64 / sample_rate;
            let decay = (-2.0 * t).exp();
            (1..=5)
                .map(|h| decay * (TAU * fundamental * h as f64 * t).cos() / h as f64)
                .sum()
        })
        .collect();

    let mut analyzer = Analyzer::with_window(100.0, 200.0);
    analyzer.build_fundamental_env(100.0, 400.0);

    let partials = analyzer.analyze(&samples, sample_rate).expect("analysis");

    println!("=== Partials ===\n");
    println!(
        "{:>6} {:>10} {:>10} {:>10} {:>8}",
        "idx", "freq (Hz)", "amp", "bw", "span (s)"
    );
    for (i, partial) in partials.iter().enumerate() {
        println!(
            "{:>6} {:>10.1} {:>10.4} {:>10.4} {:>8.3}",
            i,
            partial.weighted_mean_frequency(),
            partial.mean_amplitude(),
            partial.mean_bandwidth(),
            partial.duration(),
        );
    }

    let f0 = analyzer.fundamental_env();
    if !f0.is_empty() {
        println!(
            "\nEstimated fundamental mid-tone: {:.2} Hz (expected {fundamental})",
            f0.value_at(0.5)
        );
    }

    match create_freq_reference(&partials, 150.0, 300.0, 50) {
        Ok(reference) => println!(
            "Reference envelope mid-tone: {:.2} Hz",
            reference.value_at(0.5)
        ),
        Err(err) => println!("No reference: {err}"),
    }
}
