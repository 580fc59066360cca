use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ecg_core::{analyze, AnalysisOptions};

fn gaussian_bump(out: &mut [f64], center: usize, amplitude: f64, sigma_samples: f64) {
    let lo = center.saturating_sub((6.0 * sigma_samples) as usize);
    let hi = (center + (6.0 * sigma_samples) as usize).min(out.len());
    for i in lo..hi {
        let d = (i as f64 - center as f64) / sigma_samples;
        out[i] += amplitude * (-0.5 * d * d).exp();
    }
}

fn metronome(fs: f64, seconds: f64) -> Vec<f64> {
    let n = (seconds * fs) as usize;
    let mut out = vec![0.0; n];
    let period_samples = fs as usize;
    let mut center = period_samples / 2;
    while center < n {
        gaussian_bump(&mut out, center, 1.0, fs * 0.012);
        center += period_samples;
    }
    out
}

/// Benchmark `analyze` over a short (10s) recording at a typical 250 Hz
/// sample rate. Representative of a single-click demo run.
fn bench_analyze_10s(c: &mut Criterion) {
    let fs = 250.0;
    let samples = metronome(fs, 10.0);

    c.bench_function("analyze_10s_250hz", |b| {
        b.iter(|| analyze(black_box(&samples), black_box(fs), AnalysisOptions::default()))
    });
}

/// Benchmark `analyze` over a longer (60s) recording, the working set the
/// resource model in the specification budgets memory for.
fn bench_analyze_60s(c: &mut Criterion) {
    let fs = 250.0;
    let samples = metronome(fs, 60.0);

    c.bench_function("analyze_60s_250hz", |b| {
        b.iter(|| analyze(black_box(&samples), black_box(fs), AnalysisOptions::default()))
    });
}

/// Benchmark the preprocessor alone, the most filter-heavy stage (two
/// zero-phase IIR passes plus a moving-average baseline subtraction).
fn bench_preprocess_only(c: &mut Criterion) {
    let fs = 250.0;
    let samples = metronome(fs, 10.0);

    c.bench_function("preprocess_10s_250hz", |b| {
        b.iter(|| ecg_core::preprocess::preprocess(black_box(&samples), black_box(fs)))
    });
}

criterion_group!(benches, bench_analyze_10s, bench_analyze_60s, bench_preprocess_only);
criterion_main!(benches);
