//! CLI demo harness for the ECG analysis core.
//!
//! Generates a synthetic metronome ECG (or reads a plain-text one-float-
//! per-line file), runs `analyze`, and prints a formatted report. This
//! binary is test-fixture tooling, not the MIT-BIH/XML parser the core
//! explicitly excludes.

use clap::Parser;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};
use ecg_core::{analyze, AnalysisOptions, AnalysisResult};
use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

/// ECG analysis demo - runs the analysis core over synthetic or file-backed samples.
#[derive(Parser, Debug)]
#[command(name = "ecg-cli")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Plain-text file of millivolt samples, one float per line. When
    /// omitted, a synthetic metronome ECG is generated instead.
    input: Option<PathBuf>,

    /// Sampling frequency in Hz, used both for synthetic generation and
    /// when reading `input`.
    #[arg(long, default_value_t = 250.0)]
    fs: f64,

    /// Heart rate in BPM for the synthetic generator.
    #[arg(long, default_value_t = 60.0)]
    bpm: f64,

    /// Standard deviation of Gaussian noise added to the synthetic generator.
    #[arg(long, default_value_t = 0.0)]
    noise: f64,

    /// Duration in seconds for the synthetic generator.
    #[arg(long, default_value_t = 10.0)]
    seconds: f64,

    /// Enable verbose debug logging and raise pipeline spans to info level.
    #[arg(short, long, global = true)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("failed to set tracing subscriber");

    let samples = match &cli.input {
        Some(path) => match read_samples(path) {
            Ok(s) => s,
            Err(e) => {
                error!(%e, "failed to read input file");
                eprintln!("{} {e}", "error:".red().bold());
                return ExitCode::FAILURE;
            }
        },
        None => synthetic_metronome(cli.fs, cli.seconds, cli.bpm, cli.noise),
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message("processing");

    let opts = AnalysisOptions { verbose: cli.verbose };
    let result = analyze(&samples, cli.fs, opts);

    spinner.finish_and_clear();

    match result {
        Ok(report) => {
            print_report(&report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(%e, "analysis failed");
            eprintln!("{} {e}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

/// Reads a single-column plain-text file of millivolt samples, one float
/// per line. Performs no format sniffing; this is a stand-in for a real
/// parser, not a replacement for one.
fn read_samples(path: &PathBuf) -> std::io::Result<Vec<f64>> {
    let contents = fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .filter_map(|line| line.trim().parse::<f64>().ok())
        .collect())
}

/// Builds a synthetic ECG: a Gaussian QRS template repeated at `bpm`,
/// optionally perturbed with Gaussian-ish noise.
fn synthetic_metronome(fs: f64, seconds: f64, bpm: f64, noise_std: f64) -> Vec<f64> {
    let n = (seconds * fs) as usize;
    let mut out = vec![0.0; n];
    let period_samples = (60.0 / bpm * fs) as usize;
    let sigma = fs * 0.012;

    let mut center = period_samples / 2;
    while center < n {
        let lo = center.saturating_sub((6.0 * sigma) as usize);
        let hi = (center + (6.0 * sigma) as usize).min(n);
        for i in lo..hi {
            let d = (i as f64 - center as f64) / sigma;
            out[i] += (-0.5 * d * d).exp();
        }
        center += period_samples;
    }

    if noise_std > 0.0 {
        let mut rng = rand::thread_rng();
        for sample in out.iter_mut() {
            // sum of 12 uniforms, shifted and scaled, approximates a unit
            // Gaussian without pulling in an extra distribution crate.
            let u: f64 = (0..12).map(|_| rng.gen::<f64>()).sum::<f64>() - 6.0;
            *sample += u * noise_std;
        }
    }

    out
}

fn print_report(result: &AnalysisResult) {
    let severity = severity_color(&result.rhythm_status);
    println!(
        "\n{} {}\n",
        "Rhythm:".bold(),
        result.rhythm_status.color(severity).bold()
    );

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Metric bundle", "Field", "Value"]);

    table.add_row(vec!["Signal", "samples", &result.num_samples.to_string()]);
    table.add_row(vec!["Signal", "sample_rate_hz", &format!("{:.1}", result.sample_rate)]);
    table.add_row(vec!["Filter", "snr_db", &format!("{:.2}", result.filter_metrics.snr_db)]);
    table.add_row(vec![
        "Filter",
        "confidence_score",
        &format!("{:.1}", result.filter_metrics.confidence_score),
    ]);
    table.add_row(vec!["Detection", "num_peaks", &result.detection_metrics.num_peaks.to_string()]);
    table.add_row(vec!["Detection", "avg_bpm", &format!("{:.1}", result.detection_metrics.avg_bpm)]);
    table.add_row(vec!["Rhythm", "cv", &format!("{:.3}", result.arrhythmia_metrics.cv)]);
    table.add_row(vec!["QRS", "mean_qrs_ms", &format!("{:.1}", result.qrs_metrics.mean_qrs_ms)]);
    table.add_row(vec!["QRS", "interpretation", &result.qrs_metrics.interpretation]);
    table.add_row(vec!["QT", "mean_qtc_bazett_ms", &format!("{:.1}", result.qt_metrics.mean_qtc_bazett_ms)]);
    table.add_row(vec!["QT", "interpretation", &result.qt_metrics.interpretation]);
    table.add_row(vec!["HRV", "sdnn_ms", &format!("{:.1}", result.hrv_metrics.sdnn_ms)]);
    table.add_row(vec!["HRV", "rmssd_ms", &format!("{:.1}", result.hrv_metrics.rmssd_ms)]);
    table.add_row(vec!["HRV", "pnn50", &format!("{:.1}", result.hrv_metrics.pnn50)]);
    table.add_row(vec!["HRV", "interpretation", &result.hrv_metrics.interpretation]);

    println!("{table}");

    if !result.clinical_warnings.is_empty() {
        println!("\n{}", "Warnings:".yellow().bold());
        for warning in &result.clinical_warnings {
            println!("  {} {}", "-".yellow(), warning);
        }
    }
}

fn severity_color(label: &str) -> colored::Color {
    match label {
        "Normal Sinus Rhythm" => colored::Color::Green,
        "Borderline: Mild Irregularity" => colored::Color::Yellow,
        "Insufficient data" => colored::Color::BrightBlack,
        "Wide-Complex Tachycardia - URGENT EVALUATION" => colored::Color::Red,
        _ => colored::Color::Yellow,
    }
}
