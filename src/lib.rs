//! Deterministic ECG analysis core: preprocessing, QRS detection, rhythm
//! classification, waveform morphology, and HRV, composed behind a single
//! `analyze` entry point.
//!
//! The core is synchronous, stateless and single-threaded per call; two
//! invocations on disjoint inputs never interfere. There is no I/O here -
//! callers are responsible for sourcing samples and for thread placement.

pub mod error;
pub mod filter;
pub mod hrv;
pub mod interpreter;
pub mod math;
pub mod morphology;
pub mod preprocess;
pub mod qrs;
pub mod rhythm;

use error::{sanitize_non_finite, AnalysisError};
use hrv::HrvMetrics;
use morphology::{QrsMetrics, QtMetrics};
use preprocess::FilterMetrics;
use qrs::DetectionMetrics;
use rhythm::RhythmMetrics;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Per-call options. `verbose` only affects tracing span levels; it never
/// changes a numeric output, preserving `analyze`'s determinism.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AnalysisOptions {
    pub verbose: bool,
}

/// The full result of one `analyze` call: the cleaned signal, detected
/// R-peaks, every metric bundle, and the clinical interpreter's output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub cleaned_signal: Vec<f64>,
    pub r_peak_indices: Vec<usize>,
    pub sample_rate: f64,
    pub num_samples: usize,
    pub filter_metrics: FilterMetrics,
    pub detection_metrics: DetectionMetrics,
    pub arrhythmia_metrics: RhythmMetrics,
    pub qrs_metrics: QrsMetrics,
    pub qt_metrics: QtMetrics,
    pub hrv_metrics: HrvMetrics,
    pub rhythm_status: String,
    pub clinical_warnings: Vec<String>,
}

/// Runs the full pipeline: preprocess -> detect R-peaks -> {rhythm,
/// morphology, HRV} -> clinical interpretation.
///
/// Short-circuits with `AnalysisError` only on the preprocessor's
/// `InsufficientData` / `BadConfig` checks; every stage after that never
/// fails, per each stage's own contract.
#[instrument(skip(samples), fields(n = samples.len(), fs, verbose = opts.verbose))]
pub fn analyze(
    samples: &[f64],
    fs: f64,
    opts: AnalysisOptions,
) -> Result<AnalysisResult, AnalysisError> {
    if opts.verbose {
        info!(n = samples.len(), fs, "starting analysis");
    }

    let (cleaned_signal, filter_metrics) = preprocess::preprocess(samples, fs)?;
    let (r_peak_indices, detection_metrics) = qrs::detect_r_peaks(&cleaned_signal, fs);

    let (rhythm_label, arrhythmia_metrics) = rhythm::classify_rhythm(&r_peak_indices, fs);
    let mut qrs_metrics = morphology::measure_qrs_width(&cleaned_signal, &r_peak_indices, fs);
    let mut qt_metrics = morphology::measure_qt(&cleaned_signal, &r_peak_indices, fs);
    let mut hrv_metrics = hrv::hrv_metrics(&r_peak_indices, fs);

    let mut numeric_warnings = Vec::new();
    qrs_metrics.mean_qrs_ms = sanitize_non_finite(
        qrs_metrics.mean_qrs_ms,
        "QRS width measurement produced a non-finite value",
        &mut numeric_warnings,
    );
    qt_metrics.mean_qtc_bazett_ms = sanitize_non_finite(
        qt_metrics.mean_qtc_bazett_ms,
        "QTc measurement produced a non-finite value",
        &mut numeric_warnings,
    );
    hrv_metrics.sdnn_ms = sanitize_non_finite(
        hrv_metrics.sdnn_ms,
        "HRV SDNN computation produced a non-finite value",
        &mut numeric_warnings,
    );

    let (rhythm_status, mut clinical_warnings) = interpreter::interpret(
        &rhythm_label,
        detection_metrics.avg_bpm,
        &qrs_metrics,
        &qt_metrics,
        &hrv_metrics,
    );
    clinical_warnings.extend(numeric_warnings);

    if opts.verbose {
        info!(
            num_peaks = detection_metrics.num_peaks,
            rhythm_status, "analysis complete"
        );
    }

    Ok(AnalysisResult {
        cleaned_signal,
        r_peak_indices,
        sample_rate: fs,
        num_samples: samples.len(),
        filter_metrics,
        detection_metrics,
        arrhythmia_metrics,
        qrs_metrics,
        qt_metrics,
        hrv_metrics,
        rhythm_status,
        clinical_warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gaussian_bump(out: &mut [f64], center: usize, amplitude: f64, sigma_samples: f64) {
        let lo = center.saturating_sub((6.0 * sigma_samples) as usize);
        let hi = (center + (6.0 * sigma_samples) as usize).min(out.len());
        for i in lo..hi {
            let d = (i as f64 - center as f64) / sigma_samples;
            out[i] += amplitude * (-0.5 * d * d).exp();
        }
    }

    fn metronome(fs: f64, seconds: f64, period_s: f64, amplitude: f64) -> Vec<f64> {
        let n = (seconds * fs) as usize;
        let mut out = vec![0.0; n];
        let period_samples = (period_s * fs) as usize;
        let mut center = period_samples / 2;
        while center < n {
            gaussian_bump(&mut out, center, amplitude, fs * 0.012);
            center += period_samples;
        }
        out
    }

    #[test]
    fn analyze_preserves_signal_length() {
        let fs = 250.0;
        let samples = metronome(fs, 10.0, 1.0, 1.0);
        let result = analyze(&samples, fs, AnalysisOptions::default()).unwrap();
        assert_eq!(result.cleaned_signal.len(), samples.len());
        assert_eq!(result.num_samples, samples.len());
    }

    #[test]
    fn analyze_rejects_insufficient_data() {
        let samples = vec![0.0; 3];
        assert!(matches!(
            analyze(&samples, 250.0, AnalysisOptions::default()),
            Err(AnalysisError::InsufficientData { .. })
        ));
    }

    #[test]
    fn analyze_rejects_bad_fs() {
        let samples = vec![0.0; 500];
        assert!(matches!(
            analyze(&samples, 0.5, AnalysisOptions::default()),
            Err(AnalysisError::BadConfig(_))
        ));
    }

    #[test]
    fn analyze_is_deterministic() {
        let fs = 250.0;
        let samples = metronome(fs, 10.0, 1.0, 1.0);
        let a = analyze(&samples, fs, AnalysisOptions::default()).unwrap();
        let b = analyze(&samples, fs, AnalysisOptions::default()).unwrap();
        assert_eq!(a.r_peak_indices, b.r_peak_indices);
        assert_eq!(a.cleaned_signal, b.cleaned_signal);
        assert_eq!(a.rhythm_status, b.rhythm_status);
    }

    #[test]
    fn verbose_option_does_not_change_numeric_output() {
        let fs = 250.0;
        let samples = metronome(fs, 10.0, 1.0, 1.0);
        let quiet = analyze(&samples, fs, AnalysisOptions { verbose: false }).unwrap();
        let loud = analyze(&samples, fs, AnalysisOptions { verbose: true }).unwrap();
        assert_eq!(quiet.r_peak_indices, loud.r_peak_indices);
        assert_eq!(quiet.cleaned_signal, loud.cleaned_signal);
    }

    #[test]
    fn flat_line_yields_insufficient_rhythm_and_no_peaks() {
        let fs = 250.0;
        let samples = vec![0.0; (10.0 * fs) as usize];
        let result = analyze(&samples, fs, AnalysisOptions::default()).unwrap();
        assert!(result.r_peak_indices.is_empty());
        assert_eq!(result.arrhythmia_metrics, RhythmMetrics::default());
        assert!(result.cleaned_signal.iter().all(|v| v.is_finite()));
    }
}
