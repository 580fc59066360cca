//! Rhythm classifier: labels a rhythm from R-peak timing alone. See
//! `SPEC_FULL.md` §4.3.

use crate::math::{diff, mean, std_dev};
use serde::{Deserialize, Serialize};

/// Summary statistics over RR intervals, used to pick the rhythm label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct RhythmMetrics {
    /// Coefficient of variation of RR intervals (`std / mean`).
    pub cv: f64,
    /// Mean heart rate in BPM, averaged per-interval (`mean(60/rr)`).
    pub mean_hr: f64,
    /// Mean RR interval in milliseconds.
    pub mean_rr_ms: f64,
    /// Standard deviation of RR intervals in milliseconds.
    pub std_rr_ms: f64,
}

/// The closed set of rhythm labels this crate ever returns.
pub const INSUFFICIENT_DATA: &str = "Insufficient data";
pub const NORMAL_SINUS_RHYTHM: &str = "Normal Sinus Rhythm";
pub const BRADYCARDIA: &str = "Bradycardia";
pub const TACHYCARDIA: &str = "Tachycardia";
pub const BORDERLINE_MILD_IRREGULARITY: &str = "Borderline: Mild Irregularity";
pub const FLAGGED_IRREGULAR_RHYTHM: &str = "Flagged: Irregular Rhythm";
pub const WIDE_COMPLEX_TACHYCARDIA: &str = "Wide-Complex Tachycardia - URGENT EVALUATION";

const IRREGULAR_CV_THRESHOLD: f64 = 0.15;
const BORDERLINE_CV_THRESHOLD: f64 = 0.08;
const BRADYCARDIA_BPM: f64 = 60.0;
const TACHYCARDIA_BPM: f64 = 100.0;

/// Classifies the rhythm from R-peak sample indices. With fewer than 3
/// peaks, returns [`INSUFFICIENT_DATA`] and zeroed metrics.
pub fn classify_rhythm(r_peaks: &[usize], fs: f64) -> (String, RhythmMetrics) {
    if r_peaks.len() < 3 {
        return (INSUFFICIENT_DATA.to_string(), RhythmMetrics::default());
    }

    let rr_s: Vec<f64> = r_peaks
        .windows(2)
        .map(|w| (w[1] - w[0]) as f64 / fs)
        .collect();
    let mean_rr = mean(&rr_s);
    let std_rr = std_dev(&rr_s);
    let cv = if mean_rr > 0.0 { std_rr / mean_rr } else { 0.0 };
    let mean_hr = mean(&rr_s.iter().map(|rr| 60.0 / rr).collect::<Vec<_>>());

    let label = if cv >= IRREGULAR_CV_THRESHOLD {
        FLAGGED_IRREGULAR_RHYTHM
    } else if mean_hr < BRADYCARDIA_BPM {
        BRADYCARDIA
    } else if mean_hr > TACHYCARDIA_BPM {
        TACHYCARDIA
    } else if cv >= BORDERLINE_CV_THRESHOLD {
        BORDERLINE_MILD_IRREGULARITY
    } else {
        NORMAL_SINUS_RHYTHM
    };

    let metrics = RhythmMetrics {
        cv,
        mean_hr,
        mean_rr_ms: mean_rr * 1000.0,
        std_rr_ms: std_rr * 1000.0,
    };

    (label.to_string(), metrics)
}

/// RR intervals in seconds for R-peak indices; exposed for use by the
/// morphology and HRV stages that also need raw RR series.
pub fn rr_seconds(r_peaks: &[usize], fs: f64) -> Vec<f64> {
    let indices: Vec<f64> = r_peaks.iter().map(|&p| p as f64).collect();
    diff(&indices).iter().map(|d| d / fs).collect()
}
