//! Waveform-morphology measurement: QRS width and QT/QTc. See
//! `SPEC_FULL.md` §4.4 and §4.5.

use crate::math::{argmax, argmin, diff, mean, std_dev};
use crate::rhythm::rr_seconds;
use serde::{Deserialize, Serialize};
use tracing::instrument;

const Q_ONSET_SEARCH_SECS: f64 = 0.05;
const S_OFFSET_SEARCH_SECS: f64 = 0.08;
const FLAT_SLOPE_THRESHOLD_MV: f64 = 0.005;
const MIN_QRS_MS: f64 = 40.0;
const MAX_QRS_MS: f64 = 200.0;
const NARROW_QRS_MS: f64 = 60.0;
const WIDE_QRS_MS: f64 = 120.0;

const T_SEARCH_START_SECS: f64 = 0.04;
const T_SEARCH_END_SECS: f64 = 0.45;
const T_TANGENT_SECS: f64 = 0.1;
const Q_START_OFFSET_SECS: f64 = 0.03;
const MIN_QT_MS: f64 = 200.0;
const MAX_QT_MS: f64 = 600.0;
const QTC_RISK_MS: f64 = 470.0;
const QTC_NORMAL_MS: f64 = 450.0;
const QTC_PROLONGED_MS: f64 = 500.0;

/// QRS-width statistics across all beats for which a width could be measured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrsMetrics {
    /// Mean QRS duration in milliseconds across valid beats.
    pub mean_qrs_ms: f64,
    /// Standard deviation of QRS duration in milliseconds.
    pub std_qrs_ms: f64,
    /// Human-readable interpretation of `mean_qrs_ms`.
    pub interpretation: String,
}

/// QT/QTc statistics across all beats for which a QT interval could be measured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QtMetrics {
    /// Mean measured QT interval in milliseconds.
    pub mean_qt_ms: f64,
    /// Bazett-corrected QTc in milliseconds.
    pub mean_qtc_bazett_ms: f64,
    /// Whether `mean_qtc_bazett_ms` exceeds the long-QT risk threshold.
    pub risk_flag: bool,
    /// Human-readable interpretation of `mean_qtc_bazett_ms`.
    pub interpretation: String,
}

/// Measures QRS complex duration per R-peak and aggregates the result.
#[instrument(skip(cleaned, r_peaks), fields(n_peaks = r_peaks.len(), fs))]
pub fn measure_qrs_width(cleaned: &[f64], r_peaks: &[usize], fs: f64) -> QrsMetrics {
    let before = (Q_ONSET_SEARCH_SECS * fs).round() as usize;
    let after = (S_OFFSET_SEARCH_SECS * fs).round() as usize;
    let n = cleaned.len();

    let mut widths_ms = Vec::new();
    for &r in r_peaks {
        let lo = r.saturating_sub(before);
        let hi = (r + after).min(n);
        if hi <= lo {
            continue;
        }
        let seg = &cleaned[lo..hi];
        if seg.len() < 5 {
            continue;
        }
        let r_local = r - lo;

        let q_onset = find_q_onset(seg, r_local);
        let s_offset = find_s_offset(seg, r_local);

        let width_ms = (s_offset as f64 - q_onset as f64) * 1000.0 / fs;
        if width_ms > MIN_QRS_MS && width_ms < MAX_QRS_MS {
            widths_ms.push(width_ms);
        }
    }

    if widths_ms.is_empty() {
        return QrsMetrics {
            mean_qrs_ms: 80.0,
            std_qrs_ms: 0.0,
            interpretation: "Could not detect".to_string(),
        };
    }

    let mean_qrs_ms = mean(&widths_ms);
    let std_qrs_ms = std_dev(&widths_ms);
    let interpretation = if mean_qrs_ms >= WIDE_QRS_MS {
        "Wide QRS (BBB/Ventricular)"
    } else if mean_qrs_ms <= NARROW_QRS_MS {
        "Narrow (Normal)"
    } else {
        "Normal"
    }
    .to_string();

    QrsMetrics {
        mean_qrs_ms,
        std_qrs_ms,
        interpretation,
    }
}

/// Scans backward from the R-peak for the first flat (slowly-changing)
/// sample, per §4.4 step 2. Returns `0` if no such sample is found.
fn find_q_onset(seg: &[f64], r_local: usize) -> usize {
    let mut i = r_local;
    while i >= 1 {
        if i < r_local.saturating_sub(2) && (seg[i] - seg[i - 1]).abs() < FLAT_SLOPE_THRESHOLD_MV {
            return i;
        }
        i -= 1;
    }
    0
}

/// Scans forward from the S-trough for the first flat sample, per §4.4
/// step 3. Returns the last index of `seg` if no such sample is found.
fn find_s_offset(seg: &[f64], r_local: usize) -> usize {
    let tail = &seg[r_local..];
    let s_local = argmin(tail).unwrap_or(0);
    let start = r_local + s_local;
    for i in start..seg.len().saturating_sub(1) {
        if (seg[i + 1] - seg[i]).abs() < FLAT_SLOPE_THRESHOLD_MV {
            return i;
        }
    }
    seg.len() - 1
}

/// Measures QT interval per consecutive R-peak pair using the tangent
/// method for T-wave offset, then applies Bazett's correction.
#[instrument(skip(cleaned, r_peaks), fields(n_peaks = r_peaks.len(), fs))]
pub fn measure_qt(cleaned: &[f64], r_peaks: &[usize], fs: f64) -> QtMetrics {
    let n = cleaned.len();
    let mut qt_list = Vec::new();

    for w in r_peaks.windows(2) {
        let r_i = w[0];
        let t_start = r_i + (T_SEARCH_START_SECS * fs).round() as usize;
        let t_end_bound = r_i + (T_SEARCH_END_SECS * fs).round() as usize;
        if t_end_bound > n || t_start >= t_end_bound {
            continue;
        }

        let window = &cleaned[t_start..t_end_bound];
        let t_peak = match argmax(window) {
            Some(idx) => t_start + idx,
            None => continue,
        };

        let tangent_len = (T_TANGENT_SECS * fs).round() as usize;
        let tangent_end = (t_peak + tangent_len).min(n);
        if tangent_end <= t_peak + 1 {
            continue;
        }
        let tangent_region = &cleaned[t_peak..tangent_end];
        let diffs = diff(tangent_region);
        let Some(k) = argmin(&diffs) else { continue };
        let max_slope = diffs[k];
        if max_slope == 0.0 {
            continue;
        }

        let slope_sample = t_peak + k;
        let t_end = slope_sample as f64 - cleaned[slope_sample] / max_slope;

        let q_start = r_i as f64 - (Q_START_OFFSET_SECS * fs).round();
        let qt_ms = (t_end - q_start) * 1000.0 / fs;
        if qt_ms > MIN_QT_MS && qt_ms < MAX_QT_MS {
            qt_list.push(qt_ms);
        }
    }

    let mean_qt_ms = mean(&qt_list);
    let mean_rr_s = {
        let rr = rr_seconds(r_peaks, fs);
        if rr.is_empty() { 1.0 } else { mean(&rr) }
    };
    let mean_qtc_bazett_ms = if mean_rr_s > 0.0 {
        mean_qt_ms / mean_rr_s.sqrt()
    } else {
        0.0
    };
    let risk_flag = mean_qtc_bazett_ms > QTC_RISK_MS;
    let interpretation = if mean_qtc_bazett_ms < QTC_NORMAL_MS {
        "Normal"
    } else if mean_qtc_bazett_ms < QTC_PROLONGED_MS {
        "Prolonged QTc"
    } else {
        "High Risk (Long QT)"
    }
    .to_string();

    QtMetrics {
        mean_qt_ms,
        mean_qtc_bazett_ms,
        risk_flag,
        interpretation,
    }
}
