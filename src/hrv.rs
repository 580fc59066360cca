//! Time-domain Heart Rate Variability analysis. See `SPEC_FULL.md` §4.6.
//!
//! Generalizes the teacher's `domain::hrv` module (`calculate_rmssd` /
//! `calculate_sdnn` over BLE RR-intervals, built on the external `cardio_rs`
//! crate) from scalar sensor RR-intervals to the RR series derived from
//! detected R-peaks, with the ectopic-filter bounds and extra statistics
//! this spec calls for computed directly in terms of `crate::math`.

use crate::math::{diff, mean, sample_std_dev};
use crate::rhythm::rr_seconds;
use serde::{Deserialize, Serialize};
use tracing::instrument;

const ECTOPIC_MIN_MS: f64 = 300.0;
const ECTOPIC_MAX_MS: f64 = 1500.0;
const PNN50_THRESHOLD_MS: f64 = 50.0;
const SDNN_LOW_MS: f64 = 20.0;
const SDNN_HIGH_MS: f64 = 100.0;

/// Time-domain HRV statistics computed over NN (ectopic-filtered RR)
/// intervals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HrvMetrics {
    /// Standard deviation of NN intervals (Bessel's correction), in ms.
    pub sdnn_ms: f64,
    /// Root-mean-square of successive NN-interval differences, in ms.
    pub rmssd_ms: f64,
    /// Standard deviation of successive NN-interval differences, in ms.
    pub sdsd_ms: f64,
    /// Percentage of successive NN-interval differences exceeding 50 ms.
    pub pnn50: f64,
    /// Mean NN interval, in ms.
    pub mean_nn_ms: f64,
    /// Coefficient of variation, as a percentage (`100 * sdnn / mean_nn`).
    pub cv_percent: f64,
    /// Number of NN intervals retained after ectopic filtering.
    pub nn_count: usize,
    /// Number of RR intervals removed by the ectopic filter.
    pub ectopic_removed: usize,
    /// Human-readable interpretation of `sdnn_ms`.
    pub interpretation: String,
}

/// Computes HRV statistics from R-peak sample indices.
///
/// With fewer than 3 peaks, returns zeros with `"Insufficient data"`. With
/// fewer than 2 NN intervals after ectopic filtering, returns zeros with
/// `"High noise level - unstable RR"`.
#[instrument(skip(r_peaks), fields(n_peaks = r_peaks.len(), fs))]
pub fn hrv_metrics(r_peaks: &[usize], fs: f64) -> HrvMetrics {
    if r_peaks.len() < 3 {
        return HrvMetrics {
            interpretation: "Insufficient data".to_string(),
            ..Default::default()
        };
    }

    let rr_ms: Vec<f64> = rr_seconds(r_peaks, fs).iter().map(|s| s * 1000.0).collect();
    let nn: Vec<f64> = rr_ms
        .iter()
        .copied()
        .filter(|&rr| rr > ECTOPIC_MIN_MS && rr < ECTOPIC_MAX_MS)
        .collect();
    let ectopic_removed = rr_ms.len() - nn.len();

    if nn.len() < 2 {
        return HrvMetrics {
            nn_count: nn.len(),
            ectopic_removed,
            interpretation: "High noise level - unstable RR".to_string(),
            ..Default::default()
        };
    }

    let sdnn_ms = sample_std_dev(&nn);
    let diff_nn = diff(&nn);
    let rmssd_ms = (diff_nn.iter().map(|d| d * d).sum::<f64>() / diff_nn.len() as f64).sqrt();
    let sdsd_ms = {
        let m = mean(&diff_nn);
        (diff_nn.iter().map(|d| (d - m).powi(2)).sum::<f64>() / diff_nn.len() as f64).sqrt()
    };
    let pnn50 = 100.0
        * diff_nn.iter().filter(|d| d.abs() > PNN50_THRESHOLD_MS).count() as f64
        / diff_nn.len() as f64;
    let mean_nn_ms = mean(&nn);
    let cv_percent = if mean_nn_ms > 0.0 {
        100.0 * sdnn_ms / mean_nn_ms
    } else {
        0.0
    };

    let interpretation = if sdnn_ms < SDNN_LOW_MS {
        "Low HRV (Reduced variability)"
    } else if sdnn_ms < SDNN_HIGH_MS {
        "Normal range for short-term recording"
    } else {
        "High Variability"
    }
    .to_string();

    HrvMetrics {
        sdnn_ms,
        rmssd_ms,
        sdsd_ms,
        pnn50,
        mean_nn_ms,
        cv_percent,
        nn_count: nn.len(),
        ectopic_removed,
        interpretation,
    }
}
