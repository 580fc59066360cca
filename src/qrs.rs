//! Pan-Tompkins QRS detector with adaptive thresholding. See
//! `SPEC_FULL.md` §4.2.

use crate::filter::design_butterworth_bandpass;
use crate::math::{argmax, boxcar_integrate, five_point_derivative, mean, percentile, std_dev};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

const QRS_BANDPASS_ORDER: usize = 2;
const QRS_BANDPASS_LOW_HZ: f64 = 5.0;
const QRS_BANDPASS_HIGH_HZ: f64 = 15.0;
const INTEGRATION_WINDOW_SECS: f64 = 0.120;
const REFRACTORY_SECS: f64 = 0.2;
const RELOCATE_WINDOW_SECS: f64 = 0.08;
const THRESHOLD_PERCENTILE: f64 = 98.0;
const THRESHOLD_SCALE: f64 = 0.6;
const SIGNAL_NOISE_WINDOW: usize = 8;
const THRESHOLD_ALPHA: f64 = 0.40;
const AMPLITUDE_GATE_SCALE: f64 = 0.5;

/// Detection-quality metrics for the accepted R-peaks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionMetrics {
    /// Number of accepted R-peaks.
    pub num_peaks: usize,
    /// Mean heart rate in beats per minute. `0.0` with fewer than 2 peaks.
    pub avg_bpm: f64,
    /// Mean RR interval in seconds.
    pub avg_rr_s: f64,
    /// Standard deviation of RR intervals in seconds.
    pub rr_std_s: f64,
    /// The adaptive threshold's value after the last update.
    pub final_threshold: f64,
}

/// Detects R-peak sample indices in a preprocessed (cleaned) ECG signal.
///
/// Never fails: returns an empty peak list if nothing passes the amplitude
/// gate, rather than an error, matching §4.2's "never fails" contract.
#[instrument(skip(cleaned), fields(n = cleaned.len(), fs))]
pub fn detect_r_peaks(cleaned: &[f64], fs: f64) -> (Vec<usize>, DetectionMetrics) {
    let n = cleaned.len();
    if n < 5 {
        warn!("signal too short for QRS-band filtering, returning no peaks");
        return (Vec::new(), empty_metrics());
    }

    let qrs_filter =
        match design_butterworth_bandpass(QRS_BANDPASS_ORDER, QRS_BANDPASS_LOW_HZ, QRS_BANDPASS_HIGH_HZ, fs) {
            Ok(f) => f,
            Err(e) => {
                warn!(%e, "QRS-band filter design failed, returning no peaks");
                return (Vec::new(), empty_metrics());
            }
        };
    let band_limited = qrs_filter.filtfilt(cleaned);

    let derivative = five_point_derivative(&band_limited, fs);
    let squared: Vec<f64> = derivative.iter().map(|d| d * d).collect();

    let integration_window = (INTEGRATION_WINDOW_SECS * fs).round().max(1.0) as usize;
    let integrated = boxcar_integrate(&squared, integration_window);

    let refractory = (REFRACTORY_SECS * fs).round().max(1.0) as usize;
    let relocate_w = (RELOCATE_WINDOW_SECS * fs).round().max(1.0) as usize;
    let signal_std = std_dev(cleaned);
    let amplitude_floor = AMPLITUDE_GATE_SCALE * signal_std;

    let mut threshold = THRESHOLD_SCALE * percentile(&integrated, THRESHOLD_PERCENTILE);
    let mut signal_peaks: Vec<f64> = Vec::new();
    let mut noise_peaks: Vec<f64> = Vec::new();
    let mut r_peaks: Vec<usize> = Vec::new();
    let mut last_peak: Option<usize> = None;

    for i in 1..n - 1 {
        let is_local_max = integrated[i] > integrated[i - 1] && integrated[i] > integrated[i + 1];
        if !is_local_max {
            continue;
        }

        let within_refractory = last_peak.is_some_and(|lp| i <= lp + refractory);
        if integrated[i] > threshold && !within_refractory {
            let lo = i.saturating_sub(relocate_w);
            let hi = (i + relocate_w).min(n);
            let window = &cleaned[lo..hi];
            let local_idx = argmax(window).unwrap_or(0);
            let actual = lo + local_idx;

            if cleaned[actual] > amplitude_floor {
                signal_peaks.push(integrated[i]);
                r_peaks.push(actual);
                last_peak = Some(actual);

                let tail_signal = tail_mean(&signal_peaks, SIGNAL_NOISE_WINDOW);
                let tail_noise = if noise_peaks.is_empty() {
                    0.0
                } else {
                    tail_mean(&noise_peaks, SIGNAL_NOISE_WINDOW)
                };
                threshold = tail_noise + THRESHOLD_ALPHA * (tail_signal - tail_noise);
            }
        } else if integrated[i] <= threshold {
            noise_peaks.push(integrated[i]);
        }
    }

    debug!(num_peaks = r_peaks.len(), final_threshold = threshold, "QRS detection complete");

    let metrics = detection_metrics(&r_peaks, fs, threshold);
    (r_peaks, metrics)
}

fn tail_mean(data: &[f64], window: usize) -> f64 {
    let start = data.len().saturating_sub(window);
    mean(&data[start..])
}

fn detection_metrics(r_peaks: &[usize], fs: f64, final_threshold: f64) -> DetectionMetrics {
    if r_peaks.len() < 2 {
        return DetectionMetrics {
            num_peaks: r_peaks.len(),
            avg_bpm: 0.0,
            avg_rr_s: 0.0,
            rr_std_s: 0.0,
            final_threshold,
        };
    }
    let rr_s: Vec<f64> = r_peaks
        .windows(2)
        .map(|w| (w[1] - w[0]) as f64 / fs)
        .collect();
    let avg_rr = mean(&rr_s);
    let avg_bpm = if avg_rr > 0.0 { 60.0 / avg_rr } else { 0.0 };
    let rr_std_s = std_dev(&rr_s);

    DetectionMetrics {
        num_peaks: r_peaks.len(),
        avg_bpm,
        avg_rr_s: avg_rr,
        rr_std_s,
        final_threshold,
    }
}

fn empty_metrics() -> DetectionMetrics {
    DetectionMetrics {
        num_peaks: 0,
        avg_bpm: 0.0,
        avg_rr_s: 0.0,
        rr_std_s: 0.0,
        final_threshold: 0.0,
    }
}
