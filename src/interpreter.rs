//! Clinical interpreter: merges rate, morphology and HRV into a final
//! rhythm label and ordered warning list. See `SPEC_FULL.md` §4.7.

use crate::hrv::HrvMetrics;
use crate::morphology::{QrsMetrics, QtMetrics};
use crate::rhythm::WIDE_COMPLEX_TACHYCARDIA;
use tracing::instrument;

const WIDE_QRS_MS: f64 = 120.0;
const TACHYCARDIA_BPM: f64 = 100.0;
const LOW_HRV_FLOOR_MS: f64 = 0.0;
const LOW_HRV_CEIL_MS: f64 = 50.0;

/// Applies the three interpreter rules, in order, producing the final
/// rhythm label and an ordered list of warnings. Each rule reads disjoint
/// fields, so applying them in a different order never changes the result.
#[instrument(skip(qrs, qt, hrv))]
pub fn interpret(
    rhythm_label: &str,
    avg_bpm: f64,
    qrs: &QrsMetrics,
    qt: &QtMetrics,
    hrv: &HrvMetrics,
) -> (String, Vec<String>) {
    let mut warnings = Vec::new();
    let mut final_label = rhythm_label.to_string();

    if qrs.mean_qrs_ms > WIDE_QRS_MS && avg_bpm > TACHYCARDIA_BPM {
        final_label = WIDE_COMPLEX_TACHYCARDIA.to_string();
        warnings.push("Wide QRS with tachycardia requires immediate assessment".to_string());
    } else if qrs.mean_qrs_ms > WIDE_QRS_MS {
        warnings.push(qrs.interpretation.clone());
    }

    if qt.risk_flag {
        warnings.push(qt.interpretation.clone());
    }

    if hrv.sdnn_ms > LOW_HRV_FLOOR_MS && hrv.sdnn_ms < LOW_HRV_CEIL_MS {
        warnings.push("Low HRV detected - consider cardiac risk assessment".to_string());
    }

    (final_label, warnings)
}
