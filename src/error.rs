//! Error types for the ECG analysis core.
//!
//! Only the two short-circuiting failure kinds described in the design are
//! modeled as `Err` variants. A `NumericFailure` is non-fatal by definition:
//! it is handled in place by [`sanitize_non_finite`] and surfaces as a
//! warning string inside a successful `AnalysisResult`, never as an error
//! returned from `analyze`.

use thiserror::Error;

/// Errors that can short-circuit the analysis pipeline.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    /// The input sample count is below what a stage needs to run.
    #[error("insufficient data: need at least {needed} samples, got {got}")]
    InsufficientData {
        /// Minimum sample count the failing stage requires.
        needed: usize,
        /// Sample count actually supplied.
        got: usize,
    },

    /// The caller supplied a sampling frequency or filter configuration that
    /// cannot produce a valid filter design.
    #[error("bad config: {0}")]
    BadConfig(String),
}

/// Replaces any non-finite (`NaN`/`Infinity`) value in `value` with `0.0` and
/// appends `warning` to `warnings` if a replacement happened.
///
/// This is the crate-wide implementation of the `NumericFailure` handling
/// rule: morphology and HRV stages are non-fatal, so instead of returning an
/// error they zero the offending field and record why.
pub fn sanitize_non_finite(value: f64, warning: &str, warnings: &mut Vec<String>) -> f64 {
    if value.is_finite() {
        value
    } else {
        warnings.push(warning.to_string());
        0.0
    }
}
