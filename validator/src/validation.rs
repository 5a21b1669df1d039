//! Structural and data-quality checks for a single sample

use crate::constants::*;
use crate::policy::ValidationPolicy;
use crate::sample::{LocationSample, RawSample};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of validating one sample.
///
/// `errors` are hard failures and make the sample unusable; `warnings` are soft
/// concerns that never block. Both keep the order in which checks ran.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    fn from_findings(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// Validate a sample against the default policy and the current wall clock.
pub fn validate_location(sample: &LocationSample) -> ValidationResult {
    validate_sample(sample, &ValidationPolicy::default(), Utc::now())
}

/// Validate a typed sample as of `now`.
pub fn validate_sample(
    sample: &LocationSample,
    policy: &ValidationPolicy,
    now: DateTime<Utc>,
) -> ValidationResult {
    validate_raw(&RawSample::from(sample), policy, now)
}

/// Validate a possibly incomplete sample as of `now`.
pub fn validate_raw(raw: &RawSample, policy: &ValidationPolicy, now: DateTime<Utc>) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    check_coordinate("latitude", raw.latitude, MIN_LATITUDE, MAX_LATITUDE, &mut errors);
    check_coordinate("longitude", raw.longitude, MIN_LONGITUDE, MAX_LONGITUDE, &mut errors);
    check_timestamp(raw.timestamp, policy, now, &mut errors, &mut warnings);
    if let Some(accuracy) = raw.accuracy {
        check_accuracy(accuracy, policy, &mut errors, &mut warnings);
    }

    ValidationResult::from_findings(errors, warnings)
}

fn check_coordinate(name: &str, value: Option<f64>, min: f64, max: f64, errors: &mut Vec<String>) {
    match value {
        None => errors.push(format!("{name} is required")),
        Some(v) if !v.is_finite() => errors.push(format!("{name} must be a finite number")),
        Some(v) if v < min || v > max => {
            errors.push(format!("{name} out of range: {v} (expected {min} to {max})"))
        }
        Some(_) => {}
    }
}

fn check_timestamp(
    timestamp: Option<i64>,
    policy: &ValidationPolicy,
    now: DateTime<Utc>,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    let Some(ts) = timestamp else {
        errors.push("timestamp is required".to_string());
        return;
    };

    // Epoch zero and below is what unset clocks and missing values decay to
    if ts <= 0 || ts > MAX_TIMESTAMP_MS || DateTime::from_timestamp_millis(ts).is_none() {
        errors.push(format!("timestamp is not a valid instant: {ts}"));
        return;
    }

    let now_ms = now.timestamp_millis();
    let ahead_ms = ts.saturating_sub(now_ms);
    if ahead_ms > policy.future_tolerance_secs.saturating_mul(1000) {
        warnings.push(format!(
            "timestamp is {}s in the future (clock skew)",
            ahead_ms / 1000
        ));
    }

    let age_ms = now_ms.saturating_sub(ts);
    if age_ms > policy.stale_after_secs.saturating_mul(1000) {
        warnings.push(format!(
            "stale location: sample is {} minutes old",
            age_ms / 60_000
        ));
    }
}

fn check_accuracy(
    accuracy: f64,
    policy: &ValidationPolicy,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    if !accuracy.is_finite() || accuracy < 0.0 {
        errors.push(format!("accuracy must be a non-negative number, got {accuracy}"));
    } else if accuracy > policy.max_accuracy_m {
        errors.push(format!(
            "accuracy of {accuracy}m exceeds the usable limit of {}m",
            policy.max_accuracy_m
        ));
    } else if accuracy > policy.coarse_accuracy_m {
        warnings.push(format!(
            "low accuracy: {accuracy}m is coarser than {}m",
            policy.coarse_accuracy_m
        ));
    }
}
