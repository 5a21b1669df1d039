//! Tunable thresholds for validation, grading and jump detection

use crate::constants::*;
use crate::error::PolicyError;
use serde::{Deserialize, Serialize};

/// Accuracy bands (meters, inclusive upper bounds) for each quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityThresholds {
    pub excellent_m: f64,
    pub good_m: f64,
    pub fair_m: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            excellent_m: DEFAULT_EXCELLENT_ACCURACY_M,
            good_m: DEFAULT_GOOD_ACCURACY_M,
            fair_m: DEFAULT_FAIR_ACCURACY_M,
        }
    }
}

/// Every policy constant the validator consults. Fields left out of a
/// config file keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    pub future_tolerance_secs: i64,
    pub stale_after_secs: i64,
    pub coarse_accuracy_m: f64,
    pub max_accuracy_m: f64,
    pub max_speed_mps: f64,
    pub stationary_distance_m: f64,
    pub quality: QualityThresholds,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            future_tolerance_secs: DEFAULT_FUTURE_TOLERANCE_SECS,
            stale_after_secs: DEFAULT_STALE_AFTER_SECS,
            coarse_accuracy_m: DEFAULT_COARSE_ACCURACY_M,
            max_accuracy_m: DEFAULT_MAX_ACCURACY_M,
            max_speed_mps: DEFAULT_MAX_SPEED_MPS,
            stationary_distance_m: DEFAULT_STATIONARY_DISTANCE_M,
            quality: QualityThresholds::default(),
        }
    }
}

impl ValidationPolicy {
    /// Reject inconsistent overrides before they reach the validator.
    pub fn check(&self) -> Result<(), PolicyError> {
        for (field, value) in [
            ("coarse_accuracy_m", self.coarse_accuracy_m),
            ("max_accuracy_m", self.max_accuracy_m),
            ("max_speed_mps", self.max_speed_mps),
            ("quality.excellent_m", self.quality.excellent_m),
            ("quality.good_m", self.quality.good_m),
            ("quality.fair_m", self.quality.fair_m),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(PolicyError::NotPositive { field, value });
            }
        }

        // Zero is allowed here: only exact duplicates count as stationary
        if !self.stationary_distance_m.is_finite() || self.stationary_distance_m < 0.0 {
            return Err(PolicyError::NotPositive {
                field: "stationary_distance_m",
                value: self.stationary_distance_m,
            });
        }

        for (field, value) in [
            ("future_tolerance_secs", self.future_tolerance_secs),
            ("stale_after_secs", self.stale_after_secs),
        ] {
            if value < 0 {
                return Err(PolicyError::Negative { field, value });
            }
        }

        if self.coarse_accuracy_m > self.max_accuracy_m {
            return Err(PolicyError::CoarseAboveMax {
                coarse: self.coarse_accuracy_m,
                max: self.max_accuracy_m,
            });
        }

        let q = &self.quality;
        if !(q.excellent_m <= q.good_m && q.good_m <= q.fair_m) {
            return Err(PolicyError::UnorderedQualityBands {
                excellent: q.excellent_m,
                good: q.good_m,
                fair: q.fair_m,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_consistent() {
        let policy = ValidationPolicy::default();
        assert!(policy.check().is_ok());
        assert_eq!(policy.max_speed_mps, 50.0);
        assert_eq!(policy.quality.excellent_m, 10.0);
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let policy: ValidationPolicy = toml::from_str(
            r#"
            max_speed_mps = 40.0

            [quality]
            fair_m = 150.0
            "#,
        )
        .unwrap();

        assert_eq!(policy.max_speed_mps, 40.0);
        assert_eq!(policy.quality.fair_m, 150.0);
        assert_eq!(policy.quality.good_m, DEFAULT_GOOD_ACCURACY_M);
        assert_eq!(policy.stale_after_secs, DEFAULT_STALE_AFTER_SECS);
    }

    #[test]
    fn test_rejects_bad_overrides() {
        let policy = ValidationPolicy {
            max_speed_mps: 0.0,
            ..Default::default()
        };
        assert_eq!(
            policy.check(),
            Err(PolicyError::NotPositive { field: "max_speed_mps", value: 0.0 })
        );

        let policy = ValidationPolicy {
            coarse_accuracy_m: 6000.0,
            ..Default::default()
        };
        assert!(matches!(policy.check(), Err(PolicyError::CoarseAboveMax { .. })));

        let policy = ValidationPolicy {
            quality: QualityThresholds { excellent_m: 60.0, good_m: 50.0, fair_m: 100.0 },
            ..Default::default()
        };
        assert!(matches!(policy.check(), Err(PolicyError::UnorderedQualityBands { .. })));

        let policy = ValidationPolicy {
            stale_after_secs: -1,
            ..Default::default()
        };
        assert!(matches!(policy.check(), Err(PolicyError::Negative { .. })));
    }
}
