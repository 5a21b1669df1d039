//! Validation pipeline: validity, then quality, then jump detection

use crate::error::PolicyError;
use crate::jump::{self, JumpResult};
use crate::policy::ValidationPolicy;
use crate::quality::QualityTier;
use crate::sample::{LocationSample, RawSample};
use crate::validation::{self, ValidationResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Combined verdict on one incoming sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationAssessment {
    pub validation: ValidationResult,

    /// Absent when the sample is invalid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualityTier>,

    /// Absent when the sample is invalid or there is no previous sample
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jump: Option<JumpResult>,
}

impl LocationAssessment {
    pub fn is_valid(&self) -> bool {
        self.validation.is_valid
    }

    pub fn is_jump(&self) -> bool {
        self.jump.as_ref().is_some_and(|j| j.is_unrealistic)
    }
}

/// A raw sample after validation, with the typed sample when it passed.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedSample {
    pub result: ValidationResult,
    pub sample: Option<LocationSample>,
}

/// Stateless validator bound to one policy. Cheap to clone and safe to share
/// across threads.
#[derive(Debug, Clone, Default)]
pub struct LocationValidator {
    policy: ValidationPolicy,
}

impl LocationValidator {
    pub fn new(policy: ValidationPolicy) -> Result<Self, PolicyError> {
        policy.check()?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    pub fn validate(&self, sample: &LocationSample, now: DateTime<Utc>) -> ValidationResult {
        validation::validate_sample(sample, &self.policy, now)
    }

    /// Validate a lenient input and build the typed sample when it passes.
    pub fn check_raw(&self, raw: &RawSample, now: DateTime<Utc>) -> CheckedSample {
        let result = validation::validate_raw(raw, &self.policy, now);
        let sample = match (result.is_valid, raw.latitude, raw.longitude, raw.timestamp) {
            (true, Some(latitude), Some(longitude), Some(timestamp)) => Some(LocationSample {
                latitude,
                longitude,
                accuracy: raw.accuracy,
                timestamp,
                source: raw.source.unwrap_or_default(),
            }),
            _ => None,
        };
        CheckedSample { result, sample }
    }

    pub fn quality(&self, sample: &LocationSample) -> QualityTier {
        QualityTier::from_accuracy(sample.accuracy, &self.policy.quality)
    }

    pub fn detect_jump(&self, previous: &LocationSample, next: &LocationSample) -> JumpResult {
        jump::detect_jump(previous, next, &self.policy, None)
    }

    /// Run the full pipeline. Invalid samples are never graded or compared,
    /// and neither is an invalid `previous`.
    pub fn assess(
        &self,
        sample: &LocationSample,
        previous: Option<&LocationSample>,
        now: DateTime<Utc>,
    ) -> LocationAssessment {
        let validation = self.validate(sample, now);
        if !validation.is_valid {
            return LocationAssessment {
                validation,
                quality: None,
                jump: None,
            };
        }

        let quality = Some(self.quality(sample));
        let jump = previous
            .filter(|p| validation::validate_sample(p, &self.policy, now).is_valid)
            .map(|p| self.detect_jump(p, sample));

        LocationAssessment {
            validation,
            quality,
            jump,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
    }

    fn at(lat: f64, lon: f64, offset_secs: i64) -> LocationSample {
        LocationSample::new(lat, lon, now().timestamp_millis() + offset_secs * 1000)
    }

    #[test]
    fn test_invalid_sample_stops_pipeline() {
        let validator = LocationValidator::default();
        let previous = at(12.9, 77.6, -60);
        let assessment = validator.assess(&at(91.0, 0.0, 0), Some(&previous), now());

        assert!(!assessment.is_valid());
        assert_eq!(assessment.quality, None);
        assert_eq!(assessment.jump, None);
    }

    #[test]
    fn test_clean_sample_without_history() {
        let validator = LocationValidator::default();
        let assessment = validator.assess(&at(12.9, 77.6, 0).with_accuracy(5.0), None, now());

        assert!(assessment.is_valid());
        assert!(assessment.validation.warnings.is_empty());
        assert_eq!(assessment.quality, Some(QualityTier::Excellent));
        assert_eq!(assessment.jump, None);
        assert!(!assessment.is_jump());
    }

    #[test]
    fn test_jump_against_previous() {
        let validator = LocationValidator::default();
        // Bengaluru to Chennai in ten minutes
        let previous = at(12.9716, 77.5946, -600);
        let sample = at(13.0827, 80.2707, 0).with_accuracy(8.0);
        let assessment = validator.assess(&sample, Some(&previous), now());

        assert!(assessment.is_valid());
        assert!(assessment.is_jump());
        let jump = assessment.jump.unwrap();
        assert_eq!(jump.time_elapsed, 600.0);
        assert!(jump.speed > 400.0);
    }

    #[test]
    fn test_invalid_previous_is_ignored() {
        let validator = LocationValidator::default();
        let previous = at(12.9, 200.0, -60);
        let assessment = validator.assess(&at(12.9, 77.6, 0), Some(&previous), now());
        assert!(assessment.is_valid());
        assert_eq!(assessment.jump, None);
    }

    #[test]
    fn test_policy_controls_pipeline() {
        let policy = ValidationPolicy {
            max_speed_mps: 5.0,
            ..Default::default()
        };
        let validator = LocationValidator::new(policy).unwrap();
        // ~1.1km in two minutes, about 9 m/s
        let assessment = validator.assess(&at(12.91, 77.6, 0), Some(&at(12.9, 77.6, -120)), now());
        assert!(assessment.is_jump());
    }

    #[test]
    fn test_new_rejects_bad_policy() {
        let policy = ValidationPolicy {
            max_accuracy_m: -1.0,
            ..Default::default()
        };
        assert!(LocationValidator::new(policy).is_err());
    }

    #[test]
    fn test_check_raw() {
        let validator = LocationValidator::default();
        let raw = RawSample {
            latitude: Some(12.9),
            longitude: Some(77.6),
            accuracy: Some(30.0),
            timestamp: Some(now().timestamp_millis()),
            source: None,
        };
        let checked = validator.check_raw(&raw, now());
        assert!(checked.result.is_valid);
        let sample = checked.sample.unwrap();
        assert_eq!(sample.source, crate::LocationSource::Gps);
        assert_eq!(validator.quality(&sample), QualityTier::Good);

        let checked = validator.check_raw(&RawSample::default(), now());
        assert!(!checked.result.is_valid);
        assert_eq!(checked.result.errors.len(), 3);
        assert_eq!(checked.sample, None);
    }

    #[test]
    fn test_validator_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LocationValidator>();
    }

    #[test]
    fn test_assessment_wire_shape() {
        let validator = LocationValidator::default();
        let assessment = validator.assess(&at(12.9, 77.6, 0).with_accuracy(5.0), None, now());
        let json = serde_json::to_value(&assessment).unwrap();
        assert_eq!(json["validation"]["isValid"], true);
        assert_eq!(json["quality"], "excellent");
        assert!(json.get("jump").is_none());
    }
}
