//! Audit trail for rejected and suspicious location samples

use crate::config::AuditConfig;
use crate::storage::{AuditEvent, Database};
use anyhow::Result;
use chrono::{DateTime, Utc};
use location_validator::LocationAssessment;
use tracing::warn;

pub const KIND_INVALID_LOCATION: &str = "invalid_location";
pub const KIND_LOCATION_JUMP: &str = "location_jump";

pub struct Auditor {
    config: AuditConfig,
}

impl Auditor {
    pub fn new(config: AuditConfig) -> Self {
        Self { config }
    }

    /// Log and persist anything noteworthy about an assessment.
    /// Returns the number of audit entries written.
    pub fn review(
        &self,
        db: &Database,
        ticket_id: &str,
        user_id: &str,
        assessment: &LocationAssessment,
        max_speed_mps: f64,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        if !self.config.enabled {
            return Ok(0);
        }

        let mut written = 0;

        if !assessment.is_valid() && self.config.log_invalid_samples {
            let message = assessment.validation.errors.join("; ");
            warn!("INVALID LOCATION: ticket {} user {} -> {}", ticket_id, user_id, message);

            db.store_event(&AuditEvent {
                timestamp: now.timestamp(),
                user_id: user_id.to_string(),
                ticket_id: ticket_id.to_string(),
                kind: KIND_INVALID_LOCATION.to_string(),
                message,
                value: None,
                threshold: None,
            })?;
            written += 1;
        }

        if let Some(jump) = assessment.jump.as_ref().filter(|j| j.is_unrealistic) {
            if self.config.log_jumps {
                let message = jump.reason.clone().unwrap_or_default();
                warn!(
                    "LOCATION JUMP: ticket {} user {} -> {:.0}m in {:.1}s ({:.1} m/s, limit {:.1} m/s)",
                    ticket_id, user_id, jump.distance, jump.time_elapsed, jump.speed, max_speed_mps
                );

                db.store_event(&AuditEvent {
                    timestamp: now.timestamp(),
                    user_id: user_id.to_string(),
                    ticket_id: ticket_id.to_string(),
                    kind: KIND_LOCATION_JUMP.to_string(),
                    message,
                    value: Some(jump.speed),
                    threshold: Some(max_speed_mps),
                })?;
                written += 1;
            }
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use location_validator::{LocationSample, LocationValidator};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
    }

    fn db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        db
    }

    fn jump_assessment() -> LocationAssessment {
        let t = now().timestamp_millis();
        let previous = LocationSample::new(12.9716, 77.5946, t - 60_000);
        let sample = LocationSample::new(13.0827, 80.2707, t);
        LocationValidator::default().assess(&sample, Some(&previous), now())
    }

    #[test]
    fn test_jump_is_audited() {
        let db = db();
        let auditor = Auditor::new(AuditConfig::default());

        let written = auditor.review(&db, "T-1", "tech-7", &jump_assessment(), 50.0, now()).unwrap();
        assert_eq!(written, 1);

        let events = db.query_events(0, i64::MAX).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, KIND_LOCATION_JUMP);
        assert_eq!(events[0].threshold, Some(50.0));
        assert!(events[0].value.unwrap() > 50.0);
    }

    #[test]
    fn test_invalid_sample_is_audited() {
        let db = db();
        let auditor = Auditor::new(AuditConfig::default());
        let sample = LocationSample::new(91.0, 0.0, now().timestamp_millis());
        let assessment = LocationValidator::default().assess(&sample, None, now());

        auditor.review(&db, "T-1", "tech-7", &assessment, 50.0, now()).unwrap();

        let events = db.query_events(0, i64::MAX).unwrap();
        assert_eq!(events[0].kind, KIND_INVALID_LOCATION);
        assert!(events[0].message.contains("latitude"));
    }

    #[test]
    fn test_disabled_audit_writes_nothing() {
        let db = db();
        let auditor = Auditor::new(AuditConfig {
            enabled: false,
            ..Default::default()
        });

        let written = auditor.review(&db, "T-1", "tech-7", &jump_assessment(), 50.0, now()).unwrap();
        assert_eq!(written, 0);
        assert!(db.query_events(0, i64::MAX).unwrap().is_empty());
    }
}
