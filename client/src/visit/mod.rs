//! Onsite visit logging: validate, geocode, persist

use crate::analysis::Auditor;
use crate::geocoding::ReverseGeocoder;
use crate::storage::{Database, NewVisitLog, VisitLog};
use chrono::{DateTime, Utc};
use location_validator::{LocationAssessment, LocationSample, LocationValidator, QualityTier};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{error, info, warn};

/// Milestones of a technician's trip to a ticket site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisitEvent {
    /// Left for the site
    Started,
    /// Arrived on site
    Reached,
    /// Work finished
    Ended,
    /// Back at base
    ReachedBack,
}

impl VisitEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            VisitEvent::Started => "STARTED",
            VisitEvent::Reached => "REACHED",
            VisitEvent::Ended => "ENDED",
            VisitEvent::ReachedBack => "REACHED_BACK",
        }
    }
}

impl fmt::Display for VisitEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unknown visit event: {0} (expected STARTED, REACHED, ENDED or REACHED_BACK)")]
pub struct UnknownVisitEvent(pub String);

impl FromStr for VisitEvent {
    type Err = UnknownVisitEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "STARTED" => Ok(VisitEvent::Started),
            "REACHED" => Ok(VisitEvent::Reached),
            "ENDED" => Ok(VisitEvent::Ended),
            "REACHED_BACK" => Ok(VisitEvent::ReachedBack),
            _ => Err(UnknownVisitEvent(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VisitRequest {
    pub ticket_id: String,
    pub user_id: String,
    pub event: VisitEvent,
    pub sample: LocationSample,
}

#[derive(Debug, Clone)]
pub enum VisitOutcome {
    Recorded {
        visit: VisitLog,
        assessment: LocationAssessment,
        /// Validation warnings plus anything that went wrong along the way
        warnings: Vec<String>,
    },
    Rejected {
        assessment: LocationAssessment,
        reason: String,
    },
}

/// Failures of the visit-log store. Location problems are never errors;
/// they come back as [`VisitOutcome::Rejected`].
#[derive(Error, Debug)]
pub enum VisitError {
    #[error("Visit log store failed: {0:#}")]
    Storage(anyhow::Error),
}

pub struct VisitRecorder<G> {
    db: Database,
    geocoder: G,
    validator: LocationValidator,
    auditor: Auditor,
    reject_unrealistic_jumps: bool,
}

impl<G: ReverseGeocoder> VisitRecorder<G> {
    pub fn new(
        db: Database,
        geocoder: G,
        validator: LocationValidator,
        auditor: Auditor,
        reject_unrealistic_jumps: bool,
    ) -> Self {
        Self {
            db,
            geocoder,
            validator,
            auditor,
            reject_unrealistic_jumps,
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub async fn record(&self, request: VisitRequest, now: DateTime<Utc>) -> Result<VisitOutcome, VisitError> {
        let previous = self.db.last_location(&request.user_id)
            .map_err(VisitError::Storage)?;

        let assessment = self.validator.assess(&request.sample, previous.as_ref(), now);

        if let Err(e) = self.auditor.review(
            &self.db,
            &request.ticket_id,
            &request.user_id,
            &assessment,
            self.validator.policy().max_speed_mps,
            now,
        ) {
            error!("Failed to write audit entry: {:#}", e);
        }

        if !assessment.is_valid() {
            let reason = assessment.validation.errors.join("; ");
            info!("Rejected {} for ticket {}: {}", request.event, request.ticket_id, reason);
            return Ok(VisitOutcome::Rejected { assessment, reason });
        }

        let jump_reason = assessment
            .jump
            .as_ref()
            .filter(|j| j.is_unrealistic)
            .map(|j| j.reason.clone().unwrap_or_else(|| "unrealistic movement".to_string()));

        if let (Some(reason), true) = (&jump_reason, self.reject_unrealistic_jumps) {
            let reason = format!("location jump: {reason}");
            info!("Rejected {} for ticket {}: {}", request.event, request.ticket_id, reason);
            return Ok(VisitOutcome::Rejected { assessment, reason });
        }

        let mut warnings = assessment.validation.warnings.clone();
        if let Some(reason) = &jump_reason {
            warnings.push(format!("location jump: {reason}"));
        }

        // Reverse geocoding is best effort: the visit is logged without an address on failure
        let sample = &request.sample;
        let address = match self.geocoder.reverse_geocode(sample.latitude, sample.longitude).await {
            Ok(result) => {
                if let Some(e) = result.error {
                    warnings.push(format!("no address found: {e}"));
                }
                result.address
            }
            Err(e) => {
                warn!("Reverse geocoding failed for ticket {}: {}", request.ticket_id, e);
                warnings.push(format!("reverse geocoding failed: {e}"));
                None
            }
        };

        let visit = self.db.store_visit(
            &NewVisitLog {
                ticket_id: request.ticket_id,
                user_id: request.user_id,
                event: request.event,
                sample: request.sample,
                address,
                quality: assessment.quality.unwrap_or(QualityTier::Unknown),
                jump_flagged: jump_reason.is_some(),
            },
            now,
        )
        .map_err(VisitError::Storage)?;

        info!(
            "Recorded {} for ticket {} by {} (visit #{}, quality {})",
            visit.event, visit.ticket_id, visit.user_id, visit.id, visit.quality
        );

        Ok(VisitOutcome::Recorded {
            visit,
            assessment,
            warnings,
        })
    }
}
