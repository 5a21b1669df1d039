//! Console output and visit-log export

use crate::geocoding::GeocodeResult;
use crate::storage::{AuditEvent, VisitLog};
use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use location_validator::LocationAssessment;
use std::path::Path;

pub fn print_assessment(assessment: &LocationAssessment) {
    let v = &assessment.validation;
    println!("valid:    {}", v.is_valid);
    for e in &v.errors {
        println!("  error:   {}", e);
    }
    for w in &v.warnings {
        println!("  warning: {}", w);
    }

    if let Some(quality) = assessment.quality {
        println!("quality:  {} ({})", quality, quality.description());
    }

    if let Some(jump) = &assessment.jump {
        println!(
            "movement: {:.0}m in {:.1}s ({:.1} m/s)",
            jump.distance, jump.time_elapsed, jump.speed
        );
        if let Some(reason) = &jump.reason {
            println!("  JUMP:    {}", reason);
        }
    }
}

pub fn print_geocode(result: &GeocodeResult) {
    match (&result.address, &result.error) {
        (Some(address), _) => println!("address:  {} [{}]", address, result.source),
        (None, Some(e)) => println!("address:  none ({}) [{}]", e, result.source),
        (None, None) => println!("address:  none [{}]", result.source),
    }
}

pub fn print_visit(v: &VisitLog) {
    println!(
        "[{}] #{} {} {:<12} {:.6},{:.6} {:<9}{} {}",
        format_time(v.recorded_at),
        v.id,
        v.ticket_id,
        v.event,
        v.latitude,
        v.longitude,
        v.quality,
        if v.jump_flagged { " JUMP" } else { "" },
        v.address.as_deref().unwrap_or("-"),
    );
}

pub fn print_audit_event(e: &AuditEvent) {
    println!(
        "[{}] {} ticket {} user {}: {}",
        format_time(e.timestamp),
        e.kind,
        e.ticket_id,
        e.user_id,
        e.message
    );
}

/// Local wall-clock rendering of an epoch-seconds timestamp
fn format_time(epoch_secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(epoch_secs, 0)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| epoch_secs.to_string())
}

/// Export visit logs as CSV
pub fn export_csv(visits: &[VisitLog], output_path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(output_path)?;

    // Write header
    writer.write_record([
        "id",
        "recorded_at",
        "ticket_id",
        "user_id",
        "event",
        "latitude",
        "longitude",
        "accuracy_m",
        "source",
        "sample_timestamp_ms",
        "quality",
        "jump_flagged",
        "address",
    ])?;

    for v in visits {
        writer.write_record(&[
            v.id.to_string(),
            v.recorded_at.to_string(),
            v.ticket_id.clone(),
            v.user_id.clone(),
            v.event.to_string(),
            format!("{:.6}", v.latitude),
            format!("{:.6}", v.longitude),
            v.accuracy.map(|a| format!("{:.1}", a)).unwrap_or_default(),
            v.source.to_string(),
            v.sample_timestamp.to_string(),
            v.quality.to_string(),
            v.jump_flagged.to_string(),
            v.address.clone().unwrap_or_default(),
        ])?;
    }

    writer.flush()?;

    Ok(())
}
