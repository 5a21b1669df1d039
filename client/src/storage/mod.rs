//! SQLite visit-log storage

use crate::visit::VisitEvent;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use location_validator::{LocationSample, LocationSource, QualityTier};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;
use std::path::Path;
use tracing::info;

pub struct Database {
    conn: Connection,
}

/// Visit log about to be written
#[derive(Debug, Clone)]
pub struct NewVisitLog {
    pub ticket_id: String,
    pub user_id: String,
    pub event: VisitEvent,
    pub sample: LocationSample,
    pub address: Option<String>,
    pub quality: QualityTier,
    pub jump_flagged: bool,
}

/// Persisted visit log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitLog {
    pub id: i64,
    pub ticket_id: String,
    pub user_id: String,
    pub event: VisitEvent,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub source: LocationSource,
    /// Device timestamp of the sample, epoch milliseconds
    pub sample_timestamp: i64,
    pub address: Option<String>,
    pub quality: QualityTier,
    pub jump_flagged: bool,
    /// Server time the row was written, epoch seconds
    pub recorded_at: i64,
}

impl VisitLog {
    pub fn sample(&self) -> LocationSample {
        LocationSample {
            latitude: self.latitude,
            longitude: self.longitude,
            accuracy: self.accuracy,
            timestamp: self.sample_timestamp,
            source: self.source,
        }
    }
}

/// Audit trail entry for rejected or suspicious samples
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEvent {
    pub timestamp: i64,
    pub user_id: String,
    pub ticket_id: String,
    pub kind: String,
    pub message: String,
    pub value: Option<f64>,
    pub threshold: Option<f64>,
}

const VISIT_COLUMNS: &str = "id, ticket_id, user_id, event, latitude, longitude, accuracy, source,
    sample_timestamp, address, quality, jump_flagged, recorded_at";

impl Database {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)
            .context("Failed to open database")?;

        // Enable WAL mode for better concurrent read/write performance
        conn.pragma_update(None, "journal_mode", "WAL")
            .context("Failed to enable WAL mode")?;

        // Set busy timeout to 5 seconds (handles brief lock conflicts)
        conn.pragma_update(None, "busy_timeout", "5000")
            .context("Failed to set busy timeout")?;

        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .context("Failed to open in-memory database")?;
        Ok(Self { conn })
    }

    pub fn initialize(&self) -> Result<()> {
        info!("Initializing database schema");

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS visit_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ticket_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                event TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                accuracy REAL,
                source TEXT NOT NULL,
                sample_timestamp INTEGER NOT NULL,
                address TEXT,
                quality TEXT NOT NULL,
                jump_flagged INTEGER NOT NULL DEFAULT 0,
                recorded_at INTEGER NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_visit_ticket ON visit_logs(ticket_id)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_visit_user_time ON visit_logs(user_id, sample_timestamp)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_visit_recorded ON visit_logs(recorded_at)",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS audit_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp INTEGER NOT NULL,
                user_id TEXT NOT NULL,
                ticket_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                message TEXT NOT NULL,
                value REAL,
                threshold REAL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_events(timestamp)",
            [],
        )?;

        info!("Database schema initialized");

        Ok(())
    }

    pub fn store_visit(&self, visit: &NewVisitLog, recorded_at: DateTime<Utc>) -> Result<VisitLog> {
        let recorded_at = recorded_at.timestamp();
        let s = &visit.sample;

        self.conn.execute(
            "INSERT INTO visit_logs (
                ticket_id, user_id, event, latitude, longitude, accuracy, source,
                sample_timestamp, address, quality, jump_flagged, recorded_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                &visit.ticket_id,
                &visit.user_id,
                visit.event.as_str(),
                s.latitude,
                s.longitude,
                s.accuracy,
                s.source.as_str(),
                s.timestamp,
                &visit.address,
                visit.quality.as_str(),
                visit.jump_flagged,
                recorded_at,
            ],
        )
        .context("Failed to store visit log")?;

        Ok(VisitLog {
            id: self.conn.last_insert_rowid(),
            ticket_id: visit.ticket_id.clone(),
            user_id: visit.user_id.clone(),
            event: visit.event,
            latitude: s.latitude,
            longitude: s.longitude,
            accuracy: s.accuracy,
            source: s.source,
            sample_timestamp: s.timestamp,
            address: visit.address.clone(),
            quality: visit.quality,
            jump_flagged: visit.jump_flagged,
            recorded_at,
        })
    }

    /// Most recent sample logged by a technician, across all tickets
    pub fn last_location(&self, user_id: &str) -> Result<Option<LocationSample>> {
        let visit = self.conn.query_row(
            &format!(
                "SELECT {VISIT_COLUMNS} FROM visit_logs
                WHERE user_id = ?1
                ORDER BY sample_timestamp DESC, id DESC
                LIMIT 1"
            ),
            params![user_id],
            row_to_visit,
        )
        .optional()
        .context("Failed to query last known location")?;

        Ok(visit.map(|v| v.sample()))
    }

    pub fn visits_for_ticket(&self, ticket_id: &str) -> Result<Vec<VisitLog>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {VISIT_COLUMNS} FROM visit_logs
            WHERE ticket_id = ?1
            ORDER BY sample_timestamp ASC, id ASC"
        ))?;

        let visits = stmt.query_map(params![ticket_id], row_to_visit)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(visits)
    }

    /// Visits written between `start` and `end` (epoch seconds, inclusive)
    pub fn query_range(&self, start: i64, end: i64) -> Result<Vec<VisitLog>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {VISIT_COLUMNS} FROM visit_logs
            WHERE recorded_at >= ?1 AND recorded_at <= ?2
            ORDER BY recorded_at ASC, id ASC"
        ))?;

        let visits = stmt.query_map(params![start, end], row_to_visit)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(visits)
    }

    pub fn store_event(&self, event: &AuditEvent) -> Result<()> {
        self.conn.execute(
            "INSERT INTO audit_events (
                timestamp, user_id, ticket_id, kind, message, value, threshold
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                event.timestamp,
                &event.user_id,
                &event.ticket_id,
                &event.kind,
                &event.message,
                event.value,
                event.threshold,
            ],
        )?;

        Ok(())
    }

    pub fn query_events(&self, start: i64, end: i64) -> Result<Vec<AuditEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT timestamp, user_id, ticket_id, kind, message, value, threshold
            FROM audit_events
            WHERE timestamp >= ?1 AND timestamp <= ?2
            ORDER BY timestamp ASC, id ASC"
        )?;

        let events = stmt.query_map(params![start, end], |row| {
            Ok(AuditEvent {
                timestamp: row.get(0)?,
                user_id: row.get(1)?,
                ticket_id: row.get(2)?,
                kind: row.get(3)?,
                message: row.get(4)?,
                value: row.get(5)?,
                threshold: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

        Ok(events)
    }
}

fn row_to_visit(row: &Row<'_>) -> rusqlite::Result<VisitLog> {
    let event: String = row.get(3)?;
    let event = event
        .parse::<VisitEvent>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

    let source: String = row.get(7)?;
    let quality: String = row.get(10)?;

    Ok(VisitLog {
        id: row.get(0)?,
        ticket_id: row.get(1)?,
        user_id: row.get(2)?,
        event,
        latitude: row.get(4)?,
        longitude: row.get(5)?,
        accuracy: row.get(6)?,
        source: source.parse().unwrap_or_default(),
        sample_timestamp: row.get(8)?,
        address: row.get(9)?,
        quality: quality.parse().unwrap_or(QualityTier::Unknown),
        jump_flagged: row.get(11)?,
        recorded_at: row.get(12)?,
    })
}
