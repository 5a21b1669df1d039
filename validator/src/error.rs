//! Validator error types

use thiserror::Error;

/// Rejections raised when a [`ValidationPolicy`](crate::ValidationPolicy) is
/// internally inconsistent. Sample problems are never errors; they are
/// reported through [`ValidationResult`](crate::ValidationResult).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PolicyError {
    #[error("{field} must be a positive finite number, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: i64 },

    #[error("coarse accuracy ({coarse}m) must not exceed maximum accuracy ({max}m)")]
    CoarseAboveMax { coarse: f64, max: f64 },

    #[error("quality bands must be increasing: excellent {excellent}m, good {good}m, fair {fair}m")]
    UnorderedQualityBands { excellent: f64, good: f64, fair: f64 },
}
