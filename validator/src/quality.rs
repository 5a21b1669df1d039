//! Accuracy-based quality grading

use crate::policy::{QualityThresholds, ValidationPolicy};
use crate::sample::LocationSample;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse trust bucket for a single sample.
///
/// Variants are declared worst to best so the derived ordering can be used
/// directly: `QualityTier::Poor < QualityTier::Excellent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// No usable accuracy was reported
    Unknown,
    Poor,
    Fair,
    Good,
    Excellent,
}

impl QualityTier {
    /// Grade an accuracy radius (meters) against the given bands.
    pub fn from_accuracy(accuracy: Option<f64>, bands: &QualityThresholds) -> Self {
        match accuracy {
            Some(a) if !a.is_finite() || a < 0.0 => QualityTier::Unknown,
            Some(a) if a <= bands.excellent_m => QualityTier::Excellent,
            Some(a) if a <= bands.good_m => QualityTier::Good,
            Some(a) if a <= bands.fair_m => QualityTier::Fair,
            Some(_) => QualityTier::Poor,
            None => QualityTier::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QualityTier::Unknown => "unknown",
            QualityTier::Poor => "poor",
            QualityTier::Fair => "fair",
            QualityTier::Good => "good",
            QualityTier::Excellent => "excellent",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            QualityTier::Excellent => "precise fix, suitable for check-in",
            QualityTier::Good => "reliable fix",
            QualityTier::Fair => "usable, but may be off by a building or two",
            QualityTier::Poor => "coarse fix, treat position as approximate",
            QualityTier::Unknown => "no accuracy reported",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for QualityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "excellent" => Ok(QualityTier::Excellent),
            "good" => Ok(QualityTier::Good),
            "fair" => Ok(QualityTier::Fair),
            "poor" => Ok(QualityTier::Poor),
            "unknown" => Ok(QualityTier::Unknown),
            other => Err(format!("unknown quality tier: {other}")),
        }
    }
}

/// Grade a sample with the default bands.
pub fn get_location_quality(sample: &LocationSample) -> QualityTier {
    QualityTier::from_accuracy(sample.accuracy, &ValidationPolicy::default().quality)
}
