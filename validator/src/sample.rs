//! Location sample data structures

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the device obtained a fix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
    /// Satellite fix
    #[default]
    Gps,

    /// Cell tower / Wi-Fi positioning
    Network,

    /// Platform-fused provider
    Fused,

    /// Entered or picked by hand
    Manual,

    /// Anything the device reported that we don't recognise
    #[serde(other)]
    Unknown,
}

impl LocationSource {
    pub fn as_str(self) -> &'static str {
        match self {
            LocationSource::Gps => "gps",
            LocationSource::Network => "network",
            LocationSource::Fused => "fused",
            LocationSource::Manual => "manual",
            LocationSource::Unknown => "unknown",
        }
    }
}

impl fmt::Display for LocationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for LocationSource {
    type Err = std::convert::Infallible;

    /// Unrecognised tags map to [`LocationSource::Unknown`], matching deserialization.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "gps" => LocationSource::Gps,
            "network" => LocationSource::Network,
            "fused" => LocationSource::Fused,
            "manual" => LocationSource::Manual,
            _ => LocationSource::Unknown,
        })
    }
}

/// A single geolocation fix reported by a technician's device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSample {
    /// Degrees, -90 to 90
    pub latitude: f64,

    /// Degrees, -180 to 180
    pub longitude: f64,

    /// Horizontal accuracy radius in meters (smaller is better)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,

    /// Unix timestamp in milliseconds
    pub timestamp: i64,

    #[serde(default)]
    pub source: LocationSource,
}

impl LocationSample {
    pub fn new(latitude: f64, longitude: f64, timestamp: i64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: None,
            timestamp,
            source: LocationSource::default(),
        }
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    pub fn with_source(mut self, source: LocationSource) -> Self {
        self.source = source;
        self
    }
}

/// Sample as received from a client, before any field is known to be present.
///
/// Missing fields are reported as validation errors instead of failing
/// deserialization, so callers can explain exactly what was wrong.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSample {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub source: Option<LocationSource>,
}

impl From<&LocationSample> for RawSample {
    fn from(sample: &LocationSample) -> Self {
        Self {
            latitude: Some(sample.latitude),
            longitude: Some(sample.longitude),
            accuracy: sample.accuracy,
            timestamp: Some(sample.timestamp),
            source: Some(sample.source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_defaults_to_gps() {
        let sample: LocationSample =
            serde_json::from_str(r#"{"latitude": 12.9, "longitude": 77.6, "timestamp": 1700000000000}"#)
                .unwrap();
        assert_eq!(sample.source, LocationSource::Gps);
        assert_eq!(sample.accuracy, None);
    }

    #[test]
    fn test_unknown_source_tag() {
        let sample: LocationSample = serde_json::from_str(
            r#"{"latitude": 1.0, "longitude": 2.0, "timestamp": 1, "source": "bluetooth-beacon"}"#,
        )
        .unwrap();
        assert_eq!(sample.source, LocationSource::Unknown);
        assert_eq!("Manual".parse::<LocationSource>().unwrap(), LocationSource::Manual);
    }

    #[test]
    fn test_raw_sample_tolerates_missing_fields() {
        let raw: RawSample = serde_json::from_str(r#"{"longitude": 77.6}"#).unwrap();
        assert_eq!(raw.latitude, None);
        assert_eq!(raw.longitude, Some(77.6));
        assert_eq!(raw.timestamp, None);
    }

    #[test]
    fn test_sample_wire_shape() {
        let sample = LocationSample::new(12.9, 77.6, 1_700_000_000_000)
            .with_accuracy(5.0)
            .with_source(LocationSource::Network);
        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json["accuracy"], 5.0);
        assert_eq!(json["source"], "network");
        assert_eq!(json["timestamp"], 1_700_000_000_000i64);
    }
}
