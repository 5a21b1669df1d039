//! Jump detection between consecutive samples of the same technician

use crate::policy::ValidationPolicy;
use crate::sample::LocationSample;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Movement implied by two consecutive samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JumpResult {
    pub is_unrealistic: bool,

    /// Great-circle distance in meters
    pub distance: f64,

    /// Implied speed in m/s; 0 when elapsed time is not positive
    pub speed: f64,

    /// Seconds from `previous` to `next`. Negative when the samples were
    /// supplied out of order.
    pub time_elapsed: f64,

    /// Which limit was exceeded; only set when `is_unrealistic`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Detect a jump with the default policy.
///
/// `max_speed_mps` overrides the default speed limit; non-finite or
/// non-positive overrides are ignored.
pub fn detect_location_jump(
    previous: &LocationSample,
    next: &LocationSample,
    max_speed_mps: Option<f64>,
) -> JumpResult {
    detect_jump(previous, next, &ValidationPolicy::default(), max_speed_mps)
}

/// Detect a jump using the limits of `policy`.
///
/// Both samples are expected to be structurally valid and ordered by time.
/// When `next` is not strictly later than `previous` the pair is degenerate:
/// it is a duplicate (realistic) if the points are within
/// `policy.stationary_distance_m` of each other, and unrealistic otherwise.
pub fn detect_jump(
    previous: &LocationSample,
    next: &LocationSample,
    policy: &ValidationPolicy,
    max_speed_mps: Option<f64>,
) -> JumpResult {
    let max_speed = match max_speed_mps {
        Some(s) if s.is_finite() && s > 0.0 => s,
        Some(s) => {
            warn!("Ignoring invalid speed limit {} m/s, using {} m/s", s, policy.max_speed_mps);
            policy.max_speed_mps
        }
        None => policy.max_speed_mps,
    };

    let distance = previous.distance_to(next);
    let time_elapsed = next.timestamp.saturating_sub(previous.timestamp) as f64 / 1000.0;

    if time_elapsed <= 0.0 {
        let is_unrealistic = distance > policy.stationary_distance_m;
        let reason = is_unrealistic.then(|| {
            format!(
                "non-positive elapsed time ({time_elapsed:.1}s) between samples {distance:.1}m apart"
            )
        });
        debug!(
            "Degenerate sample pair: {:.1}m in {:.1}s (unrealistic: {})",
            distance, time_elapsed, is_unrealistic
        );
        return JumpResult {
            is_unrealistic,
            distance,
            speed: 0.0,
            time_elapsed,
            reason,
        };
    }

    let speed = distance / time_elapsed;
    let is_unrealistic = speed > max_speed;
    let reason = is_unrealistic.then(|| {
        format!(
            "implied speed of {speed:.1} m/s ({distance:.0}m in {time_elapsed:.0}s) exceeds the limit of {max_speed:.1} m/s"
        )
    });

    if is_unrealistic {
        debug!("Location jump: {:.1}m in {:.1}s ({:.1} m/s)", distance, time_elapsed, speed);
    }

    JumpResult {
        is_unrealistic,
        distance,
        speed,
        time_elapsed,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::EARTH_RADIUS_M;

    const T0: i64 = 1_709_285_400_000;

    fn at(lat: f64, lon: f64, offset_secs: i64) -> LocationSample {
        LocationSample::new(lat, lon, T0 + offset_secs * 1000)
    }

    #[test]
    fn test_stationary_technician() {
        let result = detect_location_jump(&at(12.9, 77.6, 0), &at(12.9, 77.6, 60), None);
        assert_eq!(result.distance, 0.0);
        assert_eq!(result.speed, 0.0);
        assert_eq!(result.time_elapsed, 60.0);
        assert!(!result.is_unrealistic);
        assert_eq!(result.reason, None);
    }

    #[test]
    fn test_hundred_kilometers_in_ten_seconds() {
        let lon = (100_000.0 / EARTH_RADIUS_M).to_degrees();
        let result = detect_location_jump(&at(0.0, 0.0, 0), &at(0.0, lon, 10), None);
        assert!((result.distance - 100_000.0).abs() < 0.01);
        assert!((result.speed - 10_000.0).abs() < 0.01);
        assert!(result.is_unrealistic);
        assert!(result.reason.unwrap().contains("exceeds the limit of 50.0 m/s"));
    }

    #[test]
    fn test_fifty_kilometers_in_five_minutes() {
        let lat = (50_000.0 / EARTH_RADIUS_M).to_degrees();
        let result = detect_location_jump(&at(0.0, 10.0, 0), &at(lat, 10.0, 300), None);
        assert!((result.speed - 166.67).abs() < 0.1);
        assert!(result.is_unrealistic);
    }

    #[test]
    fn test_highway_drive_is_plausible() {
        // ~30 km in 20 minutes is 25 m/s
        let lat = (30_000.0 / EARTH_RADIUS_M).to_degrees();
        let result = detect_location_jump(&at(0.0, 0.0, 0), &at(lat, 0.0, 1200), None);
        assert!(!result.is_unrealistic);
        assert!((result.speed - 25.0).abs() < 0.01);
    }

    #[test]
    fn test_speed_limit_override() {
        let lat = (30_000.0 / EARTH_RADIUS_M).to_degrees();
        let previous = at(0.0, 0.0, 0);
        let next = at(lat, 0.0, 1200);
        assert!(detect_location_jump(&previous, &next, Some(20.0)).is_unrealistic);

        // Bogus override falls back to the default limit
        assert!(!detect_location_jump(&previous, &next, Some(-1.0)).is_unrealistic);
        assert!(!detect_location_jump(&previous, &next, Some(f64::NAN)).is_unrealistic);
    }

    #[test]
    fn test_duplicate_sample_is_not_a_jump() {
        let sample = at(12.9, 77.6, 0);
        let result = detect_location_jump(&sample, &sample, None);
        assert!(!result.is_unrealistic);
        assert_eq!(result.distance, 0.0);
        assert_eq!(result.speed, 0.0);
        assert_eq!(result.time_elapsed, 0.0);
    }

    #[test]
    fn test_instant_movement_is_unrealistic() {
        let result = detect_location_jump(&at(12.9, 77.6, 0), &at(12.95, 77.6, 0), None);
        assert!(result.is_unrealistic);
        assert_eq!(result.speed, 0.0);
        assert!(result.reason.unwrap().starts_with("non-positive elapsed time"));
    }

    #[test]
    fn test_reversed_order() {
        let earlier = at(12.9, 77.6, 0);
        let later = at(12.91, 77.6, 120);

        let forward = detect_location_jump(&earlier, &later, None);
        let reversed = detect_location_jump(&later, &earlier, None);

        assert!((forward.distance - reversed.distance).abs() < 1e-6);
        assert_eq!(forward.time_elapsed, 120.0);
        assert_eq!(reversed.time_elapsed, -120.0);
        assert!(!forward.is_unrealistic);
        assert!(reversed.is_unrealistic);
    }

    #[test]
    fn test_custom_stationary_tolerance() {
        let policy = ValidationPolicy {
            stationary_distance_m: 50.0,
            ..Default::default()
        };
        // ~11m of GPS drift reported in the same millisecond
        let result = detect_jump(&at(12.9, 77.6, 0), &at(12.9001, 77.6, 0), &policy, None);
        assert!(!result.is_unrealistic);
    }

    #[test]
    fn test_reason_omitted_from_wire_when_realistic() {
        let result = detect_location_jump(&at(12.9, 77.6, 0), &at(12.9, 77.6, 10), None);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["isUnrealistic"], false);
        assert_eq!(json["timeElapsed"], 10.0);
        assert!(json.get("reason").is_none());
    }
}
