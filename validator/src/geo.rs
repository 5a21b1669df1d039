//! Implementation of the Haversine formula for calculating the distance
//! between two points on a sphere.
//!
//! See [Wikipedia](https://en.wikipedia.org/wiki/Haversine_formula) for
//! more.
//!
//! **Distance is returned in meters**.

use crate::constants::EARTH_RADIUS_M;
use crate::sample::LocationSample;

/// Great-circle distance in meters between two latitude/longitude pairs (degrees).
///
/// # Notes
/// Altitude is ignored. The spherical model is within 0.5% of the
/// ellipsoid for terrestrial distances.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let lat1 = lat1.to_radians();
    let lat2 = lat2.to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + (d_lon / 2.0).sin().powi(2) * lat1.cos() * lat2.cos();
    // Clamp so rounding near antipodes can't push sqrt(1 - a) into NaN
    let c = 2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt());

    EARTH_RADIUS_M * c
}

impl LocationSample {
    /// Great-circle distance in meters to another sample.
    pub fn distance_to(&self, other: &LocationSample) -> f64 {
        haversine_distance(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}
