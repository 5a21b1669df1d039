//! Coordinate bounds and default policy values

/// Smallest valid latitude in degrees
pub const MIN_LATITUDE: f64 = -90.0;

/// Largest valid latitude in degrees
pub const MAX_LATITUDE: f64 = 90.0;

/// Smallest valid longitude in degrees
pub const MIN_LONGITUDE: f64 = -180.0;

/// Largest valid longitude in degrees
pub const MAX_LONGITUDE: f64 = 180.0;

/// Mean Earth radius (meters) used by the spherical distance model
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Largest representable instant in epoch milliseconds (±100,000,000 days)
pub const MAX_TIMESTAMP_MS: i64 = 8_640_000_000_000_000;

/// Samples this far ahead of the server clock are flagged as clock skew - 5 minutes
pub const DEFAULT_FUTURE_TOLERANCE_SECS: i64 = 300;

/// Samples older than this are flagged as stale - 30 minutes
pub const DEFAULT_STALE_AFTER_SECS: i64 = 1800;

/// Accuracy radius above which a sample is coarse but still usable
pub const DEFAULT_COARSE_ACCURACY_M: f64 = 100.0;

/// Accuracy radius above which a sample is unusable for dispatch
pub const DEFAULT_MAX_ACCURACY_M: f64 = 5000.0;

/// Fastest plausible travel speed (m/s) - 180 km/h, above normal highway driving
pub const DEFAULT_MAX_SPEED_MPS: f64 = 50.0;

/// Movement below this distance between same-instant samples is treated as a duplicate
pub const DEFAULT_STATIONARY_DISTANCE_M: f64 = 1.0;

/// Upper accuracy bound (meters) of the excellent tier
pub const DEFAULT_EXCELLENT_ACCURACY_M: f64 = 10.0;

/// Upper accuracy bound (meters) of the good tier
pub const DEFAULT_GOOD_ACCURACY_M: f64 = 50.0;

/// Upper accuracy bound (meters) of the fair tier
pub const DEFAULT_FAIR_ACCURACY_M: f64 = 100.0;
