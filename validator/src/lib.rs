//! Location Validator Library
//!
//! Integrity checks for technician location samples logged during onsite visits.
//! This includes structural validation, accuracy grading and detection of
//! physically implausible jumps between consecutive samples.
//!
//! Everything in this crate is pure and synchronous, so a single
//! [`LocationValidator`] can be shared freely between concurrent requests.

pub mod assessment;
pub mod constants;
pub mod error;
pub mod geo;
pub mod jump;
pub mod policy;
pub mod quality;
pub mod sample;
pub mod validation;

pub use assessment::{CheckedSample, LocationAssessment, LocationValidator};
pub use constants::*;
pub use error::PolicyError;
pub use jump::{JumpResult, detect_jump, detect_location_jump};
pub use policy::{QualityThresholds, ValidationPolicy};
pub use quality::{QualityTier, get_location_quality};
pub use sample::{LocationSample, LocationSource, RawSample};
pub use validation::{ValidationResult, validate_location, validate_raw, validate_sample};
