//! Error types shared by the scene, the subsystem templates and the vehicle.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type VehicleResult<T> = Result<T, VehicleError>;

/// Everything that can go wrong while assembling or stepping a vehicle.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VehicleError {
    /// A hardpoint table was built without a coordinate for `point`.
    #[error("hardpoint `{point}` has no assigned coordinate")]
    MissingHardpoint { point: &'static str },

    /// A physical parameter is out of its admissible range.
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: String,
        value: f32,
        reason: &'static str,
    },

    /// The chassis handle does not refer to a body attached to the scene.
    #[error("chassis body is not attached to the scene")]
    ChassisNotAttached,

    /// A handle no longer (or never did) refer to a live scene object.
    #[error("stale or unknown {kind} handle")]
    UnknownHandle { kind: &'static str },

    /// A joint of a different kind was supplied where `expected` was required.
    #[error("joint `{name}` is not a {expected} joint")]
    JointKindMismatch { name: String, expected: &'static str },

    /// Steering was requested on a suspension built without steering.
    #[error("suspension `{name}` is not steerable")]
    NotSteerable { name: String },

    /// Axle shafts were requested from a suspension built without a drive.
    #[error("suspension `{name}` is not driven")]
    NotDriven { name: String },

    /// A raw index does not name one of the four wheels.
    #[error("wheel index {0} is out of range (expected 0..4)")]
    InvalidWheelIndex(usize),

    /// A caller supplied a NaN or infinite input.
    #[error("input `{name}` is not finite ({value})")]
    NonFiniteInput { name: &'static str, value: f32 },

    /// The scene or a subsystem produced a NaN or unbounded quantity.
    #[error("non-finite state in {what}")]
    NonFiniteState { what: String },

    /// The shaft network constraint matrix could not be factored.
    #[error("shaft network is singular (pivot {pivot:e} in row {row})")]
    SingularShaftNetwork { row: usize, pivot: f64 },

    /// Comparison data sets do not line up.
    #[error("validation data mismatch: {0}")]
    ValidationMismatch(String),

    /// A data file line could not be parsed.
    #[error("malformed data at line {line}: {reason}")]
    MalformedData { line: usize, reason: String },

    /// Writing a text report failed.
    #[error("failed to write report")]
    Report,
}

impl VehicleError {
    /// Builds an [`VehicleError::InvalidParameter`].
    pub fn invalid_parameter(name: impl Into<String>, value: f32, reason: &'static str) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            value,
            reason,
        }
    }

    /// Builds a [`VehicleError::NonFiniteState`].
    pub fn non_finite(what: impl Into<String>) -> Self {
        Self::NonFiniteState { what: what.into() }
    }
}

impl From<std::fmt::Error> for VehicleError {
    fn from(_: std::fmt::Error) -> Self {
        Self::Report
    }
}

/// Rejects NaN/infinite and non-positive values.
pub(crate) fn ensure_positive(name: &str, value: f32) -> VehicleResult<f32> {
    if !value.is_finite() {
        return Err(VehicleError::invalid_parameter(name, value, "must be finite"));
    }
    if value <= 0.0 {
        return Err(VehicleError::invalid_parameter(name, value, "must be positive"));
    }
    Ok(value)
}

/// Rejects NaN/infinite and negative values.
pub(crate) fn ensure_non_negative(name: &str, value: f32) -> VehicleResult<f32> {
    if !value.is_finite() {
        return Err(VehicleError::invalid_parameter(name, value, "must be finite"));
    }
    if value < 0.0 {
        return Err(VehicleError::invalid_parameter(name, value, "must not be negative"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_names_the_culprit() {
        let err = VehicleError::MissingHardpoint { point: "SPINDLE" };
        assert!(format!("{err}").contains("SPINDLE"));

        let err = VehicleError::invalid_parameter("spring.stiffness", -1.0, "must be positive");
        assert!(format!("{err}").contains("spring.stiffness"));

        let err = VehicleError::InvalidWheelIndex(7);
        assert!(format!("{err}").contains('7'));
    }

    #[test]
    fn positivity_checks_reject_zero_and_nan() {
        assert!(ensure_positive("mass", 1.0).is_ok());
        assert!(ensure_positive("mass", 0.0).is_err());
        assert!(ensure_positive("mass", f32::NAN).is_err());
        assert!(ensure_non_negative("damping", 0.0).is_ok());
        assert!(ensure_non_negative("damping", -0.5).is_err());
    }
}
