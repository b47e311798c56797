use log::{log_enabled, warn, Level};
use std::time::Instant;

use crate::error::{VehicleError, VehicleResult};

/// Simple scoped timer for profiling the per-step hot paths.
pub struct ScopedTimer<'a> {
    label: &'a str,
    start: Instant,
}

impl<'a> ScopedTimer<'a> {
    pub fn new(label: &'a str) -> Self {
        if log_enabled!(Level::Trace) {
            log::trace!("start {label}");
        }
        Self {
            label,
            start: Instant::now(),
        }
    }
}

impl<'a> Drop for ScopedTimer<'a> {
    fn drop(&mut self) {
        if log_enabled!(Level::Trace) {
            let elapsed = self.start.elapsed();
            log::trace!("end {} ({} µs)", self.label, elapsed.as_micros());
        }
    }
}

/// Passes finite values through; warns and reports anything else.
pub fn check_finite(what: &str, value: f32) -> VehicleResult<f32> {
    if value.is_finite() {
        Ok(value)
    } else {
        warn!("non-finite value in {what}: {value}");
        Err(VehicleError::non_finite(what))
    }
}

/// Vector flavour of [`check_finite`].
pub fn check_finite_vec(what: &str, value: glam::Vec3) -> VehicleResult<glam::Vec3> {
    if value.is_finite() {
        Ok(value)
    } else {
        warn!("non-finite vector in {what}: {value:?}");
        Err(VehicleError::non_finite(what))
    }
}
