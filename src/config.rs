//! Global configuration constants for vehicle assembly and the reference scene.
//!
//! Suspension and chassis coordinates follow one frame convention: X points
//! towards the vehicle rear, Y to the right, Z up (right-handed).

/// Default integration timestep for the reference scene (in seconds).
pub const DEFAULT_TIME_STEP: f32 = 1.0e-3;

/// Tie-rod displacement (meters) produced by a full steering input of 1.0.
pub const DEFAULT_STEERING_GAIN: f32 = 0.08;

/// Gear ratio used for neutral; drives the output torque to ~0.
pub const NEUTRAL_GEAR_RATIO: f32 = 1.0e20;

/// Willis ordinary ratio of an open differential.
pub const DIFFERENTIAL_ORDINARY_RATIO: f32 = -1.0;

/// Relative spin (rad/s) below which brake friction is scaled down linearly.
pub const BRAKE_SLIP_SPEED: f32 = 0.01;

/// Pivots smaller than this make the shaft network singular.
pub const SHAFT_PIVOT_EPSILON: f64 = 1.0e-12;

/// Inches to meters.
pub const INCHES_TO_METERS: f32 = 0.0254;

/// Meters to inches.
pub const METERS_TO_INCHES: f32 = 1.0 / INCHES_TO_METERS;

/// Newtons per pound-force.
pub const NEWTONS_PER_POUND: f32 = 4.448_222;
