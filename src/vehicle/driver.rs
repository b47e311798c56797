//! Driver inputs and a time-scripted driver.

use serde::{Deserialize, Serialize};

use crate::error::{VehicleError, VehicleResult};

/// Raw driver commands; the vehicle clamps them when it applies them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverInputs {
    /// [0, 1]
    pub throttle: f32,
    /// [-1, 1], positive steers the tie rods towards +Y.
    pub steering: f32,
    /// [0, 1]
    pub braking: f32,
}

impl DriverInputs {
    pub fn new(throttle: f32, steering: f32, braking: f32) -> Self {
        Self {
            throttle,
            steering,
            braking,
        }
    }

    /// Fails on the first NaN or infinite channel.
    pub fn check_finite(&self) -> VehicleResult<()> {
        for (name, value) in [
            ("throttle", self.throttle),
            ("steering", self.steering),
            ("braking", self.braking),
        ] {
            if !value.is_finite() {
                return Err(VehicleError::NonFiniteInput { name, value });
            }
        }
        Ok(())
    }

    pub fn clamped(&self) -> Self {
        Self {
            throttle: self.throttle.clamp(0.0, 1.0),
            steering: self.steering.clamp(-1.0, 1.0),
            braking: self.braking.clamp(0.0, 1.0),
        }
    }
}

/// Anything that produces driver inputs as a function of time.
pub trait Driver {
    fn inputs(&mut self, time: f32) -> DriverInputs;
}

/// Piecewise-linear signal; held constant before the first and after the last knot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    knots: Vec<(f32, f32)>,
}

impl Schedule {
    /// Knot times must be finite and strictly increasing.
    pub fn new(knots: Vec<(f32, f32)>) -> VehicleResult<Self> {
        for (i, &(t, v)) in knots.iter().enumerate() {
            if !t.is_finite() || !v.is_finite() {
                return Err(VehicleError::invalid_parameter(format!("schedule.knot[{i}]"), t, "must be finite"));
            }
        }
        if let Some(i) = knots.windows(2).position(|w| w[1].0 <= w[0].0) {
            return Err(VehicleError::invalid_parameter(
                format!("schedule.knot[{}]", i + 1),
                knots[i + 1].0,
                "knot times must increase",
            ));
        }
        Ok(Self { knots })
    }

    pub fn constant(value: f32) -> Self {
        Self {
            knots: vec![(0.0, value)],
        }
    }

    pub fn value(&self, time: f32) -> f32 {
        let Some(&(first_t, first_v)) = self.knots.first() else {
            return 0.0;
        };
        if time <= first_t {
            return first_v;
        }
        for w in self.knots.windows(2) {
            let ((t0, v0), (t1, v1)) = (w[0], w[1]);
            if time < t1 {
                return v0 + (v1 - v0) * (time - t0) / (t1 - t0);
            }
        }
        self.knots.last().map_or(first_v, |&(_, v)| v)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedDriver {
    pub throttle: Schedule,
    pub steering: Schedule,
    pub braking: Schedule,
}

impl ScriptedDriver {
    pub fn new(throttle: Schedule, steering: Schedule, braking: Schedule) -> Self {
        Self {
            throttle,
            steering,
            braking,
        }
    }

    /// Throttle ramp to 0.4 over [0.5, 1.5] s, then a steer left-right sweep from 4 s.
    pub fn ramp_and_sweep() -> Self {
        Self {
            throttle: Schedule {
                knots: vec![(0.5, 0.0), (1.5, 0.4)],
            },
            steering: Schedule {
                knots: vec![(4.0, 0.0), (6.0, 0.5), (10.0, -0.5)],
            },
            braking: Schedule::constant(0.0),
        }
    }
}

impl Default for ScriptedDriver {
    fn default() -> Self {
        Self::ramp_and_sweep()
    }
}

impl Driver for ScriptedDriver {
    fn inputs(&mut self, time: f32) -> DriverInputs {
        DriverInputs {
            throttle: self.throttle.value(time),
            steering: self.steering.value(time),
            braking: self.braking.value(time),
        }
    }
}
