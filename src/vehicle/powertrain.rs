//! Single-gear powertrain with a linear torque-speed curve.

use log::debug;
use serde::{Deserialize, Serialize};

use super::driveline::Driveline;
use crate::config::NEUTRAL_GEAR_RATIO;
use crate::error::{ensure_positive, VehicleError, VehicleResult};
use crate::utils::allocator::ShaftId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriveMode {
    #[default]
    Forward,
    Reverse,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowertrainParams {
    /// Driveshaft speed / motor speed in forward gear.
    pub forward_gear_ratio: f32,
    pub reverse_gear_ratio: f32,
    /// Motor torque at stall, N·m.
    pub max_torque: f32,
    /// Motor speed at which the torque drops to zero, rad/s.
    pub max_speed: f32,
}

impl PowertrainParams {
    pub fn validate(&self) -> VehicleResult<()> {
        for (name, ratio) in [
            ("powertrain.forward_gear_ratio", self.forward_gear_ratio),
            ("powertrain.reverse_gear_ratio", self.reverse_gear_ratio),
        ] {
            if !ratio.is_finite() || ratio == 0.0 {
                return Err(VehicleError::invalid_parameter(name, ratio, "must be finite and non-zero"));
            }
        }
        ensure_positive("powertrain.max_torque", self.max_torque)?;
        ensure_positive("powertrain.max_speed", self.max_speed)?;
        Ok(())
    }

    pub fn gear_ratio(&self, mode: DriveMode) -> f32 {
        match mode {
            DriveMode::Forward => self.forward_gear_ratio,
            DriveMode::Reverse => self.reverse_gear_ratio,
            DriveMode::Neutral => NEUTRAL_GEAR_RATIO,
        }
    }
}

/// Powertrain state. Cheap to clone, so a vehicle can stage an update.
#[derive(Debug, Clone, PartialEq)]
pub struct Powertrain {
    params: PowertrainParams,
    driveshaft: ShaftId,
    motor_speed: f32,
    motor_torque: f32,
    shaft_torque: f32,
    current_gear_ratio: f32,
    drive_mode: DriveMode,
}

impl Powertrain {
    /// Couples a powertrain to the driveshaft of `driveline`, in forward gear.
    pub fn initialize(params: PowertrainParams, driveline: &Driveline) -> VehicleResult<Self> {
        params.validate()?;
        debug!(
            "initialized powertrain on `{}` (max torque {} N·m, max speed {} rad/s)",
            driveline.name(),
            params.max_torque,
            params.max_speed
        );
        Ok(Self {
            params,
            driveshaft: driveline.driveshaft(),
            motor_speed: 0.0,
            motor_torque: 0.0,
            shaft_torque: 0.0,
            current_gear_ratio: params.forward_gear_ratio,
            drive_mode: DriveMode::Forward,
        })
    }

    pub fn set_drive_mode(&mut self, mode: DriveMode) {
        self.drive_mode = mode;
        self.current_gear_ratio = self.params.gear_ratio(mode);
    }

    /// Advances the motor model; throttle is used as given.
    pub fn update(&mut self, _time: f32, throttle: f32, shaft_speed: f32) {
        self.motor_speed = shaft_speed / self.current_gear_ratio;
        let slope = self.params.max_torque / self.params.max_speed;
        self.motor_torque = (self.params.max_torque - self.motor_speed * slope) * throttle;
        self.shaft_torque = self.motor_torque / self.current_gear_ratio;
    }

    pub fn params(&self) -> &PowertrainParams {
        &self.params
    }

    pub fn driveshaft(&self) -> ShaftId {
        self.driveshaft
    }

    pub fn motor_speed(&self) -> f32 {
        self.motor_speed
    }

    pub fn motor_torque(&self) -> f32 {
        self.motor_torque
    }

    /// Torque to apply to the driveshaft.
    pub fn output_torque(&self) -> f32 {
        self.shaft_torque
    }

    pub fn current_gear_ratio(&self) -> f32 {
        self.current_gear_ratio
    }

    pub fn drive_mode(&self) -> DriveMode {
        self.drive_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_uses_huge_ratio() {
        let params = PowertrainParams {
            forward_gear_ratio: 0.3,
            reverse_gear_ratio: -0.3,
            max_torque: 100.0,
            max_speed: 50.0,
        };
        assert_eq!(params.gear_ratio(DriveMode::Neutral), NEUTRAL_GEAR_RATIO);
        assert_eq!(params.gear_ratio(DriveMode::Reverse), -0.3);
    }

    #[test]
    fn zero_ratio_is_rejected() {
        let params = PowertrainParams {
            forward_gear_ratio: 0.0,
            reverse_gear_ratio: -0.3,
            max_torque: 100.0,
            max_speed: 50.0,
        };
        assert!(params.validate().is_err());
    }
}
