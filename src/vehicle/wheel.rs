//! Wheels carry no bodies of their own: mass and visuals are lumped onto the spindle.

use glam::Vec3;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::core::types::{MassProperties, Side, VisualShape, VisualizationType};
use crate::error::{ensure_positive, VehicleResult};
use crate::utils::allocator::BodyId;
use crate::world::scene::MechanicalScene;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelParams {
    pub mass: f32,
    /// Principal moments, spin axis along Y.
    pub inertia: Vec3,
    pub radius: f32,
    pub width: f32,
    /// A mesh name gets the side suffix appended (`_L` / `_R`).
    pub visualization: VisualizationType,
}

impl WheelParams {
    pub fn validate(&self) -> VehicleResult<()> {
        MassProperties::new(self.mass, self.inertia)?;
        ensure_positive("wheel.radius", self.radius)?;
        ensure_positive("wheel.width", self.width)?;
        Ok(())
    }

    pub fn visual_shape(&self, side: Side) -> Option<VisualShape> {
        match &self.visualization {
            VisualizationType::None => None,
            VisualizationType::Primitives => Some(VisualShape::Cylinder {
                p1: Vec3::new(0.0, 0.5 * self.width, 0.0),
                p2: Vec3::new(0.0, -0.5 * self.width, 0.0),
                radius: self.radius,
            }),
            VisualizationType::Mesh(name) => Some(VisualShape::Mesh {
                name: format!("{name}{}", side.suffix()),
            }),
        }
    }
}

/// A wheel mounted on a spindle body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wheel {
    spindle: BodyId,
    side: Side,
    radius: f32,
    width: f32,
}

impl Wheel {
    pub fn initialize(
        params: &WheelParams,
        scene: &mut dyn MechanicalScene,
        spindle: BodyId,
        side: Side,
    ) -> VehicleResult<Self> {
        params.validate()?;
        let mass = MassProperties::new(params.mass, params.inertia)?;
        let body = scene.body_ref_mut(spindle)?;
        body.add_mass(&mass);
        if let Some(shape) = params.visual_shape(side) {
            body.shapes.push(shape);
        }
        debug!("mounted wheel on `{}` ({} kg)", body.name, params.mass);
        Ok(Self {
            spindle,
            side,
            radius: params.radius,
            width: params.width,
        })
    }

    pub fn spindle(&self) -> BodyId {
        self.spindle
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn width(&self) -> f32 {
        self.width
    }
}
