//! Reduced double wishbone: control arms are massless distance constraints
//! between chassis and upright.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{cylinder, spindle_shape, Assembly, BodyParams, SuspensionSide};
use crate::core::types::Side;
use crate::dynamics::forces::SpringCoefficients;
use crate::error::{ensure_positive, VehicleError, VehicleResult};
use crate::utils::math::direction;
use crate::vehicle::hardpoints::{hardpoint_enum, Hardpoint, HardpointTable};

hardpoint_enum! {
    /// Reduced double-wishbone hardpoints (right side).
    pub enum DoubleWishbonePoint {
        Spindle => "SPINDLE",
        Upright => "UPRIGHT",
        /// Upper control arm, chassis front.
        UcaF => "UCA_F",
        /// Upper control arm, chassis back.
        UcaB => "UCA_B",
        UcaU => "UCA_U",
        LcaF => "LCA_F",
        LcaB => "LCA_B",
        LcaU => "LCA_U",
        ShockC => "SHOCK_C",
        ShockU => "SHOCK_U",
        TierodC => "TIEROD_C",
        TierodU => "TIEROD_U",
    }
}

use DoubleWishbonePoint as P;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoubleWishboneParams {
    pub hardpoints: HardpointTable<DoubleWishbonePoint>,
    pub spindle: BodyParams,
    pub upright: BodyParams,
    pub spindle_width: f32,
    pub axle_inertia: f32,
    pub spring: SpringCoefficients,
}

impl DoubleWishboneParams {
    pub fn validate(&self) -> VehicleResult<()> {
        self.hardpoints.validate()?;
        self.spindle.validate("spindle")?;
        self.upright.validate("upright")?;
        ensure_positive("spindle_width", self.spindle_width)?;
        ensure_positive("axle_inertia", self.axle_inertia)?;
        self.spring.validate()?;

        // both ends of every link, and the two chassis mounts of each arm
        let pairs = [
            (P::UcaF, P::UcaU),
            (P::UcaB, P::UcaU),
            (P::LcaF, P::LcaU),
            (P::LcaB, P::LcaU),
            (P::ShockC, P::ShockU),
            (P::TierodC, P::TierodU),
            (P::UcaF, P::UcaB),
            (P::LcaF, P::LcaB),
        ];
        for (a, b) in pairs {
            if direction(self.hardpoints.get(a), self.hardpoints.get(b)).is_none() {
                return Err(VehicleError::invalid_parameter(
                    format!("hardpoint.{:?}-{:?}", a, b),
                    0.0,
                    "points must be distinct",
                ));
            }
        }
        Ok(())
    }
}

pub(super) fn build(
    asm: &mut Assembly<'_>,
    params: &DoubleWishboneParams,
    driven: bool,
) -> VehicleResult<[SuspensionSide; 2]> {
    let points = Side::ALL.map(|side| {
        params
            .hardpoints
            .for_side(side)
            .map(|local| asm.global(local))
    });
    let left = build_side(asm, Side::Left, &points[0], params, driven)?;
    let right = build_side(asm, Side::Right, &points[1], params, driven)?;
    Ok([left, right])
}

fn build_side(
    asm: &mut Assembly<'_>,
    side: Side,
    pts: &HardpointTable<DoubleWishbonePoint>,
    params: &DoubleWishboneParams,
    driven: bool,
) -> VehicleResult<SuspensionSide> {
    let chassis = asm.chassis;
    let upright_pos = pts.get(P::Upright);
    let radius = params.upright.radius;

    let upright = asm.add_body(asm.name("upright", Some(side)), upright_pos, &params.upright, |pose| {
        [P::UcaU, P::LcaU, P::TierodU, P::Spindle]
            .iter()
            .map(|p| cylinder(pose, upright_pos, pts.get(*p), radius))
            .collect()
    })?;
    let spindle = asm.add_body(asm.name("spindle", Some(side)), pts.get(P::Spindle), &params.spindle, |_| {
        vec![spindle_shape(params.spindle.radius, params.spindle_width)]
    })?;

    let lateral = asm.chassis_pose.transform_vector(Vec3::Y);
    let revolute = asm.revolute(asm.name("revolute", Some(side)), upright, spindle, pts.get(P::Spindle), lateral)?;

    let mut joints = vec![revolute];
    for (label, on_upright, on_chassis) in [
        ("distUCA_F", P::UcaU, P::UcaF),
        ("distUCA_B", P::UcaU, P::UcaB),
        ("distLCA_F", P::LcaU, P::LcaF),
        ("distLCA_B", P::LcaU, P::LcaB),
    ] {
        let arm = asm.distance(asm.name(label, Some(side)), upright, pts.get(on_upright), chassis, pts.get(on_chassis))?;
        joints.push(arm);
    }
    let tierod = asm.distance(asm.name("distTierod", Some(side)), upright, pts.get(P::TierodU), chassis, pts.get(P::TierodC))?;
    joints.push(tierod);

    let spring = asm.spring(
        asm.name("shock", Some(side)),
        upright,
        pts.get(P::ShockU),
        chassis,
        pts.get(P::ShockC),
        params.spring,
    )?;

    let (axle_shaft, axle_coupling) = if driven {
        let (shaft, coupling) = asm.axle_shaft(side, spindle, params.axle_inertia)?;
        (Some(shaft), Some(coupling))
    } else {
        (None, None)
    };

    let anchors = P::ALL
        .iter()
        .map(|&point| {
            let body = match point {
                P::Spindle => spindle,
                P::Upright | P::UcaU | P::LcaU | P::ShockU | P::TierodU => upright,
                P::UcaF | P::UcaB | P::LcaF | P::LcaB | P::ShockC | P::TierodC => chassis,
            };
            asm.anchor(point.name(), body, pts.get(point))
        })
        .collect::<VehicleResult<Vec<_>>>()?;

    Ok(SuspensionSide {
        spindle,
        steered_body: upright,
        spindle_revolute: revolute,
        tierod,
        tierod_marker: asm.chassis_local(pts.get(P::TierodC)),
        spring,
        axle_shaft,
        axle_coupling,
        joints,
        anchors,
    })
}
