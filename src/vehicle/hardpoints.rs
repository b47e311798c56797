//! Named suspension hardpoints.
//!
//! Tables are expressed in the suspension frame (X towards the vehicle rear,
//! Y to the right, Z up) and are always given for the right side. The left
//! side is obtained with [`HardpointTable::mirrored`].

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::marker::PhantomData;

use glam::Vec3;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::core::types::Side;
use crate::error::{VehicleError, VehicleResult};
use crate::utils::math::mirror_y;

/// Closed set of point identifiers for one suspension kind.
pub trait Hardpoint: Copy + Eq + Ord + Debug + 'static {
    const ALL: &'static [Self];

    fn name(self) -> &'static str;

    fn index(self) -> usize;

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.name() == name)
    }
}

/// Declares a hardpoint enum together with its [`Hardpoint`] impl.
macro_rules! hardpoint_enum {
    ($(#[$meta:meta])* pub enum $name:ident { $($(#[$vmeta:meta])* $variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $crate::vehicle::hardpoints::Hardpoint for $name {
            const ALL: &'static [Self] = &[$($name::$variant),+];

            fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            fn index(self) -> usize {
                self as usize
            }
        }
    };
}
pub(crate) use hardpoint_enum;

/// Complete point-to-coordinate table; every identifier has a coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct HardpointTable<P: Hardpoint> {
    points: Vec<Vec3>,
    _marker: PhantomData<P>,
}

impl<P: Hardpoint> HardpointTable<P> {
    pub fn builder() -> HardpointTableBuilder<P> {
        HardpointTableBuilder {
            points: vec![None; P::ALL.len()],
            _marker: PhantomData,
        }
    }

    pub fn from_fn(mut f: impl FnMut(P) -> Vec3) -> Self {
        Self {
            points: P::ALL.iter().map(|p| f(*p)).collect(),
            _marker: PhantomData,
        }
    }

    pub fn get(&self, point: P) -> Vec3 {
        self.points[point.index()]
    }

    /// Reflection across the XZ plane: Y negated, X and Z untouched.
    pub fn mirrored(&self) -> Self {
        Self::from_fn(|p| mirror_y(self.get(p)))
    }

    /// Table for the requested side of the vehicle.
    pub fn for_side(&self, side: Side) -> Self {
        match side {
            Side::Right => self.clone(),
            Side::Left => self.mirrored(),
        }
    }

    /// Every coordinate multiplied by `factor` (unit conversion).
    pub fn scaled(&self, factor: f32) -> Self {
        Self::from_fn(|p| self.get(p) * factor)
    }

    pub fn map(&self, mut f: impl FnMut(Vec3) -> Vec3) -> Self {
        Self::from_fn(|p| f(self.get(p)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (P, Vec3)> + '_ {
        P::ALL.iter().map(move |p| (*p, self.get(*p)))
    }

    pub fn validate(&self) -> VehicleResult<()> {
        for (point, value) in self.iter() {
            if !value.is_finite() {
                return Err(VehicleError::invalid_parameter(
                    format!("hardpoint.{}", point.name()),
                    f32::NAN,
                    "coordinates must be finite",
                ));
            }
        }
        Ok(())
    }
}

/// Incremental construction of a [`HardpointTable`]; `build` refuses gaps.
#[derive(Debug, Clone)]
pub struct HardpointTableBuilder<P: Hardpoint> {
    points: Vec<Option<Vec3>>,
    _marker: PhantomData<P>,
}

impl<P: Hardpoint> HardpointTableBuilder<P> {
    pub fn set(mut self, point: P, value: Vec3) -> Self {
        self.points[point.index()] = Some(value);
        self
    }

    pub fn build(self) -> VehicleResult<HardpointTable<P>> {
        let points = P::ALL
            .iter()
            .map(|p| {
                self.points[p.index()].ok_or(VehicleError::MissingHardpoint { point: p.name() })
            })
            .collect::<VehicleResult<Vec<_>>>()?;
        let table = HardpointTable {
            points,
            _marker: PhantomData,
        };
        table.validate()?;
        Ok(table)
    }
}

impl<P: Hardpoint> Serialize for HardpointTable<P> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let map: BTreeMap<&'static str, [f32; 3]> =
            self.iter().map(|(p, v)| (p.name(), v.to_array())).collect();
        map.serialize(serializer)
    }
}

impl<'de, P: Hardpoint> Deserialize<'de> for HardpointTable<P> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, [f32; 3]>::deserialize(deserializer)?;
        let mut builder = Self::builder();
        for (name, xyz) in raw {
            let point = P::from_name(&name)
                .ok_or_else(|| de::Error::custom(format!("unknown hardpoint `{name}`")))?;
            builder = builder.set(point, Vec3::from_array(xyz));
        }
        builder.build().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    hardpoint_enum! {
        pub enum TestPoint {
            A => "A",
            B => "B",
        }
    }

    #[test]
    fn builder_reports_the_missing_point() {
        let err = HardpointTable::<TestPoint>::builder()
            .set(TestPoint::A, Vec3::ONE)
            .build()
            .unwrap_err();
        assert_eq!(err, VehicleError::MissingHardpoint { point: "B" });
    }

    #[test]
    fn mirroring_negates_y_only() {
        let table = HardpointTable::<TestPoint>::builder()
            .set(TestPoint::A, Vec3::new(1.0, 2.0, 3.0))
            .set(TestPoint::B, Vec3::new(-0.5, 0.25, 0.0))
            .build()
            .unwrap();
        let left = table.for_side(Side::Left);
        assert_eq!(left.get(TestPoint::A), Vec3::new(1.0, -2.0, 3.0));
        assert_eq!(left.mirrored(), table);
        assert_eq!(table.for_side(Side::Right), table);
    }
}
