//! Core types describing bodies, joints, shafts and shared data.

pub mod types;
pub mod rigidbody;
pub mod constraints;
pub mod shafts;

pub use types::{Axle, MassProperties, Side, TireForce, Transform, Velocity, VisualShape, VisualizationType, WheelId};
pub use rigidbody::RigidBody;
pub use constraints::{Constraint, Joint, JointKind, JointReaction};
pub use shafts::{RelationMember, RelationReaction, Shaft, ShaftRelation};
