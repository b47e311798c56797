//! Utility helpers including math extensions, allocators, logging, and result validation.

pub mod allocator;
pub mod logging;
pub mod math;
pub mod validation;

pub use allocator::{Arena, BodyId, EntityId, GenerationalId, JointId, RelationId, ShaftId, SpringId};
pub use math::*;
