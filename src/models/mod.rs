//! Ready-made vehicle parameter sets.

pub mod hmmwv;

pub use hmmwv::{hmmwv_double_wishbone, hmmwv_solid_axle};
