//! Force elements and the shaft network solver.

pub mod forces;
pub mod shafts;

pub use forces::{SpringCoefficients, SpringDamper, SpringState};
pub use shafts::{NetworkDof, NetworkRow, NetworkSolution, ShaftNetworkSolver, ShaftStepMetrics};
