//! pn-solver: sparse pressure/flow solves over the conductance network.
//!
//! Assembles a graph-Laplacian system over the active nodes (contiguous
//! rank renumbering, inactive elements fully excluded) and solves it under
//! one of two boundary regimes:
//!
//! - constant pressure gradient (Dirichlet inlet/outlet), used for
//!   capillary-dominated displacement, absolute and relative permeability;
//! - constant inlet rate (Neumann inlet, Dirichlet outlet), used by the
//!   unsteady simulator.

pub mod assembly;
pub mod backend;
pub mod error;
pub mod perm;
pub mod pressure;

pub use assembly::{SparseSystem, assign_ranks};
pub use backend::solve_system;
pub use error::{SolverError, SolverResult};
pub use perm::{absolute_permeability, relative_permeability};
pub use pressure::{
    FlowSummary, effective_conductance, solve_constant_gradient, solve_constant_rate,
};
