//! Simulation errors.

use pn_core::CoreError;
use pn_network::NetworkError;
use pn_results::ResultsError;
use pn_solver::SolverError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    #[error("Results error: {0}")]
    Results(#[from] ResultsError),

    /// The unsteady stepper found no advancing interface: every remaining
    /// time step would be infinite.
    #[error("Displacement stalled: {what}")]
    Stalled { what: String },

    /// A physical quantity left its admissible range beyond tolerance.
    #[error("Non-physical state: {what}")]
    NonPhysical { what: String },
}

pub type SimResult<T> = Result<T, SimError>;
