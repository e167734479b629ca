//! Error types for solver operations.

use pn_core::CoreError;
use thiserror::Error;

/// Errors that can occur during network pressure solves.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Problem setup error: {what}")]
    ProblemSetup { what: String },

    #[error("No conductive path to a {side} boundary")]
    NoBoundaryPath { side: &'static str },

    #[error("Matrix is not positive definite: {what}")]
    NotPositiveDefinite { what: String },

    #[error("Convergence failed: {what}")]
    ConvergenceFailed { what: String },

    #[error("Numeric error: {what}")]
    Numeric { what: String },

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

pub type SolverResult<T> = Result<T, SolverError>;
