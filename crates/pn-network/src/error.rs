//! Network construction and validation errors.

use pn_core::ElementId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    #[error("throat {throat} has no node endpoint and no boundary flag")]
    DanglingThroat { throat: ElementId },

    #[error("throat {throat} has a missing endpoint on both sides")]
    DoubleBoundaryThroat { throat: ElementId },

    #[error("throat {throat} references non-existent element {referenced}")]
    InvalidEndpoint {
        throat: ElementId,
        referenced: ElementId,
    },

    #[error("throat {throat} endpoint {referenced} is not a node")]
    EndpointNotNode {
        throat: ElementId,
        referenced: ElementId,
    },

    #[error("element {element} has degenerate geometry: {what}")]
    DegenerateGeometry {
        element: ElementId,
        what: &'static str,
    },

    #[error("network has no inlet throat")]
    NoInlet,

    #[error("network has no outlet throat")]
    NoOutlet,

    #[error("adjacency inconsistency at element {element}")]
    InconsistentAdjacency { element: ElementId },

    #[error("lattice spec invalid: {what}")]
    InvalidLattice { what: &'static str },
}

pub type NetworkResult<T> = Result<T, NetworkError>;
