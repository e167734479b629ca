//! pn-network: the pore-network data model.
//!
//! A `Network` is an arena of `Element`s (pore bodies and throats) addressed
//! by stable integer handles. Topology is immutable after `build()`;
//! per-simulation state (fluids, fractions, trapping, films) mutates through
//! a run and is reset at each stage start.

pub mod builder;
pub mod element;
pub mod error;
pub mod lattice;
pub mod network;
mod validate;

pub use builder::{ElementGeometry, NetworkBuilder};
pub use element::{Element, ElementKind, FilmState, Fluid, NodeData, ThroatData, Wettability};
pub use error::{NetworkError, NetworkResult};
pub use lattice::LatticeSpec;
pub use network::Network;
