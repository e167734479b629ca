//! pn-results: output series, run manifests, and on-disk run storage.
//!
//! Simulation stages emit append-only numeric tables (one header row, then
//! delimited numeric rows) plus optional per-element snapshot frames; a
//! `RunStore` persists them under a run directory keyed by a content hash
//! of the case configuration.

pub mod error;
pub mod hash;
pub mod series;
pub mod store;
pub mod types;

pub use error::{ResultsError, ResultsResult};
pub use hash::compute_run_id;
pub use series::Series;
pub use store::RunStore;
pub use types::RunManifest;
