//! pn-core: stable foundation for porenet.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - numeric (Real + tolerances + float helpers)
//! - ids (stable compact IDs for network elements)
//! - error (shared error types)
//! - config (immutable per-case parameter bag)
//! - cancel (cooperative cancellation token)
//! - progress (progress/result sink abstraction)

pub mod cancel;
pub mod config;
pub mod error;
pub mod ids;
pub mod numeric;
pub mod progress;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use cancel::CancelToken;
pub use config::*;
pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use numeric::*;
pub use progress::{MemorySink, NullSink, ProgressEvent, ProgressSink, SnapshotFrame};
pub use units::*;
