//! pn-sim: displacement simulators over the pore network.
//!
//! Two engines share the network, cluster, capillary and solver layers:
//!
//! - quasi-static invasion percolation: imposed capillary-pressure sweeps
//!   through a five-stage drainage/imbibition cycle, producing (Sw, Pc)
//!   curves and optional relative permeability samples;
//! - unsteady rate-controlled displacement: a constant-rate waterflood
//!   advancing continuous water fractions through solved pressure fields.
//!
//! Stages are single-writer: one worker owns the network for the duration
//! of a stage and publishes progress through a `ProgressSink`.

pub mod error;
pub mod prep;
pub mod quasistatic;
pub mod runner;
pub mod state;
pub mod unsteady;

pub use error::{SimError, SimResult};
pub use prep::{alter_wettability, prepare_network};
pub use quasistatic::{StageKind, StageReport, run_stage};
pub use runner::{
    SequenceReport, run_quasi_static_sequence, run_single_stage, run_waterflood_case,
};
pub use state::{StageOutcome, StageState};
pub use unsteady::{UnsteadyReport, run_waterflood};
