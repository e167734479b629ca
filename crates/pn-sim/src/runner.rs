//! Whole-case orchestration: the five-stage quasi-static cycle and the
//! prepared waterflood case.

use crate::error::SimResult;
use crate::prep::{alter_wettability, prepare_network};
use crate::quasistatic::{StageKind, StageReport, run_stage};
use crate::state::StageOutcome;
use crate::unsteady::{UnsteadyReport, run_waterflood};
use pn_core::{CancelToken, CaseConfig, ProgressSink};
use pn_network::{Fluid, Network};
use pn_solver::absolute_permeability;
use tracing::info;

/// Reports of every stage that ran, in execution order.
#[derive(Debug)]
pub struct SequenceReport {
    pub stages: Vec<StageReport>,
    pub absolute_permeability: f64,
}

/// Run the full displacement cycle on a freshly prepared network:
/// primary drainage, wettability alteration, spontaneous imbibition,
/// forced water injection, spontaneous oil invasion, secondary drainage.
/// Cancellation ends the sequence after the stage that observed it.
pub fn run_quasi_static_sequence(
    network: &mut Network,
    config: &CaseConfig,
    cancel: &CancelToken,
    sink: &mut dyn ProgressSink,
) -> SimResult<SequenceReport> {
    config.validate()?;
    let mut rng = config.rng();
    prepare_network(network, config, &mut rng);
    let k_abs = absolute_permeability(network, config)?;
    info!(k_abs, "sequence start");

    let mut stages = Vec::new();
    for kind in StageKind::SEQUENCE {
        let report = run_stage(network, config, kind, cancel, sink, None)?;
        let cancelled = report.outcome == StageOutcome::Cancelled;
        if kind == StageKind::PrimaryDrainage && !cancelled {
            alter_wettability(network, config, &mut rng);
        }
        stages.push(report);
        if cancelled {
            break;
        }
    }
    Ok(SequenceReport {
        stages,
        absolute_permeability: k_abs,
    })
}

/// Run one stage on a freshly prepared, water-saturated network.
pub fn run_single_stage(
    network: &mut Network,
    config: &CaseConfig,
    kind: StageKind,
    cancel: &CancelToken,
    sink: &mut dyn ProgressSink,
    target_sw: Option<f64>,
) -> SimResult<StageReport> {
    config.validate()?;
    let mut rng = config.rng();
    prepare_network(network, config, &mut rng);
    absolute_permeability(network, config)?;
    run_stage(network, config, kind, cancel, sink, target_sw)
}

/// Prepare an oil-saturated network and flood it with water at the
/// configured rate.
pub fn run_waterflood_case(
    network: &mut Network,
    config: &CaseConfig,
    cancel: &CancelToken,
    sink: &mut dyn ProgressSink,
) -> SimResult<UnsteadyReport> {
    config.validate()?;
    let mut rng = config.rng();
    prepare_network(network, config, &mut rng);
    network.reset_state(Fluid::Oil);
    absolute_permeability(network, config)?;
    run_waterflood(network, config, cancel, sink)
}
