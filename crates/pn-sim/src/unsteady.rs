//! Rate-controlled unsteady displacement.
//!
//! Water is injected at a fixed rate and element water fractions advance
//! continuously: each time step reclusters the phases, rebuilds the
//! conductance field and interfacial capillary source terms, solves the
//! constant-rate regime, and moves every interface by the flow it
//! received over the largest step that fills no element past full.

use crate::error::{SimError, SimResult};
use crate::state::StageOutcome;
use pn_capillary::{bulk_conductance, competitive_entry_pressure, entry_pressure};
use pn_cluster::{PartitionSlot, Partitions, cluster};
use pn_core::{
    CancelToken, CaseConfig, ElementId, ProgressEvent, ProgressSink, SnapshotFrame, clamp_fraction,
};
use pn_network::{Element, Fluid, Network};
use pn_results::Series;
use pn_solver::{SolverError, solve_constant_rate};
use tracing::{debug, info, trace};
use uom::si::dynamic_viscosity::pascal_second;
use uom::si::volume_rate::cubic_meter_per_second;

/// Fractions beyond 1 − FLIP_EPS flip to bulk water.
const FLIP_EPS: f64 = 1e-8;
/// Cap on counter-current elimination sweeps within one time step.
const MAX_COUNTER_CURRENT_SWEEPS: usize = 32;

/// Everything one finished unsteady run leaves behind.
#[derive(Debug)]
pub struct UnsteadyReport {
    pub outcome: StageOutcome,
    pub steps: usize,
    /// Simulated time (s).
    pub elapsed: f64,
    pub injected_pvs: f64,
    pub final_sw: f64,
    /// (PV, Sw) samples at ≥1% saturation spacing.
    pub sw_history: Series,
    /// (PV, ΔP) samples on the same cadence.
    pub dp_history: Series,
}

/// An element carries water toward the front: bulk water, a partially
/// filled element, or the injection boundary itself.
fn watery(e: &Element) -> bool {
    e.fluid == Fluid::Water || e.water_fraction > FLIP_EPS || e.is_inlet()
}

/// Entry pressure of the interface sitting in `e`: piston displacement for
/// water-wet walls, pore-body filling (competitive divisor over already
/// water-filled neighbors) where cosθ turns negative.
fn interface_entry(network: &Network, e: &Element, sigma: f64) -> f64 {
    if e.theta.cos() > 0.0 {
        entry_pressure(e, sigma)
    } else {
        let filled = e
            .neighbors
            .iter()
            .filter(|&&nb| network[nb].fluid == Fluid::Water)
            .count();
        competitive_entry_pressure(e, sigma, filled)
    }
}

/// Recluster both phases with partially filled elements relabeled
/// Transitional, so bulk connectivity never runs through an interface.
/// Oil traps when its cluster loses the outlet, water when it loses the
/// inlet. Returns whether any water cluster spans inlet to outlet.
fn retrap(network: &mut Network, parts: &mut Partitions) -> bool {
    let partial: Vec<ElementId> = network
        .ids()
        .filter(|&id| {
            let e = &network[id];
            e.is_open()
                && e.fluid == Fluid::Oil
                && e.water_fraction > FLIP_EPS
                && e.water_fraction < 1.0 - FLIP_EPS
        })
        .collect();
    for &id in &partial {
        network[id].fluid = Fluid::Transitional;
    }

    parts.invalidate_all();
    parts.set(
        PartitionSlot::OilPhase,
        cluster(network, |e| e.fluid == Fluid::Oil),
    );
    parts.set(
        PartitionSlot::WaterPhase,
        cluster(network, |e| e.fluid == Fluid::Water),
    );
    let oil_set = parts.get_or_empty(PartitionSlot::OilPhase);
    let water_set = parts.get_or_empty(PartitionSlot::WaterPhase);
    let spans = water_set.clusters().iter().any(|c| c.spanning());

    for id in network.ids().collect::<Vec<_>>() {
        let trapped_oil = network[id].fluid == Fluid::Oil && !oil_set.reaches_outlet(id);
        let trapped_water = network[id].fluid == Fluid::Water && !water_set.reaches_inlet(id);
        let e = &mut network[id];
        if !e.is_open() {
            continue;
        }
        match e.fluid {
            Fluid::Oil => e.oil_trapped = trapped_oil,
            Fluid::Water => e.water_trapped = trapped_water,
            Fluid::Transitional => {
                e.oil_trapped = false;
                e.water_trapped = false;
            }
        }
    }

    for &id in &partial {
        network[id].fluid = Fluid::Oil;
    }
    spans
}

/// Water gain rate of one interfacial element (m³/s, positive = filling),
/// given the solved throat flows. For a throat the sign follows its water
/// side; for a node, water inflow is summed over its watery throats.
fn fill_rate(network: &Network, disabled: &[bool], id: ElementId) -> f64 {
    let e = &network[id];
    if let Some(t) = e.throat() {
        let side = |slot: usize| -> bool {
            match t.nodes[slot] {
                Some(n) => network[n].fluid == Fluid::Water,
                // A missing endpoint is the boundary: water at the inlet side.
                None => slot == 0 && e.is_inlet(),
            }
        };
        return match (side(0), side(1)) {
            (true, false) => t.flow,
            (false, true) => -t.flow,
            (true, true) => t.flow.abs(),
            (false, false) => 0.0,
        };
    }
    // Node: sum signed water inflow over incident throats.
    let mut rate = 0.0;
    for &tid in &e.neighbors {
        let th = &network[tid];
        if !th.is_open() || disabled[tid.idx()] || !watery(th) {
            continue;
        }
        let Some(td) = th.throat() else { continue };
        let into = if td.nodes[1] == Some(id) {
            td.flow
        } else {
            -td.flow
        };
        rate += into;
    }
    rate
}

/// Mean pressure of the nodes behind conducting inlet throats, relative to
/// the outlet boundary pressure.
fn inlet_pressure_drop(network: &Network, config: &CaseConfig) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for id in network.throat_ids() {
        let e = &network[id];
        if !e.is_inlet() || !(e.conductance > 0.0) {
            continue;
        }
        if let Some(nid) = e.throat().and_then(|t| t.nodes[1])
            && let Some(nd) = network[nid].node()
        {
            sum += nd.pressure;
            count += 1;
        }
    }
    if count > 0 {
        sum / count as f64 - config.outlet_pressure
    } else {
        0.0
    }
}

fn snapshot(network: &Network, step: usize) -> SnapshotFrame {
    SnapshotFrame {
        step,
        fluids: network.elements().iter().map(|e| e.fluid.code()).collect(),
        concentrations: network.elements().iter().map(|e| e.concentration).collect(),
    }
}

/// March a constant-rate waterflood from the network's current occupancy
/// until `target_injected_pvs` pore volumes have entered, cancellation, or
/// a stall (no advancing interface leaves an infinite time step).
pub fn run_waterflood(
    network: &mut Network,
    config: &CaseConfig,
    cancel: &CancelToken,
    sink: &mut dyn ProgressSink,
) -> SimResult<UnsteadyReport> {
    config.validate()?;
    let rate = config.injection_rate_si().get::<cubic_meter_per_second>();
    let sigma = config.fluids.interfacial_tension;
    let pore_volume = network.pore_volume();
    if !(pore_volume > 0.0) {
        return Err(SimError::NonPhysical {
            what: "network has no open pore volume".into(),
        });
    }
    let n_elems = network.elements().len();
    let mut parts = Partitions::new();

    let mut sw_history = Series::new("waterflood_sw", &["PV", "Sw"]);
    let mut dp_history = Series::new("waterflood_dp", &["PV", "dP"]);
    let mut elapsed = 0.0;
    let mut injected = 0.0;
    let mut steps = 0usize;
    let mut outcome = None;
    let mut last_sample = f64::INFINITY;

    info!(rate, pore_volume, "waterflood start");

    while steps < config.max_time_steps {
        if cancel.is_cancelled() {
            outcome = Some(StageOutcome::Cancelled);
            break;
        }

        // (a) phase connectivity and trapping.
        let water_spans = retrap(network, &mut parts);

        // (b) conductances and the interfacial frontier.
        for id in network.ids().collect::<Vec<_>>() {
            let e = &mut network[id];
            if !e.is_open() {
                continue;
            }
            let wf = e.water_fraction;
            let mu = (config.water_viscosity() * wf + config.oil_viscosity() * (1.0 - wf))
                .get::<pascal_second>();
            let trapped = (e.fluid == Fluid::Oil && e.oil_trapped)
                || (e.fluid == Fluid::Water && e.water_trapped);
            e.conductance = if trapped { 0.0 } else { bulk_conductance(e, mu) };
        }
        let mut iface = vec![false; n_elems];
        let mut frontier: Vec<ElementId> = Vec::new();
        for id in network.ids() {
            let e = &network[id];
            if !e.is_open()
                || e.fluid != Fluid::Oil
                || e.oil_trapped
                || e.water_fraction >= 1.0 - FLIP_EPS
            {
                continue;
            }
            let fed = e.water_fraction > FLIP_EPS
                || e.is_inlet()
                || e.neighbors
                    .iter()
                    .any(|&nb| network[nb].fluid == Fluid::Water);
            if fed {
                iface[id.idx()] = true;
                frontier.push(id);
            }
        }
        if frontier.is_empty() {
            return Err(SimError::Stalled {
                what: format!("no advancing interface after {steps} steps"),
            });
        }

        // Per-throat capillary offsets, signed toward the oil side.
        let mut pc_table = vec![0.0; n_elems];
        for id in network.throat_ids() {
            let e = &network[id];
            let Some(t) = e.throat() else { continue };
            let mut pc = 0.0;
            if iface[id.idx()] {
                let side0 = match t.nodes[0] {
                    Some(n) => network[n].fluid == Fluid::Water,
                    None => e.is_inlet(),
                };
                let side1 = t.nodes[1].is_some_and(|n| network[n].fluid == Fluid::Water);
                pc = match (side0, side1) {
                    (true, false) => interface_entry(network, e, sigma),
                    (false, true) => -interface_entry(network, e, sigma),
                    _ => 0.0,
                };
            } else if e.fluid == Fluid::Water {
                // The interface sits in an endpoint node mid-fill.
                if let Some(b) = t.nodes[1]
                    && iface[b.idx()]
                {
                    pc += interface_entry(network, &network[b], sigma);
                }
                if let Some(a) = t.nodes[0]
                    && iface[a.idx()]
                {
                    pc -= interface_entry(network, &network[a], sigma);
                }
            }
            pc_table[id.idx()] = pc;
        }

        // (c) constant-rate solve, closing counter-current throats until
        // every interface fills forward.
        let mut disabled = vec![false; n_elems];
        let mut fills: Vec<(ElementId, f64)> = Vec::new();
        for sweep in 0..MAX_COUNTER_CURRENT_SWEEPS {
            {
                let g_of = |e: &Element| if disabled[e.id.idx()] { 0.0 } else { e.conductance };
                let pc_of = |e: &Element| pc_table[e.id.idx()];
                match solve_constant_rate(network, config, &g_of, &pc_of, rate) {
                    Ok(_) => {}
                    Err(SolverError::NoBoundaryPath { side }) => {
                        return Err(SimError::Stalled {
                            what: format!("lost the conductive path to the {side}"),
                        });
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            fills = frontier
                .iter()
                .map(|&id| (id, fill_rate(network, &disabled, id)))
                .collect();

            let mut closed = 0usize;
            for &(id, f) in &fills {
                if f >= 0.0 {
                    continue;
                }
                if network[id].is_throat() {
                    if !disabled[id.idx()] {
                        disabled[id.idx()] = true;
                        closed += 1;
                    }
                    continue;
                }
                // A draining node: close the watery throats carrying water
                // back out of it.
                for &tid in &network[id].neighbors.clone() {
                    let th = &network[tid];
                    if disabled[tid.idx()] || !watery(th) {
                        continue;
                    }
                    let Some(td) = th.throat() else { continue };
                    let into = if td.nodes[1] == Some(id) {
                        td.flow
                    } else {
                        -td.flow
                    };
                    if into < 0.0 {
                        disabled[tid.idx()] = true;
                        closed += 1;
                    }
                }
            }
            if closed == 0 {
                break;
            }
            trace!(sweep, closed, "counter-current throats closed");
        }

        // (d) largest admissible step.
        let mut dt = f64::INFINITY;
        for &(id, f) in &fills {
            if f.abs() <= 1e-30 {
                continue;
            }
            let e = &network[id];
            let remaining = if f > 0.0 {
                (1.0 - e.water_fraction) * e.volume
            } else {
                e.water_fraction * e.volume
            };
            dt = dt.min(remaining / f.abs());
        }
        if !dt.is_finite() || !(dt > 0.0) {
            return Err(SimError::Stalled {
                what: format!("infinite time step at {steps} steps, Sw={:.4}", network.water_saturation()),
            });
        }
        if water_spans {
            dt = dt.min(0.1 * pore_volume / rate);
        }

        // (e) advance fractions; full elements flip to bulk water.
        for &(id, f) in &fills {
            if f.abs() <= 1e-30 {
                continue;
            }
            let e = &mut network[id];
            let next = clamp_fraction(
                e.water_fraction + f * dt / e.volume,
                config.fraction_tolerance,
                "water fraction",
            )?;
            e.water_fraction = next;
            if next > 1.0 - FLIP_EPS {
                e.water_fraction = 1.0;
                e.fluid = Fluid::Water;
            }
            e.concentration = e.water_fraction;
        }

        elapsed += dt;
        injected += rate * dt;
        steps += 1;
        let pv = injected / pore_volume;
        let sw = network.water_saturation();
        trace!(steps, dt, pv, sw, "time step");

        if (sw - last_sample).abs() >= 0.01 || steps == 1 || pv >= config.target_injected_pvs {
            sw_history.push(&[pv, sw])?;
            dp_history.push(&[pv, inlet_pressure_drop(network, config)])?;
            if config.capture_snapshots {
                sink.on_snapshot(snapshot(network, steps));
            }
            last_sample = sw;
            debug!(pv, sw, "waterflood sample");
        }
        let percent = (pv / config.target_injected_pvs * 100.0).min(100.0) as u8;
        sink.on_progress(ProgressEvent {
            percent,
            status: format!("waterflood pv={pv:.3} Sw={sw:.3}"),
        });

        if pv >= config.target_injected_pvs {
            outcome = Some(StageOutcome::Completed);
            break;
        }
    }

    let Some(outcome) = outcome else {
        return Err(SimError::Stalled {
            what: format!("time-step cap ({}) exhausted", config.max_time_steps),
        });
    };

    let final_sw = network.water_saturation();
    let injected_pvs = injected / pore_volume;
    info!(?outcome, steps, injected_pvs, final_sw, "waterflood finished");
    Ok(UnsteadyReport {
        outcome,
        steps,
        elapsed,
        injected_pvs,
        final_sw,
        sw_history,
        dp_history,
    })
}
