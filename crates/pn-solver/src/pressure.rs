//! Pressure/flow solves under the two boundary regimes.

use crate::assembly::{SparseSystem, assign_ranks};
use crate::backend::solve_system;
use crate::error::{SolverError, SolverResult};
use pn_cluster::cluster;
use pn_core::{CaseConfig, ElementId};
use pn_network::{Element, Network};
use tracing::debug;
use uom::si::pressure::pascal;

/// Per-element conductance closure: returns an element-level conductance,
/// zero (or negative) meaning "not conductive".
pub type ConductanceFn<'a> = dyn Fn(&Element) -> f64 + 'a;
/// Per-throat capillary offset closure (Pa), signed by throat orientation
/// (`nodes[0]` → `nodes[1]` positive).
pub type PcOffsetFn<'a> = dyn Fn(&Element) -> f64 + 'a;

/// Aggregate flows of one solve.
#[derive(Clone, Copy, Debug, Default)]
pub struct FlowSummary {
    /// Total flow entering through inlet throats (m³/s).
    pub inlet_flow: f64,
    /// Total flow leaving through outlet throats (m³/s).
    pub outlet_flow: f64,
    /// Number of ranked nodes in the assembly.
    pub active_nodes: usize,
}

/// Series combination of a throat with the half-lengths of its endpoint
/// nodes: 1/g = 1/g_t + 1/(2·g_a) + 1/(2·g_b). Zero when any component
/// of the path is non-conductive.
pub fn effective_conductance(network: &Network, throat: &Element, g_of: &ConductanceFn) -> f64 {
    let g_t = g_of(throat);
    if !(g_t > 0.0) {
        return 0.0;
    }
    let mut resistance = 1.0 / g_t;
    if let Some(t) = throat.throat() {
        for n in t.nodes.iter().flatten() {
            let g_n = g_of(&network[*n]);
            if !(g_n > 0.0) {
                return 0.0;
            }
            resistance += 1.0 / (2.0 * g_n);
        }
    }
    1.0 / resistance
}

/// Solve with Dirichlet Pin/Pout at the boundary throats (Regime A).
///
/// Assembly is gated by clustering: only conductor elements whose cluster
/// touches a boundary enter the system, so isolated conductor islands can
/// never produce singular rows. Pressures and signed throat flows are
/// written back into the network; non-conductive throats get zero flow.
/// An empty conductor set returns a zeroed summary, not an error.
pub fn solve_constant_gradient(
    network: &mut Network,
    config: &CaseConfig,
    g_of: &ConductanceFn,
    pc_of: &PcOffsetFn,
) -> SolverResult<FlowSummary> {
    solve_network(network, config, g_of, pc_of, Regime::ConstantGradient)
}

/// Solve with a fixed total inlet rate (Regime B): Neumann flux at inlet
/// throats split proportional to volume/length, outlet held at Pout.
pub fn solve_constant_rate(
    network: &mut Network,
    config: &CaseConfig,
    g_of: &ConductanceFn,
    pc_of: &PcOffsetFn,
    rate: f64,
) -> SolverResult<FlowSummary> {
    solve_network(network, config, g_of, pc_of, Regime::ConstantRate(rate))
}

enum Regime {
    ConstantGradient,
    ConstantRate(f64),
}

fn solve_network(
    network: &mut Network,
    config: &CaseConfig,
    g_of: &ConductanceFn,
    pc_of: &PcOffsetFn,
    regime: Regime,
) -> SolverResult<FlowSummary> {
    let p_in = config.inlet_pressure_pa().get::<pascal>();
    let p_out = config.outlet_pressure_pa().get::<pascal>();

    // Conductor partition; only boundary-attached clusters may flow. Under
    // a fixed-rate solve the outlet is the only Dirichlet anchor, so an
    // inlet-only cluster would get flux but an unconstrained row: it must
    // stay out of the assembly (and out of the flux split) entirely.
    let conductors = cluster(network, |e| g_of(e) > 0.0);
    let attached = |id: ElementId| -> bool {
        conductors.cluster_of(id).is_some_and(|c| match regime {
            Regime::ConstantGradient => c.inlet || c.outlet,
            Regime::ConstantRate(_) => c.outlet,
        })
    };

    let active: Vec<ElementId> = network
        .node_ids()
        .filter(|&id| attached(id))
        .collect();
    let n = assign_ranks(network, &active);

    // Zero stale solver state before writing fresh results.
    for id in network.node_ids().collect::<Vec<_>>() {
        if let Some(nd) = network[id].node_mut() {
            nd.pressure = 0.0;
        }
    }
    for id in network.throat_ids().collect::<Vec<_>>() {
        if let Some(td) = network[id].throat_mut() {
            td.flow = 0.0;
        }
    }

    if n == 0 {
        return Ok(FlowSummary::default());
    }

    // Inlet rate split ∝ volume/length over conductive inlet throats.
    let mut inlet_flux: Vec<(ElementId, f64)> = Vec::new();
    if let Regime::ConstantRate(rate) = regime {
        let mut weights: Vec<(ElementId, f64)> = Vec::new();
        for id in network.throat_ids() {
            let e = &network[id];
            if e.is_inlet() && attached(id) && effective_conductance(network, e, g_of) > 0.0 {
                weights.push((id, e.volume / e.length));
            }
        }
        let total: f64 = weights.iter().map(|(_, w)| w).sum();
        if !(total > 0.0) {
            return Err(SolverError::NoBoundaryPath { side: "inlet" });
        }
        let mut saw_outlet = false;
        for id in network.throat_ids() {
            let e = &network[id];
            if e.is_outlet() && attached(id) && effective_conductance(network, e, g_of) > 0.0 {
                saw_outlet = true;
            }
        }
        if !saw_outlet {
            return Err(SolverError::NoBoundaryPath { side: "outlet" });
        }
        inlet_flux = weights
            .into_iter()
            .map(|(id, w)| (id, rate * w / total))
            .collect();
    }

    let mut sys = SparseSystem::new(n);
    let throat_ids: Vec<ElementId> = network.throat_ids().collect();
    for &tid in &throat_ids {
        if !attached(tid) {
            continue;
        }
        let e = &network[tid];
        let g = effective_conductance(network, e, g_of);
        if !(g > 0.0) {
            continue;
        }
        let pc = pc_of(e);
        let t = e.throat().expect("throat id range");
        let rank = |nid: ElementId| network[nid].node().and_then(|nd| nd.rank);
        match (t.nodes[0], t.nodes[1]) {
            (Some(a), Some(b)) => {
                let (Some(ra), Some(rb)) = (rank(a), rank(b)) else {
                    continue;
                };
                sys.add(ra, ra, g);
                sys.add(rb, rb, g);
                sys.add(ra, rb, -g);
                sys.add(rb, ra, -g);
                sys.add_rhs(ra, -g * pc);
                sys.add_rhs(rb, g * pc);
            }
            (None, Some(b)) => {
                // Inlet-boundary throat.
                let Some(rb) = rank(b) else { continue };
                match regime {
                    Regime::ConstantGradient => {
                        sys.add(rb, rb, g);
                        sys.add_rhs(rb, g * (p_in + pc));
                    }
                    Regime::ConstantRate(_) => {
                        if let Some(&(_, q)) = inlet_flux.iter().find(|(id, _)| *id == tid) {
                            sys.add_rhs(rb, q);
                        }
                    }
                }
            }
            (Some(a), None) => {
                // Outlet-boundary throat: Dirichlet in both regimes.
                let Some(ra) = rank(a) else { continue };
                sys.add(ra, ra, g);
                sys.add_rhs(ra, g * (p_out - pc));
            }
            (None, None) => unreachable!("validated at build time"),
        }
    }
    sys.finish();

    let x = solve_system(&sys, &config.solver)?;
    debug!(active = n, "pressure solve complete");

    for &id in &active {
        let rank = network[id].node().and_then(|nd| nd.rank);
        if let (Some(r), Some(nd)) = (rank, network[id].node_mut()) {
            nd.pressure = x[r];
        }
    }

    // Signed throat flows and boundary totals.
    let mut summary = FlowSummary {
        active_nodes: n,
        ..FlowSummary::default()
    };
    for &tid in &throat_ids {
        if !attached(tid) {
            continue;
        }
        let e = &network[tid];
        let g = effective_conductance(network, e, g_of);
        if !(g > 0.0) {
            continue;
        }
        let pc = pc_of(e);
        let t = e.throat().expect("throat id range");
        let pressure = |nid: ElementId| network[nid].node().map(|nd| nd.pressure).unwrap_or(0.0);
        let q = match (t.nodes[0], t.nodes[1]) {
            (Some(a), Some(b)) => g * (pressure(a) - pressure(b) + pc),
            (None, Some(b)) => match regime {
                Regime::ConstantGradient => g * (p_in - pressure(b) + pc),
                Regime::ConstantRate(_) => inlet_flux
                    .iter()
                    .find(|(id, _)| *id == tid)
                    .map(|&(_, q)| q)
                    .unwrap_or(0.0),
            },
            (Some(a), None) => g * (pressure(a) - p_out + pc),
            (None, None) => unreachable!(),
        };
        if e.is_inlet() {
            summary.inlet_flow += q;
        }
        if e.is_outlet() {
            summary.outlet_flow += q;
        }
        if let Some(td) = network[tid].throat_mut() {
            td.flow = q;
        }
    }

    Ok(summary)
}
