//! Absolute and relative permeability.

use crate::error::SolverResult;
use crate::pressure::solve_constant_gradient;
use pn_capillary::bulk_conductance;
use pn_core::CaseConfig;
use pn_network::{Element, Fluid, Network};
use tracing::info;
use uom::si::dynamic_viscosity::pascal_second;

/// Element-level conductance of one phase: bulk when the phase occupies
/// the bulk, plus the phase's film conductance when films count.
pub fn phase_conductance(e: &Element, fluid: Fluid, viscosity: f64, films: bool) -> f64 {
    let mut g = 0.0;
    if e.fluid == fluid {
        g += bulk_conductance(e, viscosity);
    }
    if films
        && let Some(f) = e.film(fluid)
        && f.active
    {
        g += f.conductance;
    }
    g
}

/// Single-phase Darcy permeability of the whole open network (m²):
/// k = Q·μ·L / (A·ΔP) from a constant-gradient solve with every open
/// element conducting. The result is cached on the network.
pub fn absolute_permeability(network: &mut Network, config: &CaseConfig) -> SolverResult<f64> {
    let mu = config.water_viscosity().get::<pascal_second>();
    let g_of = move |e: &Element| bulk_conductance(e, mu);
    let summary = solve_constant_gradient(network, config, &g_of, &|_| 0.0)?;
    let dp = config.inlet_pressure - config.outlet_pressure;
    let k = summary.outlet_flow * mu * network.flow_length() / (network.flow_area() * dp);
    network.absolute_permeability = Some(k);
    info!(k, q = summary.outlet_flow, "absolute permeability");
    Ok(k)
}

/// Relative permeability of `fluid`: a constant-gradient solve restricted
/// to the phase's boundary-attached conductors (bulk plus films when
/// enabled), normalized against the single-phase flow. Zero when the phase
/// has no spanning conductor cluster.
pub fn relative_permeability(
    network: &mut Network,
    config: &CaseConfig,
    fluid: Fluid,
) -> SolverResult<f64> {
    let mu = match fluid {
        Fluid::Oil => config.oil_viscosity(),
        _ => config.water_viscosity(),
    }
    .get::<pascal_second>();

    let single = move |e: &Element| bulk_conductance(e, mu);
    let base = solve_constant_gradient(network, config, &single, &|_| 0.0)?;
    if !(base.outlet_flow > 0.0) {
        return Ok(0.0);
    }

    let films = config.films;
    let phase = move |e: &Element| phase_conductance(e, fluid, mu, films);
    let restricted = solve_constant_gradient(network, config, &phase, &|_| 0.0)?;

    Ok((restricted.outlet_flow / base.outlet_flow).max(0.0))
}
