//! Entry pressures and bulk conductance per element.

use pn_network::Element;

/// Capillary entry pressure for piston-like displacement through the bulk,
/// Pe = G*·σ·cosθ/r with G* = 1 + 2√(πG).
///
/// Undefined for closed elements (debug-asserted: calling this on one is a
/// logic error upstream, not a recoverable state).
pub fn entry_pressure(e: &Element, sigma: f64) -> f64 {
    debug_assert!(e.is_open(), "entry pressure queried on a closed element");
    e.entry_pressure_coefficient * sigma * e.theta.cos() / e.radius
}

/// Pore-body filling: the bare entry pressure divided by the number of
/// already-invaded neighbors (competitive filling; divisor never below 1).
pub fn competitive_entry_pressure(e: &Element, sigma: f64, invaded_neighbors: usize) -> f64 {
    entry_pressure(e, sigma) / invaded_neighbors.max(1) as f64
}

/// Threshold for snap-off through a corner film: σ·cosθ/r, without the
/// piston boost G*. Snap-off is only reachable where a film is active.
pub fn snapoff_pressure(e: &Element, sigma: f64) -> f64 {
    debug_assert!(e.is_open(), "snap-off pressure queried on a closed element");
    sigma * e.theta.cos() / e.radius
}

/// Single-phase bulk conductance g = k·A²·G/(μ·L) with A = r²/(4G).
pub fn bulk_conductance(e: &Element, viscosity: f64) -> f64 {
    let area = e.cross_section_area();
    e.shape_factor_constant * area * area * e.shape_factor / (viscosity * e.length)
}
