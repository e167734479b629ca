//! Incremental network builder.
//!
//! Collects nodes and throats, then `build()` validates the structure,
//! derives per-element coefficients and adjacency, and freezes everything
//! into an immutable-topology `Network`.

use crate::element::{Element, ElementKind, NodeData, ThroatData};
use crate::error::{NetworkError, NetworkResult};
use crate::network::Network;
use crate::validate;
use pn_core::ElementId;

/// Geometry assigned to a single element.
#[derive(Clone, Copy, Debug)]
pub struct ElementGeometry {
    /// Inscribed radius (m).
    pub radius: f64,
    /// Flow length (m).
    pub length: f64,
    /// Shape factor G = A/P².
    pub shape_factor: f64,
    /// Pore volume (m³); derived from length × cross-section when `None`.
    pub volume: Option<f64>,
}

impl Default for ElementGeometry {
    fn default() -> Self {
        Self {
            radius: 20e-6,
            length: 200e-6,
            shape_factor: 0.03,
            volume: None,
        }
    }
}

/// Conductance prefactor by cross-section family (triangle, square, circle).
fn shape_factor_constant(g: f64) -> f64 {
    let g_tri_max = 3f64.sqrt() / 36.0;
    if g <= g_tri_max {
        0.6
    } else if g <= 1.0 / 16.0 {
        0.5623
    } else {
        0.5
    }
}

struct PendingThroat {
    nodes: [Option<ElementId>; 2],
    inlet: bool,
    outlet: bool,
    geometry: ElementGeometry,
}

/// Builder for constructing a network incrementally.
#[derive(Default)]
pub struct NetworkBuilder {
    node_coords: Vec<[f64; 3]>,
    node_lattice: Vec<Option<(u32, u32, u32)>>,
    node_geometry: Vec<ElementGeometry>,
    throats: Vec<PendingThroat>,
    extents: [f64; 3],
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Physical sample extents (m); x is the flow axis.
    pub fn set_extents(&mut self, extents: [f64; 3]) {
        self.extents = extents;
    }

    /// Add a pore body with default geometry; returns its final element id.
    ///
    /// Node ids are their insertion order — nodes occupy the low end of the
    /// id space regardless of how many throats follow.
    pub fn add_node(&mut self, coords: [f64; 3]) -> ElementId {
        self.add_node_with(coords, ElementGeometry::default())
    }

    pub fn add_node_with(&mut self, coords: [f64; 3], geometry: ElementGeometry) -> ElementId {
        let id = ElementId::from_index(self.node_coords.len() as u32);
        self.node_coords.push(coords);
        self.node_lattice.push(None);
        self.node_geometry.push(geometry);
        id
    }

    /// Record lattice indices for a node built from a regular lattice.
    pub fn set_node_lattice(&mut self, node: ElementId, ijk: (u32, u32, u32)) {
        if let Some(slot) = self.node_lattice.get_mut(node.idx()) {
            *slot = Some(ijk);
        }
    }

    /// Add an interior throat between two nodes; returns a throat handle
    /// valid for `set_throat_geometry` (final ids are assigned in `build`).
    pub fn add_throat(&mut self, a: ElementId, b: ElementId) -> usize {
        self.push_throat([Some(a), Some(b)], false, false)
    }

    /// Add an inlet-boundary throat (missing endpoint on the inlet side).
    pub fn add_inlet_throat(&mut self, node: ElementId) -> usize {
        self.push_throat([None, Some(node)], true, false)
    }

    /// Add an outlet-boundary throat (missing endpoint on the outlet side).
    pub fn add_outlet_throat(&mut self, node: ElementId) -> usize {
        self.push_throat([Some(node), None], false, true)
    }

    pub fn set_throat_geometry(&mut self, throat: usize, geometry: ElementGeometry) {
        if let Some(t) = self.throats.get_mut(throat) {
            t.geometry = geometry;
        }
    }

    fn push_throat(&mut self, nodes: [Option<ElementId>; 2], inlet: bool, outlet: bool) -> usize {
        self.throats.push(PendingThroat {
            nodes,
            inlet,
            outlet,
            geometry: ElementGeometry::default(),
        });
        self.throats.len() - 1
    }

    /// Validate and freeze into a `Network`.
    pub fn build(self) -> NetworkResult<Network> {
        if self.extents.iter().any(|&e| !(e > 0.0)) {
            return Err(NetworkError::InvalidLattice {
                what: "extents must be positive",
            });
        }

        let node_count = self.node_coords.len();
        let throat_count = self.throats.len();
        let mut elements = Vec::with_capacity(node_count + throat_count);

        for (i, coords) in self.node_coords.iter().enumerate() {
            let id = ElementId::from_index(i as u32);
            let mut e = Element::new(
                id,
                ElementKind::Node(NodeData {
                    lattice: self.node_lattice[i],
                    coords: *coords,
                    ..NodeData::default()
                }),
            );
            apply_geometry(&mut e, self.node_geometry[i]);
            elements.push(e);
        }

        for (j, t) in self.throats.iter().enumerate() {
            let id = ElementId::from_index((node_count + j) as u32);
            let mut e = Element::new(
                id,
                ElementKind::Throat(ThroatData {
                    nodes: t.nodes,
                    inlet: t.inlet,
                    outlet: t.outlet,
                    flow: 0.0,
                }),
            );
            apply_geometry(&mut e, t.geometry);
            e.neighbors = t.nodes.iter().flatten().copied().collect();
            elements.push(e);
        }

        // Node adjacency: throats referencing the node, in id order.
        for j in 0..throat_count {
            let tid = ElementId::from_index((node_count + j) as u32);
            for n in self.throats[j].nodes.iter().flatten() {
                elements[n.idx()].neighbors.push(tid);
            }
        }
        for e in elements.iter_mut().take(node_count) {
            let connections = e.neighbors.len() as u32;
            if let ElementKind::Node(n) = &mut e.kind {
                n.connections = connections;
            }
        }

        let network = Network {
            elements,
            node_count,
            throat_count,
            extents: self.extents,
            absolute_permeability: None,
        };
        validate::validate(&network)?;
        Ok(network)
    }
}

fn apply_geometry(e: &mut Element, g: ElementGeometry) {
    e.radius = g.radius;
    e.length = g.length;
    e.shape_factor = g.shape_factor;
    e.shape_factor_constant = shape_factor_constant(g.shape_factor);
    e.entry_pressure_coefficient =
        1.0 + 2.0 * (std::f64::consts::PI * g.shape_factor).sqrt();
    e.volume = g
        .volume
        .unwrap_or_else(|| g.length * g.radius * g.radius / (4.0 * g.shape_factor));
}
