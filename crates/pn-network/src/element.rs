//! Network elements: pore bodies (nodes) and throats.

use pn_core::ElementId;

/// Fluid occupying an element's bulk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Fluid {
    #[default]
    Water,
    Oil,
    /// Interfacial elements mid-invasion; used by the unsteady simulator so
    /// connectivity checks do not see half-filled elements as bulk fluid.
    Transitional,
}

impl Fluid {
    /// Stable numeric code used in snapshot frames.
    pub fn code(self) -> u8 {
        match self {
            Fluid::Water => 0,
            Fluid::Oil => 1,
            Fluid::Transitional => 2,
        }
    }
}

/// Surface preference of an element's solid walls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Wettability {
    #[default]
    WaterWet,
    OilWet,
}

/// Corner-film state for one phase within one element.
#[derive(Clone, Copy, Debug, Default)]
pub struct FilmState {
    /// A stable film exists in at least one corner.
    pub active: bool,
    /// Film volume (m³), clipped to the element's non-bulk volume.
    pub volume: f64,
    /// Film conductance (m³/(Pa·s)).
    pub conductance: f64,
}

/// Node-only state: a pore body.
#[derive(Clone, Debug, Default)]
pub struct NodeData {
    /// Lattice indices when the network came from a regular lattice.
    pub lattice: Option<(u32, u32, u32)>,
    /// Absolute coordinates (m).
    pub coords: [f64; 3],
    /// Number of connected throats.
    pub connections: u32,
    /// Solver pressure from the latest solve (Pa).
    pub pressure: f64,
    /// Contiguous row rank in the latest solver assembly, if active.
    pub rank: Option<usize>,
}

/// Throat-only state: a pore connecting up to two nodes.
#[derive(Clone, Debug, Default)]
pub struct ThroatData {
    /// Owning nodes; `None` marks the domain boundary (at most one side).
    pub nodes: [Option<ElementId>; 2],
    pub inlet: bool,
    pub outlet: bool,
    /// Signed volumetric flow from the latest solve, positive from
    /// `nodes[0]` toward `nodes[1]` (m³/s).
    pub flow: f64,
}

/// Variant payload of an element.
#[derive(Clone, Debug)]
pub enum ElementKind {
    Node(NodeData),
    Throat(ThroatData),
}

/// One element of the network arena.
///
/// Geometry is fixed at build time; everything below the `state` comment is
/// per-simulation and reset at each stage start.
#[derive(Clone, Debug)]
pub struct Element {
    pub id: ElementId,
    pub kind: ElementKind,

    /// Inscribed radius (m).
    pub radius: f64,
    /// Flow length (m); throats carry their full length split between
    /// endpoints when lengths are aggregated.
    pub length: f64,
    /// Pore volume (m³).
    pub volume: f64,
    /// Dimensionless shape factor G = A/P².
    pub shape_factor: f64,
    /// Conductance prefactor k(G): 0.6 triangular, 0.5623 square, 0.5 circular.
    pub shape_factor_constant: f64,
    /// Entry-pressure coefficient G* = 1 + 2√(πG).
    pub entry_pressure_coefficient: f64,

    /// Bulk conductance from the latest update (m³/(Pa·s)).
    pub conductance: f64,
    /// Capillary pressure across this element's interface (Pa).
    pub capillary_pressure: f64,
    /// Current contact angle (radians).
    pub theta: f64,
    /// Contact angle before any hinging/alteration.
    pub original_theta: f64,
    pub wettability: Wettability,

    // --- state ---
    pub fluid: Fluid,
    /// Corner half-angles β1..β3; zeros when no stable corners exist.
    pub half_angles: [f64; 3],
    /// Dimensionless film-area coefficient summed over sustaining corners.
    pub film_area_coefficient: f64,
    pub oil_film: FilmState,
    pub water_film: FilmState,
    pub oil_trapped: bool,
    pub water_trapped: bool,
    /// Element removed from all transport and invasion.
    pub closed: bool,
    /// Continuous water fraction in [0,1]; 0 = all oil in the bulk.
    pub water_fraction: f64,
    /// Passive tracer concentration for replay frames.
    pub concentration: f64,

    /// Adjacent element ids: a throat lists its nodes, a node its throats.
    pub neighbors: Vec<ElementId>,
}

impl Element {
    pub(crate) fn new(id: ElementId, kind: ElementKind) -> Self {
        Self {
            id,
            kind,
            radius: 0.0,
            length: 0.0,
            volume: 0.0,
            shape_factor: 0.0,
            shape_factor_constant: 0.0,
            entry_pressure_coefficient: 0.0,
            conductance: 0.0,
            capillary_pressure: 0.0,
            theta: 0.0,
            original_theta: 0.0,
            wettability: Wettability::WaterWet,
            fluid: Fluid::Water,
            half_angles: [0.0; 3],
            film_area_coefficient: 0.0,
            oil_film: FilmState::default(),
            water_film: FilmState::default(),
            oil_trapped: false,
            water_trapped: false,
            closed: false,
            water_fraction: 1.0,
            concentration: 0.0,
            neighbors: Vec::new(),
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self.kind, ElementKind::Node(_))
    }

    pub fn is_throat(&self) -> bool {
        matches!(self.kind, ElementKind::Throat(_))
    }

    pub fn node(&self) -> Option<&NodeData> {
        match &self.kind {
            ElementKind::Node(n) => Some(n),
            ElementKind::Throat(_) => None,
        }
    }

    pub fn node_mut(&mut self) -> Option<&mut NodeData> {
        match &mut self.kind {
            ElementKind::Node(n) => Some(n),
            ElementKind::Throat(_) => None,
        }
    }

    pub fn throat(&self) -> Option<&ThroatData> {
        match &self.kind {
            ElementKind::Throat(t) => Some(t),
            ElementKind::Node(_) => None,
        }
    }

    pub fn throat_mut(&mut self) -> Option<&mut ThroatData> {
        match &mut self.kind {
            ElementKind::Throat(t) => Some(t),
            ElementKind::Node(_) => None,
        }
    }

    /// Inlet-boundary throat?
    pub fn is_inlet(&self) -> bool {
        self.throat().is_some_and(|t| t.inlet)
    }

    /// Outlet-boundary throat?
    pub fn is_outlet(&self) -> bool {
        self.throat().is_some_and(|t| t.outlet)
    }

    /// Open for transport and invasion.
    pub fn is_open(&self) -> bool {
        !self.closed
    }

    /// Cross-section area A = r²/(4G).
    pub fn cross_section_area(&self) -> f64 {
        self.radius * self.radius / (4.0 * self.shape_factor)
    }

    /// Volume not occupied by the bulk fluid's films.
    pub fn bulk_volume(&self) -> f64 {
        (self.volume - self.oil_film.volume - self.water_film.volume).max(0.0)
    }

    /// Trapped flag for the given phase.
    pub fn trapped(&self, fluid: Fluid) -> bool {
        match fluid {
            Fluid::Oil => self.oil_trapped,
            Fluid::Water => self.water_trapped,
            Fluid::Transitional => false,
        }
    }

    pub fn set_trapped(&mut self, fluid: Fluid, value: bool) {
        match fluid {
            Fluid::Oil => self.oil_trapped = value,
            Fluid::Water => self.water_trapped = value,
            Fluid::Transitional => {}
        }
    }

    /// Film state for the given phase, if it tracks one.
    pub fn film(&self, fluid: Fluid) -> Option<&FilmState> {
        match fluid {
            Fluid::Oil => Some(&self.oil_film),
            Fluid::Water => Some(&self.water_film),
            Fluid::Transitional => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pn_core::Id;

    fn throat() -> Element {
        Element::new(
            Id::from_index(0),
            ElementKind::Throat(ThroatData {
                inlet: true,
                ..ThroatData::default()
            }),
        )
    }

    #[test]
    fn kind_accessors() {
        let t = throat();
        assert!(t.is_throat());
        assert!(!t.is_node());
        assert!(t.is_inlet());
        assert!(!t.is_outlet());
        assert!(t.node().is_none());
        assert!(t.throat().is_some());
    }

    #[test]
    fn cross_section_area_matches_formula() {
        let mut t = throat();
        t.radius = 1e-5;
        t.shape_factor = 0.03;
        let a = t.cross_section_area();
        assert!((a - 1e-10 / 0.12).abs() < 1e-18);
    }

    #[test]
    fn fluid_codes_are_stable() {
        assert_eq!(Fluid::Water.code(), 0);
        assert_eq!(Fluid::Oil.code(), 1);
        assert_eq!(Fluid::Transitional.code(), 2);
    }
}
