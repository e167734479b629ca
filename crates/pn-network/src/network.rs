//! The network arena and its derived aggregates.

use crate::element::{Element, Fluid};
use pn_core::ElementId;
use std::ops::{Index, IndexMut};

/// Exclusive owner of all elements of one pore network.
///
/// Built once per run by `NetworkBuilder`; topology (ids, endpoints,
/// neighbor lists, geometry) never changes afterwards. Ids are dense, with
/// all nodes before all throats.
#[derive(Clone, Debug)]
pub struct Network {
    pub(crate) elements: Vec<Element>,
    pub(crate) node_count: usize,
    pub(crate) throat_count: usize,
    /// Physical extents of the sample (m): x is the flow axis.
    pub(crate) extents: [f64; 3],
    /// Absolute permeability from the latest single-phase solve (m²).
    pub absolute_permeability: Option<f64>,
}

impl Network {
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn elements_mut(&mut self) -> &mut [Element] {
        &mut self.elements
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.idx())
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn throat_count(&self) -> usize {
        self.throat_count
    }

    pub fn extents(&self) -> [f64; 3] {
        self.extents
    }

    /// Sample length along the flow axis (m).
    pub fn flow_length(&self) -> f64 {
        self.extents[0]
    }

    /// Face area normal to the flow axis (m²).
    pub fn flow_area(&self) -> f64 {
        self.extents[1] * self.extents[2]
    }

    /// Node ids (nodes occupy the low end of the id space).
    pub fn node_ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        (0..self.node_count as u32).map(ElementId::from_index)
    }

    /// Throat ids (throats follow the nodes).
    pub fn throat_ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        (self.node_count as u32..(self.node_count + self.throat_count) as u32)
            .map(ElementId::from_index)
    }

    pub fn ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        (0..self.elements.len() as u32).map(ElementId::from_index)
    }

    pub fn neighbors(&self, id: ElementId) -> &[ElementId] {
        &self.elements[id.idx()].neighbors
    }

    /// Total pore volume over open elements (m³).
    pub fn pore_volume(&self) -> f64 {
        self.elements
            .iter()
            .filter(|e| e.is_open())
            .map(|e| e.volume)
            .sum()
    }

    /// Bulk sample volume from extents (m³).
    pub fn bulk_volume(&self) -> f64 {
        self.extents[0] * self.extents[1] * self.extents[2]
    }

    pub fn porosity(&self) -> f64 {
        let bulk = self.bulk_volume();
        if bulk > 0.0 { self.pore_volume() / bulk } else { 0.0 }
    }

    /// Volume-weighted water saturation over open elements.
    ///
    /// Film volumes count toward the film phase: an oil-bulk element with a
    /// water film contributes its film volume to water.
    pub fn water_saturation(&self) -> f64 {
        let mut water = 0.0;
        let mut total = 0.0;
        for e in self.elements.iter().filter(|e| e.is_open()) {
            total += e.volume;
            water += e.volume * e.water_fraction;
        }
        if total > 0.0 { water / total } else { 0.0 }
    }

    /// Reset per-simulation state ahead of a stage: every open element is
    /// assigned `fluid`, films/trapping/flows/pressures are cleared.
    pub fn reset_state(&mut self, fluid: Fluid) {
        for e in &mut self.elements {
            if e.closed {
                continue;
            }
            e.fluid = fluid;
            e.water_fraction = if fluid == Fluid::Water { 1.0 } else { 0.0 };
            e.capillary_pressure = 0.0;
            e.conductance = 0.0;
            e.theta = e.original_theta;
            e.oil_trapped = false;
            e.water_trapped = false;
            e.film_area_coefficient = 0.0;
            e.oil_film = Default::default();
            e.water_film = Default::default();
            e.concentration = e.water_fraction;
            match &mut e.kind {
                crate::element::ElementKind::Node(n) => {
                    n.pressure = 0.0;
                    n.rank = None;
                }
                crate::element::ElementKind::Throat(t) => t.flow = 0.0,
            }
        }
        self.absolute_permeability = None;
    }
}

impl Index<ElementId> for Network {
    type Output = Element;

    fn index(&self, id: ElementId) -> &Element {
        &self.elements[id.idx()]
    }
}

impl IndexMut<ElementId> for Network {
    fn index_mut(&mut self, id: ElementId) -> &mut Element {
        &mut self.elements[id.idx()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::NetworkBuilder;

    fn tiny() -> Network {
        // inlet -> n0 -> outlet
        let mut b = NetworkBuilder::new();
        let n0 = b.add_node([0.5e-3, 0.5e-3, 0.5e-3]);
        b.add_inlet_throat(n0);
        b.add_outlet_throat(n0);
        b.set_extents([1e-3, 1e-3, 1e-3]);
        b.build().unwrap()
    }

    #[test]
    fn counts_and_id_ranges() {
        let net = tiny();
        assert_eq!(net.node_count(), 1);
        assert_eq!(net.throat_count(), 2);
        assert_eq!(net.node_ids().count(), 1);
        assert_eq!(net.throat_ids().count(), 2);
        for id in net.throat_ids() {
            assert!(net[id].is_throat());
        }
    }

    #[test]
    fn saturation_tracks_fractions() {
        let mut net = tiny();
        net.reset_state(Fluid::Water);
        assert!((net.water_saturation() - 1.0).abs() < 1e-12);
        let total = net.pore_volume();
        let first = net.ids().next().unwrap();
        let v = net[first].volume;
        net[first].water_fraction = 0.0;
        let expect = (total - v) / total;
        assert!((net.water_saturation() - expect).abs() < 1e-12);
    }

    #[test]
    fn reset_state_clears_simulation_fields() {
        let mut net = tiny();
        let id = net.ids().next().unwrap();
        net[id].oil_trapped = true;
        net[id].capillary_pressure = 5.0;
        net.reset_state(Fluid::Oil);
        assert!(!net[id].oil_trapped);
        assert_eq!(net[id].capillary_pressure, 0.0);
        assert_eq!(net[id].fluid, Fluid::Oil);
        assert_eq!(net[id].water_fraction, 0.0);
    }
}
