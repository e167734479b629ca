//! Integration tests for pn-network.

use pn_network::{Fluid, LatticeSpec, NetworkBuilder};
use rand::SeedableRng;
use rand::rngs::StdRng;

#[test]
fn build_minimal_network() {
    // inlet -> N0 -> T -> N1 -> outlet
    let mut b = NetworkBuilder::new();
    let n0 = b.add_node([0.25e-3, 0.5e-3, 0.5e-3]);
    let n1 = b.add_node([0.75e-3, 0.5e-3, 0.5e-3]);
    b.add_inlet_throat(n0);
    b.add_throat(n0, n1);
    b.add_outlet_throat(n1);
    b.set_extents([1e-3, 1e-3, 1e-3]);

    let net = b.build().unwrap();

    assert_eq!(net.node_count(), 2);
    assert_eq!(net.throat_count(), 3);

    // Every throat has one or two node endpoints, never zero.
    for t in net.throat_ids() {
        let data = net[t].throat().unwrap();
        let endpoints = data.nodes.iter().flatten().count();
        assert!(endpoints == 1 || endpoints == 2);
        if endpoints == 1 {
            assert!(data.inlet || data.outlet);
        }
    }

    // Adjacency is symmetric: each throat endpoint lists the throat back.
    for t in net.throat_ids() {
        for n in net[t].throat().unwrap().nodes.iter().flatten() {
            assert!(net.neighbors(*n).contains(&t));
        }
    }
}

#[test]
fn lattice_aggregates() {
    let spec = LatticeSpec {
        nx: 4,
        ny: 3,
        nz: 2,
        ..LatticeSpec::default()
    };
    let mut rng = StdRng::seed_from_u64(11);
    let net = spec.build(&mut rng).unwrap();

    assert!(net.pore_volume() > 0.0);
    assert!(net.porosity() > 0.0 && net.porosity() < 1.0);
    let [ex, ey, ez] = net.extents();
    assert!((ex - 4.0 * 100e-6).abs() < 1e-15);
    assert!((ey - 3.0 * 100e-6).abs() < 1e-15);
    assert!((ez - 2.0 * 100e-6).abs() < 1e-15);
}

#[test]
fn reset_state_flips_every_open_element() {
    let spec = LatticeSpec {
        nx: 3,
        ny: 3,
        nz: 1,
        ..LatticeSpec::default()
    };
    let mut rng = StdRng::seed_from_u64(3);
    let mut net = spec.build(&mut rng).unwrap();

    net.reset_state(Fluid::Oil);
    assert!(net.water_saturation() < 1e-12);
    net.reset_state(Fluid::Water);
    assert!((net.water_saturation() - 1.0).abs() < 1e-12);
}
