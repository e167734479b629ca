//! Integration tests for the two solver regimes.

use pn_core::{CaseConfig, ElementId};
use pn_core::config::SolverBackend;
use pn_network::{Element, Network, NetworkBuilder};
use pn_solver::{solve_constant_gradient, solve_constant_rate};

/// inlet -> n0 -> n1 -> ... -> outlet, `links` equal conductances total.
fn chain(links: usize) -> Network {
    let nodes = links - 1;
    let mut b = NetworkBuilder::new();
    let spacing = 1e-4;
    let ids: Vec<ElementId> = (0..nodes)
        .map(|i| b.add_node([(i as f64 + 0.5) * spacing, 0.5 * spacing, 0.5 * spacing]))
        .collect();
    b.add_inlet_throat(ids[0]);
    for w in ids.windows(2) {
        b.add_throat(w[0], w[1]);
    }
    b.add_outlet_throat(ids[nodes - 1]);
    b.set_extents([links as f64 * spacing, spacing, spacing]);
    b.build().unwrap()
}

/// Throats carry `g`, nodes are perfect conductors.
fn uniform_g(g: f64) -> impl Fn(&Element) -> f64 {
    move |e: &Element| if e.is_throat() { g } else { f64::INFINITY }
}

#[test]
fn chain_flow_matches_series_formula() {
    for backend in [SolverBackend::Cholesky, SolverBackend::ConjugateGradient] {
        let mut net = chain(5);
        let mut cfg = CaseConfig::default();
        cfg.solver.backend = backend;
        cfg.inlet_pressure = 3.0;
        cfg.outlet_pressure = 1.0;
        let g = 2.5e-12;

        let s = solve_constant_gradient(&mut net, &cfg, &uniform_g(g), &|_| 0.0).unwrap();
        let expect = g * (cfg.inlet_pressure - cfg.outlet_pressure) / 5.0;
        assert!(
            (s.outlet_flow - expect).abs() < expect * 1e-9,
            "{backend:?}: {} vs {expect}",
            s.outlet_flow
        );
        assert!((s.inlet_flow - s.outlet_flow).abs() < expect * 1e-9);
    }
}

#[test]
fn flow_conserves_at_internal_nodes() {
    let mut net = chain(6);
    let cfg = CaseConfig::default();
    let s = solve_constant_gradient(&mut net, &cfg, &uniform_g(1e-12), &|_| 0.0).unwrap();
    assert!(s.outlet_flow > 0.0);

    for nid in net.node_ids().collect::<Vec<_>>() {
        let mut net_in = 0.0;
        for &tid in net.neighbors(nid) {
            let t = net[tid].throat().unwrap();
            if t.nodes[1] == Some(nid) {
                net_in += t.flow;
            }
            if t.nodes[0] == Some(nid) {
                net_in -= t.flow;
            }
        }
        assert!(net_in.abs() < s.outlet_flow * 1e-9, "node {nid}: {net_in}");
    }
}

#[test]
fn parallel_throats_add_conductances() {
    let mut b = NetworkBuilder::new();
    let a = b.add_node([0.25e-4, 0.5e-4, 0.5e-4]);
    let c = b.add_node([0.75e-4, 0.5e-4, 0.5e-4]);
    b.add_inlet_throat(a);
    let t1 = b.add_throat(a, c);
    let t2 = b.add_throat(a, c);
    b.add_outlet_throat(c);
    b.set_extents([1e-4, 1e-4, 1e-4]);
    let mut net = b.build().unwrap();

    // Map builder throat handles onto element ids (throats follow nodes).
    let throat_id = |h: usize| ElementId::from_index((net.node_count() + h) as u32);
    let (g1, g2) = (1e-12, 3e-12);
    let (id1, id2) = (throat_id(t1), throat_id(t2));
    // Boundary throats far more conductive than the parallel pair, so the
    // effective conductance is (g1 + g2) to well below test tolerance.
    let g_of = move |e: &Element| {
        if e.id == id1 {
            g1
        } else if e.id == id2 {
            g2
        } else if e.is_throat() {
            1.0
        } else {
            f64::INFINITY
        }
    };

    let cfg = CaseConfig::default();
    let s = solve_constant_gradient(&mut net, &cfg, &g_of, &|_| 0.0).unwrap();
    let expect = (g1 + g2) * (cfg.inlet_pressure - cfg.outlet_pressure);
    assert!((s.outlet_flow - expect).abs() < expect * 1e-9);
}

#[test]
fn capillary_offset_folds_into_rhs() {
    let mut net = chain(4);
    let cfg = CaseConfig::default();
    let g = 1e-12;
    let pc = 0.5;
    // Same jump on every link: acts like an extra pressure drop per link.
    let s = solve_constant_gradient(&mut net, &cfg, &uniform_g(g), &|_| pc).unwrap();
    let expect = g * ((cfg.inlet_pressure - cfg.outlet_pressure) + 4.0 * pc) / 4.0;
    assert!((s.outlet_flow - expect).abs() < expect.abs() * 1e-9);
}

#[test]
fn constant_rate_delivers_requested_rate() {
    let mut net = chain(5);
    let cfg = CaseConfig::default();
    let rate = 7e-13;
    let s = solve_constant_rate(&mut net, &cfg, &uniform_g(1e-12), &|_| 0.0, rate).unwrap();
    assert!((s.inlet_flow - rate).abs() < rate * 1e-12);
    assert!((s.outlet_flow - rate).abs() < rate * 1e-9);
}

#[test]
fn constant_rate_skips_dead_end_inlet_clusters() {
    // inlet -> a -> outlet, plus a second node d behind its own inlet
    // throat whose only link to a is non-conductive. d's cluster touches
    // the inlet but has no outlet anchor: it must stay out of the assembly
    // and receive none of the injected rate.
    let mut b = NetworkBuilder::new();
    let a = b.add_node([0.25e-4, 0.5e-4, 0.5e-4]);
    let d = b.add_node([0.75e-4, 0.5e-4, 0.5e-4]);
    b.add_inlet_throat(a);
    b.add_outlet_throat(a);
    b.add_inlet_throat(d);
    let blocked = b.add_throat(d, a);
    b.set_extents([1e-4, 1e-4, 1e-4]);
    let mut net = b.build().unwrap();

    let blocked_id = ElementId::from_index((net.node_count() + blocked) as u32);
    let g_of = move |e: &Element| {
        if e.id == blocked_id {
            0.0
        } else if e.is_throat() {
            1e-12
        } else {
            f64::INFINITY
        }
    };

    let cfg = CaseConfig::default();
    let rate = 5e-13;
    let s = solve_constant_rate(&mut net, &cfg, &g_of, &|_| 0.0, rate).unwrap();
    assert_eq!(s.active_nodes, 1);
    assert!((s.inlet_flow - rate).abs() < rate * 1e-9);
    assert!((s.outlet_flow - rate).abs() < rate * 1e-9);
}

#[test]
fn empty_conductor_set_returns_zeroed_summary() {
    let mut net = chain(3);
    let cfg = CaseConfig::default();
    let s = solve_constant_gradient(&mut net, &cfg, &|_| 0.0, &|_| 0.0).unwrap();
    assert_eq!(s.active_nodes, 0);
    assert_eq!(s.outlet_flow, 0.0);
}
