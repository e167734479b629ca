//! The clustering pass: union-find over graph adjacency.

use crate::cluster::{Cluster, ClusterSet};
use crate::unionfind::DisjointSet;
use pn_core::ClusterId;
use pn_network::{Element, Network};

/// Partition the elements satisfying `predicate` into connected components.
///
/// Closed elements never qualify regardless of the predicate. Connectivity
/// uses graph adjacency only: two qualifying elements are connected when one
/// lists the other as a neighbor. The whole partition is recomputed on every
/// call; an empty selection yields an empty set.
pub fn cluster<F>(network: &Network, predicate: F) -> ClusterSet
where
    F: Fn(&Element) -> bool,
{
    let n = network.elements().len();
    let qualifies =
        |e: &Element| -> bool { e.is_open() && predicate(e) };

    let mut ds = DisjointSet::new(n);
    let mut in_partition = vec![false; n];

    // Single union-find pass: each qualifying element either stays a
    // singleton or merges with its qualifying neighbors' sets.
    for e in network.elements() {
        if !qualifies(e) {
            continue;
        }
        let i = e.id.index();
        in_partition[i as usize] = true;
        for &nb in &e.neighbors {
            let other = &network[nb];
            if qualifies(other) {
                ds.union(i, nb.index());
            }
        }
    }

    // Second pass: remap canonical roots onto dense cluster indices and
    // accumulate inlet/outlet flags.
    let mut root_to_dense: Vec<Option<u32>> = vec![None; n];
    let mut clusters: Vec<Cluster> = Vec::new();
    let mut membership: Vec<Option<u32>> = vec![None; n];

    for i in 0..n as u32 {
        if !in_partition[i as usize] {
            continue;
        }
        let root = ds.find(i) as usize;
        let dense = match root_to_dense[root] {
            Some(d) => d,
            None => {
                let d = clusters.len() as u32;
                clusters.push(Cluster {
                    id: ClusterId::from_index(d),
                    inlet: false,
                    outlet: false,
                });
                root_to_dense[root] = Some(d);
                d
            }
        };
        membership[i as usize] = Some(dense);

        let e = &network.elements()[i as usize];
        if e.is_inlet() {
            clusters[dense as usize].inlet = true;
        }
        if e.is_outlet() {
            clusters[dense as usize].outlet = true;
        }
    }

    ClusterSet {
        clusters,
        membership,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pn_network::{Fluid, LatticeSpec};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn lattice(nx: u32, ny: u32) -> Network {
        let spec = LatticeSpec {
            nx,
            ny,
            nz: 1,
            ..LatticeSpec::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        spec.build(&mut rng).unwrap()
    }

    #[test]
    fn full_water_network_is_one_spanning_cluster() {
        let mut net = lattice(3, 3);
        net.reset_state(Fluid::Water);
        let set = cluster(&net, |e| e.fluid == Fluid::Water);
        assert_eq!(set.len(), 1);
        assert!(set.has_spanning());
        for id in net.ids() {
            assert!(set.contains(id));
        }
    }

    #[test]
    fn empty_predicate_yields_empty_set() {
        let net = lattice(3, 3);
        let set = cluster(&net, |_| false);
        assert!(set.is_empty());
        assert!(!set.has_spanning());
    }

    #[test]
    fn closed_elements_never_qualify() {
        let mut net = lattice(2, 1);
        net.reset_state(Fluid::Water);
        let first = net.ids().next().unwrap();
        net[first].closed = true;
        let set = cluster(&net, |_| true);
        assert!(!set.contains(first));
    }

    #[test]
    fn severed_network_splits_into_disconnected_clusters() {
        let mut net = lattice(3, 1);
        net.reset_state(Fluid::Water);
        // Close the middle node: its throats survive but stop connecting.
        let mid = net
            .node_ids()
            .find(|&id| net[id].node().unwrap().lattice == Some((1, 0, 0)))
            .unwrap();
        net[mid].closed = true;
        let set = cluster(&net, |e| e.fluid == Fluid::Water);
        assert!(set.len() >= 2);
        assert!(!set.has_spanning());
        // One side reaches the inlet, the other the outlet.
        assert!(set.clusters().iter().any(|c| c.inlet && !c.outlet));
        assert!(set.clusters().iter().any(|c| c.outlet && !c.inlet));
    }
}
