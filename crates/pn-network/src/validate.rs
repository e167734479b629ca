//! Structural validation of a freshly built network.

use crate::element::ElementKind;
use crate::error::{NetworkError, NetworkResult};
use crate::network::Network;

pub(crate) fn validate(network: &Network) -> NetworkResult<()> {
    let mut saw_inlet = false;
    let mut saw_outlet = false;

    for e in network.elements() {
        if !(e.radius > 0.0) || !(e.length > 0.0) {
            return Err(NetworkError::DegenerateGeometry {
                element: e.id,
                what: "radius and length must be positive",
            });
        }
        if !(e.shape_factor > 0.0) || e.shape_factor > 0.08 {
            return Err(NetworkError::DegenerateGeometry {
                element: e.id,
                what: "shape factor must lie in (0, 1/4π]",
            });
        }
        if !(e.volume > 0.0) {
            return Err(NetworkError::DegenerateGeometry {
                element: e.id,
                what: "volume must be positive",
            });
        }

        if let ElementKind::Throat(t) = &e.kind {
            match (t.nodes[0], t.nodes[1]) {
                (None, None) => {
                    return Err(NetworkError::DoubleBoundaryThroat { throat: e.id });
                }
                (Some(_), Some(_)) => {}
                _ => {
                    // One open side: must be a flagged boundary throat.
                    if !t.inlet && !t.outlet {
                        return Err(NetworkError::DanglingThroat { throat: e.id });
                    }
                }
            }
            for n in t.nodes.iter().flatten() {
                let Some(other) = network.get(*n) else {
                    return Err(NetworkError::InvalidEndpoint {
                        throat: e.id,
                        referenced: *n,
                    });
                };
                if !other.is_node() {
                    return Err(NetworkError::EndpointNotNode {
                        throat: e.id,
                        referenced: *n,
                    });
                }
                // Endpoint must list this throat back.
                if !other.neighbors.contains(&e.id) {
                    return Err(NetworkError::InconsistentAdjacency { element: e.id });
                }
            }
            saw_inlet |= t.inlet;
            saw_outlet |= t.outlet;
        }
    }

    if !saw_inlet {
        return Err(NetworkError::NoInlet);
    }
    if !saw_outlet {
        return Err(NetworkError::NoOutlet);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::builder::{ElementGeometry, NetworkBuilder};
    use crate::error::NetworkError;

    #[test]
    fn rejects_network_without_outlet() {
        let mut b = NetworkBuilder::new();
        let n0 = b.add_node([0.0; 3]);
        b.add_inlet_throat(n0);
        b.set_extents([1e-3; 3]);
        assert_eq!(b.build().unwrap_err(), NetworkError::NoOutlet);
    }

    #[test]
    fn rejects_degenerate_radius() {
        let mut b = NetworkBuilder::new();
        let n0 = b.add_node_with(
            [0.0; 3],
            ElementGeometry {
                radius: 0.0,
                ..ElementGeometry::default()
            },
        );
        b.add_inlet_throat(n0);
        b.add_outlet_throat(n0);
        b.set_extents([1e-3; 3]);
        assert!(matches!(
            b.build().unwrap_err(),
            NetworkError::DegenerateGeometry { .. }
        ));
    }
}
