//! Regular cubic-lattice network construction.
//!
//! Stands in for the out-of-scope network-construction collaborator: tests
//! and the CLI demo need a finished, validated network to feed the core.

use crate::builder::{ElementGeometry, NetworkBuilder};
use crate::error::{NetworkError, NetworkResult};
use crate::network::Network;
use pn_core::ElementId;
use rand::Rng;
use rand::rngs::StdRng;

/// Regular Nx×Ny×Nz lattice with flow along x.
#[derive(Clone, Debug)]
pub struct LatticeSpec {
    pub nx: u32,
    pub ny: u32,
    pub nz: u32,
    /// Node spacing (m).
    pub spacing: f64,
    /// Throat radius range (m); equal bounds give a uniform network.
    pub throat_radius: (f64, f64),
    /// Node radius range (m).
    pub node_radius: (f64, f64),
    /// Shape factor applied to every element.
    pub shape_factor: f64,
}

impl Default for LatticeSpec {
    fn default() -> Self {
        Self {
            nx: 10,
            ny: 10,
            nz: 10,
            spacing: 100e-6,
            throat_radius: (10e-6, 10e-6),
            node_radius: (25e-6, 25e-6),
            shape_factor: 0.03,
        }
    }
}

impl LatticeSpec {
    /// Build the lattice network, sampling radii from `rng` where ranges
    /// are non-degenerate.
    pub fn build(&self, rng: &mut StdRng) -> NetworkResult<Network> {
        if self.nx == 0 || self.ny == 0 || self.nz == 0 {
            return Err(NetworkError::InvalidLattice {
                what: "lattice dimensions must be at least 1",
            });
        }
        if !(self.spacing > 0.0) {
            return Err(NetworkError::InvalidLattice {
                what: "spacing must be positive",
            });
        }

        let mut b = NetworkBuilder::new();
        b.set_extents([
            self.nx as f64 * self.spacing,
            self.ny as f64 * self.spacing,
            self.nz as f64 * self.spacing,
        ]);

        let at = |i: u32, j: u32, k: u32| -> usize {
            ((k * self.ny + j) * self.nx + i) as usize
        };

        let mut nodes: Vec<ElementId> = Vec::with_capacity((self.nx * self.ny * self.nz) as usize);
        for k in 0..self.nz {
            for j in 0..self.ny {
                for i in 0..self.nx {
                    let coords = [
                        (i as f64 + 0.5) * self.spacing,
                        (j as f64 + 0.5) * self.spacing,
                        (k as f64 + 0.5) * self.spacing,
                    ];
                    let id = b.add_node_with(coords, self.node_geometry(rng));
                    b.set_node_lattice(id, (i, j, k));
                    nodes.push(id);
                }
            }
        }

        for k in 0..self.nz {
            for j in 0..self.ny {
                for i in 0..self.nx {
                    let n = nodes[at(i, j, k)];
                    if i + 1 < self.nx {
                        let t = b.add_throat(n, nodes[at(i + 1, j, k)]);
                        b.set_throat_geometry(t, self.throat_geometry(rng));
                    }
                    if j + 1 < self.ny {
                        let t = b.add_throat(n, nodes[at(i, j + 1, k)]);
                        b.set_throat_geometry(t, self.throat_geometry(rng));
                    }
                    if k + 1 < self.nz {
                        let t = b.add_throat(n, nodes[at(i, j, k + 1)]);
                        b.set_throat_geometry(t, self.throat_geometry(rng));
                    }
                    if i == 0 {
                        let t = b.add_inlet_throat(n);
                        b.set_throat_geometry(t, self.throat_geometry(rng));
                    }
                    if i + 1 == self.nx {
                        let t = b.add_outlet_throat(n);
                        b.set_throat_geometry(t, self.throat_geometry(rng));
                    }
                }
            }
        }

        b.build()
    }

    fn node_geometry(&self, rng: &mut StdRng) -> ElementGeometry {
        ElementGeometry {
            radius: sample(self.node_radius, rng),
            length: self.spacing / 2.0,
            shape_factor: self.shape_factor,
            volume: None,
        }
    }

    fn throat_geometry(&self, rng: &mut StdRng) -> ElementGeometry {
        ElementGeometry {
            radius: sample(self.throat_radius, rng),
            length: self.spacing / 2.0,
            shape_factor: self.shape_factor,
            volume: None,
        }
    }
}

fn sample(range: (f64, f64), rng: &mut StdRng) -> f64 {
    if range.1 > range.0 {
        rng.gen_range(range.0..range.1)
    } else {
        range.0
    }
}
