//! Property checks on the corner-geometry closed forms.

use pn_capillary::{
    G_TRIANGLE_MAX, corner_half_angles, entry_pressure, film_area_coefficient, sustains_film,
};
use pn_network::{ElementGeometry, Network, NetworkBuilder};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::f64::consts::FRAC_PI_2;

fn single_node_net(radius: f64) -> Network {
    let mut b = NetworkBuilder::new();
    let n = b.add_node_with(
        [0.0; 3],
        ElementGeometry {
            radius,
            ..ElementGeometry::default()
        },
    );
    b.add_inlet_throat(n);
    b.add_outlet_throat(n);
    b.set_extents([1e-3; 3]);
    b.build().unwrap()
}

proptest! {
    /// Piston entry pressure falls monotonically with radius and scales as
    /// 1/r: pe·r is invariant across radii at fixed σ, θ, and shape factor.
    #[test]
    fn entry_pressure_is_monotone_in_radius(
        r_small in 1e-6..1e-5f64,
        factor in 1.1..10.0f64,
    ) {
        let sigma = 0.03;
        let r_large = r_small * factor;
        let small = single_node_net(r_small);
        let large = single_node_net(r_large);
        let is = small.ids().next().unwrap();
        let il = large.ids().next().unwrap();
        let pe_small = entry_pressure(&small[is], sigma);
        let pe_large = entry_pressure(&large[il], sigma);
        prop_assert!(pe_small > pe_large);
        let scaled = (pe_small * r_small - pe_large * r_large).abs();
        prop_assert!(scaled / (pe_small * r_small) < 1e-9);
    }

    /// Any admissible shape factor yields three positive half-angles that
    /// close a triangle: β1 + β2 + β3 = π/2.
    #[test]
    fn half_angles_close_a_triangle(
        g in 1e-4..G_TRIANGLE_MAX,
        seed in 0u64..1024,
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let betas = corner_half_angles(g, &mut rng).unwrap();
        let sum: f64 = betas.iter().sum();
        prop_assert!((sum - FRAC_PI_2).abs() < 1e-9);
        prop_assert!(betas.iter().all(|&b| b > 0.0 && b < FRAC_PI_2));
    }

    /// The film-area coefficient is never negative, and it is exactly zero
    /// whenever no corner sustains a film.
    #[test]
    fn film_coefficient_is_nonnegative(
        g in 1e-4..G_TRIANGLE_MAX,
        theta in 0.0..std::f64::consts::PI,
        seed in 0u64..1024,
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let betas = corner_half_angles(g, &mut rng).unwrap();
        let coeff = film_area_coefficient(theta, &betas);
        prop_assert!(coeff >= 0.0);
        if !betas.iter().any(|&b| sustains_film(theta, b)) {
            prop_assert_eq!(coeff, 0.0);
        }
    }

    /// Shape factors outside the triangular range never produce corners.
    #[test]
    fn no_corners_outside_triangular_range(
        g in G_TRIANGLE_MAX + 1e-9..0.08,
        seed in 0u64..64,
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        prop_assert!(corner_half_angles(g, &mut rng).is_none());
    }
}
