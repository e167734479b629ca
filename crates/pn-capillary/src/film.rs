//! Corner geometry and film volume/conductance.

use crate::G_TRIANGLE_MAX;
use pn_network::{Element, FilmState, Fluid};
use rand::Rng;
use rand::rngs::StdRng;
use std::f64::consts::{FRAC_PI_2, PI};

/// Corner half-angles β1..β3 of a triangular cross section with shape
/// factor `g`.
///
/// Closed form exists only for g ≤ √3/36; larger shape factors (square,
/// circular) have no stable corners and yield `None`. β2 is drawn uniformly
/// from its admissible interval using the case RNG, so a fixed seed pins
/// the corner geometry.
pub fn corner_half_angles(g: f64, rng: &mut StdRng) -> Option<[f64; 3]> {
    if !(g > 0.0) || g > G_TRIANGLE_MAX {
        return None;
    }
    let acos_arg = (-12.0 * 3f64.sqrt() * g).clamp(-1.0, 1.0);
    let beta2_min = (2.0 / 3f64.sqrt() * (acos_arg.acos() / 3.0 + 4.0 * PI / 3.0).cos()).atan();
    let beta2_max = (2.0 / 3f64.sqrt() * (acos_arg.acos() / 3.0).cos()).atan();
    let beta2 = beta2_min + (beta2_max - beta2_min) * rng.gen_range(0.0..1.0);
    let asin_arg = ((beta2.tan() + 4.0 * g) / (beta2.tan() - 4.0 * g) * beta2.sin()).clamp(-1.0, 1.0);
    let beta1 = -0.5 * beta2 + 0.5 * asin_arg.asin();
    let beta3 = FRAC_PI_2 - beta1 - beta2;
    Some([beta1, beta2, beta3])
}

/// A corner with half-angle β sustains a film of a phase whose effective
/// contact angle is θ when θ < π/2 − β. For the non-wetting phase pass
/// π − θ as the effective angle.
pub fn sustains_film(theta: f64, beta: f64) -> bool {
    theta < FRAC_PI_2 - beta
}

/// Dimensionless film-area coefficient: per-corner contributions
/// f(θ,β) = cosθ·cos(θ+β)/sinβ + θ + β − π/2 summed over sustaining
/// corners. Exactly 0 when no corner sustains a film.
pub fn film_area_coefficient(theta: f64, half_angles: &[f64; 3]) -> f64 {
    half_angles
        .iter()
        .filter(|&&beta| beta > 0.0 && sustains_film(theta, beta))
        .map(|&beta| theta.cos() * (theta + beta).cos() / beta.sin() + theta + beta - FRAC_PI_2)
        .sum()
}

/// Recompute film volume and conductance for `e` from its current
/// capillary pressure. Film area scales as (σ/Pc)²; volume is clipped to
/// the element's remaining non-bulk volume. The conductance carries the
/// configured resistivity divisor: in an element whose bulk holds the
/// other phase, the film is that phase's only conductive path.
#[allow(clippy::too_many_arguments)]
pub fn update_films(
    e: &mut Element,
    sigma: f64,
    oil_viscosity: f64,
    water_viscosity: f64,
    resistivity: f64,
    films_enabled: bool,
) {
    if !films_enabled || !e.is_open() || e.half_angles == [0.0; 3] {
        e.film_area_coefficient = 0.0;
        e.oil_film = FilmState::default();
        e.water_film = FilmState::default();
        return;
    }

    // Which phase hangs on in the corners, and at what effective angle.
    let (film_fluid, eff_theta) = match e.fluid {
        Fluid::Oil if e.theta < FRAC_PI_2 => (Fluid::Water, e.theta),
        Fluid::Water if e.theta > FRAC_PI_2 => (Fluid::Oil, PI - e.theta),
        _ => {
            e.film_area_coefficient = 0.0;
            e.oil_film = FilmState::default();
            e.water_film = FilmState::default();
            return;
        }
    };

    let coeff = film_area_coefficient(eff_theta, &e.half_angles);
    e.film_area_coefficient = coeff;
    if coeff <= 0.0 {
        e.oil_film = FilmState::default();
        e.water_film = FilmState::default();
        return;
    }

    let pc = e.capillary_pressure.abs();
    let (area, volume) = if pc > 0.0 {
        let curvature = sigma / pc;
        let area = curvature * curvature * coeff;
        (area, area * e.length)
    } else {
        (0.0, 0.0)
    };

    let (other_volume, viscosity) = match film_fluid {
        Fluid::Oil => (e.water_film.volume, oil_viscosity),
        _ => (e.oil_film.volume, water_viscosity),
    };
    let cap = (e.volume - other_volume).max(0.0);
    let volume = volume.min(cap);
    let area = if e.length > 0.0 { volume / e.length } else { area };

    let conductance = e.shape_factor_constant * area * area * e.shape_factor
        / (viscosity * e.length)
        / resistivity;

    let film = FilmState {
        active: volume > 0.0,
        volume,
        conductance,
    };
    match film_fluid {
        Fluid::Oil => {
            e.oil_film = film;
            e.water_film = FilmState::default();
        }
        _ => {
            e.water_film = film;
            e.oil_film = FilmState::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::G_TRIANGLE_MAX;
    use pn_network::{ElementGeometry, NetworkBuilder};
    use rand::SeedableRng;

    #[test]
    fn no_half_angles_above_triangle_limit() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(corner_half_angles(G_TRIANGLE_MAX + 1e-6, &mut rng).is_none());
        assert!(corner_half_angles(0.0625, &mut rng).is_none());
        assert!(corner_half_angles(0.0, &mut rng).is_none());
    }

    #[test]
    fn half_angles_sum_to_right_angle() {
        let mut rng = StdRng::seed_from_u64(1);
        for g in [0.01, 0.02, 0.03, 0.045] {
            let betas = corner_half_angles(g, &mut rng).unwrap();
            let sum: f64 = betas.iter().sum();
            assert!((sum - FRAC_PI_2).abs() < 1e-9, "g={g}: sum={sum}");
            for b in betas {
                assert!(b > 0.0 && b < FRAC_PI_2);
            }
        }
    }

    #[test]
    fn coefficient_zero_when_no_corner_sustains() {
        let mut rng = StdRng::seed_from_u64(2);
        let betas = corner_half_angles(0.03, &mut rng).unwrap();
        // Effective angle near π/2 kills every corner.
        assert_eq!(film_area_coefficient(FRAC_PI_2 - 1e-12, &betas), 0.0);
        assert!(film_area_coefficient(0.1, &betas) > 0.0);
    }

    #[test]
    fn film_volume_clipped_to_element_volume() {
        let mut b = NetworkBuilder::new();
        let n = b.add_node_with(
            [0.0; 3],
            ElementGeometry {
                radius: 10e-6,
                ..ElementGeometry::default()
            },
        );
        b.add_inlet_throat(n);
        b.add_outlet_throat(n);
        b.set_extents([1e-3; 3]);
        let mut net = b.build().unwrap();

        let mut rng = StdRng::seed_from_u64(3);
        let id = net.ids().next().unwrap();
        let e = &mut net[id];
        e.half_angles = corner_half_angles(e.shape_factor, &mut rng).unwrap();
        e.fluid = Fluid::Oil;
        e.theta = 0.2;
        // Tiny Pc inflates the raw film area; the clip must hold.
        e.capillary_pressure = 1e-6;
        update_films(e, 0.03, 1e-3, 1e-3, 100.0, true);
        assert!(e.water_film.active);
        assert!(e.water_film.volume <= e.volume);
        assert!(e.water_film.conductance > 0.0);
        assert!(!e.oil_film.active);
    }

    #[test]
    fn films_disabled_clears_state() {
        let mut b = NetworkBuilder::new();
        let n = b.add_node([0.0; 3]);
        b.add_inlet_throat(n);
        b.add_outlet_throat(n);
        b.set_extents([1e-3; 3]);
        let mut net = b.build().unwrap();
        let id = net.ids().next().unwrap();
        let e = &mut net[id];
        e.water_film.volume = 1.0;
        update_films(e, 0.03, 1e-3, 1e-3, 100.0, false);
        assert_eq!(e.water_film.volume, 0.0);
        assert!(!e.water_film.active);
    }
}
