//! Network preparation: initial wetting state and post-drainage alteration.

use pn_capillary::corner_half_angles;
use pn_core::CaseConfig;
use pn_network::{Fluid, Network, Wettability};
use rand::Rng;
use rand::rngs::StdRng;
use tracing::info;

fn sample_angle(range: (f64, f64), rng: &mut StdRng) -> f64 {
    let (lo, hi) = range;
    if hi > lo { rng.gen_range(lo..hi) } else { lo }
}

/// Put the network into its initial water-saturated, uniformly water-wet
/// state: corner half-angles drawn from the seeded RNG, contact angles from
/// the water-wet range. Elements whose shape factor admits no triangular
/// cross section get zeroed half-angles and never carry films.
pub fn prepare_network(network: &mut Network, config: &CaseConfig, rng: &mut StdRng) {
    network.reset_state(Fluid::Water);
    let ids: Vec<_> = network.ids().collect();
    for id in ids {
        if network[id].closed {
            continue;
        }
        let betas = corner_half_angles(network[id].shape_factor, rng).unwrap_or([0.0; 3]);
        let theta = sample_angle(config.wettability.water_wet_theta, rng);
        let e = &mut network[id];
        e.half_angles = betas;
        e.theta = theta;
        e.original_theta = theta;
        e.wettability = Wettability::WaterWet;
    }
}

/// Wettability alteration after primary drainage: a configured fraction of
/// the oil-invaded elements turns oil-wet, with new contact angles drawn
/// from the oil-wet range. Water-filled elements keep their angles.
pub fn alter_wettability(network: &mut Network, config: &CaseConfig, rng: &mut StdRng) {
    let fraction = config.wettability.oil_wet_fraction;
    if !(fraction > 0.0) {
        return;
    }
    let mut altered = 0usize;
    let ids: Vec<_> = network.ids().collect();
    for id in ids {
        if !network[id].is_open() || network[id].fluid != Fluid::Oil {
            continue;
        }
        if rng.r#gen::<f64>() < fraction {
            let theta = sample_angle(config.wettability.oil_wet_theta, rng);
            let e = &mut network[id];
            e.wettability = Wettability::OilWet;
            e.theta = theta;
            e.original_theta = theta;
            altered += 1;
        }
    }
    info!(altered, "wettability alteration applied");
}
