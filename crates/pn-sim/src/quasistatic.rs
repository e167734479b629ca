//! Quasi-static invasion percolation: capillary-pressure sweeps.
//!
//! Each stage imposes a sequence of capillary pressures and lets the
//! invading phase occupy every element it can reach at that pressure
//! (piston displacement from a connected invader conductor, or snap-off
//! through the element's own corner film). Viscous forces play no role;
//! the pressure solver is only consulted when relative permeability
//! sampling is on.

use crate::error::SimResult;
use crate::state::{StageOutcome, StageState};
use pn_capillary::{competitive_entry_pressure, entry_pressure, snapoff_pressure, update_films};
use pn_cluster::{PartitionSlot, Partitions, cluster};
use pn_core::{CancelToken, CaseConfig, ElementId, ProgressEvent, ProgressSink, SnapshotFrame};
use pn_network::{Element, Fluid, Network};
use pn_results::Series;
use pn_solver::relative_permeability;
use tracing::{debug, info};

/// The five displacement stages of a full cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageKind {
    PrimaryDrainage,
    SpontaneousImbibition,
    ForcedWaterInjection,
    SpontaneousOilInvasion,
    SecondaryDrainage,
}

impl StageKind {
    /// Canonical cycle order.
    pub const SEQUENCE: [StageKind; 5] = [
        StageKind::PrimaryDrainage,
        StageKind::SpontaneousImbibition,
        StageKind::ForcedWaterInjection,
        StageKind::SpontaneousOilInvasion,
        StageKind::SecondaryDrainage,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StageKind::PrimaryDrainage => "primary_drainage",
            StageKind::SpontaneousImbibition => "spontaneous_imbibition",
            StageKind::ForcedWaterInjection => "forced_water_injection",
            StageKind::SpontaneousOilInvasion => "spontaneous_oil_invasion",
            StageKind::SecondaryDrainage => "secondary_drainage",
        }
    }

    pub fn invading_fluid(self) -> Fluid {
        match self {
            StageKind::PrimaryDrainage
            | StageKind::SpontaneousOilInvasion
            | StageKind::SecondaryDrainage => Fluid::Oil,
            StageKind::SpontaneousImbibition | StageKind::ForcedWaterInjection => Fluid::Water,
        }
    }

    pub fn defending_fluid(self) -> Fluid {
        match self.invading_fluid() {
            Fluid::Oil => Fluid::Water,
            _ => Fluid::Oil,
        }
    }

    /// Oil-invading stages sweep Pc upward, water-invading ones downward.
    pub fn ascending(self) -> bool {
        self.invading_fluid() == Fluid::Oil
    }
}

/// Everything one finished stage leaves behind.
#[derive(Debug)]
pub struct StageReport {
    pub kind: StageKind,
    pub outcome: StageOutcome,
    pub state: StageState,
    /// Number of Pc steps the sweep contained.
    pub steps: usize,
    pub final_sw: f64,
    /// (Sw, Pc) samples at ≥1% saturation spacing.
    pub pc_curve: Series,
    /// (Sw, Krw, Kro) samples when relative-permeability sampling is on.
    pub kr_curve: Option<Series>,
}

/// An element conducts a phase through its bulk or through an active film.
fn conducts(e: &Element, fluid: Fluid) -> bool {
    e.fluid == fluid || e.film(fluid).is_some_and(|f| f.active)
}

fn conductor_slot(fluid: Fluid) -> PartitionSlot {
    match fluid {
        Fluid::Oil => PartitionSlot::OilConductor,
        _ => PartitionSlot::WaterConductor,
    }
}

fn film_slot(fluid: Fluid) -> PartitionSlot {
    match fluid {
        Fluid::Oil => PartitionSlot::OilFilmConductor,
        _ => PartitionSlot::WaterFilmConductor,
    }
}

/// Snap-off only competes in the spontaneous stages; the forced stages are
/// piston-only.
fn snapoff_allowed(kind: StageKind) -> bool {
    matches!(
        kind,
        StageKind::SpontaneousImbibition | StageKind::SpontaneousOilInvasion
    )
}

/// Recompute the partitions one invasion wave consults: both phases'
/// conductor clusters plus, where snap-off applies, the invader's
/// film-only clusters.
fn refresh_partitions(parts: &mut Partitions, network: &Network, kind: StageKind, films: bool) {
    let invader = kind.invading_fluid();
    let defender = kind.defending_fluid();
    parts.invalidate_all();
    parts.set(
        conductor_slot(invader),
        cluster(network, |e| conducts(e, invader)),
    );
    parts.set(
        conductor_slot(defender),
        cluster(network, |e| conducts(e, defender)),
    );
    if films {
        parts.set(
            film_slot(invader),
            cluster(network, |e| e.film(invader).is_some_and(|f| f.active)),
        );
    }
}

/// Imposed-pressure sequence for one stage, derived from the entry-pressure
/// range of the open elements. Spontaneous stages clip at Pc = 0; a clip
/// that inverts the range collapses the sweep to a single step.
fn sweep_pressures(network: &Network, config: &CaseConfig, kind: StageKind) -> Vec<f64> {
    let sigma = config.fluids.interfacial_tension;
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for e in network.elements().iter().filter(|e| e.is_open()) {
        let pe = entry_pressure(e, sigma);
        lo = lo.min(pe);
        hi = hi.max(pe);
    }
    if !lo.is_finite() || !hi.is_finite() {
        return Vec::new();
    }

    let (start, mut end) = match kind {
        StageKind::PrimaryDrainage | StageKind::SecondaryDrainage => (lo, hi),
        StageKind::SpontaneousImbibition => (hi, lo.max(0.0)),
        StageKind::ForcedWaterInjection => (hi.min(0.0), lo.min(0.0)),
        StageKind::SpontaneousOilInvasion => (lo.min(0.0), hi.min(0.0)),
    };
    if kind.ascending() {
        end = end.max(start);
    } else {
        end = end.min(start);
    }

    let n = config.pc_steps;
    if n == 1 {
        return vec![end];
    }
    (0..n)
        .map(|i| start + (end - start) * i as f64 / (n - 1) as f64)
        .collect()
}

/// Elements qualifying for invasion at `pc` in one simultaneous wave.
/// `film_only` restricts qualification to the snap-off path.
fn collect_wave(
    network: &Network,
    config: &CaseConfig,
    kind: StageKind,
    parts: &Partitions,
    pc: f64,
    film_only: bool,
) -> Vec<ElementId> {
    let invader = kind.invading_fluid();
    let defender = kind.defending_fluid();
    let sigma = config.fluids.interfacial_tension;
    let crossed = |pe: f64| if kind.ascending() { pe <= pc } else { pe >= pc };
    let invader_conds = parts.get_or_empty(conductor_slot(invader));
    let defender_conds = parts.get_or_empty(conductor_slot(defender));
    let invader_films = parts.get_or_empty(film_slot(invader));

    let mut wave: Vec<ElementId> = Vec::new();
    for id in network.ids() {
        let e = &network[id];
        if !e.is_open() || e.fluid != defender || e.trapped(defender) {
            continue;
        }
        // The defending phase must keep an escape route to the outlet.
        if !defender_conds.reaches_outlet(id) {
            continue;
        }

        // Snap-off through this element's own corner film, supplied by an
        // inlet-reaching film cluster.
        let snap_off = config.films
            && snapoff_allowed(kind)
            && e.film(invader).is_some_and(|f| f.active)
            && invader_films.reaches_inlet(id)
            && crossed(snapoff_pressure(e, sigma));
        if film_only {
            if snap_off {
                wave.push(id);
            }
            continue;
        }

        // Piston displacement from an inlet-connected invader conductor.
        let piston = (e.is_inlet()
            || e.neighbors
                .iter()
                .any(|&nb| invader_conds.reaches_inlet(nb)))
            && {
                let pe = if e.is_node() {
                    let filled = e
                        .neighbors
                        .iter()
                        .filter(|&&nb| network[nb].fluid == invader)
                        .count();
                    competitive_entry_pressure(e, sigma, filled)
                } else {
                    entry_pressure(e, sigma)
                };
                crossed(pe)
            };
        if piston || snap_off {
            wave.push(id);
        }
    }
    wave
}

/// Hand every element of one wave to the invader at the imposed pressure.
fn apply_wave(
    network: &mut Network,
    config: &CaseConfig,
    invader: Fluid,
    pc: f64,
    wave: &[ElementId],
) {
    let sigma = config.fluids.interfacial_tension;
    for &id in wave {
        let e = &mut network[id];
        e.fluid = invader;
        e.capillary_pressure = pc;
        update_films(
            e,
            sigma,
            config.fluids.oil_viscosity,
            config.fluids.water_viscosity,
            config.film_conductance_resistivity,
            config.films,
        );
        e.water_fraction = match invader {
            Fluid::Water => 1.0 - e.oil_film.volume / e.volume.max(f64::MIN_POSITIVE),
            _ => e.water_film.volume / e.volume.max(f64::MIN_POSITIVE),
        };
    }
}

/// Fixed-point invasion at one capillary pressure. In the spontaneous
/// stages a film-only pre-pass lets snap-off run to exhaustion through the
/// corner network before any piston advance; the main passes then admit
/// both paths, each wave simultaneous, until no element qualifies. Returns
/// the invasion count and whether cancellation was observed between waves.
fn invade_at_pc(
    network: &mut Network,
    config: &CaseConfig,
    kind: StageKind,
    pc: f64,
    parts: &mut Partitions,
    cancel: &CancelToken,
) -> (usize, bool) {
    let invader = kind.invading_fluid();
    let with_films = config.films && snapoff_allowed(kind);
    let mut invaded = 0usize;

    if with_films {
        loop {
            refresh_partitions(parts, network, kind, true);
            let wave = collect_wave(network, config, kind, parts, pc, true);
            if wave.is_empty() {
                break;
            }
            invaded += wave.len();
            apply_wave(network, config, invader, pc, &wave);
            if cancel.is_cancelled() {
                return (invaded, true);
            }
        }
    }

    loop {
        refresh_partitions(parts, network, kind, with_films);
        let wave = collect_wave(network, config, kind, parts, pc, false);
        if wave.is_empty() {
            return (invaded, false);
        }
        invaded += wave.len();
        apply_wave(network, config, invader, pc, &wave);
        if cancel.is_cancelled() {
            return (invaded, true);
        }
    }
}

/// Flag elements whose phase lost its lifeline: the defending phase traps
/// when its cluster no longer reaches the outlet, the invading phase when
/// its cluster no longer reaches the inlet. Flags are permanent within a
/// stage; trapped elements never rejoin the frontier.
fn dismiss_trapped(network: &mut Network, kind: StageKind, parts: &mut Partitions) {
    let invader = kind.invading_fluid();
    let defender = kind.defending_fluid();
    refresh_partitions(parts, network, kind, false);
    let invader_conds = parts.get_or_empty(conductor_slot(invader));
    let defender_conds = parts.get_or_empty(conductor_slot(defender));

    let mut trap: Vec<(ElementId, Fluid)> = Vec::new();
    for id in network.ids() {
        let e = &network[id];
        if !e.is_open() {
            continue;
        }
        if conducts(e, defender) && !defender_conds.reaches_outlet(id) {
            trap.push((id, defender));
        }
        if conducts(e, invader) && !invader_conds.reaches_inlet(id) {
            trap.push((id, invader));
        }
    }
    for (id, fluid) in trap {
        network[id].set_trapped(fluid, true);
    }
}

/// Re-equilibrate films and fractions at the imposed pressure. Trapped
/// elements keep their frozen capillary pressure; everything else hinges
/// to the new one.
fn adjust_volumes(network: &mut Network, config: &CaseConfig, pc: f64) {
    let sigma = config.fluids.interfacial_tension;
    let ids: Vec<_> = network.ids().collect();
    for id in ids {
        let e = &mut network[id];
        if !e.is_open() {
            continue;
        }
        if !e.oil_trapped && !e.water_trapped {
            e.capillary_pressure = pc;
        }
        update_films(
            e,
            sigma,
            config.fluids.oil_viscosity,
            config.fluids.water_viscosity,
            config.film_conductance_resistivity,
            config.films,
        );
        if e.volume > 0.0 {
            e.water_fraction = match e.fluid {
                Fluid::Water => 1.0 - e.oil_film.volume / e.volume,
                _ => e.water_film.volume / e.volume,
            };
        }
        e.concentration = e.water_fraction;
    }
}

fn snapshot(network: &Network, step: usize) -> SnapshotFrame {
    SnapshotFrame {
        step,
        fluids: network.elements().iter().map(|e| e.fluid.code()).collect(),
        concentrations: network.elements().iter().map(|e| e.concentration).collect(),
    }
}

/// Run one quasi-static stage over the network's current state.
///
/// The caller prepares the initial occupancy (a fresh water-filled network
/// for primary drainage, the previous stage's end state otherwise).
/// `target_sw` stops the sweep early once the invading phase has pushed
/// saturation past it.
pub fn run_stage(
    network: &mut Network,
    config: &CaseConfig,
    kind: StageKind,
    cancel: &CancelToken,
    sink: &mut dyn ProgressSink,
    target_sw: Option<f64>,
) -> SimResult<StageReport> {
    let sweep = sweep_pressures(network, config, kind);
    info!(stage = kind.label(), steps = sweep.len(), "stage start");

    // Trapping is per-stage.
    for id in network.ids().collect::<Vec<_>>() {
        let e = &mut network[id];
        e.oil_trapped = false;
        e.water_trapped = false;
    }

    let mut pc_curve = Series::new(format!("{}_pc", kind.label()), &["Sw", "Pc"]);
    let mut kr_curve = config
        .sample_rel_perm
        .then(|| Series::new(format!("{}_kr", kind.label()), &["Sw", "Krw", "Kro"]));

    let mut parts = Partitions::new();
    let mut state = StageState::NotStarted;
    let mut outcome = StageOutcome::Completed;
    let mut last_sample = f64::INFINITY;
    let total = sweep.len().max(1);

    for (step, &pc) in sweep.iter().enumerate() {
        if cancel.is_cancelled() {
            outcome = StageOutcome::Cancelled;
            break;
        }
        state = StageState::Stepping { step, pc };
        let (invaded, cancelled) = invade_at_pc(network, config, kind, pc, &mut parts, cancel);
        dismiss_trapped(network, kind, &mut parts);
        adjust_volumes(network, config, pc);

        let sw = network.water_saturation();
        debug!(step, pc, invaded, sw, "pc step");

        if (sw - last_sample).abs() >= 0.01 || step == 0 || step + 1 == total {
            pc_curve.push(&[sw, pc])?;
            if let Some(kr) = &mut kr_curve {
                let krw = relative_permeability(network, config, Fluid::Water)?;
                let kro = relative_permeability(network, config, Fluid::Oil)?;
                kr.push(&[sw, krw, kro])?;
            }
            if config.capture_snapshots {
                sink.on_snapshot(snapshot(network, step));
            }
            last_sample = sw;
        }
        sink.on_progress(ProgressEvent {
            percent: ((step + 1) * 100 / total) as u8,
            status: format!("{} pc={pc:.3e} Sw={sw:.3}", kind.label()),
        });

        if cancelled {
            outcome = StageOutcome::Cancelled;
            break;
        }
        if let Some(t) = target_sw {
            let reached = if kind.invading_fluid() == Fluid::Water {
                sw >= t
            } else {
                sw <= t
            };
            if reached {
                outcome = StageOutcome::TargetReached;
                break;
            }
        }
    }

    // A cancelled stage reports where it stopped; a finished one terminates.
    if outcome != StageOutcome::Cancelled {
        state = StageState::Terminated;
    }
    let final_sw = network.water_saturation();
    info!(stage = kind.label(), ?outcome, final_sw, "stage finished");
    Ok(StageReport {
        kind,
        outcome,
        state,
        steps: sweep.len(),
        final_sw,
        pc_curve,
        kr_curve,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prep::prepare_network;
    use pn_core::NullSink;
    use pn_network::LatticeSpec;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn prepared(nx: u32, ny: u32) -> (Network, CaseConfig) {
        let spec = LatticeSpec {
            nx,
            ny,
            nz: 1,
            ..LatticeSpec::default()
        };
        let mut rng = StdRng::seed_from_u64(7);
        let mut net = spec.build(&mut rng).unwrap();
        let cfg = CaseConfig::default();
        let mut case_rng = cfg.rng();
        prepare_network(&mut net, &cfg, &mut case_rng);
        (net, cfg)
    }

    #[test]
    fn invading_and_defending_fluids_are_consistent() {
        for kind in StageKind::SEQUENCE {
            assert_ne!(kind.invading_fluid(), kind.defending_fluid());
            assert_eq!(kind.ascending(), kind.invading_fluid() == Fluid::Oil);
        }
        assert_eq!(StageKind::PrimaryDrainage.invading_fluid(), Fluid::Oil);
        assert_eq!(
            StageKind::ForcedWaterInjection.invading_fluid(),
            Fluid::Water
        );
    }

    #[test]
    fn drainage_sweep_ascends_imbibition_descends() {
        let (net, cfg) = prepared(3, 3);
        let up = sweep_pressures(&net, &cfg, StageKind::PrimaryDrainage);
        assert!(up.windows(2).all(|w| w[1] >= w[0]));
        let down = sweep_pressures(&net, &cfg, StageKind::SpontaneousImbibition);
        assert!(down.windows(2).all(|w| w[1] <= w[0]));
        // Water-wet network: the spontaneous sweep never goes negative.
        assert!(down.iter().all(|&pc| pc >= 0.0));
    }

    #[test]
    fn primary_drainage_desaturates_monotonically() {
        let (mut net, cfg) = prepared(4, 4);
        let cancel = CancelToken::default();
        let mut sink = NullSink;
        let report = run_stage(
            &mut net,
            &cfg,
            StageKind::PrimaryDrainage,
            &cancel,
            &mut sink,
            None,
        )
        .unwrap();
        assert_eq!(report.outcome, StageOutcome::Completed);
        assert_eq!(report.state, StageState::Terminated);
        // Sw never rises while oil invades.
        let sws: Vec<f64> = report.pc_curve.rows().iter().map(|r| r[0]).collect();
        assert!(sws.windows(2).all(|w| w[1] <= w[0] + 1e-12), "{sws:?}");
        assert!(report.final_sw < 1.0);
    }

    #[test]
    fn drainage_then_imbibition_recovers_water() {
        let (mut net, cfg) = prepared(4, 4);
        let cancel = CancelToken::default();
        let mut sink = NullSink;
        let drained = run_stage(
            &mut net,
            &cfg,
            StageKind::PrimaryDrainage,
            &cancel,
            &mut sink,
            None,
        )
        .unwrap();
        let imbibed = run_stage(
            &mut net,
            &cfg,
            StageKind::SpontaneousImbibition,
            &cancel,
            &mut sink,
            None,
        )
        .unwrap();
        assert!(imbibed.final_sw >= drained.final_sw);
    }

    #[test]
    fn trapped_defender_is_never_invaded() {
        let (mut net, cfg) = prepared(4, 4);
        let cancel = CancelToken::default();
        let mut sink = NullSink;
        run_stage(
            &mut net,
            &cfg,
            StageKind::PrimaryDrainage,
            &cancel,
            &mut sink,
            None,
        )
        .unwrap();
        // Any water flagged trapped during drainage must still be water.
        for id in net.ids() {
            let e = &net[id];
            if e.water_trapped && e.fluid == Fluid::Water {
                assert!(e.is_open());
            }
        }
    }

    #[test]
    fn cancelled_before_first_step_leaves_network_saturated() {
        let (mut net, cfg) = prepared(3, 3);
        let cancel = CancelToken::default();
        cancel.cancel();
        let mut sink = NullSink;
        let report = run_stage(
            &mut net,
            &cfg,
            StageKind::PrimaryDrainage,
            &cancel,
            &mut sink,
            None,
        )
        .unwrap();
        assert_eq!(report.outcome, StageOutcome::Cancelled);
        assert_eq!(report.state, StageState::NotStarted);
        assert!((report.final_sw - 1.0).abs() < 1e-12);
    }

    #[test]
    fn mid_sweep_cancellation_reports_the_interrupted_step() {
        struct CancelOnProgress<'a>(&'a CancelToken);
        impl ProgressSink for CancelOnProgress<'_> {
            fn on_progress(&mut self, _event: ProgressEvent) {
                self.0.cancel();
            }
        }

        let (mut net, cfg) = prepared(3, 3);
        let cancel = CancelToken::default();
        let mut sink = CancelOnProgress(&cancel);
        let report = run_stage(
            &mut net,
            &cfg,
            StageKind::PrimaryDrainage,
            &cancel,
            &mut sink,
            None,
        )
        .unwrap();
        assert_eq!(report.outcome, StageOutcome::Cancelled);
        assert!(matches!(report.state, StageState::Stepping { step: 0, .. }));
    }

    #[test]
    fn snap_off_is_gated_to_spontaneous_stages() {
        let (mut net, cfg) = prepared(3, 3);
        net.reset_state(Fluid::Oil);
        // An active water film on the first inlet throat and its node makes
        // the film web reach the injection boundary.
        let inlet_throat = net
            .throat_ids()
            .find(|&id| net[id].is_inlet())
            .unwrap();
        let node = net[inlet_throat].throat().unwrap().nodes[1].unwrap();
        for id in [inlet_throat, node] {
            net[id].water_film.active = true;
            net[id].water_film.volume = 1e-18;
        }

        let mut parts = Partitions::new();
        refresh_partitions(&mut parts, &net, StageKind::SpontaneousImbibition, true);
        let wave = collect_wave(
            &net,
            &cfg,
            StageKind::SpontaneousImbibition,
            &parts,
            0.0,
            true,
        );
        assert!(wave.contains(&inlet_throat));
        assert!(wave.contains(&node));

        // The forced stage never takes the film path.
        refresh_partitions(&mut parts, &net, StageKind::ForcedWaterInjection, true);
        let forced = collect_wave(
            &net,
            &cfg,
            StageKind::ForcedWaterInjection,
            &parts,
            0.0,
            true,
        );
        assert!(forced.is_empty());
    }

    #[test]
    fn target_saturation_stops_the_sweep_early() {
        let (mut net, cfg) = prepared(4, 4);
        let cancel = CancelToken::default();
        let mut sink = NullSink;
        let report = run_stage(
            &mut net,
            &cfg,
            StageKind::PrimaryDrainage,
            &cancel,
            &mut sink,
            Some(0.9),
        )
        .unwrap();
        if report.outcome == StageOutcome::TargetReached {
            assert!(report.final_sw <= 0.9);
            assert!(report.pc_curve.len() <= cfg.pc_steps);
        }
    }
}
