//! Immutable per-case configuration.
//!
//! A `CaseConfig` is resolved once before any simulation stage runs and is
//! treated as read-only afterwards. Raw values are stored as plain SI `f64`
//! so the whole bag stays serde-friendly; typed accessors hand out `uom`
//! quantities at the boundaries that want them.

use crate::error::{CoreError, CoreResult};
use crate::units::{DynVisc, Pressure, VolumeRate, m3ps, pa, pa_s};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Linear-system backend for the pressure solver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverBackend {
    /// Direct dense Cholesky factorization.
    Cholesky,
    /// Jacobi-preconditioned conjugate gradient (default for large networks).
    #[default]
    ConjugateGradient,
}

/// Fluid pair properties (SI units).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FluidConfig {
    /// Oil/water interfacial tension (N/m).
    pub interfacial_tension: f64,
    /// Oil dynamic viscosity (Pa·s).
    pub oil_viscosity: f64,
    /// Water dynamic viscosity (Pa·s).
    pub water_viscosity: f64,
}

impl Default for FluidConfig {
    fn default() -> Self {
        Self {
            interfacial_tension: 0.03,
            oil_viscosity: 1e-3,
            water_viscosity: 1e-3,
        }
    }
}

/// Wettability alteration applied after primary drainage.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WettabilityConfig {
    /// Fraction of oil-invaded elements converted to oil-wet, in [0,1].
    pub oil_wet_fraction: f64,
    /// Receding contact angle range for water-wet elements (radians).
    pub water_wet_theta: (f64, f64),
    /// Receding contact angle range for oil-wet elements (radians).
    pub oil_wet_theta: (f64, f64),
}

impl Default for WettabilityConfig {
    fn default() -> Self {
        Self {
            oil_wet_fraction: 0.0,
            water_wet_theta: (0.0, std::f64::consts::FRAC_PI_3),
            oil_wet_theta: (2.0 * std::f64::consts::FRAC_PI_3, std::f64::consts::PI),
        }
    }
}

/// Pressure solver settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SolverConfig {
    pub backend: SolverBackend,
    /// Convergence tolerance for the iterative backend.
    pub tolerance: f64,
    /// Iteration cap for the iterative backend.
    pub max_iterations: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            backend: SolverBackend::ConjugateGradient,
            tolerance: 1e-12,
            max_iterations: 5000,
        }
    }
}

/// The immutable case parameter bag (spec'd fluids, sweep, solver, films).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CaseConfig {
    pub fluids: FluidConfig,
    pub wettability: WettabilityConfig,
    pub solver: SolverConfig,

    /// Number of capillary-pressure steps per quasi-static stage.
    pub pc_steps: usize,
    /// Sample relative permeability alongside (Sw, Pc) points.
    pub sample_rel_perm: bool,
    /// Capture per-element snapshot frames for replay.
    pub capture_snapshots: bool,

    /// Dirichlet boundary pressures for constant-gradient solves (Pa).
    pub inlet_pressure: f64,
    pub outlet_pressure: f64,

    /// Imposed inlet rate for unsteady displacement (m³/s).
    pub injection_rate: f64,
    /// Stop after this many injected pore volumes.
    pub target_injected_pvs: f64,
    /// Hard cap on unsteady time steps.
    pub max_time_steps: usize,

    /// Corner films enabled.
    pub films: bool,
    /// Divisor applied to film conductance when the film is the element's
    /// only conductive path for its phase.
    pub film_conductance_resistivity: f64,

    /// Fractions may stray this far outside [0,1] before the run aborts.
    pub fraction_tolerance: f64,

    /// RNG seed for contact-angle and corner-geometry sampling.
    pub seed: u64,
}

impl Default for CaseConfig {
    fn default() -> Self {
        Self {
            fluids: FluidConfig::default(),
            wettability: WettabilityConfig::default(),
            solver: SolverConfig::default(),
            pc_steps: 50,
            sample_rel_perm: false,
            capture_snapshots: false,
            inlet_pressure: 2.0,
            outlet_pressure: 1.0,
            injection_rate: 1e-10,
            target_injected_pvs: 1.0,
            max_time_steps: 200_000,
            films: true,
            film_conductance_resistivity: 100.0,
            fraction_tolerance: 1e-8,
            seed: 0,
        }
    }
}

impl CaseConfig {
    /// Reject configurations that cannot drive any stage.
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.fluids.interfacial_tension > 0.0) {
            return Err(CoreError::Config {
                what: format!(
                    "interfacial tension must be positive, got {}",
                    self.fluids.interfacial_tension
                ),
            });
        }
        if !(self.fluids.oil_viscosity > 0.0) || !(self.fluids.water_viscosity > 0.0) {
            return Err(CoreError::Config {
                what: "viscosities must be positive".into(),
            });
        }
        if self.pc_steps == 0 {
            return Err(CoreError::Config {
                what: "pc_steps must be at least 1".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.wettability.oil_wet_fraction) {
            return Err(CoreError::Config {
                what: format!(
                    "oil_wet_fraction must lie in [0,1], got {}",
                    self.wettability.oil_wet_fraction
                ),
            });
        }
        if !(1e-25..=1e-8).contains(&self.solver.tolerance) {
            return Err(CoreError::Config {
                what: format!(
                    "solver tolerance must lie in [1e-25, 1e-8], got {}",
                    self.solver.tolerance
                ),
            });
        }
        if self.solver.max_iterations == 0 {
            return Err(CoreError::Config {
                what: "solver max_iterations must be at least 1".into(),
            });
        }
        if self.inlet_pressure <= self.outlet_pressure {
            return Err(CoreError::Config {
                what: format!(
                    "inlet pressure ({}) must exceed outlet pressure ({})",
                    self.inlet_pressure, self.outlet_pressure
                ),
            });
        }
        if !(self.injection_rate > 0.0) {
            return Err(CoreError::Config {
                what: "injection_rate must be positive".into(),
            });
        }
        if !(self.target_injected_pvs > 0.0) {
            return Err(CoreError::Config {
                what: "target_injected_pvs must be positive".into(),
            });
        }
        if !(self.film_conductance_resistivity >= 1.0) {
            return Err(CoreError::Config {
                what: "film_conductance_resistivity must be >= 1".into(),
            });
        }
        Ok(())
    }

    /// Seeded RNG for this case; a fixed seed makes runs reproducible.
    pub fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed)
    }

    pub fn oil_viscosity(&self) -> DynVisc {
        pa_s(self.fluids.oil_viscosity)
    }

    pub fn water_viscosity(&self) -> DynVisc {
        pa_s(self.fluids.water_viscosity)
    }

    pub fn inlet_pressure_pa(&self) -> Pressure {
        pa(self.inlet_pressure)
    }

    pub fn outlet_pressure_pa(&self) -> Pressure {
        pa(self.outlet_pressure)
    }

    pub fn injection_rate_si(&self) -> VolumeRate {
        m3ps(self.injection_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        CaseConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_bad_tension() {
        let mut cfg = CaseConfig::default();
        cfg.fluids.interfacial_tension = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_inverted_boundary_pressures() {
        let mut cfg = CaseConfig::default();
        cfg.inlet_pressure = 1.0;
        cfg.outlet_pressure = 2.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_solver_tolerance() {
        let mut cfg = CaseConfig::default();
        cfg.solver.tolerance = 1e-3;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        use rand::Rng;
        let cfg = CaseConfig::default();
        let a: f64 = cfg.rng().r#gen();
        let b: f64 = cfg.rng().r#gen();
        assert_eq!(a, b);
    }
}
