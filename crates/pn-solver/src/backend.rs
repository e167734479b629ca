//! Linear-system backends: direct dense Cholesky and Jacobi-CG.

use crate::assembly::SparseSystem;
use crate::error::{SolverError, SolverResult};
use nalgebra::DVector;
use pn_core::config::{SolverBackend, SolverConfig};
use tracing::debug;

/// Solve the (SPD) assembled system with the configured backend.
pub fn solve_system(system: &SparseSystem, config: &SolverConfig) -> SolverResult<Vec<f64>> {
    if system.is_empty() {
        return Ok(Vec::new());
    }
    match config.backend {
        SolverBackend::Cholesky => cholesky(system),
        SolverBackend::ConjugateGradient => jacobi_cg(system, config),
    }
}

fn cholesky(system: &SparseSystem) -> SolverResult<Vec<f64>> {
    let a = system.to_dense();
    let b = DVector::from_column_slice(&system.rhs);
    let chol = a
        .cholesky()
        .ok_or_else(|| SolverError::NotPositiveDefinite {
            what: format!("dense Cholesky failed for n={}", system.len()),
        })?;
    let x = chol.solve(&b);
    Ok(x.as_slice().to_vec())
}

/// Jacobi-preconditioned conjugate gradient.
fn jacobi_cg(system: &SparseSystem, config: &SolverConfig) -> SolverResult<Vec<f64>> {
    let n = system.len();
    let diag = system.diagonal();
    if diag.iter().any(|&d| !(d > 0.0)) {
        return Err(SolverError::NotPositiveDefinite {
            what: "zero or negative diagonal entry".into(),
        });
    }

    let b_norm: f64 = system.rhs.iter().map(|v| v * v).sum::<f64>().sqrt();
    if b_norm == 0.0 {
        return Ok(vec![0.0; n]);
    }
    let tol = config.tolerance.max(1e-300);

    let mut x = vec![0.0; n];
    let mut r = system.rhs.clone();
    let mut z: Vec<f64> = r.iter().zip(&diag).map(|(ri, di)| ri / di).collect();
    let mut p = z.clone();
    let mut rz: f64 = r.iter().zip(&z).map(|(a, b)| a * b).sum();
    let mut ap = vec![0.0; n];

    for iter in 0..config.max_iterations {
        system.matvec(&p, &mut ap);
        let p_ap: f64 = p.iter().zip(&ap).map(|(a, b)| a * b).sum();
        if !(p_ap > 0.0) {
            return Err(SolverError::NotPositiveDefinite {
                what: format!("pᵀAp = {p_ap} at iteration {iter}"),
            });
        }
        let alpha = rz / p_ap;
        for i in 0..n {
            x[i] += alpha * p[i];
            r[i] -= alpha * ap[i];
        }

        let r_norm: f64 = r.iter().map(|v| v * v).sum::<f64>().sqrt();
        if r_norm <= tol * b_norm {
            debug!(iterations = iter + 1, residual = r_norm, "cg converged");
            return Ok(x);
        }

        for i in 0..n {
            z[i] = r[i] / diag[i];
        }
        let rz_next: f64 = r.iter().zip(&z).map(|(a, b)| a * b).sum();
        let beta = rz_next / rz;
        rz = rz_next;
        for i in 0..n {
            p[i] = z[i] + beta * p[i];
        }
    }

    Err(SolverError::ConvergenceFailed {
        what: format!(
            "cg did not reach tolerance {tol} within {} iterations",
            config.max_iterations
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_system(n: usize, g: f64, p_in: f64, p_out: f64) -> SparseSystem {
        // n internal nodes in series between two Dirichlet boundaries.
        let mut sys = SparseSystem::new(n);
        for i in 0..n {
            sys.add(i, i, 2.0 * g);
            if i > 0 {
                sys.add(i, i - 1, -g);
            }
            if i + 1 < n {
                sys.add(i, i + 1, -g);
            }
        }
        sys.add_rhs(0, g * p_in);
        sys.add_rhs(n - 1, g * p_out);
        sys.finish();
        sys
    }

    #[test]
    fn both_backends_agree_on_chain() {
        let sys = chain_system(5, 3.0, 2.0, 1.0);
        let direct = cholesky(&sys).unwrap();
        let cfg = SolverConfig {
            backend: SolverBackend::ConjugateGradient,
            tolerance: 1e-14,
            max_iterations: 1000,
        };
        let iterative = jacobi_cg(&sys, &cfg).unwrap();
        for (a, b) in direct.iter().zip(&iterative) {
            assert!((a - b).abs() < 1e-9);
        }
        // Linear profile between boundaries.
        assert!(direct[0] > direct[4]);
    }

    #[test]
    fn zero_rhs_gives_zero_solution() {
        let mut sys = SparseSystem::new(3);
        for i in 0..3 {
            sys.add(i, i, 1.0);
        }
        sys.finish();
        let cfg = SolverConfig::default();
        let x = jacobi_cg(&sys, &cfg).unwrap();
        assert!(x.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn empty_system_is_fine() {
        let mut sys = SparseSystem::new(0);
        sys.finish();
        let x = solve_system(&sys, &SolverConfig::default()).unwrap();
        assert!(x.is_empty());
    }
}
