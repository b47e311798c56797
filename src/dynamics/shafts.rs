//! Velocity-level projection for networks of 1-DOF shafts.
//!
//! Each step first advances every degree of freedom with its applied torque,
//! `w* = w + dt τ / J`, then projects the speeds onto the relation rows
//! `C w = 0` exactly: `(C M⁻¹ Cᵀ) μ = -C w*`, `w = w* + M⁻¹ Cᵀ μ`.
//! The torque row `k` exerts on member `i` is `C_ki μ_k / dt`.

use crate::config::SHAFT_PIVOT_EPSILON;
use crate::error::{VehicleError, VehicleResult};

/// One rotational degree of freedom taking part in the projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkDof {
    pub inertia: f64,
    pub speed: f64,
    pub torque: f64,
}

/// Sparse velocity constraint `Σ c · w[dof] = 0`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkRow {
    pub entries: Vec<(usize, f64)>,
}

/// Speeds after projection and the torque each row applied to each of its entries.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkSolution {
    pub speeds: Vec<f64>,
    pub row_torques: Vec<Vec<f64>>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ShaftStepMetrics {
    pub dofs: usize,
    pub rows: usize,
    pub max_residual: f64,
}

/// Direct solver for the shaft network; networks are small so a dense factorization is used.
#[derive(Debug, Clone, Copy)]
pub struct ShaftNetworkSolver {
    pivot_epsilon: f64,
    metrics: ShaftStepMetrics,
}

impl Default for ShaftNetworkSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaftNetworkSolver {
    pub fn new() -> Self {
        Self {
            pivot_epsilon: SHAFT_PIVOT_EPSILON,
            metrics: ShaftStepMetrics::default(),
        }
    }

    pub fn last_metrics(&self) -> ShaftStepMetrics {
        self.metrics
    }

    pub fn solve(
        &mut self,
        dofs: &[NetworkDof],
        rows: &[NetworkRow],
        dt: f64,
    ) -> VehicleResult<NetworkSolution> {
        let mut speeds: Vec<f64> = dofs
            .iter()
            .map(|dof| dof.speed + dt * dof.torque / dof.inertia)
            .collect();

        let n = rows.len();
        let mut matrix = vec![0.0; n * n];
        let mut rhs = vec![0.0; n];
        for (k, row_k) in rows.iter().enumerate() {
            rhs[k] = -row_k
                .entries
                .iter()
                .map(|&(i, c)| c * speeds[i])
                .sum::<f64>();
            for (l, row_l) in rows.iter().enumerate() {
                let mut value = 0.0;
                for &(i, c) in &row_k.entries {
                    for &(j, d) in &row_l.entries {
                        if i == j {
                            value += c * d / dofs[i].inertia;
                        }
                    }
                }
                matrix[k * n + l] = value;
            }
        }

        let multipliers = solve_dense(matrix, rhs, n, self.pivot_epsilon)?;

        for (row, mu) in rows.iter().zip(&multipliers) {
            for &(i, c) in &row.entries {
                speeds[i] += c * mu / dofs[i].inertia;
            }
        }

        let row_torques = rows
            .iter()
            .zip(&multipliers)
            .map(|(row, mu)| row.entries.iter().map(|&(_, c)| c * mu / dt).collect())
            .collect();

        let max_residual = rows
            .iter()
            .map(|row| {
                row.entries
                    .iter()
                    .map(|&(i, c)| c * speeds[i])
                    .sum::<f64>()
                    .abs()
            })
            .fold(0.0, f64::max);

        self.metrics = ShaftStepMetrics {
            dofs: dofs.len(),
            rows: n,
            max_residual,
        };

        Ok(NetworkSolution {
            speeds,
            row_torques,
        })
    }
}

/// Solves the row-major `n × n` system `A x = b` by Gaussian elimination with partial pivoting.
pub fn solve_dense(mut a: Vec<f64>, mut b: Vec<f64>, n: usize, pivot_epsilon: f64) -> VehicleResult<Vec<f64>> {
    for col in 0..n {
        let (pivot_row, pivot) = (col..n)
            .map(|r| (r, a[r * n + col]))
            .fold((col, 0.0_f64), |best, (r, v)| {
                if v.abs() > best.1.abs() {
                    (r, v)
                } else {
                    best
                }
            });
        if !pivot.is_finite() || pivot.abs() < pivot_epsilon {
            return Err(VehicleError::SingularShaftNetwork { row: col, pivot });
        }
        if pivot_row != col {
            for k in 0..n {
                a.swap(col * n + k, pivot_row * n + k);
            }
            b.swap(col, pivot_row);
        }
        for r in (col + 1)..n {
            let factor = a[r * n + col] / pivot;
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[r * n + k] -= factor * a[col * n + k];
            }
            b[r] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row * n + k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row * n + row];
    }
    Ok(x)
}
