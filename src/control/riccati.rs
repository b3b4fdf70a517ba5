//! Discrete algebraic Riccati equation solver and LQR gain computation
//!
//! The DARE
//!
//!   P = A'PA - A'PB (R + B'PB)^-1 B'PA + Q
//!
//! is solved with the structure-preserving doubling iteration, which doubles the
//! cost horizon on every pass. That keeps the iteration count small even for the
//! large, slowly-mixing augmented systems produced by input-delay compensation.

use log::debug;
use nalgebra::DMatrix;

use crate::common::{ControlError, ControlResult};

/// Iteration limits for the Riccati solve
#[derive(Debug, Clone, Copy)]
pub struct DareConfig {
    /// Maximum number of doubling passes (horizon 2^max_iter)
    pub max_iter: usize,
    /// Relative tolerance on the change of P between passes
    pub eps: f64,
}

impl Default for DareConfig {
    fn default() -> Self {
        Self {
            max_iter: 64,
            eps: 1e-12,
        }
    }
}

/// Solve the discrete algebraic Riccati equation for the stabilizing P
pub fn solve_dare(
    a: &DMatrix<f64>,
    b: &DMatrix<f64>,
    q: &DMatrix<f64>,
    r: &DMatrix<f64>,
    config: &DareConfig,
) -> ControlResult<DMatrix<f64>> {
    let n = a.nrows();
    let m = b.ncols();
    if !a.is_square() {
        return Err(ControlError::dimension("A", (n, n), a.shape()));
    }
    if b.nrows() != n {
        return Err(ControlError::dimension("B", (n, m), b.shape()));
    }
    if q.shape() != (n, n) {
        return Err(ControlError::dimension("Q", (n, n), q.shape()));
    }
    if r.shape() != (m, m) {
        return Err(ControlError::dimension("R", (m, m), r.shape()));
    }

    let r_inv = r.clone().try_inverse().ok_or_else(|| {
        ControlError::RiccatiConvergence("R is singular".to_string())
    })?;

    let identity = DMatrix::<f64>::identity(n, n);
    let mut ak = a.clone();
    let mut gk = b * r_inv * b.transpose();
    let mut hk = q.clone();

    for iter in 0..config.max_iter {
        let w_inv = (&identity + &gk * &hk).try_inverse().ok_or_else(|| {
            ControlError::RiccatiConvergence(format!("singular iterate at pass {}", iter))
        })?;
        let a_w = &ak * &w_inv;

        let a_next = &a_w * &ak;
        let g_next = &gk + &a_w * &gk * ak.transpose();
        let h_next = &hk + ak.transpose() * &hk * &w_inv * &ak;

        if h_next.iter().any(|v| !v.is_finite()) {
            return Err(ControlError::RiccatiConvergence(
                "solution diverged; (A, B) is likely not stabilizable".to_string(),
            ));
        }

        let change = (&h_next - &hk).abs().max();
        let scale = h_next.abs().max().max(1.0);

        ak = a_next;
        gk = g_next;
        hk = h_next;

        if change <= config.eps * scale {
            debug!("DARE converged after {} doubling passes (n={})", iter + 1, n);
            return Ok((&hk + hk.transpose()) * 0.5);
        }
    }

    Err(ControlError::RiccatiConvergence(format!(
        "no convergence after {} doubling passes",
        config.max_iter
    )))
}

/// Compute the LQR gain K = (R + B'PB)^-1 B'PA for the law u = -K x.
///
/// Fails if the resulting closed loop A - BK is not Schur stable.
pub fn dlqr(
    a: &DMatrix<f64>,
    b: &DMatrix<f64>,
    q: &DMatrix<f64>,
    r: &DMatrix<f64>,
    config: &DareConfig,
) -> ControlResult<DMatrix<f64>> {
    let p = solve_dare(a, b, q, r, config)?;

    let bt_p = b.transpose() * &p;
    let s = r + &bt_p * b;
    let k = s
        .cholesky()
        .ok_or_else(|| {
            ControlError::RiccatiConvergence("R + B'PB is not positive definite".to_string())
        })?
        .solve(&(bt_p * a));

    let rho = spectral_radius(&(a - b * &k));
    if rho.is_nan() || rho >= 1.0 {
        return Err(ControlError::RiccatiConvergence(format!(
            "closed loop is not stable (spectral radius {:.6}); (A, B) is not stabilizable",
            rho
        )));
    }
    Ok(k)
}

/// Largest eigenvalue magnitude of a square matrix
pub fn spectral_radius(m: &DMatrix<f64>) -> f64 {
    if m.nrows() == 1 {
        return m[(0, 0)].abs();
    }
    m.complex_eigenvalues()
        .iter()
        .map(|c| c.re.hypot(c.im))
        .fold(0.0, f64::max)
}

/// Augment a discrete plant with a queue of `steps` pending inputs.
///
/// The augmented state is [x; q_1; ...; q_steps] where q_1 is the oldest queued
/// input, i.e. the one applied to the plant on this step:
///
///   x'   = Ad x + Bd q_1
///   q_i' = q_(i+1)
///   q_d' = u
pub fn augment_with_input_delay(
    ad: &DMatrix<f64>,
    bd: &DMatrix<f64>,
    steps: usize,
) -> (DMatrix<f64>, DMatrix<f64>) {
    if steps == 0 {
        return (ad.clone(), bd.clone());
    }
    let n = ad.nrows();
    let m = bd.ncols();
    let size = n + steps * m;

    let mut a_aug = DMatrix::<f64>::zeros(size, size);
    a_aug.view_mut((0, 0), (n, n)).copy_from(ad);
    a_aug.view_mut((0, n), (n, m)).copy_from(bd);
    for slot in 0..steps - 1 {
        let row = n + slot * m;
        a_aug
            .view_mut((row, row + m), (m, m))
            .fill_with_identity();
    }

    let mut b_aug = DMatrix::<f64>::zeros(size, m);
    b_aug
        .view_mut((n + (steps - 1) * m, 0), (m, m))
        .fill_with_identity();

    (a_aug, b_aug)
}

/// Block-diagonal state cost for the augmented system: queued inputs are not penalized
pub fn augment_state_cost(q: &DMatrix<f64>, steps: usize, inputs: usize) -> DMatrix<f64> {
    let n = q.nrows();
    let mut q_aug = DMatrix::<f64>::zeros(n + steps * inputs, n + steps * inputs);
    q_aug.view_mut((0, 0), (n, n)).copy_from(q);
    q_aug
}
