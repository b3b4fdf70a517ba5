//! Linear state-space models and zero-order-hold discretization

use log::debug;
use nalgebra::{DMatrix, DVector};

use crate::common::{ControlError, ControlResult};

/// Continuous or discrete linear model x' = A x + B u, y = C x + D u
#[derive(Debug, Clone, PartialEq)]
pub struct StateSpaceModel {
    pub a: DMatrix<f64>,
    pub b: DMatrix<f64>,
    pub c: DMatrix<f64>,
    pub d: DMatrix<f64>,
}

impl StateSpaceModel {
    /// Create a model, checking that (A, B, C, D) conform
    pub fn new(
        a: DMatrix<f64>,
        b: DMatrix<f64>,
        c: DMatrix<f64>,
        d: DMatrix<f64>,
    ) -> ControlResult<Self> {
        let n = a.nrows();
        if n == 0 || !a.is_square() {
            return Err(ControlError::dimension("A", (n, n), a.shape()));
        }
        let m = b.ncols();
        if b.nrows() != n || m == 0 {
            return Err(ControlError::dimension("B", (n, m.max(1)), b.shape()));
        }
        let p = c.nrows();
        if c.ncols() != n || p == 0 {
            return Err(ControlError::dimension("C", (p.max(1), n), c.shape()));
        }
        if d.shape() != (p, m) {
            return Err(ControlError::dimension("D", (p, m), d.shape()));
        }
        let all_finite = [&a, &b, &c, &d]
            .iter()
            .all(|mat| mat.iter().all(|v| v.is_finite()));
        if !all_finite {
            return Err(ControlError::Construction(
                "state-space matrices must be finite".to_string(),
            ));
        }
        Ok(Self { a, b, c, d })
    }

    pub fn states(&self) -> usize {
        self.a.nrows()
    }

    pub fn inputs(&self) -> usize {
        self.b.ncols()
    }

    pub fn outputs(&self) -> usize {
        self.c.nrows()
    }

    /// Exact zero-order-hold discretization at timestep `dt`.
    ///
    /// exp([[A, B], [0, 0]] dt) = [[Ad, Bd], [0, I]]; C and D carry over unchanged.
    pub fn discretize(&self, dt: f64) -> ControlResult<StateSpaceModel> {
        let (ad, bd) = discretize_ab(&self.a, &self.b, dt)?;
        Ok(StateSpaceModel {
            a: ad,
            b: bd,
            c: self.c.clone(),
            d: self.d.clone(),
        })
    }

    /// One step of the (discrete) model: returns (x_next, y_next)
    pub fn step(&self, x: &DVector<f64>, u: &DVector<f64>) -> (DVector<f64>, DVector<f64>) {
        let x_next = &self.a * x + &self.b * u;
        let y_next = &self.c * &x_next + &self.d * u;
        (x_next, y_next)
    }
}

/// Discretize only the (A, B) pair
pub fn discretize_ab(
    a: &DMatrix<f64>,
    b: &DMatrix<f64>,
    dt: f64,
) -> ControlResult<(DMatrix<f64>, DMatrix<f64>)> {
    if !dt.is_finite() || dt <= 0.0 {
        return Err(ControlError::Construction(format!(
            "dt must be positive, got {}",
            dt
        )));
    }
    let n = a.nrows();
    let m = b.ncols();
    if !a.is_square() {
        return Err(ControlError::dimension("A", (n, n), a.shape()));
    }
    if b.nrows() != n {
        return Err(ControlError::dimension("B", (n, m), b.shape()));
    }

    let mut block = DMatrix::<f64>::zeros(n + m, n + m);
    block.view_mut((0, 0), (n, n)).copy_from(&(a * dt));
    block.view_mut((0, n), (n, m)).copy_from(&(b * dt));
    let phi = block.exp();

    let ad = phi.view((0, 0), (n, n)).into_owned();
    let bd = phi.view((0, n), (n, m)).into_owned();
    debug!("discretized {}x{} model at dt={}", n, m, dt);
    Ok((ad, bd))
}

/// Drivetrain velocity plant: one state (velocity), one input (voltage), one output
#[derive(Debug, Clone)]
pub struct LinearPlant {
    /// Velocity gain [V/(m/s)]
    pub kv: f64,
    /// Acceleration gain [V/(m/s^2)]
    pub ka: f64,
    model: StateSpaceModel,
}

impl LinearPlant {
    /// A = [[-Kv/Ka]], B = [[1/Ka]], C = [[1]], D = [[0]]
    pub fn drivetrain(kv: f64, ka: f64) -> ControlResult<Self> {
        if !kv.is_finite() || kv <= 0.0 || !ka.is_finite() || ka <= 0.0 {
            return Err(ControlError::Construction(format!(
                "Kv and Ka must be positive, got Kv={} Ka={}",
                kv, ka
            )));
        }
        let model = StateSpaceModel::new(
            DMatrix::from_element(1, 1, -kv / ka),
            DMatrix::from_element(1, 1, 1.0 / ka),
            DMatrix::from_element(1, 1, 1.0),
            DMatrix::zeros(1, 1),
        )?;
        Ok(Self { kv, ka, model })
    }

    /// Continuous-time model
    pub fn model(&self) -> &StateSpaceModel {
        &self.model
    }

    /// Discrete (Ad, Bd, C, D) at `dt`
    pub fn discretize(&self, dt: f64) -> ControlResult<StateSpaceModel> {
        self.model.discretize(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const KV: f64 = 3.02;
    const KA: f64 = 0.642;

    #[test]
    fn test_drivetrain_matrices() {
        let plant = LinearPlant::drivetrain(KV, KA).unwrap();
        assert_relative_eq!(plant.model().a[(0, 0)], -KV / KA);
        assert_relative_eq!(plant.model().b[(0, 0)], 1.0 / KA);
        assert_eq!(plant.model().c[(0, 0)], 1.0);
        assert_eq!(plant.model().d[(0, 0)], 0.0);
    }

    #[test]
    fn test_scalar_closed_form() {
        let dt = 0.005;
        let plant = LinearPlant::drivetrain(KV, KA).unwrap();
        let disc = plant.discretize(dt).unwrap();
        let ad = (-KV / KA * dt).exp();
        let bd = (1.0 - ad) / KV;
        assert_relative_eq!(disc.a[(0, 0)], ad, max_relative = 1e-10);
        assert_relative_eq!(disc.b[(0, 0)], bd, max_relative = 1e-10);
    }

    #[test]
    fn test_step_matches_direct_substitution() {
        let dt = 0.02;
        let plant = LinearPlant::drivetrain(KV, KA).unwrap();
        let disc = plant.discretize(dt).unwrap();
        let x = DVector::from_element(1, 1.5);
        let u = DVector::from_element(1, 6.0);
        let (x_next, y_next) = disc.step(&x, &u);

        let ad = (-KV / KA * dt).exp();
        let expected = ad * 1.5 + (1.0 - ad) / KV * 6.0;
        assert_relative_eq!(x_next[0], expected, max_relative = 1e-10);
        assert_relative_eq!(y_next[0], expected, max_relative = 1e-10);
    }

    #[test]
    fn test_double_integrator() {
        let a = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 0.0, 0.0]);
        let b = DMatrix::from_row_slice(2, 1, &[0.0, 1.0]);
        let (ad, bd) = discretize_ab(&a, &b, 0.1).unwrap();
        assert_relative_eq!(ad[(0, 1)], 0.1, epsilon = 1e-12);
        assert_relative_eq!(bd[(0, 0)], 0.005, epsilon = 1e-12);
        assert_relative_eq!(bd[(1, 0)], 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_bad_dimensions() {
        let err = StateSpaceModel::new(
            DMatrix::zeros(2, 1),
            DMatrix::zeros(2, 1),
            DMatrix::zeros(1, 2),
            DMatrix::zeros(1, 1),
        );
        assert!(matches!(err, Err(ControlError::DimensionMismatch { .. })));

        let err = StateSpaceModel::new(
            DMatrix::zeros(1, 1),
            DMatrix::zeros(1, 1),
            DMatrix::zeros(1, 1),
            DMatrix::zeros(2, 1),
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_rejects_non_positive_dt() {
        let plant = LinearPlant::drivetrain(KV, KA).unwrap();
        assert!(plant.discretize(0.0).is_err());
        assert!(plant.discretize(-0.001).is_err());
        assert!(LinearPlant::drivetrain(0.0, KA).is_err());
    }
}
