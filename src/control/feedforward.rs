//! Plant inversion feedforward

use nalgebra::{DMatrix, DVector};

use crate::common::{ControlError, ControlResult};
use crate::control::state_space::discretize_ab;

/// Open-loop input that holds the discrete plant on a reference.
///
/// Uses the Moore-Penrose pseudo-inverse of Bd so that plants with more inputs
/// than states (or vice versa) get the least-squares input.
#[derive(Debug, Clone)]
pub struct PlantInversionFeedforward {
    a: DMatrix<f64>,
    b: DMatrix<f64>,
    b_pinv: DMatrix<f64>,
}

impl PlantInversionFeedforward {
    pub fn new(ad: &DMatrix<f64>, bd: &DMatrix<f64>) -> ControlResult<Self> {
        let n = ad.nrows();
        if !ad.is_square() {
            return Err(ControlError::dimension("A", (n, n), ad.shape()));
        }
        if bd.nrows() != n {
            return Err(ControlError::dimension("B", (n, bd.ncols()), bd.shape()));
        }
        let b_pinv = bd
            .clone()
            .pseudo_inverse(1e-12)
            .map_err(|e| ControlError::Construction(format!("Bd pseudo-inverse: {}", e)))?;
        Ok(Self {
            a: ad.clone(),
            b: bd.clone(),
            b_pinv,
        })
    }

    pub fn from_continuous(a: &DMatrix<f64>, b: &DMatrix<f64>, dt: f64) -> ControlResult<Self> {
        let (ad, bd) = discretize_ab(a, b, dt)?;
        Self::new(&ad, &bd)
    }

    /// u_ff = Bd+ (r_next - Ad r_next)
    pub fn calculate(&self, next_reference: &DVector<f64>) -> DVector<f64> {
        &self.b_pinv * (next_reference - &self.a * next_reference)
    }

    /// u_ff = Bd+ (r_next - Ad r): the input that carries the plant from r to r_next in one step
    pub fn calculate_transition(
        &self,
        reference: &DVector<f64>,
        next_reference: &DVector<f64>,
    ) -> DVector<f64> {
        &self.b_pinv * (next_reference - &self.a * reference)
    }

    pub fn a(&self) -> &DMatrix<f64> {
        &self.a
    }

    pub fn b(&self) -> &DMatrix<f64> {
        &self.b
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::state_space::LinearPlant;
    use approx::assert_relative_eq;

    #[test]
    fn test_holds_plant_at_reference() {
        let plant = LinearPlant::drivetrain(3.02, 0.642).unwrap();
        let disc = plant.discretize(0.001).unwrap();
        let ff = PlantInversionFeedforward::new(&disc.a, &disc.b).unwrap();

        let r = DVector::from_element(1, 2.0);
        let u = ff.calculate(&r);
        // Steady-state voltage of the velocity plant is Kv * v
        assert_relative_eq!(u[0], 3.02 * 2.0, max_relative = 1e-9);

        let (x_next, _) = disc.step(&r, &u);
        assert_relative_eq!(x_next[0], r[0], max_relative = 1e-12);
    }

    #[test]
    fn test_transition_reaches_next_reference() {
        let plant = LinearPlant::drivetrain(3.02, 0.642).unwrap();
        let disc = plant.discretize(0.01).unwrap();
        let ff = PlantInversionFeedforward::new(&disc.a, &disc.b).unwrap();

        let r = DVector::from_element(1, 1.0);
        let next_r = DVector::from_element(1, 1.05);
        let u = ff.calculate_transition(&r, &next_r);
        let (x_next, _) = disc.step(&r, &u);
        assert_relative_eq!(x_next[0], next_r[0], max_relative = 1e-9);
    }

    #[test]
    fn test_pseudo_inverse_for_redundant_inputs() {
        let ad = DMatrix::from_element(1, 1, 0.5);
        let bd = DMatrix::from_row_slice(1, 2, &[1.0, 1.0]);
        let ff = PlantInversionFeedforward::new(&ad, &bd).unwrap();
        let u = ff.calculate(&DVector::from_element(1, 2.0));
        assert_eq!(u.len(), 2);
        assert_relative_eq!(u[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(u[1], 0.5, epsilon = 1e-12);
    }
}
