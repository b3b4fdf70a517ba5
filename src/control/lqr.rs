//! Linear-quadratic regulator with input-delay compensation
//!
//! The regulator uses the reference-tracking form u = K (r - x), so a state that
//! already sits on the reference contributes no feedback.

use log::info;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::common::{ControlError, ControlResult, CostWeights};
use crate::control::riccati::{augment_state_cost, augment_with_input_delay, dlqr, DareConfig};
use crate::control::state_space::discretize_ab;

/// What to do with the gain columns that belong to queued (not yet applied) inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QueueProjection {
    /// Apply them to the difference between the feedforward input and each queued input
    #[default]
    FoldIntoReference,
    /// Drop them; only the gain on the measured state is used
    Discard,
}

/// Discrete LQR: static state feedback minimizing sum(x'Qx + u'Ru)
#[derive(Debug, Clone)]
pub struct LinearQuadraticRegulator {
    k: DMatrix<f64>,
    queue_gain: Option<DMatrix<f64>>,
    q: DMatrix<f64>,
    r: DMatrix<f64>,
    dt: f64,
    delay_steps: usize,
    projection: QueueProjection,
    dare: DareConfig,
}

impl LinearQuadraticRegulator {
    /// Compute the optimal gain for the discrete pair (Ad, Bd)
    pub fn new(
        ad: &DMatrix<f64>,
        bd: &DMatrix<f64>,
        weights: &CostWeights,
        dt: f64,
    ) -> ControlResult<Self> {
        Self::with_config(ad, bd, weights, dt, DareConfig::default())
    }

    pub fn with_config(
        ad: &DMatrix<f64>,
        bd: &DMatrix<f64>,
        weights: &CostWeights,
        dt: f64,
        dare: DareConfig,
    ) -> ControlResult<Self> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ControlError::Construction(format!(
                "dt must be positive, got {}",
                dt
            )));
        }
        let n = ad.nrows();
        let m = bd.ncols();
        if weights.q.len() != n {
            return Err(ControlError::dimension("Q weights", (n, 1), (weights.q.len(), 1)));
        }
        if weights.r.len() != m {
            return Err(ControlError::dimension("R weights", (m, 1), (weights.r.len(), 1)));
        }

        let q = weights.q_matrix();
        let r = weights.r_matrix();
        let k = dlqr(ad, bd, &q, &r, &dare)?;
        info!("LQR gain computed: K = {:?}", k.as_slice());

        Ok(Self {
            k,
            queue_gain: None,
            q,
            r,
            dt,
            delay_steps: 0,
            projection: QueueProjection::default(),
            dare,
        })
    }

    /// Discretize the continuous pair (A, B) at `dt` and compute the gain
    pub fn from_continuous(
        a: &DMatrix<f64>,
        b: &DMatrix<f64>,
        weights: &CostWeights,
        dt: f64,
    ) -> ControlResult<Self> {
        let (ad, bd) = discretize_ab(a, b, dt)?;
        Self::new(&ad, &bd, weights, dt)
    }

    pub fn with_projection(mut self, projection: QueueProjection) -> Self {
        self.projection = projection;
        self
    }

    pub fn set_projection(&mut self, projection: QueueProjection) {
        self.projection = projection;
    }

    /// Gain acting on the measured state
    pub fn k(&self) -> &DMatrix<f64> {
        &self.k
    }

    /// Gain acting on queued inputs; present after latency compensation while
    /// the projection is `FoldIntoReference`
    pub fn queue_gain(&self) -> Option<&DMatrix<f64>> {
        match self.projection {
            QueueProjection::FoldIntoReference => self.queue_gain.as_ref(),
            QueueProjection::Discard => None,
        }
    }

    /// Number of whole timesteps the gain was compensated for
    pub fn delay_steps(&self) -> usize {
        self.delay_steps
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn projection(&self) -> QueueProjection {
        self.projection
    }

    /// u = K (r - x)
    pub fn calculate(&self, x: &DVector<f64>, r: &DVector<f64>) -> DVector<f64> {
        &self.k * (r - x)
    }

    /// Feedback on the input queue: sum_i K_qi (u_ref - q_i), oldest slot first.
    ///
    /// Zero when no folded compensation is active.
    pub fn queue_correction<'a, I>(&self, pending: I, u_ref: &DVector<f64>) -> DVector<f64>
    where
        I: IntoIterator<Item = &'a DVector<f64>>,
    {
        let m = self.k.nrows();
        let mut correction = DVector::<f64>::zeros(m);
        if let Some(queue_gain) = self.queue_gain() {
            for (slot, queued) in pending.into_iter().take(self.delay_steps).enumerate() {
                correction += queue_gain.columns(slot * m, m) * (u_ref - queued);
            }
        }
        correction
    }

    /// Replace the gain with one that accounts for `delay` seconds of input latency.
    ///
    /// The continuous (A, B) is discretized at `dt` and augmented with
    /// round(delay / dt) queued inputs; the Riccati problem is re-solved on the
    /// augmented system and the gain is partitioned back into the part acting on
    /// the measured state and the part acting on the queue. A zero-step delay
    /// leaves the gain untouched. Returns the gain now in effect.
    pub fn latency_compensate(
        &mut self,
        a: &DMatrix<f64>,
        b: &DMatrix<f64>,
        dt: f64,
        delay: f64,
    ) -> ControlResult<DMatrix<f64>> {
        if !delay.is_finite() || delay < 0.0 {
            return Err(ControlError::Construction(format!(
                "delay must be non-negative, got {}",
                delay
            )));
        }
        let (ad, bd) = discretize_ab(a, b, dt)?;
        let n = ad.nrows();
        let m = bd.ncols();
        if self.k.shape() != (m, n) {
            return Err(ControlError::dimension("K", self.k.shape(), (m, n)));
        }

        let steps = (delay / dt).round() as usize;
        if steps == 0 {
            return Ok(self.k.clone());
        }

        let (a_aug, b_aug) = augment_with_input_delay(&ad, &bd, steps);
        let q_aug = augment_state_cost(&self.q, steps, m);
        let k_aug = dlqr(&a_aug, &b_aug, &q_aug, &self.r, &self.dare)?;

        self.k = k_aug.columns(0, n).into_owned();
        self.queue_gain = Some(k_aug.columns(n, steps * m).into_owned());
        self.delay_steps = steps;
        info!(
            "latency compensated for {} steps ({} s): K = {:?}",
            steps,
            delay,
            self.k.as_slice()
        );
        Ok(self.k.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::state_space::LinearPlant;
    use approx::assert_relative_eq;

    const DT: f64 = 0.001;

    fn drivetrain_lqr() -> (LinearPlant, LinearQuadraticRegulator) {
        let plant = LinearPlant::drivetrain(3.02, 0.642).unwrap();
        let weights = CostWeights::from_tolerances(&[0.2], &[7.0]).unwrap();
        let lqr = LinearQuadraticRegulator::from_continuous(
            &plant.model().a,
            &plant.model().b,
            &weights,
            DT,
        )
        .unwrap();
        (plant, lqr)
    }

    #[test]
    fn test_gain_is_positive_for_velocity_plant() {
        let (_, lqr) = drivetrain_lqr();
        assert_eq!(lqr.k().shape(), (1, 1));
        assert!(lqr.k()[(0, 0)] > 0.0);
    }

    #[test]
    fn test_zero_feedback_on_reference() {
        let (_, lqr) = drivetrain_lqr();
        let r = DVector::from_element(1, 2.0);
        assert_eq!(lqr.calculate(&r, &r), DVector::zeros(1));

        let below = DVector::from_element(1, 1.0);
        assert!(lqr.calculate(&below, &r)[0] > 0.0);
    }

    #[test]
    fn test_zero_delay_is_noop() {
        let (plant, mut lqr) = drivetrain_lqr();
        let before = lqr.k().clone();
        lqr.latency_compensate(&plant.model().a, &plant.model().b, DT, 0.0)
            .unwrap();
        assert_relative_eq!(lqr.k()[(0, 0)], before[(0, 0)]);
        assert!(lqr.queue_gain().is_none());

        // Rounds to zero whole steps
        lqr.latency_compensate(&plant.model().a, &plant.model().b, DT, 0.0004)
            .unwrap();
        assert_relative_eq!(lqr.k()[(0, 0)], before[(0, 0)]);
        assert_eq!(lqr.delay_steps(), 0);
    }

    #[test]
    fn test_compensation_reduces_state_gain() {
        let (plant, mut lqr) = drivetrain_lqr();
        let nominal = lqr.k()[(0, 0)];
        let k = lqr
            .latency_compensate(&plant.model().a, &plant.model().b, DT, 0.04)
            .unwrap();

        assert_eq!(&k, lqr.k());
        assert_eq!(lqr.delay_steps(), 40);
        assert_eq!(lqr.k().shape(), (1, 1));
        assert!(lqr.k()[(0, 0)] < nominal);

        let ad = (-3.02 / 0.642 * DT).exp();
        assert_relative_eq!(lqr.k()[(0, 0)], nominal * ad.powi(40), max_relative = 1e-6);
        assert_eq!(lqr.queue_gain().map(|g| g.shape()), Some((1, 40)));
    }

    #[test]
    fn test_non_integer_delay_rounds() {
        let (plant, mut lqr) = drivetrain_lqr();
        lqr.latency_compensate(&plant.model().a, &plant.model().b, DT, 0.0026)
            .unwrap();
        assert_eq!(lqr.delay_steps(), 3);
    }

    #[test]
    fn test_discard_projection_drops_queue_gain() {
        let (plant, lqr) = drivetrain_lqr();
        let mut lqr = lqr.with_projection(QueueProjection::Discard);
        lqr.latency_compensate(&plant.model().a, &plant.model().b, DT, 0.01)
            .unwrap();
        assert!(lqr.queue_gain().is_none());
        let queue = vec![DVector::from_element(1, 5.0); 10];
        let u_ref = DVector::zeros(1);
        assert_eq!(lqr.queue_correction(&queue, &u_ref), DVector::zeros(1));
    }

    #[test]
    fn test_projection_switch_after_compensation() {
        let (plant, mut lqr) = drivetrain_lqr();
        lqr.latency_compensate(&plant.model().a, &plant.model().b, DT, 0.005)
            .unwrap();
        let queue = vec![DVector::zeros(1); 5];
        let u_ref = DVector::from_element(1, 6.0);
        let folded = lqr.queue_correction(&queue, &u_ref)[0];
        assert!(folded > 0.0);

        lqr.set_projection(QueueProjection::Discard);
        assert_eq!(lqr.projection(), QueueProjection::Discard);
        assert!(lqr.queue_gain().is_none());
        assert_eq!(lqr.queue_correction(&queue, &u_ref), DVector::zeros(1));

        lqr.set_projection(QueueProjection::FoldIntoReference);
        assert_eq!(lqr.queue_gain().map(|g| g.shape()), Some((1, 5)));
        assert_eq!(lqr.queue_correction(&queue, &u_ref)[0], folded);
    }

    #[test]
    fn test_queue_correction_vanishes_at_equilibrium() {
        let (plant, mut lqr) = drivetrain_lqr();
        lqr.latency_compensate(&plant.model().a, &plant.model().b, DT, 0.005)
            .unwrap();
        let u_ref = DVector::from_element(1, 6.04);
        let queue = vec![u_ref.clone(); 5];
        assert_relative_eq!(lqr.queue_correction(&queue, &u_ref)[0], 0.0);

        let low = vec![DVector::zeros(1); 5];
        assert!(lqr.queue_correction(&low, &u_ref)[0] > 0.0);
    }

    #[test]
    fn test_rejects_negative_delay() {
        let (plant, mut lqr) = drivetrain_lqr();
        let result = lqr.latency_compensate(&plant.model().a, &plant.model().b, DT, -0.01);
        assert!(matches!(result, Err(ControlError::Construction(_))));
    }

    #[test]
    fn test_weight_dimension_mismatch() {
        let plant = LinearPlant::drivetrain(3.02, 0.642).unwrap();
        let weights = CostWeights::from_diagonal(&[1.0, 1.0], &[1.0]).unwrap();
        let result = LinearQuadraticRegulator::from_continuous(
            &plant.model().a,
            &plant.model().b,
            &weights,
            DT,
        );
        assert!(matches!(result, Err(ControlError::DimensionMismatch { .. })));
    }
}
