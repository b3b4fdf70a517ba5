//! Common types used throughout drivetrain_latency

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::common::error::{ControlError, ControlResult};

/// How configured cost values are turned into the diagonals of Q and R
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CostRule {
    /// Values are maximum acceptable excursions; weight = 1 / value^2
    #[default]
    Bryson,
    /// Values are used as the diagonal entries directly
    Diagonal,
}

/// Quadratic cost weights: one per state (diagonal of Q) and one per input (diagonal of R)
#[derive(Debug, Clone, PartialEq)]
pub struct CostWeights {
    pub q: DVector<f64>,
    pub r: DVector<f64>,
}

impl CostWeights {
    /// Create weights from raw diagonal entries
    pub fn from_diagonal(q: &[f64], r: &[f64]) -> ControlResult<Self> {
        check_positive("Q", q)?;
        check_positive("R", r)?;
        Ok(Self {
            q: DVector::from_column_slice(q),
            r: DVector::from_column_slice(r),
        })
    }

    /// Create weights with Bryson's rule from maximum state and input excursions
    pub fn from_tolerances(q_max: &[f64], r_max: &[f64]) -> ControlResult<Self> {
        check_positive("Q", q_max)?;
        check_positive("R", r_max)?;
        let inv_sq = |v: &f64| 1.0 / (v * v);
        Ok(Self {
            q: DVector::from_iterator(q_max.len(), q_max.iter().map(inv_sq)),
            r: DVector::from_iterator(r_max.len(), r_max.iter().map(inv_sq)),
        })
    }

    pub fn with_rule(rule: CostRule, q: &[f64], r: &[f64]) -> ControlResult<Self> {
        match rule {
            CostRule::Bryson => Self::from_tolerances(q, r),
            CostRule::Diagonal => Self::from_diagonal(q, r),
        }
    }

    pub fn q_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_diagonal(&self.q)
    }

    pub fn r_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_diagonal(&self.r)
    }
}

fn check_positive(name: &str, values: &[f64]) -> ControlResult<()> {
    if values.is_empty() {
        return Err(ControlError::Construction(format!(
            "{} weights must not be empty",
            name
        )));
    }
    if values.iter().any(|v| !v.is_finite() || *v <= 0.0) {
        return Err(ControlError::Construction(format!(
            "{} weights must be positive and finite",
            name
        )));
    }
    Ok(())
}

/// Actuator saturation limits (voltage rails)
#[derive(Debug, Clone, PartialEq)]
pub struct ActuatorLimits {
    pub min: DVector<f64>,
    pub max: DVector<f64>,
}

impl ActuatorLimits {
    pub fn new(min: &[f64], max: &[f64]) -> ControlResult<Self> {
        if min.len() != max.len() {
            return Err(ControlError::dimension("u_max", (min.len(), 1), (max.len(), 1)));
        }
        if min.iter().zip(max).any(|(lo, hi)| lo.is_nan() || hi.is_nan() || lo > hi) {
            return Err(ControlError::Construction(
                "u_min must not exceed u_max".to_string(),
            ));
        }
        Ok(Self {
            min: DVector::from_column_slice(min),
            max: DVector::from_column_slice(max),
        })
    }

    /// Symmetric limits [-limit, limit] on every input
    pub fn symmetric(limit: f64, inputs: usize) -> ControlResult<Self> {
        Self::new(&vec![-limit; inputs], &vec![limit; inputs])
    }

    pub fn len(&self) -> usize {
        self.min.len()
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_empty()
    }

    /// Element-wise clip of `u` into [min, max]
    pub fn clip(&self, u: &DVector<f64>) -> DVector<f64> {
        DVector::from_iterator(
            u.len(),
            u.iter()
                .zip(self.min.iter().zip(self.max.iter()))
                .map(|(v, (lo, hi))| v.clamp(*lo, *hi)),
        )
    }

    pub fn contains(&self, u: &DVector<f64>) -> bool {
        u.iter()
            .zip(self.min.iter().zip(self.max.iter()))
            .all(|(v, (lo, hi))| lo <= v && v <= hi)
    }
}
