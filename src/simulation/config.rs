//! Scenario configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::{ActuatorLimits, ControlError, ControlResult, CostRule, CostWeights};
use crate::control::QueueProjection;

/// Everything needed to build one drivetrain scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Timestep [s]
    pub dt: f64,
    /// Input delay [s]
    pub delay: f64,
    /// Whether to compensate the regulator gain for the delay
    pub compensate: bool,
    /// State cost values, one per state
    pub q: Vec<f64>,
    /// Input cost values, one per input
    pub r: Vec<f64>,
    /// How `q` and `r` map to the cost matrices
    pub cost_rule: CostRule,
    /// Velocity gain [V/(m/s)]
    pub kv: f64,
    /// Acceleration gain [V/(m/s^2)]
    pub ka: f64,
    /// Lower input limits [V]
    pub u_min: Vec<f64>,
    /// Upper input limits [V]
    pub u_max: Vec<f64>,
    /// Treatment of queued-input gain columns when compensating
    pub projection: QueueProjection,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt: 0.001,
            delay: 0.04,
            compensate: false,
            q: vec![0.2],
            r: vec![7.0],
            cost_rule: CostRule::Bryson,
            kv: 3.02,
            ka: 0.642,
            u_min: vec![-12.0],
            u_max: vec![12.0],
            projection: QueueProjection::FoldIntoReference,
        }
    }
}

impl SimulationConfig {
    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_compensation(mut self, compensate: bool) -> Self {
        self.compensate = compensate;
        self
    }

    pub fn from_json_str(json: &str) -> ControlResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ControlResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> ControlResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject anything that would prevent a simulator from being built
    pub fn validate(&self) -> ControlResult<()> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(ControlError::Construction(format!(
                "dt must be positive, got {}",
                self.dt
            )));
        }
        if !self.delay.is_finite() || self.delay < 0.0 {
            return Err(ControlError::Construction(format!(
                "delay must be non-negative, got {}",
                self.delay
            )));
        }
        if self.q.len() != 1 {
            return Err(ControlError::dimension("q", (1, 1), (self.q.len(), 1)));
        }
        if self.r.len() != 1 {
            return Err(ControlError::dimension("r", (1, 1), (self.r.len(), 1)));
        }
        self.weights()?;
        let limits = self.limits()?;
        if limits.len() != 1 {
            return Err(ControlError::dimension("u_min", (1, 1), (limits.len(), 1)));
        }
        if !self.kv.is_finite() || self.kv <= 0.0 || !self.ka.is_finite() || self.ka <= 0.0 {
            return Err(ControlError::Construction(format!(
                "Kv and Ka must be positive, got Kv={} Ka={}",
                self.kv, self.ka
            )));
        }
        Ok(())
    }

    pub fn weights(&self) -> ControlResult<CostWeights> {
        CostWeights::with_rule(self.cost_rule, &self.q, &self.r)
    }

    pub fn limits(&self) -> ControlResult<ActuatorLimits> {
        ActuatorLimits::new(&self.u_min, &self.u_max)
    }
}
