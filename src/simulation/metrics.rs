//! Step response metrics computed from a recorded history

use ordered_float::OrderedFloat;

use crate::common::ActuatorLimits;
use crate::simulation::driver::SimulationHistory;

/// Summary of one state component's response
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepMetrics {
    /// Largest amount by which the state exceeded its reference (0 if it never did)
    pub peak_overshoot: f64,
    /// Largest state value reached
    pub peak_state: f64,
    /// |x - r| at the final sample
    pub final_error: f64,
    /// Fraction of samples whose applied input sits on a limit
    pub saturated_fraction: f64,
}

impl StepMetrics {
    /// Metrics for state component `index`; `None` for an empty history
    pub fn from_history(
        history: &SimulationHistory,
        index: usize,
        limits: &ActuatorLimits,
    ) -> Option<Self> {
        if history.is_empty() {
            return None;
        }

        let peak_overshoot = history
            .states
            .iter()
            .zip(&history.references)
            .map(|(x, r)| OrderedFloat(x[index] - r[index]))
            .max()
            .map_or(0.0, |v| v.0.max(0.0));

        let peak_state = history
            .states
            .iter()
            .map(|x| OrderedFloat(x[index]))
            .max()
            .map_or(0.0, |v| v.0);

        let final_error = match (history.states.last(), history.references.last()) {
            (Some(x), Some(r)) => (x[index] - r[index]).abs(),
            _ => 0.0,
        };

        let saturated = history
            .inputs
            .iter()
            .filter(|u| {
                u.iter()
                    .zip(limits.min.iter().zip(limits.max.iter()))
                    .any(|(v, (lo, hi))| v <= lo || v >= hi)
            })
            .count();

        Some(Self {
            peak_overshoot,
            peak_state,
            final_error,
            saturated_fraction: saturated as f64 / history.len() as f64,
        })
    }

    /// Overshoot above a fixed level, e.g. the height of a step reference
    pub fn overshoot_above(history: &SimulationHistory, index: usize, level: f64) -> f64 {
        history
            .states
            .iter()
            .map(|x| OrderedFloat(x[index] - level))
            .max()
            .map_or(0.0, |v| v.0.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DVector;

    fn history(states: &[f64], refs: &[f64], inputs: &[f64]) -> SimulationHistory {
        let wrap = |v: &[f64]| v.iter().map(|&x| DVector::from_element(1, x)).collect::<Vec<_>>();
        SimulationHistory {
            states: wrap(states),
            references: wrap(refs),
            inputs: wrap(inputs),
            outputs: wrap(states),
        }
    }

    #[test]
    fn test_metrics() {
        let limits = ActuatorLimits::symmetric(12.0, 1).unwrap();
        let h = history(
            &[0.0, 1.5, 2.3, 1.9, 2.0],
            &[2.0, 2.0, 2.0, 2.0, 2.0],
            &[12.0, 12.0, -3.0, 4.0, 6.0],
        );
        let m = StepMetrics::from_history(&h, 0, &limits).unwrap();
        assert!((m.peak_overshoot - 0.3).abs() < 1e-12);
        assert!((m.peak_state - 2.3).abs() < 1e-12);
        assert!(m.final_error < 1e-12);
        assert!((m.saturated_fraction - 0.4).abs() < 1e-12);
        assert!((StepMetrics::overshoot_above(&h, 0, 2.0) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_no_overshoot_is_zero() {
        let limits = ActuatorLimits::symmetric(12.0, 1).unwrap();
        let h = history(&[0.0, 0.5, 1.0], &[1.0, 1.0, 1.0], &[1.0, 1.0, 1.0]);
        let m = StepMetrics::from_history(&h, 0, &limits).unwrap();
        assert_eq!(m.peak_overshoot, 0.0);
        assert!(StepMetrics::from_history(&SimulationHistory::default(), 0, &limits).is_none());
    }
}
