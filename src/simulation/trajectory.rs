//! Reference trajectories

use nalgebra::DVector;

/// Ordered (reference, next reference) pairs, one per timestep
#[derive(Debug, Clone, Default)]
pub struct Trajectory {
    pairs: Vec<(DVector<f64>, DVector<f64>)>,
}

impl Trajectory {
    pub fn from_pairs(pairs: Vec<(DVector<f64>, DVector<f64>)>) -> Self {
        Self { pairs }
    }

    /// Pair every reference with its successor; the last one looks ahead to itself
    pub fn from_references(refs: &[DVector<f64>]) -> Self {
        let pairs = refs
            .iter()
            .zip(refs.iter().skip(1).chain(refs.last()))
            .map(|(r, next_r)| (r.clone(), next_r.clone()))
            .collect();
        Self { pairs }
    }

    /// Single-state trajectory from scalar references
    pub fn from_scalars(refs: &[f64]) -> Self {
        let refs: Vec<DVector<f64>> = refs.iter().map(|&r| DVector::from_element(1, r)).collect();
        Self::from_references(&refs)
    }

    /// Piecewise-constant scalar profile sampled every `dt` over `duration` seconds.
    ///
    /// `segments` holds (end_time, value) pairs in increasing end time; samples at
    /// or after the last end time take `tail`. A non-positive `dt` or a negative
    /// `duration` yields an empty trajectory.
    pub fn piecewise(dt: f64, duration: f64, segments: &[(f64, f64)], tail: f64) -> Self {
        if !(dt.is_finite() && dt > 0.0 && duration.is_finite() && duration >= 0.0) {
            return Self::default();
        }
        let samples = (duration / dt).round() as usize;
        let refs: Vec<f64> = (0..samples)
            .map(|i| {
                let t = i as f64 * dt;
                segments
                    .iter()
                    .find(|(end, _)| t < *end)
                    .map_or(tail, |(_, value)| *value)
            })
            .collect();
        Self::from_scalars(&refs)
    }

    /// Velocity step: 0 until 0.1 s, `height` for 5 s, then 0 for another 5 s
    pub fn step_profile(dt: f64, height: f64) -> Self {
        let l0 = 0.1;
        let l1 = l0 + 5.0;
        let l2 = l1 + 0.1;
        Self::piecewise(dt, l2 + 5.0, &[(l0, 0.0), (l1, height)], 0.0)
    }

    /// Sample times for a trajectory stepped at `dt`
    pub fn times(&self, dt: f64) -> Vec<f64> {
        (0..self.pairs.len()).map(|i| i as f64 * dt).collect()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(DVector<f64>, DVector<f64>)> {
        self.pairs.iter()
    }
}
