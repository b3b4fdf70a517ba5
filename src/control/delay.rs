//! Fixed-length FIFO modelling actuation delay

use std::collections::VecDeque;

use nalgebra::DVector;

use crate::common::{ControlError, ControlResult};

/// Transport delay on the control input.
///
/// Holds `steps` pending inputs, all zero at construction. Every `push_pop`
/// appends the newest command and returns the oldest, so the length never changes.
#[derive(Debug, Clone)]
pub struct DelayBuffer {
    queue: VecDeque<DVector<f64>>,
}

impl DelayBuffer {
    pub fn new(steps: usize, inputs: usize) -> Self {
        let mut queue = VecDeque::with_capacity(steps + 1);
        queue.extend(std::iter::repeat(DVector::zeros(inputs)).take(steps));
        Self { queue }
    }

    /// Buffer for `delay` seconds at timestep `dt`, rounded to whole steps
    pub fn from_delay(delay: f64, dt: f64, inputs: usize) -> ControlResult<Self> {
        Ok(Self::new(Self::steps_for(delay, dt)?, inputs))
    }

    /// Number of whole timesteps in `delay`
    pub fn steps_for(delay: f64, dt: f64) -> ControlResult<usize> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ControlError::Construction(format!(
                "dt must be positive, got {}",
                dt
            )));
        }
        if !delay.is_finite() || delay < 0.0 {
            return Err(ControlError::Construction(format!(
                "delay must be non-negative, got {}",
                delay
            )));
        }
        Ok((delay / dt).round() as usize)
    }

    /// Append `u` and return the input that is due now. Identity when empty.
    pub fn push_pop(&mut self, u: DVector<f64>) -> DVector<f64> {
        if self.queue.is_empty() {
            return u;
        }
        self.queue.push_back(u);
        self.queue.pop_front().unwrap_or_else(|| DVector::zeros(0))
    }

    /// Pending inputs, oldest first
    pub fn pending(&self) -> impl Iterator<Item = &DVector<f64>> {
        self.queue.iter()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(v: f64) -> DVector<f64> {
        DVector::from_element(1, v)
    }

    #[test]
    fn test_zero_length_is_identity() {
        let mut buf = DelayBuffer::new(0, 1);
        assert!(buf.is_empty());
        assert_eq!(buf.push_pop(scalar(3.0)), scalar(3.0));
        assert_eq!(buf.push_pop(scalar(-1.0)), scalar(-1.0));
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn test_fifo_order() {
        let mut buf = DelayBuffer::new(3, 1);
        let out: Vec<f64> = (1..=6).map(|i| buf.push_pop(scalar(i as f64))[0]).collect();
        assert_eq!(out, vec![0.0, 0.0, 0.0, 1.0, 2.0, 3.0]);
        assert_eq!(buf.len(), 3);
        let pending: Vec<f64> = buf.pending().map(|u| u[0]).collect();
        assert_eq!(pending, vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_steps_rounding() {
        assert_eq!(DelayBuffer::steps_for(0.04, 0.001).unwrap(), 40);
        assert_eq!(DelayBuffer::steps_for(0.0026, 0.001).unwrap(), 3);
        assert_eq!(DelayBuffer::steps_for(0.0, 0.001).unwrap(), 0);
        assert!(DelayBuffer::steps_for(-0.1, 0.001).is_err());
        assert!(DelayBuffer::steps_for(0.1, 0.0).is_err());
    }
}
