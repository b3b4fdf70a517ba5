//! Common traits defining interfaces for simulated systems

use nalgebra::DVector;

/// A discrete-time system that advances one timestep per reference pair.
///
/// The simulation driver only relies on this interface, so any plant/controller
/// composition that records its own state, applied input and output can be run.
pub trait SteppableSystem {
    /// Advance by one timestep toward `reference`, looking ahead to `next_reference`
    fn update(&mut self, reference: &DVector<f64>, next_reference: &DVector<f64>);

    /// Current state vector
    fn state(&self) -> &DVector<f64>;

    /// Input that will be applied on the next update
    fn input(&self) -> &DVector<f64>;

    /// Most recent output vector
    fn output(&self) -> &DVector<f64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Integrator {
        x: DVector<f64>,
        u: DVector<f64>,
    }

    impl SteppableSystem for Integrator {
        fn update(&mut self, reference: &DVector<f64>, _next_reference: &DVector<f64>) {
            self.x += &self.u;
            self.u = reference - &self.x;
        }

        fn state(&self) -> &DVector<f64> {
            &self.x
        }

        fn input(&self) -> &DVector<f64> {
            &self.u
        }

        fn output(&self) -> &DVector<f64> {
            &self.x
        }
    }

    #[test]
    fn test_steppable_trait() {
        let mut sys = Integrator {
            x: DVector::zeros(1),
            u: DVector::zeros(1),
        };
        let r = DVector::from_element(1, 1.0);
        sys.update(&r, &r);
        sys.update(&r, &r);
        assert!((sys.state()[0] - 1.0).abs() < 1e-12);
    }
}
