//! Drivetrain velocity simulator with actuation delay

use log::info;
use nalgebra::{DMatrix, DVector};

use crate::common::{ActuatorLimits, ControlError, ControlResult, CostWeights, SteppableSystem};
use crate::control::{
    DelayBuffer, LinearPlant, LinearQuadraticRegulator, PlantInversionFeedforward,
    StateSpaceModel,
};
use crate::simulation::config::SimulationConfig;

/// One drivetrain scenario: plant, feedforward, LQR and input delay.
///
/// All state is owned by the instance, so independent scenarios never share a
/// delay queue or a gain.
#[derive(Debug, Clone)]
pub struct DrivetrainSimulator {
    plant: LinearPlant,
    sim: StateSpaceModel,
    dt: f64,
    delay: f64,
    feedforward: PlantInversionFeedforward,
    feedback: LinearQuadraticRegulator,
    delay_buffer: DelayBuffer,
    limits: ActuatorLimits,
    x: DVector<f64>,
    u: DVector<f64>,
    y: DVector<f64>,
    u_cmd: DVector<f64>,
}

impl DrivetrainSimulator {
    pub fn new(
        plant: LinearPlant,
        dt: f64,
        delay: f64,
        weights: &CostWeights,
        limits: ActuatorLimits,
    ) -> ControlResult<Self> {
        let sim = plant.discretize(dt)?;
        let (n, m, p) = (sim.states(), sim.inputs(), sim.outputs());
        if limits.len() != m {
            return Err(ControlError::dimension("u_min", (m, 1), (limits.len(), 1)));
        }

        let feedforward = PlantInversionFeedforward::new(&sim.a, &sim.b)?;
        let feedback = LinearQuadraticRegulator::new(&sim.a, &sim.b, weights, dt)?;
        let delay_buffer = DelayBuffer::from_delay(delay, dt, m)?;

        Ok(Self {
            plant,
            sim,
            dt,
            delay,
            feedforward,
            feedback,
            delay_buffer,
            limits,
            x: DVector::zeros(n),
            u: DVector::zeros(m),
            y: DVector::zeros(p),
            u_cmd: DVector::zeros(m),
        })
    }

    /// Build a scenario from configuration, compensating the gain if requested
    pub fn from_config(config: &SimulationConfig) -> ControlResult<Self> {
        config.validate()?;
        let plant = LinearPlant::drivetrain(config.kv, config.ka)?;
        let mut sim = Self::new(
            plant,
            config.dt,
            config.delay,
            &config.weights()?,
            config.limits()?,
        )?;
        sim.feedback.set_projection(config.projection);
        if config.compensate {
            sim.latency_compensate()?;
        }
        info!(
            "drivetrain scenario ready: delay={} s ({} steps), compensate={}",
            config.delay,
            sim.delay_buffer.len(),
            config.compensate
        );
        Ok(sim)
    }

    /// Compensate the regulator for this scenario's own input delay
    pub fn latency_compensate(&mut self) -> ControlResult<()> {
        let model = self.plant.model();
        self.feedback
            .latency_compensate(&model.a, &model.b, self.dt, self.delay)
            .map(|_| ())
    }

    /// Advance the plant with the previously applied input, then compute,
    /// clip and enqueue the next command.
    pub fn update(&mut self, r: &DVector<f64>, next_r: &DVector<f64>) {
        let (x, y) = self.sim.step(&self.x, &self.u);
        self.x = x;
        self.y = y;

        let u_ff = self.feedforward.calculate(next_r);
        let u_fb = self.feedback.calculate(&self.x, r)
            + self.feedback.queue_correction(self.delay_buffer.pending(), &u_ff);
        self.u_cmd = self.limits.clip(&(u_ff + u_fb));

        self.u = self.delay_buffer.push_pop(self.u_cmd.clone());
    }

    pub fn feedback(&self) -> &LinearQuadraticRegulator {
        &self.feedback
    }

    pub fn feedforward(&self) -> &PlantInversionFeedforward {
        &self.feedforward
    }

    /// Current (possibly compensated) gain on the measured state
    pub fn gain(&self) -> &DMatrix<f64> {
        self.feedback.k()
    }

    pub fn plant(&self) -> &LinearPlant {
        &self.plant
    }

    /// Discrete model used to advance the plant
    pub fn discrete_model(&self) -> &StateSpaceModel {
        &self.sim
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn delay_steps(&self) -> usize {
        self.delay_buffer.len()
    }

    pub fn limits(&self) -> &ActuatorLimits {
        &self.limits
    }

    /// Clipped command computed on the last update, before the delay
    pub fn last_command(&self) -> &DVector<f64> {
        &self.u_cmd
    }
}

impl SteppableSystem for DrivetrainSimulator {
    fn update(&mut self, reference: &DVector<f64>, next_reference: &DVector<f64>) {
        DrivetrainSimulator::update(self, reference, next_reference);
    }

    fn state(&self) -> &DVector<f64> {
        &self.x
    }

    fn input(&self) -> &DVector<f64> {
        &self.u
    }

    fn output(&self) -> &DVector<f64> {
        &self.y
    }
}
