//! drivetrain_latency - drivetrain velocity control with actuation delay
//!
//! A discrete-time simulation of a one-state drivetrain velocity plant driven
//! by an LQR with plant-inversion feedforward, subject to an input delay that
//! can be compensated by re-solving the regulator on a delay-augmented model.

// Core modules
pub mod common;
pub mod utils;

// Algorithm modules
pub mod control;
pub mod simulation;

// Re-export common types for convenience
pub use common::{ActuatorLimits, CostRule, CostWeights, SteppableSystem};
pub use common::{ControlError, ControlResult};
pub use control::{
    DelayBuffer, LinearPlant, LinearQuadraticRegulator, PlantInversionFeedforward,
    QueueProjection, StateSpaceModel,
};
pub use simulation::{DrivetrainSimulator, SimulationConfig, SimulationHistory, Trajectory};
