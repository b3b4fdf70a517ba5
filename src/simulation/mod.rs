//! Drivetrain simulation: scenario configuration, the simulator itself, the
//! trajectory driver and response metrics.

pub mod config;
pub mod trajectory;
pub mod drivetrain;
pub mod driver;
pub mod metrics;

pub use config::SimulationConfig;
pub use trajectory::Trajectory;
pub use drivetrain::DrivetrainSimulator;
pub use driver::{run, run_scenario, run_scenarios, ScenarioResult, SimulationHistory};
pub use metrics::StepMetrics;
