//! Runs a system over a reference trajectory and records its time response

use itertools::izip;
use log::info;
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::common::{ControlResult, SteppableSystem};
use crate::simulation::config::SimulationConfig;
use crate::simulation::drivetrain::DrivetrainSimulator;
use crate::simulation::trajectory::Trajectory;

/// Time response of one run; all four series have the trajectory's length
#[derive(Debug, Clone, Default)]
pub struct SimulationHistory {
    pub states: Vec<DVector<f64>>,
    pub references: Vec<DVector<f64>>,
    pub inputs: Vec<DVector<f64>>,
    pub outputs: Vec<DVector<f64>>,
}

impl SimulationHistory {
    pub fn with_capacity(steps: usize) -> Self {
        Self {
            states: Vec::with_capacity(steps),
            references: Vec::with_capacity(steps),
            inputs: Vec::with_capacity(steps),
            outputs: Vec::with_capacity(steps),
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state_component(&self, index: usize) -> Vec<f64> {
        component(&self.states, index)
    }

    pub fn reference_component(&self, index: usize) -> Vec<f64> {
        component(&self.references, index)
    }

    pub fn input_component(&self, index: usize) -> Vec<f64> {
        component(&self.inputs, index)
    }

    pub fn output_component(&self, index: usize) -> Vec<f64> {
        component(&self.outputs, index)
    }

    /// Rows of (state, reference, input, output) for the given component
    pub fn rows(&self, index: usize) -> Vec<(f64, f64, f64, f64)> {
        izip!(&self.states, &self.references, &self.inputs, &self.outputs)
            .map(|(x, r, u, y)| (x[index], r[index], u[index], y[index]))
            .collect()
    }
}

fn component(series: &[DVector<f64>], index: usize) -> Vec<f64> {
    series.iter().map(|v| v[index]).collect()
}

/// Step `system` once per trajectory entry, recording state, reference,
/// applied input and output after every update.
///
/// The system is not reset; construct a fresh one to rerun.
pub fn run<S: SteppableSystem>(system: &mut S, trajectory: &Trajectory) -> SimulationHistory {
    let mut history = SimulationHistory::with_capacity(trajectory.len());
    for (r, next_r) in trajectory.iter() {
        system.update(r, next_r);
        history.states.push(system.state().clone());
        history.references.push(r.clone());
        history.inputs.push(system.input().clone());
        history.outputs.push(system.output().clone());
    }
    history
}

/// Outcome of one configured scenario
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    pub config: SimulationConfig,
    /// Gain on the measured state used for the run
    pub gain: DMatrix<f64>,
    pub history: SimulationHistory,
}

/// Build and run a single scenario
pub fn run_scenario(
    config: &SimulationConfig,
    trajectory: &Trajectory,
) -> ControlResult<ScenarioResult> {
    let mut sim = DrivetrainSimulator::from_config(config)?;
    let history = run(&mut sim, trajectory);
    info!(
        "scenario finished: {} steps, compensate={}, K={:?}",
        history.len(),
        config.compensate,
        sim.gain().as_slice()
    );
    Ok(ScenarioResult {
        config: config.clone(),
        gain: sim.gain().clone(),
        history,
    })
}

/// Run independent scenarios in parallel; results keep the order of `configs`
pub fn run_scenarios(
    configs: &[SimulationConfig],
    trajectory: &Trajectory,
) -> Vec<ControlResult<ScenarioResult>> {
    configs
        .par_iter()
        .map(|config| run_scenario(config, trajectory))
        .collect()
}
