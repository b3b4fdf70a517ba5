//! Utility modules for drivetrain_latency

pub mod visualization;

pub use visualization::{time_response_plot, colors, LineStyle, Panel, Visualizer};
