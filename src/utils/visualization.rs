//! Visualization utilities for drivetrain_latency
//!
//! Time-series plotting with gnuplot. Panels are collected first and rendered
//! into one stacked figure when saved or shown.

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth};

use crate::common::{ControlError, ControlResult};
use crate::simulation::SimulationHistory;

/// Color palette for consistent styling
pub mod colors {
    pub const BLACK: &str = "#000000";
    pub const RED: &str = "#FF0000";
    pub const GREEN: &str = "#00FF00";
    pub const BLUE: &str = "#0000FF";
    pub const ORANGE: &str = "#FFA500";
    pub const GRAY: &str = "#808080";

    // Semantic colors
    pub const STATE: &str = BLUE;
    pub const REFERENCE: &str = ORANGE;
    pub const INPUT: &str = "#35C788";
}

/// Style for a line series
#[derive(Debug, Clone)]
pub struct LineStyle {
    pub color: String,
    pub line_width: f64,
    pub caption: String,
}

impl LineStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            line_width: 2.0,
            caption: caption.to_string(),
        }
    }

    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = width;
        self
    }
}

#[derive(Debug, Clone)]
struct Series {
    x: Vec<f64>,
    y: Vec<f64>,
    style: LineStyle,
}

/// One subplot
#[derive(Debug, Clone)]
pub struct Panel {
    y_label: String,
    y_range: Option<(f64, f64)>,
    series: Vec<Series>,
}

impl Panel {
    pub fn new(y_label: &str) -> Self {
        Self {
            y_label: y_label.to_string(),
            y_range: None,
            series: Vec::new(),
        }
    }

    pub fn set_y_range(&mut self, min: f64, max: f64) -> &mut Self {
        self.y_range = Some((min, max));
        self
    }

    /// Add a line; `x` and `y` are truncated to the shorter of the two
    pub fn plot_series(&mut self, x: &[f64], y: &[f64], style: LineStyle) -> &mut Self {
        let len = x.len().min(y.len());
        self.series.push(Series {
            x: x[..len].to_vec(),
            y: y[..len].to_vec(),
            style,
        });
        self
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }
}

/// Main visualizer struct
pub struct Visualizer {
    title: String,
    x_label: String,
    panels: Vec<Panel>,
}

impl Visualizer {
    /// Create a new visualizer
    pub fn new() -> Self {
        Self {
            title: String::new(),
            x_label: "Time (s)".to_string(),
            panels: Vec::new(),
        }
    }

    /// Set the plot title
    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.title = title.to_string();
        self
    }

    /// Set X axis label of the bottom panel
    pub fn set_x_label(&mut self, label: &str) -> &mut Self {
        self.x_label = label.to_string();
        self
    }

    /// Append a panel below the existing ones and return it
    pub fn add_panel(&mut self, y_label: &str) -> &mut Panel {
        self.panels.push(Panel::new(y_label));
        let last = self.panels.len() - 1;
        &mut self.panels[last]
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    /// Finalize and show the plot
    pub fn show(&self) -> ControlResult<()> {
        let mut figure = self.render();
        figure
            .show()
            .map(|_| ())
            .map_err(|e| ControlError::Visualization(e.to_string()))
    }

    /// Save plot to PNG file
    pub fn save_png(&self, path: &str, width: u32, height: u32) -> ControlResult<()> {
        self.render()
            .save_to_png(path, width, height)
            .map_err(|e| ControlError::Visualization(e.to_string()))
    }

    /// Save plot to SVG file
    pub fn save_svg(&self, path: &str) -> ControlResult<()> {
        self.render()
            .save_to_svg(path, 800, 600)
            .map_err(|e| ControlError::Visualization(e.to_string()))
    }

    fn render(&self) -> Figure {
        let mut figure = Figure::new();
        let rows = self.panels.len() as u32;
        for (i, panel) in self.panels.iter().enumerate() {
            let axes = figure.axes2d().set_pos_grid(rows, 1, i as u32);
            if i == 0 && !self.title.is_empty() {
                axes.set_title(&self.title, &[]);
            }
            if i + 1 == self.panels.len() {
                axes.set_x_label(&self.x_label, &[]);
            }
            axes.set_y_label(&panel.y_label, &[]);
            if let Some((min, max)) = panel.y_range {
                axes.set_y_range(AutoOption::Fix(min), AutoOption::Fix(max));
            }
            for s in &panel.series {
                axes.lines(&s.x, &s.y, &[
                    Caption(&s.style.caption),
                    Color(&s.style.color),
                    LineWidth(s.style.line_width),
                ]);
            }
        }
        figure
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Two-panel figure of a drivetrain run: velocity against reference, then voltage.
///
/// The state caption carries the proportional gain rounded to `gain_digits`.
pub fn time_response_plot(
    times: &[f64],
    history: &SimulationHistory,
    gain: f64,
    gain_digits: usize,
) -> Visualizer {
    let mut vis = Visualizer::new();
    vis.add_panel("Velocity (m/s)")
        .plot_series(
            times,
            &history.state_component(0),
            LineStyle::new(colors::STATE, &format!("State (K_p = {:.*})", gain_digits, gain)),
        )
        .plot_series(
            times,
            &history.reference_component(0),
            LineStyle::new(colors::REFERENCE, "Reference"),
        );
    vis.add_panel("Voltage (V)").plot_series(
        times,
        &history.input_component(0),
        LineStyle::new(colors::INPUT, "Input"),
    );
    vis
}
