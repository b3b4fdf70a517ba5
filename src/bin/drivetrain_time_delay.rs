//
// Drivetrain velocity control with a time delay, with and without
// latency compensation of the LQR gain.
//
// Usage:
//   drivetrain_time_delay [--noninteractive] [--config scenario.json]
//
// With --noninteractive the figures are written to img/drivetrain_time_delay/
// instead of being shown.
//

use log::{error, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use drivetrain_latency::simulation::{run_scenarios, StepMetrics};
use drivetrain_latency::utils::time_response_plot;
use drivetrain_latency::{ControlResult, SimulationConfig, Trajectory};

const OUTPUT_DIR: &str = "img/drivetrain_time_delay";

struct PlotMetadata {
    compensate: bool,
    gain_digits: usize,
    filename: &'static str,
}

fn load_config(args: &[String]) -> ControlResult<SimulationConfig> {
    match args.iter().position(|a| a == "--config") {
        Some(i) if i + 1 < args.len() => SimulationConfig::from_json_file(&args[i + 1]),
        _ => Ok(SimulationConfig::default()),
    }
}

fn main() {
    if let Err(e) = TermLogger::init(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ) {
        eprintln!("failed to initialize logger: {}", e);
    }

    let args: Vec<String> = std::env::args().collect();
    let noninteractive = args.iter().any(|a| a == "--noninteractive");

    if let Err(e) = run(&args, noninteractive) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: &[String], noninteractive: bool) -> ControlResult<()> {
    let base = load_config(args)?;
    let step_height = 2.0;
    let refs = Trajectory::step_profile(base.dt, step_height);
    let times = refs.times(base.dt);

    let plots = [
        PlotMetadata {
            compensate: false,
            gain_digits: 2,
            filename: "drivetrain_time_delay_no_comp",
        },
        PlotMetadata {
            compensate: true,
            gain_digits: 2,
            filename: "drivetrain_time_delay_comp",
        },
    ];
    let configs: Vec<SimulationConfig> = plots
        .iter()
        .map(|p| base.clone().with_compensation(p.compensate))
        .collect();

    println!("Simulating drivetrain with {} s input delay...", base.delay);
    let results = run_scenarios(&configs, &refs);

    if noninteractive {
        std::fs::create_dir_all(OUTPUT_DIR)?;
    }

    for (plot, result) in plots.iter().zip(results) {
        let result = result?;
        let limits = result.config.limits()?;
        let gain = result.gain[(0, 0)];

        if let Some(metrics) = StepMetrics::from_history(&result.history, 0, &limits) {
            println!(
                "{}: K_p = {:.*}, overshoot = {:.4} m/s, saturated {:.1}% of the time",
                plot.filename,
                plot.gain_digits,
                gain,
                StepMetrics::overshoot_above(&result.history, 0, step_height),
                metrics.saturated_fraction * 100.0
            );
        }

        let mut vis = time_response_plot(&times, &result.history, gain, plot.gain_digits);
        vis.set_title(if plot.compensate {
            "Drivetrain velocity, latency compensated"
        } else {
            "Drivetrain velocity, no compensation"
        });

        if noninteractive {
            let path = format!("{}/{}.png", OUTPUT_DIR, plot.filename);
            vis.save_png(&path, 800, 600)?;
            println!("Saved {}", path);
        } else {
            vis.show()?;
        }
    }
    Ok(())
}
