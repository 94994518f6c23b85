//! Gesture pointer command line: configuration checks and replay of recorded
//! detector output.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gesture_pointer::{
    action::{ActionKind, ActionSink, LogSink},
    config::{Config, EXAMPLE_CONFIG},
    cursor_control::X11Sink,
    replay,
};
use log::info;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a configuration file and print its bindings
    Check {
        /// Path to configuration file (YAML format)
        config: PathBuf,
    },

    /// Run a recorded detection stream through the pipeline
    Replay {
        /// Path to configuration file (YAML format)
        #[arg(short = 'C', long)]
        config: PathBuf,

        /// Recorded detection results (YAML list)
        #[arg(short, long)]
        input: PathBuf,

        /// Send events to the X11 display instead of the log
        #[arg(long)]
        x11: bool,
    },

    /// Print an example configuration
    ExampleConfig,
}

fn check(path: &Path) -> Result<()> {
    let config = Config::from_file(path).with_context(|| format!("Failed to load {}", path.display()))?;
    config.validate().context("Configuration is invalid")?;

    let table = config.binding_table()?;
    println!(
        "{}: ok, {} tracking, kernel of {} frames, {} bindings",
        path.display(),
        if config.tracking.use_transformation_matrix { "head-pose" } else { "landmark" },
        config.build_kernel()?.len(),
        table.len()
    );
    for binding in table.iter() {
        println!(
            "  {:<24} -> {:<18} threshold {:.2} {} {}ms",
            binding.gesture.name(),
            binding.target.to_string(),
            binding.threshold,
            binding.trigger,
            binding.time_threshold.as_millis()
        );
    }
    Ok(())
}

fn run_replay(config_path: &Path, input: &Path, x11: bool) -> Result<()> {
    let config = Config::from_file(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    let results = replay::load_recording(input).with_context(|| format!("Failed to load {}", input.display()))?;

    let sink: Box<dyn ActionSink> = if x11 {
        Box::new(X11Sink::new()?)
    } else {
        Box::new(LogSink)
    };

    let summary = replay::replay(&config, results, sink)?;
    info!(
        "Replay finished: {} ticks, {} results, {} stale",
        summary.ticks, summary.results_delivered, summary.stale_discards
    );
    println!(
        "{} activations, {} releases, {} fires, {} sink failures",
        summary.events.iter().filter(|e| e.kind == ActionKind::Activate).count(),
        summary.events.iter().filter(|e| e.kind == ActionKind::Deactivate).count(),
        summary.events.iter().filter(|e| e.kind == ActionKind::Fire).count(),
        summary.sink_failures.len()
    );
    if let Some(point) = summary.last_tracking {
        println!("Last tracking point: ({:.1}, {:.1})", point.x, point.y);
    }
    Ok(())
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    match &args.command {
        Command::Check { config } => check(config),
        Command::Replay { config, input, x11 } => run_replay(config, input, *x11),
        Command::ExampleConfig => {
            print!("{EXAMPLE_CONFIG}");
            Ok(())
        }
    }
}
