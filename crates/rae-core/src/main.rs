//! Reputation Aggregation Simulation
//!
//! Runs a population of honest and strategic agents through repeated service
//! exchanges and reports how trust evolves per archetype.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use rae_core::config::DEFAULT_CONFIG_PATH;
use rae_core::{write_report, MpeConfig, SimError, Simulation, DEFAULT_REPORT_PATH};
use rae_events::Archetype;

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "rae_sim")]
#[command(about = "A reputation aggregation marketplace simulation")]
struct Args {
    /// Configuration file (defaults to ./config.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for reproducibility
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Override a configuration field, e.g. --set delta=0.8
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// Where to write the JSON report
    #[arg(long, default_value = DEFAULT_REPORT_PATH)]
    output: PathBuf,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
        )
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), SimError> {
    if args.print_default_config {
        print!("{}", MpeConfig::default().to_toml()?);
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => MpeConfig::from_file(path)?,
        None => MpeConfig::load_or_default()?,
    };
    config.apply_overrides(&args.overrides)?;

    println!("Reputation Aggregation Simulation");
    println!("=================================");
    let source = match &args.config {
        Some(path) => path.display().to_string(),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => DEFAULT_CONFIG_PATH.to_string(),
        None => "defaults".to_string(),
    };
    println!("Config: {}", source);
    println!("Seed: {}", args.seed);
    println!(
        "Agents: {} ({} honest, {} strategic), cycles: {}",
        config.agent_count,
        config.honest_agent_count(),
        config.s_agent_count,
        config.cycle_count
    );
    println!();

    let mut sim = Simulation::new(config, args.seed)?;
    sim.run()?;
    let report = sim.finish();

    println!("{:>6}  {:>8}  {:>9}", "cycle", "honest", "strategic");
    for (cycle, honest, strategic) in report.history.rows() {
        println!("{:>6}  {:>8}  {:>9}", cycle, format_mean(honest), format_mean(strategic));
    }
    println!();

    for archetype in Archetype::ALL {
        match report.final_mean(archetype) {
            Some(mean) => println!("Final mean trust ({}): {:.4}", archetype, mean),
            None => println!("Final mean trust ({}): n/a", archetype),
        }
    }

    write_report(&report, &args.output)?;
    println!("Wrote report to {}", args.output.display());
    Ok(())
}

fn format_mean(mean: Option<f64>) -> String {
    mean.map_or_else(|| "-".to_string(), |m| format!("{:.4}", m))
}
