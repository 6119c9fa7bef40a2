use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use bmv_noise::logging::{init_logging, LogFormat, LogLevel};
use bmv_noise::output::write_outputs;
use bmv_noise::{run_seeded, SimConfig};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(author, version, about = "Acceleration noise budget of the BMV inertial sensor")]
struct Cli {
    /// Output directory for the plot and summary
    #[arg(long, default_value = "output-bmv-noise")]
    output: PathBuf,

    /// JSON file overriding the reference constants
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Skip the plot and summary files
    #[arg(long, default_value_t = false)]
    no_output: bool,

    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SimConfig> {
    let Some(path) = path else {
        return Ok(SimConfig::default());
    };

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: SimConfig = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level, cli.log_format);

    let mut cfg = load_config(cli.config.as_deref())?;
    if let Some(v) = cli.seed {
        cfg.seed = v;
    }

    println!("{}", "-".repeat(60));
    println!(" BMV NOISE BUDGET");
    println!(
        " Mass: {:.1} mg | Temp: {:.1} mK",
        cfg.mass_kg * 1e6,
        cfg.temperature_k * 1e3
    );
    println!("{}", "-".repeat(60));

    let outcome = run_seeded(&cfg)?;

    println!("{}", "=".repeat(60));
    println!(" RESULTS");
    println!("{}", "=".repeat(60));
    println!("{}", outcome.verdict.report());
    println!("{}", "=".repeat(60));

    if !cli.no_output {
        let files = write_outputs(&cfg, &outcome, &cli.output)?;
        println!("Plot: {}", files.plot_path.display());
        println!("Summary: {}", files.summary_path.display());
    }

    Ok(())
}
