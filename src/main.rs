//! pertsol CLI - perturbation solutions of the continuous-time growth model.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pertsol::{run, PerturbationConfig, Solution, Variant};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "pertsol")]
#[command(version)]
#[command(about = "Taylor-series perturbation solver for optimal growth policies")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (per-coefficient diagnostics)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve the model, sample the residual and report the coefficients
    Solve {
        /// JSON configuration file; reference calibration when absent
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Model variant, overrides the configuration file
        #[arg(long, value_enum)]
        variant: Option<VariantArg>,

        /// Taylor order, overrides the configuration file
        #[arg(short, long)]
        order: Option<usize>,

        /// Write the sampled residual to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write the coefficient report to this JSON file
        #[arg(long)]
        summary: Option<PathBuf>,
    },

    /// Validate a configuration file without solving
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Show an example configuration
    Example {
        #[arg(long, value_enum, default_value = "deterministic")]
        variant: VariantArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum VariantArg {
    Deterministic,
    Stochastic,
}

impl From<VariantArg> for Variant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Deterministic => Variant::Deterministic,
            VariantArg::Stochastic => Variant::Stochastic,
        }
    }
}

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")
}

fn load_config(
    path: Option<&PathBuf>,
    variant: Option<VariantArg>,
    order: Option<usize>,
) -> Result<PerturbationConfig> {
    let mut config = match path {
        Some(path) => PerturbationConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {path:?}"))?,
        None => PerturbationConfig::default(),
    };

    if let Some(variant) = variant {
        config = config.with_variant(Variant::from(variant));
    }
    if let Some(order) = order {
        config.params = Some(config.model_params().with_order(order));
    }
    Ok(config)
}

fn print_coefficients(solution: &Solution) {
    println!("{:>6} {:>6} {:>22} {:>22}", "i", "j", "a[i,j]", "a[i,j]/(i! j!)");
    for entry in solution.summary().coefficients {
        println!(
            "{:>6} {:>6} {:>22.14e} {:>22.14e}",
            entry.capital, entry.variance, entry.derivative, entry.power_series
        );
    }
    println!(
        "c(kss) = {:.12} at variance {}",
        solution.steady_state_consumption(),
        solution.model().params().variance
    );
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Example { variant } => {
            let config = match Variant::from(variant) {
                Variant::Deterministic => PerturbationConfig::deterministic(),
                Variant::Stochastic => PerturbationConfig::stochastic(),
            };
            println!("{}", config.to_json()?);
        }

        Commands::Validate { config } => {
            let loaded = PerturbationConfig::from_file(&config)
                .with_context(|| format!("Failed to load config from {config:?}"))?;
            loaded.validate().context("Invalid configuration")?;
            info!(variant = %loaded.variant, "configuration is valid");
        }

        Commands::Solve {
            config,
            variant,
            order,
            csv,
            summary,
        } => {
            let config = load_config(config.as_ref(), variant, order)?;
            let output = run(&config).context("Perturbation run failed")?;

            print_coefficients(&output.solution);
            println!(
                "max |R| on grid = {:.3e}, max adjacent change = {:.3e}",
                output.grid.max_abs(),
                output.grid.max_adjacent_change()
            );

            if let Some(path) = csv {
                output
                    .write_residual_csv(&path)
                    .with_context(|| format!("Failed to write {path:?}"))?;
                info!(path = ?path, "residual written");
            }
            if let Some(path) = summary {
                output
                    .write_summary_json(&path)
                    .with_context(|| format!("Failed to write {path:?}"))?;
                info!(path = ?path, "summary written");
            }
        }
    }

    Ok(())
}
