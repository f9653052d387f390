//! fx-crossrates CLI - cross-rate tables from ECB reference rates
//!
//! ## Example Usage
//!
//! ```bash
//! # Run the job described by ~/.fx-crossrates/config.toml (or the defaults)
//! fx-crossrates run
//!
//! # Year-end cross rates from the rates API
//! fx-crossrates api "https://api.exchangeratesapi.io/history?start_at=2010-01-01&end_at=2020-01-01" -o apifxrates.csv
//!
//! # Daily spot and annual average sets from a warehouse export
//! fx-crossrates sheet ecbfxrates.csv --join -o fxrates.csv
//!
//! # Print the effective configuration
//! fx-crossrates -c fx.toml show-config
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use fx_crossrates::batch::{self, RunReport};
use fx_crossrates::config::{RunConfig, SourceConfig};
use fx_crossrates::data::{Frequency, SeriesVariation};
use fx_crossrates::engine::SelfPairPolicy;
use fx_crossrates::normalize::SnapshotPolicy;
use std::path::{Path, PathBuf};
use std::process;

/// fx-crossrates: pairwise FX cross rates for snapshot dates
#[derive(Parser)]
#[command(name = "fx-crossrates")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Pairwise FX cross rates from ECB reference rates", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the configured job
    Run {
        /// Output file (overrides the configuration)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Fetch rates from a rates API history endpoint
    Api {
        /// History endpoint URL
        #[arg(value_name = "URL")]
        url: String,

        /// Output file
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Snapshot dates: all, year-end, latest-per-year, observed-extremes or MM-DD
        #[arg(short = 's', long)]
        snapshot: Option<String>,

        /// Emit identity rows (A/A = 1.0)
        #[arg(long)]
        self_pairs: bool,
    },

    /// Read an ECB statistical data warehouse export
    Sheet {
        /// Export file (CSV)
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Output file
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Frequency tag to keep
        #[arg(short = 'f', long, default_value = "A (Annual)")]
        frequency: String,

        /// Series variation tag to keep
        #[arg(long, default_value = "A (Average)")]
        series: String,

        /// Join daily spot and annual average sets
        #[arg(short = 'j', long)]
        join: bool,

        /// Snapshot dates: all, year-end, latest-per-year, observed-extremes or MM-DD
        #[arg(short = 's', long)]
        snapshot: Option<String>,

        /// Emit identity rows (A/A = 1.0)
        #[arg(long)]
        self_pairs: bool,
    },

    /// Print the effective configuration as TOML
    ShowConfig,
}

/// Load configuration from `path`, the default location, or defaults
fn load_config(path: Option<&Path>) -> anyhow::Result<RunConfig> {
    if let Some(config_path) = path {
        return RunConfig::from_path(config_path)
            .with_context(|| format!("Failed to load config {}", config_path.display()));
    }

    if let Some(home) = dirs::home_dir() {
        let default_config = home.join(".fx-crossrates").join("config.toml");
        if default_config.exists() {
            match RunConfig::from_path(&default_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    eprintln!("{} Ignoring {}: {}", "Warning:".yellow(), default_config.display(), e);
                }
            }
        }
    }

    Ok(RunConfig::default())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = load_config(cli.config.as_deref()).and_then(|config| {
        if cli.verbose {
            println!(
                "{} v{}",
                "fx-crossrates".cyan().bold(),
                env!("CARGO_PKG_VERSION")
            );
        }
        match cli.command {
            Commands::Run { output } => run_configured(config, output),
            Commands::Api {
                url,
                output,
                snapshot,
                self_pairs,
            } => run_api(ApiArgs {
                url,
                output,
                snapshot,
                self_pairs,
                config,
            }),
            Commands::Sheet {
                path,
                output,
                frequency,
                series,
                join,
                snapshot,
                self_pairs,
            } => run_sheet(SheetArgs {
                path,
                output,
                frequency,
                series,
                join,
                snapshot,
                self_pairs,
                config,
            }),
            Commands::ShowConfig => show_config(&config),
        }
    });

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

struct ApiArgs {
    url: String,
    output: Option<PathBuf>,
    snapshot: Option<String>,
    self_pairs: bool,
    config: RunConfig,
}

struct SheetArgs {
    path: PathBuf,
    output: Option<PathBuf>,
    frequency: String,
    series: String,
    join: bool,
    snapshot: Option<String>,
    self_pairs: bool,
    config: RunConfig,
}

fn run_configured(mut config: RunConfig, output: Option<PathBuf>) -> anyhow::Result<()> {
    if let Some(output) = output {
        config.output = output;
    }
    execute(&config)
}

fn run_api(args: ApiArgs) -> anyhow::Result<()> {
    let mut config = args.config;
    let timeout_secs = match config.source {
        SourceConfig::Api { timeout_secs, .. } => timeout_secs,
        _ => 30,
    };
    config.source = SourceConfig::Api {
        url: args.url,
        timeout_secs,
    };
    apply_overrides(&mut config, args.output, args.snapshot, args.self_pairs)?;
    execute(&config)
}

fn run_sheet(args: SheetArgs) -> anyhow::Result<()> {
    let mut config = args.config;
    let series: SeriesVariation = args.series.parse()?;
    config.source = if args.join {
        SourceConfig::SpreadsheetJoin {
            path: args.path,
            series,
        }
    } else {
        SourceConfig::Spreadsheet {
            path: args.path,
            frequency: args.frequency.parse::<Frequency>()?,
            series,
        }
    };
    apply_overrides(&mut config, args.output, args.snapshot, args.self_pairs)?;
    execute(&config)
}

fn apply_overrides(
    config: &mut RunConfig,
    output: Option<PathBuf>,
    snapshot: Option<String>,
    self_pairs: bool,
) -> anyhow::Result<()> {
    if let Some(output) = output {
        config.output = output;
    }
    if let Some(snapshot) = snapshot {
        config.snapshot = Some(snapshot.parse::<SnapshotPolicy>()?);
    }
    if self_pairs {
        config.self_pairs = SelfPairPolicy::Identity;
    }
    Ok(())
}

fn execute(config: &RunConfig) -> anyhow::Result<()> {
    println!("{}", "Computing cross rates...".cyan().bold());
    println!("  {} {}", "Snapshot:".bold(), config.effective_snapshot());
    println!();

    let report = batch::run(config).context("Cross-rate run failed")?;
    print_summary(&report);
    Ok(())
}

fn print_summary(report: &RunReport) {
    println!("{}", "Summary".green().bold());
    println!("{}", "=======".green());
    println!("  Observations:     {}", report.observations);
    println!(
        "  Cross rates:      {}",
        report.cross_rates().to_string().bright_green()
    );
    println!(
        "{} File saved in path: {}",
        "✓".green().bold(),
        report.export.directory.display()
    );
}

fn show_config(config: &RunConfig) -> anyhow::Result<()> {
    print!("{}", config.to_toml_string()?);
    Ok(())
}
