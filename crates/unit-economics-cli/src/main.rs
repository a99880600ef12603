mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::breakeven::BreakEvenArgs;
use commands::catalog::CatalogArgs;
use commands::cohort::CohortArgs;
use commands::margin::{MarginArgs, TierMarginArgs};
use commands::projection::{CompareArgs, ProjectArgs};

/// Subscription unit economics for the training app
#[derive(Parser)]
#[command(
    name = "uecon",
    version,
    about = "Subscription unit-economics calculations",
    long_about = "Forecast paid-user cohorts, project fee-adjusted revenue and AI cost, \
                  compute per-tier margins, and size the break-even requirements of a \
                  cost change. All figures use decimal precision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// YAML or JSON file overriding the built-in fee, pricing and scenario tables
    #[arg(long, global = true)]
    catalog: Option<String>,

    /// Log diagnostics to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Active paid users month by month for an acquisition and churn rate
    Cohort(CohortArgs),
    /// Project revenue, AI cost and margin for one scenario
    Project(ProjectArgs),
    /// Project every catalog scenario side by side
    Compare(CompareArgs),
    /// Fee-adjusted margin for a gross revenue figure
    Margin(MarginArgs),
    /// Per-seat margin for each pricing tier
    TierMargins(TierMarginArgs),
    /// Break-even requirements for a monthly cost change
    BreakEven(BreakEvenArgs),
    /// Print the active fee, pricing and scenario tables
    Catalog(CatalogArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let catalog = match cli.catalog.as_deref().map(input::file::read_catalog).transpose() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Cohort(args) => commands::cohort::run_cohort(args),
        Commands::Project(args) => commands::projection::run_project(args, catalog),
        Commands::Compare(args) => commands::projection::run_compare(args, catalog),
        Commands::Margin(args) => commands::margin::run_margin(args),
        Commands::TierMargins(args) => commands::margin::run_tier_margins(args, catalog),
        Commands::BreakEven(args) => commands::breakeven::run_break_even(args),
        Commands::Catalog(args) => commands::catalog::run_catalog(args, catalog),
        Commands::Version => {
            println!("uecon {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            log::debug!("command failed: {e:?}");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
