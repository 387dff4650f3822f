mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use ratio_dashboard_core::DatasetCache;

use commands::export::ExportArgs;
use commands::query::LookupArgs;
use commands::DataArgs;

/// Financial ratio dashboard for a small set of listed companies
#[derive(Parser)]
#[command(
    name = "ratiodash",
    version,
    about = "Financial ratio dashboard for a small set of listed companies",
    long_about = "Loads a ratio table and a cash-flow input table, derives the Cash \
                  Conversion Cycle and answers dashboard queries: point lookups, \
                  year-over-year deltas, threshold alerts, grouped ratio views, \
                  cash-flow waterfalls and CSV export."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    data: DataArgs,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the full dashboard report for the current selection
    Report,
    /// List the companies and categories found in the ratio table
    Companies,
    /// Look up one ratio value for a company and year
    Lookup(LookupArgs),
    /// KPI cards (2024 value and change on 2023) for the first selected company
    Kpis,
    /// Critical, strength and improvement alerts
    Alerts,
    /// Profitability, liquidity, leverage, efficiency and structure views
    Groups,
    /// Cash-flow rows and waterfall series
    Waterfall,
    /// Formatted ratio table filtered by company and category
    Table,
    /// Export the selected companies' ratios as CSV
    Export(ExportArgs),
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

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let cache = DatasetCache::new();
    let data = &cli.data;

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Report => commands::query::run_report(&cache, data),
        Commands::Companies => commands::query::run_companies(&cache, data),
        Commands::Lookup(args) => commands::query::run_lookup(&cache, data, args),
        Commands::Kpis => commands::query::run_kpis(&cache, data),
        Commands::Alerts => commands::query::run_alerts(&cache, data),
        Commands::Groups => commands::query::run_groups(&cache, data),
        Commands::Waterfall => commands::query::run_waterfall(&cache, data),
        Commands::Table => commands::export::run_table(&cache, data),
        Commands::Export(args) => match commands::export::run_export(&cache, data, args) {
            // CSV already went to stdout
            Ok(None) => process::exit(0),
            Ok(Some(summary)) => Ok(summary),
            Err(e) => Err(e),
        },
        Commands::Version => {
            println!("ratiodash {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
