mod client;
mod commands;
mod config;
mod input;
mod logging;
mod output;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use commands::analysis::AnalyzeArgs;
use commands::draft::DraftCommand;
use commands::metrics::{GradeArgs, PreviewArgs};
use commands::rent_roll::ImportRentRollArgs;
use commands::sensitivity::{GridArgs, SensitivityArgs};
use config::{AppConfig, Overrides};

/// Commercial real-estate deal analysis
#[derive(Parser)]
#[command(
    name = "deal",
    version,
    about = "Commercial real-estate deal analysis",
    long_about = "Underwrite income properties with decimal precision: year-one metrics \
                  and grades, what-if sensitivity, full levered analysis (local or via the \
                  analysis backend) and a resumable step-by-step deal draft."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log filter (e.g. debug, deal_analyzer_core=trace); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// YAML config file
    #[arg(long, global = true, env = "DEAL_ANALYZER_CONFIG")]
    config: Option<PathBuf>,

    /// Analysis backend base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Directory holding the saved draft
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Year-one metrics with letter grades
    Preview(PreviewArgs),
    /// Grade a single metric value
    Grade(GradeArgs),
    /// What-if preview under percentage adjustments
    Sensitivity(SensitivityArgs),
    /// Rent x price grid of a preview metric
    SensitivityGrid(GridArgs),
    /// Full deal analysis with IRR, equity multiple and insights
    Analyze(AnalyzeArgs),
    /// Build a deal step by step in a saved draft
    #[command(subcommand)]
    Draft(DraftCommand),
    /// Import a rent roll from CSV
    ImportRentRoll(ImportRentRollArgs),
    /// Print the effective configuration
    Config,
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

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.log_level.as_deref());

    let overrides = Overrides {
        api_url: cli.api_url.clone(),
        state_dir: cli.state_dir.clone(),
    };
    let config = match AppConfig::load(cli.config.as_deref(), &overrides) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Preview(args) => commands::metrics::run_preview(args, &config),
        Commands::Grade(args) => commands::metrics::run_grade(args),
        Commands::Sensitivity(args) => commands::sensitivity::run_sensitivity(args, &config),
        Commands::SensitivityGrid(args) => commands::sensitivity::run_grid(args, &config),
        Commands::Analyze(args) => commands::analysis::run_analyze(args, &config).await,
        Commands::Draft(command) => commands::draft::run_draft(command, &config).await,
        Commands::ImportRentRoll(args) => commands::rent_roll::run_import(args, &config),
        Commands::Config => serde_json::to_value(&config).map_err(Into::into),
        Commands::Version => {
            println!("deal {}", env!("CARGO_PKG_VERSION"));
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
