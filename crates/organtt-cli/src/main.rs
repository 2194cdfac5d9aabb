//! organtt CLI - Operating-room Gantt chart generator
//!
//! Reads the surgery records of an input workbook and writes the chart
//! workbook: a copy of the records plus the calendar-ordered and
//! weekday-ordered Gantt sheets.

mod config;
mod generate;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::AppConfig;
use crate::generate::{RunOptions, RunSummary};

#[derive(Parser)]
#[command(name = "organtt")]
#[command(author, version, about = "Operating-room Gantt chart generator", long_about = None)]
struct Cli {
    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SummaryFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the chart workbook
    Generate {
        /// Input workbook
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output file (default: next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file (TOML)
        #[arg(short, long, env = "ORGANTT_CONFIG")]
        config: Option<PathBuf>,

        /// Ignore the template sheet and use built-in styles
        #[arg(long)]
        no_template: bool,

        /// Summary format
        #[arg(short, long, value_enum, default_value = "text")]
        format: SummaryFormat,
    },

    /// Read and lay out the input without writing anything
    Check {
        /// Input workbook
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Configuration file (TOML)
        #[arg(short, long, env = "ORGANTT_CONFIG")]
        config: Option<PathBuf>,

        /// Summary format
        #[arg(short, long, value_enum, default_value = "text")]
        format: SummaryFormat,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn print_summary(summary: &RunSummary, format: SummaryFormat) -> Result<()> {
    match format {
        SummaryFormat::Text => print!("{}", summary.to_text()),
        SummaryFormat::Json => {
            let json = serde_json::to_string_pretty(summary).context("failed to encode summary")?;
            println!("{json}");
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Generate {
            input,
            output,
            config,
            no_template,
            format,
        }) => {
            let options = RunOptions {
                input,
                output,
                config: AppConfig::load(config.as_deref())?,
                use_template: !no_template,
                write: true,
            };
            let summary = generate::run(&options)?;
            print_summary(&summary, format)?;
        }
        Some(Commands::Check {
            input,
            config,
            format,
        }) => {
            let options = RunOptions {
                input,
                output: None,
                config: AppConfig::load(config.as_deref())?,
                use_template: true,
                write: false,
            };
            let summary = generate::run(&options)?;
            print_summary(&summary, format)?;
        }
        None => {
            println!("organtt - Operating-room Gantt chart generator");
            println!("Run with --help for usage information");
        }
    }

    Ok(())
}
