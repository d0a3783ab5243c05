//! CLI argument parsing for the haul-planner binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "haul-planner", about = "Haulage trip planner and day schedule builder")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Plan a shift for every pit of a JSON request
    Plan {
        /// Request file (camelCase JSON), `-` for stdin
        #[arg(long)]
        request: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        /// Write here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Resolve two locations and print the driving leg between them
    Leg {
        /// Maps link, place name or `lat,lng`
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
}
