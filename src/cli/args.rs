use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Chart data as pretty-printed JSON
    #[default]
    Json,
    /// Slices and errors as terminal tables
    Table,
}

#[derive(Parser, Debug)]
#[command(name = "scoremap")]
#[command(about = "Score validation and chart data aggregation", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v: debug, -vv: trace). SCOREMAP_LOG takes precedence
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate scores and print the chart data
    Render {
        /// JSON file mapping subject names to scores
        #[arg(long)]
        scores: PathBuf,

        /// Display order of subjects (comma-separated). Defaults to category then name
        #[arg(long, value_delimiter = ',')]
        order: Option<Vec<String>>,

        /// Configuration file (defaults to the nearest .scoremap.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Fail if any subject is invalid
        #[arg(long)]
        strict: bool,
    },
    /// Validate scores and report every problem
    Validate {
        /// JSON file mapping subject names to scores
        #[arg(long)]
        scores: PathBuf,

        /// Configuration file (defaults to the nearest .scoremap.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Write a default .scoremap.toml in the current directory
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
