//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Copy parquet rows from the source bucket into per-record JSON objects
#[derive(Parser, Debug)]
#[command(name = "taxi-ingest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Inline configuration JSON (takes precedence over --config)
    #[arg(long, global = true)]
    pub config_json: Option<String>,

    /// How the run summary is printed
    #[arg(short, long, global = true, default_value = "text")]
    pub summary: SummaryFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run the full pipeline
    Run,

    /// Check the store connection and both buckets
    Check,

    /// Print the effective configuration (secret redacted)
    Config,
}

/// Summary output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SummaryFormat {
    /// Human-readable lines
    Text,
    /// One JSON document
    Json,
}
