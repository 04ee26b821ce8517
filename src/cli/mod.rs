//! CLI module
//!
//! Command-line interface for running the pipeline.
//!
//! # Commands
//!
//! - `run` - Run the full pipeline (default when no command is given)
//! - `check` - Test the store connection and bucket presence
//! - `config` - Print the effective configuration

mod commands;
mod runner;

pub use commands::{Cli, Commands, SummaryFormat};
pub use runner::Runner;
