//! Export subcommand for the questboard CLI
//!
//! Writes every quest, item and persisted board as one JSON snapshot.

use clap::Args;
use std::path::PathBuf;

/// Arguments for the export subcommand
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output file path (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}
