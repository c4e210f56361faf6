//! CLI command definitions for questboard
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod board;
pub mod export;
pub mod item;
pub mod quest;

use crate::format::OutputFormat;
use board::BoardCommand;
use clap::{Parser, Subcommand};
use export::ExportArgs;
use item::ItemCommand;
use quest::QuestCommand;

/// Quest board engine CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json, global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create and inspect quests
    #[command(subcommand)]
    Quest(QuestCommand),

    /// Create, validate and archive items
    #[command(subcommand)]
    Item(ItemCommand),

    /// Compose and save boards
    #[command(subcommand)]
    Board(BoardCommand),

    /// Export the whole store as a JSON snapshot
    Export(ExportArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_item_create() {
        let cli = Cli::try_parse_from([
            "questboard",
            "--format",
            "markdown",
            "item",
            "create",
            "--type",
            "task",
            "--author",
            "u1",
            "--quest",
            "q1",
            "--tag",
            "bug",
            "--tag",
            "pending:u2",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Markdown);
        match cli.command {
            Command::Item(ItemCommand::Create(args)) => {
                assert_eq!(args.item_type, "task");
                assert_eq!(args.quest.as_deref(), Some("q1"));
                assert_eq!(args.tags, vec!["bug", "pending:u2"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_board_requests() {
        let cli = Cli::try_parse_from([
            "questboard",
            "board",
            "requests",
            "--user",
            "u1",
            "--exclude-own",
        ])
        .unwrap();

        match cli.command {
            Command::Board(BoardCommand::Requests(args)) => {
                assert_eq!(args.user.as_deref(), Some("u1"));
                assert!(args.exclude_own);
                assert_eq!(args.limit, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_quest_graph() {
        let cli = Cli::try_parse_from(["questboard", "quest", "graph", "q1"]).unwrap();
        match cli.command {
            Command::Quest(QuestCommand::Graph { id }) => assert_eq!(id, "q1"),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
