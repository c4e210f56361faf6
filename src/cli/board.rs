//! Board subcommands.

use clap::{Args, Subcommand};

#[derive(Subcommand, Debug)]
pub enum BoardCommand {
    /// Ranked activity timeline
    Timeline(BoardArgs),

    /// Newest open requests
    Requests(BoardArgs),

    /// Active public quests needing help
    ActiveQuests(BoardArgs),

    /// Any board by id (well-known or persisted)
    Show {
        /// Board id
        id: String,

        #[command(flatten)]
        args: BoardArgs,
    },

    /// Persist a board with the given item order
    Save {
        /// Board id
        id: String,

        /// Item ids in display order
        items: Vec<String>,
    },
}

#[derive(Args, Debug)]
pub struct BoardArgs {
    /// Viewing user id
    #[arg(short, long)]
    pub user: Option<String>,

    /// Maximum entries (defaults from config)
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Leave out entries authored by the viewing user
    #[arg(long)]
    pub exclude_own: bool,
}
