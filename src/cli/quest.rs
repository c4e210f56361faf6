//! Quest subcommands.

use clap::{Args, Subcommand};

#[derive(Subcommand, Debug)]
pub enum QuestCommand {
    /// Create a new quest
    Create(QuestCreateArgs),

    /// Show a quest and its task tree
    Show {
        /// Quest id
        id: String,
    },

    /// List the quest's task edges and check they form a forest
    Graph {
        /// Quest id
        id: String,
    },
}

#[derive(Args, Debug)]
pub struct QuestCreateArgs {
    /// Quest title (also the source of node id slugs)
    #[arg(short, long)]
    pub title: String,

    /// Author user id
    #[arg(short, long)]
    pub author: String,

    /// Collaborator user id (repeatable)
    #[arg(long = "collaborator", value_name = "USER")]
    pub collaborators: Vec<String>,

    /// Head item id
    #[arg(long)]
    pub head: Option<String>,

    /// Custom quest id (UUID7 generated if not provided)
    #[arg(long)]
    pub id: Option<String>,

    /// Hide the quest from public listings
    #[arg(long)]
    pub private: bool,
}
