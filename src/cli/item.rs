//! Item subcommands.

use clap::{Args, Subcommand};

#[derive(Subcommand, Debug)]
pub enum ItemCommand {
    /// Create an item, assigning its node id and task edge
    Create(ItemCreateArgs),

    /// Check whether an item type may attach to a parent
    Validate(ItemValidateArgs),

    /// Show an item
    Show {
        /// Item id
        id: String,
    },

    /// Archive an item and rewire its quest's task graph
    Archive {
        /// Item id
        id: String,
    },
}

#[derive(Args, Debug)]
pub struct ItemCreateArgs {
    /// Item type: free_speech, request, task, file, review, change
    #[arg(short = 't', long = "type")]
    pub item_type: String,

    /// Subtype for requests: task or file
    #[arg(short, long)]
    pub subtype: Option<String>,

    /// Author user id
    #[arg(short, long)]
    pub author: String,

    /// Item this one replies to
    #[arg(short, long)]
    pub parent: Option<String>,

    /// Quest the item belongs to (inherited from the parent if omitted)
    #[arg(short, long)]
    pub quest: Option<String>,

    /// Tag (repeatable)
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Linked quest id (repeatable)
    #[arg(long = "link", value_name = "QUEST")]
    pub links: Vec<String>,

    /// Custom item id (UUID7 generated if not provided)
    #[arg(long)]
    pub id: Option<String>,

    /// Hide the item from boards
    #[arg(long)]
    pub private: bool,
}

#[derive(Args, Debug)]
pub struct ItemValidateArgs {
    /// Child item type
    #[arg(short = 't', long = "type")]
    pub item_type: String,

    /// Child subtype
    #[arg(short, long)]
    pub subtype: Option<String>,

    /// Parent item id
    #[arg(short, long)]
    pub parent: Option<String>,
}
