//! Full snapshot export.

use crate::db::{Database, now_rfc3339};
use crate::types::{Board, Item, Quest};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Current export schema version.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub schema_version: u32,
    pub exported_at: String,
    pub quests: Vec<Quest>,
    pub items: Vec<Item>,
    pub boards: Vec<Board>,
}

impl Snapshot {
    pub fn from_database(db: &Database) -> Result<Self> {
        Ok(Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            exported_at: now_rfc3339(),
            quests: db.list_quests()?,
            items: db.list_items(None)?,
            boards: db.list_boards()?,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
