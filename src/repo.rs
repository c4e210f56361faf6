//! Repository contract consumed by the service layer, plus an in-memory
//! implementation for tests and ephemeral use.
//!
//! Writes are full-entity replacements. The one non-trivial primitive is
//! [`Repository::reserve_node_index`], which hands out sibling indices
//! atomically so concurrent creators never receive the same node id.

use crate::relations::NodeIdPlan;
use crate::types::{Board, Item, Quest};
use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

pub trait Repository: Send + Sync {
    /// Items, optionally restricted to one quest, in insertion order.
    fn read_items(&self, quest_id: Option<&str>) -> Result<Vec<Item>>;

    fn read_item(&self, item_id: &str) -> Result<Option<Item>>;

    fn read_quests(&self) -> Result<Vec<Quest>>;

    fn read_quest(&self, quest_id: &str) -> Result<Option<Quest>>;

    fn write_item(&self, item: &Item) -> Result<()>;

    /// Store a new item. Returns false without writing when the id is taken.
    fn insert_item(&self, item: &Item) -> Result<bool>;

    fn write_quest(&self, quest: &Quest) -> Result<()>;

    fn read_board(&self, board_id: &str) -> Result<Option<Board>>;

    fn write_board(&self, board: &Board) -> Result<()>;

    /// Reserve the next index under `plan` within `quest_id`.
    ///
    /// The first reservation for a prefix starts at the number of matching
    /// items already stored; later ones continue from the stored counter.
    fn reserve_node_index(&self, quest_id: &str, plan: &NodeIdPlan) -> Result<u32>;
}

#[derive(Debug, Default)]
struct MemoryState {
    items: Vec<Item>,
    quests: Vec<Quest>,
    boards: HashMap<String, Board>,
    counters: HashMap<(String, String), u32>,
}

/// Repository held entirely in memory behind a mutex.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: Mutex<MemoryState>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a repository pre-filled with a snapshot.
    pub fn with_snapshot(items: Vec<Item>, quests: Vec<Quest>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                items,
                quests,
                ..Default::default()
            }),
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("memory repository lock poisoned"))
    }
}

impl Repository for MemoryRepository {
    fn read_items(&self, quest_id: Option<&str>) -> Result<Vec<Item>> {
        let state = self.state()?;
        Ok(state
            .items
            .iter()
            .filter(|i| quest_id.is_none() || i.quest_id.as_deref() == quest_id)
            .cloned()
            .collect())
    }

    fn read_item(&self, item_id: &str) -> Result<Option<Item>> {
        let state = self.state()?;
        Ok(state.items.iter().find(|i| i.id == item_id).cloned())
    }

    fn read_quests(&self) -> Result<Vec<Quest>> {
        Ok(self.state()?.quests.clone())
    }

    fn read_quest(&self, quest_id: &str) -> Result<Option<Quest>> {
        let state = self.state()?;
        Ok(state.quests.iter().find(|q| q.id == quest_id).cloned())
    }

    fn write_item(&self, item: &Item) -> Result<()> {
        let mut state = self.state()?;
        match state.items.iter().position(|i| i.id == item.id) {
            Some(idx) => state.items[idx] = item.clone(),
            None => state.items.push(item.clone()),
        }
        Ok(())
    }

    fn insert_item(&self, item: &Item) -> Result<bool> {
        let mut state = self.state()?;
        if state.items.iter().any(|i| i.id == item.id) {
            return Ok(false);
        }
        state.items.push(item.clone());
        Ok(true)
    }

    fn write_quest(&self, quest: &Quest) -> Result<()> {
        let mut state = self.state()?;
        match state.quests.iter().position(|q| q.id == quest.id) {
            Some(idx) => state.quests[idx] = quest.clone(),
            None => state.quests.push(quest.clone()),
        }
        Ok(())
    }

    fn read_board(&self, board_id: &str) -> Result<Option<Board>> {
        Ok(self.state()?.boards.get(board_id).cloned())
    }

    fn write_board(&self, board: &Board) -> Result<()> {
        self.state()?.boards.insert(board.id.clone(), board.clone());
        Ok(())
    }

    fn reserve_node_index(&self, quest_id: &str, plan: &NodeIdPlan) -> Result<u32> {
        let mut state = self.state()?;
        let scanned = {
            let in_quest: Vec<Item> = state
                .items
                .iter()
                .filter(|i| i.quest_id.as_deref() == Some(quest_id))
                .cloned()
                .collect();
            plan.count_existing(&in_quest)
        };
        let key = (quest_id.to_string(), plan.prefix.clone());
        let next = state.counters.get(&key).copied().unwrap_or(0).max(scanned);
        state.counters.insert(key, next + 1);
        Ok(next)
    }
}
