//! Orchestration of item creation, archival and board reads.
//!
//! Creation runs: resolve parent, validate the attachment and check that parent
//! and child share a quest. Then, inside the quest's exclusive scope, it refuses
//! a taken id, settles the task edge, reserves a node id and inserts the item
//! before writing the new graph. Archival rewires the task graph inside the same scope before the
//! item is marked archived. Board reads take a snapshot and never lock.

use crate::boards::{self, BoardQuery, Timeline, WellKnownBoard};
use crate::db::now_rfc3339;
use crate::error::{EngineError, EngineResult};
use crate::relations::{self, Verdict, task_graph};
use crate::repo::Repository;
use crate::tags::split_tags;
use crate::types::{
    Board, EdgeSource, Item, ItemStatus, ItemSubtype, ItemType, Quest, QuestStatus, Visibility,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Per-quest exclusive scopes for read-count-write sequences.
#[derive(Debug, Default)]
pub struct QuestLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl QuestLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock guarding `quest_id`, created on first use.
    pub fn scope(&self, quest_id: &str) -> EngineResult<Arc<Mutex<()>>> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| EngineError::internal("quest lock table poisoned"))?;
        Ok(Arc::clone(
            locks
                .entry(quest_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        ))
    }
}

/// Input for creating a quest.
#[derive(Debug, Clone)]
pub struct NewQuest {
    pub id: Option<String>,
    pub title: String,
    pub author_id: String,
    pub collaborators: Vec<String>,
    pub head_item_id: Option<String>,
    pub visibility: Visibility,
}

impl NewQuest {
    pub fn new(title: impl Into<String>, author_id: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            author_id: author_id.into(),
            collaborators: Vec::new(),
            head_item_id: None,
            visibility: Visibility::Public,
        }
    }
}

/// Input for creating an item.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub id: Option<String>,
    pub item_type: ItemType,
    pub subtype: Option<ItemSubtype>,
    pub author_id: String,
    pub parent_id: Option<String>,
    pub quest_id: Option<String>,
    /// Raw tags; structural markers are split out on creation.
    pub tags: Vec<String>,
    pub links: Vec<String>,
    pub visibility: Visibility,
}

impl NewItem {
    pub fn new(item_type: ItemType, author_id: impl Into<String>) -> Self {
        Self {
            id: None,
            item_type,
            subtype: None,
            author_id: author_id.into(),
            parent_id: None,
            quest_id: None,
            tags: Vec::new(),
            links: Vec::new(),
            visibility: Visibility::Public,
        }
    }

    pub fn in_quest(mut self, quest_id: impl Into<String>) -> Self {
        self.quest_id = Some(quest_id.into());
        self
    }

    pub fn reply_to(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_subtype(mut self, subtype: ItemSubtype) -> Self {
        self.subtype = Some(subtype);
        self
    }
}

pub struct QuestService<R: Repository> {
    repo: R,
    locks: QuestLocks,
}

impl<R: Repository> QuestService<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            locks: QuestLocks::new(),
        }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn create_quest(&self, input: NewQuest) -> EngineResult<Quest> {
        let mut quest = Quest::new(
            input.id.unwrap_or_else(|| Uuid::now_v7().to_string()),
            input.title,
            input.author_id,
        );
        quest.collaborators = input.collaborators;
        quest.head_item_id = input.head_item_id;
        quest.visibility = input.visibility;
        quest.status = QuestStatus::Active;
        quest.created_at = Some(now_rfc3339());

        self.repo.write_quest(&quest)?;
        info!(quest_id = %quest.id, title = %quest.title, "Quest created");
        Ok(quest)
    }

    pub fn get_quest(&self, quest_id: &str) -> EngineResult<Quest> {
        self.repo
            .read_quest(quest_id)?
            .ok_or_else(|| EngineError::quest_not_found(quest_id))
    }

    /// The quest's edges and whether they still form a forest.
    pub fn quest_graph(&self, quest_id: &str) -> EngineResult<task_graph::GraphAudit> {
        let report = task_graph::audit(&self.get_quest(quest_id)?);
        if let Some(problem) = &report.problem {
            warn!(quest_id = %quest_id, problem = %problem, "Task graph is not a forest");
        }
        Ok(report)
    }

    pub fn get_item(&self, item_id: &str) -> EngineResult<Item> {
        self.repo
            .read_item(item_id)?
            .ok_or_else(|| EngineError::item_not_found(item_id))
    }

    /// Classify an attachment without creating anything.
    pub fn validate(
        &self,
        parent_id: Option<&str>,
        item_type: ItemType,
        subtype: Option<ItemSubtype>,
    ) -> EngineResult<Verdict> {
        let parent = match parent_id {
            Some(id) => match self.repo.read_item(id)? {
                Some(item) => Some(item),
                None => return Ok(Verdict::Reject(relations::RejectReason::DanglingParent)),
            },
            None => None,
        };
        Ok(relations::validate_attachment(parent.as_ref(), item_type, subtype))
    }

    pub fn create_item(&self, input: NewItem) -> EngineResult<Item> {
        let parent = match input.parent_id.as_deref() {
            Some(id) => Some(
                self.repo
                    .read_item(id)?
                    .ok_or_else(|| EngineError::dangling("parent_id", id))?,
            ),
            None => None,
        };

        relations::validate_attachment(parent.as_ref(), input.item_type, input.subtype)
            .into_result()?;

        // A reply may not pull its parent into another quest's graph
        if let (Some(p), Some(child_quest)) = (&parent, input.quest_id.as_deref()) {
            if let Some(parent_quest) = p.quest_id.as_deref().filter(|q| *q != child_quest) {
                return Err(EngineError::quest_mismatch(&p.id, parent_quest, child_quest));
            }
        }

        // Replies without an explicit quest stay in their parent's quest
        let quest_id = input
            .quest_id
            .clone()
            .or_else(|| parent.as_ref().and_then(|p| p.quest_id.clone()));

        let (markers, labels) = split_tags(&input.tags);
        let now = now_rfc3339();
        let mut item = Item::new(
            input.id.unwrap_or_else(|| Uuid::now_v7().to_string()),
            input.item_type,
            input.author_id,
        );
        item.subtype = input.subtype;
        item.parent_id = input.parent_id;
        item.quest_id = quest_id.clone();
        item.tags = labels;
        item.markers = markers;
        item.links = input.links;
        item.visibility = input.visibility;
        item.created_at = Some(now.clone());
        item.timestamp = Some(now);

        let Some(quest_id) = quest_id else {
            self.insert_new(&item)?;
            info!(item_id = %item.id, item_type = %item.item_type, "Item created");
            return Ok(item);
        };

        let scope = self.locks.scope(&quest_id)?;
        let _guard = scope
            .lock()
            .map_err(|_| EngineError::internal("quest scope poisoned"))?;

        if self.repo.read_item(&item.id)?.is_some() {
            return Err(EngineError::item_exists(&item.id));
        }

        let quest = self
            .repo
            .read_quest(&quest_id)?
            .ok_or_else(|| EngineError::dangling("quest_id", &quest_id))?;

        // Settle the graph change before anything is written
        let next_quest = if item.item_type == ItemType::Task {
            let from = match &parent {
                Some(p)
                    if p.item_type == ItemType::Task
                        && p.quest_id.as_deref() == Some(quest.id.as_str()) =>
                {
                    EdgeSource::item(p.id.clone())
                }
                _ => EdgeSource::QuestRoot,
            };
            Some(task_graph::add_edge(&quest, from, &item.id)?)
        } else {
            None
        };

        if let Some(plan) = relations::plan_node_id(&quest, item.item_type, parent.as_ref()) {
            let index = self.repo.reserve_node_index(&quest.id, &plan)?;
            item.node_id = Some(plan.format(index));
        }

        self.insert_new(&item)?;
        if let Some(next) = next_quest {
            self.repo.write_quest(&next)?;
        }

        info!(
            item_id = %item.id,
            item_type = %item.item_type,
            quest_id = %quest_id,
            node_id = item.node_id.as_deref().unwrap_or(""),
            "Item created"
        );
        Ok(item)
    }

    fn insert_new(&self, item: &Item) -> EngineResult<()> {
        if self.repo.insert_item(item)? {
            Ok(())
        } else {
            Err(EngineError::item_exists(&item.id))
        }
    }

    /// Archive an item, moving its task children up to its former parent.
    pub fn archive_item(&self, item_id: &str) -> EngineResult<Item> {
        let mut item = self.get_item(item_id)?;
        if item.status == ItemStatus::Archived {
            debug!(item_id = %item.id, "Item already archived");
            return Ok(item);
        }

        let scope = item
            .quest_id
            .as_deref()
            .map(|q| self.locks.scope(q))
            .transpose()?;
        let _guard = match &scope {
            Some(lock) => Some(
                lock.lock()
                    .map_err(|_| EngineError::internal("quest scope poisoned"))?,
            ),
            None => None,
        };

        if let Some(quest_id) = item.quest_id.as_deref() {
            if let Some(quest) = self.repo.read_quest(quest_id)? {
                let next = task_graph::remove_node(&quest, &item.id);
                if next.task_graph != quest.task_graph {
                    self.repo.write_quest(&next)?;
                    debug!(quest_id = %quest_id, item_id = %item.id, "Task graph rewired");
                }
            }
        }

        item.status = ItemStatus::Archived;
        self.repo.write_item(&item)?;

        info!(item_id = %item.id, "Item archived");
        Ok(item)
    }

    /// Add a task edge directly, outside item creation.
    pub fn add_task_edge(&self, quest_id: &str, from: EdgeSource, child_id: &str) -> EngineResult<Quest> {
        let scope = self.locks.scope(quest_id)?;
        let _guard = scope
            .lock()
            .map_err(|_| EngineError::internal("quest scope poisoned"))?;

        let quest = self.get_quest(quest_id)?;
        self.ensure_task_in_quest(child_id, "to", quest_id)?;
        if let Some(parent_id) = from.item_id() {
            self.ensure_task_in_quest(parent_id, "from", quest_id)?;
        }
        let next = task_graph::add_edge(&quest, from, child_id)?;
        self.repo.write_quest(&next)?;
        Ok(next)
    }

    fn ensure_task_in_quest(&self, item_id: &str, field: &str, quest_id: &str) -> EngineResult<()> {
        let item = self
            .repo
            .read_item(item_id)?
            .ok_or_else(|| EngineError::dangling(field, item_id))?;
        match item.quest_id.as_deref() {
            Some(q) if q == quest_id => {}
            other => {
                let actual = other.unwrap_or("<none>");
                return Err(EngineError::quest_mismatch(item_id, actual, quest_id));
            }
        }
        if item.item_type != ItemType::Task {
            return Err(EngineError::forest_violation(format!(
                "{} is a {}, only tasks join the task graph",
                item_id, item.item_type
            )));
        }
        Ok(())
    }

    pub fn timeline(&self, user_id: Option<&str>) -> EngineResult<Timeline> {
        let items = self.repo.read_items(None)?;
        let quests = self.repo.read_quests()?;
        debug!(items = items.len(), quests = quests.len(), "Composing timeline");
        Ok(boards::compose_timeline(&items, &quests, user_id))
    }

    pub fn request_board(&self, query: &BoardQuery) -> EngineResult<Vec<String>> {
        let items = self.repo.read_items(None)?;
        Ok(boards::select_request_board(&items, query))
    }

    pub fn active_quests(&self, query: &BoardQuery) -> EngineResult<Vec<String>> {
        let quests = self.repo.read_quests()?;
        Ok(boards::select_active_quests(&quests, query))
    }

    /// A well-known board computed on demand, or a persisted board.
    pub fn board(&self, board_id: &str, query: &BoardQuery) -> EngineResult<Board> {
        let persisted = match WellKnownBoard::from_id(board_id) {
            Some(_) => None,
            None => self.repo.read_board(board_id)?,
        };
        let items = self.repo.read_items(None)?;
        let quests = self.repo.read_quests()?;

        boards::compose_board(board_id, &items, &quests, persisted.as_ref(), query)
            .ok_or_else(|| EngineError::board_not_found(board_id))
    }

    pub fn save_board(&self, board: &Board) -> EngineResult<()> {
        self.repo.write_board(board)?;
        info!(board_id = %board.id, items = board.items.len(), "Board saved");
        Ok(())
    }
}
