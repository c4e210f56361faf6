//! Core types for the quest board engine.

use crate::error::{EngineError, EngineResult};
use crate::tags::Marker;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Kind of content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    FreeSpeech,
    Request,
    Task,
    File,
    Review,
    Change,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::FreeSpeech => "free_speech",
            ItemType::Request => "request",
            ItemType::Task => "task",
            ItemType::File => "file",
            ItemType::Review => "review",
            ItemType::Change => "change",
        }
    }

    /// Parse a type name. Accepts `free_speech`, `FreeSpeech` and `freespeech`.
    pub fn parse(s: &str) -> EngineResult<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "freespeech" => Ok(ItemType::FreeSpeech),
            "request" => Ok(ItemType::Request),
            "task" => Ok(ItemType::Task),
            "file" => Ok(ItemType::File),
            "review" => Ok(ItemType::Review),
            "change" => Ok(ItemType::Change),
            _ => Err(EngineError::unknown_type("type", s)),
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subtype qualifier. Only requests carry one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSubtype {
    Task,
    File,
}

impl ItemSubtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemSubtype::Task => "task",
            ItemSubtype::File => "file",
        }
    }

    pub fn parse(s: &str) -> EngineResult<Self> {
        match s.to_lowercase().as_str() {
            "task" => Ok(ItemSubtype::Task),
            "file" => Ok(ItemSubtype::File),
            _ => Err(EngineError::unknown_type("subtype", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Unlisted,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Unlisted => "unlisted",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "public" => Some(Visibility::Public),
            "private" => Some(Visibility::Private),
            "unlisted" => Some(Visibility::Unlisted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Open,
    Done,
    Archived,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Open => "open",
            ItemStatus::Done => "done",
            ItemStatus::Archived => "archived",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "open" => Some(ItemStatus::Open),
            "done" => Some(ItemStatus::Done),
            "archived" => Some(ItemStatus::Archived),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    #[default]
    Active,
    Paused,
    Completed,
    Archived,
}

impl QuestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestStatus::Active => "active",
            QuestStatus::Paused => "paused",
            QuestStatus::Completed => "completed",
            QuestStatus::Archived => "archived",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(QuestStatus::Active),
            "paused" => Some(QuestStatus::Paused),
            "completed" => Some(QuestStatus::Completed),
            "archived" => Some(QuestStatus::Archived),
            _ => None,
        }
    }
}

/// A typed content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub item_type: ItemType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<ItemSubtype>,
    pub author_id: String,
    /// The item this one replies to.
    pub parent_id: Option<String>,
    pub quest_id: Option<String>,

    // Display-only labels
    #[serde(default)]
    pub tags: BTreeSet<String>,
    // Structural state carried alongside the labels
    #[serde(default)]
    pub markers: Vec<Marker>,
    /// Quest ids this item links to.
    #[serde(default)]
    pub links: Vec<String>,

    #[serde(default)]
    pub visibility: Visibility,
    pub created_at: Option<String>,
    pub timestamp: Option<String>,
    pub node_id: Option<String>,
    #[serde(default)]
    pub status: ItemStatus,
}

impl Item {
    /// Create a public, open item with no relations.
    pub fn new(id: impl Into<String>, item_type: ItemType, author_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            item_type,
            subtype: None,
            author_id: author_id.into(),
            parent_id: None,
            quest_id: None,
            tags: BTreeSet::new(),
            markers: Vec::new(),
            links: Vec::new(),
            visibility: Visibility::Public,
            created_at: None,
            timestamp: None,
            node_id: None,
            status: ItemStatus::Open,
        }
    }

    pub fn is_archived(&self) -> bool {
        self.status == ItemStatus::Archived || self.markers.contains(&Marker::Archived)
    }

    pub fn is_system(&self) -> bool {
        self.markers.contains(&Marker::System)
    }

    /// The sort time: `timestamp`, falling back to `created_at`.
    pub fn effective_time(&self) -> Option<&str> {
        self.timestamp.as_deref().or(self.created_at.as_deref())
    }
}

/// The origin of a task edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeSource {
    /// The quest itself (its head item, when it has one).
    QuestRoot,
    Item(String),
}

impl EdgeSource {
    pub fn item(id: impl Into<String>) -> Self {
        EdgeSource::Item(id.into())
    }

    pub fn item_id(&self) -> Option<&str> {
        match self {
            EdgeSource::QuestRoot => None,
            EdgeSource::Item(id) => Some(id),
        }
    }

    pub fn is_item(&self, id: &str) -> bool {
        self.item_id() == Some(id)
    }
}

impl fmt::Display for EdgeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeSource::QuestRoot => f.write_str("<quest-root>"),
            EdgeSource::Item(id) => f.write_str(id),
        }
    }
}

/// A parent/child edge in a quest's task graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub from: EdgeSource,
    pub to: String,
}

impl Edge {
    pub fn new(from: EdgeSource, to: impl Into<String>) -> Self {
        Self { from, to: to.into() }
    }
}

/// A collaboration container owning a task graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub id: String,
    pub title: String,
    pub author_id: String,
    #[serde(default)]
    pub collaborators: Vec<String>,
    pub head_item_id: Option<String>,
    #[serde(default)]
    pub status: QuestStatus,
    #[serde(default)]
    pub visibility: Visibility,
    pub created_at: Option<String>,
    #[serde(default)]
    pub task_graph: Vec<Edge>,
}

impl Quest {
    pub fn new(id: impl Into<String>, title: impl Into<String>, author_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author_id: author_id.into(),
            collaborators: Vec::new(),
            head_item_id: None,
            status: QuestStatus::Active,
            visibility: Visibility::Public,
            created_at: None,
            task_graph: Vec::new(),
        }
    }

    /// True if the user authored or collaborates on this quest.
    pub fn involves(&self, user_id: &str) -> bool {
        self.author_id == user_id || self.collaborators.iter().any(|c| c == user_id)
    }
}

/// A named, ordered list of item ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: String,
    pub items: Vec<String>,
}
