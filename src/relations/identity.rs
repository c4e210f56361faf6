//! Hierarchical node ids for items inside a quest.
//!
//! A node id is a colon-separated path such as `Q:fix_bug:T00:T01`: the quest
//! slug followed by one `<segment><index>` pair per level. Indices are
//! zero-padded to two digits and are never reused: archived and removed items
//! keep counting toward their siblings' indices.

use crate::types::{Item, ItemType, Quest};
use regex_lite::Regex;
use std::sync::LazyLock;

static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9 ]").expect("slug regex is valid"));
static SPACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" +").expect("space regex is valid"));

/// Lowercase, drop everything but `[a-z0-9 ]`, join words with `_`.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = NON_SLUG_CHARS.replace_all(&lowered, "");
    let joined = SPACES.replace_all(stripped.trim(), "_");
    joined.trim_matches('_').to_string()
}

/// Segment letter for an item type, or `None` when the type carries no node id.
pub fn type_segment(item_type: ItemType) -> Option<&'static str> {
    match item_type {
        ItemType::Task => Some("T"),
        ItemType::Change => Some("C"),
        ItemType::FreeSpeech => Some("L"),
        ItemType::Request | ItemType::File | ItemType::Review => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum CountScope {
    /// Parentless tasks of one quest.
    RootTasks { quest_id: String },
    /// Every item of the segment whose node id starts with the prefix.
    Prefix,
}

/// Where a new node id goes, before its index is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdPlan {
    pub prefix: String,
    pub segment: &'static str,
    scope: CountScope,
}

impl NodeIdPlan {
    /// Number of existing items occupying an index under this plan.
    pub fn count_existing(&self, items: &[Item]) -> u32 {
        let count = items
            .iter()
            .filter(|item| {
                let Some(node_id) = item.node_id.as_deref().filter(|n| !n.is_empty()) else {
                    return false;
                };
                if type_segment(item.item_type) != Some(self.segment) {
                    return false;
                }
                match &self.scope {
                    CountScope::RootTasks { quest_id } => {
                        item.quest_id.as_deref() == Some(quest_id.as_str()) && item.parent_id.is_none()
                    }
                    CountScope::Prefix => node_id.starts_with(&self.prefix),
                }
            })
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    pub fn format(&self, index: u32) -> String {
        format!("{}{:02}", self.prefix, index)
    }
}

/// Work out the prefix and segment for a new item, or `None` if the type
/// needs no node id.
pub fn plan_node_id(quest: &Quest, item_type: ItemType, parent: Option<&Item>) -> Option<NodeIdPlan> {
    let segment = type_segment(item_type)?;
    let slug = slugify(&quest.title);

    if segment == "T" && parent.is_none() {
        return Some(NodeIdPlan {
            prefix: format!("Q:{}:T", slug),
            segment,
            scope: CountScope::RootTasks {
                quest_id: quest.id.clone(),
            },
        });
    }

    let base_path = parent
        .and_then(|p| p.node_id.as_deref())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Q:{}", slug));

    Some(NodeIdPlan {
        prefix: format!("{}:{}", base_path, segment),
        segment,
        scope: CountScope::Prefix,
    })
}

/// Compute the node id for a new item by scanning the quest's items.
///
/// Returns an empty string for types that carry no node id.
pub fn assign_node_id(
    quest: &Quest,
    items_in_quest: &[Item],
    item_type: ItemType,
    parent: Option<&Item>,
) -> String {
    match plan_node_id(quest, item_type, parent) {
        Some(plan) => {
            let index = plan.count_existing(items_in_quest);
            plan.format(index)
        }
        None => String::new(),
    }
}
