//! Curated request listing and the "quests needing help" listing.

use super::{BoardQuery, item_time_ms, parse_time_ms};
use crate::types::{Item, ItemType, Quest, QuestStatus, Visibility};
use std::cmp::Reverse;

fn is_open_request(item: &Item) -> bool {
    item.item_type == ItemType::Request
        && item.visibility != Visibility::Private
        && !item.is_archived()
        && !item.tags.contains("archived")
}

/// Newest visible, unarchived requests, at most `query.limit`.
pub fn select_request_board(items: &[Item], query: &BoardQuery) -> Vec<String> {
    let mut selected: Vec<(&Item, i64)> = items
        .iter()
        .filter(|i| is_open_request(i))
        .filter(|i| !query.excludes_author(&i.author_id))
        .map(|i| (i, item_time_ms(i)))
        .collect();

    selected.sort_by_key(|(_, t)| Reverse(*t));
    selected
        .into_iter()
        .take(query.limit)
        .map(|(i, _)| i.id.clone())
        .collect()
}

/// Newest active public quests, at most `query.limit`.
pub fn select_active_quests(quests: &[Quest], query: &BoardQuery) -> Vec<String> {
    let mut selected: Vec<(&Quest, i64)> = quests
        .iter()
        .filter(|q| q.status == QuestStatus::Active && q.visibility == Visibility::Public)
        .filter(|q| !query.excludes_author(&q.author_id))
        .map(|q| (q, q.created_at.as_deref().map(parse_time_ms).unwrap_or(0)))
        .collect();

    selected.sort_by_key(|(_, t)| Reverse(*t));
    selected
        .into_iter()
        .take(query.limit)
        .map(|(q, _)| q.id.clone())
        .collect()
}
