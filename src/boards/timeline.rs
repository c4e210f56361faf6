//! Ranked activity timeline.

use super::item_time_ms;
use crate::types::{Item, ItemType, Quest, Visibility};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};

/// Ordered timeline ids plus the highlight flag of each.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Timeline {
    pub ids: Vec<String>,
    pub highlights: BTreeMap<String, bool>,
}

/// How closely an item relates to the viewing user.
pub fn weight(
    item: &Item,
    involved_quests: &HashSet<&str>,
    involved_tasks: &HashSet<&str>,
) -> u8 {
    let in_quest = item
        .quest_id
        .as_deref()
        .is_some_and(|q| involved_quests.contains(q));

    if in_quest && item.item_type == ItemType::Task {
        3
    } else if in_quest {
        2
    } else if item.links.iter().any(|l| involved_quests.contains(l.as_str()))
        || item
            .parent_id
            .as_deref()
            .is_some_and(|p| involved_tasks.contains(p))
    {
        1
    } else {
        0
    }
}

/// Rank visible items for `user_id`: by weight, then newest first.
///
/// Ties keep their input order. Without a user every weight is zero and the
/// result is plain reverse-chronological.
pub fn compose_timeline(items: &[Item], quests: &[Quest], user_id: Option<&str>) -> Timeline {
    let mut involved_quests: HashSet<&str> = HashSet::new();
    let mut involved_tasks: HashSet<&str> = HashSet::new();

    if let Some(user) = user_id {
        involved_quests.extend(
            quests
                .iter()
                .filter(|q| q.involves(user))
                .map(|q| q.id.as_str()),
        );
        for item in items.iter().filter(|i| i.author_id == user) {
            if let Some(q) = item.quest_id.as_deref() {
                involved_quests.insert(q);
            }
            if item.item_type == ItemType::Task {
                involved_tasks.insert(item.id.as_str());
            }
        }
    }

    let mut ranked: Vec<(&Item, u8, i64)> = items
        .iter()
        .filter(|i| i.visibility != Visibility::Private && !i.is_system())
        .map(|i| (i, weight(i, &involved_quests, &involved_tasks), item_time_ms(i)))
        .collect();

    // sort_by_key is stable
    ranked.sort_by_key(|(_, w, t)| (Reverse(*w), Reverse(*t)));

    let mut timeline = Timeline::default();
    for (item, w, _) in ranked {
        timeline.ids.push(item.id.clone());
        timeline.highlights.insert(item.id.clone(), w == 1 || w == 3);
    }
    timeline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::Marker;

    fn at(id: &str, t: ItemType, author: &str, ts: &str) -> Item {
        let mut item = Item::new(id, t, author);
        item.timestamp = Some(ts.to_string());
        item
    }

    #[test]
    fn test_reply_to_involved_task_is_highlighted() {
        let mut task = at("taskX", ItemType::Task, "U", "2024-01-01T00:00:00Z");
        task.quest_id = Some("Q1".to_string());
        let mut reply = at("reply", ItemType::FreeSpeech, "V", "2024-01-02T00:00:00Z");
        reply.parent_id = Some("taskX".to_string());
        let quest = Quest::new("Q1", "Quest One", "U");

        let timeline = compose_timeline(&[task, reply], &[quest], Some("U"));
        assert_eq!(timeline.ids, vec!["taskX", "reply"]);
        assert_eq!(timeline.highlights["taskX"], true);
        assert_eq!(timeline.highlights["reply"], true);
    }

    #[test]
    fn test_weights() {
        let involved_quests: HashSet<&str> = ["Q1"].into_iter().collect();
        let involved_tasks: HashSet<&str> = ["t1"].into_iter().collect();

        let mut post = Item::new("p", ItemType::FreeSpeech, "x");
        post.quest_id = Some("Q1".to_string());
        assert_eq!(weight(&post, &involved_quests, &involved_tasks), 2);

        let mut linked = Item::new("l", ItemType::FreeSpeech, "x");
        linked.links = vec!["Q1".to_string()];
        assert_eq!(weight(&linked, &involved_quests, &involved_tasks), 1);

        let stranger = Item::new("s", ItemType::Task, "x");
        assert_eq!(weight(&stranger, &involved_quests, &involved_tasks), 0);
    }

    #[test]
    fn test_private_and_system_items_dropped() {
        let mut private = at("priv", ItemType::FreeSpeech, "U", "2024-01-01T00:00:00Z");
        private.visibility = Visibility::Private;
        let mut system = at("sys", ItemType::FreeSpeech, "U", "2024-01-01T00:00:00Z");
        system.markers.push(Marker::System);
        let public = at("pub", ItemType::FreeSpeech, "U", "2024-01-01T00:00:00Z");

        let timeline = compose_timeline(&[private, system, public], &[], Some("U"));
        assert_eq!(timeline.ids, vec!["pub"]);
    }

    #[test]
    fn test_bad_timestamps_sort_as_epoch() {
        let newest = at("new", ItemType::FreeSpeech, "a", "2024-05-01T00:00:00Z");
        let broken = at("broken", ItemType::FreeSpeech, "a", "yesterday-ish");
        let missing = Item::new("missing", ItemType::FreeSpeech, "a");
        let old = at("old", ItemType::FreeSpeech, "a", "1999-01-01T00:00:00Z");

        let timeline = compose_timeline(&[broken, missing, old, newest], &[], None);
        assert_eq!(timeline.ids, vec!["new", "old", "broken", "missing"]);
        assert!(timeline.highlights.values().all(|h| !h));
    }

    #[test]
    fn test_collaborator_involvement_and_idempotence() {
        let mut quest = Quest::new("Q2", "Other", "owner");
        quest.collaborators.push("U".to_string());
        let mut task = at("t", ItemType::Task, "owner", "2024-01-01T00:00:00Z");
        task.quest_id = Some("Q2".to_string());
        let mut note = at("n", ItemType::FreeSpeech, "owner", "2024-02-01T00:00:00Z");
        note.quest_id = Some("Q2".to_string());
        let loose = at("x", ItemType::FreeSpeech, "owner", "2024-03-01T00:00:00Z");
        let items = vec![loose, note, task];
        let quests = vec![quest];

        let first = compose_timeline(&items, &quests, Some("U"));
        assert_eq!(first.ids, vec!["t", "n", "x"]);
        assert_eq!(first.highlights["n"], false);
        assert_eq!(first, compose_timeline(&items, &quests, Some("U")));
    }
}
