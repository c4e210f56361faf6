//! Board composition over a snapshot of items and quests.
//!
//! Everything here is a pure read: the same snapshot always produces the same
//! board. Ids that no longer resolve are dropped, never reported.

pub mod requests;
pub mod timeline;

pub use requests::{select_active_quests, select_request_board};
pub use timeline::{Timeline, compose_timeline};

use crate::types::{Board, Item, Quest};
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const TIMELINE_BOARD: &str = "timeline";
pub const REQUESTS_BOARD: &str = "requests";
pub const ACTIVE_QUESTS_BOARD: &str = "active-quests";

/// Boards computed per request rather than persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WellKnownBoard {
    Timeline,
    Requests,
    ActiveQuests,
}

impl WellKnownBoard {
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            TIMELINE_BOARD => Some(WellKnownBoard::Timeline),
            REQUESTS_BOARD => Some(WellKnownBoard::Requests),
            ACTIVE_QUESTS_BOARD => Some(WellKnownBoard::ActiveQuests),
            _ => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            WellKnownBoard::Timeline => TIMELINE_BOARD,
            WellKnownBoard::Requests => REQUESTS_BOARD,
            WellKnownBoard::ActiveQuests => ACTIVE_QUESTS_BOARD,
        }
    }
}

/// Viewer and size parameters shared by the listing boards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardQuery {
    pub user_id: Option<String>,
    pub limit: usize,
    /// Drop entries authored by `user_id`.
    pub exclude_own: bool,
}

impl BoardQuery {
    pub fn new(user_id: Option<&str>, limit: usize) -> Self {
        Self {
            user_id: user_id.map(str::to_string),
            limit,
            exclude_own: false,
        }
    }

    pub fn exclude_own(mut self, exclude: bool) -> Self {
        self.exclude_own = exclude;
        self
    }

    fn excludes_author(&self, author_id: &str) -> bool {
        self.exclude_own && self.user_id.as_deref() == Some(author_id)
    }
}

/// Parse a stored timestamp to epoch milliseconds. Anything unreadable is 0.
pub fn parse_time_ms(raw: &str) -> i64 {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.timestamp_millis();
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.and_utc().timestamp_millis();
    }
    raw.parse::<i64>().unwrap_or(0)
}

pub(crate) fn item_time_ms(item: &Item) -> i64 {
    item.effective_time().map(parse_time_ms).unwrap_or(0)
}

/// Compose a board by id.
///
/// Well-known ids are computed from the snapshot; any other id uses the
/// persisted board, with unresolved item ids filtered out. Returns `None` for
/// an unknown id with nothing persisted.
pub fn compose_board(
    board_id: &str,
    items: &[Item],
    quests: &[Quest],
    persisted: Option<&Board>,
    query: &BoardQuery,
) -> Option<Board> {
    let ids = match WellKnownBoard::from_id(board_id) {
        Some(WellKnownBoard::Timeline) => {
            let mut ids = compose_timeline(items, quests, query.user_id.as_deref()).ids;
            ids.truncate(query.limit);
            ids
        }
        Some(WellKnownBoard::Requests) => select_request_board(items, query),
        Some(WellKnownBoard::ActiveQuests) => select_active_quests(quests, query),
        None => {
            let board = persisted?;
            let known: HashSet<&str> = items.iter().map(|i| i.id.as_str()).collect();
            board
                .items
                .iter()
                .filter(|id| known.contains(id.as_str()))
                .cloned()
                .collect()
        }
    };

    Some(Board {
        id: board_id.to_string(),
        items: ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ItemSubtype, ItemType};

    #[test]
    fn test_parse_time_ms() {
        assert_eq!(parse_time_ms("1970-01-01T00:00:01Z"), 1000);
        assert_eq!(parse_time_ms("1970-01-01T00:00:02.500"), 2500);
        assert_eq!(parse_time_ms("1970-01-01T01:00:00+01:00"), 0);
        assert_eq!(parse_time_ms("12345"), 12345);
        assert_eq!(parse_time_ms("not a date"), 0);
        assert_eq!(parse_time_ms(""), 0);
    }

    #[test]
    fn test_persisted_board_drops_unknown_ids() {
        let items = vec![
            Item::new("a", ItemType::FreeSpeech, "u"),
            Item::new("b", ItemType::FreeSpeech, "u"),
        ];
        let board = Board {
            id: "favourites".to_string(),
            items: vec!["b".to_string(), "gone".to_string(), "a".to_string()],
        };
        let composed =
            compose_board("favourites", &items, &[], Some(&board), &BoardQuery::new(None, 10)).unwrap();
        assert_eq!(composed.items, vec!["b", "a"]);
        assert!(compose_board("nope", &items, &[], None, &BoardQuery::new(None, 10)).is_none());
    }

    #[test]
    fn test_well_known_boards_are_computed() {
        let mut r = Item::new("r", ItemType::Request, "u");
        r.subtype = Some(ItemSubtype::Task);
        let items = vec![r, Item::new("p", ItemType::FreeSpeech, "u")];
        let query = BoardQuery::new(None, 1);

        let requests = compose_board(REQUESTS_BOARD, &items, &[], None, &query).unwrap();
        assert_eq!(requests.items, vec!["r"]);

        let timeline = compose_board(TIMELINE_BOARD, &items, &[], None, &query).unwrap();
        assert_eq!(timeline.items.len(), 1);

        let quests = vec![Quest::new("q", "Q", "u")];
        let active = compose_board(ACTIVE_QUESTS_BOARD, &items, &quests, None, &query).unwrap();
        assert_eq!(active.items, vec!["q"]);
        assert_eq!(WellKnownBoard::from_id("active-quests").map(|b| b.id()), Some("active-quests"));
    }
}
