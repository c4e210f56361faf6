//! Item storage and node index reservation.

use super::{Database, bad_value};
use crate::relations::NodeIdPlan;
use crate::tags::{join_tags, split_tags};
use crate::types::{Item, ItemStatus, ItemSubtype, ItemType, Visibility};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};

const ITEM_COLUMNS: &str = "id, item_type, subtype, author_id, parent_id, quest_id, tags, links,
     visibility, created_at, timestamp, node_id, status";

pub fn parse_item_row(row: &Row) -> rusqlite::Result<Item> {
    let item_type: String = row.get("item_type")?;
    let subtype: Option<String> = row.get("subtype")?;
    let tags_json: String = row.get("tags")?;
    let links_json: String = row.get("links")?;
    let visibility: String = row.get("visibility")?;
    let status: String = row.get("status")?;

    let raw_tags: Vec<String> = serde_json::from_str(&tags_json).unwrap_or_default();
    let (markers, tags) = split_tags(&raw_tags);

    Ok(Item {
        id: row.get("id")?,
        item_type: ItemType::parse(&item_type).map_err(|_| bad_value(1, &item_type))?,
        subtype: subtype
            .map(|s| ItemSubtype::parse(&s).map_err(|_| bad_value(2, &s)))
            .transpose()?,
        author_id: row.get("author_id")?,
        parent_id: row.get("parent_id")?,
        quest_id: row.get("quest_id")?,
        tags,
        markers,
        links: serde_json::from_str(&links_json).unwrap_or_default(),
        visibility: Visibility::from_str(&visibility).ok_or_else(|| bad_value(8, &visibility))?,
        created_at: row.get("created_at")?,
        timestamp: row.get("timestamp")?,
        node_id: row.get("node_id")?,
        status: ItemStatus::from_str(&status).ok_or_else(|| bad_value(12, &status))?,
    })
}

/// Internal helper to list items using an existing connection (avoids deadlock).
fn list_items_internal(conn: &Connection, quest_id: Option<&str>) -> Result<Vec<Item>> {
    let items = match quest_id {
        Some(qid) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM items WHERE quest_id = ?1 ORDER BY rowid",
                ITEM_COLUMNS
            ))?;
            let rows = stmt
                .query_map(params![qid], parse_item_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        }
        None => {
            let mut stmt =
                conn.prepare(&format!("SELECT {} FROM items ORDER BY rowid", ITEM_COLUMNS))?;
            let rows = stmt
                .query_map([], parse_item_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        }
    };
    Ok(items)
}

impl Database {
    /// List items, optionally restricted to one quest, in insertion order.
    pub fn list_items(&self, quest_id: Option<&str>) -> Result<Vec<Item>> {
        self.with_conn(|conn| list_items_internal(conn, quest_id))
    }

    pub fn get_item(&self, item_id: &str) -> Result<Option<Item>> {
        self.with_conn(|conn| {
            let item = conn
                .query_row(
                    &format!("SELECT {} FROM items WHERE id = ?1", ITEM_COLUMNS),
                    params![item_id],
                    parse_item_row,
                )
                .optional()?;
            Ok(item)
        })
    }

    /// Insert or fully replace an item. Replacing keeps its original position.
    pub fn upsert_item(&self, item: &Item) -> Result<()> {
        self.execute_item_write(
            item,
            "ON CONFLICT(id) DO UPDATE SET
                 item_type = excluded.item_type,
                 subtype = excluded.subtype,
                 author_id = excluded.author_id,
                 parent_id = excluded.parent_id,
                 quest_id = excluded.quest_id,
                 tags = excluded.tags,
                 links = excluded.links,
                 visibility = excluded.visibility,
                 created_at = excluded.created_at,
                 timestamp = excluded.timestamp,
                 node_id = excluded.node_id,
                 status = excluded.status",
        )?;
        Ok(())
    }

    /// Insert a new item. Returns false, leaving the stored row untouched,
    /// when the id is already taken.
    pub fn insert_new_item(&self, item: &Item) -> Result<bool> {
        let inserted = self.execute_item_write(item, "ON CONFLICT(id) DO NOTHING")?;
        Ok(inserted == 1)
    }

    fn execute_item_write(&self, item: &Item, on_conflict: &str) -> Result<usize> {
        let tags = serde_json::to_string(&join_tags(&item.markers, &item.tags))?;
        let links = serde_json::to_string(&item.links)?;
        let sql = format!(
            "INSERT INTO items (id, item_type, subtype, author_id, parent_id, quest_id, tags,
                 links, visibility, created_at, timestamp, node_id, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
             {}",
            on_conflict
        );

        self.with_conn(|conn| {
            let changed = conn.execute(
                &sql,
                params![
                    item.id,
                    item.item_type.as_str(),
                    item.subtype.map(|s| s.as_str()),
                    item.author_id,
                    item.parent_id,
                    item.quest_id,
                    tags,
                    links,
                    item.visibility.as_str(),
                    item.created_at,
                    item.timestamp,
                    item.node_id,
                    item.status.as_str(),
                ],
            )?;
            Ok(changed)
        })
    }

    /// Reserve the next sibling index under `plan` inside one immediate
    /// transaction, so two connections cannot read the same counter.
    pub fn reserve_index(&self, quest_id: &str, plan: &NodeIdPlan) -> Result<u32> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let scanned = plan.count_existing(&list_items_internal(&tx, Some(quest_id))?);
            let stored: Option<u32> = tx
                .query_row(
                    "SELECT next_index FROM node_counters WHERE quest_id = ?1 AND prefix = ?2",
                    params![quest_id, plan.prefix],
                    |row| row.get(0),
                )
                .optional()?;
            let next = stored.unwrap_or(0).max(scanned);

            tx.execute(
                "INSERT INTO node_counters (quest_id, prefix, next_index) VALUES (?1, ?2, ?3)
                 ON CONFLICT(quest_id, prefix) DO UPDATE SET next_index = excluded.next_index",
                params![quest_id, plan.prefix, next + 1],
            )?;
            tx.commit()?;

            Ok(next)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::Marker;

    #[test]
    fn test_item_roundtrip_keeps_markers_and_labels() {
        let db = Database::open_in_memory().unwrap();
        let mut item = Item::new("i1", ItemType::Request, "u1");
        item.subtype = Some(ItemSubtype::File);
        item.markers = vec![Marker::Pending("u2".to_string())];
        item.tags.insert("help".to_string());
        item.links = vec!["q9".to_string()];
        item.visibility = Visibility::Unlisted;
        db.upsert_item(&item).unwrap();

        let loaded = db.get_item("i1").unwrap().unwrap();
        assert_eq!(loaded, item);
    }

    #[test]
    fn test_upsert_keeps_insertion_order() {
        let db = Database::open_in_memory().unwrap();
        for id in ["a", "b", "c"] {
            db.upsert_item(&Item::new(id, ItemType::FreeSpeech, "u")).unwrap();
        }
        let mut a = db.get_item("a").unwrap().unwrap();
        a.status = ItemStatus::Done;
        db.upsert_item(&a).unwrap();

        let ids: Vec<String> = db.list_items(None).unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(db.get_item("a").unwrap().unwrap().status, ItemStatus::Done);
    }

    #[test]
    fn test_insert_new_item_refuses_taken_id() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.insert_new_item(&Item::new("a", ItemType::Task, "u")).unwrap());
        assert!(!db.insert_new_item(&Item::new("a", ItemType::FreeSpeech, "v")).unwrap());

        let stored = db.get_item("a").unwrap().unwrap();
        assert_eq!(stored.item_type, ItemType::Task);
        assert_eq!(stored.author_id, "u");
    }

    #[test]
    fn test_missing_item_is_none() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_item("nope").unwrap().is_none());
    }
}
