//! Quest storage, including each quest's task edges.

use super::{Database, bad_value};
use crate::types::{Edge, EdgeSource, Quest, QuestStatus, Visibility};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

fn parse_quest_row(row: &Row) -> rusqlite::Result<Quest> {
    let collaborators_json: String = row.get("collaborators")?;
    let status: String = row.get("status")?;
    let visibility: String = row.get("visibility")?;

    Ok(Quest {
        id: row.get("id")?,
        title: row.get("title")?,
        author_id: row.get("author_id")?,
        collaborators: serde_json::from_str(&collaborators_json).unwrap_or_default(),
        head_item_id: row.get("head_item_id")?,
        status: QuestStatus::from_str(&status).ok_or_else(|| bad_value(5, &status))?,
        visibility: Visibility::from_str(&visibility).ok_or_else(|| bad_value(6, &visibility))?,
        created_at: row.get("created_at")?,
        task_graph: Vec::new(),
    })
}

fn load_edges(conn: &Connection, quest_id: &str) -> Result<Vec<Edge>> {
    let mut stmt = conn.prepare(
        "SELECT from_item_id, to_item_id FROM task_edges
         WHERE quest_id = ?1 ORDER BY position",
    )?;
    let edges = stmt
        .query_map(params![quest_id], |row| {
            let from: Option<String> = row.get(0)?;
            let to: String = row.get(1)?;
            Ok(Edge {
                from: from.map(EdgeSource::Item).unwrap_or(EdgeSource::QuestRoot),
                to,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(edges)
}

impl Database {
    pub fn list_quests(&self) -> Result<Vec<Quest>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM quests ORDER BY rowid")?;
            let mut quests = stmt
                .query_map([], parse_quest_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            for quest in &mut quests {
                quest.task_graph = load_edges(conn, &quest.id)?;
            }
            Ok(quests)
        })
    }

    pub fn get_quest(&self, quest_id: &str) -> Result<Option<Quest>> {
        self.with_conn(|conn| {
            let quest = conn
                .query_row(
                    "SELECT * FROM quests WHERE id = ?1",
                    params![quest_id],
                    parse_quest_row,
                )
                .optional()?;
            match quest {
                Some(mut quest) => {
                    quest.task_graph = load_edges(conn, quest_id)?;
                    Ok(Some(quest))
                }
                None => Ok(None),
            }
        })
    }

    /// Insert or fully replace a quest and its edge set in one transaction.
    pub fn upsert_quest(&self, quest: &Quest) -> Result<()> {
        let collaborators = serde_json::to_string(&quest.collaborators)?;

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            tx.execute(
                "INSERT INTO quests (id, title, author_id, collaborators, head_item_id, status,
                     visibility, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(id) DO UPDATE SET
                     title = excluded.title,
                     author_id = excluded.author_id,
                     collaborators = excluded.collaborators,
                     head_item_id = excluded.head_item_id,
                     status = excluded.status,
                     visibility = excluded.visibility,
                     created_at = excluded.created_at",
                params![
                    quest.id,
                    quest.title,
                    quest.author_id,
                    collaborators,
                    quest.head_item_id,
                    quest.status.as_str(),
                    quest.visibility.as_str(),
                    quest.created_at,
                ],
            )?;

            tx.execute("DELETE FROM task_edges WHERE quest_id = ?1", params![quest.id])?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO task_edges (quest_id, from_item_id, to_item_id, position)
                     VALUES (?1, ?2, ?3, ?4)",
                )?;
                for (position, edge) in quest.task_graph.iter().enumerate() {
                    stmt.execute(params![
                        quest.id,
                        edge.from.item_id(),
                        edge.to,
                        position as i64,
                    ])?;
                }
            }

            tx.commit()?;
            Ok(())
        })
    }
}
