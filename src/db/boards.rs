//! Persisted boards.

use super::Database;
use crate::types::Board;
use anyhow::Result;
use rusqlite::{OptionalExtension, params};

impl Database {
    pub fn get_board(&self, board_id: &str) -> Result<Option<Board>> {
        self.with_conn(|conn| {
            let items_json: Option<String> = conn
                .query_row(
                    "SELECT items FROM boards WHERE id = ?1",
                    params![board_id],
                    |row| row.get(0),
                )
                .optional()?;

            Ok(items_json.map(|json| Board {
                id: board_id.to_string(),
                items: serde_json::from_str(&json).unwrap_or_default(),
            }))
        })
    }

    pub fn upsert_board(&self, board: &Board) -> Result<()> {
        let items = serde_json::to_string(&board.items)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO boards (id, items) VALUES (?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET items = excluded.items",
                params![board.id, items],
            )?;
            Ok(())
        })
    }

    pub fn list_boards(&self) -> Result<Vec<Board>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, items FROM boards ORDER BY id")?;
            let boards = stmt
                .query_map([], |row| {
                    let id: String = row.get(0)?;
                    let items_json: String = row.get(1)?;
                    Ok(Board {
                        id,
                        items: serde_json::from_str(&items_json).unwrap_or_default(),
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(boards)
        })
    }
}
