//! SQLite storage for quests, items and boards.

pub mod boards;
pub mod items;
pub mod quests;

use crate::relations::NodeIdPlan;
use crate::repo::Repository;
use crate::types::{Board, Item, Quest};
use anyhow::{Result, anyhow};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Database handle wrapping a SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL lets board reads proceed while a writer holds the lock
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.run_migrations()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.run_migrations()?;

        Ok(db)
    }

    fn run_migrations(&self) -> Result<()> {
        self.with_conn_mut(|conn| {
            embedded::migrations::runner().run(conn)?;
            Ok(())
        })
    }

    /// Execute a function with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("database lock poisoned"))?;
        f(&conn)
    }

    /// Execute a function with mutable access to the connection (for transactions).
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("database lock poisoned"))?;
        f(&mut conn)
    }
}

impl Repository for Database {
    fn read_items(&self, quest_id: Option<&str>) -> Result<Vec<Item>> {
        self.list_items(quest_id)
    }

    fn read_item(&self, item_id: &str) -> Result<Option<Item>> {
        self.get_item(item_id)
    }

    fn read_quests(&self) -> Result<Vec<Quest>> {
        self.list_quests()
    }

    fn read_quest(&self, quest_id: &str) -> Result<Option<Quest>> {
        self.get_quest(quest_id)
    }

    fn write_item(&self, item: &Item) -> Result<()> {
        self.upsert_item(item)
    }

    fn insert_item(&self, item: &Item) -> Result<bool> {
        self.insert_new_item(item)
    }

    fn write_quest(&self, quest: &Quest) -> Result<()> {
        self.upsert_quest(quest)
    }

    fn read_board(&self, board_id: &str) -> Result<Option<Board>> {
        self.get_board(board_id)
    }

    fn write_board(&self, board: &Board) -> Result<()> {
        self.upsert_board(board)
    }

    fn reserve_node_index(&self, quest_id: &str, plan: &NodeIdPlan) -> Result<u32> {
        self.reserve_index(quest_id, plan)
    }
}

/// Current time as an RFC 3339 string.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Error for a stored value that does not map back onto an enum.
pub(crate) fn bad_value(column: usize, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        format!("unrecognised value: {}", value).into(),
    )
}
