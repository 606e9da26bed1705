// src/store/sqlite.rs
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::DateTime;
use rusqlite::{params, Connection, OptionalExtension};

use super::ItemStore;
use crate::error::StoreError;
use crate::ingest::types::{Item, ItemId, NewItem};

/// SQLite-backed item store.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open from a storage connection string: `sqlite://path`, `sqlite::memory:`,
    /// `:memory:` or a plain filesystem path.
    pub fn connect(database_url: &str) -> Result<Self, StoreError> {
        let target = database_url
            .strip_prefix("sqlite://")
            .or_else(|| database_url.strip_prefix("sqlite:"))
            .unwrap_or(database_url);
        if target == ":memory:" {
            return Self::open_in_memory();
        }
        let path = Path::new(target);
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .map_err(|e| StoreError::Unavailable(format!("create {}: {e}", dir.display())))?;
        }
        Self::open(path)
    }

    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)
            .map_err(|e| StoreError::Unavailable(format!("open {}: {e}", path.display())))?;
        Self::init_with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Unavailable(format!("open_in_memory: {e}")))?;
        Self::init_with_connection(conn)
    }

    fn init_with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA busy_timeout = 5000;

            CREATE TABLE IF NOT EXISTS items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source TEXT NOT NULL,
                title TEXT NOT NULL,
                url TEXT NOT NULL UNIQUE,
                published_at INTEGER NOT NULL,
                summary TEXT NOT NULL DEFAULT ''
            );

            CREATE INDEX IF NOT EXISTS idx_items_published_at ON items(published_at);
            ",
        )
        .map_err(|e| StoreError::Unavailable(format!("init schema: {e}")))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn row_to_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<Item> {
    let millis: i64 = row.get(4)?;
    let published_at = DateTime::from_timestamp_millis(millis)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(4, millis))?;
    Ok(Item {
        id: ItemId(row.get(0)?),
        source: row.get(1)?,
        title: row.get(2)?,
        url: row.get(3)?,
        published_at,
        summary: row.get(5)?,
    })
}

/// Only the `url UNIQUE` constraint means "already stored". NOT NULL or
/// CHECK failures are real write failures.
fn map_insert_error(e: rusqlite::Error, url: &str) -> StoreError {
    match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            StoreError::DuplicateKey(url.to_string())
        }
        other => StoreError::Unavailable(format!("insert: {other}")),
    }
}

impl SqliteStore {
    /// Run blocking connection work off the async workers.
    async fn with_conn<T, F>(&self, op: &'static str, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(StoreError::unavailable)?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("{op}: {e}")))?
    }
}

#[async_trait]
impl ItemStore for SqliteStore {
    async fn exists(&self, url: &str) -> Result<bool, StoreError> {
        let url = url.to_string();
        self.with_conn("exists", move |conn| {
            let found: Option<i64> = conn
                .query_row("SELECT 1 FROM items WHERE url = ?1", params![url], |r| {
                    r.get(0)
                })
                .optional()
                .map_err(|e| StoreError::Unavailable(format!("exists: {e}")))?;
            Ok(found.is_some())
        })
        .await
    }

    async fn insert(&self, item: &NewItem) -> Result<ItemId, StoreError> {
        let item = item.clone();
        self.with_conn("insert", move |conn| {
            conn.execute(
                "INSERT INTO items (source, title, url, published_at, summary)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    item.source,
                    item.title,
                    item.url,
                    item.published_at.timestamp_millis(),
                    item.summary,
                ],
            )
            .map_err(|e| map_insert_error(e, &item.url))?;
            Ok(ItemId(conn.last_insert_rowid()))
        })
        .await
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Item>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_conn("recent", move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, source, title, url, published_at, summary FROM items
                     ORDER BY published_at DESC, id DESC LIMIT ?1",
                )
                .map_err(|e| StoreError::Unavailable(format!("recent: {e}")))?;
            let rows = stmt
                .query_map(params![limit], row_to_item)
                .map_err(|e| StoreError::Unavailable(format!("recent: {e}")))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(|e| StoreError::Unavailable(format!("recent row: {e}")))
        })
        .await
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}
