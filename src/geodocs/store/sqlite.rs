//! SQLite implementation of [`RecordBackend`].
//!
//! Uses a simple `Arc<Mutex<Connection>>`: SQLite allows a single writer, and
//! every operation here is one short transaction, so a shared connection is
//! enough. The guard is dropped when the operation's closure returns.

use super::backend::RecordBackend;
use super::migrations;
use crate::error::{GeodocError, Result};
use crate::model::{DeleteOutcome, DocumentRecord, NewRecord};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

const MEMORY: &str = ":memory:";
const BUSY_TIMEOUT_MS: u32 = 5000;

#[derive(Clone)]
pub struct SqliteBackend {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBackend {
    /// Open (creating if needed) the database at `path`; `:memory:` opens a private
    /// in-memory database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!(path = ?path, "Opening SQLite document store");

        let in_memory = path.to_str() == Some(MEMORY);
        let conn = if in_memory {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    GeodocError::Storage(format!("Failed to create directory: {}", e))
                })?;
            }
            Connection::open(path)?
        };

        let backend = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        backend.initialize(!in_memory)?;
        Ok(backend)
    }

    pub fn memory() -> Result<Self> {
        Self::open(MEMORY)
    }

    fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    fn with_connection_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock();
        f(&mut conn)
    }

    fn initialize(&self, wal: bool) -> Result<()> {
        self.with_connection(|conn| {
            debug!("Configuring SQLite pragmas");
            if wal {
                conn.execute_batch("PRAGMA journal_mode = WAL;")?;
                conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
            }
            conn.execute_batch(&format!("PRAGMA busy_timeout = {};", BUSY_TIMEOUT_MS))?;

            migrations::apply_migrations(conn)?;
            info!("SQLite document store initialized");
            Ok(())
        })
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<DocumentRecord> {
    let access_count: i64 = row.get("access_count")?;
    Ok(DocumentRecord {
        hash: row.get("file_hash")?,
        owner: row.get("username")?,
        standard: row.get("standard")?,
        content: row.get("raw_file_content")?,
        created_at: row.get("created_at")?,
        last_access: row.get("last_access")?,
        access_count: access_count.max(0) as u64,
    })
}

const RECORD_COLUMNS: &str =
    "file_hash, username, standard, raw_file_content, created_at, last_access, access_count";

impl RecordBackend for SqliteBackend {
    fn insert(&self, record: &NewRecord) -> Result<bool> {
        self.with_connection(|conn| {
            let now: DateTime<Utc> = Utc::now();
            let inserted = conn.execute(
                "INSERT INTO geodocs (username, standard, raw_file_content, file_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(file_hash) DO NOTHING",
                params![
                    record.owner,
                    record.standard,
                    record.content,
                    record.hash,
                    now
                ],
            )?;
            debug!(hash = %record.hash, inserted, "Inserted geodoc");
            Ok(inserted == 1)
        })
    }

    fn fetch_and_touch(&self, hash: &str) -> Result<Option<String>> {
        self.with_connection_mut(|conn| {
            let tx = conn.transaction()?;
            let content: Option<String> = tx
                .query_row(
                    "SELECT raw_file_content FROM geodocs WHERE file_hash = ?1",
                    [hash],
                    |row| row.get(0),
                )
                .optional()?;
            if content.is_some() {
                let now: DateTime<Utc> = Utc::now();
                // last_access never moves backwards, even if the clock does
                tx.execute(
                    "UPDATE geodocs
                     SET access_count = access_count + 1,
                         last_access = CASE
                             WHEN last_access IS NULL OR last_access < ?1 THEN ?1
                             ELSE last_access
                         END
                     WHERE file_hash = ?2",
                    params![now, hash],
                )?;
            }
            tx.commit()?;
            Ok(content)
        })
    }

    fn get(&self, hash: &str) -> Result<Option<DocumentRecord>> {
        self.with_connection(|conn| {
            let sql = format!("SELECT {} FROM geodocs WHERE file_hash = ?1", RECORD_COLUMNS);
            Ok(conn.query_row(&sql, [hash], record_from_row).optional()?)
        })
    }

    fn list(&self, standard: &str, owner: &str) -> Result<Vec<DocumentRecord>> {
        self.with_connection(|conn| {
            let sql = format!(
                "SELECT {} FROM geodocs WHERE standard = ?1 AND username = ?2
                 ORDER BY created_at DESC, rowid DESC",
                RECORD_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([standard, owner], record_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    fn delete(&self, hash: &str, owner: &str) -> Result<DeleteOutcome> {
        self.with_connection_mut(|conn| {
            let tx = conn.transaction()?;
            let stored_owner: Option<String> = tx
                .query_row(
                    "SELECT username FROM geodocs WHERE file_hash = ?1",
                    [hash],
                    |row| row.get(0),
                )
                .optional()?;
            let outcome = match stored_owner {
                None => DeleteOutcome::NotFound,
                Some(stored) if stored != owner => DeleteOutcome::OwnerMismatch,
                Some(_) => {
                    tx.execute(
                        "DELETE FROM geodocs WHERE file_hash = ?1 AND username = ?2",
                        [hash, owner],
                    )?;
                    DeleteOutcome::Deleted
                }
            };
            tx.commit()?;
            Ok(outcome)
        })
    }
}
