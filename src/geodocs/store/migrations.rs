//! Schema management and migrations for the SQLite backend.

use crate::error::{GeodocError, Result};
use rusqlite::Connection;
use tracing::{debug, info};

/// Schema version - increment when adding a migration
const SCHEMA_VERSION: i32 = 1;

pub fn apply_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current_version = current_version(conn)?;
    debug!(current_version, target_version = SCHEMA_VERSION, "Checking migrations");

    if current_version < 1 {
        info!(from = current_version, to = SCHEMA_VERSION, "Applying schema migrations");
        apply_migration_v1(conn)?;
    }

    Ok(())
}

pub fn current_version(conn: &Connection) -> Result<i32> {
    let version: Option<i32> =
        conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })?;
    Ok(version.unwrap_or(0))
}

fn record_migration(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Migration v1: the geodocs table
fn apply_migration_v1(conn: &Connection) -> Result<()> {
    debug!("Applying migration v1: geodocs table");

    conn.execute_batch(SCHEMA_V1)
        .map_err(|e| GeodocError::Storage(format!("Failed to apply v1 schema: {}", e)))?;

    record_migration(conn, 1)?;
    info!("Migration v1 applied successfully");
    Ok(())
}

const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS geodocs (
    username TEXT NOT NULL,
    standard TEXT NOT NULL,         -- format tag, no leading dot
    raw_file_content TEXT NOT NULL,
    file_hash TEXT NOT NULL,
    created_at TEXT NOT NULL,
    last_access TEXT,
    access_count INTEGER NOT NULL DEFAULT 0,
    CHECK (length(file_hash) = 32)
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_geodocs_file_hash ON geodocs(file_hash);
CREATE INDEX IF NOT EXISTS idx_geodocs_listing ON geodocs(standard, username, created_at);
"#;
