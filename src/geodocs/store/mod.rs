//! # Storage Layer
//!
//! Documents live in one of two places:
//!
//! - The relational `geodocs` table, behind the [`RecordBackend`] trait. Each
//!   row carries owner, format tag, content, and access statistics.
//!   - [`sqlite::SqliteBackend`]: production backend (SQLite, versioned migrations)
//!   - [`mem_backend::MemBackend`]: in-memory backend for tests
//!
//! - A [`legacy::LegacyDirectory`] of plain files, addressed by filename and
//!   read-only. No metadata is tracked for these.
//!
//! All formats share one table; each store filters by its format tag.

pub mod backend;
pub mod legacy;
pub mod mem_backend;
pub mod migrations;
pub mod sqlite;

pub use backend::RecordBackend;
pub use legacy::LegacyDirectory;
pub use mem_backend::MemBackend;
pub use sqlite::SqliteBackend;
