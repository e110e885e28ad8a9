//! # Geodocs Architecture
//!
//! Geodocs stores geospatial context documents (WMC, SLD, KML, GPX) submitted
//! by users and hands them back by name. It is a library first; the `geodocs`
//! binary is one client of it.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (main.rs, args.rs)                                     │
//! │  - Parses arguments, prints output, owns exit codes         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - DocumentStore → FormatStore per format tag               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - save, load, list, delete                                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - RecordBackend: SqliteBackend, MemBackend (testing)       │
//! │  - LegacyDirectory: read-only plain files                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commands lean on a handful of collaborators:
//!
//! - [`address`]: tells relational names from legacy filenames
//! - [`indent`]: best-effort XML reformatting before storage
//! - [`hash`]: random-salted document identifiers
//! - [`schema`]: XML Schema validation with a fetched-schema cache
//! - [`formats`]: per-format hooks (pre-save, post-load, listing fields)
//!
//! ## Two Backends, One Name Space
//!
//! Names issued by `save` look like `geodoc<32 hex><extension>` and address
//! the relational table. Any name of a different length is a file in the
//! legacy directory. See [`address`].
//!
//! ## Errors
//!
//! Everything returns [`error::Result`]. [`error::GeodocError::kind`] sorts
//! failures into not found, invalid content, unauthorized, usage, and storage
//! failures; listing and deleting log storage failures instead of returning them.
//!
//! ## Testing Strategy
//!
//! - **Commands**: the bulk of the tests, against `MemBackend`
//! - **Store**: SQLite behavior against in-memory and temporary databases
//! - **Formats / schema**: extraction and validation on small fixtures
//! - **Integration** (`tests/`): the SQLite store end to end, and the binary

pub mod address;
pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod formats;
pub mod hash;
pub mod indent;
pub mod model;
pub mod schema;
pub mod store;
pub mod xml;
