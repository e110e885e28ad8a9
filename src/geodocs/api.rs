//! # API Facade
//!
//! A thin facade over the command layer and the single entry point for
//! callers (the CLI, or a web front end mapping [`GeodocError::status_code`]
//! to responses).
//!
//! - [`DocumentStore`] owns the collaborators shared by every format: the
//!   relational backend, the legacy directory, the identifier generator and
//!   the format registry. It is immutable after construction.
//! - [`FormatStore`] is the store for one format, obtained with
//!   [`DocumentStore::format`]. It dispatches save, load, list and delete to
//!   `commands/*.rs`.
//! - [`DocumentSession`] adds the accessor-style API on top of a
//!   `FormatStore`: `load` once, then read `content()`, `name()` and
//!   `mime_type()`.
//!
//! `DocumentStore<B: RecordBackend>` is generic over the backend: production
//! uses [`SqliteBackend`], tests use [`MemBackend`](crate::store::MemBackend).

use crate::address::AddressScheme;
use crate::commands::{self, FormatContext};
use crate::config::GeodocsConfig;
use crate::error::{GeodocError, Result};
use crate::formats::{DocumentFormat, FormatRegistry};
use crate::hash::{HashGenerator, SaltedMd5};
use crate::model::{ListingEntry, LoadedDocument};
use crate::schema::SchemaValidator;
use crate::store::{LegacyDirectory, RecordBackend, SqliteBackend};
use std::sync::Arc;

pub struct DocumentStore<B: RecordBackend> {
    backend: B,
    legacy: LegacyDirectory,
    formats: FormatRegistry,
    hasher: Box<dyn HashGenerator>,
}

impl DocumentStore<SqliteBackend> {
    /// Open the SQLite store and legacy directory named by `config`, with every
    /// built-in format.
    pub fn open(config: &GeodocsConfig) -> Result<Self> {
        let backend = SqliteBackend::open(&config.database)?;
        let legacy = LegacyDirectory::create(&config.legacy_dir)?;
        let validator = Arc::new(SchemaValidator::new(config.validator_options())?);
        let formats = FormatRegistry::builtin(validator, &config.schema_locations());
        Ok(Self::new(backend, legacy, formats))
    }
}

impl<B: RecordBackend> DocumentStore<B> {
    pub fn new(backend: B, legacy: LegacyDirectory, formats: FormatRegistry) -> Self {
        Self {
            backend,
            legacy,
            formats,
            hasher: Box::new(SaltedMd5),
        }
    }

    /// Replace the identifier generator.
    pub fn with_hasher(mut self, hasher: impl HashGenerator + 'static) -> Self {
        self.hasher = Box::new(hasher);
        self
    }

    /// The store for the format tagged `tag` (a leading `.` is accepted).
    pub fn format(&self, tag: &str) -> Result<FormatStore<'_, B>> {
        let format = self.formats.get(tag)?;
        Ok(FormatStore {
            store: self,
            format,
            scheme: AddressScheme::for_extension(format.extension()),
        })
    }

    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn legacy(&self) -> &LegacyDirectory {
        &self.legacy
    }
}

pub struct FormatStore<'a, B: RecordBackend> {
    store: &'a DocumentStore<B>,
    format: &'a dyn DocumentFormat,
    scheme: AddressScheme,
}

impl<'a, B: RecordBackend> FormatStore<'a, B> {
    fn ctx(&self) -> FormatContext<'_, B> {
        FormatContext {
            backend: &self.store.backend,
            legacy: &self.store.legacy,
            hasher: self.store.hasher.as_ref(),
            format: self.format,
            scheme: &self.scheme,
        }
    }

    pub fn save(&self, content: &str, owner: &str) -> Result<String> {
        commands::save::run(&self.ctx(), content, owner)
    }

    pub fn load(&self, name: &str) -> Result<LoadedDocument> {
        commands::load::run(&self.ctx(), name)
    }

    pub fn list(&self, owner: &str) -> Vec<ListingEntry> {
        commands::list::run(&self.ctx(), owner)
    }

    pub fn delete(&self, hash: &str, owner: &str) -> Result<()> {
        commands::delete::run(&self.ctx(), hash, owner)
    }

    pub fn tag(&self) -> &str {
        self.format.tag()
    }

    pub fn extension(&self) -> &str {
        self.format.extension()
    }

    pub fn mime_type(&self) -> &str {
        self.format.mime_type()
    }

    pub fn scheme(&self) -> &AddressScheme {
        &self.scheme
    }

    pub fn session(self) -> DocumentSession<'a, B> {
        DocumentSession::new(self)
    }
}

/// Accessor-style wrapper around a [`FormatStore`].
pub struct DocumentSession<'a, B: RecordBackend> {
    store: FormatStore<'a, B>,
    loaded: Option<LoadedDocument>,
}

impl<'a, B: RecordBackend> DocumentSession<'a, B> {
    pub fn new(store: FormatStore<'a, B>) -> Self {
        Self {
            store,
            loaded: None,
        }
    }

    /// Load `name`, replacing any previously loaded document. A failed load
    /// leaves the previous document in place.
    pub fn load(&mut self, name: &str) -> Result<&LoadedDocument> {
        let doc = self.store.load(name)?;
        Ok(self.loaded.insert(doc))
    }

    pub fn content(&self) -> Result<&str> {
        self.document().map(LoadedDocument::content)
    }

    pub fn name(&self) -> Result<&str> {
        self.document().map(LoadedDocument::name)
    }

    pub fn mime_type(&self) -> Result<&str> {
        self.document().map(LoadedDocument::mime_type)
    }

    pub fn document(&self) -> Result<&LoadedDocument> {
        self.loaded
            .as_ref()
            .ok_or_else(|| GeodocError::Usage("no document has been loaded".to_string()))
    }

    pub fn store(&self) -> &FormatStore<'a, B> {
        &self.store
    }
}
