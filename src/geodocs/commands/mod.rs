//! # Command Layer
//!
//! The business logic of each document operation lives here, one submodule per
//! operation. Commands work on domain types and return `Result`s; they do no
//! terminal I/O and know nothing about argument parsing.
//!
//! Every command runs against a [`FormatContext`]: the collaborators a single
//! format's store is built from. The context is borrowed for the duration of
//! the call and never mutated, so one set of collaborators can serve concurrent
//! callers.
//!
//! ## Testing Strategy
//!
//! Most of the crate's tests live here, against [`MemBackend`] and a temporary
//! legacy directory.
//!
//! ## Command Modules
//!
//! - [`save`]: indent, validate, and persist a new document
//! - [`load`]: resolve a name to either backend and fetch the document
//! - [`list`]: an owner's documents of one format, with extracted fields
//! - [`delete`]: remove a relational document owned by the caller
//!
//! [`MemBackend`]: crate::store::MemBackend

use crate::address::AddressScheme;
use crate::formats::DocumentFormat;
use crate::hash::HashGenerator;
use crate::store::{LegacyDirectory, RecordBackend};

pub mod delete;
pub mod list;
pub mod load;
pub mod save;

pub struct FormatContext<'a, B: RecordBackend + ?Sized> {
    pub backend: &'a B,
    pub legacy: &'a LegacyDirectory,
    pub hasher: &'a dyn HashGenerator,
    pub format: &'a dyn DocumentFormat,
    pub scheme: &'a AddressScheme,
}

impl<'a, B: RecordBackend + ?Sized> FormatContext<'a, B> {
    pub fn standard(&self) -> &str {
        self.format.tag()
    }
}
