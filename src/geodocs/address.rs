//! # Document Addressing
//!
//! Every document handed out by `save` is named `<prefix><hash><extension>`,
//! e.g. `geodoc1694e3cc580768d5125816b574915e97.wmc`. Documents written before
//! the relational backend existed are plain files with arbitrary names.
//!
//! The two are told apart by length alone: a name exactly
//! `len(prefix) + 32 + len(extension)` long addresses the relational backend and
//! its hash is the 32 characters after the prefix. Anything else is a legacy
//! filename. Once resolved, callers work with the explicit [`Address`] tag.

/// Prefix of every externally visible document name.
pub const DOC_PREFIX: &str = "geodoc";

/// Length of a document hash, in hex characters.
pub const HASH_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    /// Row of the relational store, keyed by hash.
    Relational { hash: String },
    /// File inside the legacy directory.
    Legacy { filename: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressScheme {
    prefix: String,
    extension: String,
}

impl AddressScheme {
    pub fn new(prefix: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            extension: extension.into(),
        }
    }

    pub fn for_extension(extension: &str) -> Self {
        Self::new(DOC_PREFIX, extension)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Length of every name issued by [`AddressScheme::external_name`].
    pub fn relational_len(&self) -> usize {
        self.prefix.len() + HASH_LEN + self.extension.len()
    }

    pub fn resolve(&self, name: &str) -> Address {
        if name.len() == self.relational_len() {
            let start = self.prefix.len();
            // Byte offsets that split a multi-byte character cannot belong to an issued name.
            if let Some(hash) = name.get(start..start + HASH_LEN) {
                return Address::Relational {
                    hash: hash.to_string(),
                };
            }
        }
        Address::Legacy {
            filename: name.to_string(),
        }
    }

    pub fn external_name(&self, hash: &str) -> String {
        format!("{}{}{}", self.prefix, hash, self.extension)
    }
}
