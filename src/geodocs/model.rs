use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Owner recorded for documents saved without an authenticated user.
pub const ANONYMOUS_USER: &str = "anonymousUser";

/// Format-specific listing fields, keyed by field name.
pub type FieldMap = BTreeMap<String, serde_json::Value>;

/// A row of the relational `geodocs` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub hash: String,
    pub owner: String,
    pub standard: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub last_access: Option<DateTime<Utc>>,
    pub access_count: u64,
}

/// A record about to be inserted. Timestamps and counters are set by the backend.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub hash: String,
    pub owner: String,
    pub standard: String,
    pub content: String,
}

/// The outcome of a successful load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedDocument {
    /// Name handed back to the caller; post-load hooks may replace it.
    pub name: String,
    pub content: String,
    pub standard: String,
    pub mime_type: String,
}

impl LoadedDocument {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

/// One entry of a document listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingEntry {
    pub hash: String,
    pub created_at: DateTime<Utc>,
    pub last_access: Option<DateTime<Utc>>,
    pub access_count: u64,
    #[serde(flatten)]
    pub fields: FieldMap,
}

impl ListingEntry {
    pub fn from_record(record: &DocumentRecord, fields: FieldMap) -> Self {
        Self {
            hash: record.hash.clone(),
            created_at: record.created_at,
            last_access: record.last_access,
            access_count: record.access_count,
            fields,
        }
    }
}

/// Result of a delete request against the relational backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    OwnerMismatch,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn listing_entry_flattens_fields() {
        let record = DocumentRecord {
            hash: "0123456789abcdef0123456789abcdef".into(),
            owner: "alice".into(),
            standard: "wmc".into(),
            content: "<ViewContext/>".into(),
            created_at: Utc::now(),
            last_access: None,
            access_count: 0,
        };
        let mut fields = FieldMap::new();
        fields.insert("title".into(), json!("Parcels"));

        let entry = ListingEntry::from_record(&record, fields);
        let value = serde_json::to_value(&entry).unwrap();

        assert_eq!(value["hash"], json!(record.hash));
        assert_eq!(value["title"], json!("Parcels"));
        assert_eq!(value["access_count"], json!(0));
        assert!(value["last_access"].is_null());
    }
}
