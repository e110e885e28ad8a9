use super::backend::RecordBackend;
use crate::error::{GeodocError, Result};
use crate::model::{DeleteOutcome, DocumentRecord, NewRecord};
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-memory record backend for testing.
///
/// Records are kept in insertion order, which doubles as the tie-break for
/// records created at the same instant.
#[derive(Default)]
pub struct MemBackend {
    records: Mutex<Vec<DocumentRecord>>,
    simulate_error: AtomicBool,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with a storage error, for testing error handling.
    pub fn set_simulate_error(&self, simulate: bool) {
        self.simulate_error.store(simulate, Ordering::SeqCst);
    }

    /// Test helper to insert a fully specified record, timestamps included.
    #[cfg(test)]
    pub fn insert_record(&self, record: DocumentRecord) {
        self.records.lock().push(record);
    }

    /// Test helper to backdate a record's creation time.
    /// Returns true if the record existed.
    #[cfg(test)]
    pub fn set_created_at(&self, hash: &str, created_at: chrono::DateTime<Utc>) -> bool {
        let mut records = self.records.lock();
        match records.iter_mut().find(|r| r.hash == hash) {
            Some(record) => {
                record.created_at = created_at;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self) -> Result<()> {
        if self.simulate_error.load(Ordering::SeqCst) {
            return Err(GeodocError::Storage("Simulated storage error".to_string()));
        }
        Ok(())
    }
}

impl RecordBackend for MemBackend {
    fn insert(&self, record: &NewRecord) -> Result<bool> {
        self.check()?;
        let mut records = self.records.lock();
        if records.iter().any(|r| r.hash == record.hash) {
            return Ok(false);
        }
        records.push(DocumentRecord {
            hash: record.hash.clone(),
            owner: record.owner.clone(),
            standard: record.standard.clone(),
            content: record.content.clone(),
            created_at: Utc::now(),
            last_access: None,
            access_count: 0,
        });
        Ok(true)
    }

    fn fetch_and_touch(&self, hash: &str) -> Result<Option<String>> {
        self.check()?;
        let mut records = self.records.lock();
        Ok(records.iter_mut().find(|r| r.hash == hash).map(|record| {
            let now = Utc::now();
            record.access_count += 1;
            record.last_access = Some(record.last_access.map_or(now, |prev| prev.max(now)));
            record.content.clone()
        }))
    }

    fn get(&self, hash: &str) -> Result<Option<DocumentRecord>> {
        self.check()?;
        Ok(self.records.lock().iter().find(|r| r.hash == hash).cloned())
    }

    fn list(&self, standard: &str, owner: &str) -> Result<Vec<DocumentRecord>> {
        self.check()?;
        let records = self.records.lock();
        let mut matching: Vec<DocumentRecord> = records
            .iter()
            .rev()
            .filter(|r| r.standard == standard && r.owner == owner)
            .cloned()
            .collect();
        // Stable sort keeps reverse insertion order among equal timestamps
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    fn delete(&self, hash: &str, owner: &str) -> Result<DeleteOutcome> {
        self.check()?;
        let mut records = self.records.lock();
        match records.iter().position(|r| r.hash == hash) {
            None => Ok(DeleteOutcome::NotFound),
            Some(index) if records[index].owner != owner => Ok(DeleteOutcome::OwnerMismatch),
            Some(index) => {
                records.remove(index);
                Ok(DeleteOutcome::Deleted)
            }
        }
    }
}
