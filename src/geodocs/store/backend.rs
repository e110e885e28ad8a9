use crate::error::Result;
use crate::model::{DeleteOutcome, DocumentRecord, NewRecord};

/// Abstract interface for the relational document table.
///
/// Every method is one atomic backend operation: implementations acquire their
/// connection, run a single transaction and release it before returning, on
/// every exit path.
pub trait RecordBackend: Send + Sync {
    /// Insert a new record stamped with the current time and a zero access count.
    /// Returns `Ok(false)` without touching the table if the hash is already taken.
    fn insert(&self, record: &NewRecord) -> Result<bool>;

    /// Fetch the content for `hash`, incrementing its access count and setting
    /// its last access time in the same transaction.
    /// Returns `Ok(None)` if no record has that hash.
    fn fetch_and_touch(&self, hash: &str) -> Result<Option<String>>;

    /// Read a record without recording an access.
    fn get(&self, hash: &str) -> Result<Option<DocumentRecord>>;

    /// Records of `standard` owned by `owner`, newest first.
    /// Records created at the same instant come back in reverse insertion order.
    fn list(&self, standard: &str, owner: &str) -> Result<Vec<DocumentRecord>>;

    /// Delete the record iff both hash and owner match.
    fn delete(&self, hash: &str, owner: &str) -> Result<DeleteOutcome>;
}
