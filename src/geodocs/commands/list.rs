use super::FormatContext;
use crate::model::ListingEntry;
use crate::store::RecordBackend;
use tracing::{error, warn};

/// Documents of the context's format owned by `owner`, newest first.
///
/// Never fails: a storage error yields an empty listing, and a record whose
/// fields cannot be extracted is left out. Both are logged.
pub fn run<B: RecordBackend + ?Sized>(
    ctx: &FormatContext<'_, B>,
    owner: &str,
) -> Vec<ListingEntry> {
    let records = match ctx.backend.list(ctx.standard(), owner) {
        Ok(records) => records,
        Err(e) => {
            error!(error = %e, owner, standard = ctx.standard(), "Failed to list documents");
            return Vec::new();
        }
    };

    records
        .iter()
        .filter_map(|record| match ctx.format.extract_fields(&mut record.content.as_bytes()) {
            Ok(fields) => Some(ListingEntry::from_record(record, fields)),
            Err(e) => {
                warn!(hash = %record.hash, error = %e, "Skipping document in listing");
                None
            }
        })
        .collect()
}
