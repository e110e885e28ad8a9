use super::FormatContext;
use crate::address::Address;
use crate::error::{GeodocError, Result};
use crate::model::LoadedDocument;
use crate::store::RecordBackend;
use tracing::debug;

/// Fetch the document called `name`, from whichever backend its name addresses.
///
/// Relational loads record the access in the same backend operation that reads
/// the content. Relational documents are found by hash alone, whatever format
/// they were saved as.
pub fn run<B: RecordBackend + ?Sized>(
    ctx: &FormatContext<'_, B>,
    name: &str,
) -> Result<LoadedDocument> {
    let address = ctx.scheme.resolve(name);
    debug!(name, address = ?address, "Loading document");

    let content = match &address {
        Address::Relational { hash } => ctx
            .backend
            .fetch_and_touch(hash)?
            .ok_or_else(|| GeodocError::NotFound(name.to_string()))?,
        Address::Legacy { filename } => ctx.legacy.read(filename)?,
    };

    let mut doc = LoadedDocument {
        name: name.to_string(),
        content,
        standard: ctx.standard().to_string(),
        mime_type: ctx.format.mime_type().to_string(),
    };
    ctx.format.post_load(&mut doc)?;
    Ok(doc)
}
