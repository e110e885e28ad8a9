use super::FormatContext;
use crate::error::{GeodocError, Result};
use crate::indent::indent_or_raw;
use crate::model::NewRecord;
use crate::store::RecordBackend;
use tracing::{debug, info, warn};

/// Fresh identifiers tried before giving up on a save.
pub const MAX_ATTEMPTS: usize = 3;

/// Store `content` for `owner` and return its external name.
///
/// The content is indented first when it is well-formed XML; otherwise it is
/// stored as given. The format's pre-save hook sees the content that will be
/// stored and may reject it.
pub fn run<B: RecordBackend + ?Sized>(
    ctx: &FormatContext<'_, B>,
    content: &str,
    owner: &str,
) -> Result<String> {
    let content = indent_or_raw(content);
    ctx.format.pre_save(&content)?;

    for attempt in 1..=MAX_ATTEMPTS {
        let hash = ctx.hasher.generate(&content);
        let record = NewRecord {
            hash: hash.clone(),
            owner: owner.to_string(),
            standard: ctx.standard().to_string(),
            content: content.clone(),
        };
        if ctx.backend.insert(&record)? {
            info!(hash = %hash, owner, standard = ctx.standard(), "Saved document");
            return Ok(ctx.scheme.external_name(&hash));
        }
        warn!(hash = %hash, attempt, "Identifier already taken, drawing a new one");
    }

    debug!(attempts = MAX_ATTEMPTS, "Giving up on save");
    Err(GeodocError::Storage(format!(
        "no free identifier after {} attempts",
        MAX_ATTEMPTS
    )))
}
