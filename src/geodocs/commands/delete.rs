use super::FormatContext;
use crate::error::{GeodocError, Result};
use crate::model::DeleteOutcome;
use crate::store::RecordBackend;
use tracing::{error, info};

/// Delete the relational document `hash` on behalf of `owner`.
///
/// Fails with `NotFound` when no document has that hash and `Unauthorized` when
/// it belongs to someone else, leaving it in place. Storage errors are logged
/// and reported as success. Legacy files cannot be deleted.
pub fn run<B: RecordBackend + ?Sized>(
    ctx: &FormatContext<'_, B>,
    hash: &str,
    owner: &str,
) -> Result<()> {
    match ctx.backend.delete(hash, owner) {
        Ok(DeleteOutcome::Deleted) => {
            info!(hash, owner, "Deleted document");
            Ok(())
        }
        Ok(DeleteOutcome::NotFound) => Err(GeodocError::NotFound(hash.to_string())),
        Ok(DeleteOutcome::OwnerMismatch) => Err(GeodocError::Unauthorized {
            hash: hash.to_string(),
            owner: owner.to_string(),
        }),
        Err(e) => {
            error!(
                error = %e,
                hash,
                owner,
                standard = ctx.standard(),
                "Failed to delete document"
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::commands::test_support::Fixture;
    use crate::commands::{load, save};

    fn saved(fixture: &Fixture, owner: &str) -> (String, String) {
        let ctx = fixture.ctx("wmc");
        let name = save::run(&ctx, "<ViewContext/>", owner).unwrap();
        match ctx.scheme.resolve(&name) {
            Address::Relational { hash } => (name, hash),
            other => panic!("unexpected address {other:?}"),
        }
    }

    #[test]
    fn owner_can_delete() {
        let fixture = Fixture::new();
        let (name, hash) = saved(&fixture, "alice");
        let ctx = fixture.ctx("wmc");

        run(&ctx, &hash, "alice").unwrap();
        assert!(matches!(
            load::run(&ctx, &name),
            Err(GeodocError::NotFound(_))
        ));
    }

    #[test]
    fn wrong_owner_is_unauthorized_and_keeps_record() {
        let fixture = Fixture::new();
        let (name, hash) = saved(&fixture, "alice");
        let ctx = fixture.ctx("wmc");

        let result = run(&ctx, &hash, "mallory");
        assert!(matches!(result, Err(GeodocError::Unauthorized { .. })));
        assert!(load::run(&ctx, &name).is_ok());
    }

    #[test]
    fn unknown_hash_is_not_found() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx("wmc");
        assert!(matches!(
            run(&ctx, "ffffffffffffffffffffffffffffffff", "alice"),
            Err(GeodocError::NotFound(_))
        ));
    }

    #[test]
    fn deleting_twice_is_not_found() {
        let fixture = Fixture::new();
        let (_, hash) = saved(&fixture, "alice");
        let ctx = fixture.ctx("wmc");

        run(&ctx, &hash, "alice").unwrap();
        assert!(matches!(
            run(&ctx, &hash, "alice"),
            Err(GeodocError::NotFound(_))
        ));
    }

    #[test]
    fn storage_failure_is_swallowed() {
        let fixture = Fixture::new();
        let (_, hash) = saved(&fixture, "alice");
        fixture.backend.set_simulate_error(true);

        assert!(run(&fixture.ctx("wmc"), &hash, "alice").is_ok());
        fixture.backend.set_simulate_error(false);
        assert_eq!(fixture.backend.len(), 1);
    }
}
