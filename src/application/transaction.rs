//! Scoped transactions over a `UnitOfWork`.

use tracing::warn;

use crate::application::error_ext::StoreResultExt;
use crate::application::ApplicationResult;
use crate::infrastructure::traits::UnitOfWork;

/// Run `f` inside a transaction: commit on success, roll back on any error.
pub fn in_transaction<T>(
    uow: &dyn UnitOfWork,
    f: impl FnOnce() -> ApplicationResult<T>,
) -> ApplicationResult<T> {
    uow.begin().with_store_context("begin transaction")?;
    match f() {
        Ok(value) => {
            uow.commit().with_store_context("commit transaction")?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = uow.rollback() {
                warn!("rollback failed after {}: {}", e, rollback_err);
            }
            Err(e)
        }
    }
}
