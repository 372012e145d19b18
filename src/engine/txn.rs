//! Optimistic Transactions
//!
//! Every mutating operation is a read-compute-commit attempt. When the
//! commit loses a race the attempt runs again from fresh reads, up to the
//! configured bound.

use std::future::Future;
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::store::{ChangeSet, GameStore, StoreError};

/// What one attempt wants to commit, and what to return if it lands.
#[derive(Debug)]
pub(crate) struct Plan<T> {
    pub changes: ChangeSet,
    pub output: T,
}

impl<T> Plan<T> {
    pub fn new(changes: ChangeSet, output: T) -> Self {
        Self { changes, output }
    }
}

/// Run `attempt` until its change set commits.
///
/// Errors from the attempt itself end the loop immediately; only a
/// version conflict at commit time triggers another attempt.
pub(crate) async fn run<S, T, F, Fut>(
    store: &S,
    max_attempts: u32,
    operation: &'static str,
    mut attempt: F,
) -> Result<T, EngineError>
where
    S: GameStore + ?Sized,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Plan<T>, EngineError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempts = 0;

    loop {
        attempts += 1;
        let Plan { changes, output } = attempt().await?;

        match store.commit(changes).await {
            Ok(()) => return Ok(output),
            Err(StoreError::Conflict) if attempts < max_attempts => {
                debug!(operation, attempts, "Commit conflict, retrying");
                tokio::task::yield_now().await;
            }
            Err(StoreError::Conflict) => {
                warn!(operation, attempts, "Giving up after repeated commit conflicts");
                return Err(EngineError::ConcurrencyConflict { attempts });
            }
            Err(err) => return Err(err.into()),
        }
    }
}
