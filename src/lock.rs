//! A per-pull-request mutex made of a label
//!
//! Removing the label acquires the lock: GitHub refuses to remove a label
//! that is not there, so of two runs only the first removal succeeds and the
//! second sees the lock as taken. Adding the label back releases it.
//!
//! Label removal is not a true compare-and-swap. Two removals landing within
//! roughly 10ms of each other can both succeed, letting two runs into the
//! guarded action. The rebase engine tolerates this: the loser fails with
//! `HeadChanged` or `ReferenceChanged` instead of clobbering the winner.

use crate::context::RunContext;
use crate::error::Result;
use crate::platform::PlatformService;
use std::future::Future;
use tracing::{debug, info, warn};

/// Whether the guarded action ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockOutcome<T> {
    /// The lock was acquired and the action returned this value
    Acquired(T),
    /// Another run holds the lock; the action did not run
    Contended,
}

/// Run `action` while holding the label lock on pull request `number`
///
/// The label is re-added once `action` finishes, whether it succeeded or not.
/// If both the action and the release fail, the action's error is returned.
pub async fn with_label_lock<T, F, Fut>(
    platform: &dyn PlatformService,
    ctx: &RunContext,
    number: u64,
    label: &str,
    action: F,
) -> Result<LockOutcome<T>>
where
    F: FnOnce() -> Fut + Send,
    Fut: Future<Output = Result<T>> + Send,
{
    if !platform.remove_label(number, label).await? {
        info!(number, label, "label lock held by another run");
        return Ok(LockOutcome::Contended);
    }
    debug!(number, label, "acquired label lock");
    ctx.hooks().after_lock_acquired(number).await;

    let result = action().await;

    let released = platform.add_labels(number, &[label.to_string()]).await;
    debug!(number, label, released = released.is_ok(), "released label lock");

    match (result, released) {
        (Ok(value), Ok(())) => Ok(LockOutcome::Acquired(value)),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), released) => {
            if let Err(release_error) = released {
                warn!(number, label, error = %release_error, "failed to release label lock");
            }
            Err(e)
        }
    }
}
