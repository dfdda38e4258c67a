//! Action execution - effectful operations
//!
//! The two things the engine ever does to a pull request: merge it, or
//! rebase it under the label lock.

use crate::context::RunContext;
use crate::engine::plan::rebase_failed_comment;
use crate::error::{Error, Result};
use crate::git::rebase_pull_request;
use crate::lock::{LockOutcome, with_label_lock};
use crate::platform::PlatformService;
use crate::types::{Action, PullRequest};
use tracing::{info, warn};

/// Merge a pull request without a merge commit, then delete its head branch
pub async fn merge(platform: &dyn PlatformService, pr: &PullRequest) -> Result<Action> {
    info!(number = pr.number, head = %pr.head_ref, "merging pull request");

    let result = platform.merge_pull_request(pr.number).await?;
    if !result.merged {
        return Err(Error::GitHubApi(format!(
            "merge of #{} refused: {}",
            pr.number,
            result.message.as_deref().unwrap_or("no reason given")
        )));
    }

    platform.delete_ref(&pr.head_ref).await?;
    info!(
        number = pr.number,
        sha = result.sha.as_deref().unwrap_or("(no sha)"),
        "merged pull request"
    );
    Ok(Action::Merge {
        pull_request: pr.number,
    })
}

/// Rebase a pull request, holding the label lock when `lock_label` is given
///
/// Returns [`Action::Abort`] if another run holds the lock. A failed rebase
/// is explained in a comment on the pull request and then returned as
/// [`Error::RebaseFailed`]; the lock is released either way.
pub async fn rebase(
    platform: &dyn PlatformService,
    ctx: &RunContext,
    pr: &PullRequest,
    lock_label: Option<&str>,
) -> Result<Action> {
    let attempt = || rebase_or_report(platform, ctx, pr);

    if let Some(label) = lock_label {
        match with_label_lock(platform, ctx, pr.number, label, attempt).await? {
            LockOutcome::Acquired(()) => {}
            LockOutcome::Contended => {
                return Ok(Action::Abort {
                    pull_request: pr.number,
                });
            }
        }
    } else {
        attempt().await?;
    }

    Ok(Action::Rebase {
        pull_request: pr.number,
    })
}

async fn rebase_or_report(
    platform: &dyn PlatformService,
    ctx: &RunContext,
    pr: &PullRequest,
) -> Result<()> {
    let error = match rebase_pull_request(platform, ctx, pr.number).await {
        Ok(_) => return Ok(()),
        Err(e) => e,
    };

    warn!(number = pr.number, error = %error, "rebase failed, reporting on pull request");
    if let Err(comment_error) = platform
        .create_comment(pr.number, &rebase_failed_comment(pr, &error))
        .await
    {
        warn!(number = pr.number, error = %comment_error, "failed to post rebase failure comment");
    }

    Err(Error::RebaseFailed {
        number: pr.number,
        source: Box::new(error),
    })
}
