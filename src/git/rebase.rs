//! Rebasing a pull request's head branch onto its base

use crate::context::RunContext;
use crate::error::{Error, Result};
use crate::git::autosquash::plan_steps;
use crate::git::cherry_pick::{TargetUpdate, apply_steps};
use crate::platform::PlatformService;
use tracing::{debug, info};

/// Rewrite a pull request's head branch on top of the current base tip
///
/// The base tip is read straight from the branch, never from the pull request
/// payload, which can lag behind. `fixup!`/`squash!` commits are folded into
/// their targets on the way. The head tip is recorded before the commit list
/// is fetched, and the list must end at it. The head branch is force-updated
/// only if it still points at that tip; otherwise [`Error::HeadChanged`] is
/// returned and nothing moves.
///
/// Returns the new head SHA.
pub async fn rebase_pull_request(
    platform: &dyn PlatformService,
    ctx: &RunContext,
    number: u64,
) -> Result<String> {
    let pr = platform.get_pull_request(number).await?;
    let head_tip = platform.get_ref(&pr.head_ref).await?;
    let commits = platform.list_pull_request_commits(number).await?;
    if commits.last().map(|c| c.sha.as_str()) != Some(head_tip.as_str()) {
        debug!(number, head = %pr.head_ref, expected = %head_tip, "commit list does not end at head");
        return Err(Error::HeadChanged {
            reference: pr.head_ref,
        });
    }
    let base_tip = platform.get_ref(&pr.base_ref).await?;

    let steps = plan_steps(&commits);
    info!(
        number,
        base = %pr.base_ref,
        head = %pr.head_ref,
        commits = commits.len(),
        steps = steps.len(),
        "rebasing pull request"
    );

    let new_head = apply_steps(
        platform,
        ctx,
        &steps,
        &pr.head_ref,
        &base_tip,
        TargetUpdate::ForceIfUnchanged {
            expected: &head_tip,
        },
    )
    .await?;

    info!(number, old = %head_tip, new = %new_head, "rebased pull request");
    Ok(new_head)
}
