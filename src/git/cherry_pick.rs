//! Cherry-picking through the git data API
//!
//! There is no cherry-pick endpoint, so each pick is built from primitives on
//! a temporary branch:
//!
//! 1. point the temporary branch at a *sibling* commit: the current tree with
//!    the picked commit's parent as its only parent, which makes that parent
//!    the merge base;
//! 2. merge the picked commit into the temporary branch, yielding a tree with
//!    the commit's diff applied;
//! 3. commit that tree with the previous tip as single parent, dropping the
//!    merge's second parent.
//!
//! The target branch only moves once every commit applied, so it either gets
//! all of them or none.

use crate::context::RunContext;
use crate::error::{Error, Result};
use crate::git::autosquash::RebaseStep;
use crate::platform::PlatformService;
use crate::types::{MergeAttempt, NewCommit, Signature};
use tracing::{debug, warn};
use uuid::Uuid;

/// Request for [`cherry_pick`]
#[derive(Debug, Clone, Copy)]
pub struct CherryPick<'a> {
    /// Commits to apply, in order
    pub commits: &'a [String],
    /// Branch to fast-forward to the result
    pub target: &'a str,
    /// Commit the picks start from
    pub tip: &'a str,
}

/// How the target branch is moved once all steps applied
#[derive(Debug, Clone, Copy)]
pub(crate) enum TargetUpdate<'a> {
    /// Fast-forward only, rejected by the host if the target moved
    FastForward,
    /// Forced, after checking the target still points at `expected`
    ForceIfUnchanged {
        /// SHA the target had when the operation started
        expected: &'a str,
    },
}

/// Apply `commits` on top of `tip` and fast-forward `target` to the result
///
/// Returns the new tip. An empty commit list returns `tip` without touching
/// any reference.
pub async fn cherry_pick(
    platform: &dyn PlatformService,
    ctx: &RunContext,
    request: CherryPick<'_>,
) -> Result<String> {
    if request.commits.is_empty() {
        return Ok(request.tip.to_string());
    }

    let steps: Vec<RebaseStep> = request
        .commits
        .iter()
        .map(|sha| RebaseStep {
            commits: vec![sha.clone()],
            message: None,
        })
        .collect();

    apply_steps(
        platform,
        ctx,
        &steps,
        request.target,
        request.tip,
        TargetUpdate::FastForward,
    )
    .await
}

fn temporary_ref_name() -> String {
    format!("autorebase-tmp-{}", Uuid::new_v4())
}

/// Run `steps` on a temporary branch started at `tip`, then move `target`
///
/// The temporary branch is deleted whatever happens.
pub(crate) async fn apply_steps(
    platform: &dyn PlatformService,
    ctx: &RunContext,
    steps: &[RebaseStep],
    target: &str,
    tip: &str,
    update: TargetUpdate<'_>,
) -> Result<String> {
    let temp = temporary_ref_name();
    platform.create_ref(&temp, tip).await?;
    debug!(temp = %temp, reference = target, tip, steps = steps.len(), "created temporary ref");

    let result = async {
        let new_tip = pick_steps(platform, &temp, tip, steps).await?;
        ctx.hooks().before_ref_update(target).await;
        move_target(platform, target, &new_tip, update).await?;
        Ok::<_, Error>(new_tip)
    }
    .await;

    if let Err(e) = platform.delete_ref(&temp).await {
        warn!(temp = %temp, error = %e, "failed to delete temporary ref");
    }

    result
}

async fn move_target(
    platform: &dyn PlatformService,
    target: &str,
    new_tip: &str,
    update: TargetUpdate<'_>,
) -> Result<()> {
    match update {
        TargetUpdate::FastForward => platform.update_ref(target, new_tip, false).await,
        TargetUpdate::ForceIfUnchanged { expected } => {
            // Not atomic: a push landing between this read and the update is lost
            let current = platform.get_ref(target).await?;
            if current != expected {
                debug!(reference = target, expected, current = %current, "head moved during rebase");
                return Err(Error::HeadChanged {
                    reference: target.to_string(),
                });
            }
            platform.update_ref(target, new_tip, true).await
        }
    }
}

async fn pick_steps(
    platform: &dyn PlatformService,
    temp: &str,
    tip: &str,
    steps: &[RebaseStep],
) -> Result<String> {
    let mut head = tip.to_string();
    let mut tree = platform.get_commit(tip).await?.tree;

    for step in steps {
        let step_base = head.clone();
        let mut first_author: Option<Option<Signature>> = None;

        for sha in &step.commits {
            let commit = platform.get_commit(sha).await?;
            let [parent] = commit.parents.as_slice() else {
                return Err(Error::UnsupportedCommit { sha: sha.clone() });
            };

            let sibling = platform
                .create_commit(&NewCommit {
                    message: format!("sibling of {sha}"),
                    tree: tree.clone(),
                    parents: vec![parent.clone()],
                    author: None,
                })
                .await?;
            platform.update_ref(temp, &sibling, true).await?;

            let merged_tree = match platform
                .merge(temp, sha, &format!("Merge {sha} into {sibling}"))
                .await?
            {
                MergeAttempt::Merged { tree, .. } => tree,
                MergeAttempt::AlreadyMerged => tree.clone(),
                MergeAttempt::Conflict => {
                    return Err(Error::CherryPickConflict { sha: sha.clone() });
                }
            };

            head = platform
                .create_commit(&NewCommit {
                    message: commit.message.clone(),
                    tree: merged_tree.clone(),
                    parents: vec![head],
                    author: commit.author.clone(),
                })
                .await?;
            platform.update_ref(temp, &head, true).await?;
            tree = merged_tree;
            debug!(picked = %sha, new = %head, "cherry-picked commit");

            first_author.get_or_insert(commit.author);
        }

        if let Some(message) = &step.message {
            head = platform
                .create_commit(&NewCommit {
                    message: message.clone(),
                    tree: tree.clone(),
                    parents: vec![step_base],
                    author: first_author.flatten(),
                })
                .await?;
            platform.update_ref(temp, &head, true).await?;
            debug!(squashed = step.commits.len(), new = %head, "collapsed autosquash step");
        }
    }

    Ok(head)
}
