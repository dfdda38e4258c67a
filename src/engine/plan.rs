//! Decision helpers - pure functions, no I/O
//!
//! Everything here takes already-fetched data so the per-pull-request policy,
//! slash-command matching and comment wording are unit tested without a host.

use crate::error::Error;
use crate::types::{MergeableState, Permission, PullRequest};

/// What the per-pull-request policy wants done
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    /// Rebase the head branch onto the base
    Rebase,
    /// Merge the pull request
    Merge,
    /// Leave it alone
    Nothing,
}

/// Per-pull-request policy
///
/// A rebase is due when commits need autosquashing or the base moved on;
/// a clean pull request is merged. `dirty`, `blocked`, `unstable` and the
/// rest are left for humans.
pub const fn decide(state: MergeableState, needs_rebase: bool) -> PolicyDecision {
    if needs_rebase {
        return PolicyDecision::Rebase;
    }
    match state {
        MergeableState::Behind => PolicyDecision::Rebase,
        MergeableState::Clean => PolicyDecision::Merge,
        MergeableState::Unknown
        | MergeableState::Blocked
        | MergeableState::Dirty
        | MergeableState::Unstable
        | MergeableState::Draft
        | MergeableState::HasHooks => PolicyDecision::Nothing,
    }
}

/// Whether a comment asks for a one-time rebase
///
/// Either `/rebase` or `/<label>`, alone on the comment (surrounding
/// whitespace ignored).
pub fn is_rebase_command(body: &str, label: &str) -> bool {
    let body = body.trim();
    body == "/rebase" || body.strip_prefix('/').is_some_and(|rest| rest == label)
}

/// Default rule for who may request a one-time rebase
pub const fn default_authorization(permission: Permission, allow_maintainers: bool) -> bool {
    match permission {
        Permission::Admin | Permission::Write => true,
        Permission::Maintain => allow_maintainers,
        Permission::Triage | Permission::Read | Permission::None => false,
    }
}

/// Whether a pull request looks like it's waiting on a merge
pub fn is_mergeable(pr: &PullRequest, label: &str) -> bool {
    pr.labeled_and_open_and_rebaseable(label) && pr.mergeable_state == MergeableState::Clean
}

/// Whether a pull request is waiting on a rebase
pub fn is_behind(pr: &PullRequest, label: &str) -> bool {
    pr.labeled_and_open_and_rebaseable(label) && pr.mergeable_state == MergeableState::Behind
}

/// Comment posted when a rebase attempt fails
pub fn rebase_failed_comment(pr: &PullRequest, error: &Error) -> String {
    format!(
        "The rebase failed:\n\n```\n{error}\n```\n\n\
         To rebase manually, run these commands in your terminal:\n\n\
         ```bash\n\
         # Fetch latest updates from GitHub.\n\
         git fetch\n\
         # Check out the PR's branch.\n\
         git checkout {head}\n\
         # Start an interactive rebase.\n\
         git rebase --interactive --autosquash origin/{base}\n\
         # Check that everything looks good before pushing.\n\
         git push --force-with-lease\n\
         ```",
        head = pr.head_ref,
        base = pr.base_ref,
    )
}

/// Comment posted when someone without permission asks for a rebase
pub fn denied_comment(author: &str, permission: Permission) -> String {
    format!(
        "@{author} one-time rebases require write access to this repository \
         (your permission level is `{permission}`)."
    )
}
