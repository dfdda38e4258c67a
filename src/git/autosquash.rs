//! Autosquash planning - pure functions over commit messages
//!
//! A commit whose subject reads `fixup! <prefix>` or `squash! <prefix>` is
//! folded into the earliest earlier commit whose subject starts with
//! `<prefix>`, the way `git rebase --autosquash` does.

use crate::types::PullRequestCommit;
use regex::Regex;
use std::sync::LazyLock;

static AUTOSQUASH_SUBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(fixup|squash)! (.+)$").expect("autosquash pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fold {
    Fixup,
    Squash,
}

/// A unit of work for the rebase engine
///
/// Each step cherry-picks its commits in order; steps with more than one
/// commit are then collapsed into a single commit carrying `message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebaseStep {
    /// Commits applied by this step, in order
    pub commits: Vec<String>,
    /// Message of the collapsed commit, `None` when the step is a single pick
    pub message: Option<String>,
}

fn subject(message: &str) -> &str {
    message.lines().next().unwrap_or_default().trim_end()
}

fn body(message: &str) -> &str {
    message
        .split_once('\n')
        .map_or("", |(_, rest)| rest)
        .trim()
}

fn fold_target(message: &str) -> Option<(Fold, &str)> {
    let captures = AUTOSQUASH_SUBJECT.captures(subject(message))?;
    let fold = if &captures[1] == "fixup" {
        Fold::Fixup
    } else {
        Fold::Squash
    };
    let target = captures.get(2)?.as_str().trim();
    Some((fold, target))
}

/// Index of the earlier commit `commits[index]` folds into, if any
fn earlier_match(commits: &[PullRequestCommit], index: usize) -> Option<(Fold, usize)> {
    let (fold, target) = fold_target(&commits[index].message)?;
    commits[..index]
        .iter()
        .position(|c| subject(&c.message).starts_with(target))
        .map(|i| (fold, i))
}

/// Whether rebasing these commits would fold any of them together
pub fn needs_autosquash(commits: &[PullRequestCommit]) -> bool {
    (0..commits.len()).any(|i| earlier_match(commits, i).is_some())
}

/// Group commits into rebase steps, folding fixups into their targets
pub fn plan_steps(commits: &[PullRequestCommit]) -> Vec<RebaseStep> {
    // (step index, fold kind) for each commit; the first member of a step has no fold
    let mut membership: Vec<usize> = Vec::with_capacity(commits.len());
    let mut groups: Vec<Vec<(usize, Option<Fold>)>> = Vec::new();

    for index in 0..commits.len() {
        match earlier_match(commits, index) {
            Some((fold, target)) => {
                let step = membership[target];
                groups[step].push((index, Some(fold)));
                membership.push(step);
            }
            None => {
                membership.push(groups.len());
                groups.push(vec![(index, None)]);
            }
        }
    }

    groups
        .into_iter()
        .map(|members| {
            let shas = members
                .iter()
                .map(|(i, _)| commits[*i].sha.clone())
                .collect();
            let message = (members.len() > 1).then(|| squashed_message(commits, &members));
            RebaseStep {
                commits: shas,
                message,
            }
        })
        .collect()
}

fn squashed_message(commits: &[PullRequestCommit], members: &[(usize, Option<Fold>)]) -> String {
    let mut message = commits[members[0].0].message.trim_end().to_string();
    for (index, fold) in &members[1..] {
        if *fold != Some(Fold::Squash) {
            continue;
        }
        let extra = body(&commits[*index].message);
        if !extra.is_empty() {
            message.push_str("\n\n");
            message.push_str(extra);
        }
    }
    message
}
