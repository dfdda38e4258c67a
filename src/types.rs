//! Core types for autorebase

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// GitHub's asynchronous verdict on whether a pull request can be merged
///
/// `Unknown` is transient: it is never acted upon and must be resolved first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeableState {
    /// The base branch moved since the head was last rebased
    Behind,
    /// Mergeable by Git but denied by branch protection
    Blocked,
    /// Mergeable right now
    Clean,
    /// Real conflicts with the base branch
    Dirty,
    /// Mergeable but some checks are pending or failing
    Unstable,
    /// Draft pull requests cannot be merged
    Draft,
    /// Mergeable, with pre-receive hooks configured on the repository
    HasHooks,
    /// Still being computed (or a value this crate does not know about)
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for MergeableState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Behind => write!(f, "behind"),
            Self::Blocked => write!(f, "blocked"),
            Self::Clean => write!(f, "clean"),
            Self::Dirty => write!(f, "dirty"),
            Self::Unstable => write!(f, "unstable"),
            Self::Draft => write!(f, "draft"),
            Self::HasHooks => write!(f, "has_hooks"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// A pull request as seen by a fresh fetch from the host
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// PR title
    pub title: String,
    /// Web URL for the PR
    pub html_url: String,
    /// Base branch name
    pub base_ref: String,
    /// Head branch name
    pub head_ref: String,
    /// Commit the head branch pointed to when this snapshot was taken
    pub head_sha: String,
    /// Host-computed mergeable state
    pub mergeable_state: MergeableState,
    /// Whether the PR has been merged
    pub merged: bool,
    /// When the PR was closed, `None` while open
    pub closed_at: Option<DateTime<Utc>>,
    /// When the PR was opened
    pub created_at: DateTime<Utc>,
    /// Names of the labels on the PR
    pub labels: BTreeSet<String>,
    /// Whether the head can be rebased onto the base without conflicts
    pub rebaseable: bool,
}

impl PullRequest {
    /// Whether the PR is still open
    pub const fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }

    /// Whether the PR carries `label`
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    /// The gate every automatic action goes through
    pub fn labeled_and_open_and_rebaseable(&self, label: &str) -> bool {
        self.has_label(label) && self.is_open() && self.rebaseable
    }
}

/// A commit belonging to a pull request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PullRequestCommit {
    /// Commit SHA
    pub sha: String,
    /// Full commit message
    pub message: String,
}

/// Author or committer identity on a git commit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Signature {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Timestamp
    pub date: DateTime<Utc>,
}

/// A git commit object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitCommit {
    /// Commit SHA
    pub sha: String,
    /// Tree SHA
    pub tree: String,
    /// Parent SHAs, first parent first
    pub parents: Vec<String>,
    /// Full commit message
    pub message: String,
    /// Original author, if the host reported one
    pub author: Option<Signature>,
}

/// Arguments for creating a commit object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCommit {
    /// Commit message
    pub message: String,
    /// Tree SHA
    pub tree: String,
    /// Parent SHAs
    pub parents: Vec<String>,
    /// Author to preserve; the host fills in the token's identity when `None`
    pub author: Option<Signature>,
}

/// Tree entries keyed by path, each pointing at a blob SHA
///
/// A `None` value deletes the path from the base tree.
pub type TreeEntries = BTreeMap<String, Option<String>>;

/// Outcome of asking the host to merge a commit into a branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeAttempt {
    /// A merge commit was created on the branch
    Merged {
        /// SHA of the merge commit
        sha: String,
        /// Tree of the merge commit
        tree: String,
    },
    /// The commit is already contained in the branch
    AlreadyMerged,
    /// The three-way merge had conflicts; the branch is untouched
    Conflict,
}

/// One page of search results
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    /// PR numbers, in the order the host returned them
    pub numbers: Vec<u64>,
    /// Whether a further page exists
    pub has_next_page: bool,
}

/// Collaborator permission level on the repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Full administrative access
    Admin,
    /// Maintain access
    Maintain,
    /// Push access
    Write,
    /// Triage access
    Triage,
    /// Read access
    Read,
    /// No access
    #[serde(other)]
    None,
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Maintain => write!(f, "maintain"),
            Self::Write => write!(f, "write"),
            Self::Triage => write!(f, "triage"),
            Self::Read => write!(f, "read"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Repository coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Custom host (None for github.com)
    pub host: Option<String>,
}

/// Result of a merge operation
#[derive(Debug, Clone)]
pub struct MergeResult {
    /// Whether the merge was successful
    pub merged: bool,
    /// The SHA of the resulting commit (if successful)
    pub sha: Option<String>,
    /// Message from the merge operation (especially on failure)
    pub message: Option<String>,
}

/// The single outcome of one decision engine run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Action {
    /// The PR was fast-forward merged and its head branch deleted
    Merge {
        /// PR number
        pull_request: u64,
    },
    /// The PR's head branch was rebased onto its base
    Rebase {
        /// PR number
        pull_request: u64,
    },
    /// Another run holds the label lock on this PR
    Abort {
        /// PR number
        pull_request: u64,
    },
    /// The commenter is not allowed to request a one-time rebase
    DenyOneTimeRebase {
        /// PR number
        pull_request: u64,
    },
    /// The rebase failed and a comment explaining why was posted
    Failed {
        /// PR number
        pull_request: u64,
        /// Human-readable cause
        error: String,
    },
    /// Nothing to do
    Nop,
}

impl Action {
    /// The pull request this action touched, if any
    pub const fn pull_request(&self) -> Option<u64> {
        match self {
            Self::Merge { pull_request }
            | Self::Rebase { pull_request }
            | Self::Abort { pull_request }
            | Self::DenyOneTimeRebase { pull_request }
            | Self::Failed { pull_request, .. } => Some(*pull_request),
            Self::Nop => None,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Merge { pull_request } => write!(f, "merge #{pull_request}"),
            Self::Rebase { pull_request } => write!(f, "rebase #{pull_request}"),
            Self::Abort { pull_request } => write!(f, "abort #{pull_request}"),
            Self::DenyOneTimeRebase { pull_request } => {
                write!(f, "deny one-time rebase of #{pull_request}")
            }
            Self::Failed {
                pull_request,
                error,
            } => write!(f, "failed #{pull_request}: {error}"),
            Self::Nop => write!(f, "nop"),
        }
    }
}
