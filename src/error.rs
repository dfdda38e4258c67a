//! Error types for autorebase

use thiserror::Error;

/// Errors that can occur while deciding on or carrying out an action
#[derive(Error, Debug)]
pub enum Error {
    /// GitHub API error
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// Authentication error
    #[error("authentication error: {0}")]
    Auth(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Webhook payload could not be understood
    #[error("invalid event: {0}")]
    Event(String),

    /// A commit could not be applied on top of the new base
    #[error("could not cherry-pick {sha}: merge conflict")]
    CherryPickConflict {
        /// The offending commit
        sha: String,
    },

    /// A fast-forward update was rejected because the reference moved
    #[error("reference {reference} changed during the operation")]
    ReferenceChanged {
        /// Name of the reference (without `refs/heads/`)
        reference: String,
    },

    /// The head branch was pushed to while it was being rebased
    #[error("head branch {reference} changed while it was being rebased")]
    HeadChanged {
        /// Name of the head branch
        reference: String,
    },

    /// Merge commits and root commits cannot be cherry-picked
    #[error("commit {sha} does not have exactly one parent")]
    UnsupportedCommit {
        /// The offending commit
        sha: String,
    },

    /// GitHub kept reporting an unknown mergeable state
    #[error("mergeable state of #{number} still unknown after {attempts} attempts")]
    MergeableStateUnknown {
        /// Pull request number
        number: u64,
        /// How many times the pull request was fetched
        attempts: u32,
    },

    /// Rebasing a pull request failed; a comment was posted on it
    #[error("rebase failed for #{number}: {source}")]
    RebaseFailed {
        /// Pull request number
        number: u64,
        /// What went wrong during the rebase
        #[source]
        source: Box<Error>,
    },

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error comes out of the rebase engine itself
    ///
    /// Conflicts and concurrent modifications are reported on the pull request
    /// and never retried automatically.
    pub const fn is_rebase_failure(&self) -> bool {
        matches!(
            self,
            Self::CherryPickConflict { .. }
                | Self::ReferenceChanged { .. }
                | Self::HeadChanged { .. }
                | Self::UnsupportedCommit { .. }
        )
    }
}

impl From<octocrab::Error> for Error {
    fn from(err: octocrab::Error) -> Self {
        Self::GitHubApi(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::GitHubApi(err.to_string())
    }
}

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;
