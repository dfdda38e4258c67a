//! Platform services for the remote code host
//!
//! Everything the engines need from GitHub goes through [`PlatformService`],
//! so the same rebase and decision logic runs against the real API or an
//! in-memory host in tests.

mod github;

pub use github::GitHubService;

use crate::error::Result;
use crate::types::{
    GitCommit, MergeAttempt, MergeResult, NewCommit, Permission, PlatformConfig,
    PullRequest, PullRequestCommit, SearchPage, TreeEntries,
};
use async_trait::async_trait;

/// Platform service trait for git data, pull request and issue operations
///
/// Reference names are short branch names (`feature`, not `refs/heads/feature`).
/// Only `update_ref` without `force` and `remove_label` carry conditional
/// semantics; everything else is a plain request.
#[async_trait]
pub trait PlatformService: Send + Sync {
    // =========================================================================
    // Git data
    // =========================================================================

    /// Store `content` as a blob and return its SHA
    async fn create_blob(&self, content: &str) -> Result<String>;

    /// Create a tree from `base_tree` with `entries` applied, returning its SHA
    ///
    /// Entries are written as regular files (mode `100644`). Trees produced by
    /// the engines come from host-side merges and keep their original modes.
    async fn create_tree(&self, base_tree: Option<&str>, entries: &TreeEntries) -> Result<String>;

    /// Fetch a commit object
    async fn get_commit(&self, sha: &str) -> Result<GitCommit>;

    /// Create a commit object and return its SHA
    async fn create_commit(&self, commit: &NewCommit) -> Result<String>;

    /// Current SHA of a branch
    async fn get_ref(&self, name: &str) -> Result<String>;

    /// Create a branch pointing at `sha`
    async fn create_ref(&self, name: &str, sha: &str) -> Result<()>;

    /// Move a branch to `sha`
    ///
    /// Without `force`, the update must be a fast-forward; otherwise the host
    /// rejects it and this returns [`Error::ReferenceChanged`].
    ///
    /// [`Error::ReferenceChanged`]: crate::error::Error::ReferenceChanged
    async fn update_ref(&self, name: &str, sha: &str, force: bool) -> Result<()>;

    /// Delete a branch
    async fn delete_ref(&self, name: &str) -> Result<()>;

    /// Merge `head_sha` into branch `base`, creating a merge commit on `base`
    async fn merge(&self, base: &str, head_sha: &str, message: &str) -> Result<MergeAttempt>;

    // =========================================================================
    // Pull requests
    // =========================================================================

    /// Fresh snapshot of a pull request
    async fn get_pull_request(&self, number: u64) -> Result<PullRequest>;

    /// Every commit of a pull request, oldest first, across all pages
    async fn list_pull_request_commits(&self, number: u64) -> Result<Vec<PullRequestCommit>>;

    /// Merge a pull request with the `rebase` method, so no merge commit is created
    async fn merge_pull_request(&self, number: u64) -> Result<MergeResult>;

    /// One page (1-based) of open pull requests matching `query`, oldest first
    async fn search_pull_requests(&self, query: &str, page: u32) -> Result<SearchPage>;

    // =========================================================================
    // Issues
    // =========================================================================

    /// Add labels to an issue or pull request
    async fn add_labels(&self, number: u64, labels: &[String]) -> Result<()>;

    /// Remove a label, returning `false` if it was not present
    async fn remove_label(&self, number: u64, label: &str) -> Result<bool>;

    /// Names of the labels on an issue or pull request
    async fn list_labels(&self, number: u64) -> Result<Vec<String>>;

    /// Create a comment on an issue or pull request
    async fn create_comment(&self, number: u64, body: &str) -> Result<()>;

    /// Permission level of a user on the repository
    async fn get_permission(&self, username: &str) -> Result<Permission>;

    /// Get the platform configuration
    fn config(&self) -> &PlatformConfig;
}
