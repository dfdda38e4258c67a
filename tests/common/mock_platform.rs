//! In-memory GitHub for testing
//!
//! These are test utilities - not all may be used in current tests but are
//! available for future test development.
//!
//! Unlike a canned-response mock, this host actually stores blobs, trees,
//! commits and refs, enforces fast-forward-only ref updates, performs
//! three-way merges at file granularity and derives each pull request's
//! mergeable state from its branches. The rebase engine can therefore be
//! checked on the history it produces rather than on the calls it makes.

#![allow(dead_code)]

use async_trait::async_trait;
use autorebase::error::{Error, Result};
use autorebase::platform::PlatformService;
use autorebase::types::{
    GitCommit, MergeAttempt, MergeResult, MergeableState, NewCommit, Permission,
    PlatformConfig, PullRequest, PullRequestCommit, SearchPage, TreeEntries,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

type Files = BTreeMap<String, String>;

/// Everything needed to open a pull request on the mock host
#[derive(Debug, Clone)]
pub struct NewPullRequest<'a> {
    pub base: &'a str,
    pub head: &'a str,
    pub title: &'a str,
    pub labels: &'a [&'a str],
}

struct PullRecord {
    number: u64,
    title: String,
    base_ref: String,
    head_ref: String,
    head_sha: String,
    labels: BTreeSet<String>,
    merged: bool,
    closed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    rebaseable: bool,
    queued_states: VecDeque<MergeableState>,
}

#[derive(Default)]
struct Host {
    next_id: u64,
    blobs: HashMap<String, String>,
    blob_ids: HashMap<String, String>,
    trees: HashMap<String, BTreeMap<String, String>>,
    commits: HashMap<String, GitCommit>,
    refs: BTreeMap<String, String>,
    pulls: BTreeMap<u64, PullRecord>,
    comments: Vec<(u64, String)>,
    permissions: HashMap<String, Permission>,
}

impl Host {
    fn new_sha(&mut self) -> String {
        self.next_id += 1;
        format!("{:040x}", self.next_id)
    }

    fn blob(&mut self, content: &str) -> String {
        if let Some(sha) = self.blob_ids.get(content) {
            return sha.clone();
        }
        let sha = self.new_sha();
        self.blobs.insert(sha.clone(), content.to_string());
        self.blob_ids.insert(content.to_string(), sha.clone());
        sha
    }

    fn store_tree(&mut self, entries: BTreeMap<String, String>) -> String {
        let sha = self.new_sha();
        self.trees.insert(sha.clone(), entries);
        sha
    }

    fn store_commit(
        &mut self,
        message: &str,
        tree: &str,
        parents: Vec<String>,
        author: Option<autorebase::types::Signature>,
    ) -> String {
        let sha = self.new_sha();
        self.commits.insert(
            sha.clone(),
            GitCommit {
                sha: sha.clone(),
                tree: tree.to_string(),
                parents,
                message: message.to_string(),
                author,
            },
        );
        sha
    }

    fn commit(&self, sha: &str) -> Result<&GitCommit> {
        self.commits
            .get(sha)
            .ok_or_else(|| Error::GitHubApi(format!("No commit found for SHA: {sha}")))
    }

    fn tree_entries(&self, commit: &str) -> Result<BTreeMap<String, String>> {
        let tree = &self.commit(commit)?.tree;
        self.trees
            .get(tree)
            .cloned()
            .ok_or_else(|| Error::GitHubApi(format!("No tree found for SHA: {tree}")))
    }

    fn resolve(&self, name: &str) -> Result<String> {
        self.refs
            .get(name)
            .cloned()
            .ok_or_else(|| Error::GitHubApi(format!("Not Found: refs/heads/{name}")))
    }

    fn ancestors(&self, sha: &str) -> HashSet<String> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([sha.to_string()]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(commit) = self.commits.get(&current) {
                queue.extend(commit.parents.iter().cloned());
            }
        }
        seen
    }

    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> bool {
        self.ancestors(descendant).contains(ancestor)
    }

    fn merge_base(&self, a: &str, b: &str) -> Option<String> {
        let of_a = self.ancestors(a);
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([b.to_string()]);
        while let Some(current) = queue.pop_front() {
            if of_a.contains(&current) {
                return Some(current);
            }
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(commit) = self.commits.get(&current) {
                queue.extend(commit.parents.iter().cloned());
            }
        }
        None
    }

    /// File-level three-way merge, `None` on conflict
    fn merge_trees(
        base: &BTreeMap<String, String>,
        ours: &BTreeMap<String, String>,
        theirs: &BTreeMap<String, String>,
    ) -> Option<BTreeMap<String, String>> {
        let paths: BTreeSet<&String> = base.keys().chain(ours.keys()).chain(theirs.keys()).collect();
        let mut merged = BTreeMap::new();
        for path in paths {
            let (o, a, b) = (base.get(path), ours.get(path), theirs.get(path));
            let result = if a == b || b == o {
                a
            } else if a == o {
                b
            } else {
                return None;
            };
            if let Some(blob) = result {
                merged.insert(path.clone(), blob.clone());
            }
        }
        Some(merged)
    }

    /// PR commits oldest first: first-parent walk from head until base history
    fn pull_commits(&self, base_tip: &str, head_tip: &str) -> Vec<PullRequestCommit> {
        let in_base = self.ancestors(base_tip);
        let mut commits = Vec::new();
        let mut current = Some(head_tip.to_string());
        while let Some(sha) = current {
            if in_base.contains(&sha) {
                break;
            }
            let Some(commit) = self.commits.get(&sha) else {
                break;
            };
            commits.push(PullRequestCommit {
                sha: sha.clone(),
                message: commit.message.clone(),
            });
            current = commit.parents.first().cloned();
        }
        commits.reverse();
        commits
    }

    fn snapshot(&mut self, number: u64) -> Result<PullRequest> {
        let (base_ref, head_ref) = {
            let pr = self.pull(number)?;
            (pr.base_ref.clone(), pr.head_ref.clone())
        };
        if let Some(head) = self.refs.get(&head_ref).cloned() {
            self.pull_mut(number)?.head_sha = head;
        }

        let queued = self.pull_mut(number)?.queued_states.pop_front();
        let pr = self.pull(number)?;
        let state = queued.unwrap_or_else(|| match self.refs.get(&base_ref) {
            Some(base) if self.is_ancestor(base, &pr.head_sha) => MergeableState::Clean,
            _ => MergeableState::Behind,
        });

        Ok(PullRequest {
            number,
            title: pr.title.clone(),
            html_url: format!("https://github.com/test/repo/pull/{number}"),
            base_ref,
            head_ref,
            head_sha: pr.head_sha.clone(),
            mergeable_state: if pr.closed_at.is_some() {
                MergeableState::Unknown
            } else {
                state
            },
            merged: pr.merged,
            closed_at: pr.closed_at,
            created_at: pr.created_at,
            labels: pr.labels.clone(),
            rebaseable: pr.rebaseable,
        })
    }

    fn pull(&self, number: u64) -> Result<&PullRecord> {
        self.pulls
            .get(&number)
            .ok_or_else(|| Error::GitHubApi(format!("pull request #{number} not found")))
    }

    fn pull_mut(&mut self, number: u64) -> Result<&mut PullRecord> {
        self.pulls
            .get_mut(&number)
            .ok_or_else(|| Error::GitHubApi(format!("pull request #{number} not found")))
    }
}

/// Mock platform service backed by an in-memory git host
///
/// Features:
/// - Content-addressed blobs, trees, commits and branches
/// - Fast-forward checks on non-forced ref updates
/// - Pull requests with derived or queued mergeable states
/// - Label-based search with small pages
/// - Call tracking for verification
/// - Error injection for failure path testing
/// - Optional yield before every call, to interleave concurrent runs
pub struct MockPlatformService {
    config: PlatformConfig,
    host: Mutex<Host>,
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<String, String>>,
    yield_on_calls: AtomicBool,
    search_page_size: AtomicUsize,
    push_after_read: Mutex<Option<(String, Vec<(String, String)>)>>,
}

impl MockPlatformService {
    /// Create a new mock with the given config
    pub fn with_config(config: PlatformConfig) -> Self {
        Self {
            config,
            host: Mutex::new(Host::default()),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            yield_on_calls: AtomicBool::new(false),
            search_page_size: AtomicUsize::new(2),
            push_after_read: Mutex::new(None),
        }
    }

    async fn enter(&self, method: &str, detail: impl std::fmt::Display) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{method} {detail}"));
        if self.yield_on_calls.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        match self.failures.lock().unwrap().get(method) {
            Some(msg) => Err(Error::GitHubApi(msg.clone())),
            None => Ok(()),
        }
    }

    // === Behavior knobs ===

    /// Make every call to `method` fail with `msg`
    pub fn fail(&self, method: &str, msg: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(method.to_string(), msg.to_string());
    }

    /// Yield to the scheduler at the start of every call
    pub fn yield_on_calls(&self) {
        self.yield_on_calls.store(true, Ordering::SeqCst);
    }

    /// Number of results per search page
    pub fn set_search_page_size(&self, size: usize) {
        self.search_page_size.store(size, Ordering::SeqCst);
    }

    /// Push `files` to `branch` right after the next `get_ref` of it returns
    pub fn push_after_read(&self, branch: &str, files: &[(&str, &str)]) {
        let files = files
            .iter()
            .map(|(path, content)| ((*path).to_string(), (*content).to_string()))
            .collect();
        *self.push_after_read.lock().unwrap() = Some((branch.to_string(), files));
    }

    // === Repository setup ===

    /// Create a commit applying `files` on top of `parent`'s tree
    ///
    /// An empty content deletes the file.
    pub fn commit_files(&self, parent: Option<&str>, files: &[(&str, &str)], message: &str) -> String {
        let mut host = self.host.lock().unwrap();
        let mut entries = parent
            .map(|p| host.tree_entries(p).unwrap())
            .unwrap_or_default();
        for (path, content) in files {
            if content.is_empty() {
                entries.remove(*path);
            } else {
                let blob = host.blob(content);
                entries.insert((*path).to_string(), blob);
            }
        }
        let tree = host.store_tree(entries);
        let parents = parent.map(|p| vec![p.to_string()]).unwrap_or_default();
        host.store_commit(message, &tree, parents, None)
    }

    /// Create a merge commit of `parents` carrying the first parent's tree
    pub fn merge_commit(&self, parents: &[&str], message: &str) -> String {
        let mut host = self.host.lock().unwrap();
        let tree = host.commit(parents[0]).unwrap().tree.clone();
        host.store_commit(
            message,
            &tree,
            parents.iter().map(ToString::to_string).collect(),
            None,
        )
    }

    /// Point `branch` at `sha`, creating it if needed
    pub fn set_branch(&self, branch: &str, sha: &str) {
        self.host
            .lock()
            .unwrap()
            .refs
            .insert(branch.to_string(), sha.to_string());
    }

    /// Commit `files` on top of `branch` and move the branch, like a push
    pub fn push(&self, branch: &str, files: &[(&str, &str)], message: &str) -> String {
        let tip = self.branch(branch).expect("branch exists");
        let sha = self.commit_files(Some(&tip), files, message);
        self.set_branch(branch, &sha);
        sha
    }

    /// Open a pull request
    pub fn open_pull_request(&self, pr: NewPullRequest<'_>) -> u64 {
        let mut host = self.host.lock().unwrap();
        let number = host.pulls.len() as u64 + 1;
        let head_sha = host.refs.get(pr.head).cloned().unwrap_or_default();
        let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
            + Duration::minutes(i64::try_from(number).unwrap());
        host.pulls.insert(
            number,
            PullRecord {
                number,
                title: pr.title.to_string(),
                base_ref: pr.base.to_string(),
                head_ref: pr.head.to_string(),
                head_sha,
                labels: pr.labels.iter().map(ToString::to_string).collect(),
                merged: false,
                closed_at: None,
                created_at,
                rebaseable: true,
                queued_states: VecDeque::new(),
            },
        );
        number
    }

    /// Mergeable states reported by the next fetches, before falling back to the derived one
    pub fn queue_mergeable_states(&self, number: u64, states: &[MergeableState]) {
        let mut host = self.host.lock().unwrap();
        host.pull_mut(number)
            .unwrap()
            .queued_states
            .extend(states.iter().copied());
    }

    pub fn set_rebaseable(&self, number: u64, rebaseable: bool) {
        self.host.lock().unwrap().pull_mut(number).unwrap().rebaseable = rebaseable;
    }

    pub fn close_pull_request(&self, number: u64) {
        self.host.lock().unwrap().pull_mut(number).unwrap().closed_at = Some(Utc::now());
    }

    pub fn set_permission(&self, user: &str, permission: Permission) {
        self.host
            .lock()
            .unwrap()
            .permissions
            .insert(user.to_string(), permission);
    }

    // === Inspection ===

    pub fn branch(&self, name: &str) -> Option<String> {
        self.host.lock().unwrap().refs.get(name).cloned()
    }

    /// Every branch name on the host
    pub fn branches(&self) -> Vec<String> {
        self.host.lock().unwrap().refs.keys().cloned().collect()
    }

    pub fn commit(&self, sha: &str) -> GitCommit {
        self.host.lock().unwrap().commit(sha).unwrap().clone()
    }

    /// File contents at a commit
    pub fn files_at(&self, sha: &str) -> Files {
        let host = self.host.lock().unwrap();
        host.tree_entries(sha)
            .unwrap()
            .into_iter()
            .map(|(path, blob)| (path, host.blobs[&blob].clone()))
            .collect()
    }

    /// First-parent history from `sha`, newest first, stopping before `stop`
    pub fn history(&self, sha: &str, stop: &str) -> Vec<GitCommit> {
        let host = self.host.lock().unwrap();
        let mut out = Vec::new();
        let mut current = sha.to_string();
        while current != stop {
            let commit = host.commit(&current).unwrap().clone();
            let parent = commit.parents.first().cloned();
            out.push(commit);
            match parent {
                Some(p) => current = p,
                None => break,
            }
        }
        out
    }

    pub fn labels(&self, number: u64) -> BTreeSet<String> {
        self.host.lock().unwrap().pull(number).unwrap().labels.clone()
    }

    pub fn comments(&self, number: u64) -> Vec<String> {
        self.host
            .lock()
            .unwrap()
            .comments
            .iter()
            .filter(|(n, _)| *n == number)
            .map(|(_, body)| body.clone())
            .collect()
    }

    /// The `pull_request` object GitHub embeds in webhooks, as of now
    pub fn webhook_pull_request(&self, number: u64) -> serde_json::Value {
        let host = self.host.lock().unwrap();
        let pr = host.pull(number).unwrap();
        let labels: Vec<_> = pr.labels.iter().map(|name| json!({ "name": name })).collect();
        json!({
            "number": pr.number,
            "base": { "ref": pr.base_ref },
            "head": { "ref": pr.head_ref },
            "merged": pr.merged,
            "closed_at": pr.closed_at,
            "labels": labels,
            "rebaseable": pr.rebaseable,
        })
    }

    pub fn is_merged(&self, number: u64) -> bool {
        self.host.lock().unwrap().pull(number).unwrap().merged
    }

    /// Recorded calls, formatted as `method detail`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// How many times `method` was called
    pub fn call_count(&self, method: &str) -> usize {
        let prefix = format!("{method} ");
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(&prefix))
            .count()
    }

    /// Whether any call changed host state
    pub fn has_mutations(&self) -> bool {
        const MUTATING: [&str; 11] = [
            "create_blob",
            "create_tree",
            "create_commit",
            "create_ref",
            "update_ref",
            "delete_ref",
            "merge",
            "merge_pull_request",
            "remove_label",
            "create_comment",
            "add_labels",
        ];
        MUTATING.iter().any(|m| self.call_count(m) > 0)
    }
}

#[async_trait]
impl PlatformService for MockPlatformService {
    async fn create_blob(&self, content: &str) -> Result<String> {
        self.enter("create_blob", content.len()).await?;
        Ok(self.host.lock().unwrap().blob(content))
    }

    async fn create_tree(&self, base_tree: Option<&str>, entries: &TreeEntries) -> Result<String> {
        self.enter("create_tree", base_tree.unwrap_or("-")).await?;
        let mut host = self.host.lock().unwrap();
        let mut files = match base_tree {
            Some(sha) => host
                .trees
                .get(sha)
                .cloned()
                .ok_or_else(|| Error::GitHubApi(format!("No tree found for SHA: {sha}")))?,
            None => BTreeMap::new(),
        };
        for (path, blob) in entries {
            match blob {
                Some(blob) => files.insert(path.clone(), blob.clone()),
                None => files.remove(path),
            };
        }
        Ok(host.store_tree(files))
    }

    async fn get_commit(&self, sha: &str) -> Result<GitCommit> {
        self.enter("get_commit", sha).await?;
        Ok(self.host.lock().unwrap().commit(sha)?.clone())
    }

    async fn create_commit(&self, commit: &NewCommit) -> Result<String> {
        self.enter("create_commit", &commit.tree).await?;
        let mut host = self.host.lock().unwrap();
        if !host.trees.contains_key(&commit.tree) {
            return Err(Error::GitHubApi(format!("Tree SHA does not exist: {}", commit.tree)));
        }
        Ok(host.store_commit(
            &commit.message,
            &commit.tree,
            commit.parents.clone(),
            commit.author.clone(),
        ))
    }

    async fn get_ref(&self, name: &str) -> Result<String> {
        self.enter("get_ref", name).await?;
        let sha = self.host.lock().unwrap().resolve(name)?;

        let pending = {
            let mut pending = self.push_after_read.lock().unwrap();
            if pending.as_ref().is_some_and(|(branch, _)| branch == name) {
                pending.take()
            } else {
                None
            }
        };
        if let Some((branch, files)) = pending {
            let files: Vec<(&str, &str)> = files
                .iter()
                .map(|(path, content)| (path.as_str(), content.as_str()))
                .collect();
            self.push(&branch, &files, "Late push");
        }
        Ok(sha)
    }

    async fn create_ref(&self, name: &str, sha: &str) -> Result<()> {
        self.enter("create_ref", name).await?;
        let mut host = self.host.lock().unwrap();
        if host.refs.contains_key(name) {
            return Err(Error::GitHubApi("Reference already exists".to_string()));
        }
        host.refs.insert(name.to_string(), sha.to_string());
        Ok(())
    }

    async fn update_ref(&self, name: &str, sha: &str, force: bool) -> Result<()> {
        self.enter("update_ref", name).await?;
        let mut host = self.host.lock().unwrap();
        let current = host.resolve(name)?;
        if !force && !host.is_ancestor(&current, sha) {
            return Err(Error::ReferenceChanged {
                reference: name.to_string(),
            });
        }
        host.refs.insert(name.to_string(), sha.to_string());
        Ok(())
    }

    async fn delete_ref(&self, name: &str) -> Result<()> {
        self.enter("delete_ref", name).await?;
        let mut host = self.host.lock().unwrap();
        host.refs
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::GitHubApi("Reference does not exist".to_string()))
    }

    async fn merge(&self, base: &str, head_sha: &str, message: &str) -> Result<MergeAttempt> {
        self.enter("merge", base).await?;
        let mut host = self.host.lock().unwrap();
        let base_tip = host.resolve(base)?;
        if host.is_ancestor(head_sha, &base_tip) {
            return Ok(MergeAttempt::AlreadyMerged);
        }

        let ancestor = match host.merge_base(&base_tip, head_sha) {
            Some(sha) => host.tree_entries(&sha)?,
            None => BTreeMap::new(),
        };
        let ours = host.tree_entries(&base_tip)?;
        let theirs = host.tree_entries(head_sha)?;
        let Some(merged) = Host::merge_trees(&ancestor, &ours, &theirs) else {
            return Ok(MergeAttempt::Conflict);
        };

        let tree = host.store_tree(merged);
        let sha = host.store_commit(message, &tree, vec![base_tip, head_sha.to_string()], None);
        host.refs.insert(base.to_string(), sha.clone());
        Ok(MergeAttempt::Merged { sha, tree })
    }

    async fn get_pull_request(&self, number: u64) -> Result<PullRequest> {
        self.enter("get_pull_request", number).await?;
        self.host.lock().unwrap().snapshot(number)
    }

    async fn list_pull_request_commits(&self, number: u64) -> Result<Vec<PullRequestCommit>> {
        self.enter("list_pull_request_commits", number).await?;
        let host = self.host.lock().unwrap();
        let pr = host.pull(number)?;
        let base_tip = host.resolve(&pr.base_ref)?;
        let head_tip = host.refs.get(&pr.head_ref).unwrap_or(&pr.head_sha).clone();
        Ok(host.pull_commits(&base_tip, &head_tip))
    }

    async fn merge_pull_request(&self, number: u64) -> Result<MergeResult> {
        self.enter("merge_pull_request", number).await?;
        let mut host = self.host.lock().unwrap();
        let (base_ref, head_ref, open) = {
            let pr = host.pull(number)?;
            (pr.base_ref.clone(), pr.head_ref.clone(), pr.closed_at.is_none())
        };
        let base_tip = host.resolve(&base_ref)?;
        let head_tip = host.resolve(&head_ref)?;

        if !open || !host.is_ancestor(&base_tip, &head_tip) {
            return Ok(MergeResult {
                merged: false,
                sha: None,
                message: Some("Base branch was modified. Review and try the merge again.".into()),
            });
        }

        host.refs.insert(base_ref, head_tip.clone());
        let pr = host.pull_mut(number)?;
        pr.merged = true;
        pr.closed_at = Some(Utc::now());
        Ok(MergeResult {
            merged: true,
            sha: Some(head_tip),
            message: Some("Pull Request successfully merged".into()),
        })
    }

    async fn search_pull_requests(&self, query: &str, page: u32) -> Result<SearchPage> {
        self.enter("search_pull_requests", format!("{query} page={page}")).await?;
        let host = self.host.lock().unwrap();

        let mut label = None;
        let mut base = None;
        let mut shas = Vec::new();
        for token in query.split_whitespace() {
            if let Some(l) = token.strip_prefix("label:") {
                label = Some(l.trim_matches('"').to_string());
            } else if let Some(b) = token.strip_prefix("base:") {
                base = Some(b.to_string());
            } else if !token.starts_with("is:") {
                shas.push(token.to_string());
            }
        }

        let mut matches: Vec<&PullRecord> = host
            .pulls
            .values()
            .filter(|pr| pr.closed_at.is_none())
            .filter(|pr| label.as_ref().is_none_or(|l| pr.labels.contains(l)))
            .filter(|pr| base.as_ref().is_none_or(|b| &pr.base_ref == b))
            .filter(|pr| {
                let head = host.refs.get(&pr.head_ref).unwrap_or(&pr.head_sha);
                shas.iter().all(|sha| sha == head)
            })
            .collect();
        matches.sort_by_key(|pr| pr.created_at);

        let size = self.search_page_size.load(Ordering::SeqCst);
        let start = (page as usize - 1) * size;
        let numbers = matches
            .iter()
            .skip(start)
            .take(size)
            .map(|pr| pr.number)
            .collect();
        Ok(SearchPage {
            numbers,
            has_next_page: start + size < matches.len(),
        })
    }

    async fn add_labels(&self, number: u64, labels: &[String]) -> Result<()> {
        self.enter("add_labels", number).await?;
        let mut host = self.host.lock().unwrap();
        host.pull_mut(number)?.labels.extend(labels.iter().cloned());
        Ok(())
    }

    async fn remove_label(&self, number: u64, label: &str) -> Result<bool> {
        self.enter("remove_label", number).await?;
        let mut host = self.host.lock().unwrap();
        Ok(host.pull_mut(number)?.labels.remove(label))
    }

    async fn list_labels(&self, number: u64) -> Result<Vec<String>> {
        self.enter("list_labels", number).await?;
        let host = self.host.lock().unwrap();
        Ok(host.pull(number)?.labels.iter().cloned().collect())
    }

    async fn create_comment(&self, number: u64, body: &str) -> Result<()> {
        self.enter("create_comment", number).await?;
        self.host
            .lock()
            .unwrap()
            .comments
            .push((number, body.to_string()));
        Ok(())
    }

    async fn get_permission(&self, username: &str) -> Result<Permission> {
        self.enter("get_permission", username).await?;
        let host = self.host.lock().unwrap();
        Ok(host
            .permissions
            .get(username)
            .copied()
            .unwrap_or(Permission::None))
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}
