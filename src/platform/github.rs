//! GitHub platform service implementation

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{
    GitCommit, MergeAttempt, MergeResult, MergeableState, NewCommit, Permission,
    PlatformConfig, PullRequest, PullRequestCommit, SearchPage, Signature, TreeEntries,
};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use octocrab::Octocrab;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Page size used for paginated endpoints
const PER_PAGE: u32 = 100;

/// The search API serves at most this many results per query
const SEARCH_RESULT_LIMIT: u64 = 1000;

// REST payloads. Only the fields the engines read are declared.

#[derive(Deserialize)]
struct ShaPayload {
    sha: String,
}

#[derive(Deserialize)]
struct RefPayload {
    object: ShaPayload,
}

#[derive(Deserialize)]
struct NamePayload {
    name: String,
}

#[derive(Deserialize)]
struct BranchPayload {
    #[serde(rename = "ref")]
    ref_field: String,
    sha: String,
}

#[derive(Deserialize)]
struct PullRequestPayload {
    number: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
    base: BranchPayload,
    head: BranchPayload,
    #[serde(default)]
    mergeable_state: Option<MergeableState>,
    #[serde(default)]
    merged: Option<bool>,
    closed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    labels: Vec<NamePayload>,
    #[serde(default)]
    rebaseable: Option<bool>,
}

impl From<PullRequestPayload> for PullRequest {
    fn from(pr: PullRequestPayload) -> Self {
        Self {
            number: pr.number,
            title: pr.title.unwrap_or_default(),
            html_url: pr.html_url.unwrap_or_default(),
            base_ref: pr.base.ref_field,
            head_ref: pr.head.ref_field,
            head_sha: pr.head.sha,
            mergeable_state: pr.mergeable_state.unwrap_or(MergeableState::Unknown),
            merged: pr.merged.unwrap_or(false),
            closed_at: pr.closed_at,
            created_at: pr.created_at,
            labels: pr.labels.into_iter().map(|l| l.name).collect(),
            rebaseable: pr.rebaseable.unwrap_or(false),
        }
    }
}

#[derive(Deserialize)]
struct CommitMessagePayload {
    message: String,
}

#[derive(Deserialize)]
struct PullRequestCommitPayload {
    sha: String,
    commit: CommitMessagePayload,
}

#[derive(Deserialize)]
struct GitCommitPayload {
    sha: String,
    tree: ShaPayload,
    parents: Vec<ShaPayload>,
    message: String,
    author: Option<Signature>,
}

#[derive(Deserialize)]
struct MergeCommitPayload {
    sha: String,
    commit: MergeCommitTree,
}

#[derive(Deserialize)]
struct MergeCommitTree {
    tree: ShaPayload,
}

#[derive(Deserialize)]
struct SearchPayload {
    total_count: u64,
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    number: u64,
}

#[derive(Serialize)]
struct SearchParams<'a> {
    q: &'a str,
    sort: &'static str,
    order: &'static str,
    per_page: u32,
    page: u32,
}

#[derive(Serialize)]
struct PageParams {
    per_page: u32,
    page: u32,
}

#[derive(Deserialize)]
struct PermissionPayload {
    permission: Permission,
}

#[derive(Serialize)]
struct TreeEntryBody<'a> {
    path: &'a str,
    mode: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
    sha: Option<&'a str>,
}

/// GitHub service using octocrab
pub struct GitHubService {
    client: Octocrab,
    config: PlatformConfig,
    /// Token for raw HTTP requests (status-sensitive endpoints)
    token: String,
    /// HTTP client for raw requests
    http_client: Client,
    /// API base URL for raw requests, without trailing slash
    api_base: String,
}

impl GitHubService {
    /// Create a new GitHub service
    pub fn new(token: &str, owner: String, repo: String, host: Option<String>) -> Result<Self> {
        let api_base = host.as_ref().map_or_else(
            || "https://api.github.com".to_string(),
            |h| format!("https://{h}/api/v3"),
        );
        let mut service = Self::with_api_base(token, owner, repo, &api_base)?;
        service.config.host = host;
        Ok(service)
    }

    /// Create a service talking to an explicit API base URL
    pub fn with_api_base(token: &str, owner: String, repo: String, api_base: &str) -> Result<Self> {
        let api_base = api_base.trim_end_matches('/').to_string();

        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .base_uri(api_base.as_str())
            .map_err(|e| Error::GitHubApi(e.to_string()))?
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        let http_client = Client::builder()
            .user_agent("autorebase")
            .build()
            .map_err(|e| Error::GitHubApi(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config: PlatformConfig {
                owner,
                repo,
                host: None,
            },
            token: token.to_string(),
            http_client,
            api_base,
        })
    }

    fn repo_route(&self, path: &str) -> String {
        format!("/repos/{}/{}{path}", self.config.owner, self.config.repo)
    }

    fn raw(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.api_base, self.repo_route(path));
        self.http_client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }
}

/// Turn a non-success raw response into an error carrying GitHub's message
async fn api_error(context: &str, response: Response) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Error::GitHubApi(format!("{context} failed with {status}: {body}"))
}

#[async_trait]
impl PlatformService for GitHubService {
    async fn create_blob(&self, content: &str) -> Result<String> {
        debug!(len = content.len(), "creating blob");
        let body = serde_json::json!({
            "content": BASE64.encode(content),
            "encoding": "base64",
        });
        let blob: ShaPayload = self
            .client
            .post(self.repo_route("/git/blobs"), Some(&body))
            .await?;
        Ok(blob.sha)
    }

    async fn create_tree(&self, base_tree: Option<&str>, entries: &TreeEntries) -> Result<String> {
        debug!(?base_tree, entries = entries.len(), "creating tree");
        let tree: Vec<TreeEntryBody<'_>> = entries
            .iter()
            .map(|(path, sha)| TreeEntryBody {
                path,
                mode: "100644",
                kind: "blob",
                sha: sha.as_deref(),
            })
            .collect();
        let body = serde_json::json!({ "base_tree": base_tree, "tree": tree });
        let created: ShaPayload = self
            .client
            .post(self.repo_route("/git/trees"), Some(&body))
            .await?;
        Ok(created.sha)
    }

    async fn get_commit(&self, sha: &str) -> Result<GitCommit> {
        debug!(sha, "getting commit");
        let commit: GitCommitPayload = self
            .client
            .get(self.repo_route(&format!("/git/commits/{sha}")), None::<&()>)
            .await?;
        Ok(GitCommit {
            sha: commit.sha,
            tree: commit.tree.sha,
            parents: commit.parents.into_iter().map(|p| p.sha).collect(),
            message: commit.message,
            author: commit.author,
        })
    }

    async fn create_commit(&self, commit: &NewCommit) -> Result<String> {
        debug!(tree = %commit.tree, parents = ?commit.parents, "creating commit");
        let mut body = serde_json::json!({
            "message": commit.message,
            "tree": commit.tree,
            "parents": commit.parents,
        });
        if let Some(author) = &commit.author {
            body["author"] = serde_json::to_value(author)
                .map_err(|e| Error::Internal(format!("Failed to encode author: {e}")))?;
        }
        let created: ShaPayload = self
            .client
            .post(self.repo_route("/git/commits"), Some(&body))
            .await?;
        debug!(sha = %created.sha, "created commit");
        Ok(created.sha)
    }

    async fn get_ref(&self, name: &str) -> Result<String> {
        debug!(name, "getting ref");
        let reference: RefPayload = self
            .client
            .get(self.repo_route(&format!("/git/ref/heads/{name}")), None::<&()>)
            .await?;
        Ok(reference.object.sha)
    }

    async fn create_ref(&self, name: &str, sha: &str) -> Result<()> {
        debug!(name, sha, "creating ref");
        let body = serde_json::json!({ "ref": format!("refs/heads/{name}"), "sha": sha });
        let _: serde_json::Value = self
            .client
            .post(self.repo_route("/git/refs"), Some(&body))
            .await?;
        Ok(())
    }

    async fn update_ref(&self, name: &str, sha: &str, force: bool) -> Result<()> {
        debug!(name, sha, force, "updating ref");
        let response = self
            .raw(Method::PATCH, &format!("/git/refs/heads/{name}"))
            .json(&serde_json::json!({ "sha": sha, "force": force }))
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => Ok(()),
            // GitHub answers "Update is not a fast forward" with 422
            StatusCode::UNPROCESSABLE_ENTITY if !force => {
                debug!(name, "ref update rejected, not a fast-forward");
                Err(Error::ReferenceChanged {
                    reference: name.to_string(),
                })
            }
            _ => Err(api_error("update ref", response).await),
        }
    }

    async fn delete_ref(&self, name: &str) -> Result<()> {
        debug!(name, "deleting ref");
        let response = self
            .raw(Method::DELETE, &format!("/git/refs/heads/{name}"))
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(api_error("delete ref", response).await)
        }
    }

    async fn merge(&self, base: &str, head_sha: &str, message: &str) -> Result<MergeAttempt> {
        debug!(base, head_sha, "merging into branch");
        let response = self
            .raw(Method::POST, "/merges")
            .json(&serde_json::json!({
                "base": base,
                "head": head_sha,
                "commit_message": message,
            }))
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED => {
                let merge: MergeCommitPayload = response.json().await?;
                debug!(sha = %merge.sha, "merged");
                Ok(MergeAttempt::Merged {
                    sha: merge.sha,
                    tree: merge.commit.tree.sha,
                })
            }
            StatusCode::NO_CONTENT => Ok(MergeAttempt::AlreadyMerged),
            StatusCode::CONFLICT => {
                debug!(base, head_sha, "merge conflict");
                Ok(MergeAttempt::Conflict)
            }
            _ => Err(api_error("merge", response).await),
        }
    }

    async fn get_pull_request(&self, number: u64) -> Result<PullRequest> {
        debug!(number, "getting PR");
        let pr: PullRequestPayload = self
            .client
            .get(self.repo_route(&format!("/pulls/{number}")), None::<&()>)
            .await?;
        let pr = PullRequest::from(pr);
        debug!(number, state = %pr.mergeable_state, "got PR");
        Ok(pr)
    }

    async fn list_pull_request_commits(&self, number: u64) -> Result<Vec<PullRequestCommit>> {
        debug!(number, "listing PR commits");
        let mut commits = Vec::new();
        let mut page = 1;
        loop {
            let items: Vec<PullRequestCommitPayload> = self
                .client
                .get(
                    self.repo_route(&format!("/pulls/{number}/commits")),
                    Some(&PageParams {
                        per_page: PER_PAGE,
                        page,
                    }),
                )
                .await?;
            let done = items.len() < PER_PAGE as usize;
            commits.extend(items.into_iter().map(|c| PullRequestCommit {
                sha: c.sha,
                message: c.commit.message,
            }));
            if done {
                break;
            }
            page += 1;
        }
        debug!(number, count = commits.len(), "listed PR commits");
        Ok(commits)
    }

    async fn merge_pull_request(&self, number: u64) -> Result<MergeResult> {
        debug!(number, "merging PR");

        let result = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .merge(number)
            .method(octocrab::params::pulls::MergeMethod::Rebase)
            .send()
            .await
            .map_err(|e| Error::GitHubApi(format!("Merge failed: {e}")))?;

        let merge_result = MergeResult {
            merged: result.merged,
            sha: result.sha,
            message: result.message,
        };

        debug!(
            number,
            merged = merge_result.merged,
            sha = ?merge_result.sha,
            "merge complete"
        );
        Ok(merge_result)
    }

    async fn search_pull_requests(&self, query: &str, page: u32) -> Result<SearchPage> {
        let q = format!(
            "repo:{}/{} {query}",
            self.config.owner, self.config.repo
        );
        debug!(q = %q, page, "searching PRs");
        let params = SearchParams {
            q: &q,
            sort: "created",
            order: "asc",
            per_page: PER_PAGE,
            page,
        };
        let result: SearchPayload = self.client.get("/search/issues", Some(&params)).await?;
        let seen = u64::from(page) * u64::from(PER_PAGE);
        Ok(SearchPage {
            numbers: result.items.into_iter().map(|i| i.number).collect(),
            has_next_page: seen < result.total_count.min(SEARCH_RESULT_LIMIT),
        })
    }

    async fn add_labels(&self, number: u64, labels: &[String]) -> Result<()> {
        debug!(number, ?labels, "adding labels");
        self.client
            .issues(&self.config.owner, &self.config.repo)
            .add_labels(number, labels)
            .await?;
        Ok(())
    }

    async fn remove_label(&self, number: u64, label: &str) -> Result<bool> {
        debug!(number, label, "removing label");
        let response = self
            .raw(
                Method::DELETE,
                &format!("/issues/{number}/labels/{}", urlencoding::encode(label)),
            )
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => {
                debug!(number, label, "label was not present");
                Ok(false)
            }
            _ => Err(api_error("remove label", response).await),
        }
    }

    async fn list_labels(&self, number: u64) -> Result<Vec<String>> {
        debug!(number, "listing labels");
        let labels: Vec<NamePayload> = self
            .client
            .get(
                self.repo_route(&format!("/issues/{number}/labels")),
                Some(&PageParams {
                    per_page: PER_PAGE,
                    page: 1,
                }),
            )
            .await?;
        Ok(labels.into_iter().map(|l| l.name).collect())
    }

    async fn create_comment(&self, number: u64, body: &str) -> Result<()> {
        debug!(number, "creating comment");
        self.client
            .issues(&self.config.owner, &self.config.repo)
            .create_comment(number, body)
            .await?;
        debug!(number, "created comment");
        Ok(())
    }

    async fn get_permission(&self, username: &str) -> Result<Permission> {
        debug!(username, "getting collaborator permission");
        let response = self
            .raw(
                Method::GET,
                &format!(
                    "/collaborators/{}/permission",
                    urlencoding::encode(username)
                ),
            )
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => {
                let payload: PermissionPayload = response.json().await?;
                Ok(payload.permission)
            }
            // Not a collaborator at all
            StatusCode::NOT_FOUND => Ok(Permission::None),
            _ => Err(api_error("get permission", response).await),
        }
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}
