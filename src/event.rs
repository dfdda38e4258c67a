//! Inbound webhook events
//!
//! One `Event` drives one decision engine run. Events are parsed from the
//! `X-GitHub-Event` name and the JSON payload; anything the engine does not
//! react to becomes `Event::Other` rather than an error.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeSet;

/// What happened to a pull request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullRequestAction {
    /// PR was opened
    Opened,
    /// New commits were pushed to the head branch
    Synchronize,
    /// A label was added
    Labeled,
    /// PR was closed (merged or not)
    Closed,
    /// Any other action
    #[serde(other)]
    Other,
}

/// What happened to a review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    /// Review was submitted
    Submitted,
    /// Any other action
    #[serde(other)]
    Other,
}

/// What happened to a check run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckRunAction {
    /// Check run finished
    Completed,
    /// Any other action
    #[serde(other)]
    Other,
}

/// What happened to an issue comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentAction {
    /// Comment was created
    Created,
    /// Any other action
    #[serde(other)]
    Other,
}

/// A pull request as embedded in a webhook payload
///
/// Mergeability and head SHA are always re-fetched. The labels are taken from
/// the payload: while another run holds the label lock, a fresh fetch no
/// longer shows the label the event was sent for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    /// PR number
    pub number: u64,
    /// Base branch name
    pub base_ref: String,
    /// Whether the PR was merged
    pub merged: bool,
    /// When the PR was closed, `None` while open
    pub closed_at: Option<DateTime<Utc>>,
    /// Labels at the time of the event
    pub labels: BTreeSet<String>,
    /// Whether GitHub considered the head rebaseable; `None` while not computed
    pub rebaseable: Option<bool>,
}

impl PullRequestRef {
    /// Whether the PR was open when the event was sent
    pub const fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }

    /// Whether the PR carried `label` when the event was sent
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }
}

/// An inbound event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// `pull_request` webhook
    PullRequest {
        /// What happened
        action: PullRequestAction,
        /// The pull request
        pull_request: PullRequestRef,
        /// Name of the label that was added, for `labeled`
        label: Option<String>,
    },
    /// `pull_request_review` webhook
    PullRequestReview {
        /// What happened
        action: ReviewAction,
        /// The reviewed pull request
        pull_request: PullRequestRef,
    },
    /// `status` webhook
    Status {
        /// Commit the status was reported on
        sha: String,
    },
    /// `check_run` webhook
    CheckRun {
        /// What happened
        action: CheckRunAction,
        /// Commit the check ran on
        head_sha: String,
    },
    /// `issue_comment` webhook
    IssueComment {
        /// What happened
        action: CommentAction,
        /// Issue (or PR) number
        issue_number: u64,
        /// Whether the issue is a pull request
        is_pull_request: bool,
        /// Comment body
        body: String,
        /// Login of the commenter
        author: String,
    },
    /// Anything else
    Other {
        /// Event name
        name: String,
    },
}

#[derive(Deserialize)]
struct Named {
    name: String,
}

#[derive(Deserialize)]
struct BranchPayload {
    #[serde(rename = "ref")]
    ref_field: String,
}

#[derive(Deserialize)]
struct PullRequestPayload {
    number: u64,
    base: BranchPayload,
    #[serde(default)]
    merged: Option<bool>,
    #[serde(default)]
    closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    labels: Vec<Named>,
    #[serde(default)]
    rebaseable: Option<bool>,
}

impl From<PullRequestPayload> for PullRequestRef {
    fn from(pr: PullRequestPayload) -> Self {
        Self {
            number: pr.number,
            base_ref: pr.base.ref_field,
            merged: pr.merged.unwrap_or(false),
            closed_at: pr.closed_at,
            labels: pr.labels.into_iter().map(|l| l.name).collect(),
            rebaseable: pr.rebaseable,
        }
    }
}

#[derive(Deserialize)]
struct PullRequestEvent {
    action: PullRequestAction,
    pull_request: PullRequestPayload,
    label: Option<Named>,
}

#[derive(Deserialize)]
struct ReviewEvent {
    action: ReviewAction,
    pull_request: PullRequestPayload,
}

#[derive(Deserialize)]
struct StatusEvent {
    sha: String,
}

#[derive(Deserialize)]
struct CheckRunPayload {
    head_sha: String,
}

#[derive(Deserialize)]
struct CheckRunEvent {
    action: CheckRunAction,
    check_run: CheckRunPayload,
}

#[derive(Deserialize)]
struct Login {
    login: String,
}

#[derive(Deserialize)]
struct IssuePayload {
    number: u64,
    pull_request: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct CommentPayload {
    #[serde(default)]
    body: Option<String>,
    user: Login,
}

#[derive(Deserialize)]
struct IssueCommentEvent {
    action: CommentAction,
    issue: IssuePayload,
    comment: CommentPayload,
}

impl Event {
    /// Parse a webhook delivery
    ///
    /// `name` is the value of the `X-GitHub-Event` header.
    pub fn from_webhook(name: &str, payload: &serde_json::Value) -> Result<Self> {
        let event = match name {
            "pull_request" => {
                let e: PullRequestEvent = parse(name, payload)?;
                Self::PullRequest {
                    action: e.action,
                    pull_request: e.pull_request.into(),
                    label: e.label.map(|l| l.name),
                }
            }
            "pull_request_review" => {
                let e: ReviewEvent = parse(name, payload)?;
                Self::PullRequestReview {
                    action: e.action,
                    pull_request: e.pull_request.into(),
                }
            }
            "status" => {
                let e: StatusEvent = parse(name, payload)?;
                Self::Status { sha: e.sha }
            }
            "check_run" => {
                let e: CheckRunEvent = parse(name, payload)?;
                Self::CheckRun {
                    action: e.action,
                    head_sha: e.check_run.head_sha,
                }
            }
            "issue_comment" => {
                let e: IssueCommentEvent = parse(name, payload)?;
                Self::IssueComment {
                    action: e.action,
                    issue_number: e.issue.number,
                    is_pull_request: e
                        .issue
                        .pull_request
                        .is_some_and(|v| !v.is_null()),
                    body: e.comment.body.unwrap_or_default(),
                    author: e.comment.user.login,
                }
            }
            other => Self::Other {
                name: other.to_string(),
            },
        };
        Ok(event)
    }

    /// Short name used in logs
    pub fn name(&self) -> &str {
        match self {
            Self::PullRequest { .. } => "pull_request",
            Self::PullRequestReview { .. } => "pull_request_review",
            Self::Status { .. } => "status",
            Self::CheckRun { .. } => "check_run",
            Self::IssueComment { .. } => "issue_comment",
            Self::Other { name } => name.as_str(),
        }
    }
}

fn parse<T: serde::de::DeserializeOwned>(name: &str, payload: &serde_json::Value) -> Result<T> {
    T::deserialize(payload).map_err(|e| Error::Event(format!("{name}: {e}")))
}
