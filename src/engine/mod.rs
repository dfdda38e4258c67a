//! Decision engine: one event in, one action out
//!
//! Two-phase pattern:
//! 1. Plan - pick what to do from freshly fetched state (`plan`, pure)
//! 2. Execute - merge or rebase under the label lock (`execute`, effectful)
//!
//! [`Autorebase::run`] ties them together and dispatches on the event.

mod execute;
mod plan;

pub use execute::{merge, rebase};
pub use plan::{
    PolicyDecision, decide, default_authorization, denied_comment, is_behind, is_mergeable,
    is_rebase_command, rebase_failed_comment,
};

use crate::config::Settings;
use crate::context::RunContext;
use crate::error::{Error, Result};
use crate::event::{
    CheckRunAction, CommentAction, Event, PullRequestAction, PullRequestRef, ReviewAction,
};
use crate::git::needs_autosquash;
use crate::platform::PlatformService;
use crate::pulls::{SearchRequest, find_oldest_pull_request, resolve_mergeable_state};
use crate::types::{Action, MergeableState, Permission, PullRequest};
use std::sync::Arc;
use tracing::{Instrument, debug, info};

/// Decides who may request a one-time rebase from their permission level
pub type Authorization = Arc<dyn Fn(Permission) -> bool + Send + Sync>;

/// The decision engine
///
/// Stateless between runs: everything it acts on is re-fetched from the host,
/// so any number of runs may execute concurrently against one repository.
#[derive(Clone)]
pub struct Autorebase {
    platform: Arc<dyn PlatformService>,
    settings: Settings,
    authorize: Authorization,
    force_rebase: bool,
}

impl Autorebase {
    /// Create an engine with the default authorization rule
    pub fn new(platform: Arc<dyn PlatformService>, settings: Settings) -> Self {
        let allow_maintainers = settings.allow_maintainers;
        Self {
            platform,
            settings,
            authorize: Arc::new(move |permission| {
                default_authorization(permission, allow_maintainers)
            }),
            force_rebase: false,
        }
    }

    /// Replace the rule deciding who may request a one-time rebase
    #[must_use]
    pub fn with_authorization<F>(mut self, authorize: F) -> Self
    where
        F: Fn(Permission) -> bool + Send + Sync + 'static,
    {
        self.authorize = Arc::new(authorize);
        self
    }

    /// Rebase on `pull_request` events even without the label or a `behind` state
    #[must_use]
    pub fn with_force_rebase(mut self, force_rebase: bool) -> Self {
        self.force_rebase = force_rebase;
        self
    }

    /// The label that opts pull requests in
    pub fn label(&self) -> &str {
        &self.settings.label
    }

    /// Engine settings
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Handle one event
    ///
    /// Every side effect has completed by the time this returns. A failed
    /// rebase has already been reported on its pull request and comes back
    /// as [`Error::RebaseFailed`].
    pub async fn run(&self, event: &Event, ctx: &RunContext) -> Result<Action> {
        async {
            info!(event = event.name(), "handling event");
            let action = self.dispatch(event, ctx).await?;
            info!(action = %action, "run finished");
            Ok(action)
        }
        .instrument(ctx.span().clone())
        .await
    }

    /// Like [`run`](Self::run), but a failed rebase becomes [`Action::Failed`]
    pub async fn run_to_action(&self, event: &Event, ctx: &RunContext) -> Result<Action> {
        match self.run(event, ctx).await {
            Err(Error::RebaseFailed { number, source }) => Ok(Action::Failed {
                pull_request: number,
                error: source.to_string(),
            }),
            other => other,
        }
    }

    fn platform(&self) -> &dyn PlatformService {
        self.platform.as_ref()
    }

    async fn dispatch(&self, event: &Event, ctx: &RunContext) -> Result<Action> {
        match event {
            Event::Status { sha }
            | Event::CheckRun {
                action: CheckRunAction::Completed,
                head_sha: sha,
            } => self.on_commit_checked(ctx, sha).await,
            Event::IssueComment {
                action: CommentAction::Created,
                issue_number,
                is_pull_request: true,
                body,
                author,
            } if is_rebase_command(body, self.label()) => {
                self.on_rebase_command(ctx, *issue_number, author).await
            }
            Event::PullRequest {
                action: PullRequestAction::Opened | PullRequestAction::Synchronize,
                pull_request,
                ..
            } => self.on_pull_request_changed(ctx, pull_request).await,
            Event::PullRequest {
                action: PullRequestAction::Labeled,
                pull_request,
                label: Some(label),
            } if label == self.label() => self.on_pull_request_changed(ctx, pull_request).await,
            Event::PullRequest {
                action: PullRequestAction::Closed,
                pull_request,
                ..
            } if pull_request.merged => {
                self.rebase_behind_sibling(ctx, &pull_request.base_ref, pull_request.number)
                    .await
            }
            Event::PullRequestReview {
                action: ReviewAction::Submitted,
                pull_request,
            } => self.on_review_submitted(pull_request.number).await,
            Event::PullRequest { .. }
            | Event::PullRequestReview { .. }
            | Event::CheckRun { .. }
            | Event::IssueComment { .. }
            | Event::Other { .. } => Ok(Action::Nop),
        }
    }

    /// A status or check run finished on `sha`
    async fn on_commit_checked(&self, ctx: &RunContext, sha: &str) -> Result<Action> {
        let label = self.label();
        let qualifiers = [sha.to_string()];
        self.wait_for_search_index().await;

        let found = find_oldest_pull_request(
            self.platform(),
            SearchRequest {
                label,
                qualifiers: &qualifiers,
            },
            &self.settings.mergeable_state,
            |pr| pr.labeled_and_open_and_rebaseable(label) && pr.head_sha == sha,
        )
        .await?;

        let Some(pr) = found else {
            debug!(sha, "no labeled pull request has this head");
            return Ok(Action::Nop);
        };

        match pr.mergeable_state {
            MergeableState::Clean => merge(self.platform(), &pr).await,
            MergeableState::Blocked => {
                info!(number = pr.number, "pull request blocked, looking for a sibling to rebase");
                self.rebase_behind_sibling(ctx, &pr.base_ref, pr.number).await
            }
            _ => Ok(Action::Nop),
        }
    }

    /// Someone commented `/rebase` on pull request `number`
    async fn on_rebase_command(
        &self,
        ctx: &RunContext,
        number: u64,
        author: &str,
    ) -> Result<Action> {
        let permission = self.platform().get_permission(author).await?;
        if !(self.authorize)(permission) {
            info!(number, author, permission = %permission, "one-time rebase denied");
            self.platform()
                .create_comment(number, &denied_comment(author, permission))
                .await?;
            return Ok(Action::DenyOneTimeRebase {
                pull_request: number,
            });
        }

        let pr = self.platform().get_pull_request(number).await?;
        if !pr.is_open() {
            return Ok(Action::Nop);
        }
        info!(number, author, "one-time rebase requested");
        rebase(self.platform(), ctx, &pr, self.lock_for(&pr)).await
    }

    /// A pull request was opened, pushed to or labeled
    ///
    /// The label is checked on the event, not on a fresh fetch: while another
    /// run holds the lock the label is gone, and this run has to reach the lock
    /// to come back with `Abort`.
    async fn on_pull_request_changed(
        &self,
        ctx: &RunContext,
        event_pr: &PullRequestRef,
    ) -> Result<Action> {
        let number = event_pr.number;
        let labeled = event_pr.has_label(self.label()) && event_pr.is_open();
        if !labeled && !self.force_rebase {
            debug!(number, "pull request not labeled");
            return Ok(Action::Nop);
        }

        let pr = resolve_mergeable_state(self.platform(), number, &self.settings.mergeable_state)
            .await?;
        let rebaseable = event_pr.rebaseable.unwrap_or(pr.rebaseable);
        let eligible = pr.is_open() && (self.force_rebase || rebaseable);
        if !eligible {
            debug!(number, "pull request not eligible");
            return Ok(Action::Nop);
        }
        self.apply_policy(ctx, &pr, labeled.then_some(self.label())).await
    }

    async fn on_review_submitted(&self, number: u64) -> Result<Action> {
        let pr = resolve_mergeable_state(self.platform(), number, &self.settings.mergeable_state)
            .await?;
        if is_mergeable(&pr, self.label()) {
            merge(self.platform(), &pr).await
        } else {
            Ok(Action::Nop)
        }
    }

    async fn apply_policy(
        &self,
        ctx: &RunContext,
        pr: &PullRequest,
        lock: Option<&str>,
    ) -> Result<Action> {
        let needs_rebase = self.force_rebase
            || needs_autosquash(&self.platform().list_pull_request_commits(pr.number).await?);

        let decision = decide(pr.mergeable_state, needs_rebase);
        info!(number = pr.number, state = %pr.mergeable_state, ?decision, "policy decided");

        match decision {
            PolicyDecision::Rebase => rebase(self.platform(), ctx, pr, lock).await,
            PolicyDecision::Merge => merge(self.platform(), pr).await,
            PolicyDecision::Nothing => Ok(Action::Nop),
        }
    }

    /// Rebase the oldest `behind` pull request on `base` other than `sibling_of`
    async fn rebase_behind_sibling(
        &self,
        ctx: &RunContext,
        base: &str,
        sibling_of: u64,
    ) -> Result<Action> {
        let label = self.label();
        let qualifiers = [format!("base:{base}")];
        self.wait_for_search_index().await;

        let found = find_oldest_pull_request(
            self.platform(),
            SearchRequest {
                label,
                qualifiers: &qualifiers,
            },
            &self.settings.mergeable_state,
            |pr| pr.number != sibling_of && is_behind(pr, label),
        )
        .await?;

        match found {
            Some(pr) => rebase(self.platform(), ctx, &pr, Some(label)).await,
            None => {
                debug!(base, "no behind pull request on base");
                Ok(Action::Nop)
            }
        }
    }

    /// The lock is the label, so only labeled pull requests can be locked
    fn lock_for<'a>(&'a self, pr: &PullRequest) -> Option<&'a str> {
        let label = self.label();
        pr.has_label(label).then_some(label)
    }

    async fn wait_for_search_index(&self) {
        let delay = self.settings.search_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

impl std::fmt::Debug for Autorebase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Autorebase")
            .field("platform", self.platform.config())
            .field("settings", &self.settings)
            .field("force_rebase", &self.force_rebase)
            .finish_non_exhaustive()
    }
}
