//! autorebase - keep labeled pull requests rebased and merge them when green
//!
//! A pull request carrying the configured label is rebased onto its base
//! whenever the base moves on, and merged without a merge commit once GitHub
//! reports it `clean`. All git work happens through GitHub's object and
//! reference API: no clone, no git binary.
//!
//! # Architecture
//!
//! - [`git`]: cherry-pick and rebase built from blob/tree/commit/ref primitives
//! - [`pulls`]: mergeable-state polling and oldest-first pull request search
//! - [`lock`]: the label as a per-pull-request mutex
//! - [`engine`]: the event to action state machine ([`Autorebase`])
//! - [`platform`]: the [`PlatformService`] trait and its GitHub implementation
//!
//! # Example
//!
//! ```no_run
//! use autorebase::{Autorebase, Event, GitHubService, RunContext, Settings};
//! use std::sync::Arc;
//!
//! # async fn handle(payload: serde_json::Value) -> autorebase::Result<()> {
//! let token = autorebase::auth::github_token()?;
//! let platform = GitHubService::new(&token, "octo-org".into(), "octo-repo".into(), None)?;
//! let engine = Autorebase::new(Arc::new(platform), Settings::default());
//!
//! let event = Event::from_webhook("pull_request", &payload)?;
//! let action = engine.run(&event, &RunContext::new("delivery-id")).await?;
//! println!("{action}");
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod event;
pub mod git;
pub mod lock;
pub mod platform;
pub mod pulls;
pub mod types;

pub use config::Settings;
pub use context::{RebaseHooks, RunContext};
pub use engine::{Authorization, Autorebase};
pub use error::{Error, Result};
pub use event::Event;
pub use platform::{GitHubService, PlatformService};
pub use types::{Action, MergeableState, Permission, PullRequest};
