//! Per-invocation context
//!
//! A `RunContext` is created for every inbound event and passed down through
//! the decision engine and the git engines. It carries the tracing span the
//! run's logs are attributed to and the optional hooks tests use to force
//! interleavings between concurrent runs.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{Span, info_span};

/// Callbacks invoked at fixed points of a rebase
///
/// Every method defaults to doing nothing. Tests implement them to mutate the
/// remote host or to yield to a concurrently running invocation at exactly the
/// point where a race matters.
#[async_trait]
pub trait RebaseHooks: Send + Sync {
    /// Called after all commits were applied, right before the target ref is updated
    async fn before_ref_update(&self, _reference: &str) {}

    /// Called right after the label lock on a pull request was acquired
    async fn after_lock_acquired(&self, _number: u64) {}
}

struct NoHooks;

impl RebaseHooks for NoHooks {}

/// Context handle for a single decision engine run
#[derive(Clone)]
pub struct RunContext {
    span: Span,
    hooks: Arc<dyn RebaseHooks>,
}

impl RunContext {
    /// Context for one webhook delivery
    pub fn new(delivery: &str) -> Self {
        Self {
            span: info_span!("autorebase.run", delivery = %delivery),
            hooks: Arc::new(NoHooks),
        }
    }

    /// Replace the hooks
    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn RebaseHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Span every log line of this run is recorded under
    pub const fn span(&self) -> &Span {
        &self.span
    }

    /// Hooks for this run
    pub fn hooks(&self) -> &dyn RebaseHooks {
        self.hooks.as_ref()
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new("local")
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("span", &self.span)
            .finish_non_exhaustive()
    }
}
