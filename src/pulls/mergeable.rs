//! Waiting for GitHub to finish computing a pull request's mergeable state

use crate::config::Polling;
use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{MergeableState, PullRequest};
use tracing::debug;

/// Fetch a pull request until its mergeable state is known
///
/// A closed pull request is returned as soon as it is seen, whatever its
/// state. Every attempt is a fresh fetch: right after a ref update GitHub can
/// briefly report a stale `clean` or `unstable` where the truth is `behind`,
/// so values from payloads or earlier responses are never reused.
pub async fn resolve_mergeable_state(
    platform: &dyn PlatformService,
    number: u64,
    polling: &Polling,
) -> Result<PullRequest> {
    let mut attempts = 0;
    loop {
        let pr = platform.get_pull_request(number).await?;
        attempts += 1;

        if !pr.is_open() || pr.mergeable_state != MergeableState::Unknown {
            debug!(number, state = %pr.mergeable_state, attempts, "mergeable state resolved");
            return Ok(pr);
        }

        if polling.max_attempts().is_some_and(|max| attempts >= max) {
            return Err(Error::MergeableStateUnknown { number, attempts });
        }

        debug!(number, attempts, "mergeable state unknown, retrying");
        tokio::time::sleep(polling.interval()).await;
    }
}
