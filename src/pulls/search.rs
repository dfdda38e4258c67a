//! Finding the oldest pull request that satisfies a predicate

use crate::config::Polling;
use crate::error::Result;
use crate::platform::PlatformService;
use crate::pulls::resolve_mergeable_state;
use crate::types::PullRequest;
use tracing::debug;

/// What to search for
#[derive(Debug, Clone, Copy)]
pub struct SearchRequest<'a> {
    /// Label the pull request must carry
    pub label: &'a str,
    /// Extra search qualifiers, e.g. a commit SHA or `base:main`
    pub qualifiers: &'a [String],
}

/// Build the search query for open pull requests carrying `label`
pub fn search_query(request: SearchRequest<'_>) -> String {
    let mut query = format!("is:pr is:open label:\"{}\"", request.label);
    for qualifier in request.qualifiers {
        query.push(' ');
        query.push_str(qualifier);
    }
    query
}

/// Return the oldest open pull request matching the search and `predicate`
///
/// Candidates are checked one at a time, oldest first, each with a fresh
/// fetch and a resolved mergeable state. The scan stops at the first match,
/// so later candidates and pages are never fetched.
pub async fn find_oldest_pull_request<P>(
    platform: &dyn PlatformService,
    request: SearchRequest<'_>,
    polling: &Polling,
    predicate: P,
) -> Result<Option<PullRequest>>
where
    P: Fn(&PullRequest) -> bool + Send,
{
    let query = search_query(request);
    let mut page = 1;

    loop {
        let results = platform.search_pull_requests(&query, page).await?;
        debug!(query = %query, page, found = results.numbers.len(), "search page");

        for number in results.numbers {
            let pr = resolve_mergeable_state(platform, number, polling).await?;
            if predicate(&pr) {
                debug!(number, "search matched");
                return Ok(Some(pr));
            }
        }

        if !results.has_next_page {
            return Ok(None);
        }
        page += 1;
    }
}
