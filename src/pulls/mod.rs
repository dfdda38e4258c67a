//! Reading pull requests despite GitHub's eventual consistency

mod mergeable;
mod search;

pub use mergeable::resolve_mergeable_state;
pub use search::{SearchRequest, find_oldest_pull_request, search_query};
