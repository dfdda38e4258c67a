//! Remote git operations
//!
//! Cherry-pick and rebase implemented purely with the host's object and
//! reference primitives: no clone, no git binary.

mod autosquash;
mod cherry_pick;
mod rebase;

pub use autosquash::{RebaseStep, needs_autosquash, plan_steps};
pub use cherry_pick::{CherryPick, cherry_pick};
pub use rebase::rebase_pull_request;
