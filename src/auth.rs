//! Authentication for GitHub
//!
//! Tokens come from the environment; the surrounding service decides how they
//! get there (app installation token, personal token, Actions token).

use crate::error::{Error, Result};
use std::env;

/// Environment variables checked for a token, in order
pub const TOKEN_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// Read a GitHub token from the environment
pub fn github_token() -> Result<String> {
    token_from(|var| env::var(var).ok())
}

/// Resolve a token through `lookup`, trying [`TOKEN_VARS`] in order.
///
/// Blank values are skipped.
pub fn token_from(lookup: impl Fn(&str) -> Option<String>) -> Result<String> {
    TOKEN_VARS
        .iter()
        .filter_map(|var| lookup(var))
        .map(|token| token.trim().to_string())
        .find(|token| !token.is_empty())
        .ok_or_else(|| {
            Error::Auth(format!(
                "no GitHub token found, set {}",
                TOKEN_VARS.join(" or ")
            ))
        })
}
