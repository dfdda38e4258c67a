//! Settings for the decision engine, loaded from TOML
//!
//! ```toml
//! label = "autorebase"
//! search_delay_ms = 0
//! allow_maintainers = true
//!
//! [mergeable_state]
//! interval_ms = 500
//! max_attempts = 120
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Label used when none is configured
pub const DEFAULT_LABEL: &str = "autorebase";

/// GitHub is asked again no sooner than this after reporting `unknown`
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// How the mergeable-state resolver polls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Polling {
    /// Delay between fetches, raised to [`MIN_POLL_INTERVAL`] if lower
    pub interval_ms: u64,
    /// Give up after this many fetches; 0 retries forever
    pub max_attempts: u32,
}

impl Default for Polling {
    fn default() -> Self {
        Self {
            interval_ms: 500,
            max_attempts: 120,
        }
    }
}

impl Polling {
    /// Delay between two fetches
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms).max(MIN_POLL_INTERVAL)
    }

    /// Attempt ceiling, `None` when unbounded
    pub const fn max_attempts(&self) -> Option<u32> {
        if self.max_attempts == 0 {
            None
        } else {
            Some(self.max_attempts)
        }
    }
}

/// Engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Label that opts a pull request in and doubles as its lock
    pub label: String,
    /// Mergeable-state polling
    pub mergeable_state: Polling,
    /// Wait before querying the search index, which lags behind writes
    pub search_delay_ms: u64,
    /// Whether `maintain` permission may request one-time rebases
    pub allow_maintainers: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            label: DEFAULT_LABEL.to_string(),
            mergeable_state: Polling::default(),
            search_delay_ms: 0,
            allow_maintainers: true,
        }
    }
}

impl Settings {
    /// Parse settings from a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from disk
    ///
    /// Returns the defaults if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

        let settings: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Delay before the first search query
    pub const fn search_delay(&self) -> Duration {
        Duration::from_millis(self.search_delay_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.label.trim().is_empty() {
            return Err(Error::Config("label must not be empty".to_string()));
        }
        Ok(())
    }
}
