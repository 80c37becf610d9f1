//! Run configuration: target site, timeouts and browser launch settings.

use crate::result::{ScoutError, ScoutResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default site under test
pub const DEFAULT_BASE_URL: &str = "https://www.eventbrite.com";

/// Default auto-wait budget for strict actions (5 seconds)
pub const DEFAULT_ACTION_TIMEOUT_MS: u64 = 5_000;

/// Default budget for navigation quiescence (30 seconds)
pub const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Quiet window that counts as network idle (500ms)
pub const DEFAULT_NETWORK_IDLE_MS: u64 = 500;

/// Environment variable overriding the base URL
pub const ENV_BASE_URL: &str = "EVENTSCOUT_BASE_URL";

/// Environment variable overriding headless mode
pub const ENV_HEADLESS: &str = "EVENTSCOUT_HEADLESS";

/// Environment variable pointing at a Chromium binary
pub const ENV_CHROMIUM_PATH: &str = "CHROMIUM_PATH";

/// Configuration shared by a page context and its page objects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    /// Origin that relative navigation paths resolve against
    pub base_url: String,
    /// Auto-wait budget for click/fill/text reads
    pub action_timeout_ms: u64,
    /// Budget for a navigation to reach network quiescence
    pub navigation_timeout_ms: u64,
    /// Polling interval for every wait
    pub poll_interval_ms: u64,
    /// Quiet window that counts as network idle
    pub network_idle_ms: u64,
    /// Run the browser headless
    pub headless: bool,
    /// Chromium sandbox (disable for containers)
    pub sandbox: bool,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            action_timeout_ms: DEFAULT_ACTION_TIMEOUT_MS,
            navigation_timeout_ms: DEFAULT_NAVIGATION_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            network_idle_ms: DEFAULT_NETWORK_IDLE_MS,
            headless: true,
            sandbox: true,
            chromium_path: None,
        }
    }
}

impl ScoutConfig {
    /// Create new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from YAML; missing keys take their defaults
    pub fn from_yaml_str(yaml: &str) -> ScoutResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> ScoutResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Apply `EVENTSCOUT_BASE_URL`, `EVENTSCOUT_HEADLESS` and `CHROMIUM_PATH`
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.base_url = url;
        }
        if let Some(flag) = lookup(ENV_HEADLESS) {
            match flag.trim().to_ascii_lowercase().as_str() {
                "0" | "false" | "no" => self.headless = false,
                "1" | "true" | "yes" => self.headless = true,
                _ => {}
            }
        }
        if let Some(path) = lookup(ENV_CHROMIUM_PATH).filter(|v| !v.trim().is_empty()) {
            self.chromium_path = Some(path);
        }
        self
    }

    /// Check that the configuration is usable
    pub fn validate(&self) -> ScoutResult<()> {
        self.parsed_base_url()?;
        if self.poll_interval_ms == 0 {
            return Err(ScoutError::Config {
                message: "poll_interval_ms must be greater than zero".to_string(),
            });
        }
        if self.network_idle_ms >= self.navigation_timeout_ms {
            return Err(ScoutError::Config {
                message: format!(
                    "network_idle_ms ({}) must be shorter than navigation_timeout_ms ({})",
                    self.network_idle_ms, self.navigation_timeout_ms
                ),
            });
        }
        Ok(())
    }

    /// Base URL as a parsed `Url`
    pub fn parsed_base_url(&self) -> ScoutResult<Url> {
        Url::parse(&self.base_url).map_err(|e| ScoutError::Config {
            message: format!("invalid base_url {:?}: {e}", self.base_url),
        })
    }

    /// Set base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set action timeout
    #[must_use]
    pub const fn with_action_timeout(mut self, timeout_ms: u64) -> Self {
        self.action_timeout_ms = timeout_ms;
        self
    }

    /// Set navigation timeout
    #[must_use]
    pub const fn with_navigation_timeout(mut self, timeout_ms: u64) -> Self {
        self.navigation_timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Set network idle window
    #[must_use]
    pub const fn with_network_idle(mut self, idle_ms: u64) -> Self {
        self.network_idle_ms = idle_ms;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Action timeout as Duration
    #[must_use]
    pub const fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms)
    }

    /// Navigation timeout as Duration
    #[must_use]
    pub const fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }
}
