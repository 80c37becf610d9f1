//! Wait Mechanisms
//!
//! Playwright-compatible waits for synchronization. Every wait is a polling
//! loop on `tokio::time` with an explicit timeout; a probe error ends the
//! wait immediately, only an unmet condition times out.

use crate::config::ScoutConfig;
use crate::driver::NetworkActivity;
use crate::result::{ScoutError, ScoutResult};
use regex::Regex;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

// =============================================================================
// LOAD STATE
// =============================================================================

/// How far a navigation must progress before it returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadState {
    /// The engine reported the document loaded
    Load,
    /// Additionally, no network activity for the idle window
    #[default]
    NetworkIdle,
}

impl LoadState {
    /// Playwright name for this load state
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::NetworkIdle => "networkidle",
        }
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.event_name())
    }
}

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: crate::config::DEFAULT_ACTION_TIMEOUT_MS,
            poll_interval_ms: crate::config::DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Action-timeout options from a config
    #[must_use]
    pub const fn for_actions(config: &ScoutConfig) -> Self {
        Self {
            timeout_ms: config.action_timeout_ms,
            poll_interval_ms: config.poll_interval_ms,
        }
    }

    /// Navigation-timeout options from a config
    #[must_use]
    pub const fn for_navigation(config: &ScoutConfig) -> Self {
        Self {
            timeout_ms: config.navigation_timeout_ms,
            poll_interval_ms: config.poll_interval_ms,
        }
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// WAIT RESULT
// =============================================================================

/// Result of a successful wait
#[derive(Debug, Clone)]
pub struct WaitResult<T> {
    /// Value produced by the satisfied probe
    pub value: T,
    /// Time spent waiting
    pub elapsed: Duration,
    /// Description of what was waited for
    pub waited_for: String,
}

// =============================================================================
// URL PATTERN
// =============================================================================

/// URL pattern for navigation waits
#[derive(Debug, Clone)]
pub enum UrlPattern {
    /// Exact URL match
    Exact(String),
    /// Prefix match
    Prefix(String),
    /// Contains substring
    Contains(String),
    /// Regex match
    Regex(Regex),
    /// Glob pattern (e.g., "**/music/**")
    Glob(String),
    /// Match any URL
    Any,
}

impl UrlPattern {
    /// Compile a regex pattern
    pub fn regex(pattern: &str) -> ScoutResult<Self> {
        Ok(Self::Regex(Regex::new(pattern)?))
    }

    /// Glob pattern
    #[must_use]
    pub fn glob(pattern: impl Into<String>) -> Self {
        Self::Glob(pattern.into())
    }

    /// Check if a URL matches this pattern
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Self::Exact(pattern) => url == pattern,
            Self::Prefix(pattern) => url.starts_with(pattern.as_str()),
            Self::Contains(pattern) => url.contains(pattern.as_str()),
            Self::Regex(re) => re.is_match(url),
            Self::Glob(pattern) => Self::glob_matches(pattern, url),
            Self::Any => true,
        }
    }

    /// Simple glob matching for URLs; `*` and `**` both match any run of characters.
    ///
    /// The first literal is anchored at the start and the last at the end;
    /// literals in between match leftmost.
    fn glob_matches(pattern: &str, url: &str) -> bool {
        let parts: Vec<&str> = pattern.split('*').collect();
        let last = parts.len() - 1;
        let mut pos = 0;
        for (i, part) in parts.iter().enumerate() {
            if part.is_empty() {
                continue;
            }
            if i == 0 {
                if !url.starts_with(part) {
                    return false;
                }
                pos = part.len();
            } else if i == last {
                return url[pos..].ends_with(part);
            } else {
                match url[pos..].find(part) {
                    Some(found) => pos += found + part.len(),
                    None => return false,
                }
            }
        }

        pattern.ends_with('*') || pos == url.len()
    }
}

impl fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(p) => write!(f, "URL {p:?}"),
            Self::Prefix(p) => write!(f, "URL starting with {p:?}"),
            Self::Contains(p) => write!(f, "URL containing {p:?}"),
            Self::Regex(re) => write!(f, "URL matching /{}/", re.as_str()),
            Self::Glob(p) => write!(f, "URL matching {p:?}"),
            Self::Any => write!(f, "any URL"),
        }
    }
}

// =============================================================================
// POLLING
// =============================================================================

/// Poll `probe` until it yields `Some`, at least once, until the timeout.
///
/// # Errors
///
/// Returns the probe's first error unchanged, or `Timeout` when the deadline
/// passes without a value.
pub async fn poll_until<T, F, Fut>(
    options: &WaitOptions,
    waited_for: &str,
    mut probe: F,
) -> ScoutResult<WaitResult<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ScoutResult<Option<T>>>,
{
    let start = Instant::now();
    let timeout = options.timeout();
    loop {
        if let Some(value) = probe().await? {
            return Ok(WaitResult {
                value,
                elapsed: start.elapsed(),
                waited_for: waited_for.to_string(),
            });
        }
        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return Err(ScoutError::Timeout {
                waited_for: waited_for.to_string(),
                ms: options.timeout_ms,
            });
        }
        let remaining = timeout.saturating_sub(elapsed);
        tokio::time::sleep(options.poll_interval().min(remaining)).await;
    }
}

// =============================================================================
// NETWORK IDLE
// =============================================================================

/// Tracks successive network samples; idle once nothing is in flight and the
/// completed counter has not moved for the quiet window.
#[derive(Debug, Clone)]
pub struct NetworkIdleTracker {
    quiet_window: Duration,
    last_completed: Option<u64>,
    quiet_since: Option<Instant>,
}

impl NetworkIdleTracker {
    /// Create a tracker with the given quiet window
    #[must_use]
    pub const fn new(quiet_window: Duration) -> Self {
        Self {
            quiet_window,
            last_completed: None,
            quiet_since: None,
        }
    }

    /// Feed a sample taken at `now`; returns true once idle
    pub fn observe(&mut self, activity: NetworkActivity, now: Instant) -> bool {
        let moved = self
            .last_completed
            .is_some_and(|last| last != activity.completed);
        self.last_completed = Some(activity.completed);

        if !activity.is_quiet() || moved {
            self.quiet_since = None;
            if !activity.is_quiet() {
                return false;
            }
        }

        let since = *self.quiet_since.get_or_insert(now);
        now.duration_since(since) >= self.quiet_window
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::cell::Cell;

    mod wait_options_tests {
        use super::*;

        #[test]
        fn test_wait_options_default() {
            let opts = WaitOptions::default();
            assert_eq!(opts.timeout_ms, 5_000);
            assert_eq!(opts.poll_interval_ms, 50);
        }

        #[test]
        fn test_wait_options_chained() {
            let opts = WaitOptions::new().with_timeout(10_000).with_poll_interval(200);
            assert_eq!(opts.timeout(), Duration::from_secs(10));
            assert_eq!(opts.poll_interval(), Duration::from_millis(200));
        }

        #[test]
        fn test_from_config() {
            let config = ScoutConfig::new()
                .with_action_timeout(123)
                .with_navigation_timeout(456)
                .with_poll_interval(7);
            assert_eq!(WaitOptions::for_actions(&config).timeout_ms, 123);
            assert_eq!(WaitOptions::for_navigation(&config).timeout_ms, 456);
            assert_eq!(WaitOptions::for_navigation(&config).poll_interval_ms, 7);
        }
    }

    mod load_state_tests {
        use super::*;

        #[test]
        fn test_load_state_names() {
            assert_eq!(LoadState::Load.to_string(), "load");
            assert_eq!(LoadState::NetworkIdle.to_string(), "networkidle");
            assert_eq!(LoadState::default(), LoadState::NetworkIdle);
        }
    }

    mod url_pattern_tests {
        use super::*;

        #[test]
        fn test_exact_prefix_contains() {
            let url = "https://www.eventbrite.com/d/co--denver/music/";
            assert!(UrlPattern::Exact(url.into()).matches(url));
            assert!(UrlPattern::Prefix("https://www.eventbrite.com".into()).matches(url));
            assert!(UrlPattern::Contains("/music/".into()).matches(url));
            assert!(!UrlPattern::Contains("/food/".into()).matches(url));
            assert!(UrlPattern::Any.matches(url));
        }

        #[test]
        fn test_glob_double_star() {
            let pattern = UrlPattern::glob("**/music/**");
            assert!(pattern.matches("https://www.eventbrite.com/d/co--denver/music/"));
            assert!(!pattern.matches("https://www.eventbrite.com/d/co--denver/all-events/"));
        }

        #[test]
        fn test_glob_anchored_start_and_end() {
            let pattern = UrlPattern::glob("https://site/*/events");
            assert!(pattern.matches("https://site/d/events"));
            assert!(!pattern.matches("https://site/d/events/extra"));
            assert!(!pattern.matches("http://other/https://site/d/events"));
        }

        #[test]
        fn test_glob_trailing_literal_matches_last_occurrence() {
            let pattern = UrlPattern::glob("**/events");
            let url = "https://events.test/d/events/denver/events";
            assert!(pattern.matches(url));
            assert!(!pattern.matches("https://events.test/d/events/denver"));

            let anchored = UrlPattern::glob("https://site/*/events");
            assert!(anchored.matches("https://site/events/d/events"));
            assert!(!UrlPattern::glob("ab*b").matches("ab"));
        }

        #[tokio::test]
        async fn test_wait_for_url_glob_with_repeated_segment() {
            let options = WaitOptions::new()
                .with_timeout(50)
                .with_poll_interval(5);
            let pattern = UrlPattern::glob("**/events");
            let url = "https://events.test/d/events/denver/events";
            let seen = poll_until(&options, &pattern.to_string(), || async {
                Ok(pattern.matches(url).then(|| url.to_string()))
            })
            .await
            .unwrap();
            assert_eq!(seen.value, url);
        }

        #[test]
        fn test_regex() {
            let pattern = UrlPattern::regex(r"/d/.*/events").unwrap();
            assert!(pattern.matches("https://x/d/co--denver/events--today/"));
            assert!(UrlPattern::regex("(").is_err());
        }

        #[test]
        fn test_display() {
            assert_eq!(
                UrlPattern::glob("**/music/**").to_string(),
                "URL matching \"**/music/**\""
            );
        }
    }

    mod poll_tests {
        use super::*;

        #[tokio::test]
        async fn test_immediate_success() {
            let opts = WaitOptions::new().with_timeout(0);
            let result = poll_until(&opts, "ready", || async { Ok(Some(42)) })
                .await
                .unwrap();
            assert_eq!(result.value, 42);
            assert_eq!(result.waited_for, "ready");
        }

        #[tokio::test]
        async fn test_succeeds_after_polls() {
            let calls = Cell::new(0);
            let opts = WaitOptions::new().with_timeout(1_000).with_poll_interval(1);
            let result = poll_until(&opts, "third poll", || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move { Ok((n >= 3).then_some(n)) }
            })
            .await
            .unwrap();
            assert_eq!(result.value, 3);
        }

        #[tokio::test]
        async fn test_timeout() {
            let opts = WaitOptions::new().with_timeout(20).with_poll_interval(5);
            let err = poll_until(&opts, "never", || async { Ok(None::<()>) })
                .await
                .unwrap_err();
            assert!(err.is_timeout());
            assert!(err.to_string().contains("never"));
        }

        #[tokio::test]
        async fn test_condition_error_is_not_retried() {
            let calls = Cell::new(0);
            let opts = WaitOptions::new().with_timeout(1_000).with_poll_interval(1);
            let err = poll_until(&opts, "boom", || {
                calls.set(calls.get() + 1);
                async { Err::<Option<()>, _>(ScoutError::PageClosed) }
            })
            .await
            .unwrap_err();
            assert!(matches!(err, ScoutError::PageClosed));
            assert_eq!(calls.get(), 1);
        }
    }

    mod network_idle_tests {
        use super::*;

        fn sample(in_flight: usize, completed: u64) -> NetworkActivity {
            NetworkActivity {
                in_flight,
                completed,
            }
        }

        #[test]
        fn test_zero_window_idle_on_first_quiet_sample() {
            let mut tracker = NetworkIdleTracker::new(Duration::ZERO);
            assert!(tracker.observe(sample(0, 3), Instant::now()));
        }

        #[test]
        fn test_in_flight_is_never_idle() {
            let mut tracker = NetworkIdleTracker::new(Duration::ZERO);
            assert!(!tracker.observe(sample(1, 0), Instant::now()));
        }

        #[test]
        fn test_window_must_elapse() {
            let t0 = Instant::now();
            let mut tracker = NetworkIdleTracker::new(Duration::from_millis(500));
            assert!(!tracker.observe(sample(0, 1), t0));
            assert!(!tracker.observe(sample(0, 1), t0 + Duration::from_millis(200)));
            assert!(tracker.observe(sample(0, 1), t0 + Duration::from_millis(500)));
        }

        #[test]
        fn test_completed_movement_resets_window() {
            let t0 = Instant::now();
            let mut tracker = NetworkIdleTracker::new(Duration::from_millis(500));
            assert!(!tracker.observe(sample(0, 1), t0));
            assert!(!tracker.observe(sample(0, 2), t0 + Duration::from_millis(400)));
            assert!(!tracker.observe(sample(0, 2), t0 + Duration::from_millis(800)));
            assert!(tracker.observe(sample(0, 2), t0 + Duration::from_millis(900)));
        }
    }
}
