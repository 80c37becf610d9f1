//! Page context: locator evaluation, strict actions and waits.
//!
//! [`Page`] owns a [`PageDriver`] and is the only place a [`Locator`] is ever
//! evaluated. Evaluation is live: the scope chain is resolved first (an
//! empty container short-circuits to zero matches), then the selector is
//! queried inside it, then the locator's steps run in order.
//!
//! Strict actions (`click`, `fill`, `text_content`, `input_value`) auto-wait
//! up to the action timeout for exactly one visible match:
//!
//! | Observed             | Outcome                          |
//! |----------------------|----------------------------------|
//! | 0 matches at deadline| `ElementNotFound`                |
//! | more than 1 match    | `Ambiguous`, immediately         |
//! | 1 hidden at deadline | `Timeout`                        |

use crate::config::ScoutConfig;
use crate::driver::{ElementHandle, PageDriver};
use crate::locator::{FallbackChoice, Locator, LocatorFactory, Step};
use crate::result::{ScoutError, ScoutResult};
use crate::role::{AriaRole, TextMatch};
use crate::wait::{poll_until, LoadState, NetworkIdleTracker, UrlPattern, WaitOptions};
use futures::future::BoxFuture;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

/// A browsing context plus the configuration it is driven with
#[derive(Debug)]
pub struct Page<D: PageDriver> {
    driver: D,
    config: ScoutConfig,
    base_url: Url,
}

impl<D: PageDriver> Page<D> {
    /// Wrap a driver; the config is validated here
    pub fn new(driver: D, config: ScoutConfig) -> ScoutResult<Self> {
        config.validate()?;
        let base_url = config.parsed_base_url()?;
        Ok(Self {
            driver,
            config,
            base_url,
        })
    }

    /// The underlying engine
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &ScoutConfig {
        &self.config
    }

    /// Origin relative paths resolve against
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Default options for element waits
    #[must_use]
    pub const fn action_wait(&self) -> WaitOptions {
        WaitOptions::for_actions(&self.config)
    }

    // =========================================================================
    // NAVIGATION
    // =========================================================================

    /// Navigate to `path` (relative to the base URL) and wait for network idle
    pub async fn goto(&self, path: &str) -> ScoutResult<()> {
        self.goto_until(path, LoadState::NetworkIdle).await
    }

    /// Navigate to `path` and wait for the given load state
    pub async fn goto_until(&self, path: &str, state: LoadState) -> ScoutResult<()> {
        let url = self.base_url.join(path)?;
        info!(url = %url, until = %state, "navigating");
        self.driver.goto(url.as_str()).await?;
        if state == LoadState::NetworkIdle {
            self.wait_for_network_idle().await?;
        }
        Ok(())
    }

    /// Current URL
    pub async fn url(&self) -> ScoutResult<String> {
        self.driver.current_url().await
    }

    /// Wait until the current URL matches `pattern`, within the navigation timeout
    pub async fn wait_for_url(&self, pattern: &UrlPattern) -> ScoutResult<String> {
        let options = WaitOptions::for_navigation(&self.config);
        let result = poll_until(&options, &pattern.to_string(), || async move {
            let url = self.driver.current_url().await?;
            Ok(pattern.matches(&url).then_some(url))
        })
        .await?;
        Ok(result.value)
    }

    /// Wait until nothing is in flight for the configured quiet window
    pub async fn wait_for_network_idle(&self) -> ScoutResult<()> {
        let options = WaitOptions::for_navigation(&self.config);
        let mut tracker =
            NetworkIdleTracker::new(Duration::from_millis(self.config.network_idle_ms));
        let start = Instant::now();
        loop {
            let activity = self.driver.network_activity().await?;
            if tracker.observe(activity, Instant::now()) {
                debug!(elapsed = ?start.elapsed(), "network idle");
                return Ok(());
            }
            let elapsed = start.elapsed();
            if elapsed >= options.timeout() {
                return Err(ScoutError::Timeout {
                    waited_for: "network idle".to_string(),
                    ms: options.timeout_ms,
                });
            }
            let remaining = options.timeout().saturating_sub(elapsed);
            tokio::time::sleep(options.poll_interval().min(remaining)).await;
        }
    }

    // =========================================================================
    // REGISTRY
    // =========================================================================

    /// Locator for `role` with an accessible name, optionally inside `scope`
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn bind(
        &self,
        role: AriaRole,
        name: impl Into<TextMatch>,
        scope: Option<&Locator>,
    ) -> Locator {
        let locator = Locator::role(role).named(name);
        match scope {
            Some(scope) => locator.within(scope),
            None => locator,
        }
    }

    /// Factory for `role` elements named at call time
    #[must_use]
    #[allow(clippy::unused_self)]
    pub const fn bind_dynamic(&self, role: AriaRole) -> LocatorFactory {
        LocatorFactory::new(role)
    }

    /// Factory for `role` elements named at call time, inside `scope`
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn bind_dynamic_within(&self, scope: &Locator, role: AriaRole) -> LocatorFactory {
        LocatorFactory::within(scope, role)
    }

    /// Pick `primary` if it matches anything right now, else `fallback`.
    ///
    /// The fallback is never evaluated; it is chosen even if it too would
    /// match nothing.
    pub async fn resolve_with_fallback(
        &self,
        primary: &Locator,
        fallback: &Locator,
    ) -> ScoutResult<FallbackChoice> {
        let count = self.count(primary).await?;
        if count > 0 {
            debug!(locator = %primary, count, "primary locator chosen");
            Ok(FallbackChoice::Primary(primary.clone()))
        } else {
            warn!(primary = %primary, fallback = %fallback, "primary locator matched nothing, using fallback");
            Ok(FallbackChoice::Fallback(fallback.clone()))
        }
    }

    /// Number of current matches; never waits
    pub async fn count(&self, locator: &Locator) -> ScoutResult<usize> {
        Ok(self.resolve(locator).await?.len())
    }

    /// Whether there is at least one current match; never waits
    pub async fn exists(&self, locator: &Locator) -> ScoutResult<bool> {
        Ok(self.count(locator).await? > 0)
    }

    /// Bind a locator to this page for fluent use
    #[must_use]
    pub fn locate(&self, locator: Locator) -> PageLocator<'_, D> {
        PageLocator {
            page: self,
            locator,
        }
    }

    /// Elements matching a CSS selector
    #[must_use]
    pub fn locator(&self, css: impl Into<String>) -> PageLocator<'_, D> {
        self.locate(Locator::css(css))
    }

    /// Elements by role and optional accessible name
    #[must_use]
    pub fn get_by_role(&self, role: AriaRole, name: Option<TextMatch>) -> PageLocator<'_, D> {
        let locator = Locator::role(role);
        self.locate(match name {
            Some(name) => locator.named(name),
            None => locator,
        })
    }

    /// Elements by `data-testid`
    #[must_use]
    pub fn get_by_test_id(&self, id: impl Into<String>) -> PageLocator<'_, D> {
        self.locate(Locator::test_id(id))
    }

    // =========================================================================
    // EVALUATION
    // =========================================================================

    /// Every element the locator matches right now, in document order
    pub async fn resolve(&self, locator: &Locator) -> ScoutResult<Vec<ElementHandle>> {
        let matches = self.resolve_within(locator, None).await?;
        debug!(locator = %locator, count = matches.len(), "resolved");
        Ok(matches)
    }

    fn resolve_within<'a>(
        &'a self,
        locator: &'a Locator,
        roots: Option<&'a [ElementHandle]>,
    ) -> BoxFuture<'a, ScoutResult<Vec<ElementHandle>>> {
        Box::pin(async move {
            let containers;
            let within = match locator.scope() {
                Some(scope) => {
                    containers = self.resolve_within(scope, roots).await?;
                    if containers.is_empty() {
                        return Ok(Vec::new());
                    }
                    Some(containers.as_slice())
                }
                None => roots,
            };

            let mut matches = self.driver.query(locator.selector(), within).await?;
            for step in locator.steps() {
                matches = self.apply_step(step, matches).await?;
            }
            Ok(matches)
        })
    }

    async fn apply_step(
        &self,
        step: &Step,
        matches: Vec<ElementHandle>,
    ) -> ScoutResult<Vec<ElementHandle>> {
        Ok(match step {
            Step::Name(name) => matches.into_iter().filter(|h| name.matches(&h.name)).collect(),
            Step::HasText(text) => matches
                .into_iter()
                .filter(|h| h.text_content.as_deref().is_some_and(|t| text.matches(t)))
                .collect(),
            Step::Has(inner) => {
                let mut kept = Vec::with_capacity(matches.len());
                for candidate in matches {
                    let inside = self
                        .resolve_within(inner, Some(std::slice::from_ref(&candidate)))
                        .await?;
                    if !inside.is_empty() {
                        kept.push(candidate);
                    }
                }
                kept
            }
            Step::Nth(nth) => nth.pick(matches),
        })
    }

    /// Auto-wait for exactly one visible match
    async fn resolve_one(&self, locator: &Locator) -> ScoutResult<ElementHandle> {
        let options = self.action_wait();
        let start = Instant::now();
        loop {
            let mut matches = self.resolve(locator).await?;
            let found = matches.len();
            if found > 1 {
                return Err(ScoutError::Ambiguous {
                    locator: locator.to_string(),
                    count: found,
                });
            }
            if let Some(handle) = matches.pop().filter(|h| h.visible) {
                return Ok(handle);
            }

            let elapsed = start.elapsed();
            if elapsed >= options.timeout() {
                return Err(if found == 0 {
                    ScoutError::ElementNotFound {
                        locator: locator.to_string(),
                    }
                } else {
                    ScoutError::Timeout {
                        waited_for: format!("{locator} to be visible"),
                        ms: options.timeout_ms,
                    }
                });
            }
            let remaining = options.timeout().saturating_sub(elapsed);
            tokio::time::sleep(options.poll_interval().min(remaining)).await;
        }
    }

    // =========================================================================
    // ACTIONS
    // =========================================================================

    /// Click the single match
    pub async fn click(&self, locator: &Locator) -> ScoutResult<()> {
        let handle = self.resolve_one(locator).await?;
        debug!(locator = %locator, element = %handle.describe(), "click");
        self.driver.click(&handle).await
    }

    /// Replace the value of the single match
    pub async fn fill(&self, locator: &Locator, text: &str) -> ScoutResult<()> {
        let handle = self.resolve_one(locator).await?;
        debug!(locator = %locator, element = %handle.describe(), "fill");
        self.driver.fill(&handle, text).await
    }

    /// Text content of the single match
    pub async fn text_content(&self, locator: &Locator) -> ScoutResult<Option<String>> {
        let handle = self.resolve_one(locator).await?;
        self.driver.text_content(&handle).await
    }

    /// Current value of the single matching input
    pub async fn input_value(&self, locator: &Locator) -> ScoutResult<String> {
        let handle = self.resolve_one(locator).await?;
        self.driver.input_value(&handle).await
    }

    /// Whether the locator currently matches one visible element; never waits
    pub async fn is_visible(&self, locator: &Locator) -> ScoutResult<bool> {
        let matches = self.resolve(locator).await?;
        match matches.as_slice() {
            [] => Ok(false),
            [only] => Ok(only.visible),
            _ => Err(ScoutError::Ambiguous {
                locator: locator.to_string(),
                count: matches.len(),
            }),
        }
    }

    // =========================================================================
    // WAITS
    // =========================================================================

    /// Wait until the locator matches exactly one visible element
    pub async fn wait_for_visible(
        &self,
        locator: &Locator,
        options: WaitOptions,
    ) -> ScoutResult<ElementHandle> {
        let waited_for = format!("{locator} to be visible");
        let result = poll_until(&options, &waited_for, || async move {
            let mut matches = self.resolve(locator).await?;
            if matches.len() > 1 {
                return Err(ScoutError::Ambiguous {
                    locator: locator.to_string(),
                    count: matches.len(),
                });
            }
            Ok(matches.pop().filter(|h| h.visible))
        })
        .await?;
        Ok(result.value)
    }

    /// Wait until no match is visible (zero matches counts)
    pub async fn wait_for_hidden(&self, locator: &Locator, options: WaitOptions) -> ScoutResult<()> {
        let waited_for = format!("{locator} to be hidden");
        poll_until(&options, &waited_for, || async move {
            let matches = self.resolve(locator).await?;
            Ok(matches.iter().all(|h| !h.visible).then_some(()))
        })
        .await?;
        Ok(())
    }

    /// Wait until the locator matches exactly `expected` elements
    pub async fn wait_for_count(
        &self,
        locator: &Locator,
        expected: usize,
        options: WaitOptions,
    ) -> ScoutResult<usize> {
        let waited_for = format!("{locator} to match {expected} element(s)");
        let result = poll_until(&options, &waited_for, || async move {
            let count = self.count(locator).await?;
            Ok((count == expected).then_some(count))
        })
        .await?;
        Ok(result.value)
    }
}

/// A [`Locator`] bound to a [`Page`], Playwright style.
///
/// Builders return new bound locators; the page is borrowed, never owned.
pub struct PageLocator<'p, D: PageDriver> {
    page: &'p Page<D>,
    locator: Locator,
}

impl<D: PageDriver> Clone for PageLocator<'_, D> {
    fn clone(&self) -> Self {
        Self {
            page: self.page,
            locator: self.locator.clone(),
        }
    }
}

impl<D: PageDriver> fmt::Debug for PageLocator<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageLocator")
            .field("locator", &self.locator.to_string())
            .finish_non_exhaustive()
    }
}

impl<D: PageDriver> fmt::Display for PageLocator<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.locator.fmt(f)
    }
}

impl<'p, D: PageDriver> PageLocator<'p, D> {
    /// The unbound description
    #[must_use]
    pub const fn as_locator(&self) -> &Locator {
        &self.locator
    }

    /// Unbind
    #[must_use]
    pub fn into_locator(self) -> Locator {
        self.locator
    }

    /// The page this locator evaluates against
    #[must_use]
    pub const fn page(&self) -> &'p Page<D> {
        self.page
    }

    fn derive(&self, locator: Locator) -> Self {
        Self {
            page: self.page,
            locator,
        }
    }

    /// Child by role and optional name
    #[must_use]
    pub fn get_by_role(&self, role: AriaRole, name: Option<TextMatch>) -> Self {
        self.derive(self.locator.get_by_role(role, name))
    }

    /// Child by `data-testid`
    #[must_use]
    pub fn get_by_test_id(&self, id: impl Into<String>) -> Self {
        self.derive(self.locator.get_by_test_id(id))
    }

    /// Child by CSS
    #[must_use]
    pub fn locator(&self, css: impl Into<String>) -> Self {
        self.derive(self.locator.locator(css))
    }

    /// Keep matches whose text content matches
    #[must_use]
    pub fn filter_has_text(&self, text: impl Into<TextMatch>) -> Self {
        self.derive(self.locator.clone().filter_has_text(text))
    }

    /// Keep matches containing a match of `inner`
    #[must_use]
    pub fn filter_has(&self, inner: Locator) -> Self {
        self.derive(self.locator.clone().filter_has(inner))
    }

    /// First match
    #[must_use]
    pub fn first(&self) -> Self {
        self.derive(self.locator.clone().first())
    }

    /// Last match
    #[must_use]
    pub fn last(&self) -> Self {
        self.derive(self.locator.clone().last())
    }

    /// Match at a zero-based index
    #[must_use]
    pub fn nth(&self, index: usize) -> Self {
        self.derive(self.locator.clone().nth(index))
    }

    /// All current matches
    pub async fn all(&self) -> ScoutResult<Vec<ElementHandle>> {
        self.page.resolve(&self.locator).await
    }

    /// Number of current matches
    pub async fn count(&self) -> ScoutResult<usize> {
        self.page.count(&self.locator).await
    }

    /// At least one current match
    pub async fn exists(&self) -> ScoutResult<bool> {
        self.page.exists(&self.locator).await
    }

    /// Click
    pub async fn click(&self) -> ScoutResult<()> {
        self.page.click(&self.locator).await
    }

    /// Fill
    pub async fn fill(&self, text: &str) -> ScoutResult<()> {
        self.page.fill(&self.locator, text).await
    }

    /// Text content
    pub async fn text_content(&self) -> ScoutResult<Option<String>> {
        self.page.text_content(&self.locator).await
    }

    /// Input value
    pub async fn input_value(&self) -> ScoutResult<String> {
        self.page.input_value(&self.locator).await
    }

    /// Currently visible
    pub async fn is_visible(&self) -> ScoutResult<bool> {
        self.page.is_visible(&self.locator).await
    }

    /// Wait for one visible match, using the page's action timeout
    pub async fn wait_for_visible(&self) -> ScoutResult<ElementHandle> {
        self.page
            .wait_for_visible(&self.locator, self.page.action_wait())
            .await
    }

    /// Wait for no visible match
    pub async fn wait_for_hidden(&self) -> ScoutResult<()> {
        self.page
            .wait_for_hidden(&self.locator, self.page.action_wait())
            .await
    }

    /// Wait for an exact match count
    pub async fn wait_for_count(&self, expected: usize) -> ScoutResult<usize> {
        self.page
            .wait_for_count(&self.locator, expected, self.page.action_wait())
            .await
    }
}
