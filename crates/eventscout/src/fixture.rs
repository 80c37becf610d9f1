//! Per-test lifecycle for the home page object.
//!
//! Setup builds the page context and loads `/`; teardown closes the
//! browsing context. [`with_home_page`] always tears down, whether the test
//! body returns an error or panics.

use crate::config::ScoutConfig;
use crate::driver::PageDriver;
use crate::home_page::HomePage;
use crate::page::Page;
use crate::page_object::PageObject;
use crate::result::{ScoutError, ScoutResult};
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tracing::{info, warn};

/// A loaded home page that owns its browsing context until torn down
#[derive(Debug)]
pub struct HomePageFixture<D: PageDriver> {
    page: Page<D>,
}

impl<D: PageDriver> HomePageFixture<D> {
    /// Build the page context and navigate to the home page.
    ///
    /// On a failed navigation the context is closed before the error is returned.
    pub async fn setup(driver: D, config: ScoutConfig) -> ScoutResult<Self> {
        let page = Page::new(driver, config)?;
        let loaded = match HomePage::new(&page) {
            Ok(home) => {
                info!(page = home.page_name(), "fixture setup");
                home.go_to_homepage().await
            }
            Err(e) => Err(e),
        };
        if let Err(e) = loaded {
            if let Err(close_err) = page.driver().close().await {
                warn!(error = %close_err, "close after failed setup");
            }
            return Err(ScoutError::Fixture {
                message: format!("home page setup failed: {e}"),
            });
        }
        Ok(Self { page })
    }

    /// The page context
    #[must_use]
    pub const fn page(&self) -> &Page<D> {
        &self.page
    }

    /// A fresh page object over the loaded page
    pub fn home(&self) -> ScoutResult<HomePage<'_, D>> {
        HomePage::new(&self.page)
    }

    /// Close the browsing context
    pub async fn teardown(self) -> ScoutResult<()> {
        info!("fixture teardown");
        self.page.driver().close().await
    }
}

/// Run `test` against a freshly loaded home page, then tear down.
///
/// The test's own error wins over a teardown error. A panic in the test is
/// re-raised after teardown.
///
/// ```ignore
/// with_home_page(driver, config, |home| {
///     Box::pin(async move { home.event_count().await })
/// })
/// .await?;
/// ```
pub async fn with_home_page<D, T, F>(driver: D, config: ScoutConfig, test: F) -> ScoutResult<T>
where
    D: PageDriver,
    F: for<'p> FnOnce(HomePage<'p, D>) -> LocalBoxFuture<'p, ScoutResult<T>>,
{
    let fixture = HomePageFixture::setup(driver, config).await?;
    let outcome = match fixture.home() {
        Ok(home) => AssertUnwindSafe(test(home)).catch_unwind().await,
        Err(e) => Ok(Err(e)),
    };
    let torn_down = fixture.teardown().await;

    match outcome {
        Err(panic) => std::panic::resume_unwind(panic),
        Ok(Err(e)) => {
            if let Err(teardown_err) = torn_down {
                warn!(error = %teardown_err, "teardown failed after test error");
            }
            Err(e)
        }
        Ok(Ok(value)) => torn_down.map(|()| value),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::html_driver::HtmlDriver;
    use std::sync::Arc;

    const BASE: &str = "https://events.test";

    fn driver() -> Arc<HtmlDriver> {
        Arc::new(
            HtmlDriver::new(BASE)
                .unwrap()
                .with_page("/", r#"<a href="/d/co--denver/all-events/">Find Events</a>"#),
        )
    }

    fn config() -> ScoutConfig {
        ScoutConfig::new()
            .with_base_url(BASE)
            .with_action_timeout(50)
            .with_poll_interval(5)
            .with_network_idle(0)
    }

    #[tokio::test]
    async fn test_setup_loads_home_and_teardown_closes() {
        let driver = driver();
        let fixture = HomePageFixture::setup(Arc::clone(&driver), config())
            .await
            .unwrap();
        assert_eq!(fixture.page().url().await.unwrap(), format!("{BASE}/"));
        let home = fixture.home().unwrap();
        assert_eq!(home.page().count(&home.find_events_link).await.unwrap(), 1);
        fixture.teardown().await.unwrap();
        assert!(driver.is_closed());
    }

    #[tokio::test]
    async fn test_setup_failure_closes_driver() {
        let driver = Arc::new(HtmlDriver::new(BASE).unwrap());
        let err = HomePageFixture::setup(Arc::clone(&driver), config())
            .await
            .unwrap_err();
        assert!(matches!(err, ScoutError::Fixture { .. }));
        assert!(driver.is_closed());
    }

    #[tokio::test]
    async fn test_with_home_page_returns_value_and_tears_down() {
        let driver = driver();
        let count = with_home_page(Arc::clone(&driver), config(), |home| {
            Box::pin(async move { home.page().count(&home.find_events_link).await })
        })
        .await
        .unwrap();
        assert_eq!(count, 1);
        assert!(driver.is_closed());
    }

    #[tokio::test]
    async fn test_with_home_page_tears_down_on_failure() {
        let driver = driver();
        let err = with_home_page(Arc::clone(&driver), config(), |home| {
            Box::pin(async move { home.click_create_events().await })
        })
        .await
        .unwrap_err();
        assert!(err.is_not_found());
        assert!(driver.is_closed());
    }

    #[tokio::test]
    async fn test_with_home_page_tears_down_on_panic() {
        let driver = driver();
        let run = with_home_page(Arc::clone(&driver), config(), |home| {
            Box::pin(async move {
                assert_eq!(home.page_name(), "listing", "test body failed");
                Ok(())
            })
        });
        let outcome = AssertUnwindSafe(run).catch_unwind().await;
        assert!(outcome.is_err());
        assert!(driver.is_closed());
    }
}
