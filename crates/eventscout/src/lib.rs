//! EventScout: Page Objects for Events-Marketplace Acceptance Tests
//!
//! Role-based locators, a strict auto-waiting page context and a home page
//! object that turns user-level actions (search, browse a category, pick a
//! neighbourhood tab, log in) into deterministic sequences of primitive
//! browser interactions.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    EVENTSCOUT Architecture                       │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ HomePage   │    │ Page<D>    │    │ PageDriver │            │
//! │   │ (facade +  │───►│ (resolve,  │───►│ (HtmlDriver│            │
//! │   │  locators) │    │  wait)     │    │  CdpDriver)│            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! │         ▲                                                       │
//! │   ┌─────┴──────┐                                                │
//! │   │ Fixture    │  setup → test body → teardown                  │
//! │   └────────────┘                                                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! let driver = HtmlDriver::new("https://events.test")?
//!     .with_page("/", HOME_HTML)
//!     .with_page("/d/co--denver/music/", RESULTS_HTML);
//! let config = ScoutConfig::new().with_base_url("https://events.test");
//!
//! let count = with_home_page(driver, config, |home| {
//!     Box::pin(async move {
//!         home.search_for_event("music", None).await?;
//!         home.event_count().await
//!     })
//! })
//! .await?;
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

/// Chromium engine over the DevTools protocol
#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc, clippy::doc_markdown)]
pub mod browser;
pub mod config;
pub mod driver;
pub mod fixture;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod home_page;
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::cast_possible_truncation
)]
pub mod html_driver;
pub mod locator;
pub mod logging;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod page;
pub mod page_object;
pub mod result;
pub mod role;
pub mod wait;

#[cfg(feature = "browser")]
pub use browser::CdpDriver;
pub use config::{
    ScoutConfig, DEFAULT_ACTION_TIMEOUT_MS, DEFAULT_BASE_URL, DEFAULT_NAVIGATION_TIMEOUT_MS,
    DEFAULT_NETWORK_IDLE_MS, DEFAULT_POLL_INTERVAL_MS,
};
pub use driver::{ElementHandle, NetworkActivity, PageDriver};
pub use fixture::{with_home_page, HomePageFixture};
pub use home_page::{BrowseTab, Category, HomePage};
pub use html_driver::HtmlDriver;
pub use locator::{FallbackChoice, Locator, LocatorFactory, Nth, Selector, Step};
pub use logging::init_tracing;
pub use page::{Page, PageLocator};
pub use page_object::PageObject;
pub use result::{ScoutError, ScoutResult};
pub use role::{normalize_whitespace, AriaRole, TextMatch};
pub use wait::{
    poll_until, LoadState, NetworkIdleTracker, UrlPattern, WaitOptions, WaitResult,
};

/// Prelude for test scripts
pub mod prelude {
    pub use crate::fixture::{with_home_page, HomePageFixture};
    pub use crate::home_page::{BrowseTab, Category, HomePage};
    pub use crate::html_driver::HtmlDriver;
    pub use crate::locator::{FallbackChoice, Locator};
    pub use crate::page::Page;
    pub use crate::page_object::PageObject;
    pub use crate::role::{AriaRole, TextMatch};
    pub use crate::wait::{LoadState, UrlPattern, WaitOptions};
    pub use crate::{ScoutConfig, ScoutError, ScoutResult};
}
