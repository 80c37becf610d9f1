//! PageDriver - Abstract Browser Automation Trait
//!
//! The automation engine is an external collaborator. This trait is the seam:
//! it exposes primitives only (raw selector queries, click, fill, text,
//! network activity). Name matching, text filters, scoping, ordinal picks,
//! strictness and fallback all live in [`Page`](crate::Page).
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  PageDriver (Abstract Trait)                             │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────┐      ┌─────────────────────┐    │
//! │  │  CdpDriver          │      │  HtmlDriver         │    │
//! │  │  (feature browser)  │      │  (offline tests)    │    │
//! │  │  chromiumoxide      │      │  scraper            │    │
//! │  └─────────────────────┘      └─────────────────────┘    │
//! └──────────────────────────────────────────────────────────┘
//! ```

use crate::locator::Selector;
use crate::result::ScoutResult;
use crate::role::AriaRole;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Snapshot of one live element at the moment it was resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Engine identity; equal ids mean the same live element
    pub id: String,
    /// Element tag name (lowercase)
    pub tag_name: String,
    /// Computed ARIA role, if it is one the locator layer knows
    pub role: Option<AriaRole>,
    /// Computed accessible name
    pub name: String,
    /// Element text content
    pub text_content: Option<String>,
    /// Whether the element is rendered
    pub visible: bool,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag_name: tag_name.into(),
            role: None,
            name: String::new(),
            text_content: None,
            visible: true,
        }
    }

    /// Set the role
    #[must_use]
    pub const fn with_role(mut self, role: AriaRole) -> Self {
        self.role = Some(role);
        self
    }

    /// Set the accessible name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    /// Set visibility
    #[must_use]
    pub const fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Short label for logs and errors
    #[must_use]
    pub fn describe(&self) -> String {
        match self.role {
            Some(role) if !self.name.is_empty() => format!("{role} {:?}", self.name),
            Some(role) => format!("{role} <{}>", self.tag_name),
            None => format!("<{}>#{}", self.tag_name, self.id),
        }
    }
}

/// Network counters used to detect quiescence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkActivity {
    /// Requests currently in flight
    pub in_flight: usize,
    /// Monotonic count of finished requests
    pub completed: u64,
}

impl NetworkActivity {
    /// Nothing is in flight right now
    #[must_use]
    pub const fn is_quiet(&self) -> bool {
        self.in_flight == 0
    }
}

/// Abstract driver trait for browser automation.
///
/// One driver is one browsing context. Every method takes `&self` so page
/// objects can borrow the context without owning it.
///
/// # Implementations
///
/// - `HtmlDriver` - static HTML documents, for offline tests
/// - `CdpDriver` - Chromium over the DevTools protocol (feature `browser`)
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to an absolute URL
    async fn goto(&self, url: &str) -> ScoutResult<()>;

    /// Get current URL
    async fn current_url(&self) -> ScoutResult<String>;

    /// Resolve a selector, optionally restricted to strict descendants of `within`.
    ///
    /// Results are in document order without duplicates. Role queries skip
    /// hidden elements.
    async fn query(
        &self,
        selector: &Selector,
        within: Option<&[ElementHandle]>,
    ) -> ScoutResult<Vec<ElementHandle>>;

    /// Click element
    async fn click(&self, element: &ElementHandle) -> ScoutResult<()>;

    /// Replace the value of an editable element
    async fn fill(&self, element: &ElementHandle, text: &str) -> ScoutResult<()>;

    /// Read the element's text content
    async fn text_content(&self, element: &ElementHandle) -> ScoutResult<Option<String>>;

    /// Read the current value of an input
    async fn input_value(&self, element: &ElementHandle) -> ScoutResult<String>;

    /// Current network counters
    async fn network_activity(&self) -> ScoutResult<NetworkActivity>;

    /// Close the browsing context. Only the fixture lifecycle calls this.
    async fn close(&self) -> ScoutResult<()>;
}

/// Shared engines, so a test can keep a handle to the driver it hands over
#[async_trait]
impl<T: PageDriver + ?Sized> PageDriver for Arc<T> {
    async fn goto(&self, url: &str) -> ScoutResult<()> {
        (**self).goto(url).await
    }

    async fn current_url(&self) -> ScoutResult<String> {
        (**self).current_url().await
    }

    async fn query(
        &self,
        selector: &Selector,
        within: Option<&[ElementHandle]>,
    ) -> ScoutResult<Vec<ElementHandle>> {
        (**self).query(selector, within).await
    }

    async fn click(&self, element: &ElementHandle) -> ScoutResult<()> {
        (**self).click(element).await
    }

    async fn fill(&self, element: &ElementHandle, text: &str) -> ScoutResult<()> {
        (**self).fill(element, text).await
    }

    async fn text_content(&self, element: &ElementHandle) -> ScoutResult<Option<String>> {
        (**self).text_content(element).await
    }

    async fn input_value(&self, element: &ElementHandle) -> ScoutResult<String> {
        (**self).input_value(element).await
    }

    async fn network_activity(&self) -> ScoutResult<NetworkActivity> {
        (**self).network_activity().await
    }

    async fn close(&self) -> ScoutResult<()> {
        (**self).close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod element_handle_tests {
        use super::*;

        #[test]
        fn test_element_handle_creation() {
            let elem = ElementHandle::new("0:12", "a");
            assert_eq!(elem.id, "0:12");
            assert_eq!(elem.tag_name, "a");
            assert!(elem.role.is_none());
            assert!(elem.text_content.is_none());
            assert!(elem.visible);
        }

        #[test]
        fn test_builder() {
            let elem = ElementHandle::new("1", "button")
                .with_role(AriaRole::Button)
                .with_name("Continue")
                .with_text("Continue")
                .with_visible(false);
            assert_eq!(elem.role, Some(AriaRole::Button));
            assert_eq!(elem.name, "Continue");
            assert_eq!(elem.text_content.as_deref(), Some("Continue"));
            assert!(!elem.visible);
        }

        #[test]
        fn test_describe() {
            let named = ElementHandle::new("1", "a")
                .with_role(AriaRole::Link)
                .with_name("Music");
            assert_eq!(named.describe(), "link \"Music\"");
            let anonymous = ElementHandle::new("2", "li").with_role(AriaRole::ListItem);
            assert_eq!(anonymous.describe(), "listitem <li>");
            let bare = ElementHandle::new("3", "div");
            assert_eq!(bare.describe(), "<div>#3");
        }

        #[test]
        fn test_deserialize_from_engine_json() {
            let json = r#"{"id":"7","tag_name":"a","role":"link","name":"Log In","text_content":"Log In","visible":true}"#;
            let elem: ElementHandle = serde_json::from_str(json).unwrap();
            assert_eq!(elem.role, Some(AriaRole::Link));
            assert_eq!(elem.name, "Log In");
        }
    }

    mod network_activity_tests {
        use super::*;

        #[test]
        fn test_default_is_quiet() {
            assert!(NetworkActivity::default().is_quiet());
            let busy = NetworkActivity {
                in_flight: 2,
                completed: 10,
            };
            assert!(!busy.is_quiet());
        }
    }
}
