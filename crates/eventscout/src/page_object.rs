//! Page Object Model support.
//!
//! A page object binds its locators once, at construction, against a
//! borrowed [`Page`](crate::Page), and exposes one method per user-level
//! action. It never owns or closes the browsing context.

use crate::wait::UrlPattern;

/// Trait for page objects representing a page or component in the UI.
///
/// # Example
///
/// ```ignore
/// struct LoginPage<'p, D: PageDriver> {
///     page: &'p Page<D>,
///     email: Locator,
/// }
///
/// impl<D: PageDriver> PageObject for LoginPage<'_, D> {
///     fn path(&self) -> &str {
///         "/signin/"
///     }
/// }
/// ```
pub trait PageObject {
    /// Path this page object is loaded from, relative to the base URL
    fn path(&self) -> &str;

    /// Pattern the current URL matches while this page is shown
    fn url_pattern(&self) -> UrlPattern {
        UrlPattern::Contains(self.path().to_string())
    }

    /// Whether `url` belongs to this page
    fn is_current(&self, url: &str) -> bool {
        self.url_pattern().matches(url)
    }

    /// Get the page name for logging/debugging
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SignInPage;

    impl PageObject for SignInPage {
        fn path(&self) -> &str {
            "/signin/"
        }
    }

    struct ListingPage;

    impl PageObject for ListingPage {
        fn path(&self) -> &str {
            "/d/co--denver/all-events/"
        }

        fn url_pattern(&self) -> UrlPattern {
            UrlPattern::glob("**/d/*/events*")
        }

        fn page_name(&self) -> &str {
            "listing"
        }
    }

    #[test]
    fn test_default_pattern_uses_path() {
        let page = SignInPage;
        assert!(page.is_current("https://events.test/signin/?referrer=%2F"));
        assert!(!page.is_current("https://events.test/"));
    }

    #[test]
    fn test_default_name_is_type_name() {
        assert!(SignInPage.page_name().ends_with("SignInPage"));
    }

    #[test]
    fn test_overridden_pattern() {
        let page = ListingPage;
        assert_eq!(page.page_name(), "listing");
        assert!(page.is_current("https://events.test/d/co--denver/events--today/"));
        assert!(!page.is_current("https://events.test/signin/"));
    }
}
