//! Property-based tests for locator matching and fallback resolution.
//!
//! Uses proptest to check invariants hold for arbitrary labels and documents.

mod common;

use common::{config, BASE};
use eventscout::prelude::*;
use eventscout::LocatorFactory;
use proptest::prelude::*;

fn breadcrumb_page(links: usize, texts: usize) -> String {
    let mut items = String::new();
    for i in 0..links {
        items.push_str(&format!("<li><a href=\"/music/{i}\">Music {i}</a></li>"));
    }
    for _ in 0..texts {
        items.push_str("<li>Music</li>");
    }
    format!(
        "<html><body><nav aria-label=\"breadcrumbs\"><ol>{items}</ol></nav>\
         <a href=\"/music\">Music outside the trail</a></body></html>"
    )
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

// === Fallback Resolution ===

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Exactly one arm is chosen: the link when any exists, else the text items.
    #[test]
    fn prop_fallback_arm_is_exclusive(links in 0usize..4, texts in 0usize..4) {
        let (is_fallback, chosen_count) = runtime().block_on(async {
            let driver = HtmlDriver::new(BASE)
                .unwrap()
                .with_page("/", breadcrumb_page(links, texts));
            let page = Page::new(driver, config()).unwrap();
            page.goto("/").await.unwrap();
            let home = HomePage::new(&page).unwrap();
            let choice = home.category_breadcrumb_link("music").await.unwrap();
            let count = page.count(choice.locator()).await.unwrap();
            (choice.is_fallback(), count)
        });

        prop_assert_eq!(is_fallback, links == 0);
        if is_fallback {
            prop_assert_eq!(chosen_count, texts);
        } else {
            prop_assert_eq!(chosen_count, links);
        }
    }
}

// === Locator Factories ===

proptest! {
    /// A factory is pure: the same label always yields the same description.
    #[test]
    fn prop_factory_is_referentially_stable(label in "[A-Za-z][A-Za-z ]{0,20}") {
        let factory = LocatorFactory::new(AriaRole::Tab);
        let scoped = LocatorFactory::within(&Locator::test_id("tabs"), AriaRole::Tab);

        prop_assert_eq!(factory.get(&label).to_string(), factory.get(&label).to_string());
        prop_assert_eq!(scoped.get(&label).to_string(), scoped.get(&label).to_string());
        prop_assert_eq!(factory.get(&label).depth(), 0);
        prop_assert_eq!(scoped.get(&label).depth(), 1);
    }
}

// === Name Matching ===

proptest! {
    /// Loose labels match regardless of case, anywhere in the name.
    #[test]
    fn prop_loose_match_ignores_case(
        label in "[A-Za-z]{1,12}( [A-Za-z]{1,12}){0,2}",
        prefix in "[a-z]{0,6}",
    ) {
        let m = TextMatch::loose(label.as_str());
        prop_assert!(m.matches(&label.to_uppercase()));
        prop_assert!(m.matches(&label.to_lowercase()));
        let embedded = format!("{prefix} {} tickets", label.to_uppercase());
        prop_assert!(m.matches(&embedded));
    }

    /// Exact labels are case-sensitive.
    #[test]
    fn prop_exact_match_respects_case(label in "[a-z]{1,12}") {
        let upper = label.to_uppercase();
        let m = TextMatch::exact(upper.as_str());
        prop_assert!(m.matches(&upper));
        prop_assert!(!m.matches(&label));
    }
}

// === URL Globs ===

proptest! {
    /// `**/segment/**` matches any URL containing that path segment.
    #[test]
    fn prop_glob_matches_segment(
        segment in "[a-y]{1,8}",
        before in "[a-y]{1,8}",
        after in "[a-y]{0,8}",
    ) {
        let url = format!("{BASE}/{before}/{segment}/{after}");
        let pattern = format!("**/{segment}/**");
        prop_assert!(UrlPattern::glob(pattern).matches(&url));
        prop_assert!(!UrlPattern::glob("**/zzz/**").matches(&url));
    }
}
