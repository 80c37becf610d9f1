//! Per-test lifecycle through `with_home_page` and `HomePageFixture`.

mod common;

use common::{config, shared_site, BASE};
use eventscout::prelude::*;
use eventscout::PageDriver;
use std::sync::Arc;

#[tokio::test]
async fn test_scenario_runs_between_setup_and_teardown() {
    let _ = eventscout::init_tracing();
    let driver = shared_site();

    let count = with_home_page(Arc::clone(&driver), config(), |home| {
        Box::pin(async move {
            assert!(home.is_current(&home.page().url().await?));
            home.search_for_event("music", None).await?;
            home.page()
                .wait_for_url(&UrlPattern::glob("**/music/**"))
                .await?;
            home.event_count().await
        })
    })
    .await
    .unwrap();

    assert_eq!(count, 3);
    let history = driver.history();
    assert_eq!(history.first().map(String::as_str), Some("goto:https://events.test/"));
    assert_eq!(history.last().map(String::as_str), Some("close"));
}

#[tokio::test]
async fn test_test_error_wins_and_context_is_closed() {
    let driver = shared_site();

    let err = with_home_page(Arc::clone(&driver), config(), |home| {
        Box::pin(async move { home.select_category("Opera").await })
    })
    .await
    .unwrap_err();

    assert!(err.is_not_found());
    assert!(driver.is_closed());
}

#[tokio::test]
async fn test_fixture_pages_are_independent() {
    let first = HomePageFixture::setup(common::site(), config()).await.unwrap();
    let second = HomePageFixture::setup(common::site(), config()).await.unwrap();

    first.home().unwrap().click_find_events().await.unwrap();

    assert_eq!(
        second.page().url().await.unwrap(),
        format!("{BASE}/")
    );
    assert_ne!(
        first.page().url().await.unwrap(),
        second.page().url().await.unwrap()
    );
    first.teardown().await.unwrap();
    second.teardown().await.unwrap();
}

#[tokio::test]
async fn test_closed_context_rejects_actions() {
    let driver = shared_site();
    let fixture = HomePageFixture::setup(Arc::clone(&driver), config())
        .await
        .unwrap();
    let page = fixture.page();
    let home = fixture.home().unwrap();
    assert_eq!(home.event_count().await.unwrap(), 0);

    driver.close().await.unwrap();
    let err = home.event_count().await.unwrap_err();
    assert!(matches!(err, ScoutError::PageClosed));
    assert!(matches!(page.url().await.unwrap_err(), ScoutError::PageClosed));
}

#[tokio::test]
async fn test_bad_config_fails_setup() {
    let err = HomePageFixture::setup(common::site(), config().with_poll_interval(0))
        .await
        .unwrap_err();
    assert!(matches!(err, ScoutError::Config { .. }));
}
