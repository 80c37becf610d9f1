//! Example: Search Events
//!
//! Demonstrates: the home page object against a live site in Chromium
//!
//! Run with: `cargo run --example search_events --features browser`
//!
//! Environment: `EVENTSCOUT_BASE_URL`, `EVENTSCOUT_HEADLESS=0` to watch,
//! `CHROMIUM_PATH` to pick a binary.

use eventscout::prelude::*;
use eventscout::{init_tracing, CdpDriver};

#[tokio::main]
async fn main() -> ScoutResult<()> {
    let _ = init_tracing();
    println!("=== Search Events Example ===\n");

    let config = ScoutConfig::new()
        .with_env_overrides()
        .with_navigation_timeout(45_000);
    println!("1. Launching Chromium for {}...", config.base_url);
    let driver = CdpDriver::launch(&config).await?;

    let summary = with_home_page(driver, config, |home| {
        Box::pin(async move {
            println!("2. Searching for \"music\"...");
            home.search_for_event("music", None).await?;
            let url = home
                .page()
                .wait_for_url(&UrlPattern::glob("**/music/**"))
                .await?;
            println!("   Landed on {url}");

            let first = home.at(&home.event_cards).first();
            first.wait_for_visible().await?;
            let count = home.event_count().await?;
            let title = first.text_content().await?.unwrap_or_default();
            println!("   {count} event cards, first: {}", title.trim());

            println!("\n3. Checking the category breadcrumb...");
            home.select_category("Music").await?;
            let choice = home.category_breadcrumb_link("Music").await?;
            let arm = if choice.is_fallback() { "plain text" } else { "link" };
            println!("   Breadcrumb renders \"Music\" as {arm}");

            Ok(count)
        })
    })
    .await?;

    println!("\n=== Done: {summary} events found ===");
    Ok(())
}
