//! In-memory marketplace site shared by the integration tests.

#![allow(dead_code)]

use eventscout::prelude::*;
use std::sync::Arc;

pub const BASE: &str = "https://events.test";

pub const HOME: &str = r#"
<html><head><title>Discover events</title></head><body>
  <header>
    <a href="/" aria-label="Eventbrite home">EB</a>
    <nav aria-label="main">
      <a href="/d/co--denver/events/">Find Events</a>
      <a href="/organizer/create/">Create Events</a>
      <button type="button">Help Center</button>
      <a href="/mytickets/">Find my tickets</a>
      <a href="/signin/">Log In</a>
      <a href="/signup/">Sign Up</a>
    </nav>
  </header>
  <form>
    <input type="search" name="q" aria-label="Search events">
    <input type="text" name="location" list="places" aria-label="Choose a location">
    <datalist id="places"><option value="Denver, CO"></option></datalist>
    <button type="button" aria-label="Search button" data-href="/d/{location|online}/{q}/">Go</button>
  </form>
  <div data-testid="icon-category-browse">
    <a href="/b/co--denver/music/">Music</a>
    <a href="/b/co--denver/nightlife/">Nightlife</a>
    <a href="/b/co--denver/arts/">Performing &amp; Visual Arts</a>
    <a href="/b/co--denver/holiday/">Holidays</a>
    <a href="/b/co--denver/dating/">Dating</a>
    <a href="/b/co--denver/hobbies/">Hobbies</a>
    <a href="/b/co--denver/business/">Business</a>
    <a href="/b/co--denver/food-and-drink/">Food &amp; Drink</a>
  </div>
  <div role="tablist" aria-label="browse">
    <button role="tab">All</button>
    <button role="tab">For you</button>
    <button role="tab">Today</button>
    <button role="tab">This weekend</button>
  </div>
</body></html>"#;

pub const LISTING: &str = r#"
<html><body>
  <a href="/" aria-label="Eventbrite home">EB</a>
  <h1>Events in Denver, CO</h1>
  <div role="tablist" aria-label="neighbourhood-tabs">
    <button role="tab">Downtown Denver</button>
    <button role="tab">North Denver</button>
    <button role="tab">Five Points</button>
    <button role="tab">Applewood</button>
  </div>
  <ul>
    <li><a href="/e/red-rocks-summer/"><h3>Red Rocks Summer Series</h3></a><p>Sat, Jul 12</p></li>
    <li><a href="/e/jazz-at-dazzle/"><h3>Jazz at Dazzle</h3></a><p>Fri, Jul 11</p></li>
  </ul>
</body></html>"#;

pub const MUSIC_RESULTS: &str = r#"
<html><body>
  <h1>Music events online</h1>
  <ul>
    <li><a href="/e/live-music-night/"><h3>Live Music Night</h3></a><p>Tonight</p></li>
    <li><a href="/e/open-mic/"><h3>Open Mic</h3></a><p>Tomorrow</p></li>
    <li><a href="/e/symphony/"><h3>Symphony in the Park</h3></a><p>Sunday</p></li>
  </ul>
</body></html>"#;

pub const DENVER_MUSIC_RESULTS: &str = r#"
<html><body>
  <h1>Music events in Denver, CO</h1>
  <ul>
    <li><a href="/e/red-rocks-summer/"><h3>Red Rocks Summer Series</h3></a></li>
  </ul>
</body></html>"#;

pub const EMPTY_RESULTS: &str = r#"
<html><body>
  <h1>No events found</h1>
  <p>Try another search.</p>
</body></html>"#;

/// Category page where the current category renders as plain text
pub const MUSIC_CATEGORY: &str = r#"
<html><body>
  <nav aria-label="breadcrumbs">
    <ol>
      <li><a href="/">Home</a></li>
      <li><a href="/d/co--denver/events/">Denver</a></li>
      <li>Music</li>
    </ol>
  </nav>
  <h1>Music</h1>
  <h2>Popular in Music</h2>
  <ul>
    <li><a href="/e/red-rocks-summer/"><h3>Red Rocks Summer Series</h3></a></li>
  </ul>
</body></html>"#;

/// Variant where the category is a link in the trail
pub const MUSIC_CATEGORY_LINKED: &str = r#"
<html><body>
  <nav aria-label="breadcrumbs">
    <ol>
      <li><a href="/">Home</a></li>
      <li><a href="/b/co--denver/music/">Music</a></li>
      <li>Jazz</li>
    </ol>
  </nav>
  <h1>Jazz</h1>
</body></html>"#;

pub const SIGN_IN: &str = r#"
<html><body>
  <form>
    <label for="email">Email address</label>
    <input id="email" type="email" name="email">
    <button type="button">Continue</button>
    <label for="password">Password</label>
    <input id="password" type="password" name="password">
    <button type="button" aria-label="Show password">👁</button>
    <input type="submit" value="Sign in">
    <a href="/signin/forgot/">Forgot password?</a>
  </form>
  <div role="alert" hidden>There was a problem</div>
</body></html>"#;

pub const SIGN_IN_FAILED: &str = r#"
<html><body>
  <div role="alert">Invalid email or password</div>
  <div role="alert">Second notice</div>
</body></html>"#;

/// The whole site, every route registered
pub fn site() -> HtmlDriver {
    HtmlDriver::new(BASE)
        .expect("valid base url")
        .with_page("/", HOME)
        .with_page("/d/co--denver/events/", LISTING)
        .with_page("/d/online/music/", MUSIC_RESULTS)
        .with_page("/d/denver-co/music/", DENVER_MUSIC_RESULTS)
        .with_page("/d/online/zzzz/", EMPTY_RESULTS)
        .with_page("/b/co--denver/music/", MUSIC_CATEGORY)
        .with_page("/b/co--denver/jazz/", MUSIC_CATEGORY_LINKED)
        .with_page("/signin/", SIGN_IN)
        .with_page("/e/open-mic/", "<h1>Open Mic</h1>")
}

pub fn shared_site() -> Arc<HtmlDriver> {
    Arc::new(site())
}

/// Short timeouts so failing lookups settle quickly
pub fn config() -> ScoutConfig {
    ScoutConfig::new()
        .with_base_url(BASE)
        .with_action_timeout(100)
        .with_navigation_timeout(300)
        .with_poll_interval(5)
        .with_network_idle(0)
}

/// A page context already on `/`
pub async fn loaded_page() -> Page<HtmlDriver> {
    let page = Page::new(site(), config()).expect("valid config");
    page.goto("/").await.expect("home page loads");
    page
}
