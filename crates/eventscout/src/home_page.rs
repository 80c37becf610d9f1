//! Marketplace home page object.
//!
//! Static regions are bound once in [`HomePage::new`]; open-ended labels
//! (categories, tabs, neighbourhoods, event titles) go through locator
//! factories and are matched case-insensitively as literal substrings.
//! Names of the fixed navigation chrome are matched exactly.

use crate::driver::PageDriver;
use crate::locator::{FallbackChoice, Locator, LocatorFactory};
use crate::page::{Page, PageLocator};
use crate::page_object::PageObject;
use crate::result::{ScoutError, ScoutResult};
use crate::role::{AriaRole, TextMatch};
use std::fmt;
use tracing::info;

/// Browse categories listed in the category strip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Music
    Music,
    /// Nightlife
    Nightlife,
    /// Performing & Visual Arts
    PerformingArts,
    /// Holidays
    Holidays,
    /// Dating
    Dating,
    /// Hobbies
    Hobbies,
    /// Business
    Business,
    /// Food & Drink
    FoodAndDrink,
}

impl Category {
    /// Every category, in strip order
    pub const ALL: [Self; 8] = [
        Self::Music,
        Self::Nightlife,
        Self::PerformingArts,
        Self::Holidays,
        Self::Dating,
        Self::Hobbies,
        Self::Business,
        Self::FoodAndDrink,
    ];

    /// Link label as rendered
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Music => "Music",
            Self::Nightlife => "Nightlife",
            Self::PerformingArts => "Performing & Visual Arts",
            Self::Holidays => "Holidays",
            Self::Dating => "Dating",
            Self::Hobbies => "Hobbies",
            Self::Business => "Business",
            Self::FoodAndDrink => "Food & Drink",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Date filters on the browse tab strip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrowseTab {
    /// All
    All,
    /// For you
    ForYou,
    /// Today
    Today,
    /// This weekend
    ThisWeekend,
}

impl BrowseTab {
    /// Every tab, in strip order
    pub const ALL: [Self; 4] = [Self::All, Self::ForYou, Self::Today, Self::ThisWeekend];

    /// Tab label as rendered
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::All => "All",
            Self::ForYou => "For you",
            Self::Today => "Today",
            Self::ThisWeekend => "This weekend",
        }
    }
}

impl fmt::Display for BrowseTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The marketplace's home and listing pages, bound to a borrowed page context
#[derive(Debug)]
pub struct HomePage<'p, D: PageDriver> {
    page: &'p Page<D>,

    /// First link named like the site brand
    pub home_link: Locator,
    /// "Find Events"
    pub find_events_link: Locator,
    /// "Create Events"
    pub create_events_link: Locator,
    /// "Help Center"
    pub help_center_button: Locator,
    /// "Find my tickets"
    pub find_my_tickets_link: Locator,
    /// "Log In"
    pub log_in_link: Locator,
    /// "Sign Up"
    pub sign_up_link: Locator,

    /// Keyword search box
    pub search_input: Locator,
    /// Search submit
    pub search_button: Locator,
    /// Location autocomplete
    pub location_input: Locator,

    /// Category strip container
    pub category_container: Locator,
    category_links: [Locator; 8],

    /// Listing page title
    pub event_listing_heading: Locator,
    /// Neighbourhood tab strip
    pub neighborhood_tablist: Locator,
    /// Every tab inside the neighbourhood strip
    pub neighborhood_tabs: Locator,
    browse_tabs: [Locator; 4],

    /// Login email
    pub email_field: Locator,
    /// Login "Continue"
    pub continue_button: Locator,
    /// Login password
    pub password_field: Locator,
    /// Login submit
    pub sign_in_button: Locator,
    /// Password reveal toggle
    pub show_password_button: Locator,
    /// "Forgot password"
    pub forgot_password_link: Locator,

    /// Alert-role regions (visible only)
    pub alert_message: Locator,
    /// Anything carrying `role="alert"`, hidden ones included
    pub error_alert: Locator,

    /// Result cards: list items with a title heading
    pub event_cards: Locator,
    /// Result titles
    pub event_headings: Locator,

    /// Breadcrumb trail
    pub breadcrumb_nav: Locator,
    /// Category page headings
    pub category_headings: Locator,

    category_factory: LocatorFactory,
    browse_tab_factory: LocatorFactory,
    neighborhood_factory: LocatorFactory,
    event_factory: LocatorFactory,
    breadcrumb_link_factory: LocatorFactory,
}

impl<'p, D: PageDriver> HomePage<'p, D> {
    /// Bind every region against `page`. Nothing is evaluated yet.
    pub fn new(page: &'p Page<D>) -> ScoutResult<Self> {
        use AriaRole::{Alert, Button, Combobox, Link, Navigation, Searchbox, Tab, Tablist, Textbox};

        let category_container = Locator::test_id("icon-category-browse");
        let category_links =
            Category::ALL.map(|c| page.bind(Link, c.label(), Some(&category_container)));

        let neighborhood_tablist = page.bind(Tablist, "neighbourhood-tabs", None);
        let neighborhood_tabs = neighborhood_tablist.get_by_role(Tab, None);
        let browse_tabs = BrowseTab::ALL.map(|t| page.bind(Tab, t.label(), None));

        let breadcrumb_nav = page.bind(Navigation, "breadcrumbs", None);

        Ok(Self {
            page,
            home_link: page.bind(Link, TextMatch::pattern("(?i)eventbrite")?, None).first(),
            find_events_link: page.bind(Link, "Find Events", None),
            create_events_link: page.bind(Link, "Create Events", None),
            help_center_button: page.bind(Button, "Help Center", None),
            find_my_tickets_link: page.bind(Link, "Find my tickets", None),
            log_in_link: page.bind(Link, "Log In", None),
            sign_up_link: page.bind(Link, "Sign Up", None),

            search_input: page.bind(Searchbox, TextMatch::pattern("(?i)search events")?, None),
            search_button: page.bind(Button, TextMatch::pattern("(?i)search button")?, None),
            location_input: page.bind(
                Combobox,
                TextMatch::pattern("(?i)autocomplete|choose a location")?,
                None,
            ),

            category_factory: page.bind_dynamic(Link),
            category_container,
            category_links,

            event_listing_heading: Locator::css("h1"),
            neighborhood_factory: page.bind_dynamic_within(&neighborhood_tablist, Tab),
            neighborhood_tablist,
            neighborhood_tabs,
            browse_tab_factory: page.bind_dynamic(Tab),
            browse_tabs,

            email_field: page.bind(Textbox, TextMatch::pattern("(?i)email")?, None),
            continue_button: page.bind(Button, "Continue", None),
            password_field: page.bind(Textbox, TextMatch::pattern("(?i)password")?, None),
            sign_in_button: page.bind(Button, TextMatch::pattern("(?i)sign in")?, None),
            show_password_button: page.bind(Button, TextMatch::pattern("(?i)show password")?, None),
            forgot_password_link: page.bind(Link, TextMatch::pattern("(?i)forgot password")?, None),

            alert_message: Locator::role(Alert),
            error_alert: Locator::css("[role=\"alert\"]"),

            event_cards: Locator::css("li").filter_has(Locator::css("h3")),
            event_headings: Locator::css("h3"),
            event_factory: page.bind_dynamic(Link),

            breadcrumb_link_factory: page.bind_dynamic_within(&breadcrumb_nav, Link),
            breadcrumb_nav,
            category_headings: Locator::css("h1, h2"),
        })
    }

    /// The page context this object drives
    #[must_use]
    pub const fn page(&self) -> &'p Page<D> {
        self.page
    }

    /// Bind one of this object's locators for fluent use
    #[must_use]
    pub fn at(&self, locator: &Locator) -> PageLocator<'p, D> {
        self.page.locate(locator.clone())
    }

    // =========================================================================
    // NAVIGATION
    // =========================================================================

    /// Navigate and wait for network idle
    pub async fn goto(&self, path: &str) -> ScoutResult<()> {
        self.page.goto(path).await
    }

    /// Navigate to `/`
    pub async fn go_to_homepage(&self) -> ScoutResult<()> {
        self.goto(self.path()).await
    }

    /// Open the events listing
    pub async fn click_find_events(&self) -> ScoutResult<()> {
        info!("click find events");
        self.page.click(&self.find_events_link).await
    }

    /// Open event creation
    pub async fn click_create_events(&self) -> ScoutResult<()> {
        self.page.click(&self.create_events_link).await
    }

    /// Follow the brand link
    pub async fn click_home(&self) -> ScoutResult<()> {
        self.page.click(&self.home_link).await
    }

    /// Open the login page
    pub async fn navigate_to_login_page(&self) -> ScoutResult<()> {
        info!("navigate to login page");
        self.page.click(&self.log_in_link).await
    }

    // =========================================================================
    // SEARCH
    // =========================================================================

    /// Fill the search term, then the location if one is given, then submit once.
    ///
    /// A blank term is rejected before anything is touched; a blank location
    /// counts as no location.
    pub async fn search_for_event(&self, term: &str, location: Option<&str>) -> ScoutResult<()> {
        if term.trim().is_empty() {
            return Err(ScoutError::InvalidArgument {
                message: "search term must not be empty".to_string(),
            });
        }
        let location = location.filter(|l| !l.trim().is_empty());
        info!(term, location, "search for event");

        self.page.fill(&self.search_input, term).await?;
        if let Some(location) = location {
            self.page.fill(&self.location_input, location).await?;
        }
        self.page.click(&self.search_button).await
    }

    /// Fill the location field only
    pub async fn set_location(&self, location: &str) -> ScoutResult<()> {
        self.page.fill(&self.location_input, location).await
    }

    // =========================================================================
    // CATEGORIES
    // =========================================================================

    /// Any link on the page named like `name`
    #[must_use]
    pub fn category_link(&self, name: &str) -> Locator {
        self.category_factory.get(name)
    }

    /// Activate the link named like `name`, anywhere on the page
    pub async fn select_category(&self, name: &str) -> ScoutResult<()> {
        info!(category = name, "select category");
        self.page.click(&self.category_link(name)).await
    }

    /// Link for `category` inside the category strip
    #[must_use]
    pub fn category(&self, category: Category) -> &Locator {
        &self.category_links[category as usize]
    }

    /// Activate `category` in the category strip
    pub async fn click_category(&self, category: Category) -> ScoutResult<()> {
        info!(%category, "click category");
        self.page.click(self.category(category)).await
    }

    // =========================================================================
    // TABS
    // =========================================================================

    /// Any tab named like `name`
    #[must_use]
    pub fn browse_tab(&self, name: &str) -> Locator {
        self.browse_tab_factory.get(name)
    }

    /// Activate the tab named like `name`
    pub async fn select_browse_tab(&self, name: &str) -> ScoutResult<()> {
        info!(tab = name, "select tab");
        self.page.click(&self.browse_tab(name)).await
    }

    /// The tab for `tab`, matched exactly
    #[must_use]
    pub fn tab(&self, tab: BrowseTab) -> &Locator {
        &self.browse_tabs[tab as usize]
    }

    /// Activate `tab`
    pub async fn select_tab(&self, tab: BrowseTab) -> ScoutResult<()> {
        info!(%tab, "select tab");
        self.page.click(self.tab(tab)).await
    }

    /// Tab named like `name`, inside the neighbourhood strip only
    #[must_use]
    pub fn neighborhood_tab(&self, name: &str) -> Locator {
        self.neighborhood_factory.get(name)
    }

    /// Activate a neighbourhood tab
    pub async fn select_neighborhood(&self, name: &str) -> ScoutResult<()> {
        info!(neighborhood = name, "select neighborhood");
        self.page.click(&self.neighborhood_tab(name)).await
    }

    /// Current number of neighbourhood tabs (0 when the strip is absent)
    pub async fn neighborhood_tab_count(&self) -> ScoutResult<usize> {
        self.page.count(&self.neighborhood_tabs).await
    }

    // =========================================================================
    // LOGIN
    // =========================================================================

    /// Fill the email field
    pub async fn enter_email(&self, email: &str) -> ScoutResult<()> {
        self.page.fill(&self.email_field, email).await
    }

    /// Advance past the email step
    pub async fn click_continue(&self) -> ScoutResult<()> {
        self.page.click(&self.continue_button).await
    }

    /// Fill the password field
    pub async fn enter_password(&self, password: &str) -> ScoutResult<()> {
        self.page.fill(&self.password_field, password).await
    }

    /// Submit the login form
    pub async fn click_sign_in(&self) -> ScoutResult<()> {
        self.page.click(&self.sign_in_button).await
    }

    /// Toggle password reveal
    pub async fn toggle_password_visibility(&self) -> ScoutResult<()> {
        self.page.click(&self.show_password_button).await
    }

    /// Email, continue, password, sign in. Always all four, in order; the
    /// first failure stops the rest.
    pub async fn submit_login(&self, email: &str, password: &str) -> ScoutResult<()> {
        info!(email, "submit login");
        self.enter_email(email).await?;
        self.click_continue().await?;
        self.enter_password(password).await?;
        self.click_sign_in().await
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Text of the first visible alert, `None` when there is none.
    ///
    /// Reads the text captured by a single evaluation, so an alert that
    /// goes away right after is still reported and nothing auto-waits.
    pub async fn error_message(&self) -> ScoutResult<Option<String>> {
        let first = self.alert_message.clone().first();
        let found = self.page.resolve(&first).await?;
        Ok(found.into_iter().next().and_then(|alert| alert.text_content))
    }

    /// Current number of result cards; zero is a valid answer
    pub async fn event_count(&self) -> ScoutResult<usize> {
        self.page.count(&self.event_cards).await
    }

    /// Link whose name contains `name`, ignoring case
    #[must_use]
    pub fn event_by_name(&self, name: &str) -> Locator {
        self.event_factory.get(name)
    }

    /// Open the event named like `name`
    pub async fn click_event_by_name(&self, name: &str) -> ScoutResult<()> {
        info!(event = name, "click event");
        self.page.click(&self.event_by_name(name)).await
    }

    /// Breadcrumb trail
    #[must_use]
    pub fn breadcrumb_nav(&self) -> &Locator {
        &self.breadcrumb_nav
    }

    /// Every link in the breadcrumb trail
    #[must_use]
    pub fn breadcrumb_links(&self) -> Locator {
        self.breadcrumb_nav.get_by_role(AriaRole::Link, None)
    }

    /// `h1`/`h2` headings containing `name`, ignoring case
    #[must_use]
    pub fn category_heading(&self, name: &str) -> Locator {
        self.category_headings
            .clone()
            .filter_has_text(TextMatch::loose(name))
    }

    /// Result title at `index`
    #[must_use]
    pub fn event_heading(&self, index: usize) -> Locator {
        self.event_headings.clone().nth(index)
    }

    /// At least one result title is present
    pub async fn has_event_headings(&self) -> ScoutResult<bool> {
        self.page.exists(&self.event_headings).await
    }

    /// Breadcrumb link named like `name`, or when there is none, the
    /// breadcrumb item whose text contains it.
    pub async fn category_breadcrumb_link(&self, name: &str) -> ScoutResult<FallbackChoice> {
        let link = self.breadcrumb_link_factory.get(name);
        let item = self
            .breadcrumb_nav
            .locator("li")
            .filter_has_text(TextMatch::loose(name));
        self.page.resolve_with_fallback(&link, &item).await
    }
}

impl<D: PageDriver> PageObject for HomePage<'_, D> {
    fn path(&self) -> &str {
        "/"
    }

    fn page_name(&self) -> &str {
        "home"
    }
}
