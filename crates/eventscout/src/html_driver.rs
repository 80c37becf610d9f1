//! HtmlDriver - in-memory engine over static HTML documents.
//!
//! Each registered path serves one HTML document. Queries re-parse the
//! current document with `scraper`, compute implicit ARIA roles, accessible
//! names and visibility, and hand back handles tagged with the document
//! generation. Any navigation or [`HtmlDriver::set_document`] bumps the
//! generation, so handles from an earlier render are detached.
//!
//! Clicking follows `href`, or a `data-href` template on the element or an
//! ancestor. Templates substitute `{field}` (or `{field|default}`) with the
//! slugified current value of the form field named `field`.

use crate::driver::{ElementHandle, NetworkActivity, PageDriver};
use crate::locator::Selector;
use crate::result::{ScoutError, ScoutResult};
use crate::role::{normalize_whitespace, AriaRole};
use async_trait::async_trait;
use scraper::node::Element;
use scraper::{ElementRef, Html};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use url::Url;

const DETACHED: &str = "element is no longer attached to the document";

#[derive(Debug, Default)]
struct SiteState {
    routes: HashMap<String, String>,
    current_url: Option<Url>,
    document: String,
    generation: u64,
    values: HashMap<usize, String>,
    in_flight: usize,
    completed: u64,
    history: Vec<String>,
    closed: bool,
}

/// Engine serving static HTML pages from memory, for offline tests
#[derive(Debug)]
pub struct HtmlDriver {
    base: Url,
    state: Mutex<SiteState>,
}

impl HtmlDriver {
    /// Create a driver whose site lives at `base_url`
    pub fn new(base_url: &str) -> ScoutResult<Self> {
        Ok(Self {
            base: Url::parse(base_url)?,
            state: Mutex::new(SiteState::default()),
        })
    }

    /// Register the document served at `path`
    #[must_use]
    pub fn with_page(self, path: &str, html: impl Into<String>) -> Self {
        self.lock().routes.insert(route_key(path), html.into());
        self
    }

    /// Register or replace the document served at `path`
    pub fn set_page(&self, path: &str, html: impl Into<String>) {
        self.lock().routes.insert(route_key(path), html.into());
    }

    /// Replace the live document in place, as a client-side re-render would
    pub fn set_document(&self, html: impl Into<String>) {
        let mut state = self.lock();
        state.document = html.into();
        state.generation += 1;
        state.values.clear();
    }

    /// Set the number of in-flight requests; lowering it completes the difference
    pub fn set_in_flight(&self, in_flight: usize) {
        let mut state = self.lock();
        if in_flight < state.in_flight {
            state.completed += (state.in_flight - in_flight) as u64;
        }
        state.in_flight = in_flight;
    }

    /// Site origin
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().history.clone()
    }

    /// Check if a call with this prefix was recorded
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.lock().history.iter().any(|c| c.starts_with(prefix))
    }

    /// Whether `close` has been called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, SiteState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn open(&self) -> ScoutResult<MutexGuard<'_, SiteState>> {
        let state = self.lock();
        if state.closed {
            return Err(ScoutError::PageClosed);
        }
        Ok(state)
    }

    fn navigate(state: &mut SiteState, url: Url) -> ScoutResult<()> {
        let html = state
            .routes
            .get(&route_key(url.path()))
            .cloned()
            .ok_or_else(|| ScoutError::Navigation {
                url: url.to_string(),
                message: "no page registered for this path".to_string(),
            })?;
        tracing::trace!(url = %url, "html driver loaded document");
        state.document = html;
        state.generation += 1;
        state.values.clear();
        state.current_url = Some(url);
        Ok(())
    }

    fn run_query(
        &self,
        selector: &Selector,
        within: Option<&[ElementHandle]>,
    ) -> ScoutResult<Vec<ElementHandle>> {
        let compiled = CompiledSelector::compile(selector)?;
        let state = self.open()?;
        let roots: Option<Vec<usize>> = within.map(|handles| {
            handles
                .iter()
                .filter_map(|h| parse_handle_id(&h.id, state.generation))
                .collect()
        });

        let html = Html::parse_document(&state.document);
        let snapshot = Snapshot::new(&html);
        let ranges: Option<Vec<(usize, usize)>> = roots.map(|roots| {
            roots
                .into_iter()
                .filter_map(|i| snapshot.subtree(i))
                .collect()
        });

        let handles = (0..snapshot.elements.len())
            .filter(|&i| {
                ranges
                    .as_ref()
                    .map_or(true, |ranges| ranges.iter().any(|&(lo, hi)| lo < i && i < hi))
            })
            .filter(|&i| compiled.matches(snapshot.elements[i]))
            .map(|i| snapshot.handle(state.generation, i))
            .collect();
        Ok(handles)
    }

    fn run_click(&self, handle: &ElementHandle) -> ScoutResult<()> {
        let mut state = self.open()?;
        let index = attached_index(&state, handle)?;
        state.history.push(format!("click:{}", handle.name));

        let target = {
            let html = Html::parse_document(&state.document);
            let snapshot = Snapshot::new(&html);
            snapshot.navigation_target(index, &state.values)
        };
        let Some(target) = target else {
            return Ok(());
        };
        let from = state.current_url.clone().unwrap_or_else(|| self.base.clone());
        let url = from.join(&target)?;
        Self::navigate(&mut state, url)
    }

    fn run_fill(&self, handle: &ElementHandle, text: &str) -> ScoutResult<()> {
        let mut state = self.open()?;
        let index = attached_index(&state, handle)?;
        let editable = {
            let html = Html::parse_document(&state.document);
            let snapshot = Snapshot::new(&html);
            let element = snapshot.element(index).ok_or_else(|| detached(handle))?;
            is_editable(element)
        };
        if !editable {
            return Err(ScoutError::NotInteractable {
                locator: handle.describe(),
                reason: "element is not an editable field".to_string(),
            });
        }
        state.history.push(format!("fill:{}:{text}", handle.name));
        state.values.insert(index, text.to_string());
        Ok(())
    }

    fn run_text_content(&self, handle: &ElementHandle) -> ScoutResult<Option<String>> {
        let state = self.open()?;
        let index = attached_index(&state, handle)?;
        let html = Html::parse_document(&state.document);
        let snapshot = Snapshot::new(&html);
        let element = snapshot.element(index).ok_or_else(|| detached(handle))?;
        Ok(Some(element.text().collect()))
    }

    fn run_input_value(&self, handle: &ElementHandle) -> ScoutResult<String> {
        let state = self.open()?;
        let index = attached_index(&state, handle)?;
        if let Some(value) = state.values.get(&index) {
            return Ok(value.clone());
        }
        let html = Html::parse_document(&state.document);
        let snapshot = Snapshot::new(&html);
        let element = snapshot.element(index).ok_or_else(|| detached(handle))?;
        match element.value().name() {
            "input" | "select" => Ok(element.value().attr("value").unwrap_or_default().to_string()),
            "textarea" => Ok(element.text().collect()),
            _ => Err(ScoutError::NotInteractable {
                locator: handle.describe(),
                reason: "element is not an input".to_string(),
            }),
        }
    }
}

#[async_trait]
impl PageDriver for HtmlDriver {
    async fn goto(&self, url: &str) -> ScoutResult<()> {
        let url = Url::parse(url)?;
        let mut state = self.open()?;
        state.history.push(format!("goto:{url}"));
        Self::navigate(&mut state, url)
    }

    async fn current_url(&self) -> ScoutResult<String> {
        let state = self.open()?;
        Ok(state
            .current_url
            .as_ref()
            .map_or_else(|| "about:blank".to_string(), Url::to_string))
    }

    async fn query(
        &self,
        selector: &Selector,
        within: Option<&[ElementHandle]>,
    ) -> ScoutResult<Vec<ElementHandle>> {
        self.run_query(selector, within)
    }

    async fn click(&self, element: &ElementHandle) -> ScoutResult<()> {
        self.run_click(element)
    }

    async fn fill(&self, element: &ElementHandle, text: &str) -> ScoutResult<()> {
        self.run_fill(element, text)
    }

    async fn text_content(&self, element: &ElementHandle) -> ScoutResult<Option<String>> {
        self.run_text_content(element)
    }

    async fn input_value(&self, element: &ElementHandle) -> ScoutResult<String> {
        self.run_input_value(element)
    }

    async fn network_activity(&self) -> ScoutResult<NetworkActivity> {
        let state = self.open()?;
        Ok(NetworkActivity {
            in_flight: state.in_flight,
            completed: state.completed,
        })
    }

    async fn close(&self) -> ScoutResult<()> {
        let mut state = self.lock();
        if !state.closed {
            state.closed = true;
            state.history.push("close".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// DOCUMENT SNAPSHOT
// =============================================================================

enum CompiledSelector {
    Role(AriaRole),
    TestId(String),
    Css(scraper::Selector),
}

impl CompiledSelector {
    fn compile(selector: &Selector) -> ScoutResult<Self> {
        Ok(match selector {
            Selector::Role(role) => Self::Role(*role),
            Selector::TestId(id) => Self::TestId(id.clone()),
            Selector::Css(css) => Self::Css(scraper::Selector::parse(css).map_err(|e| {
                ScoutError::InvalidSelector {
                    selector: css.clone(),
                    message: e.to_string(),
                }
            })?),
        })
    }

    fn matches(&self, element: ElementRef<'_>) -> bool {
        match self {
            Self::Role(role) => element_role(element) == Some(*role) && is_visible(element),
            Self::TestId(id) => element.value().attr("data-testid") == Some(id.as_str()),
            Self::Css(css) => css.matches(&element),
        }
    }
}

/// Every element of a parsed document, in document (pre-)order
struct Snapshot<'a> {
    elements: Vec<ElementRef<'a>>,
}

impl<'a> Snapshot<'a> {
    fn new(html: &'a Html) -> Self {
        Self {
            elements: html
                .root_element()
                .descendants()
                .filter_map(ElementRef::wrap)
                .collect(),
        }
    }

    fn element(&self, index: usize) -> Option<ElementRef<'a>> {
        self.elements.get(index).copied()
    }

    /// Exclusive index bounds of the element's subtree
    fn subtree(&self, index: usize) -> Option<(usize, usize)> {
        let root = self.elements.get(index)?;
        let size = root
            .descendants()
            .filter(|node| node.value().is_element())
            .count();
        Some((index, index + size))
    }

    fn by_id(&self, id: &str) -> Option<ElementRef<'a>> {
        self.elements
            .iter()
            .copied()
            .find(|e| e.value().id() == Some(id))
    }

    fn handle(&self, generation: u64, index: usize) -> ElementHandle {
        let element = self.elements[index];
        let role = element_role(element);
        ElementHandle {
            id: format!("{generation}:{index}"),
            tag_name: element.value().name().to_string(),
            role,
            name: self.accessible_name(element, role),
            text_content: Some(element.text().collect()),
            visible: is_visible(element),
        }
    }

    fn accessible_name(&self, element: ElementRef<'a>, role: Option<AriaRole>) -> String {
        let e = element.value();
        if let Some(label) = non_empty(e.attr("aria-label")) {
            return label;
        }
        if let Some(ids) = e.attr("aria-labelledby") {
            let text: Vec<String> = ids
                .split_whitespace()
                .filter_map(|id| self.by_id(id))
                .map(visible_text)
                .collect();
            if let Some(label) = non_empty(Some(text.join(" "))) {
                return label;
            }
        }
        if matches!(e.name(), "input" | "textarea" | "select") {
            if role == Some(AriaRole::Button) {
                let fallback = match input_type(e).as_str() {
                    "submit" => "Submit",
                    "reset" => "Reset",
                    _ => "",
                };
                return non_empty(e.attr("value")).unwrap_or_else(|| fallback.to_string());
            }
            if let Some(label) = self.label_text(element) {
                return label;
            }
            if let Some(placeholder) = non_empty(e.attr("placeholder")) {
                return placeholder;
            }
        }
        if role.is_some_and(|r| r.name_from_content()) {
            if let Some(text) = non_empty(Some(visible_text(element))) {
                return text;
            }
        }
        non_empty(e.attr("title")).unwrap_or_default()
    }

    fn label_text(&self, element: ElementRef<'a>) -> Option<String> {
        if let Some(id) = element.value().id() {
            let explicit = self
                .elements
                .iter()
                .filter(|e| e.value().name() == "label" && e.value().attr("for") == Some(id))
                .map(|e| visible_text(*e))
                .collect::<Vec<_>>()
                .join(" ");
            if let Some(label) = non_empty(Some(explicit)) {
                return Some(label);
            }
        }
        element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|a| a.value().name() == "label")
            .and_then(|label| non_empty(Some(visible_text(label))))
    }

    fn field_value(&self, name: &str, values: &HashMap<usize, String>) -> String {
        self.elements
            .iter()
            .position(|e| {
                matches!(e.value().name(), "input" | "textarea" | "select")
                    && e.value().attr("name") == Some(name)
            })
            .map(|i| {
                values.get(&i).cloned().unwrap_or_else(|| {
                    self.elements[i]
                        .value()
                        .attr("value")
                        .unwrap_or_default()
                        .to_string()
                })
            })
            .unwrap_or_default()
    }

    /// Where a click on the element leads, if anywhere
    fn navigation_target(&self, index: usize, values: &HashMap<usize, String>) -> Option<String> {
        let element = self.element(index)?;
        std::iter::once(element)
            .chain(element.ancestors().filter_map(ElementRef::wrap))
            .find_map(|e| {
                let v = e.value();
                if let Some(template) = v.attr("data-href") {
                    return Some(self.expand_template(template, values));
                }
                v.attr("href")
                    .filter(|_| matches!(v.name(), "a" | "area"))
                    .filter(|href| !href.starts_with('#') && !href.starts_with("javascript:"))
                    .map(str::to_string)
            })
    }

    fn expand_template(&self, template: &str, values: &HashMap<usize, String>) -> String {
        let mut out = String::new();
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                out.push_str(&rest[open..]);
                return out;
            };
            let placeholder = &after[..close];
            let (field, default) = placeholder.split_once('|').unwrap_or((placeholder, ""));
            let value = slugify(&self.field_value(field, values));
            out.push_str(if value.is_empty() { default } else { &value });
            rest = &after[close + 1..];
        }
        out.push_str(rest);
        out
    }
}

// =============================================================================
// ARIA COMPUTATION
// =============================================================================

fn input_type(e: &Element) -> String {
    e.attr("type").unwrap_or("text").trim().to_ascii_lowercase()
}

fn element_role(element: ElementRef<'_>) -> Option<AriaRole> {
    let e = element.value();
    if let Some(explicit) = e.attr("role") {
        return explicit.split_whitespace().find_map(AriaRole::parse);
    }
    match e.name() {
        "a" | "area" if e.attr("href").is_some() => Some(AriaRole::Link),
        "button" => Some(AriaRole::Button),
        "input" => {
            let has_list = e.attr("list").is_some();
            match input_type(e).as_str() {
                "button" | "submit" | "reset" | "image" => Some(AriaRole::Button),
                "checkbox" => Some(AriaRole::Checkbox),
                "text" | "search" | "email" | "tel" | "url" | "password" if has_list => {
                    Some(AriaRole::Combobox)
                }
                "search" => Some(AriaRole::Searchbox),
                "text" | "email" | "tel" | "url" | "password" => Some(AriaRole::Textbox),
                _ => None,
            }
        }
        "textarea" => Some(AriaRole::Textbox),
        "select" => Some(AriaRole::Combobox),
        "nav" => Some(AriaRole::Navigation),
        "li" => Some(AriaRole::ListItem),
        "ul" | "ol" => Some(AriaRole::List),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Some(AriaRole::Heading),
        _ => None,
    }
}

fn hides_subtree(element: ElementRef<'_>) -> bool {
    let e = element.value();
    if matches!(e.name(), "head" | "script" | "style" | "template" | "noscript")
        || e.attr("hidden").is_some()
        || (e.name() == "input" && input_type(e) == "hidden")
    {
        return true;
    }
    e.attr("style").is_some_and(|style| {
        let style: String = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        style.contains("display:none") || style.contains("visibility:hidden")
    })
}

fn is_visible(element: ElementRef<'_>) -> bool {
    !hides_subtree(element)
        && !element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(hides_subtree)
}

fn visible_text(element: ElementRef<'_>) -> String {
    fn collect(element: ElementRef<'_>, out: &mut String) {
        for child in element.children() {
            if let Some(text) = child.value().as_text() {
                out.push_str(text);
            } else if let Some(child) = ElementRef::wrap(child) {
                if !hides_subtree(child) {
                    collect(child, out);
                }
            }
        }
    }
    let mut out = String::new();
    collect(element, &mut out);
    out
}

fn is_editable(element: ElementRef<'_>) -> bool {
    let e = element.value();
    match e.name() {
        "textarea" => true,
        "input" => !matches!(
            input_type(e).as_str(),
            "hidden" | "button" | "submit" | "reset" | "image" | "checkbox" | "radio" | "file"
        ),
        _ => {
            e.attr("contenteditable").is_some_and(|v| v != "false")
                || element_role(element).is_some_and(|r| r.is_editable())
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn non_empty<S: AsRef<str>>(text: Option<S>) -> Option<String> {
    text.map(|t| normalize_whitespace(t.as_ref()))
        .filter(|t| !t.is_empty())
}

fn route_key(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

fn parse_handle_id(id: &str, generation: u64) -> Option<usize> {
    let (gen, index) = id.split_once(':')?;
    (gen.parse::<u64>().ok()? == generation)
        .then(|| index.parse().ok())
        .flatten()
}

fn detached(handle: &ElementHandle) -> ScoutError {
    ScoutError::NotInteractable {
        locator: handle.describe(),
        reason: DETACHED.to_string(),
    }
}

fn attached_index(state: &SiteState, handle: &ElementHandle) -> ScoutResult<usize> {
    parse_handle_id(&handle.id, state.generation).ok_or_else(|| detached(handle))
}

fn slugify(text: &str) -> String {
    let mut slug = String::new();
    for c in text.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}
