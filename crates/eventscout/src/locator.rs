//! Locator abstraction for element selection.
//!
//! A [`Locator`] is an unevaluated query description. It is immutable once
//! built and never caches a result: every evaluation against a
//! [`Page`](crate::Page) reflects the live DOM.
//!
//! # Design Philosophy
//!
//! - **Role First**: elements are found by ARIA role and accessible name
//! - **Explicit Scoping**: a scoped locator holds its container and composes
//!   with it at evaluation time, so lookups never leak across regions
//! - **Ordered Steps**: name, text and descendant filters plus ordinal picks
//!   run in the order they were chained
//! - **Fluent API**: chainable methods return new locators

use crate::role::{AriaRole, TextMatch};
use std::fmt;
use std::sync::Arc;

/// Engine-level selector: what the automation engine resolves by itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// Elements whose computed role equals the role (hidden ones excluded)
    Role(AriaRole),
    /// Test ID selector (data-testid attribute)
    TestId(String),
    /// CSS selector (e.g., "h1, h2")
    Css(String),
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Role(role) => write!(f, "role={role}"),
            Self::TestId(id) => write!(f, "test-id={id:?}"),
            Self::Css(css) => write!(f, "css={css:?}"),
        }
    }
}

/// Ordinal pick applied to the current match list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nth {
    /// First match in document order
    First,
    /// Last match in document order
    Last,
    /// Zero-based index
    Index(usize),
}

impl Nth {
    /// Keep at most one item of `items`
    #[must_use]
    pub fn pick<T>(self, mut items: Vec<T>) -> Vec<T> {
        let index = match self {
            Self::First => 0,
            Self::Last => items.len().saturating_sub(1),
            Self::Index(i) => i,
        };
        if index < items.len() {
            vec![items.swap_remove(index)]
        } else {
            Vec::new()
        }
    }
}

/// One refinement in a locator's pipeline
#[derive(Debug, Clone)]
pub enum Step {
    /// Keep elements whose accessible name matches
    Name(TextMatch),
    /// Keep elements whose text content matches
    HasText(TextMatch),
    /// Keep elements containing at least one match of the inner locator
    Has(Arc<Locator>),
    /// Keep a single element by position
    Nth(Nth),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(m) => write!(f, "[name={m}]"),
            Self::HasText(m) => write!(f, " >> has-text={m}"),
            Self::Has(inner) => write!(f, " >> has=({inner})"),
            Self::Nth(Nth::First) => write!(f, " >> nth=0"),
            Self::Nth(Nth::Last) => write!(f, " >> nth=-1"),
            Self::Nth(Nth::Index(i)) => write!(f, " >> nth={i}"),
        }
    }
}

/// An immutable, re-evaluable element query.
///
/// The scope chain only ever points at locators that existed before the
/// child was built, so it is acyclic by construction.
#[derive(Debug, Clone)]
pub struct Locator {
    selector: Selector,
    scope: Option<Arc<Locator>>,
    steps: Vec<Step>,
}

impl Locator {
    /// Create a locator from a selector
    #[must_use]
    pub fn from_selector(selector: Selector) -> Self {
        Self {
            selector,
            scope: None,
            steps: Vec::new(),
        }
    }

    /// All elements with a role
    #[must_use]
    pub fn role(role: AriaRole) -> Self {
        Self::from_selector(Selector::Role(role))
    }

    /// Elements carrying `data-testid`
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::from_selector(Selector::test_id(id))
    }

    /// Elements matching a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::from_selector(Selector::css(selector))
    }

    /// Restrict by accessible name
    #[must_use]
    pub fn named(mut self, name: impl Into<TextMatch>) -> Self {
        self.steps.push(Step::Name(name.into()));
        self
    }

    /// Set the container this locator searches within, replacing any previous one
    #[must_use]
    pub fn within(mut self, scope: &Locator) -> Self {
        self.scope = Some(Arc::new(scope.clone()));
        self
    }

    /// Child locator by role, scoped to this one
    #[must_use]
    pub fn get_by_role(&self, role: AriaRole, name: Option<TextMatch>) -> Self {
        let child = Self::role(role).within(self);
        match name {
            Some(name) => child.named(name),
            None => child,
        }
    }

    /// Child locator by test id, scoped to this one
    #[must_use]
    pub fn get_by_test_id(&self, id: impl Into<String>) -> Self {
        Self::test_id(id).within(self)
    }

    /// Child locator by CSS, scoped to this one
    #[must_use]
    pub fn locator(&self, css: impl Into<String>) -> Self {
        Self::css(css).within(self)
    }

    /// Keep only elements whose text content matches
    #[must_use]
    pub fn filter_has_text(mut self, text: impl Into<TextMatch>) -> Self {
        self.steps.push(Step::HasText(text.into()));
        self
    }

    /// Keep only elements that contain a match of `inner` (evaluated relative to each candidate)
    #[must_use]
    pub fn filter_has(mut self, inner: Locator) -> Self {
        self.steps.push(Step::Has(Arc::new(inner)));
        self
    }

    /// First match
    #[must_use]
    pub fn first(self) -> Self {
        self.nth_step(Nth::First)
    }

    /// Last match
    #[must_use]
    pub fn last(self) -> Self {
        self.nth_step(Nth::Last)
    }

    /// Match at a zero-based index
    #[must_use]
    pub fn nth(self, index: usize) -> Self {
        self.nth_step(Nth::Index(index))
    }

    fn nth_step(mut self, nth: Nth) -> Self {
        self.steps.push(Step::Nth(nth));
        self
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Get the container, if scoped
    #[must_use]
    pub fn scope(&self) -> Option<&Locator> {
        self.scope.as_deref()
    }

    /// Get the refinement steps in evaluation order
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Number of containers above this locator
    #[must_use]
    pub fn depth(&self) -> usize {
        self.scope.as_ref().map_or(0, |s| 1 + s.depth())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scope) = &self.scope {
            write!(f, "{scope} >> ")?;
        }
        write!(f, "{}", self.selector)?;
        for step in &self.steps {
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

/// Builds a fresh locator per label for regions whose members are open-ended
/// (category names, tab names, event titles, neighbourhoods).
///
/// Pure: `get` has no hidden state and never touches the page.
#[derive(Debug, Clone)]
pub struct LocatorFactory {
    role: AriaRole,
    scope: Option<Locator>,
}

impl LocatorFactory {
    /// Factory for a role anywhere on the page
    #[must_use]
    pub const fn new(role: AriaRole) -> Self {
        Self { role, scope: None }
    }

    /// Factory for a role inside a fixed container
    #[must_use]
    pub fn within(scope: &Locator, role: AriaRole) -> Self {
        Self {
            role,
            scope: Some(scope.clone()),
        }
    }

    /// Locator for `label`, matched case-insensitively as a substring
    #[must_use]
    pub fn get(&self, label: &str) -> Locator {
        self.build(TextMatch::loose(label))
    }

    /// Locator for `label`, matched exactly
    #[must_use]
    pub fn get_exact(&self, label: &str) -> Locator {
        self.build(TextMatch::exact(label))
    }

    fn build(&self, name: TextMatch) -> Locator {
        match &self.scope {
            Some(scope) => scope.get_by_role(self.role, Some(name)),
            None => Locator::role(self.role).named(name),
        }
    }

    /// Role produced by this factory
    #[must_use]
    pub const fn role(&self) -> AriaRole {
        self.role
    }

    /// Container, if any
    #[must_use]
    pub const fn scope(&self) -> Option<&Locator> {
        self.scope.as_ref()
    }
}

/// Outcome of fallback resolution: exactly one arm, never a mix.
#[derive(Debug, Clone)]
pub enum FallbackChoice {
    /// The primary locator matched at least one element
    Primary(Locator),
    /// The primary matched nothing, so the fallback was chosen
    Fallback(Locator),
}

impl FallbackChoice {
    /// The chosen locator
    #[must_use]
    pub const fn locator(&self) -> &Locator {
        match self {
            Self::Primary(l) | Self::Fallback(l) => l,
        }
    }

    /// Consume into the chosen locator
    #[must_use]
    pub fn into_locator(self) -> Locator {
        match self {
            Self::Primary(l) | Self::Fallback(l) => l,
        }
    }

    /// True when the fallback arm was taken
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}
