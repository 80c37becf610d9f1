//! ARIA roles and accessible-name matching.
//!
//! Roles are a closed set: a role the engine reports that is not listed here
//! never matches a role query, it is not an error. Names are matched by
//! [`TextMatch`], which is where the case policy for free-text labels lives.

use crate::result::ScoutResult;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// ARIA roles the locator layer can query by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AriaRole {
    /// Live alert region
    Alert,
    /// Push button
    Button,
    /// Checkbox
    Checkbox,
    /// Text input with a popup (autocomplete, select)
    Combobox,
    /// h1-h6
    Heading,
    /// Hyperlink
    Link,
    /// ul/ol
    List,
    /// li
    #[serde(rename = "listitem")]
    ListItem,
    /// Landmark navigation region
    Navigation,
    /// Search input
    Searchbox,
    /// Tab in a tablist
    Tab,
    /// Container of tabs
    Tablist,
    /// Single or multi-line text input
    Textbox,
}

impl AriaRole {
    /// Every known role
    pub const ALL: [Self; 13] = [
        Self::Alert,
        Self::Button,
        Self::Checkbox,
        Self::Combobox,
        Self::Heading,
        Self::Link,
        Self::List,
        Self::ListItem,
        Self::Navigation,
        Self::Searchbox,
        Self::Tab,
        Self::Tablist,
        Self::Textbox,
    ];

    /// ARIA attribute value
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Alert => "alert",
            Self::Button => "button",
            Self::Checkbox => "checkbox",
            Self::Combobox => "combobox",
            Self::Heading => "heading",
            Self::Link => "link",
            Self::List => "list",
            Self::ListItem => "listitem",
            Self::Navigation => "navigation",
            Self::Searchbox => "searchbox",
            Self::Tab => "tab",
            Self::Tablist => "tablist",
            Self::Textbox => "textbox",
        }
    }

    /// Parse an explicit `role` attribute. Unknown roles yield `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|role| role.as_str().eq_ignore_ascii_case(value))
    }

    /// Whether the accessible name is computed from the element's content
    #[must_use]
    pub const fn name_from_content(&self) -> bool {
        matches!(
            self,
            Self::Button
                | Self::Checkbox
                | Self::Heading
                | Self::Link
                | Self::ListItem
                | Self::Tab
        )
    }

    /// Whether a `fill` can target an element with this role
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self, Self::Combobox | Self::Searchbox | Self::Textbox)
    }
}

impl fmt::Display for AriaRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collapse runs of whitespace and trim, the way accessible names are compared
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// How an accessible name or text content is matched.
#[derive(Debug, Clone)]
pub enum TextMatch {
    /// Whitespace-normalised, case-sensitive equality
    Exact(String),
    /// Case-insensitive substring of the normalised text
    Loose(String),
    /// Regular expression against the raw text
    Pattern(Regex),
}

impl TextMatch {
    /// Exact label, for names whose uniqueness the caller has verified
    #[must_use]
    pub fn exact(label: impl Into<String>) -> Self {
        Self::Exact(normalize_whitespace(&label.into()))
    }

    /// Case-insensitive substring, for free-text labels of unknown casing
    #[must_use]
    pub fn loose(label: impl Into<String>) -> Self {
        Self::Loose(normalize_whitespace(&label.into()).to_lowercase())
    }

    /// Compile a regular expression. Use `(?i)` for case-insensitivity.
    pub fn pattern(pattern: &str) -> ScoutResult<Self> {
        Ok(Self::Pattern(Regex::new(pattern)?))
    }

    /// Check a candidate text
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Self::Exact(expected) => normalize_whitespace(text) == *expected,
            Self::Loose(needle) => normalize_whitespace(text).to_lowercase().contains(needle),
            Self::Pattern(re) => re.is_match(text),
        }
    }
}

impl From<&str> for TextMatch {
    fn from(label: &str) -> Self {
        Self::exact(label)
    }
}

impl From<Regex> for TextMatch {
    fn from(re: Regex) -> Self {
        Self::Pattern(re)
    }
}

impl fmt::Display for TextMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(s) => write!(f, "{s:?}"),
            Self::Loose(s) => write!(f, "{s:?}i"),
            Self::Pattern(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod aria_role_tests {
        use super::*;

        #[test]
        fn test_parse_known_roles() {
            assert_eq!(AriaRole::parse("tab"), Some(AriaRole::Tab));
            assert_eq!(AriaRole::parse(" TabList "), Some(AriaRole::Tablist));
            assert_eq!(AriaRole::parse("listitem"), Some(AriaRole::ListItem));
        }

        #[test]
        fn test_unknown_role_is_none() {
            assert_eq!(AriaRole::parse("presentation"), None);
            assert_eq!(AriaRole::parse(""), None);
        }

        #[test]
        fn test_as_str_round_trips_through_parse() {
            for role in AriaRole::ALL {
                assert_eq!(AriaRole::parse(role.as_str()), Some(role));
            }
        }

        #[test]
        fn test_editable_roles() {
            assert!(AriaRole::Textbox.is_editable());
            assert!(AriaRole::Searchbox.is_editable());
            assert!(!AriaRole::Link.is_editable());
        }

        #[test]
        fn test_serde_lowercase() {
            let json = serde_json::to_string(&AriaRole::ListItem).unwrap();
            assert_eq!(json, "\"listitem\"");
            let role: AriaRole = serde_json::from_str("\"searchbox\"").unwrap();
            assert_eq!(role, AriaRole::Searchbox);
        }
    }

    mod text_match_tests {
        use super::*;

        #[test]
        fn test_exact_is_case_sensitive() {
            let m = TextMatch::exact("Music");
            assert!(m.matches("Music"));
            assert!(m.matches("  Music \n"));
            assert!(!m.matches("music"));
            assert!(!m.matches("Music Festivals"));
        }

        #[test]
        fn test_loose_is_case_insensitive_substring() {
            let m = TextMatch::loose("MUSIC");
            assert!(m.matches("Music"));
            assert!(m.matches("Live music tonight"));
            assert!(!m.matches("Nightlife"));
        }

        #[test]
        fn test_loose_substring_overmatch_is_preserved() {
            // "Arts" also matches "Performing & Visual Arts"
            let m = TextMatch::loose("arts");
            assert!(m.matches("Performing & Visual Arts"));
        }

        #[test]
        fn test_pattern_alternation() {
            let m = TextMatch::pattern("(?i)autocomplete|choose a location").unwrap();
            assert!(m.matches("Choose a location"));
            assert!(m.matches("autocomplete"));
            assert!(!m.matches("Search events"));
        }

        #[test]
        fn test_invalid_pattern_errors() {
            assert!(TextMatch::pattern("(").is_err());
        }

        #[test]
        fn test_display() {
            assert_eq!(TextMatch::exact("Log In").to_string(), "\"Log In\"");
            assert_eq!(TextMatch::loose("Music").to_string(), "\"music\"i");
            assert_eq!(
                TextMatch::pattern("(?i)email").unwrap().to_string(),
                "/(?i)email/"
            );
        }

        #[test]
        fn test_from_str_is_exact() {
            let m: TextMatch = "Continue".into();
            assert!(matches!(m, TextMatch::Exact(_)));
        }
    }
}
