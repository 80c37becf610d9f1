//! Result and error types for eventscout.

use thiserror::Error;

/// Result type for eventscout operations
pub type ScoutResult<T> = Result<T, ScoutError>;

/// Errors that can occur while resolving locators or driving a page
#[derive(Debug, Error)]
pub enum ScoutError {
    /// A locator matched zero elements where one was required
    #[error("No element matches {locator}")]
    ElementNotFound {
        /// Rendered locator description
        locator: String,
    },

    /// A strict action matched more than one element
    #[error("{locator} resolved to {count} elements, expected exactly one")]
    Ambiguous {
        /// Rendered locator description
        locator: String,
        /// Number of matches
        count: usize,
    },

    /// Operation timed out
    #[error("Timed out after {ms}ms waiting for {waited_for}")]
    Timeout {
        /// Description of the unmet condition
        waited_for: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// The element exists but the primitive cannot act on it
    #[error("Cannot interact with {locator}: {reason}")]
    NotInteractable {
        /// Element or locator description
        locator: String,
        /// Why the action was refused
        reason: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Engine selector could not be parsed
    #[error("Invalid selector {selector:?}: {message}")]
    InvalidSelector {
        /// The selector text
        selector: String,
        /// Parser message
        message: String,
    },

    /// Name or URL pattern failed to compile
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Caller supplied an argument the operation cannot accept
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Engine-level failure
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// The page context was closed by its owner
    #[error("Page context is closed")]
    PageClosed,

    /// Fixture error (setup/teardown failed)
    #[error("Fixture error: {message}")]
    Fixture {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parse error
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl ScoutError {
    /// Shorthand for an engine failure
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// True for resolution failures (zero matches)
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ElementNotFound { .. })
    }

    /// True for wait-condition timeouts
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
