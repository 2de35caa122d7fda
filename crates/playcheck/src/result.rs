//! Result and error types for Playcheck.

use thiserror::Error;

/// Protocol replies sent while the page is between documents
const CONTEXT_LOST: [&str; 4] = [
    "Execution context was destroyed",
    "Cannot find context with specified id",
    "Cannot find default execution context",
    "Inspected target navigated or closed",
];

/// Result type for Playcheck operations
pub type PlaycheckResult<T> = Result<T, PlaycheckError>;

/// Errors that can occur while driving a browser or running a scenario
#[derive(Debug, Error)]
pub enum PlaycheckError {
    /// Browser executable not found
    #[error("Browser not found. Install Chromium or set PLAYCHECK_CHROMIUM_PATH")]
    BrowserNotFound,

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Page or protocol error
    #[error("Page error: {message}")]
    PageError {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// JavaScript evaluation error
    #[error("Evaluation failed: {message}")]
    EvaluationError {
        /// Error message
        message: String,
    },

    /// Input simulation error
    #[error("Input simulation failed: {message}")]
    InputError {
        /// Error message
        message: String,
    },

    /// Operation timed out
    #[error("Timed out after {ms}ms: {waiting_for}")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
        /// What was being waited for, including the last observation
        waiting_for: String,
    },

    /// No element matched a locator
    #[error("No element matches {selector}")]
    ElementNotFound {
        /// Locator description
        selector: String,
    },

    /// An action needed exactly one element but the locator matched several
    #[error("Strict mode violation: {selector} resolved to {count} elements")]
    StrictModeViolation {
        /// Locator description
        selector: String,
        /// Number of matched elements
        count: usize,
    },

    /// The element exists but cannot receive the action
    #[error("Element {selector} is not actionable: {reason}")]
    NotActionable {
        /// Locator description
        selector: String,
        /// Why the action was refused
        reason: String,
    },

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Dialog handling error
    #[error("Dialog error: {message}")]
    DialogError {
        /// Error message
        message: String,
    },

    /// Download error
    #[error("Download failed: {message}")]
    DownloadError {
        /// Error message
        message: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PlaycheckError {
    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a page error
    #[must_use]
    pub fn page(message: impl Into<String>) -> Self {
        Self::PageError {
            message: message.into(),
        }
    }

    /// Create an input error
    #[must_use]
    pub fn input(message: impl Into<String>) -> Self {
        Self::InputError {
            message: message.into(),
        }
    }

    /// Create an evaluation error
    #[must_use]
    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::EvaluationError {
            message: message.into(),
        }
    }

    /// Classify a failed protocol call.
    ///
    /// Replies meaning the document was swapped out mid-call (a navigation
    /// destroyed the execution context) become evaluation errors so polling
    /// loops retry them; anything else is a page error.
    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        let message = message.into();
        if CONTEXT_LOST.iter().any(|lost| message.contains(lost)) {
            Self::EvaluationError { message }
        } else {
            Self::PageError { message }
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Whether the error is worth retrying inside a polling loop.
    ///
    /// Element lookups and actionability checks settle as the page renders;
    /// protocol and configuration failures do not.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ElementNotFound { .. }
                | Self::NotActionable { .. }
                | Self::StrictModeViolation { .. }
                | Self::AssertionFailed { .. }
                | Self::EvaluationError { .. }
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlaycheckError::BrowserNotFound;
        assert!(err.to_string().contains("Browser not found"));

        let err = PlaycheckError::StrictModeViolation {
            selector: "css=button".to_string(),
            count: 3,
        };
        assert_eq!(
            err.to_string(),
            "Strict mode violation: css=button resolved to 3 elements"
        );

        let err = PlaycheckError::Timeout {
            ms: 5000,
            waiting_for: "css=#finish to be visible".to_string(),
        };
        assert!(err.to_string().contains("5000ms"));
        assert!(err.to_string().contains("#finish"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(PlaycheckError::ElementNotFound {
            selector: "x".into()
        }
        .is_transient());
        assert!(PlaycheckError::assertion("nope").is_transient());
        assert!(!PlaycheckError::BrowserNotFound.is_transient());
        assert!(!PlaycheckError::config("bad").is_transient());
    }

    #[test]
    fn test_lost_context_is_transient() {
        let err = PlaycheckError::protocol("Execution context was destroyed.");
        assert!(matches!(err, PlaycheckError::EvaluationError { .. }));
        assert!(err.is_transient());
        assert!(PlaycheckError::protocol("Cannot find context with specified id").is_transient());

        let err = PlaycheckError::protocol("Target closed");
        assert!(matches!(err, PlaycheckError::PageError { .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: PlaycheckError = io.into();
        assert!(err.to_string().starts_with("I/O error"));
    }

    #[test]
    fn test_from_json_error() {
        let json = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: PlaycheckError = json.into();
        assert!(err.to_string().starts_with("JSON error"));
    }
}
