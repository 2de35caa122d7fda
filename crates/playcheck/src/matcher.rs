//! Text and URL matchers shared by selectors and assertions.
//!
//! Text comparisons normalise whitespace the way rendered text reads: runs of
//! spaces, tabs, newlines and non-breaking spaces collapse to a single space
//! and the ends are trimmed. Regular expressions see the raw text.

use crate::result::{PlaycheckError, PlaycheckResult};
use serde_json::{json, Value};
use std::fmt;

/// Collapse whitespace runs to single spaces and trim the ends
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A regular expression usable on both sides of the protocol.
///
/// The Rust side matches with the `regex` crate; the page side receives the
/// source and flags and builds a `RegExp`. Only the common subset of both
/// syntaxes should be used.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: regex::Regex,
    source: String,
    ignore_case: bool,
}

impl Pattern {
    /// Compile a case-sensitive pattern
    ///
    /// # Errors
    ///
    /// Returns error if the pattern is not a valid regular expression
    pub fn new(source: &str) -> PlaycheckResult<Self> {
        Self::build(source, false)
    }

    /// Compile a case-insensitive pattern
    ///
    /// # Errors
    ///
    /// Returns error if the pattern is not a valid regular expression
    pub fn ignore_case(source: &str) -> PlaycheckResult<Self> {
        Self::build(source, true)
    }

    fn build(source: &str, ignore_case: bool) -> PlaycheckResult<Self> {
        let regex = regex::RegexBuilder::new(source)
            .case_insensitive(ignore_case)
            .build()
            .map_err(|e| PlaycheckError::config(format!("invalid pattern /{source}/: {e}")))?;
        Ok(Self {
            regex,
            source: source.to_string(),
            ignore_case,
        })
    }

    /// Whether the pattern matches anywhere in `text`
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Pattern source
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether matching ignores case
    #[must_use]
    pub const fn is_ignore_case(&self) -> bool {
        self.ignore_case
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, if self.ignore_case { "i" } else { "" })
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.ignore_case == other.ignore_case
    }
}

/// How a piece of text is matched
#[derive(Debug, Clone, PartialEq)]
pub enum TextMatcher {
    /// Whole text equals the value after whitespace normalisation
    Exact(String),
    /// Text contains the value (case-sensitive)
    Contains(String),
    /// Text contains the value, ignoring case (selector default)
    Loose(String),
    /// Regular expression search
    Pattern(Pattern),
}

impl TextMatcher {
    /// Exact matcher
    #[must_use]
    pub fn exact(value: impl Into<String>) -> Self {
        Self::Exact(value.into())
    }

    /// Case-sensitive substring matcher
    #[must_use]
    pub fn contains(value: impl Into<String>) -> Self {
        Self::Contains(value.into())
    }

    /// Case-insensitive substring matcher
    #[must_use]
    pub fn loose(value: impl Into<String>) -> Self {
        Self::Loose(value.into())
    }

    /// Regular expression matcher
    ///
    /// # Errors
    ///
    /// Returns error if the pattern is invalid
    pub fn regex(source: &str) -> PlaycheckResult<Self> {
        Pattern::new(source).map(Self::Pattern)
    }

    /// Case-insensitive regular expression matcher
    ///
    /// # Errors
    ///
    /// Returns error if the pattern is invalid
    pub fn regex_ignore_case(source: &str) -> PlaycheckResult<Self> {
        Pattern::ignore_case(source).map(Self::Pattern)
    }

    /// Test a string against the matcher
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Self::Exact(expected) => normalize_whitespace(text) == normalize_whitespace(expected),
            Self::Contains(expected) => {
                normalize_whitespace(text).contains(&normalize_whitespace(expected))
            }
            Self::Loose(expected) => normalize_whitespace(text)
                .to_lowercase()
                .contains(&normalize_whitespace(expected).to_lowercase()),
            Self::Pattern(pattern) => pattern.is_match(text),
        }
    }

    /// Serialised form understood by the in-page runtime
    #[must_use]
    pub fn to_js(&self) -> Value {
        match self {
            Self::Exact(v) => json!({ "kind": "exact", "value": v }),
            Self::Contains(v) => json!({ "kind": "contains", "value": v }),
            Self::Loose(v) => json!({ "kind": "loose", "value": v }),
            Self::Pattern(p) => json!({
                "kind": "regex",
                "value": p.source(),
                "ignoreCase": p.is_ignore_case(),
            }),
        }
    }
}

impl fmt::Display for TextMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(v) => write!(f, "{v:?}"),
            Self::Contains(v) => write!(f, "text containing {v:?}"),
            Self::Loose(v) => write!(f, "text containing {v:?} (any case)"),
            Self::Pattern(p) => write!(f, "{p}"),
        }
    }
}

impl From<&str> for TextMatcher {
    fn from(value: &str) -> Self {
        Self::Exact(value.to_string())
    }
}

impl From<String> for TextMatcher {
    fn from(value: String) -> Self {
        Self::Exact(value)
    }
}

impl From<&String> for TextMatcher {
    fn from(value: &String) -> Self {
        Self::Exact(value.clone())
    }
}

impl From<Pattern> for TextMatcher {
    fn from(value: Pattern) -> Self {
        Self::Pattern(value)
    }
}

/// URL matcher for `wait_for_url` and `to_have_url`
#[derive(Debug, Clone, PartialEq)]
pub enum UrlMatcher {
    /// Exact URL match
    Exact(String),
    /// Glob pattern: `**` matches anything, `*` anything but `/`
    Glob(String),
    /// Regular expression search
    Pattern(Pattern),
}

impl UrlMatcher {
    /// Exact matcher
    #[must_use]
    pub fn exact(url: impl Into<String>) -> Self {
        Self::Exact(url.into())
    }

    /// Glob matcher
    #[must_use]
    pub fn glob(pattern: impl Into<String>) -> Self {
        Self::Glob(pattern.into())
    }

    /// Regular expression matcher
    ///
    /// # Errors
    ///
    /// Returns error if the pattern is invalid
    pub fn regex(source: &str) -> PlaycheckResult<Self> {
        Pattern::new(source).map(Self::Pattern)
    }

    /// Check if a URL matches
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Self::Exact(expected) => url == expected,
            Self::Glob(pattern) => glob_matches(pattern, url),
            Self::Pattern(pattern) => pattern.is_match(url),
        }
    }
}

impl fmt::Display for UrlMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(v) => write!(f, "{v:?}"),
            Self::Glob(v) => write!(f, "glob {v:?}"),
            Self::Pattern(p) => write!(f, "{p}"),
        }
    }
}

impl From<&str> for UrlMatcher {
    fn from(value: &str) -> Self {
        Self::Exact(value.to_string())
    }
}

impl From<String> for UrlMatcher {
    fn from(value: String) -> Self {
        Self::Exact(value)
    }
}

impl From<Pattern> for UrlMatcher {
    fn from(value: Pattern) -> Self {
        Self::Pattern(value)
    }
}

/// Glob match where `**` spans path separators and `*` does not
fn glob_matches(pattern: &str, url: &str) -> bool {
    let mut source = String::from("^");
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '*' {
            if chars.peek() == Some(&'*') {
                chars.next();
                source.push_str(".*");
            } else {
                source.push_str("[^/]*");
            }
        } else {
            source.push_str(&regex::escape(&c.to_string()));
        }
    }
    source.push('$');
    regex::Regex::new(&source)
        .map(|re| re.is_match(url))
        .unwrap_or(false)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    mod normalize_tests {
        use super::*;

        #[test]
        fn test_collapses_runs() {
            assert_eq!(normalize_whitespace("  Swag\n\t  Labs  "), "Swag Labs");
            assert_eq!(normalize_whitespace("a\u{a0}\u{a0}b"), "a b");
            assert_eq!(normalize_whitespace(""), "");
        }
    }

    mod text_matcher_tests {
        use super::*;

        #[test]
        fn test_exact() {
            let m = TextMatcher::exact("Epic sadface: Username is required");
            assert!(m.matches("Epic sadface: Username is required"));
            assert!(m.matches("  Epic sadface:\nUsername is required "));
            assert!(!m.matches("Epic sadface: Username is required!"));
        }

        #[test]
        fn test_contains_is_case_sensitive() {
            let m = TextMatcher::contains("locked out");
            assert!(m.matches("Epic sadface: Sorry, this user has been locked out."));
            assert!(!m.matches("LOCKED OUT"));
        }

        #[test]
        fn test_loose_ignores_case() {
            let m = TextMatcher::loose("add to cart");
            assert!(m.matches("Add to cart"));
            assert!(!m.matches("Remove"));
        }

        #[test]
        fn test_regex() {
            let m = TextMatcher::regex(r"^\d+ items? left$").unwrap();
            assert!(m.matches("2 items left"));
            assert!(m.matches("1 item left"));
            assert!(!m.matches("items left"));

            let m = TextMatcher::regex_ignore_case("add to cart").unwrap();
            assert!(m.matches("ADD TO CART"));
        }

        #[test]
        fn test_invalid_regex() {
            assert!(TextMatcher::regex("(unclosed").is_err());
        }

        #[test]
        fn test_from_str_is_exact() {
            let m: TextMatcher = "Swag Labs".into();
            assert_eq!(m, TextMatcher::Exact("Swag Labs".to_string()));
        }

        #[test]
        fn test_to_js() {
            let js = TextMatcher::regex_ignore_case("Add to cart").unwrap().to_js();
            assert_eq!(js["kind"], "regex");
            assert_eq!(js["value"], "Add to cart");
            assert_eq!(js["ignoreCase"], true);
            assert_eq!(TextMatcher::loose("x").to_js()["kind"], "loose");
        }

        #[test]
        fn test_display() {
            assert_eq!(TextMatcher::exact("a").to_string(), "\"a\"");
            assert_eq!(
                TextMatcher::regex_ignore_case("a+").unwrap().to_string(),
                "/a+/i"
            );
        }
    }

    mod url_matcher_tests {
        use super::*;

        #[test]
        fn test_exact() {
            let m = UrlMatcher::exact("https://www.saucedemo.com/");
            assert!(m.matches("https://www.saucedemo.com/"));
            assert!(!m.matches("https://www.saucedemo.com/inventory.html"));
        }

        #[test]
        fn test_regex_searches() {
            let m = UrlMatcher::regex("inventory.html").unwrap();
            assert!(m.matches("https://www.saucedemo.com/inventory.html"));
            assert!(!m.matches("https://www.saucedemo.com/cart.html"));
        }

        #[test]
        fn test_glob() {
            let m = UrlMatcher::glob("**/status_codes/*");
            assert!(m.matches("https://the-internet.herokuapp.com/status_codes/404"));
            assert!(!m.matches("https://the-internet.herokuapp.com/status_codes"));

            let m = UrlMatcher::glob("https://*.herokuapp.com/login");
            assert!(m.matches("https://the-internet.herokuapp.com/login"));
            assert!(!m.matches("https://a/b.herokuapp.com/login"));
        }

        #[test]
        fn test_glob_escapes_regex_metacharacters() {
            let m = UrlMatcher::glob("**/inventory.html?x=(1)");
            assert!(m.matches("https://host/inventory.html?x=(1)"));
            assert!(!m.matches("https://host/inventoryXhtml?x=(1)"));
        }
    }

    proptest! {
        #[test]
        fn prop_literal_glob_matches_itself(s in "[a-zA-Z0-9:/._?=&-]{0,40}") {
            prop_assert!(UrlMatcher::glob(s.clone()).matches(&s));
        }

        #[test]
        fn prop_double_star_matches_everything(s in ".{0,40}") {
            prop_assert!(UrlMatcher::glob("**").matches(&s));
        }

        #[test]
        fn prop_exact_text_ignores_padding(s in "[a-z]{1,10}( [a-z]{1,10}){0,3}") {
            let padded = format!("  {}\n", s.replace(' ', "\n\t "));
            prop_assert!(TextMatcher::exact(s.clone()).matches(&padded));
        }
    }
}
