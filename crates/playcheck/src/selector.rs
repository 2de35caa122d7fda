//! Selector engines and the in-page runtime that resolves them.
//!
//! A locator is a chain of [`Step`]s: queries narrow the current set of
//! elements, filters drop elements, `nth` picks one, and `frame` switches
//! the search into an iframe's document. The chain is serialized to JSON and
//! evaluated by a small runtime injected into every document on first use,
//! so element resolution always reflects the live DOM.

use serde_json::{json, Value};
use std::fmt;

use crate::matcher::TextMatcher;

/// Source of the injected page runtime
const RUNTIME_SOURCE: &str = include_str!("runtime.js");

/// Global the runtime installs itself under
const RUNTIME_GLOBAL: &str = "__playcheck_runtime_v1";

/// Default attribute consulted by test-id selectors
pub const DEFAULT_TEST_ID_ATTRIBUTE: &str = "data-test";

/// Extra constraints for role selectors
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleOptions {
    /// Accessible name
    pub name: Option<TextMatcher>,
    /// Checked state for checkboxes, radios and switches
    pub checked: Option<bool>,
    /// Heading level
    pub level: Option<u8>,
    /// Disabled state
    pub disabled: Option<bool>,
    /// Also match elements hidden from the accessibility tree
    pub include_hidden: bool,
}

impl RoleOptions {
    /// Match the accessible name case-insensitively by substring
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(TextMatcher::loose(name));
        self
    }

    /// Match the accessible name exactly
    #[must_use]
    pub fn exact_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(TextMatcher::exact(name));
        self
    }

    /// Match the accessible name with any matcher
    #[must_use]
    pub fn name_matching(mut self, matcher: impl Into<TextMatcher>) -> Self {
        self.name = Some(matcher.into());
        self
    }

    /// Require a checked state
    #[must_use]
    pub const fn checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    /// Require a heading level
    #[must_use]
    pub const fn level(mut self, level: u8) -> Self {
        self.level = Some(level);
        self
    }

    /// Require a disabled state
    #[must_use]
    pub const fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = Some(disabled);
        self
    }

    /// Include elements hidden from assistive technology
    #[must_use]
    pub const fn include_hidden(mut self) -> Self {
        self.include_hidden = true;
        self
    }
}

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// CSS selector, piercing open shadow roots
    Css(String),
    /// Smallest elements whose text matches
    Text(TextMatcher),
    /// ARIA role, implicit or explicit
    Role {
        /// Role name such as `button` or `heading`
        role: String,
        /// Additional constraints
        options: RoleOptions,
    },
    /// Form control by its label text
    Label(TextMatcher),
    /// Input by placeholder text
    Placeholder(TextMatcher),
    /// Element by `alt` text
    AltText(TextMatcher),
    /// Element by `title` attribute
    Title(TextMatcher),
    /// Element by test-id attribute
    TestId {
        /// Attribute name, usually `data-test`
        attribute: String,
        /// Exact attribute value
        value: String,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(matcher: impl Into<TextMatcher>) -> Self {
        Self::Text(matcher.into())
    }

    /// Create a role selector
    #[must_use]
    pub fn role(role: impl Into<String>, options: RoleOptions) -> Self {
        Self::Role {
            role: role.into(),
            options,
        }
    }

    /// Create a test-id selector using the default attribute
    #[must_use]
    pub fn test_id(value: impl Into<String>) -> Self {
        Self::TestId {
            attribute: DEFAULT_TEST_ID_ATTRIBUTE.to_string(),
            value: value.into(),
        }
    }

    /// JSON form understood by the page runtime
    #[must_use]
    pub fn to_js(&self) -> Value {
        match self {
            Self::Css(css) => json!({ "engine": "css", "value": css }),
            Self::Text(m) => json!({ "engine": "text", "matcher": m.to_js() }),
            Self::Role { role, options } => json!({
                "engine": "role",
                "role": role,
                "name": options.name.as_ref().map(TextMatcher::to_js),
                "checked": options.checked,
                "level": options.level,
                "disabled": options.disabled,
                "includeHidden": options.include_hidden,
            }),
            Self::Label(m) => json!({ "engine": "label", "matcher": m.to_js() }),
            Self::Placeholder(m) => json!({ "engine": "placeholder", "matcher": m.to_js() }),
            Self::AltText(m) => json!({ "engine": "alt", "matcher": m.to_js() }),
            Self::Title(m) => json!({ "engine": "title", "matcher": m.to_js() }),
            Self::TestId { attribute, value } => {
                json!({ "engine": "testid", "attribute": attribute, "value": value })
            }
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(css) => write!(f, "css={css}"),
            Self::Text(m) => write!(f, "text={m}"),
            Self::Role { role, options } => {
                write!(f, "role={role}")?;
                if let Some(name) = &options.name {
                    write!(f, "[name={name}]")?;
                }
                if let Some(checked) = options.checked {
                    write!(f, "[checked={checked}]")?;
                }
                if let Some(level) = options.level {
                    write!(f, "[level={level}]")?;
                }
                Ok(())
            }
            Self::Label(m) => write!(f, "label={m}"),
            Self::Placeholder(m) => write!(f, "placeholder={m}"),
            Self::AltText(m) => write!(f, "alt={m}"),
            Self::Title(m) => write!(f, "title={m}"),
            Self::TestId { attribute, value } => write!(f, "[{attribute}=\"{value}\"]"),
        }
    }
}

/// Element filter applied to the current match set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    /// Keep elements whose text matches
    pub has_text: Option<TextMatcher>,
    /// Drop elements whose text matches
    pub has_not_text: Option<TextMatcher>,
    /// Keep only visible (or only hidden) elements
    pub visible: Option<bool>,
}

/// One link in a locator chain
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Search inside the current scope
    Query(Selector),
    /// Narrow the current matches
    Filter(Filter),
    /// Pick one match by index; negative counts from the end
    Nth(i64),
    /// Enter the document of the first matching iframe
    Frame(String),
}

impl Step {
    /// JSON form understood by the page runtime
    #[must_use]
    pub fn to_js(&self) -> Value {
        match self {
            Self::Query(selector) => json!({ "query": selector.to_js() }),
            Self::Filter(filter) => json!({
                "filter": {
                    "hasText": filter.has_text.as_ref().map(TextMatcher::to_js),
                    "hasNotText": filter.has_not_text.as_ref().map(TextMatcher::to_js),
                    "visible": filter.visible,
                }
            }),
            Self::Nth(index) => json!({ "nth": index }),
            Self::Frame(css) => json!({ "frame": css }),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query(selector) => write!(f, "{selector}"),
            Self::Filter(filter) => {
                let mut parts = Vec::new();
                if let Some(m) = &filter.has_text {
                    parts.push(format!("has_text={m}"));
                }
                if let Some(m) = &filter.has_not_text {
                    parts.push(format!("has_not_text={m}"));
                }
                if let Some(v) = filter.visible {
                    parts.push(format!("visible={v}"));
                }
                write!(f, "filter({})", parts.join(", "))
            }
            Self::Nth(index) => write!(f, "nth={index}"),
            Self::Frame(css) => write!(f, "frame={css}"),
        }
    }
}

/// An ordered chain of steps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chain {
    steps: Vec<Step>,
}

impl Chain {
    /// Chain with a single query
    #[must_use]
    pub fn new(selector: Selector) -> Self {
        Self {
            steps: vec![Step::Query(selector)],
        }
    }

    /// Chain starting inside an iframe
    #[must_use]
    pub fn frame(css: impl Into<String>) -> Self {
        Self {
            steps: vec![Step::Frame(css.into())],
        }
    }

    /// Append a step, returning the extended chain
    #[must_use]
    pub fn then(&self, step: Step) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);
        Self { steps }
    }

    /// Steps in order
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// JSON array of steps
    #[must_use]
    pub fn to_js(&self) -> Value {
        Value::Array(self.steps.iter().map(Step::to_js).collect())
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.steps.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join(" >> "))
    }
}

/// Expression that evaluates to the installed runtime object
#[must_use]
pub fn runtime_handle() -> String {
    format!("(globalThis.{RUNTIME_GLOBAL} ||= {RUNTIME_SOURCE})")
}

/// Expression calling `op` on the runtime with JSON arguments
#[must_use]
pub fn runtime_call(op: &str, args: &[Value]) -> String {
    let args: Vec<String> = args.iter().map(Value::to_string).collect();
    format!("{}.{op}({})", runtime_handle(), args.join(", "))
}

/// Split a script built by [`runtime_call`] back into its op and arguments
#[must_use]
pub fn parse_runtime_call(script: &str) -> Option<(String, Vec<Value>)> {
    let rest = script.strip_prefix(&runtime_handle())?.strip_prefix('.')?;
    let open = rest.find('(')?;
    let inner = rest[open + 1..].strip_suffix(')')?;
    let args: Vec<Value> = serde_json::from_str(&format!("[{inner}]")).ok()?;
    Some((rest[..open].to_string(), args))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod selector_tests {
        use super::*;

        #[test]
        fn test_css_selector_js() {
            let js = Selector::css("#login-button").to_js();
            assert_eq!(js["engine"], "css");
            assert_eq!(js["value"], "#login-button");
        }

        #[test]
        fn test_role_selector_js() {
            let sel = Selector::role("button", RoleOptions::default().name("Login").checked(true));
            let js = sel.to_js();
            assert_eq!(js["engine"], "role");
            assert_eq!(js["role"], "button");
            assert_eq!(js["name"]["kind"], "loose");
            assert_eq!(js["checked"], true);
            assert_eq!(js["includeHidden"], false);
        }

        #[test]
        fn test_test_id_default_attribute() {
            let js = Selector::test_id("inventory-list").to_js();
            assert_eq!(js["attribute"], "data-test");
            assert_eq!(js["value"], "inventory-list");
        }

        #[test]
        fn test_display() {
            assert_eq!(Selector::css(".item").to_string(), "css=.item");
            let sel = Selector::role("heading", RoleOptions::default().exact_name("Hi").level(2));
            assert_eq!(sel.to_string(), "role=heading[name=\"Hi\"][level=2]");
            assert_eq!(
                Selector::test_id("error").to_string(),
                "[data-test=\"error\"]"
            );
        }
    }

    mod chain_tests {
        use super::*;

        #[test]
        fn test_chain_is_immutable() {
            let base = Chain::new(Selector::css("li"));
            let first = base.then(Step::Nth(0));
            assert_eq!(base.steps().len(), 1);
            assert_eq!(first.steps().len(), 2);
        }

        #[test]
        fn test_chain_display() {
            let chain = Chain::frame("#frame")
                .then(Step::Query(Selector::css("body")))
                .then(Step::Filter(Filter {
                    has_text: Some(TextMatcher::loose("hi")),
                    ..Filter::default()
                }))
                .then(Step::Nth(-1));
            assert_eq!(
                chain.to_string(),
                "frame=#frame >> css=body >> filter(has_text=text containing \"hi\" (any case)) >> nth=-1"
            );
        }

        #[test]
        fn test_chain_js() {
            let chain = Chain::new(Selector::css("a")).then(Step::Nth(2));
            let js = chain.to_js();
            assert_eq!(js[0]["query"]["engine"], "css");
            assert_eq!(js[1]["nth"], 2);
        }
    }

    mod runtime_tests {
        use super::*;

        #[test]
        fn test_runtime_call_embeds_json_args() {
            let script = runtime_call("count", &[json!([{ "nth": 0 }])]);
            assert!(script.contains(RUNTIME_GLOBAL));
            assert!(script.ends_with(".count([{\"nth\":0}])"));
        }

        #[test]
        fn test_parse_runtime_call() {
            let script = runtime_call("probe", &[json!([{ "nth": 1 }]), json!("attribute"), json!("href")]);
            let (op, args) = parse_runtime_call(&script).unwrap();
            assert_eq!(op, "probe");
            assert_eq!(args.len(), 3);
            assert_eq!(args[2], "href");
            assert!(parse_runtime_call("document.title").is_none());
        }

        #[test]
        fn test_runtime_source_exposes_ops() {
            for op in [
                "count",
                "probe",
                "actionable",
                "prepareFill",
                "selectOptions",
                "dragHtml5",
                "evaluate",
            ] {
                assert!(RUNTIME_SOURCE.contains(&format!("{op}(")), "missing {op}");
            }
        }
    }
}
