//! Retrying assertions in the style of Playwright's `expect()`.
//!
//! ```ignore
//! expect(&page.locator(".title")).to_have_text("Products").await?;
//! expect(&page.locator(".error")).not().to_be_visible().await?;
//! expect_page(&page).to_have_url(UrlMatcher::glob("**/inventory.html")).await?;
//! ```
//!
//! Every assertion re-probes the page until it holds or the expect timeout
//! elapses, then fails with `AssertionFailed` naming the last value seen.

use serde_json::Value;
use std::time::Duration;
use tracing::trace;

use crate::driver::value_to_string;
use crate::locator::{Locator, ProbeReply};
use crate::matcher::{normalize_whitespace, TextMatcher, UrlMatcher};
use crate::page::Page;
use crate::result::{PlaycheckError, PlaycheckResult};
use crate::wait::{poll_until, Observation, WaitOptions};

/// Verdict of one probe: did it match, and what was seen
type Verdict = (bool, String);

/// How many elements an assertion reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    /// Every match; zero is a valid answer
    All,
    /// Exactly one element, which must exist even under `.not()`
    One,
    /// At most one element; absence counts as a failed match
    OneOrAbsent,
}

/// Start assertions on a locator
#[must_use]
pub fn expect(locator: &Locator) -> LocatorAssertions {
    LocatorAssertions {
        locator: locator.clone(),
        negated: false,
        timeout: locator.page().settings().timeouts.expect(),
    }
}

/// Start assertions on a page
#[must_use]
pub fn expect_page(page: &Page) -> PageAssertions {
    PageAssertions {
        page: page.clone(),
        negated: false,
        timeout: page.settings().timeouts.expect(),
    }
}

fn as_text(value: &Value) -> String {
    value_to_string(value.clone())
}

fn as_flag(value: &Value) -> bool {
    value.as_bool().unwrap_or(false)
}

/// Retrying assertions on a locator
#[derive(Debug, Clone)]
pub struct LocatorAssertions {
    locator: Locator,
    negated: bool,
    timeout: Duration,
}

impl LocatorAssertions {
    /// Invert the next assertion
    #[must_use]
    pub fn not(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    /// Override the expect timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn check<F>(&self, name: &str, expected: &str, what: &str, arg: Value, target: Target, judge: F) -> PlaycheckResult<()>
    where
        F: Fn(&ProbeReply) -> Verdict,
    {
        let not = if self.negated { "not." } else { "" };
        let description = format!("expect({}).{not}{name}({expected})", self.locator);
        let poll = self.locator.page().settings().timeouts.poll_interval();
        let options = WaitOptions::new(description.clone(), self.timeout).with_poll_interval(poll);
        let description = description.as_str();
        let (judge, arg, locator, negated) = (&judge, &arg, &self.locator, self.negated);

        let outcome = poll_until(&options, || async move {
            let reply = locator.probe(what, arg.clone()).await?;
            let single = target != Target::All;
            if single && reply.count > 1 {
                return Ok(Observation::Done(Err(PlaycheckError::StrictModeViolation {
                    selector: locator.to_string(),
                    count: reply.count,
                })));
            }
            let (matched, seen) = if single && reply.count == 0 {
                if target == Target::One {
                    return Ok(Observation::Retry("element not found".to_string()));
                }
                (false, "element not found".to_string())
            } else if let Some(error) = &reply.error {
                return Ok(Observation::Done(Err(PlaycheckError::assertion(format!(
                    "{description}: {error}"
                )))));
            } else {
                judge(&reply)
            };
            trace!(matched, seen = %seen, "assertion probe");
            Ok(if matched == negated {
                Observation::Retry(seen)
            } else {
                Observation::Done(Ok(()))
            })
        })
        .await;

        match outcome {
            Ok(result) => result,
            Err(PlaycheckError::Timeout { ms, waiting_for }) => Err(PlaycheckError::assertion(format!(
                "{waiting_for} failed after {ms}ms"
            ))),
            Err(err) => Err(err),
        }
    }

    async fn state(&self, name: &str, what: &str, target: Target) -> PlaycheckResult<()> {
        self.check(name, "", what, Value::Null, target, |r| {
            let v = as_flag(&r.value);
            (v, format!("{what}={v}"))
        })
        .await
    }

    /// Element is visible
    pub async fn to_be_visible(&self) -> PlaycheckResult<()> {
        self.state("to_be_visible", "visible", Target::OneOrAbsent).await
    }

    /// Element is hidden or missing
    pub async fn to_be_hidden(&self) -> PlaycheckResult<()> {
        self.check("to_be_hidden", "", "hidden", Value::Null, Target::All, |r| {
            (as_flag(&r.value), format!("{} matching elements", r.count))
        })
        .await
    }

    /// At least one element matches
    pub async fn to_be_attached(&self) -> PlaycheckResult<()> {
        self.check("to_be_attached", "", "attached", Value::Null, Target::All, |r| {
            (as_flag(&r.value), format!("{} matching elements", r.count))
        })
        .await
    }

    /// Element is enabled
    pub async fn to_be_enabled(&self) -> PlaycheckResult<()> {
        self.state("to_be_enabled", "enabled", Target::One).await
    }

    /// Element is disabled
    pub async fn to_be_disabled(&self) -> PlaycheckResult<()> {
        self.state("to_be_disabled", "disabled", Target::One).await
    }

    /// Element accepts text input
    pub async fn to_be_editable(&self) -> PlaycheckResult<()> {
        self.state("to_be_editable", "editable", Target::One).await
    }

    /// Checkbox or radio is checked
    pub async fn to_be_checked(&self) -> PlaycheckResult<()> {
        self.state("to_be_checked", "checked", Target::One).await
    }

    /// Element has focus
    pub async fn to_be_focused(&self) -> PlaycheckResult<()> {
        self.state("to_be_focused", "focused", Target::One).await
    }

    /// Input has no value, or element has no text
    pub async fn to_be_empty(&self) -> PlaycheckResult<()> {
        self.state("to_be_empty", "empty", Target::One).await
    }

    /// Whole text matches
    pub async fn to_have_text(&self, expected: impl Into<TextMatcher>) -> PlaycheckResult<()> {
        let matcher = expected.into();
        self.check("to_have_text", &matcher.to_string(), "text", Value::Null, Target::One, |r| {
            let text = as_text(&r.value);
            (matcher.matches(&text), format!("{:?}", normalize_whitespace(&text)))
        })
        .await
    }

    /// Text contains `expected`
    pub async fn to_contain_text(&self, expected: &str) -> PlaycheckResult<()> {
        let matcher = TextMatcher::contains(expected);
        self.check("to_contain_text", &format!("{expected:?}"), "text", Value::Null, Target::One, |r| {
            let text = as_text(&r.value);
            (matcher.matches(&text), format!("{:?}", normalize_whitespace(&text)))
        })
        .await
    }

    /// Texts of all matches equal `expected`, in order
    pub async fn to_have_texts(&self, expected: &[&str]) -> PlaycheckResult<()> {
        let matchers: Vec<TextMatcher> = expected.iter().map(|e| TextMatcher::exact(*e)).collect();
        self.check("to_have_texts", &format!("{expected:?}"), "texts", Value::Null, Target::All, |r| {
            let texts: Vec<String> = r
                .value
                .as_array()
                .map(|a| a.iter().map(as_text).collect())
                .unwrap_or_default();
            let matched = texts.len() == matchers.len()
                && texts.iter().zip(&matchers).all(|(t, m)| m.matches(t));
            let seen: Vec<String> = texts.iter().map(|t| normalize_whitespace(t)).collect();
            (matched, format!("{seen:?}"))
        })
        .await
    }

    /// Exactly `count` elements match
    pub async fn to_have_count(&self, count: usize) -> PlaycheckResult<()> {
        self.check("to_have_count", &count.to_string(), "count", Value::Null, Target::All, |r| {
            (r.count == count, r.count.to_string())
        })
        .await
    }

    /// Input value matches
    pub async fn to_have_value(&self, expected: impl Into<TextMatcher>) -> PlaycheckResult<()> {
        let matcher = expected.into();
        self.check("to_have_value", &matcher.to_string(), "value", Value::Null, Target::One, |r| {
            let value = as_text(&r.value);
            (matcher.matches(&value), format!("{value:?}"))
        })
        .await
    }

    /// Selected values of a `<select>` equal `expected`
    pub async fn to_have_values(&self, expected: &[&str]) -> PlaycheckResult<()> {
        self.check("to_have_values", &format!("{expected:?}"), "values", Value::Null, Target::One, |r| {
            let values: Vec<String> = r
                .value
                .as_array()
                .map(|a| a.iter().map(as_text).collect())
                .unwrap_or_default();
            (values == expected, format!("{values:?}"))
        })
        .await
    }

    /// Attribute is present and matches
    pub async fn to_have_attribute(&self, name: &str, expected: impl Into<TextMatcher>) -> PlaycheckResult<()> {
        let matcher = expected.into();
        let shown = format!("{name:?}, {matcher}");
        self.check("to_have_attribute", &shown, "attribute", Value::from(name), Target::One, |r| match r.value.as_str() {
            Some(value) => (matcher.matches(value), format!("{value:?}")),
            None => (false, "attribute missing".to_string()),
        })
        .await
    }

    /// Class attribute matches; a plain string must equal the full class list
    pub async fn to_have_class(&self, expected: impl Into<TextMatcher>) -> PlaycheckResult<()> {
        let matcher = expected.into();
        self.check("to_have_class", &matcher.to_string(), "class", Value::Null, Target::One, |r| {
            let class = as_text(&r.value);
            (matcher.matches(&class), format!("{class:?}"))
        })
        .await
    }

    /// Class list contains `class`
    pub async fn to_contain_class(&self, class: &str) -> PlaycheckResult<()> {
        self.check("to_contain_class", &format!("{class:?}"), "class", Value::Null, Target::One, |r| {
            let list = as_text(&r.value);
            (list.split_whitespace().any(|c| c == class), format!("{list:?}"))
        })
        .await
    }

    /// Computed style property matches
    pub async fn to_have_css(&self, property: &str, expected: impl Into<TextMatcher>) -> PlaycheckResult<()> {
        let matcher = expected.into();
        let shown = format!("{property:?}, {matcher}");
        self.check("to_have_css", &shown, "css", Value::from(property), Target::One, |r| {
            let value = as_text(&r.value);
            (matcher.matches(&value), format!("{value:?}"))
        })
        .await
    }

    /// Accessible name matches
    pub async fn to_have_accessible_name(&self, expected: impl Into<TextMatcher>) -> PlaycheckResult<()> {
        let matcher = expected.into();
        self.check("to_have_accessible_name", &matcher.to_string(), "name", Value::Null, Target::One, |r| {
            let name = as_text(&r.value);
            (matcher.matches(&name), format!("{name:?}"))
        })
        .await
    }
}

/// Retrying assertions on a page
#[derive(Debug, Clone)]
pub struct PageAssertions {
    page: Page,
    negated: bool,
    timeout: Duration,
}

impl PageAssertions {
    /// Invert the next assertion
    #[must_use]
    pub fn not(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    /// Override the expect timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn check<F>(&self, name: &str, expected: String, read: &str, judge: F) -> PlaycheckResult<()>
    where
        F: Fn(&str) -> bool,
    {
        let not = if self.negated { "not." } else { "" };
        let description = format!("expect(page).{not}{name}({expected})");
        let poll = self.page.settings().timeouts.poll_interval();
        let options = WaitOptions::new(description, self.timeout).with_poll_interval(poll);
        let (judge, page, negated) = (&judge, &self.page, self.negated);

        let outcome = poll_until(&options, || async move {
            let seen = if read == "title" { page.title().await? } else { page.url().await? };
            Ok(if judge(&seen) == negated {
                Observation::Retry(format!("{seen:?}"))
            } else {
                Observation::Done(())
            })
        })
        .await;
        match outcome {
            Err(PlaycheckError::Timeout { ms, waiting_for }) => Err(PlaycheckError::assertion(format!(
                "{waiting_for} failed after {ms}ms"
            ))),
            other => other,
        }
    }

    /// Current URL matches
    pub async fn to_have_url(&self, expected: impl Into<UrlMatcher>) -> PlaycheckResult<()> {
        let matcher = expected.into();
        self.check("to_have_url", matcher.to_string(), "url", |url| matcher.matches(url))
            .await
    }

    /// Document title matches
    pub async fn to_have_title(&self, expected: impl Into<TextMatcher>) -> PlaycheckResult<()> {
        let matcher = expected.into();
        self.check("to_have_title", matcher.to_string(), "title", |title| matcher.matches(title))
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::Timeouts;
    use crate::context::ContextOptions;
    use crate::driver::{BrowserDriver, MockBrowser, MockPage, TITLE_EXPRESSION};
    use crate::page::PageSettings;
    use serde_json::json;
    use std::sync::Arc;

    async fn fixture() -> (Arc<MockPage>, Page) {
        let browser = Arc::new(MockBrowser::new());
        let mock = Arc::new(MockPage::new("main"));
        browser.prepare_page(Arc::clone(&mock));
        let ctx = browser.new_context(&ContextOptions::new()).await.unwrap();
        let driver = browser.new_page(&ctx).await.unwrap();
        let settings = PageSettings {
            timeouts: Timeouts {
                expect_ms: 100,
                action_ms: 100,
                navigation_ms: 100,
                poll_interval_ms: 10,
            },
            ..PageSettings::default()
        };
        (mock, Page::new(driver, browser, ctx, Arc::new(settings)))
    }

    fn probe(count: usize, value: Value) -> Value {
        json!({ "count": count, "value": value })
    }

    mod locator_assertion_tests {
        use super::*;

        #[tokio::test]
        async fn test_to_have_text_retries_until_match() {
            let (mock, page) = fixture().await;
            mock.script("probe", [probe(1, json!("Loading")), probe(1, json!("  Hello   World! "))]);
            expect(&page.locator("#finish h4"))
                .to_have_text("Hello World!")
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn test_failure_names_last_value() {
            let (mock, page) = fixture().await;
            mock.script("probe", [probe(1, json!("Products"))]);
            let err = expect(&page.locator(".title"))
                .to_have_text("Your Cart")
                .await
                .unwrap_err();
            match err {
                PlaycheckError::AssertionFailed { message } => {
                    assert!(message.contains("to_have_text"));
                    assert!(message.contains("\"Products\""));
                }
                other => panic!("unexpected {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_not_to_be_visible() {
            let (mock, page) = fixture().await;
            mock.script("probe", [probe(1, json!(true)), probe(0, Value::Null)]);
            expect(&page.locator(".error"))
                .not()
                .to_be_visible()
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn test_negated_state_requires_element() {
            let (mock, page) = fixture().await;
            mock.script("probe", [probe(0, json!(false))]);
            let checkbox = page.locator("#checkboxes input").nth(0);
            let err = expect(&checkbox).not().to_be_checked().await.unwrap_err();
            match err {
                PlaycheckError::AssertionFailed { message } => {
                    assert!(message.contains("not.to_be_checked"));
                    assert!(message.contains("element not found"));
                }
                other => panic!("unexpected {other:?}"),
            }
            assert!(expect(&checkbox).not().to_be_enabled().await.is_err());
            assert!(expect(&checkbox).not().to_be_focused().await.is_err());
        }

        #[tokio::test]
        async fn test_negated_state_waits_for_element() {
            let (mock, page) = fixture().await;
            mock.script("probe", [probe(0, json!(false)), probe(1, json!(false))]);
            expect(&page.locator("#checkbox"))
                .not()
                .to_be_checked()
                .await
                .unwrap();
            assert_eq!(mock.runtime_ops(), vec!["probe", "probe"]);
        }

        #[tokio::test]
        async fn test_absent_element_is_not_visible() {
            let (mock, page) = fixture().await;
            mock.script("probe", [probe(0, Value::Null)]);
            expect(&page.locator("#finish")).not().to_be_visible().await.unwrap();
            assert!(expect(&page.locator("#finish")).to_be_visible().await.is_err());
        }

        #[tokio::test]
        async fn test_strict_violation_is_reported() {
            let (mock, page) = fixture().await;
            mock.script("probe", [probe(3, json!("x"))]);
            let err = expect(&page.locator("li")).to_have_text("x").await.unwrap_err();
            assert!(matches!(err, PlaycheckError::StrictModeViolation { count: 3, .. }));
        }

        #[tokio::test]
        async fn test_to_have_count() {
            let (mock, page) = fixture().await;
            mock.script("probe", [probe(2, json!(2)), probe(6, json!(6))]);
            expect(&page.locator(".inventory_item")).to_have_count(6).await.unwrap();
        }

        #[tokio::test]
        async fn test_to_have_texts_in_order() {
            let (mock, page) = fixture().await;
            mock.script("probe", [probe(2, json!(["buy milk", "walk dog"]))]);
            let loc = page.get_by_test_id("todo-title");
            expect(&loc).to_have_texts(&["buy milk", "walk dog"]).await.unwrap();
            assert!(expect(&loc).to_have_texts(&["walk dog", "buy milk"]).await.is_err());
        }

        #[tokio::test]
        async fn test_to_have_attribute_missing() {
            let (mock, page) = fixture().await;
            mock.script("probe", [probe(1, Value::Null)]);
            let loc = page.locator("input");
            assert!(expect(&loc).to_have_attribute("type", "password").await.is_err());
            expect(&loc).not().to_have_attribute("type", "password").await.unwrap();
        }

        #[tokio::test]
        async fn test_to_contain_class() {
            let (mock, page) = fixture().await;
            mock.script("probe", [probe(1, json!("todo completed"))]);
            expect(&page.locator("li")).to_contain_class("completed").await.unwrap();
            expect(&page.locator("li")).to_have_class(TextMatcher::contains("todo")).await.unwrap();
        }

        #[tokio::test]
        async fn test_runtime_error_fails_fast() {
            let (mock, page) = fixture().await;
            mock.script("probe", [json!({"count": 1, "value": null, "error": "Not an input element"})]);
            let err = expect(&page.locator("div")).to_have_value("x").await.unwrap_err();
            match err {
                PlaycheckError::AssertionFailed { message } => assert!(message.contains("Not an input")),
                other => panic!("unexpected {other:?}"),
            }
            assert_eq!(mock.runtime_ops().len(), 1);
        }

        #[tokio::test]
        async fn test_with_timeout_overrides() {
            let (mock, page) = fixture().await;
            mock.script("probe", [probe(1, json!(false))]);
            let err = expect(&page.locator("#checkbox"))
                .with_timeout(Duration::from_millis(30))
                .to_be_checked()
                .await
                .unwrap_err();
            match err {
                PlaycheckError::AssertionFailed { message } => assert!(message.contains("30ms")),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    mod page_assertion_tests {
        use super::*;

        #[tokio::test]
        async fn test_to_have_url() {
            let (_mock, page) = fixture().await;
            page.goto("https://www.saucedemo.com/inventory.html").await.unwrap();
            expect_page(&page)
                .to_have_url(UrlMatcher::glob("**/inventory.html"))
                .await
                .unwrap();
            expect_page(&page)
                .not()
                .to_have_url("https://www.saucedemo.com/")
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn test_retries_while_navigation_replaces_document() {
            let (mock, page) = fixture().await;
            page.goto("https://www.saucedemo.com/inventory.html").await.unwrap();
            mock.fail_evaluations(["Execution context was destroyed."]);
            expect_page(&page)
                .with_timeout(Duration::from_millis(500))
                .to_have_url("https://www.saucedemo.com/inventory.html")
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn test_locator_retries_after_lost_context() {
            let (mock, page) = fixture().await;
            mock.fail_evaluations(["Cannot find context with specified id"]);
            mock.script("probe", [probe(1, json!("Products"))]);
            expect(&page.locator(".title")).to_have_text("Products").await.unwrap();
        }

        #[tokio::test]
        async fn test_other_protocol_errors_abort() {
            let (mock, page) = fixture().await;
            mock.fail_evaluations(["Target closed"]);
            let err = expect_page(&page).to_have_title("Swag Labs").await.unwrap_err();
            assert!(matches!(err, PlaycheckError::PageError { .. }));
        }

        #[tokio::test]
        async fn test_to_have_title() {
            let (mock, page) = fixture().await;
            mock.script_expression(TITLE_EXPRESSION, [json!("Swag Labs")]);
            expect_page(&page).to_have_title("Swag Labs").await.unwrap();
            assert!(expect_page(&page).to_have_title("React").await.is_err());
        }
    }
}
