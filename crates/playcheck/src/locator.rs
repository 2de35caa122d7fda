//! Locator abstraction for element selection and interaction.
//!
//! # Design Philosophy
//!
//! - **Auto-Waiting**: actions wait until their element is attached, visible,
//!   stable, enabled and receives pointer events
//! - **Strict Selection**: actions fail if more than one element matches
//! - **Lazy**: a locator is only a chain of steps; every call resolves it
//!   again, so it survives re-renders
//! - **Fluent API**: chainable methods for narrowing a match set

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, trace};

use crate::driver::MouseButton;
use crate::matcher::TextMatcher;
use crate::page::{ClickOptions, Page};
use crate::result::{PlaycheckError, PlaycheckResult};
use crate::selector::{runtime_call, Chain, Filter, RoleOptions, Selector, Step};
use crate::wait::{poll_until, Observation, WaitOptions};

/// Steps used when dragging with the mouse
const DRAG_MOVE_STEPS: u32 = 5;

/// A point in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Bounding box for an element, relative to the top-level viewport
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X position
    pub x: f64,
    /// Y position
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl BoundingBox {
    /// Create a new bounding box
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Get the center point
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Check if a point is inside this bounding box
    #[must_use]
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

/// State awaited by [`Locator::wait_for`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ElementState {
    /// At least one element matches
    Attached,
    /// No element matches
    Detached,
    /// The element is visible
    #[default]
    Visible,
    /// The element is hidden or missing
    Hidden,
}

impl ElementState {
    const fn probe(self) -> &'static str {
        match self {
            Self::Attached | Self::Detached => "attached",
            Self::Visible => "visible",
            Self::Hidden => "hidden",
        }
    }

    const fn expected(self) -> bool {
        !matches!(self, Self::Detached)
    }
}

impl fmt::Display for ElementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Attached => "attached",
            Self::Detached => "detached",
            Self::Visible => "visible",
            Self::Hidden => "hidden",
        };
        write!(f, "{name}")
    }
}

/// An option to pick in a `<select>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOption {
    /// Match `option.value`
    Value(String),
    /// Match the visible label
    Label(String),
    /// Match by position
    Index(usize),
}

impl SelectOption {
    fn to_js(&self) -> Value {
        match self {
            Self::Value(v) => json!({ "value": v }),
            Self::Label(l) => json!({ "label": l }),
            Self::Index(i) => json!({ "index": i }),
        }
    }
}

impl From<&str> for SelectOption {
    fn from(value: &str) -> Self {
        Self::Value(value.to_string())
    }
}

/// Checks performed before an action, as sent to the page runtime
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct ActionChecks {
    strict: bool,
    force: bool,
    visible: bool,
    enabled: bool,
    editable: bool,
    scroll: bool,
    stable: bool,
    hit_target: bool,
    position: Option<Point>,
}

impl ActionChecks {
    /// Clicks, hovers and drags
    const fn pointer(force: bool, position: Option<Point>) -> Self {
        Self {
            strict: true,
            force,
            visible: true,
            enabled: true,
            editable: false,
            scroll: true,
            stable: true,
            hit_target: true,
            position,
        }
    }

    /// Text entry
    const fn editable() -> Self {
        Self {
            strict: true,
            visible: true,
            enabled: true,
            editable: true,
            ..Self::attached()
        }
    }

    /// `<select>` changes
    const fn selectable() -> Self {
        Self {
            strict: true,
            visible: true,
            enabled: true,
            ..Self::attached()
        }
    }

    /// Only require a single attached element
    const fn attached() -> Self {
        Self {
            strict: true,
            force: false,
            visible: false,
            enabled: false,
            editable: false,
            scroll: false,
            stable: false,
            hit_target: false,
            position: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ActionableReply {
    status: String,
    #[serde(rename = "box")]
    bounds: Option<BoundingBox>,
    point: Option<Point>,
    #[serde(default)]
    draggable: bool,
    #[serde(default)]
    count: usize,
    reason: Option<String>,
}

/// Element ready for input
#[derive(Debug, Clone, Copy)]
struct ActionTarget {
    point: Point,
    draggable: bool,
}

/// Answer of the runtime `probe` operation
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ProbeReply {
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub value: Value,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusReply {
    status: Option<String>,
    error: Option<String>,
    reason: Option<String>,
    #[serde(default)]
    values: Vec<String>,
}

/// A lazy, strict, auto-waiting handle to elements of a page
#[derive(Clone)]
pub struct Locator {
    page: Page,
    chain: Chain,
}

impl fmt::Debug for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Locator")
            .field("chain", &self.chain.to_string())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.chain)
    }
}

impl Locator {
    pub(crate) fn new(page: Page, selector: Selector) -> Self {
        Self {
            page,
            chain: Chain::new(selector),
        }
    }

    pub(crate) fn from_chain(page: Page, chain: Chain) -> Self {
        Self { page, chain }
    }

    /// Page this locator belongs to
    #[must_use]
    pub const fn page(&self) -> &Page {
        &self.page
    }

    /// Steps of this locator
    #[must_use]
    pub const fn chain(&self) -> &Chain {
        &self.chain
    }

    fn then(&self, step: Step) -> Self {
        Self::from_chain(self.page.clone(), self.chain.then(step))
    }

    // =========================================================================
    // Chaining
    // =========================================================================

    /// Descendants matching a CSS selector
    #[must_use]
    pub fn locator(&self, css: &str) -> Self {
        self.then(Step::Query(Selector::css(css)))
    }

    /// Descendants matching any selector
    #[must_use]
    pub fn locate(&self, selector: Selector) -> Self {
        self.then(Step::Query(selector))
    }

    /// Descendants containing `text`, ignoring case
    #[must_use]
    pub fn get_by_text(&self, text: &str) -> Self {
        self.locate(Selector::Text(TextMatcher::loose(text)))
    }

    /// Descendants by ARIA role
    #[must_use]
    pub fn get_by_role(&self, role: &str, options: RoleOptions) -> Self {
        self.locate(Selector::role(role, options))
    }

    /// Descendant form controls by label
    #[must_use]
    pub fn get_by_label(&self, text: &str) -> Self {
        self.locate(Selector::Label(TextMatcher::loose(text)))
    }

    /// Descendant inputs by placeholder
    #[must_use]
    pub fn get_by_placeholder(&self, text: &str) -> Self {
        self.locate(Selector::Placeholder(TextMatcher::loose(text)))
    }

    /// Descendant images by alt text
    #[must_use]
    pub fn get_by_alt_text(&self, text: &str) -> Self {
        self.locate(Selector::AltText(TextMatcher::loose(text)))
    }

    /// Descendants by title attribute
    #[must_use]
    pub fn get_by_title(&self, text: &str) -> Self {
        self.locate(Selector::Title(TextMatcher::loose(text)))
    }

    /// Descendants by test id
    #[must_use]
    pub fn get_by_test_id(&self, value: &str) -> Self {
        self.locate(Selector::TestId {
            attribute: self.page.settings().test_id_attribute.clone(),
            value: value.to_string(),
        })
    }

    /// Narrow matches with a filter
    #[must_use]
    pub fn filter(&self, filter: Filter) -> Self {
        self.then(Step::Filter(filter))
    }

    /// Keep matches containing `text`, ignoring case
    #[must_use]
    pub fn filter_has_text(&self, text: &str) -> Self {
        self.filter_has_text_matching(TextMatcher::loose(text))
    }

    /// Keep matches whose text matches
    #[must_use]
    pub fn filter_has_text_matching(&self, text: impl Into<TextMatcher>) -> Self {
        self.filter(Filter {
            has_text: Some(text.into()),
            ..Filter::default()
        })
    }

    /// Drop matches containing `text`, ignoring case
    #[must_use]
    pub fn filter_has_not_text(&self, text: &str) -> Self {
        self.filter(Filter {
            has_not_text: Some(TextMatcher::loose(text)),
            ..Filter::default()
        })
    }

    /// Keep only visible (or only hidden) matches
    #[must_use]
    pub fn filter_visible(&self, visible: bool) -> Self {
        self.filter(Filter {
            visible: Some(visible),
            ..Filter::default()
        })
    }

    /// Pick the match at `index`; negative indices count from the end
    #[must_use]
    pub fn nth(&self, index: i64) -> Self {
        self.then(Step::Nth(index))
    }

    /// First match
    #[must_use]
    pub fn first(&self) -> Self {
        self.nth(0)
    }

    /// Last match
    #[must_use]
    pub fn last(&self) -> Self {
        self.nth(-1)
    }

    /// Enter the iframe this locator points at
    #[must_use]
    pub fn frame_locator(&self, css: &str) -> FrameLocator {
        FrameLocator {
            page: self.page.clone(),
            chain: self.chain.then(Step::Frame(css.to_string())),
        }
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    fn action_options(&self, description: String) -> WaitOptions {
        let timeouts = &self.page.settings().timeouts;
        WaitOptions::new(description, timeouts.action()).with_poll_interval(timeouts.poll_interval())
    }

    fn strict_violation(&self, count: usize) -> PlaycheckError {
        PlaycheckError::StrictModeViolation {
            selector: self.chain.to_string(),
            count,
        }
    }

    fn not_found(&self) -> PlaycheckError {
        PlaycheckError::ElementNotFound {
            selector: self.chain.to_string(),
        }
    }

    async fn wait_actionable(&self, action: &str, checks: ActionChecks) -> PlaycheckResult<ActionTarget> {
        let script = runtime_call("actionable", &[self.chain.to_js(), serde_json::to_value(checks)?]);
        let script = script.as_str();
        let options = self.action_options(format!("{self} to be ready for {action}"));
        let outcome = poll_until(&options, || async move {
            let reply: ActionableReply = serde_json::from_value(self.page.driver().evaluate(script).await?)?;
            trace!(status = %reply.status, locator = %self, "actionability probe");
            Ok(match reply.status.as_str() {
                "ready" => match (reply.bounds, reply.point) {
                    (Some(_), Some(point)) => Observation::Done(Ok(ActionTarget {
                        point,
                        draggable: reply.draggable,
                    })),
                    _ => Observation::Retry("element has no box".to_string()),
                },
                "strict" => Observation::Done(Err(self.strict_violation(reply.count))),
                "missing" => Observation::Retry("no element matches".to_string()),
                _ => Observation::Retry(reply.reason.unwrap_or_else(|| reply.status.clone())),
            })
        })
        .await;
        match outcome {
            Ok(result) => result,
            Err(PlaycheckError::Timeout { waiting_for, .. }) => Err(PlaycheckError::NotActionable {
                selector: self.chain.to_string(),
                reason: waiting_for,
            }),
            Err(err) => Err(err),
        }
    }

    /// Run the runtime `probe` operation once
    pub(crate) async fn probe(&self, what: &str, arg: Value) -> PlaycheckResult<ProbeReply> {
        let script = runtime_call("probe", &[self.chain.to_js(), Value::from(what), arg]);
        let value = self.page.driver().evaluate(&script).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Wait for exactly one element and read a property of it
    async fn read(&self, what: &str, arg: Value) -> PlaycheckResult<Value> {
        let options = self.action_options(format!("{self} to read {what}"));
        let arg = &arg;
        let outcome = poll_until(&options, || async move {
            let reply = self.probe(what, arg.clone()).await?;
            Ok(match reply.count {
                0 => Observation::Retry("no element matches".to_string()),
                1 => match reply.error {
                    Some(error) => Observation::Done(Err(PlaycheckError::input(error))),
                    None => Observation::Done(Ok(reply.value)),
                },
                n => Observation::Done(Err(self.strict_violation(n))),
            })
        })
        .await;
        match outcome {
            Ok(result) => result,
            Err(PlaycheckError::Timeout { .. }) => Err(self.not_found()),
            Err(err) => Err(err),
        }
    }

    /// Probe once, requiring at most one element
    async fn peek(&self, what: &str) -> PlaycheckResult<Value> {
        let reply = self.probe(what, Value::Null).await?;
        if reply.count > 1 {
            return Err(self.strict_violation(reply.count));
        }
        Ok(reply.value)
    }

    async fn call(&self, op: &str, extra: &[Value]) -> PlaycheckResult<Value> {
        let mut args = vec![self.chain.to_js()];
        args.extend_from_slice(extra);
        self.page.driver().evaluate(&runtime_call(op, &args)).await
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Click the element
    pub async fn click(&self) -> PlaycheckResult<()> {
        self.click_with(&ClickOptions::default()).await
    }

    /// Click with options
    pub async fn click_with(&self, options: &ClickOptions) -> PlaycheckResult<()> {
        let position = options.position.map(|(x, y)| Point::new(x, y));
        let target = self
            .wait_actionable("click", ActionChecks::pointer(options.force, position))
            .await?;
        debug!(locator = %self, x = target.point.x, y = target.point.y, "click");
        self.page
            .mouse()
            .click(target.point.x, target.point.y, options)
            .await
    }

    /// Double-click the element
    pub async fn dblclick(&self) -> PlaycheckResult<()> {
        self.click_with(&ClickOptions::double()).await
    }

    /// Move the pointer over the element
    pub async fn hover(&self) -> PlaycheckResult<()> {
        let target = self.wait_actionable("hover", ActionChecks::pointer(false, None)).await?;
        self.page.mouse().move_to(target.point.x, target.point.y, 1).await
    }

    /// Replace the value of an input, textarea or contenteditable element
    pub async fn fill(&self, value: &str) -> PlaycheckResult<()> {
        self.wait_actionable("fill", ActionChecks::editable()).await?;
        let reply: StatusReply = serde_json::from_value(self.call("prepareFill", &[Value::from(value)]).await?)?;
        if let Some(error) = reply.error {
            return Err(if error == "missing" {
                self.not_found()
            } else {
                PlaycheckError::input(error)
            });
        }
        debug!(locator = %self, "fill");
        match reply.status.as_deref() {
            Some("type") if value.is_empty() => self.page.keyboard().press("Delete").await,
            Some("type") => self.page.driver().insert_text(value).await,
            _ => Ok(()),
        }
    }

    /// Empty an input
    pub async fn clear(&self) -> PlaycheckResult<()> {
        self.fill("").await
    }

    async fn focus_attached(&self) -> PlaycheckResult<()> {
        self.wait_actionable("focus", ActionChecks::attached()).await?;
        if self.call("focus", &[]).await?.as_bool() == Some(true) {
            Ok(())
        } else {
            Err(self.not_found())
        }
    }

    /// Focus the element and press a key chord
    pub async fn press(&self, chord: &str) -> PlaycheckResult<()> {
        self.focus_attached().await?;
        self.page.keyboard().press(chord).await
    }

    /// Focus the element and type text key by key
    pub async fn press_sequentially(&self, text: &str) -> PlaycheckResult<()> {
        self.focus_attached().await?;
        self.page.keyboard().type_text(text).await
    }

    /// Focus the element
    pub async fn focus(&self) -> PlaycheckResult<()> {
        self.focus_attached().await
    }

    /// Remove focus from the element
    pub async fn blur(&self) -> PlaycheckResult<()> {
        self.wait_actionable("blur", ActionChecks::attached()).await?;
        self.call("blur", &[]).await?;
        Ok(())
    }

    /// Scroll the element into the middle of the viewport
    pub async fn scroll_into_view(&self) -> PlaycheckResult<()> {
        self.wait_actionable("scroll", ActionChecks::attached()).await?;
        self.call("scrollIntoView", &[]).await?;
        Ok(())
    }

    /// Dispatch a DOM event on the element
    pub async fn dispatch_event(&self, event_type: &str) -> PlaycheckResult<()> {
        self.wait_actionable("dispatch_event", ActionChecks::attached()).await?;
        self.call("dispatchEvent", &[Value::from(event_type), Value::Null]).await?;
        Ok(())
    }

    /// Check a checkbox or radio button
    pub async fn check(&self) -> PlaycheckResult<()> {
        self.set_checked(true).await
    }

    /// Uncheck a checkbox
    pub async fn uncheck(&self) -> PlaycheckResult<()> {
        self.set_checked(false).await
    }

    /// Click until the checked state equals `checked`
    pub async fn set_checked(&self, checked: bool) -> PlaycheckResult<()> {
        if self.read("checked", Value::Null).await?.as_bool() == Some(checked) {
            return Ok(());
        }
        self.click().await?;
        if self.read("checked", Value::Null).await?.as_bool() == Some(checked) {
            Ok(())
        } else {
            Err(PlaycheckError::input(format!(
                "Clicking {self} did not change its checked state"
            )))
        }
    }

    /// Select one option of a `<select>`, returning the selected values
    pub async fn select_option(&self, option: impl Into<SelectOption>) -> PlaycheckResult<Vec<String>> {
        self.select_options(&[option.into()]).await
    }

    /// Select options of a `<select>`, returning the selected values
    pub async fn select_options(&self, options: &[SelectOption]) -> PlaycheckResult<Vec<String>> {
        self.wait_actionable("select_option", ActionChecks::selectable()).await?;
        let wanted = Value::Array(options.iter().map(SelectOption::to_js).collect());
        let script = runtime_call("selectOptions", &[self.chain.to_js(), wanted]);
        let script = script.as_str();
        let wait = self.action_options(format!("{self} to offer the requested options"));
        let reply = poll_until(&wait, || async move {
            let reply: StatusReply = serde_json::from_value(self.page.driver().evaluate(script).await?)?;
            Ok(match (reply.status.as_deref(), reply.error.as_deref()) {
                (Some("done"), _) => Observation::Done(Ok(reply.values)),
                (_, Some("missing")) => Observation::Retry("no element matches".to_string()),
                (_, Some(error)) => Observation::Done(Err(PlaycheckError::input(error))),
                _ => Observation::Retry(reply.reason.unwrap_or_else(|| "options not ready".to_string())),
            })
        })
        .await??;
        debug!(locator = %self, values = ?reply, "selected options");
        Ok(reply)
    }

    /// Set the files of an `<input type=file>`
    pub async fn set_input_files(&self, files: &[PathBuf]) -> PlaycheckResult<()> {
        self.wait_actionable("set_input_files", ActionChecks::attached()).await?;
        let element = runtime_call("first", &[self.chain.to_js()]);
        self.page.driver().set_input_files(&element, files).await
    }

    /// Drag this element onto `target`.
    ///
    /// Draggable elements get an HTML5 drag sequence; everything else is
    /// dragged with real mouse events.
    pub async fn drag_to(&self, target: &Locator) -> PlaycheckResult<()> {
        let source = self.wait_actionable("drag", ActionChecks::pointer(false, None)).await?;
        if source.draggable {
            target.wait_actionable("drop", ActionChecks::pointer(false, None)).await?;
            debug!(from = %self, to = %target, "html5 drag");
            let script = runtime_call("dragHtml5", &[self.chain.to_js(), target.chain.to_js()]);
            return match self.page.driver().evaluate(&script).await?.as_bool() {
                Some(true) => Ok(()),
                _ => Err(self.not_found()),
            };
        }
        let mouse = self.page.mouse();
        mouse.move_to(source.point.x, source.point.y, 1).await?;
        mouse.down(MouseButton::Left, 1).await?;
        let mut checks = ActionChecks::pointer(false, None);
        checks.hit_target = false;
        let to = target.wait_actionable("drop", checks).await?;
        debug!(from = %self, to = %target, "mouse drag");
        mouse.move_to(to.point.x, to.point.y, DRAG_MOVE_STEPS).await?;
        mouse.up(MouseButton::Left, 1).await
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Number of matching elements, without waiting
    pub async fn count(&self) -> PlaycheckResult<usize> {
        let value = self.page.driver().evaluate(&runtime_call("count", &[self.chain.to_js()])).await?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    /// `textContent` of the element
    pub async fn text_content(&self) -> PlaycheckResult<String> {
        Ok(crate::driver::value_to_string(self.read("text", Value::Null).await?))
    }

    /// Rendered text of the element
    pub async fn inner_text(&self) -> PlaycheckResult<String> {
        Ok(crate::driver::value_to_string(self.read("innerText", Value::Null).await?))
    }

    /// `textContent` of every match, without waiting
    pub async fn all_text_contents(&self) -> PlaycheckResult<Vec<String>> {
        let value = self
            .page
            .driver()
            .evaluate(&runtime_call("texts", &[self.chain.to_js(), Value::Bool(false)]))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Rendered text of every match, without waiting
    pub async fn all_inner_texts(&self) -> PlaycheckResult<Vec<String>> {
        let value = self
            .page
            .driver()
            .evaluate(&runtime_call("texts", &[self.chain.to_js(), Value::Bool(true)]))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Attribute value, `None` when absent
    pub async fn get_attribute(&self, name: &str) -> PlaycheckResult<Option<String>> {
        Ok(self.read("attribute", Value::from(name)).await?.as_str().map(str::to_string))
    }

    /// Current value of an input, textarea or select
    pub async fn input_value(&self) -> PlaycheckResult<String> {
        Ok(crate::driver::value_to_string(self.read("value", Value::Null).await?))
    }

    /// Whether the element is visible, without waiting
    pub async fn is_visible(&self) -> PlaycheckResult<bool> {
        Ok(self.peek("visible").await?.as_bool().unwrap_or(false))
    }

    /// Whether the element is hidden or missing, without waiting
    pub async fn is_hidden(&self) -> PlaycheckResult<bool> {
        Ok(!self.is_visible().await?)
    }

    /// Whether the element is enabled
    pub async fn is_enabled(&self) -> PlaycheckResult<bool> {
        Ok(self.read("enabled", Value::Null).await?.as_bool().unwrap_or(false))
    }

    /// Whether the element is disabled
    pub async fn is_disabled(&self) -> PlaycheckResult<bool> {
        Ok(!self.is_enabled().await?)
    }

    /// Whether the element is editable
    pub async fn is_editable(&self) -> PlaycheckResult<bool> {
        Ok(self.read("editable", Value::Null).await?.as_bool().unwrap_or(false))
    }

    /// Whether a checkbox or radio is checked
    pub async fn is_checked(&self) -> PlaycheckResult<bool> {
        Ok(self.read("checked", Value::Null).await?.as_bool().unwrap_or(false))
    }

    /// Box of the element, `None` when it is not visible
    pub async fn bounding_box(&self) -> PlaycheckResult<Option<BoundingBox>> {
        let value = self.read("box", Value::Null).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Call `function(element, arg)` in the page with the first match
    pub async fn evaluate(&self, function: &str, arg: Value) -> PlaycheckResult<Value> {
        self.wait_actionable("evaluate", ActionChecks::attached()).await?;
        self.call("evaluate", &[Value::from(function), arg, Value::Bool(false)]).await
    }

    /// Call `function(elements, arg)` in the page with every match
    pub async fn evaluate_all(&self, function: &str, arg: Value) -> PlaycheckResult<Value> {
        self.call("evaluate", &[Value::from(function), arg, Value::Bool(true)]).await
    }

    /// Wait until the element reaches `state`
    pub async fn wait_for(&self, state: ElementState) -> PlaycheckResult<()> {
        let options = self.action_options(format!("{self} to be {state}"));
        poll_until(&options, || async move {
            let reply = self.probe(state.probe(), Value::Null).await?;
            let reached = reply.value.as_bool() == Some(state.expected());
            Ok(if reached {
                Observation::Done(())
            } else {
                Observation::Retry(format!("{} matching elements", reply.count))
            })
        })
        .await
    }
}

/// Scope for locating elements inside an iframe
#[derive(Clone)]
pub struct FrameLocator {
    page: Page,
    chain: Chain,
}

impl fmt::Debug for FrameLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameLocator")
            .field("chain", &self.chain.to_string())
            .finish_non_exhaustive()
    }
}

impl FrameLocator {
    pub(crate) fn new(page: Page, css: &str) -> Self {
        Self {
            page,
            chain: Chain::frame(css),
        }
    }

    fn locate(&self, selector: Selector) -> Locator {
        Locator::from_chain(self.page.clone(), self.chain.then(Step::Query(selector)))
    }

    /// Elements matching a CSS selector inside the frame
    #[must_use]
    pub fn locator(&self, css: &str) -> Locator {
        self.locate(Selector::css(css))
    }

    /// Elements containing `text` inside the frame
    #[must_use]
    pub fn get_by_text(&self, text: &str) -> Locator {
        self.locate(Selector::Text(TextMatcher::loose(text)))
    }

    /// Elements by ARIA role inside the frame
    #[must_use]
    pub fn get_by_role(&self, role: &str, options: RoleOptions) -> Locator {
        self.locate(Selector::role(role, options))
    }

    /// The frame's `<body>`
    #[must_use]
    pub fn body(&self) -> Locator {
        self.locator("body")
    }

    /// A nested iframe
    #[must_use]
    pub fn frame_locator(&self, css: &str) -> Self {
        Self {
            page: self.page.clone(),
            chain: self.chain.then(Step::Frame(css.to_string())),
        }
    }
}
