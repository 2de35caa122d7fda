//! Driver traits: the seam between scenarios and the browser protocol.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  Page / Locator / expect                                      │
//! ├───────────────────────────────────────────────────────────────┤
//! │  PageDriver + BrowserDriver (this module)                     │
//! ├──────────────────────────────┬────────────────────────────────┤
//! │  cdp::ChromiumBrowser        │  MockBrowser / MockPage        │
//! │  chromiumoxide over CDP      │  scripted, for unit tests      │
//! └──────────────────────────────┴────────────────────────────────┘
//! ```
//!
//! Drivers only move bytes: evaluate a script, dispatch an input event,
//! open a target. Element resolution and waiting live above the seam so
//! that both implementations share them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::Viewport;
use crate::context::{ContextOptions, Geolocation, Permission};
use crate::dialog::{Dialog, DialogHandler};
use crate::download::{DownloadInfo, DownloadState};
use crate::keyboard::KeyEvent;
use crate::result::{PlaycheckError, PlaycheckResult};
use crate::selector::parse_runtime_call;
use crate::wait::{poll_until, Observation, WaitOptions};

/// Identifier of a browser context
pub type ContextId = String;

/// Expression yielding the current URL
pub const URL_EXPRESSION: &str = "location.href";

/// Expression yielding the document title
pub const TITLE_EXPRESSION: &str = "document.title";

/// Expression yielding the serialized document
pub const CONTENT_EXPRESSION: &str = "(document.doctype ? new XMLSerializer().serializeToString(document.doctype) : '') + document.documentElement.outerHTML";

/// Expression yielding the HTTP status of the current document, if known
pub const STATUS_EXPRESSION: &str =
    "(performance.getEntriesByType('navigation')[0] || {}).responseStatus || null";

/// Mouse button
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    /// No button (moves)
    None,
    /// Primary button
    #[default]
    Left,
    /// Wheel button
    Middle,
    /// Secondary button
    Right,
}

impl MouseButton {
    /// `MouseEvent.buttons` bit for this button
    #[must_use]
    pub const fn buttons_mask(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Left => 1,
            Self::Right => 2,
            Self::Middle => 4,
        }
    }
}

/// Kind of mouse event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseEventKind {
    /// Pointer moved
    Move,
    /// Button pressed
    Down,
    /// Button released
    Up,
    /// Wheel scrolled
    Wheel,
}

/// One mouse event in viewport coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouseEvent {
    /// Event kind
    pub kind: MouseEventKind,
    /// X coordinate in CSS pixels
    pub x: f64,
    /// Y coordinate in CSS pixels
    pub y: f64,
    /// Button changing state
    pub button: MouseButton,
    /// Buttons held after the event
    pub buttons: u32,
    /// Click count for down/up pairs
    pub click_count: u32,
    /// Modifier bitmask
    pub modifiers: u32,
    /// Horizontal wheel delta
    pub delta_x: f64,
    /// Vertical wheel delta
    pub delta_y: f64,
}

impl MouseEvent {
    /// Pointer move with the given buttons held
    #[must_use]
    pub const fn moved(x: f64, y: f64, buttons: u32) -> Self {
        Self {
            kind: MouseEventKind::Move,
            x,
            y,
            button: MouseButton::None,
            buttons,
            click_count: 0,
            modifiers: 0,
            delta_x: 0.0,
            delta_y: 0.0,
        }
    }

    /// Button press
    #[must_use]
    pub const fn down(x: f64, y: f64, button: MouseButton, click_count: u32) -> Self {
        Self {
            kind: MouseEventKind::Down,
            x,
            y,
            button,
            buttons: button.buttons_mask(),
            click_count,
            modifiers: 0,
            delta_x: 0.0,
            delta_y: 0.0,
        }
    }

    /// Button release
    #[must_use]
    pub const fn up(x: f64, y: f64, button: MouseButton, click_count: u32) -> Self {
        Self {
            kind: MouseEventKind::Up,
            x,
            y,
            button,
            buttons: 0,
            click_count,
            modifiers: 0,
            delta_x: 0.0,
            delta_y: 0.0,
        }
    }

    /// Wheel scroll
    #[must_use]
    pub const fn wheel(x: f64, y: f64, delta_x: f64, delta_y: f64) -> Self {
        Self {
            kind: MouseEventKind::Wheel,
            x,
            y,
            button: MouseButton::None,
            buttons: 0,
            click_count: 0,
            modifiers: 0,
            delta_x,
            delta_y,
        }
    }

    /// Same event with modifiers held
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: u32) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Protocol operations on one page (tab)
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Stable identifier (CDP target id)
    fn id(&self) -> String;

    /// Identifier of the page that opened this one
    async fn opener_id(&self) -> PlaycheckResult<Option<String>>;

    /// Navigate and wait for the load event; returns the document status
    async fn navigate(&self, url: &str, timeout: Duration) -> PlaycheckResult<Option<u16>>;

    /// Reload and wait for the load event
    async fn reload(&self, timeout: Duration) -> PlaycheckResult<Option<u16>>;

    /// Step back in history; false when there is nothing to go back to
    async fn go_back(&self, timeout: Duration) -> PlaycheckResult<bool>;

    /// Evaluate an expression, awaiting promises, returning JSON
    async fn evaluate(&self, expression: &str) -> PlaycheckResult<Value>;

    /// Dispatch a trusted mouse event
    async fn dispatch_mouse(&self, event: &MouseEvent) -> PlaycheckResult<()>;

    /// Dispatch a trusted key event
    async fn dispatch_key(&self, event: &KeyEvent) -> PlaycheckResult<()>;

    /// Insert text as an IME commit into the focused element
    async fn insert_text(&self, text: &str) -> PlaycheckResult<()>;

    /// Set files on the `<input type=file>` the expression evaluates to
    async fn set_input_files(&self, element_expression: &str, files: &[PathBuf]) -> PlaycheckResult<()>;

    /// Emulate a viewport size
    async fn set_viewport(&self, viewport: Viewport) -> PlaycheckResult<()>;

    /// Dialog policy consulted for this page's dialogs
    fn dialogs(&self) -> &DialogHandler;

    /// Activate the tab
    async fn bring_to_front(&self) -> PlaycheckResult<()>;

    /// Close the tab
    async fn close(&self) -> PlaycheckResult<()>;

    /// Current URL
    async fn url(&self) -> PlaycheckResult<String> {
        Ok(value_to_string(self.evaluate(URL_EXPRESSION).await?))
    }

    /// Document title
    async fn title(&self) -> PlaycheckResult<String> {
        Ok(value_to_string(self.evaluate(TITLE_EXPRESSION).await?))
    }

    /// Serialized document
    async fn content(&self) -> PlaycheckResult<String> {
        Ok(value_to_string(self.evaluate(CONTENT_EXPRESSION).await?))
    }
}

/// Protocol operations on the browser and its contexts
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Browser product and version
    async fn version(&self) -> PlaycheckResult<String>;

    /// Create an isolated context
    async fn new_context(&self, options: &ContextOptions) -> PlaycheckResult<ContextId>;

    /// Open a blank page in a context
    async fn new_page(&self, context: &ContextId) -> PlaycheckResult<Arc<dyn PageDriver>>;

    /// All pages of a context, including popups
    async fn pages(&self, context: &ContextId) -> PlaycheckResult<Vec<Arc<dyn PageDriver>>>;

    /// Downloads started from a context, oldest first
    async fn downloads(&self, context: &ContextId) -> PlaycheckResult<Vec<DownloadInfo>>;

    /// Grant permissions to a context
    async fn grant_permissions(
        &self,
        context: &ContextId,
        permissions: &[Permission],
        origin: Option<&str>,
    ) -> PlaycheckResult<()>;

    /// Revoke all permissions of a context
    async fn clear_permissions(&self, context: &ContextId) -> PlaycheckResult<()>;

    /// Emulate a position in every page of a context
    async fn set_geolocation(&self, context: &ContextId, geolocation: Geolocation) -> PlaycheckResult<()>;

    /// Dispose a context and its pages
    async fn close_context(&self, context: &ContextId) -> PlaycheckResult<()>;

    /// Shut the browser down
    async fn close(&self) -> PlaycheckResult<()>;

    /// Wait for a page opened by `opener` that is not among `known`.
    ///
    /// Pages without a reported opener also count, since some targets lose
    /// the link when opened with `noopener`.
    async fn wait_for_popup(
        &self,
        context: &ContextId,
        opener: &str,
        known: &[String],
        timeout: Duration,
    ) -> PlaycheckResult<Arc<dyn PageDriver>> {
        let options = WaitOptions::new(format!("popup opened by {opener}"), timeout);
        poll_until(&options, || async move {
            for page in self.pages(context).await? {
                if known.contains(&page.id()) {
                    continue;
                }
                match page.opener_id().await? {
                    Some(id) if id != opener => {}
                    _ => return Ok(Observation::Done(page)),
                }
            }
            Ok(Observation::Retry("no popup yet".to_string()))
        })
        .await
    }

    /// Wait until download number `index` of a context has finished
    async fn next_download(
        &self,
        context: &ContextId,
        index: usize,
        timeout: Duration,
    ) -> PlaycheckResult<DownloadInfo> {
        let options = WaitOptions::new("download to finish", timeout);
        let info = poll_until(&options, || async move {
            let downloads = self.downloads(context).await?;
            Ok(match downloads.get(index) {
                Some(d) if d.state != DownloadState::InProgress => Observation::Done(d.clone()),
                Some(d) => Observation::Retry(format!("{} in progress", d.suggested_filename)),
                None => Observation::Retry(format!("{} downloads so far", downloads.len())),
            })
        })
        .await?;
        if info.state == DownloadState::Canceled {
            return Err(PlaycheckError::DownloadError {
                message: format!("{} was canceled", info.suggested_filename),
            });
        }
        Ok(info)
    }
}

/// Render a JSON value the way `String(value)` would
#[must_use]
pub fn value_to_string(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

// ============================================================================
// Mock implementation for unit tests
// ============================================================================

#[derive(Debug, Default)]
struct MockPageState {
    url: String,
    history: Vec<String>,
    runtime: HashMap<String, VecDeque<Value>>,
    expressions: HashMap<String, VecDeque<Value>>,
    failures: VecDeque<String>,
    statuses: HashMap<String, u16>,
    pending_dialogs: VecDeque<Dialog>,
    mouse: Vec<MouseEvent>,
    keys: Vec<KeyEvent>,
    inserted: Vec<String>,
    files: Vec<PathBuf>,
    viewport: Option<Viewport>,
    calls: Vec<String>,
    closed: bool,
}

/// Pop the next scripted value; the last one repeats
fn next_scripted(queue: Option<&mut VecDeque<Value>>) -> Option<Value> {
    let queue = queue?;
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

/// Scripted page for unit tests
///
/// Runtime calls are answered per operation name (`count`, `probe`,
/// `actionable`, ...); plain expressions are answered per expression text.
/// Queued answers are consumed in order and the last one repeats.
#[derive(Debug)]
pub struct MockPage {
    id: String,
    opener: Option<String>,
    dialogs: DialogHandler,
    state: Mutex<MockPageState>,
}

impl MockPage {
    /// Create a blank page
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            opener: None,
            dialogs: DialogHandler::new(),
            state: Mutex::new(MockPageState {
                url: "about:blank".to_string(),
                ..MockPageState::default()
            }),
        }
    }

    /// Mark the page as a popup of `opener`
    #[must_use]
    pub fn with_opener(mut self, opener: impl Into<String>) -> Self {
        self.opener = Some(opener.into());
        self
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MockPageState) -> R) -> R {
        match self.state.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    /// Queue answers for a runtime operation
    pub fn script(&self, op: &str, values: impl IntoIterator<Item = Value>) {
        self.with_state(|s| s.runtime.entry(op.to_string()).or_default().extend(values));
    }

    /// Queue answers for a plain expression
    pub fn script_expression(&self, expression: &str, values: impl IntoIterator<Item = Value>) {
        self.with_state(|s| {
            s.expressions
                .entry(expression.to_string())
                .or_default()
                .extend(values);
        });
    }

    /// Fail the next evaluations with protocol errors, one per message
    pub fn fail_evaluations(&self, messages: impl IntoIterator<Item = &'static str>) {
        self.with_state(|s| s.failures.extend(messages.into_iter().map(str::to_string)));
    }

    /// HTTP status returned when navigating to `url`
    pub fn set_status(&self, url: &str, status: u16) {
        self.with_state(|s| {
            s.statuses.insert(url.to_string(), status);
        });
    }

    /// Raise `dialog` on the next mouse press
    pub fn queue_dialog(&self, dialog: Dialog) {
        self.with_state(|s| s.pending_dialogs.push_back(dialog));
    }

    /// Calls in order, as `name` or `name:detail`
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.with_state(|s| s.calls.clone())
    }

    /// Check if a call was made
    #[must_use]
    pub fn was_called(&self, call: &str) -> bool {
        self.with_state(|s| s.calls.iter().any(|c| c.starts_with(call)))
    }

    /// Runtime operations invoked, in order
    #[must_use]
    pub fn runtime_ops(&self) -> Vec<String> {
        self.with_state(|s| {
            s.calls
                .iter()
                .filter_map(|c| c.strip_prefix("runtime:"))
                .map(str::to_string)
                .collect()
        })
    }

    /// Mouse events dispatched
    #[must_use]
    pub fn mouse_events(&self) -> Vec<MouseEvent> {
        self.with_state(|s| s.mouse.clone())
    }

    /// Key events dispatched
    #[must_use]
    pub fn key_events(&self) -> Vec<KeyEvent> {
        self.with_state(|s| s.keys.clone())
    }

    /// Text inserted
    #[must_use]
    pub fn inserted_text(&self) -> Vec<String> {
        self.with_state(|s| s.inserted.clone())
    }

    /// Files set on inputs
    #[must_use]
    pub fn input_files(&self) -> Vec<PathBuf> {
        self.with_state(|s| s.files.clone())
    }

    /// Emulated viewport
    #[must_use]
    pub fn viewport(&self) -> Option<Viewport> {
        self.with_state(|s| s.viewport)
    }

    /// Whether `close` was called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.with_state(|s| s.closed)
    }
}

#[async_trait]
impl PageDriver for MockPage {
    fn id(&self) -> String {
        self.id.clone()
    }

    async fn opener_id(&self) -> PlaycheckResult<Option<String>> {
        Ok(self.opener.clone())
    }

    async fn navigate(&self, url: &str, _timeout: Duration) -> PlaycheckResult<Option<u16>> {
        self.with_state(|s| {
            s.calls.push(format!("navigate:{url}"));
            let previous = std::mem::replace(&mut s.url, url.to_string());
            s.history.push(previous);
            Ok(Some(s.statuses.get(url).copied().unwrap_or(200)))
        })
    }

    async fn reload(&self, _timeout: Duration) -> PlaycheckResult<Option<u16>> {
        self.with_state(|s| {
            s.calls.push("reload".to_string());
            Ok(Some(s.statuses.get(&s.url).copied().unwrap_or(200)))
        })
    }

    async fn go_back(&self, _timeout: Duration) -> PlaycheckResult<bool> {
        self.with_state(|s| {
            s.calls.push("go_back".to_string());
            Ok(match s.history.pop() {
                Some(url) => {
                    s.url = url;
                    true
                }
                None => false,
            })
        })
    }

    async fn evaluate(&self, expression: &str) -> PlaycheckResult<Value> {
        if let Some(message) = self.with_state(|s| s.failures.pop_front()) {
            return Err(PlaycheckError::protocol(message));
        }
        if let Some((op, _args)) = parse_runtime_call(expression) {
            return self.with_state(|s| {
                s.calls.push(format!("runtime:{op}"));
                Ok(next_scripted(s.runtime.get_mut(&op)).unwrap_or(Value::Null))
            });
        }
        self.with_state(|s| {
            s.calls.push(format!("evaluate:{expression}"));
            if let Some(value) = next_scripted(s.expressions.get_mut(expression)) {
                return Ok(value);
            }
            Ok(if expression == URL_EXPRESSION {
                Value::String(s.url.clone())
            } else {
                Value::Null
            })
        })
    }

    async fn dispatch_mouse(&self, event: &MouseEvent) -> PlaycheckResult<()> {
        let dialog = self.with_state(|s| {
            s.calls.push(format!("mouse:{:?}", event.kind));
            s.mouse.push(event.clone());
            if event.kind == MouseEventKind::Down {
                s.pending_dialogs.pop_front()
            } else {
                None
            }
        });
        if let Some(dialog) = dialog {
            self.dialogs.handle(dialog);
        }
        Ok(())
    }

    async fn dispatch_key(&self, event: &KeyEvent) -> PlaycheckResult<()> {
        self.with_state(|s| {
            s.calls.push(format!("key:{:?}:{}", event.kind, event.key));
            s.keys.push(event.clone());
        });
        Ok(())
    }

    async fn insert_text(&self, text: &str) -> PlaycheckResult<()> {
        self.with_state(|s| {
            s.calls.push(format!("insert_text:{text}"));
            s.inserted.push(text.to_string());
        });
        Ok(())
    }

    async fn set_input_files(&self, _element_expression: &str, files: &[PathBuf]) -> PlaycheckResult<()> {
        self.with_state(|s| {
            s.calls.push(format!("set_input_files:{}", files.len()));
            s.files = files.to_vec();
        });
        Ok(())
    }

    async fn set_viewport(&self, viewport: Viewport) -> PlaycheckResult<()> {
        self.with_state(|s| {
            s.calls.push(format!("set_viewport:{}x{}", viewport.width, viewport.height));
            s.viewport = Some(viewport);
        });
        Ok(())
    }

    fn dialogs(&self) -> &DialogHandler {
        &self.dialogs
    }

    async fn bring_to_front(&self) -> PlaycheckResult<()> {
        self.with_state(|s| s.calls.push("bring_to_front".to_string()));
        Ok(())
    }

    async fn close(&self) -> PlaycheckResult<()> {
        self.with_state(|s| {
            s.calls.push("close".to_string());
            s.closed = true;
        });
        Ok(())
    }
}

#[derive(Default)]
struct MockContext {
    options: ContextOptions,
    pages: Vec<Arc<MockPage>>,
    downloads: Vec<DownloadInfo>,
}

#[derive(Default)]
struct MockBrowserState {
    contexts: HashMap<ContextId, MockContext>,
    prepared: VecDeque<Arc<MockPage>>,
    next_id: u32,
    calls: Vec<String>,
    closed: bool,
}

/// Scripted browser for unit tests
#[derive(Default)]
pub struct MockBrowser {
    state: Mutex<MockBrowserState>,
}

impl std::fmt::Debug for MockBrowser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBrowser").finish_non_exhaustive()
    }
}

impl MockBrowser {
    /// Create a browser with no contexts
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MockBrowserState) -> R) -> R {
        match self.state.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    /// Hand out `page` for the next `new_page` call
    pub fn prepare_page(&self, page: Arc<MockPage>) {
        self.with_state(|s| s.prepared.push_back(page));
    }

    /// Add a popup to a context
    pub fn open_popup(&self, context: &str, page: Arc<MockPage>) {
        self.with_state(|s| {
            if let Some(ctx) = s.contexts.get_mut(context) {
                ctx.pages.push(page);
            }
        });
    }

    /// Record a download for a context
    pub fn push_download(&self, context: &str, info: DownloadInfo) {
        self.with_state(|s| {
            if let Some(ctx) = s.contexts.get_mut(context) {
                ctx.downloads.push(info);
            }
        });
    }

    /// Options a context was created with
    #[must_use]
    pub fn context_options(&self, context: &str) -> Option<ContextOptions> {
        self.with_state(|s| s.contexts.get(context).map(|c| c.options.clone()))
    }

    /// Number of live contexts
    #[must_use]
    pub fn context_count(&self) -> usize {
        self.with_state(|s| s.contexts.len())
    }

    /// Check if a call was made
    #[must_use]
    pub fn was_called(&self, call: &str) -> bool {
        self.with_state(|s| s.calls.iter().any(|c| c.starts_with(call)))
    }

    /// Whether `close` was called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.with_state(|s| s.closed)
    }

    fn context_error(context: &str) -> PlaycheckError {
        PlaycheckError::page(format!("no such context: {context}"))
    }
}

#[async_trait]
impl BrowserDriver for MockBrowser {
    async fn version(&self) -> PlaycheckResult<String> {
        Ok("MockBrowser/1.0".to_string())
    }

    async fn new_context(&self, options: &ContextOptions) -> PlaycheckResult<ContextId> {
        self.with_state(|s| {
            s.next_id += 1;
            let id = format!("context-{}", s.next_id);
            s.calls.push(format!("new_context:{id}"));
            s.contexts.insert(
                id.clone(),
                MockContext {
                    options: options.clone(),
                    ..MockContext::default()
                },
            );
            Ok(id)
        })
    }

    async fn new_page(&self, context: &ContextId) -> PlaycheckResult<Arc<dyn PageDriver>> {
        self.with_state(|s| {
            s.next_id += 1;
            let fresh = format!("page-{}", s.next_id);
            let page = s
                .prepared
                .pop_front()
                .unwrap_or_else(|| Arc::new(MockPage::new(fresh)));
            s.calls.push(format!("new_page:{context}"));
            let ctx = s
                .contexts
                .get_mut(context)
                .ok_or_else(|| Self::context_error(context))?;
            ctx.pages.push(Arc::clone(&page));
            let page: Arc<dyn PageDriver> = page;
            Ok(page)
        })
    }

    async fn pages(&self, context: &ContextId) -> PlaycheckResult<Vec<Arc<dyn PageDriver>>> {
        self.with_state(|s| {
            let ctx = s
                .contexts
                .get(context)
                .ok_or_else(|| Self::context_error(context))?;
            Ok(ctx
                .pages
                .iter()
                .filter(|p| !p.is_closed())
                .map(|p| {
                    let page: Arc<dyn PageDriver> = Arc::clone(p) as Arc<dyn PageDriver>;
                    page
                })
                .collect())
        })
    }

    async fn downloads(&self, context: &ContextId) -> PlaycheckResult<Vec<DownloadInfo>> {
        self.with_state(|s| {
            s.contexts
                .get(context)
                .map(|c| c.downloads.clone())
                .ok_or_else(|| Self::context_error(context))
        })
    }

    async fn grant_permissions(
        &self,
        context: &ContextId,
        permissions: &[Permission],
        _origin: Option<&str>,
    ) -> PlaycheckResult<()> {
        self.with_state(|s| {
            s.calls.push(format!("grant_permissions:{context}"));
            let ctx = s
                .contexts
                .get_mut(context)
                .ok_or_else(|| Self::context_error(context))?;
            for p in permissions {
                if !ctx.options.permissions.contains(p) {
                    ctx.options.permissions.push(*p);
                }
            }
            Ok(())
        })
    }

    async fn clear_permissions(&self, context: &ContextId) -> PlaycheckResult<()> {
        self.with_state(|s| {
            s.calls.push(format!("clear_permissions:{context}"));
            if let Some(ctx) = s.contexts.get_mut(context) {
                ctx.options.permissions.clear();
            }
            Ok(())
        })
    }

    async fn set_geolocation(&self, context: &ContextId, geolocation: Geolocation) -> PlaycheckResult<()> {
        self.with_state(|s| {
            s.calls.push(format!("set_geolocation:{context}"));
            if let Some(ctx) = s.contexts.get_mut(context) {
                ctx.options.geolocation = Some(geolocation);
            }
            Ok(())
        })
    }

    async fn close_context(&self, context: &ContextId) -> PlaycheckResult<()> {
        self.with_state(|s| {
            s.calls.push(format!("close_context:{context}"));
            s.contexts.remove(context);
            Ok(())
        })
    }

    async fn close(&self) -> PlaycheckResult<()> {
        self.with_state(|s| {
            s.calls.push("close".to_string());
            s.contexts.clear();
            s.closed = true;
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::selector::runtime_call;
    use serde_json::json;

    mod mouse_event_tests {
        use super::*;

        #[test]
        fn test_down_sets_buttons() {
            let e = MouseEvent::down(1.0, 2.0, MouseButton::Right, 1);
            assert_eq!(e.buttons, 2);
            assert_eq!(e.kind, MouseEventKind::Down);
            let up = MouseEvent::up(1.0, 2.0, MouseButton::Right, 1);
            assert_eq!(up.buttons, 0);
        }

        #[test]
        fn test_modifiers() {
            let e = MouseEvent::moved(0.0, 0.0, 0).with_modifiers(8);
            assert_eq!(e.modifiers, 8);
        }
    }

    mod value_tests {
        use super::*;

        #[test]
        fn test_value_to_string() {
            assert_eq!(value_to_string(Value::Null), "");
            assert_eq!(value_to_string(json!("x")), "x");
            assert_eq!(value_to_string(json!(3)), "3");
        }
    }

    mod mock_page_tests {
        use super::*;

        #[tokio::test]
        async fn test_scripted_runtime_answers_repeat_last() {
            let page = MockPage::new("p");
            page.script("count", [json!(0), json!(2)]);
            let script = runtime_call("count", &[json!([])]);
            assert_eq!(page.evaluate(&script).await.unwrap(), json!(0));
            assert_eq!(page.evaluate(&script).await.unwrap(), json!(2));
            assert_eq!(page.evaluate(&script).await.unwrap(), json!(2));
            assert_eq!(page.runtime_ops(), vec!["count", "count", "count"]);
        }

        #[tokio::test]
        async fn test_navigation_history() {
            let page = MockPage::new("p");
            page.set_status("https://x.test/404", 404);
            let status = page
                .navigate("https://x.test/404", Duration::from_secs(1))
                .await
                .unwrap();
            assert_eq!(status, Some(404));
            assert_eq!(page.url().await.unwrap(), "https://x.test/404");
            assert!(page.go_back(Duration::from_secs(1)).await.unwrap());
            assert_eq!(page.url().await.unwrap(), "about:blank");
            assert!(!page.go_back(Duration::from_secs(1)).await.unwrap());
        }

        #[tokio::test]
        async fn test_dialog_raised_on_press() {
            let page = MockPage::new("p");
            page.queue_dialog(Dialog::alert("I am a JS Alert"));
            page.dispatch_mouse(&MouseEvent::moved(1.0, 1.0, 0)).await.unwrap();
            assert_eq!(page.dialogs().dialog_count(), 0);
            page.dispatch_mouse(&MouseEvent::down(1.0, 1.0, MouseButton::Left, 1))
                .await
                .unwrap();
            assert_eq!(page.dialogs().dialog_count(), 1);
        }

        #[tokio::test]
        async fn test_title_default_method() {
            let page = MockPage::new("p");
            page.script_expression(TITLE_EXPRESSION, [json!("Swag Labs")]);
            assert_eq!(page.title().await.unwrap(), "Swag Labs");
        }
    }

    mod mock_browser_tests {
        use super::*;

        #[tokio::test]
        async fn test_contexts_are_isolated() {
            let browser = MockBrowser::new();
            let a = browser.new_context(&ContextOptions::new()).await.unwrap();
            let b = browser.new_context(&ContextOptions::new()).await.unwrap();
            browser.new_page(&a).await.unwrap();
            assert_eq!(browser.pages(&a).await.unwrap().len(), 1);
            assert!(browser.pages(&b).await.unwrap().is_empty());
            browser.close_context(&a).await.unwrap();
            assert!(browser.pages(&a).await.is_err());
            assert_eq!(browser.context_count(), 1);
        }

        #[tokio::test]
        async fn test_wait_for_popup() {
            let browser = MockBrowser::new();
            let ctx = browser.new_context(&ContextOptions::new()).await.unwrap();
            let opener = browser.new_page(&ctx).await.unwrap();
            browser.open_popup(&ctx, Arc::new(MockPage::new("popup").with_opener(opener.id())));
            let known = vec![opener.id()];
            let popup = browser
                .wait_for_popup(&ctx, &opener.id(), &known, Duration::from_millis(200))
                .await
                .unwrap();
            assert_eq!(popup.id(), "popup");
        }

        #[tokio::test]
        async fn test_wait_for_popup_times_out() {
            let browser = MockBrowser::new();
            let ctx = browser.new_context(&ContextOptions::new()).await.unwrap();
            let err = browser
                .wait_for_popup(&ctx, "nobody", &[], Duration::from_millis(50))
                .await
                .err()
                .unwrap();
            assert!(matches!(err, PlaycheckError::Timeout { .. }));
        }

        #[tokio::test]
        async fn test_next_download() {
            let browser = MockBrowser::new();
            let ctx = browser.new_context(&ContextOptions::new()).await.unwrap();
            browser.push_download(
                &ctx,
                DownloadInfo {
                    guid: "1".into(),
                    url: "https://x.test/a.txt".into(),
                    suggested_filename: "a.txt".into(),
                    path: Some(PathBuf::from("/tmp/1")),
                    state: DownloadState::Completed,
                },
            );
            let d = browser
                .next_download(&ctx, 0, Duration::from_millis(100))
                .await
                .unwrap();
            assert_eq!(d.suggested_filename, "a.txt");
            assert!(browser
                .next_download(&ctx, 1, Duration::from_millis(30))
                .await
                .is_err());
        }
    }
}
