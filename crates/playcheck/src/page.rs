//! Page handle: navigation, locators, input devices, dialogs, popups and
//! downloads for one browser tab.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{Timeouts, Viewport};
use crate::dialog::{Dialog, DialogHandler};
use crate::download::Download;
use crate::driver::{BrowserDriver, ContextId, MouseButton, MouseEvent, PageDriver, STATUS_EXPRESSION};
use crate::keyboard::{lookup_key, KeyChord, KeyEvent, Modifier};
use crate::locator::{FrameLocator, Locator};
use crate::matcher::{TextMatcher, UrlMatcher};
use crate::result::PlaycheckResult;
use crate::selector::{runtime_call, RoleOptions, Selector, DEFAULT_TEST_ID_ATTRIBUTE};
use crate::wait::{poll_until, LoadState, Observation, WaitOptions, NETWORK_IDLE_THRESHOLD_MS};

/// Settings shared by every page of a context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSettings {
    /// Action, assertion and navigation timeouts
    pub timeouts: Timeouts,
    /// Attribute used by `get_by_test_id`
    pub test_id_attribute: String,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            timeouts: Timeouts::default(),
            test_id_attribute: DEFAULT_TEST_ID_ATTRIBUTE.to_string(),
        }
    }
}

/// Main-document response of a navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    url: String,
    status: Option<u16>,
}

impl Response {
    /// Create a response record
    #[must_use]
    pub fn new(url: impl Into<String>, status: Option<u16>) -> Self {
        Self {
            url: url.into(),
            status,
        }
    }

    /// Final URL
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// HTTP status, 0 when the browser did not report one
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status.unwrap_or(0)
    }

    /// Status in the 2xx range
    #[must_use]
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status())
    }
}

#[derive(Debug, Default)]
struct InputState {
    modifiers: u32,
    mouse_x: f64,
    mouse_y: f64,
    buttons: u32,
}

/// Handle to one browser tab
#[derive(Clone)]
pub struct Page {
    driver: Arc<dyn PageDriver>,
    browser: Arc<dyn BrowserDriver>,
    context: ContextId,
    settings: Arc<PageSettings>,
    input: Arc<Mutex<InputState>>,
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("id", &self.driver.id())
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl Page {
    pub(crate) fn new(
        driver: Arc<dyn PageDriver>,
        browser: Arc<dyn BrowserDriver>,
        context: ContextId,
        settings: Arc<PageSettings>,
    ) -> Self {
        Self {
            driver,
            browser,
            context,
            settings,
            input: Arc::new(Mutex::new(InputState::default())),
        }
    }

    /// Driver-assigned page identifier
    #[must_use]
    pub fn id(&self) -> String {
        self.driver.id()
    }

    /// Timeouts and selector settings
    #[must_use]
    pub fn settings(&self) -> &PageSettings {
        &self.settings
    }

    pub(crate) fn driver(&self) -> &Arc<dyn PageDriver> {
        &self.driver
    }

    fn with_input<R>(&self, f: impl FnOnce(&mut InputState) -> R) -> R {
        match self.input.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Navigate to `url` and wait for the load event
    pub async fn goto(&self, url: &str) -> PlaycheckResult<Response> {
        info!(page = %self.driver.id(), url, "navigating");
        let status = self
            .driver
            .navigate(url, self.settings.timeouts.navigation())
            .await?;
        let response = Response::new(self.driver.url().await?, status);
        debug!(status = response.status(), url = response.url(), "navigation finished");
        Ok(response)
    }

    /// Reload the current document
    pub async fn reload(&self) -> PlaycheckResult<Response> {
        debug!(page = %self.driver.id(), "reloading");
        let status = self.driver.reload(self.settings.timeouts.navigation()).await?;
        Ok(Response::new(self.driver.url().await?, status))
    }

    /// Go back in history; `None` when there is no previous entry
    pub async fn go_back(&self) -> PlaycheckResult<Option<Response>> {
        if !self.driver.go_back(self.settings.timeouts.navigation()).await? {
            return Ok(None);
        }
        let status = self.driver.evaluate(STATUS_EXPRESSION).await?;
        let status = status.as_u64().and_then(|s| u16::try_from(s).ok());
        Ok(Some(Response::new(self.driver.url().await?, status)))
    }

    /// Current URL
    pub async fn url(&self) -> PlaycheckResult<String> {
        self.driver.url().await
    }

    /// Document title
    pub async fn title(&self) -> PlaycheckResult<String> {
        self.driver.title().await
    }

    /// Serialized document
    pub async fn content(&self) -> PlaycheckResult<String> {
        self.driver.content().await
    }

    // =========================================================================
    // Locators
    // =========================================================================

    /// Locate by CSS selector
    #[must_use]
    pub fn locator(&self, css: &str) -> Locator {
        Locator::new(self.clone(), Selector::css(css))
    }

    /// Locate by selector of any engine
    #[must_use]
    pub fn locate(&self, selector: Selector) -> Locator {
        Locator::new(self.clone(), selector)
    }

    /// Smallest elements containing `text`, ignoring case
    #[must_use]
    pub fn get_by_text(&self, text: &str) -> Locator {
        self.locate(Selector::Text(TextMatcher::loose(text)))
    }

    /// Elements whose whole text matches
    #[must_use]
    pub fn get_by_text_matching(&self, matcher: impl Into<TextMatcher>) -> Locator {
        self.locate(Selector::Text(matcher.into()))
    }

    /// Elements by ARIA role
    #[must_use]
    pub fn get_by_role(&self, role: &str, options: RoleOptions) -> Locator {
        self.locate(Selector::role(role, options))
    }

    /// Form controls by label text
    #[must_use]
    pub fn get_by_label(&self, text: &str) -> Locator {
        self.locate(Selector::Label(TextMatcher::loose(text)))
    }

    /// Inputs by placeholder
    #[must_use]
    pub fn get_by_placeholder(&self, text: &str) -> Locator {
        self.locate(Selector::Placeholder(TextMatcher::loose(text)))
    }

    /// Images by alt text
    #[must_use]
    pub fn get_by_alt_text(&self, text: &str) -> Locator {
        self.locate(Selector::AltText(TextMatcher::loose(text)))
    }

    /// Elements by title attribute
    #[must_use]
    pub fn get_by_title(&self, text: &str) -> Locator {
        self.locate(Selector::Title(TextMatcher::loose(text)))
    }

    /// Elements by test id
    #[must_use]
    pub fn get_by_test_id(&self, value: &str) -> Locator {
        self.locate(Selector::TestId {
            attribute: self.settings.test_id_attribute.clone(),
            value: value.to_string(),
        })
    }

    /// Enter an iframe
    #[must_use]
    pub fn frame_locator(&self, css: &str) -> FrameLocator {
        FrameLocator::new(self.clone(), css)
    }

    // =========================================================================
    // Input devices
    // =========================================================================

    /// Keyboard of this page
    #[must_use]
    pub fn keyboard(&self) -> Keyboard<'_> {
        Keyboard { page: self }
    }

    /// Mouse of this page
    #[must_use]
    pub fn mouse(&self) -> Mouse<'_> {
        Mouse { page: self }
    }

    // =========================================================================
    // Dialogs
    // =========================================================================

    /// Answer dialogs with `handler`; unanswered dialogs are dismissed
    pub fn on_dialog<F>(&self, handler: F)
    where
        F: Fn(&mut Dialog) + Send + Sync + 'static,
    {
        self.driver.dialogs().on_dialog(handler);
    }

    /// Dialog policy of this page
    #[must_use]
    pub fn dialog_handler(&self) -> &DialogHandler {
        self.driver.dialogs()
    }

    /// Dialogs seen so far
    #[must_use]
    pub fn dialogs(&self) -> Vec<Dialog> {
        self.driver.dialogs().dialogs()
    }

    // =========================================================================
    // Waiting
    // =========================================================================

    /// Wait until the URL matches
    pub async fn wait_for_url(&self, matcher: impl Into<UrlMatcher>) -> PlaycheckResult<()> {
        let matcher = matcher.into();
        let options = WaitOptions::new(format!("URL to match {matcher}"), self.settings.timeouts.navigation())
            .with_poll_interval(self.settings.timeouts.poll_interval());
        let matcher = &matcher;
        poll_until(&options, || async move {
            let url = self.driver.url().await?;
            Ok(if matcher.matches(&url) {
                Observation::Done(())
            } else {
                Observation::Retry(url)
            })
        })
        .await
    }

    /// Wait for a load state of the current document
    pub async fn wait_for_load_state(&self, state: LoadState) -> PlaycheckResult<()> {
        let options = WaitOptions::new(format!("load state {state}"), self.settings.timeouts.navigation())
            .with_poll_interval(self.settings.timeouts.poll_interval());
        let ready_script = runtime_call("readyState", &[]);
        let ready_script = ready_script.as_str();
        poll_until(&options, || async move {
            let ready = self.driver.evaluate(ready_script).await?;
            let ready = ready.as_str().unwrap_or("loading").to_string();
            if !state.is_reached_by(&ready) {
                return Ok(Observation::Retry(format!("readyState {ready}")));
            }
            if state == LoadState::NetworkIdle {
                let script = runtime_call("pendingResources", &[Value::from(NETWORK_IDLE_THRESHOLD_MS)]);
                let recent = self.driver.evaluate(&script).await?.as_u64().unwrap_or(0);
                if recent > 0 {
                    return Ok(Observation::Retry(format!("{recent} recent requests")));
                }
            }
            Ok(Observation::Done(()))
        })
        .await
    }

    /// Sleep for `ms` milliseconds
    pub async fn wait_for_timeout(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    // =========================================================================
    // Scripts and emulation
    // =========================================================================

    /// Evaluate a JavaScript expression
    pub async fn evaluate(&self, expression: &str) -> PlaycheckResult<Value> {
        self.driver.evaluate(expression).await
    }

    /// Evaluate and decode the result
    pub async fn evaluate_as<T: DeserializeOwned>(&self, expression: &str) -> PlaycheckResult<T> {
        Ok(serde_json::from_value(self.driver.evaluate(expression).await?)?)
    }

    /// Resize the viewport
    pub async fn set_viewport_size(&self, viewport: Viewport) -> PlaycheckResult<()> {
        debug!(width = viewport.width, height = viewport.height, "setting viewport");
        self.driver.set_viewport(viewport).await
    }

    /// Current viewport size as seen by the page
    pub async fn viewport_size(&self) -> PlaycheckResult<Viewport> {
        let value = self
            .driver
            .evaluate("({ width: window.innerWidth, height: window.innerHeight })")
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    // =========================================================================
    // Popups and downloads
    // =========================================================================

    /// Run `action` and return the page it opens
    pub async fn expect_popup<F, Fut>(&self, action: F) -> PlaycheckResult<Page>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = PlaycheckResult<()>>,
    {
        let known: Vec<String> = self
            .browser
            .pages(&self.context)
            .await?
            .iter()
            .map(|p| p.id())
            .collect();
        action().await?;
        let popup = self
            .browser
            .wait_for_popup(&self.context, &self.driver.id(), &known, self.settings.timeouts.action())
            .await?;
        debug!(opener = %self.driver.id(), popup = %popup.id(), "popup opened");
        let page = Page::new(popup, Arc::clone(&self.browser), self.context.clone(), Arc::clone(&self.settings));
        page.wait_for_load_state(LoadState::DomContentLoaded).await?;
        Ok(page)
    }

    /// Run `action` and return the download it starts
    pub async fn expect_download<F, Fut>(&self, action: F) -> PlaycheckResult<Download>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = PlaycheckResult<()>>,
    {
        let before = self.browser.downloads(&self.context).await?.len();
        action().await?;
        let info = self
            .browser
            .next_download(&self.context, before, self.settings.timeouts.navigation())
            .await?;
        info!(file = %info.suggested_filename, "download finished");
        Ok(Download::new(info))
    }

    /// Activate this tab
    pub async fn bring_to_front(&self) -> PlaycheckResult<()> {
        self.driver.bring_to_front().await
    }

    /// Close this tab
    pub async fn close(&self) -> PlaycheckResult<()> {
        debug!(page = %self.driver.id(), "closing page");
        self.driver.close().await
    }
}

/// Keyboard bound to a page
#[derive(Debug, Clone, Copy)]
pub struct Keyboard<'a> {
    page: &'a Page,
}

impl Keyboard<'_> {
    /// Press a chord such as `Enter`, `Shift+A` or `Control+A`
    pub async fn press(&self, chord: &str) -> PlaycheckResult<()> {
        let held = self.page.with_input(|s| s.modifiers);
        for mut event in KeyChord::parse(chord)?.events() {
            event.modifiers |= held;
            self.page.driver.dispatch_key(&event).await?;
        }
        Ok(())
    }

    /// Type text one key at a time; characters without a key are inserted
    pub async fn type_text(&self, text: &str) -> PlaycheckResult<()> {
        let held = self.page.with_input(|s| s.modifiers);
        for c in text.chars() {
            let name = if c == '\n' { "Enter".to_string() } else { c.to_string() };
            match lookup_key(&name) {
                Ok(key) => {
                    let text = key.text.clone().or_else(|| Some(c.to_string()));
                    self.page.driver.dispatch_key(&KeyEvent::down(&key, held, text)).await?;
                    self.page.driver.dispatch_key(&KeyEvent::up(&key, held)).await?;
                }
                Err(_) => self.page.driver.insert_text(&name).await?,
            }
        }
        Ok(())
    }

    /// Insert text without key events
    pub async fn insert_text(&self, text: &str) -> PlaycheckResult<()> {
        self.page.driver.insert_text(text).await
    }

    /// Hold a key down; modifiers stay held for later events
    pub async fn down(&self, name: &str) -> PlaycheckResult<()> {
        let key = lookup_key(name)?;
        let modifiers = self.page.with_input(|s| {
            if let Some(m) = Modifier::from_key(&key.key) {
                s.modifiers |= m.bit();
            }
            s.modifiers
        });
        let text = if modifiers & !Modifier::Shift.bit() == 0 {
            key.text.clone()
        } else {
            None
        };
        self.page.driver.dispatch_key(&KeyEvent::down(&key, modifiers, text)).await
    }

    /// Release a key
    pub async fn up(&self, name: &str) -> PlaycheckResult<()> {
        let key = lookup_key(name)?;
        let modifiers = self.page.with_input(|s| {
            if let Some(m) = Modifier::from_key(&key.key) {
                s.modifiers &= !m.bit();
            }
            s.modifiers
        });
        self.page.driver.dispatch_key(&KeyEvent::up(&key, modifiers)).await
    }
}

/// Options for mouse clicks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickOptions {
    /// Button to click with
    pub button: MouseButton,
    /// Number of clicks (2 for a double click)
    pub click_count: u32,
    /// Modifiers held during the click
    pub modifiers: u32,
    /// Point relative to the element's top-left corner
    pub position: Option<(f64, f64)>,
    /// Skip actionability checks
    pub force: bool,
}

impl Default for ClickOptions {
    fn default() -> Self {
        Self {
            button: MouseButton::Left,
            click_count: 1,
            modifiers: 0,
            position: None,
            force: false,
        }
    }
}

impl ClickOptions {
    /// Right-button click
    #[must_use]
    pub fn right() -> Self {
        Self {
            button: MouseButton::Right,
            ..Self::default()
        }
    }

    /// Double click
    #[must_use]
    pub fn double() -> Self {
        Self {
            click_count: 2,
            ..Self::default()
        }
    }

    /// Hold modifiers
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: &[Modifier]) -> Self {
        self.modifiers = crate::keyboard::modifier_mask(modifiers);
        self
    }

    /// Click at an offset inside the element
    #[must_use]
    pub const fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Some((x, y));
        self
    }

    /// Skip actionability checks
    #[must_use]
    pub const fn forced(mut self) -> Self {
        self.force = true;
        self
    }
}

/// Mouse bound to a page
#[derive(Debug, Clone, Copy)]
pub struct Mouse<'a> {
    page: &'a Page,
}

impl Mouse<'_> {
    /// Move the pointer in `steps` increments
    pub async fn move_to(&self, x: f64, y: f64, steps: u32) -> PlaycheckResult<()> {
        let (from_x, from_y, buttons, modifiers) =
            self.page.with_input(|s| (s.mouse_x, s.mouse_y, s.buttons, s.modifiers));
        let steps = steps.max(1);
        for i in 1..=steps {
            let t = f64::from(i) / f64::from(steps);
            let event = MouseEvent::moved(from_x + (x - from_x) * t, from_y + (y - from_y) * t, buttons)
                .with_modifiers(modifiers);
            self.page.driver.dispatch_mouse(&event).await?;
        }
        self.page.with_input(|s| {
            s.mouse_x = x;
            s.mouse_y = y;
        });
        Ok(())
    }

    /// Press a button at the current position
    pub async fn down(&self, button: MouseButton, click_count: u32) -> PlaycheckResult<()> {
        let (x, y, modifiers) = self.page.with_input(|s| {
            s.buttons |= button.buttons_mask();
            (s.mouse_x, s.mouse_y, s.modifiers)
        });
        let event = MouseEvent::down(x, y, button, click_count).with_modifiers(modifiers);
        self.page.driver.dispatch_mouse(&event).await
    }

    /// Release a button at the current position
    pub async fn up(&self, button: MouseButton, click_count: u32) -> PlaycheckResult<()> {
        let (x, y, modifiers) = self.page.with_input(|s| {
            s.buttons &= !button.buttons_mask();
            (s.mouse_x, s.mouse_y, s.modifiers)
        });
        let event = MouseEvent::up(x, y, button, click_count).with_modifiers(modifiers);
        self.page.driver.dispatch_mouse(&event).await
    }

    /// Move to a point and click it
    pub async fn click(&self, x: f64, y: f64, options: &ClickOptions) -> PlaycheckResult<()> {
        self.move_to(x, y, 1).await?;
        let held = self.page.with_input(|s| s.modifiers) | options.modifiers;
        for count in 1..=options.click_count.max(1) {
            let down = MouseEvent::down(x, y, options.button, count).with_modifiers(held);
            self.page.driver.dispatch_mouse(&down).await?;
            let up = MouseEvent::up(x, y, options.button, count).with_modifiers(held);
            self.page.driver.dispatch_mouse(&up).await?;
        }
        Ok(())
    }

    /// Scroll the wheel at the current position
    pub async fn wheel(&self, delta_x: f64, delta_y: f64) -> PlaycheckResult<()> {
        let (x, y) = self.page.with_input(|s| (s.mouse_x, s.mouse_y));
        self.page
            .driver
            .dispatch_mouse(&MouseEvent::wheel(x, y, delta_x, delta_y))
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::context::ContextOptions;
    use crate::dialog::DialogType;
    use crate::download::{DownloadInfo, DownloadState};
    use crate::driver::{MockBrowser, MockPage, MouseEventKind, TITLE_EXPRESSION};
    use crate::keyboard::KeyEventKind;
    use crate::result::PlaycheckError;
    use serde_json::json;
    use std::path::PathBuf;

    async fn fixture() -> (Arc<MockBrowser>, Arc<MockPage>, Page) {
        let browser = Arc::new(MockBrowser::new());
        let mock = Arc::new(MockPage::new("main"));
        browser.prepare_page(Arc::clone(&mock));
        let ctx = browser.new_context(&ContextOptions::new()).await.unwrap();
        let driver = browser.new_page(&ctx).await.unwrap();
        let settings = PageSettings {
            timeouts: Timeouts {
                expect_ms: 200,
                action_ms: 200,
                navigation_ms: 200,
                poll_interval_ms: 10,
            },
            ..PageSettings::default()
        };
        let page = Page::new(driver, browser.clone(), ctx, Arc::new(settings));
        (browser, mock, page)
    }

    mod response_tests {
        use super::*;

        #[test]
        fn test_status_ranges() {
            assert!(Response::new("u", Some(200)).ok());
            assert!(!Response::new("u", Some(404)).ok());
            assert_eq!(Response::new("u", None).status(), 0);
        }
    }

    mod navigation_tests {
        use super::*;

        #[tokio::test]
        async fn test_goto_reports_status() {
            let (_b, mock, page) = fixture().await;
            mock.set_status("https://the-internet.herokuapp.com/status_codes/404", 404);
            let response = page
                .goto("https://the-internet.herokuapp.com/status_codes/404")
                .await
                .unwrap();
            assert_eq!(response.status(), 404);
            assert!(response.url().ends_with("/404"));
        }

        #[tokio::test]
        async fn test_go_back_without_history() {
            let (_b, mock, page) = fixture().await;
            page.goto("https://www.saucedemo.com/").await.unwrap();
            assert!(page.go_back().await.unwrap().is_some());
            assert!(page.go_back().await.unwrap().is_none());
            assert!(mock.was_called("go_back"));
        }

        #[tokio::test]
        async fn test_title() {
            let (_b, mock, page) = fixture().await;
            mock.script_expression(TITLE_EXPRESSION, [json!("The Internet")]);
            assert_eq!(page.title().await.unwrap(), "The Internet");
        }

        #[tokio::test]
        async fn test_wait_for_url() {
            let (_b, _mock, page) = fixture().await;
            page.goto("https://www.saucedemo.com/inventory.html").await.unwrap();
            page.wait_for_url(UrlMatcher::glob("**/inventory.html")).await.unwrap();
            let err = page.wait_for_url("https://nowhere.test/").await.unwrap_err();
            assert!(matches!(err, PlaycheckError::Timeout { .. }));
        }

        #[tokio::test]
        async fn test_wait_for_load_state() {
            let (_b, mock, page) = fixture().await;
            mock.script("readyState", [json!("loading"), json!("complete")]);
            mock.script("pendingResources", [json!(0)]);
            page.wait_for_load_state(LoadState::NetworkIdle).await.unwrap();
            assert_eq!(
                mock.runtime_ops(),
                vec!["readyState", "readyState", "pendingResources"]
            );
        }
    }

    mod keyboard_tests {
        use super::*;

        #[tokio::test]
        async fn test_press_chord() {
            let (_b, mock, page) = fixture().await;
            page.keyboard().press("Control+A").await.unwrap();
            let keys = mock.key_events();
            assert_eq!(keys.len(), 4);
            assert_eq!(keys[1].key, "A");
            assert_eq!(keys[1].modifiers, 2);
            assert!(keys[1].text.is_none());
        }

        #[tokio::test]
        async fn test_type_text() {
            let (_b, mock, page) = fixture().await;
            page.keyboard().type_text("ab\u{00e9}").await.unwrap();
            let keys = mock.key_events();
            assert_eq!(keys.len(), 4);
            assert_eq!(keys[0].text.as_deref(), Some("a"));
            assert_eq!(mock.inserted_text(), vec!["\u{00e9}"]);
        }

        #[tokio::test]
        async fn test_held_modifier_applies_to_later_presses() {
            let (_b, mock, page) = fixture().await;
            let kb = page.keyboard();
            kb.down("Shift").await.unwrap();
            kb.press("ArrowLeft").await.unwrap();
            kb.up("Shift").await.unwrap();
            let keys = mock.key_events();
            assert_eq!(keys[1].key, "ArrowLeft");
            assert_eq!(keys[1].modifiers, 8);
            assert_eq!(keys.last().unwrap().kind, KeyEventKind::Up);
            assert_eq!(keys.last().unwrap().modifiers, 0);
        }
    }

    mod mouse_tests {
        use super::*;

        #[tokio::test]
        async fn test_click_sequence() {
            let (_b, mock, page) = fixture().await;
            page.mouse()
                .click(10.0, 20.0, &ClickOptions::double())
                .await
                .unwrap();
            let kinds: Vec<MouseEventKind> = mock.mouse_events().iter().map(|e| e.kind).collect();
            assert_eq!(
                kinds,
                vec![
                    MouseEventKind::Move,
                    MouseEventKind::Down,
                    MouseEventKind::Up,
                    MouseEventKind::Down,
                    MouseEventKind::Up
                ]
            );
            assert_eq!(mock.mouse_events()[3].click_count, 2);
        }

        #[tokio::test]
        async fn test_drag_holds_button_while_moving() {
            let (_b, mock, page) = fixture().await;
            let mouse = page.mouse();
            mouse.move_to(0.0, 0.0, 1).await.unwrap();
            mouse.down(MouseButton::Left, 1).await.unwrap();
            mouse.move_to(100.0, 0.0, 4).await.unwrap();
            mouse.up(MouseButton::Left, 1).await.unwrap();
            let events = mock.mouse_events();
            assert_eq!(events.len(), 7);
            assert_eq!(events[3].buttons, 1);
            assert!((events[5].x - 100.0).abs() < f64::EPSILON);
        }
    }

    mod dialog_tests {
        use super::*;

        #[tokio::test]
        async fn test_on_dialog_records() {
            let (_b, mock, page) = fixture().await;
            page.on_dialog(|d| d.accept());
            mock.queue_dialog(Dialog::confirm("I am a JS Confirm"));
            page.mouse().click(1.0, 1.0, &ClickOptions::default()).await.unwrap();
            let dialogs = page.dialogs();
            assert_eq!(dialogs.len(), 1);
            assert_eq!(dialogs[0].dialog_type(), DialogType::Confirm);
            assert!(dialogs[0].action().unwrap().accepts());
        }
    }

    mod popup_download_tests {
        use super::*;

        #[tokio::test]
        async fn test_expect_popup() {
            let (browser, mock, page) = fixture().await;
            let ctx = page.context.clone();
            let popup_mock = Arc::new(MockPage::new("popup").with_opener("main"));
            popup_mock.script("readyState", [json!("complete")]);
            let b = Arc::clone(&browser);
            let popup = page
                .expect_popup(|| async move {
                    b.open_popup(&ctx, popup_mock);
                    Ok(())
                })
                .await
                .unwrap();
            assert_eq!(popup.id(), "popup");
            assert_ne!(popup.id(), mock.id());
        }

        #[tokio::test]
        async fn test_expect_download() {
            let (browser, _mock, page) = fixture().await;
            let ctx = page.context.clone();
            let b = Arc::clone(&browser);
            let download = page
                .expect_download(|| async move {
                    b.push_download(
                        &ctx,
                        DownloadInfo {
                            guid: "g".into(),
                            url: "https://x.test/file.txt".into(),
                            suggested_filename: "file.txt".into(),
                            path: Some(PathBuf::from("/tmp/g")),
                            state: DownloadState::Completed,
                        },
                    );
                    Ok(())
                })
                .await
                .unwrap();
            assert_eq!(download.suggested_filename(), "file.txt");
        }
    }

    mod emulation_tests {
        use super::*;

        #[tokio::test]
        async fn test_viewport_roundtrip_through_driver() {
            let (_b, mock, page) = fixture().await;
            page.set_viewport_size(Viewport::new(375, 667)).await.unwrap();
            assert_eq!(mock.viewport(), Some(Viewport::new(375, 667)));
            mock.script_expression(
                "({ width: window.innerWidth, height: window.innerHeight })",
                [json!({"width": 375, "height": 667})],
            );
            assert_eq!(page.viewport_size().await.unwrap().width, 375);
        }
    }
}
