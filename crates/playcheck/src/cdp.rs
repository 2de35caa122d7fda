//! Real browser control over the Chrome DevTools Protocol.
//!
//! `ChromiumBrowser` and `ChromiumPage` implement the driver traits on top of
//! chromiumoxide. Only protocol plumbing lives here: element logic runs in
//! the injected page runtime, shared with the mock driver.

#![allow(
    clippy::wildcard_imports,
    clippy::significant_drop_tightening,
    clippy::cast_possible_truncation
)]

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    DownloadProgressState, EventDownloadProgress, EventDownloadWillBegin, GetVersionParams,
    GrantPermissionsParams, PermissionType, ResetPermissionsParams, SetDownloadBehaviorBehavior,
    SetDownloadBehaviorParams,
};
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetGeolocationOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::fetch::{
    AuthChallengeResponse, AuthChallengeResponseResponse, ContinueRequestParams,
    ContinueWithAuthParams, EnableParams as FetchEnableParams, EventAuthRequired,
    EventRequestPaused,
};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
    DispatchMouseEventType, InsertTextParams, MouseButton as CdpMouseButton,
};
use chromiumoxide::cdp::browser_protocol::page::{
    BringToFrontParams, DialogType as CdpDialogType, EventJavascriptDialogOpening,
    GetNavigationHistoryParams, HandleJavaScriptDialogParams, NavigateToHistoryEntryParams,
};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams,
    DisposeBrowserContextParams, GetTargetInfoParams, TargetId,
};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{LaunchOptions, Viewport};
use crate::context::{ContextOptions, Geolocation, HttpCredentials, Permission};
use crate::dialog::{Dialog, DialogHandler, DialogType};
use crate::download::{DownloadInfo, DownloadState};
use crate::driver::{
    BrowserDriver, ContextId, MouseButton, MouseEvent, MouseEventKind, PageDriver, STATUS_EXPRESSION,
};
use crate::keyboard::{KeyEvent, KeyEventKind};
use crate::result::{PlaycheckError, PlaycheckResult};

fn page_error(e: impl std::fmt::Display) -> PlaycheckError {
    PlaycheckError::protocol(e.to_string())
}

fn input_error(e: impl std::fmt::Display) -> PlaycheckError {
    PlaycheckError::input(e.to_string())
}

fn timeout_ms(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}

fn lock<T>(mutex: &StdMutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

const fn permission_type(permission: Permission) -> PermissionType {
    match permission {
        Permission::Geolocation => PermissionType::Geolocation,
        Permission::Notifications => PermissionType::Notifications,
        Permission::ClipboardRead => PermissionType::ClipboardReadWrite,
        Permission::ClipboardWrite => PermissionType::ClipboardSanitizedWrite,
    }
}

// ============================================================================
// Page
// ============================================================================

/// A browser tab driven over CDP
#[derive(Debug)]
pub struct ChromiumPage {
    page: CdpPage,
    id: String,
    opener: Option<String>,
    dialogs: DialogHandler,
    tasks: StdMutex<Vec<JoinHandle<()>>>,
    closed: StdMutex<bool>,
}

impl ChromiumPage {
    async fn attach(page: CdpPage, opener: Option<String>, options: &ContextOptions, viewport: Viewport) -> PlaycheckResult<Arc<Self>> {
        let id = page.target_id().as_ref().to_string();
        let this = Arc::new(Self {
            page,
            id,
            opener,
            dialogs: DialogHandler::new(),
            tasks: StdMutex::new(Vec::new()),
            closed: StdMutex::new(false),
        });
        this.listen_for_dialogs().await?;
        if let Some(credentials) = &options.http_credentials {
            this.answer_auth_challenges(credentials.clone()).await?;
        }
        this.set_viewport(options.viewport.unwrap_or(viewport)).await?;
        if let Some(geolocation) = options.geolocation {
            this.emulate_geolocation(geolocation).await?;
        }
        debug!(page = %this.id, "page attached");
        Ok(this)
    }

    fn spawn(&self, task: JoinHandle<()>) {
        lock(&self.tasks).push(task);
    }

    /// Route `javascriptDialogOpening` through the page's dialog handler
    async fn listen_for_dialogs(&self) -> PlaycheckResult<()> {
        let mut events = self
            .page
            .event_listener::<EventJavascriptDialogOpening>()
            .await
            .map_err(page_error)?;
        let page = self.page.clone();
        let handler = self.dialogs.clone();
        self.spawn(tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let dialog_type = match event.r#type {
                    CdpDialogType::Alert => DialogType::Alert,
                    CdpDialogType::Confirm => DialogType::Confirm,
                    CdpDialogType::Prompt => DialogType::Prompt,
                    CdpDialogType::Beforeunload => DialogType::BeforeUnload,
                };
                let dialog = if dialog_type == DialogType::Prompt {
                    Dialog::prompt(event.message.clone(), event.default_prompt.clone())
                } else {
                    Dialog::new(dialog_type, event.message.clone())
                };
                let action = handler.handle(dialog);
                let mut params = HandleJavaScriptDialogParams::new(action.accepts());
                params.prompt_text = action.prompt_text().map(str::to_string);
                if let Err(e) = page.execute(params).await {
                    warn!(error = %e, "failed to answer dialog");
                }
            }
        }));
        Ok(())
    }

    /// Answer HTTP auth challenges with `credentials`, once per request
    async fn answer_auth_challenges(&self, credentials: HttpCredentials) -> PlaycheckResult<()> {
        let mut paused = self
            .page
            .event_listener::<EventRequestPaused>()
            .await
            .map_err(page_error)?;
        let mut challenges = self
            .page
            .event_listener::<EventAuthRequired>()
            .await
            .map_err(page_error)?;

        let page = self.page.clone();
        self.spawn(tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                let _ = page
                    .execute(ContinueRequestParams::new(event.request_id.clone()))
                    .await;
            }
        }));

        let page = self.page.clone();
        self.spawn(tokio::spawn(async move {
            let mut answered = HashSet::new();
            while let Some(event) = challenges.next().await {
                let first_try = answered.insert(event.request_id.as_ref().to_string());
                let response = if first_try {
                    let mut r = AuthChallengeResponse::new(AuthChallengeResponseResponse::ProvideCredentials);
                    r.username = Some(credentials.username.clone());
                    r.password = Some(credentials.password.clone());
                    r
                } else {
                    AuthChallengeResponse::new(AuthChallengeResponseResponse::CancelAuth)
                };
                debug!(first_try, "answering auth challenge");
                let _ = page
                    .execute(ContinueWithAuthParams::new(event.request_id.clone(), response))
                    .await;
            }
        }));

        let mut enable = FetchEnableParams::default();
        enable.handle_auth_requests = Some(true);
        self.page.execute(enable).await.map_err(page_error)?;
        Ok(())
    }

    async fn emulate_geolocation(&self, geolocation: Geolocation) -> PlaycheckResult<()> {
        let mut params = SetGeolocationOverrideParams::default();
        params.latitude = Some(geolocation.latitude);
        params.longitude = Some(geolocation.longitude);
        params.accuracy = Some(geolocation.accuracy);
        self.page.execute(params).await.map_err(page_error)?;
        Ok(())
    }

    async fn status(&self) -> PlaycheckResult<Option<u16>> {
        let value = self.evaluate(STATUS_EXPRESSION).await?;
        Ok(value.as_u64().and_then(|s| u16::try_from(s).ok()).filter(|s| *s != 0))
    }

    fn is_closed(&self) -> bool {
        *lock(&self.closed)
    }
}

impl Drop for ChromiumPage {
    fn drop(&mut self) {
        for task in lock(&self.tasks).drain(..) {
            task.abort();
        }
    }
}

#[async_trait]
impl PageDriver for ChromiumPage {
    fn id(&self) -> String {
        self.id.clone()
    }

    async fn opener_id(&self) -> PlaycheckResult<Option<String>> {
        Ok(self.opener.clone())
    }

    async fn navigate(&self, url: &str, timeout: Duration) -> PlaycheckResult<Option<u16>> {
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Err(_) => {
                return Err(PlaycheckError::Timeout {
                    ms: timeout_ms(timeout),
                    waiting_for: format!("navigation to {url}"),
                })
            }
            Ok(Err(e)) => {
                return Err(PlaycheckError::NavigationError {
                    url: url.to_string(),
                    message: e.to_string(),
                })
            }
            Ok(Ok(_)) => {}
        }
        self.status().await
    }

    async fn reload(&self, timeout: Duration) -> PlaycheckResult<Option<u16>> {
        match tokio::time::timeout(timeout, self.page.reload()).await {
            Err(_) => {
                return Err(PlaycheckError::Timeout {
                    ms: timeout_ms(timeout),
                    waiting_for: "reload".to_string(),
                })
            }
            Ok(Err(e)) => return Err(page_error(e)),
            Ok(Ok(_)) => {}
        }
        self.status().await
    }

    async fn go_back(&self, timeout: Duration) -> PlaycheckResult<bool> {
        let history = self
            .page
            .execute(GetNavigationHistoryParams::default())
            .await
            .map_err(page_error)?;
        let index = history.result.current_index;
        let Some(previous) = usize::try_from(index - 1).ok().and_then(|i| history.result.entries.get(i)) else {
            return Ok(false);
        };
        self.page
            .execute(NavigateToHistoryEntryParams::new(previous.id))
            .await
            .map_err(page_error)?;
        tokio::time::timeout(timeout, self.page.wait_for_navigation())
            .await
            .map_err(|_| PlaycheckError::Timeout {
                ms: timeout_ms(timeout),
                waiting_for: "history navigation".to_string(),
            })?
            .map_err(page_error)?;
        Ok(true)
    }

    async fn evaluate(&self, expression: &str) -> PlaycheckResult<Value> {
        let mut params = EvaluateParams::new(expression);
        params.await_promise = Some(true);
        params.return_by_value = Some(true);
        let reply = self.page.execute(params).await.map_err(page_error)?;
        if let Some(details) = &reply.result.exception_details {
            let message = details
                .exception
                .as_ref()
                .and_then(|e| e.description.clone())
                .unwrap_or_else(|| details.text.clone());
            return Err(PlaycheckError::evaluation(message));
        }
        Ok(reply.result.result.value.clone().unwrap_or(Value::Null))
    }

    async fn dispatch_mouse(&self, event: &MouseEvent) -> PlaycheckResult<()> {
        let kind = match event.kind {
            MouseEventKind::Move => DispatchMouseEventType::MouseMoved,
            MouseEventKind::Down => DispatchMouseEventType::MousePressed,
            MouseEventKind::Up => DispatchMouseEventType::MouseReleased,
            MouseEventKind::Wheel => DispatchMouseEventType::MouseWheel,
        };
        let mut params = DispatchMouseEventParams::new(kind, event.x, event.y);
        params.button = Some(match event.button {
            MouseButton::None => CdpMouseButton::None,
            MouseButton::Left => CdpMouseButton::Left,
            MouseButton::Middle => CdpMouseButton::Middle,
            MouseButton::Right => CdpMouseButton::Right,
        });
        params.buttons = Some(i64::from(event.buttons));
        params.click_count = Some(i64::from(event.click_count));
        params.modifiers = Some(i64::from(event.modifiers));
        if event.kind == MouseEventKind::Wheel {
            params.delta_x = Some(event.delta_x);
            params.delta_y = Some(event.delta_y);
        }
        self.page.execute(params).await.map_err(input_error)?;
        Ok(())
    }

    async fn dispatch_key(&self, event: &KeyEvent) -> PlaycheckResult<()> {
        let kind = match (event.kind, &event.text) {
            (KeyEventKind::Down, Some(_)) => DispatchKeyEventType::KeyDown,
            (KeyEventKind::Down, None) => DispatchKeyEventType::RawKeyDown,
            (KeyEventKind::Up, _) => DispatchKeyEventType::KeyUp,
        };
        let mut params = DispatchKeyEventParams::new(kind);
        params.key = Some(event.key.clone());
        params.code = Some(event.code.clone());
        params.windows_virtual_key_code = Some(i64::from(event.key_code));
        params.native_virtual_key_code = Some(i64::from(event.key_code));
        params.modifiers = Some(i64::from(event.modifiers));
        params.text = event.text.clone();
        params.unmodified_text = event.text.clone();
        params.location = Some(i64::from(event.location));
        params.is_keypad = Some(event.is_keypad());
        self.page.execute(params).await.map_err(input_error)?;
        Ok(())
    }

    async fn insert_text(&self, text: &str) -> PlaycheckResult<()> {
        self.page
            .execute(InsertTextParams::new(text))
            .await
            .map_err(input_error)?;
        Ok(())
    }

    async fn set_input_files(&self, element_expression: &str, files: &[PathBuf]) -> PlaycheckResult<()> {
        let reply = self
            .page
            .execute(EvaluateParams::new(element_expression))
            .await
            .map_err(page_error)?;
        let object_id = reply
            .result
            .result
            .object_id
            .clone()
            .ok_or_else(|| PlaycheckError::input("file input not found"))?;
        let paths: Vec<String> = files.iter().map(|p| p.display().to_string()).collect();
        let mut params = SetFileInputFilesParams::new(paths);
        params.object_id = Some(object_id);
        self.page.execute(params).await.map_err(input_error)?;
        Ok(())
    }

    async fn set_viewport(&self, viewport: Viewport) -> PlaycheckResult<()> {
        let params = SetDeviceMetricsOverrideParams::new(
            i64::from(viewport.width),
            i64::from(viewport.height),
            1.0,
            false,
        );
        self.page.execute(params).await.map_err(page_error)?;
        Ok(())
    }

    fn dialogs(&self) -> &DialogHandler {
        &self.dialogs
    }

    async fn bring_to_front(&self) -> PlaycheckResult<()> {
        self.page
            .execute(BringToFrontParams::default())
            .await
            .map_err(page_error)?;
        Ok(())
    }

    async fn close(&self) -> PlaycheckResult<()> {
        *lock(&self.closed) = true;
        self.page.clone().close().await.map_err(page_error)?;
        Ok(())
    }
}

// ============================================================================
// Browser
// ============================================================================

#[derive(Debug, Default)]
struct ContextState {
    options: ContextOptions,
    downloads_dir: PathBuf,
    pages: Vec<Arc<ChromiumPage>>,
    downloads: Vec<DownloadInfo>,
}

#[derive(Debug, Default)]
struct BrowserState {
    contexts: HashMap<ContextId, ContextState>,
}

impl BrowserState {
    fn owner_of(&self, frame: &str) -> Option<ContextId> {
        let owners: Vec<(ContextId, Vec<String>)> = self
            .contexts
            .iter()
            .map(|(id, ctx)| (id.clone(), ctx.pages.iter().map(|p| p.id.clone()).collect()))
            .collect();
        owner_of(&owners, frame)
    }
}

/// Context owning the page whose main frame is `frame`.
///
/// Top-level frame ids equal their target ids. Downloads from nested frames
/// fall back to the only live context, if there is exactly one.
fn owner_of(owners: &[(ContextId, Vec<String>)], frame: &str) -> Option<ContextId> {
    owners
        .iter()
        .find(|(_, pages)| pages.iter().any(|p| p == frame))
        .or_else(|| match owners {
            [only] => Some(only),
            _ => None,
        })
        .map(|(id, _)| id.clone())
}

/// Chromium launched and driven over CDP
#[derive(Debug)]
pub struct ChromiumBrowser {
    browser: Mutex<CdpBrowser>,
    state: Arc<StdMutex<BrowserState>>,
    viewport: Viewport,
    default_downloads: PathBuf,
    tasks: Vec<JoinHandle<()>>,
}

impl ChromiumBrowser {
    /// Launch Chromium
    ///
    /// # Errors
    ///
    /// Returns error if the browser cannot be found or started
    pub async fn launch(options: &LaunchOptions) -> PlaycheckResult<Self> {
        let mut builder = CdpConfig::builder()
            .window_size(options.viewport.width, options.viewport.height)
            .launch_timeout(Duration::from_millis(options.launch_timeout_ms))
            .request_timeout(Duration::from_millis(options.request_timeout_ms));

        if !options.headless {
            builder = builder.with_head();
        }
        if !options.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = options.chromium_path {
            builder = builder.chrome_executable(path);
        }
        if !options.args.is_empty() {
            builder = builder.args(options.args.clone());
        }

        let config = builder
            .build()
            .map_err(|message| PlaycheckError::BrowserLaunchError { message })?;

        let (browser, mut handler) = CdpBrowser::launch(config).await.map_err(|e| {
            let message = e.to_string();
            if message.contains("Could not auto detect") {
                PlaycheckError::BrowserNotFound
            } else {
                PlaycheckError::BrowserLaunchError { message }
            }
        })?;

        let mut tasks = vec![tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        })];

        let state = Arc::new(StdMutex::new(BrowserState::default()));
        tasks.extend(Self::track_downloads(&browser, Arc::clone(&state)).await?);

        let default_downloads = std::env::temp_dir().join(format!("playcheck-downloads-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&default_downloads).await?;

        info!(headless = options.headless, "browser launched");
        Ok(Self {
            browser: Mutex::new(browser),
            state,
            viewport: options.viewport,
            default_downloads,
            tasks,
        })
    }

    /// Record download events; files are saved as `<dir>/<guid>`
    async fn track_downloads(browser: &CdpBrowser, state: Arc<StdMutex<BrowserState>>) -> PlaycheckResult<Vec<JoinHandle<()>>> {
        let mut begins = browser
            .event_listener::<EventDownloadWillBegin>()
            .await
            .map_err(page_error)?;
        let mut progress = browser
            .event_listener::<EventDownloadProgress>()
            .await
            .map_err(page_error)?;

        let begin_state = Arc::clone(&state);
        let begin_task = tokio::spawn(async move {
            while let Some(event) = begins.next().await {
                let mut guard = lock(&begin_state);
                let frame: &str = event.frame_id.as_ref();
                let Some(owner) = guard.owner_of(frame) else {
                    warn!(file = %event.suggested_filename, frame, "download from unknown context ignored");
                    continue;
                };
                let Some(ctx) = guard.contexts.get_mut(&owner) else {
                    continue;
                };
                debug!(file = %event.suggested_filename, "download started");
                ctx.downloads.push(DownloadInfo {
                    guid: event.guid.clone(),
                    url: event.url.clone(),
                    suggested_filename: event.suggested_filename.clone(),
                    path: None,
                    state: DownloadState::InProgress,
                });
            }
        });

        let progress_task = tokio::spawn(async move {
            while let Some(event) = progress.next().await {
                let new_state = match event.state {
                    DownloadProgressState::InProgress => continue,
                    DownloadProgressState::Completed => DownloadState::Completed,
                    DownloadProgressState::Canceled => DownloadState::Canceled,
                };
                let mut guard = lock(&state);
                for ctx in guard.contexts.values_mut() {
                    let dir = ctx.downloads_dir.clone();
                    if let Some(download) = ctx.downloads.iter_mut().find(|d| d.guid == event.guid) {
                        download.state = new_state;
                        download.path = Some(dir.join(&event.guid)).filter(|path| path.exists());
                        break;
                    }
                }
            }
        });

        Ok(vec![begin_task, progress_task])
    }

    async fn target_context(&self, target: &TargetId) -> PlaycheckResult<(Option<String>, Option<String>)> {
        let mut params = GetTargetInfoParams::default();
        params.target_id = Some(target.clone());
        let reply = self
            .browser
            .lock()
            .await
            .execute(params)
            .await
            .map_err(page_error)?;
        let info = &reply.result.target_info;
        Ok((
            info.browser_context_id.as_ref().map(|id| id.as_ref().to_string()),
            info.opener_id.as_ref().map(|id| id.as_ref().to_string()),
        ))
    }

    fn context_options(&self, context: &str) -> PlaycheckResult<ContextOptions> {
        lock(&self.state)
            .contexts
            .get(context)
            .map(|c| c.options.clone())
            .ok_or_else(|| PlaycheckError::page(format!("no such context: {context}")))
    }
}

impl Drop for ChromiumBrowser {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[async_trait]
impl BrowserDriver for ChromiumBrowser {
    async fn version(&self) -> PlaycheckResult<String> {
        let reply = self
            .browser
            .lock()
            .await
            .execute(GetVersionParams::default())
            .await
            .map_err(page_error)?;
        Ok(reply.result.product.clone())
    }

    async fn new_context(&self, options: &ContextOptions) -> PlaycheckResult<ContextId> {
        let browser = self.browser.lock().await;
        let reply = browser
            .execute(CreateBrowserContextParams::default())
            .await
            .map_err(page_error)?;
        let cdp_id = reply.result.browser_context_id.clone();
        let id = cdp_id.as_ref().to_string();

        let downloads_dir = options
            .downloads_dir
            .clone()
            .unwrap_or_else(|| self.default_downloads.clone());
        tokio::fs::create_dir_all(&downloads_dir).await?;
        let mut downloads = SetDownloadBehaviorParams::new(SetDownloadBehaviorBehavior::AllowAndName);
        downloads.browser_context_id = Some(cdp_id.clone());
        downloads.download_path = Some(downloads_dir.display().to_string());
        downloads.events_enabled = Some(true);
        browser.execute(downloads).await.map_err(page_error)?;

        if !options.permissions.is_empty() {
            let mut grant = GrantPermissionsParams::new(
                options.permissions.iter().map(|p| permission_type(*p)).collect::<Vec<_>>(),
            );
            grant.browser_context_id = Some(cdp_id);
            browser.execute(grant).await.map_err(page_error)?;
        }
        drop(browser);

        debug!(context = %id, "context created");
        lock(&self.state).contexts.insert(
            id.clone(),
            ContextState {
                options: options.clone(),
                downloads_dir,
                pages: Vec::new(),
                downloads: Vec::new(),
            },
        );
        Ok(id)
    }

    async fn new_page(&self, context: &ContextId) -> PlaycheckResult<Arc<dyn PageDriver>> {
        let options = self.context_options(context)?;
        let mut params = CreateTargetParams::new("about:blank");
        params.browser_context_id = Some(BrowserContextId::new(context.clone()));
        let page = self
            .browser
            .lock()
            .await
            .new_page(params)
            .await
            .map_err(page_error)?;
        let page = ChromiumPage::attach(page, None, &options, self.viewport).await?;
        if let Some(ctx) = lock(&self.state).contexts.get_mut(context) {
            ctx.pages.push(Arc::clone(&page));
        }
        Ok(page)
    }

    async fn pages(&self, context: &ContextId) -> PlaycheckResult<Vec<Arc<dyn PageDriver>>> {
        let options = self.context_options(context)?;
        let targets = self.browser.lock().await.pages().await.map_err(page_error)?;
        let known: HashSet<String> = lock(&self.state)
            .contexts
            .values()
            .flat_map(|c| c.pages.iter().map(|p| p.id.clone()))
            .collect();

        for target in targets {
            let id = target.target_id().as_ref().to_string();
            if known.contains(&id) {
                continue;
            }
            let (owner, opener) = self.target_context(target.target_id()).await?;
            if owner.as_deref() != Some(context.as_str()) {
                continue;
            }
            debug!(page = %id, opener = ?opener, "adopting popup");
            let page = ChromiumPage::attach(target, opener, &options, self.viewport).await?;
            if let Some(ctx) = lock(&self.state).contexts.get_mut(context) {
                ctx.pages.push(page);
            }
        }

        let state = lock(&self.state);
        Ok(state
            .contexts
            .get(context)
            .map(|c| {
                c.pages
                    .iter()
                    .filter(|p| !p.is_closed())
                    .map(|p| Arc::clone(p) as Arc<dyn PageDriver>)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn downloads(&self, context: &ContextId) -> PlaycheckResult<Vec<DownloadInfo>> {
        lock(&self.state)
            .contexts
            .get(context)
            .map(|c| c.downloads.clone())
            .ok_or_else(|| PlaycheckError::page(format!("no such context: {context}")))
    }

    async fn grant_permissions(
        &self,
        context: &ContextId,
        permissions: &[Permission],
        origin: Option<&str>,
    ) -> PlaycheckResult<()> {
        let mut params = GrantPermissionsParams::new(
            permissions.iter().map(|p| permission_type(*p)).collect::<Vec<_>>(),
        );
        params.origin = origin.map(str::to_string);
        params.browser_context_id = Some(BrowserContextId::new(context.clone()));
        self.browser
            .lock()
            .await
            .execute(params)
            .await
            .map_err(page_error)?;
        Ok(())
    }

    async fn clear_permissions(&self, context: &ContextId) -> PlaycheckResult<()> {
        let mut params = ResetPermissionsParams::default();
        params.browser_context_id = Some(BrowserContextId::new(context.clone()));
        self.browser
            .lock()
            .await
            .execute(params)
            .await
            .map_err(page_error)?;
        Ok(())
    }

    async fn set_geolocation(&self, context: &ContextId, geolocation: Geolocation) -> PlaycheckResult<()> {
        let pages = {
            let mut state = lock(&self.state);
            let ctx = state
                .contexts
                .get_mut(context)
                .ok_or_else(|| PlaycheckError::page(format!("no such context: {context}")))?;
            ctx.options.geolocation = Some(geolocation);
            ctx.pages.clone()
        };
        for page in pages.iter().filter(|p| !p.is_closed()) {
            page.emulate_geolocation(geolocation).await?;
        }
        Ok(())
    }

    async fn close_context(&self, context: &ContextId) -> PlaycheckResult<()> {
        let removed = lock(&self.state).contexts.remove(context);
        if let Some(ctx) = removed {
            for page in ctx.pages {
                lock(&page.tasks).drain(..).for_each(|t| t.abort());
            }
        }
        self.browser
            .lock()
            .await
            .execute(DisposeBrowserContextParams::new(BrowserContextId::new(context.clone())))
            .await
            .map_err(page_error)?;
        debug!(context = %context, "context disposed");
        Ok(())
    }

    async fn close(&self) -> PlaycheckResult<()> {
        lock(&self.state).contexts.clear();
        let mut browser = self.browser.lock().await;
        browser.close().await.map_err(|e| PlaycheckError::BrowserLaunchError {
            message: e.to_string(),
        })?;
        let _ = browser.wait().await;
        for task in &self.tasks {
            task.abort();
        }
        info!("browser closed");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod download_owner_tests {
        use super::*;

        fn owners() -> Vec<(ContextId, Vec<String>)> {
            vec![
                ("ctx-a".to_string(), vec!["T1".to_string(), "T2".to_string()]),
                ("ctx-b".to_string(), vec!["T3".to_string()]),
            ]
        }

        #[test]
        fn test_main_frame_maps_to_its_context() {
            assert_eq!(owner_of(&owners(), "T2").as_deref(), Some("ctx-a"));
            assert_eq!(owner_of(&owners(), "T3").as_deref(), Some("ctx-b"));
        }

        #[test]
        fn test_unknown_frame_is_ambiguous_across_contexts() {
            assert_eq!(owner_of(&owners(), "F9"), None);
        }

        #[test]
        fn test_unknown_frame_with_single_context() {
            let single = vec![("ctx-a".to_string(), vec!["T1".to_string()])];
            assert_eq!(owner_of(&single, "iframe-7").as_deref(), Some("ctx-a"));
            assert_eq!(owner_of(&[], "T1"), None);
        }
    }
}
