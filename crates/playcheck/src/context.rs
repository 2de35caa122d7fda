//! Isolated browser contexts.
//!
//! Each scenario runs in its own context, so cookies, storage, permissions
//! and HTTP credentials never leak between tests.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::config::Viewport;
use crate::driver::{BrowserDriver, ContextId};
use crate::page::{Page, PageSettings};
use crate::result::PlaycheckResult;

/// Credentials answered to HTTP basic and digest challenges
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpCredentials {
    /// User name
    pub username: String,
    /// Password
    pub password: String,
}

impl HttpCredentials {
    /// Create credentials
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Browser permission that can be granted to a context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Permission {
    /// `navigator.geolocation`
    Geolocation,
    /// `Notification.requestPermission`
    Notifications,
    /// Clipboard reads
    ClipboardRead,
    /// Clipboard writes
    ClipboardWrite,
}

/// Emulated position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geolocation {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Accuracy in meters
    pub accuracy: f64,
}

impl Geolocation {
    /// Position with zero accuracy radius
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: 0.0,
        }
    }
}

/// Options applied when a context is created
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextOptions {
    /// HTTP authentication credentials
    pub http_credentials: Option<HttpCredentials>,
    /// Permissions granted up front
    pub permissions: Vec<Permission>,
    /// Emulated geolocation
    pub geolocation: Option<Geolocation>,
    /// Viewport for new pages; falls back to the launch viewport
    pub viewport: Option<Viewport>,
    /// Directory receiving downloads; a temporary one is used when unset
    pub downloads_dir: Option<PathBuf>,
}

impl ContextOptions {
    /// Default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set HTTP credentials
    #[must_use]
    pub fn with_http_credentials(mut self, username: &str, password: &str) -> Self {
        self.http_credentials = Some(HttpCredentials::new(username, password));
        self
    }

    /// Grant a permission
    #[must_use]
    pub fn with_permission(mut self, permission: Permission) -> Self {
        if !self.permissions.contains(&permission) {
            self.permissions.push(permission);
        }
        self
    }

    /// Emulate a position
    #[must_use]
    pub const fn with_geolocation(mut self, geolocation: Geolocation) -> Self {
        self.geolocation = Some(geolocation);
        self
    }

    /// Set the viewport for new pages
    #[must_use]
    pub const fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = Some(viewport);
        self
    }

    /// Save downloads into `dir`
    #[must_use]
    pub fn with_downloads_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.downloads_dir = Some(dir.into());
        self
    }
}

/// Handle to an isolated browser context
#[derive(Clone)]
pub struct BrowserContext {
    id: ContextId,
    driver: Arc<dyn BrowserDriver>,
    settings: Arc<PageSettings>,
}

impl BrowserContext {
    pub(crate) fn new(id: ContextId, driver: Arc<dyn BrowserDriver>, settings: Arc<PageSettings>) -> Self {
        Self {
            id,
            driver,
            settings,
        }
    }

    /// Driver-assigned identifier
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Open a new page in this context
    pub async fn new_page(&self) -> PlaycheckResult<Page> {
        let driver = self.driver.new_page(&self.id).await?;
        debug!(context = %self.id, page = %driver.id(), "page opened");
        Ok(Page::new(driver, Arc::clone(&self.driver), self.id.clone(), Arc::clone(&self.settings)))
    }

    /// All open pages, including popups
    pub async fn pages(&self) -> PlaycheckResult<Vec<Page>> {
        let pages = self.driver.pages(&self.id).await?;
        Ok(pages
            .into_iter()
            .map(|p| Page::new(p, Arc::clone(&self.driver), self.id.clone(), Arc::clone(&self.settings)))
            .collect())
    }

    /// Grant permissions, optionally only for one origin
    pub async fn grant_permissions(
        &self,
        permissions: &[Permission],
        origin: Option<&str>,
    ) -> PlaycheckResult<()> {
        self.driver.grant_permissions(&self.id, permissions, origin).await
    }

    /// Revoke every granted permission
    pub async fn clear_permissions(&self) -> PlaycheckResult<()> {
        self.driver.clear_permissions(&self.id).await
    }

    /// Emulate a position for all pages of this context
    pub async fn set_geolocation(&self, geolocation: Geolocation) -> PlaycheckResult<()> {
        self.driver.set_geolocation(&self.id, geolocation).await
    }

    /// Close the context and all its pages
    pub async fn close(&self) -> PlaycheckResult<()> {
        debug!(context = %self.id, "context closing");
        self.driver.close_context(&self.id).await
    }
}

impl std::fmt::Debug for BrowserContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserContext")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::MockBrowser;

    mod options_tests {
        use super::*;

        #[test]
        fn test_builder() {
            let opts = ContextOptions::new()
                .with_http_credentials("admin", "admin")
                .with_permission(Permission::Geolocation)
                .with_permission(Permission::Geolocation)
                .with_geolocation(Geolocation::new(51.507351, -0.127758))
                .with_viewport(Viewport::new(375, 667));
            assert_eq!(opts.http_credentials.unwrap().username, "admin");
            assert_eq!(opts.permissions, vec![Permission::Geolocation]);
            assert_eq!(opts.viewport.unwrap().width, 375);
        }

        #[test]
        fn test_permission_serde_names() {
            let json = serde_json::to_string(&Permission::ClipboardRead).unwrap();
            assert_eq!(json, "\"clipboard-read\"");
        }
    }

    mod context_tests {
        use super::*;

        #[tokio::test]
        async fn test_context_pages_and_permissions() {
            let browser = Arc::new(MockBrowser::new());
            let settings = Arc::new(PageSettings::default());
            let id = browser.new_context(&ContextOptions::new()).await.unwrap();
            let ctx = BrowserContext::new(id, browser.clone(), settings);

            let page = ctx.new_page().await.unwrap();
            assert_eq!(ctx.pages().await.unwrap().len(), 1);
            assert!(!page.id().is_empty());

            ctx.grant_permissions(&[Permission::Geolocation], None)
                .await
                .unwrap();
            ctx.set_geolocation(Geolocation::new(1.0, 2.0)).await.unwrap();
            ctx.clear_permissions().await.unwrap();
            ctx.close().await.unwrap();

            assert!(browser.was_called("grant_permissions"));
            assert!(browser.was_called("set_geolocation"));
            assert!(browser.was_called("clear_permissions"));
            assert!(browser.was_called("close_context"));
        }
    }
}
