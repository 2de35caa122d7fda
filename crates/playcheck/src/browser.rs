//! Browser handle: launch, contexts and shutdown.

use std::sync::Arc;
use tracing::{debug, info};

use crate::config::{RunConfig, Viewport};
use crate::context::{BrowserContext, ContextOptions};
use crate::driver::BrowserDriver;
use crate::page::{Page, PageSettings};
use crate::result::PlaycheckResult;

/// A running browser
#[derive(Clone)]
pub struct Browser {
    driver: Arc<dyn BrowserDriver>,
    settings: Arc<PageSettings>,
    default_viewport: Viewport,
}

impl std::fmt::Debug for Browser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Browser")
            .field("settings", &self.settings)
            .field("default_viewport", &self.default_viewport)
            .finish()
    }
}

impl Browser {
    /// Wrap an existing driver, taking timeouts and test-id attribute from `config`
    #[must_use]
    pub fn with_driver(driver: Arc<dyn BrowserDriver>, config: &RunConfig) -> Self {
        Self {
            driver,
            settings: Arc::new(PageSettings {
                timeouts: config.timeouts,
                test_id_attribute: config.test_id_attribute.clone(),
            }),
            default_viewport: config.launch.viewport,
        }
    }

    /// Launch Chromium over CDP
    ///
    /// # Errors
    ///
    /// Returns error if the browser cannot be launched
    #[cfg(feature = "browser")]
    pub async fn launch(config: &RunConfig) -> PlaycheckResult<Self> {
        let driver = crate::cdp::ChromiumBrowser::launch(&config.launch).await?;
        Ok(Self::with_driver(Arc::new(driver), config))
    }

    /// Launch Chromium over CDP
    ///
    /// # Errors
    ///
    /// Always fails: the crate was built without the `browser` feature
    #[cfg(not(feature = "browser"))]
    pub async fn launch(_config: &RunConfig) -> PlaycheckResult<Self> {
        Err(crate::result::PlaycheckError::BrowserLaunchError {
            message: "playcheck was built without the `browser` feature".to_string(),
        })
    }

    /// Product name and version reported by the browser
    pub async fn version(&self) -> PlaycheckResult<String> {
        self.driver.version().await
    }

    /// Settings every page inherits
    #[must_use]
    pub fn settings(&self) -> &PageSettings {
        &self.settings
    }

    /// Create an isolated context
    pub async fn new_context(&self, mut options: ContextOptions) -> PlaycheckResult<BrowserContext> {
        if options.viewport.is_none() {
            options.viewport = Some(self.default_viewport);
        }
        let id = self.driver.new_context(&options).await?;
        debug!(context = %id, credentials = options.http_credentials.is_some(), "context created");
        Ok(BrowserContext::new(id, Arc::clone(&self.driver), Arc::clone(&self.settings)))
    }

    /// Open a page in a fresh default context
    pub async fn new_page(&self) -> PlaycheckResult<Page> {
        self.new_context(ContextOptions::default()).await?.new_page().await
    }

    /// Shut the browser down
    pub async fn close(&self) -> PlaycheckResult<()> {
        self.driver.close().await?;
        info!("browser closed");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::MockBrowser;

    fn browser(mock: &Arc<MockBrowser>) -> Browser {
        Browser::with_driver(Arc::clone(mock) as Arc<dyn BrowserDriver>, &RunConfig::default())
    }

    mod browser_tests {
        use super::*;

        #[tokio::test]
        async fn test_new_context_fills_default_viewport() {
            let mock = Arc::new(MockBrowser::new());
            let b = browser(&mock);
            let context = b.new_context(ContextOptions::default()).await.unwrap();
            let options = mock.context_options(context.id()).unwrap();
            assert_eq!(options.viewport, Some(Viewport::default()));
        }

        #[tokio::test]
        async fn test_new_context_keeps_explicit_viewport() {
            let mock = Arc::new(MockBrowser::new());
            let b = browser(&mock);
            let options = ContextOptions::new().with_viewport(Viewport::new(375, 667));
            let context = b.new_context(options).await.unwrap();
            assert_eq!(
                mock.context_options(context.id()).unwrap().viewport,
                Some(Viewport::new(375, 667))
            );
        }

        #[tokio::test]
        async fn test_new_page_opens_context() {
            let mock = Arc::new(MockBrowser::new());
            let b = browser(&mock);
            let page = b.new_page().await.unwrap();
            assert_eq!(mock.context_count(), 1);
            assert_eq!(page.url().await.unwrap(), "about:blank");
        }

        #[tokio::test]
        async fn test_settings_follow_config() {
            let mock = Arc::new(MockBrowser::new());
            let mut config = RunConfig::default();
            config.test_id_attribute = "data-testid".to_string();
            let b = Browser::with_driver(mock as Arc<dyn BrowserDriver>, &config);
            assert_eq!(b.settings().test_id_attribute, "data-testid");
        }

        #[tokio::test]
        async fn test_close() {
            let mock = Arc::new(MockBrowser::new());
            let b = browser(&mock);
            b.close().await.unwrap();
            assert!(mock.is_closed());
        }

        #[cfg(not(feature = "browser"))]
        #[tokio::test]
        async fn test_launch_without_feature_fails() {
            let err = Browser::launch(&RunConfig::default()).await.unwrap_err();
            assert!(err.to_string().contains("browser"));
        }
    }
}
