//! The Internet playground: credentials, page URLs and page-specific helpers.

use crate::harness::TestContext;
use crate::locator::Locator;
use crate::page::{Page, Response};
use crate::result::{PlaycheckError, PlaycheckResult};
use crate::selector::RoleOptions;
use crate::sites::{join_url, Site};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default playground URL
pub const BASE_URL: &str = "https://the-internet.herokuapp.com";

/// Status codes offered by `/status_codes`
pub const STATUS_CODES: [u16; 4] = [200, 301, 404, 500];

/// Messages cycled by `/notification_message` (the typo is the site's)
pub const NOTIFICATION_MESSAGES: [&str; 2] = ["Action successful", "Action unsuccesful, please try again"];

/// Absolute URL of `path` on the default playground
#[must_use]
pub fn page_url(path: &str) -> String {
    join_url(BASE_URL, path)
}

/// Path of the page returning `code`
#[must_use]
pub fn status_code_path(code: u16) -> String {
    format!("status_codes/{code}")
}

/// Username/password pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credentials {
    /// Username
    pub username: &'static str,
    /// Password
    pub password: &'static str,
}

impl Credentials {
    /// Account accepted by the form login at `/login`
    pub const FORM: Self = Self {
        username: "tomsmith",
        password: "SuperSecretPassword!",
    };

    /// Account accepted by basic and digest auth
    pub const HTTP: Self = Self {
        username: "admin",
        password: "admin",
    };
}

/// Kind of flash banner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    /// Green banner
    Success,
    /// Red banner
    Error,
}

impl FlashKind {
    fn selector(self) -> &'static str {
        match self {
            Self::Success => ".flash.success",
            Self::Error => ".flash.error",
        }
    }
}

/// A/B test variant shown by `/abtest`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbVariant {
    /// "A/B Test Control"
    Control,
    /// "A/B Test Variation 1" or "A/B Test Variation"
    Variation,
}

impl AbVariant {
    /// Classify page text; `None` when neither heading is present
    #[must_use]
    pub fn classify(text: &str) -> Option<Self> {
        if text.contains("A/B Test Control") {
            Some(Self::Control)
        } else if text.contains("A/B Test Variation") {
            Some(Self::Variation)
        } else {
            None
        }
    }

    /// Label used in sample reports
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Control => "control",
            Self::Variation => "variation",
        }
    }
}

/// Strip the close glyph and whitespace from a notification banner
#[must_use]
pub fn notification_text(raw: &str) -> String {
    raw.replace('×', "").trim().to_string()
}

/// Whether `raw` is one of the notification messages the site cycles through
#[must_use]
pub fn is_known_notification(raw: &str) -> bool {
    NOTIFICATION_MESSAGES.contains(&notification_text(raw).as_str())
}

/// Text `/key_presses` shows after pressing `chord`, e.g. `"You entered: ENTER"`.
///
/// Modifier chords report the final key. Numpad keys report the character
/// they produce.
///
/// # Errors
///
/// Returns `InputError` for an empty chord or a key the page has no name for
pub fn key_press_result(chord: &str) -> PlaycheckResult<String> {
    let key = chord
        .rsplit('+')
        .next()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| PlaycheckError::input(format!("empty key chord: {chord:?}")))?;
    let name = match key {
        "Enter" => "ENTER".to_string(),
        "Escape" => "ESCAPE".to_string(),
        "Backspace" => "BACK_SPACE".to_string(),
        "Tab" => "TAB".to_string(),
        "Space" | " " => "SPACE".to_string(),
        "Delete" => "DELETE".to_string(),
        "Home" => "HOME".to_string(),
        "End" => "END".to_string(),
        "PageUp" => "PAGE_UP".to_string(),
        "PageDown" => "PAGE_DOWN".to_string(),
        "Shift" => "SHIFT".to_string(),
        "Control" => "CONTROL".to_string(),
        "Alt" => "ALT".to_string(),
        "NumpadAdd" => "+".to_string(),
        "NumpadSubtract" => "-".to_string(),
        "NumpadMultiply" => "*".to_string(),
        "NumpadDivide" => "/".to_string(),
        "NumpadDecimal" => ".".to_string(),
        k if k.starts_with("Arrow") => k.trim_start_matches("Arrow").to_uppercase(),
        k if k.starts_with("Numpad") && k.len() == 7 => k[6..].to_string(),
        k if k.len() > 1 && k.starts_with('F') && k[1..].parse::<u8>().is_ok_and(|n| (1..=12).contains(&n)) => {
            k.to_string()
        }
        k if k.chars().count() == 1 => k.to_uppercase(),
        other => return Err(PlaycheckError::input(format!("no key press result for {other:?}"))),
    };
    Ok(format!("You entered: {name}"))
}

/// Page object for the playground
#[derive(Debug, Clone)]
pub struct TheInternet {
    page: Page,
    base_url: String,
}

impl TheInternet {
    /// Wrap `page`, with the playground at `base_url`
    #[must_use]
    pub fn new(page: Page, base_url: impl Into<String>) -> Self {
        Self {
            page,
            base_url: base_url.into(),
        }
    }

    /// Page object for a scenario's page and configured URL
    #[must_use]
    pub fn for_test(t: &TestContext) -> Self {
        Self::new(t.page().clone(), t.site_url(Site::TheInternet, ""))
    }

    /// Underlying page
    #[must_use]
    pub const fn page(&self) -> &Page {
        &self.page
    }

    /// Absolute URL of `path` on the configured playground
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// Navigate to `path`
    pub async fn open(&self, path: &str) -> PlaycheckResult<Response> {
        self.page.goto(&self.url(path)).await
    }

    /// Username field of the form login
    #[must_use]
    pub fn username(&self) -> Locator {
        self.page.get_by_role("textbox", RoleOptions::default().name("Username"))
    }

    /// Password field of the form login
    #[must_use]
    pub fn password(&self) -> Locator {
        self.page.get_by_role("textbox", RoleOptions::default().name("Password"))
    }

    /// Submit button of the form login
    #[must_use]
    pub fn login_button(&self) -> Locator {
        self.page.get_by_role("button", RoleOptions::default().name("Login"))
    }

    /// Fill and submit the form login on the current page
    pub async fn login_form(&self, username: &str, password: &str) -> PlaycheckResult<()> {
        debug!(username, "submitting login form");
        self.username().fill(username).await?;
        self.password().fill(password).await?;
        self.login_button().click().await
    }

    /// Open `/login` and sign in with the form account
    pub async fn login(&self) -> PlaycheckResult<()> {
        self.open("login").await?;
        self.login_form(Credentials::FORM.username, Credentials::FORM.password)
            .await
    }

    /// Flash banner of any kind
    #[must_use]
    pub fn flash(&self) -> Locator {
        self.page.locator("#flash")
    }

    /// Flash banner of one kind
    #[must_use]
    pub fn flash_of(&self, kind: FlashKind) -> Locator {
        self.page.locator(kind.selector())
    }

    /// Current notification message, or `None` when no banner is shown
    pub async fn notification(&self) -> PlaycheckResult<Option<String>> {
        let flash = self.flash();
        if flash.count().await? == 0 {
            return Ok(None);
        }
        Ok(Some(notification_text(&flash.text_content().await?)))
    }

    /// Read the A/B variant from the page content
    pub async fn ab_variant(&self) -> PlaycheckResult<Option<AbVariant>> {
        Ok(AbVariant::classify(&self.page.content().await?))
    }
}
