//! Playcheck: Rust-native end-to-end suites for public demo sites
//!
//! Playcheck drives Chromium over the Chrome DevTools Protocol and runs
//! behavioural suites against three demo applications: SauceDemo, The
//! Internet and TodoMVC.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   PLAYCHECK Architecture                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Scenarios  │    │ Locators + │    │ Driver     │            │
//! │   │ (per site) │───►│ expect()   │───►│ (CDP/mock) │──► Chromium│
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! │         │                                                        │
//! │         ▼                                                        │
//! │   ┌────────────┐    ┌────────────┐                              │
//! │   │ Runner     │───►│ RunReport  │──► JUnit XML / JSON          │
//! │   └────────────┘    └────────────┘                              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Without the `browser` feature every layer above the driver still runs
//! against [`MockBrowser`], which is how the unit tests exercise it.

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod assertion;
mod browser;
/// Chromium driver over CDP
#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc, clippy::doc_markdown)]
pub mod cdp;
mod config;
mod context;
mod dialog;
mod download;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate, clippy::doc_markdown)]
mod driver;
mod expect;
mod harness;
mod keyboard;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate, clippy::missing_const_for_fn)]
mod locator;
mod matcher;
mod page;
mod reporter;
mod result;
mod sampling;
mod selector;

/// Waiting and polling primitives
pub mod wait;

/// Page objects and constants for the target sites
pub mod sites;

/// The end-to-end suites
pub mod scenarios;

pub use assertion::{Assertion, AssertionResult};
pub use browser::Browser;
pub use config::{LaunchOptions, RunConfig, SiteUrls, Timeouts, Viewport};
pub use context::{BrowserContext, ContextOptions, Geolocation, HttpCredentials, Permission};
pub use dialog::{AutoDialogBehavior, Dialog, DialogAction, DialogHandler, DialogHandlerFn, DialogType};
pub use download::{Download, DownloadInfo, DownloadState};
pub use driver::{
    value_to_string, BrowserDriver, ContextId, MockBrowser, MockPage, MouseButton, MouseEvent,
    MouseEventKind, PageDriver,
};
pub use expect::{expect, expect_page, LocatorAssertions, PageAssertions};
pub use harness::{
    Catalog, Runner, Scenario, ScenarioFilter, ScenarioFuture, Selected, Suite, TestContext,
};
pub use keyboard::{lookup_key, Key, KeyChord, KeyDefinition, KeyEvent, KeyEventKind, Modifier};
pub use locator::{BoundingBox, ElementState, FrameLocator, Locator, Point, SelectOption};
pub use matcher::{normalize_whitespace, Pattern, TextMatcher, UrlMatcher};
pub use page::{ClickOptions, Keyboard, Mouse, Page, PageSettings, Response};
pub use reporter::{RunReport, TestResultEntry, TestStatus};
pub use result::{PlaycheckError, PlaycheckResult};
pub use sampling::{SampleGoal, SampleReport, VariantSampler};
pub use selector::{Chain, Filter, RoleOptions, Selector, Step, DEFAULT_TEST_ID_ATTRIBUTE};
pub use sites::Site;
pub use wait::{LoadState, Observation, WaitOptions};

/// Prelude for writing scenarios
pub mod prelude {
    pub use super::assertion::*;
    pub use super::browser::*;
    pub use super::config::*;
    pub use super::context::*;
    pub use super::dialog::*;
    pub use super::expect::*;
    pub use super::harness::*;
    pub use super::locator::*;
    pub use super::matcher::*;
    pub use super::page::*;
    pub use super::reporter::*;
    pub use super::result::*;
    pub use super::sampling::*;
    pub use super::selector::RoleOptions;
    pub use super::sites::Site;
    pub use super::wait::{LoadState, WaitOptions};
}
