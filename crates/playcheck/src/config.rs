//! Run configuration: browser launch options, timeouts and site URLs.
//!
//! Values come from three layers, later layers winning:
//!
//! 1. Built-in defaults
//! 2. A YAML file (`playcheck.yaml`), every field optional
//! 3. `PLAYCHECK_*` environment variables
//!
//! The CLI applies its own flags on top of the result.

use crate::result::{PlaycheckError, PlaycheckResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Viewport dimensions in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width
    pub width: u32,
    /// Height
    pub height: u32,
}

impl Viewport {
    /// Create a viewport
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

/// Browser launch options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchOptions {
    /// Run without a visible window
    pub headless: bool,
    /// Default page viewport
    pub viewport: Viewport,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<PathBuf>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// Time allowed for the browser process to come up
    pub launch_timeout_ms: u64,
    /// Time allowed for a single protocol request
    pub request_timeout_ms: u64,
    /// Extra command-line switches
    pub args: Vec<String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            viewport: Viewport::default(),
            chromium_path: None,
            sandbox: true,
            launch_timeout_ms: 20_000,
            request_timeout_ms: 30_000,
            args: Vec::new(),
        }
    }
}

impl LaunchOptions {
    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport = Viewport::new(width, height);
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    /// Append a command-line switch
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

/// Timeouts used by actions, assertions and navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Retrying assertions (`expect`)
    pub expect_ms: u64,
    /// Actionability waits before clicks, fills and key presses
    pub action_ms: u64,
    /// Page loads
    pub navigation_ms: u64,
    /// Delay between polls
    pub poll_interval_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            expect_ms: 5_000,
            action_ms: 10_000,
            navigation_ms: 30_000,
            poll_interval_ms: 100,
        }
    }
}

impl Timeouts {
    /// Expect timeout as a duration
    #[must_use]
    pub const fn expect(&self) -> Duration {
        Duration::from_millis(self.expect_ms)
    }

    /// Action timeout as a duration
    #[must_use]
    pub const fn action(&self) -> Duration {
        Duration::from_millis(self.action_ms)
    }

    /// Navigation timeout as a duration
    #[must_use]
    pub const fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }

    /// Poll interval as a duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Base URLs of the sites under test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteUrls {
    /// SauceDemo storefront
    pub saucedemo: String,
    /// The Internet playground
    pub the_internet: String,
    /// TodoMVC demo
    pub todomvc: String,
}

impl Default for SiteUrls {
    fn default() -> Self {
        Self {
            saucedemo: crate::sites::saucedemo::BASE_URL.to_string(),
            the_internet: crate::sites::the_internet::BASE_URL.to_string(),
            todomvc: crate::sites::todomvc::BASE_URL.to_string(),
        }
    }
}

/// Complete configuration for a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Browser launch options
    pub launch: LaunchOptions,
    /// Action, assertion and navigation timeouts
    pub timeouts: Timeouts,
    /// Site base URLs
    pub sites: SiteUrls,
    /// Extra attempts for a failing scenario
    pub retries: u32,
    /// Wall-clock limit for one scenario attempt
    pub test_timeout_ms: u64,
    /// Stop after the first failing scenario
    pub fail_fast: bool,
    /// Where downloads, screenshots and reports go
    pub artifacts_dir: PathBuf,
    /// Attribute used by `get_by_test_id`
    pub test_id_attribute: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            launch: LaunchOptions::default(),
            timeouts: Timeouts::default(),
            sites: SiteUrls::default(),
            retries: 0,
            test_timeout_ms: 60_000,
            fail_fast: false,
            artifacts_dir: PathBuf::from("target/playcheck"),
            test_id_attribute: "data-test".to_string(),
        }
    }
}

impl RunConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not valid YAML
    pub fn load(path: &Path) -> PlaycheckResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text).map_err(|e| match e {
            PlaycheckError::InvalidConfig { message } => {
                PlaycheckError::config(format!("{}: {message}", path.display()))
            }
            other => other,
        })
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns error if the text is not valid YAML for this schema
    pub fn from_yaml(text: &str) -> PlaycheckResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self =
            serde_yaml_ng::from_str(text).map_err(|e| PlaycheckError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `PLAYCHECK_*` overrides from the process environment
    ///
    /// # Errors
    ///
    /// Returns error if a variable holds an unparsable value
    pub fn apply_env(self) -> PlaycheckResult<Self> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Returns error if a variable holds an unparsable value
    pub fn apply_env_from<F>(mut self, lookup: F) -> PlaycheckResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("PLAYCHECK_HEADLESS") {
            self.launch.headless = parse_bool("PLAYCHECK_HEADLESS", &value)?;
        }
        if let Some(value) = lookup("PLAYCHECK_NO_SANDBOX") {
            self.launch.sandbox = !parse_bool("PLAYCHECK_NO_SANDBOX", &value)?;
        }
        if let Some(path) = lookup("PLAYCHECK_CHROMIUM_PATH").or_else(|| lookup("CHROMIUM_PATH"))
        {
            self.launch.chromium_path = Some(PathBuf::from(path));
        }
        if let Some(value) = lookup("PLAYCHECK_EXPECT_TIMEOUT_MS") {
            self.timeouts.expect_ms = parse_number("PLAYCHECK_EXPECT_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = lookup("PLAYCHECK_RETRIES") {
            self.retries = parse_number("PLAYCHECK_RETRIES", &value)?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check invariants that serde cannot express
    ///
    /// # Errors
    ///
    /// Returns error if a timeout is zero or a URL is empty
    pub fn validate(&self) -> PlaycheckResult<()> {
        if self.timeouts.poll_interval_ms == 0 {
            return Err(PlaycheckError::config("poll_interval_ms must be positive"));
        }
        if self.timeouts.expect_ms == 0 || self.timeouts.action_ms == 0 {
            return Err(PlaycheckError::config("timeouts must be positive"));
        }
        if self.test_timeout_ms == 0 {
            return Err(PlaycheckError::config("test_timeout_ms must be positive"));
        }
        for (name, url) in [
            ("saucedemo", &self.sites.saucedemo),
            ("the_internet", &self.sites.the_internet),
            ("todomvc", &self.sites.todomvc),
        ] {
            if url.trim().is_empty() {
                return Err(PlaycheckError::config(format!("site url `{name}` is empty")));
            }
        }
        Ok(())
    }

    /// Set retries
    #[must_use]
    pub const fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Set fail fast
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Set the per-scenario timeout
    #[must_use]
    pub const fn with_test_timeout_ms(mut self, ms: u64) -> Self {
        self.test_timeout_ms = ms;
        self
    }

    /// Set the expect timeout
    #[must_use]
    pub const fn with_expect_timeout_ms(mut self, ms: u64) -> Self {
        self.timeouts.expect_ms = ms;
        self
    }

    /// Set the launch options
    #[must_use]
    pub fn with_launch(mut self, launch: LaunchOptions) -> Self {
        self.launch = launch;
        self
    }

    /// Set the artifacts directory
    #[must_use]
    pub fn with_artifacts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts_dir = dir.into();
        self
    }

    /// Per-scenario timeout as a duration
    #[must_use]
    pub const fn test_timeout(&self) -> Duration {
        Duration::from_millis(self.test_timeout_ms)
    }
}

fn parse_bool(name: &str, value: &str) -> PlaycheckResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(PlaycheckError::config(format!(
            "{name}: expected a boolean, got `{other}`"
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> PlaycheckResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| PlaycheckError::config(format!("{name}: expected a number, got `{value}`")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    mod defaults_tests {
        use super::*;

        #[test]
        fn test_default_timeouts() {
            let t = Timeouts::default();
            assert_eq!(t.expect(), Duration::from_secs(5));
            assert_eq!(t.action(), Duration::from_secs(10));
            assert_eq!(t.navigation(), Duration::from_secs(30));
            assert_eq!(t.poll_interval(), Duration::from_millis(100));
        }

        #[test]
        fn test_default_launch_is_headless_and_sandboxed() {
            let l = LaunchOptions::default();
            assert!(l.headless);
            assert!(l.sandbox);
            assert_eq!(l.viewport, Viewport::new(1280, 720));
        }

        #[test]
        fn test_default_sites() {
            let s = SiteUrls::default();
            assert_eq!(s.saucedemo, "https://www.saucedemo.com/");
            assert_eq!(s.the_internet, "https://the-internet.herokuapp.com");
            assert!(s.todomvc.contains("todomvc"));
        }

        #[test]
        fn test_builders() {
            let c = RunConfig::new()
                .with_retries(2)
                .with_fail_fast(true)
                .with_expect_timeout_ms(250)
                .with_launch(LaunchOptions::default().with_headless(false).with_no_sandbox());
            assert_eq!(c.retries, 2);
            assert!(c.fail_fast);
            assert_eq!(c.timeouts.expect_ms, 250);
            assert!(!c.launch.headless);
            assert!(!c.launch.sandbox);
        }
    }

    mod yaml_tests {
        use super::*;

        #[test]
        fn test_empty_yaml_is_default() {
            assert_eq!(RunConfig::from_yaml("  \n").unwrap(), RunConfig::default());
        }

        #[test]
        fn test_partial_yaml() {
            let yaml = "retries: 3\ntimeouts:\n  expect_ms: 1500\nlaunch:\n  headless: false\n";
            let c = RunConfig::from_yaml(yaml).unwrap();
            assert_eq!(c.retries, 3);
            assert_eq!(c.timeouts.expect_ms, 1500);
            assert_eq!(c.timeouts.action_ms, 10_000);
            assert!(!c.launch.headless);
        }

        #[test]
        fn test_invalid_yaml() {
            let err = RunConfig::from_yaml("retries: many").unwrap_err();
            assert!(matches!(err, PlaycheckError::InvalidConfig { .. }));
        }

        #[test]
        fn test_zero_poll_interval_rejected() {
            let err = RunConfig::from_yaml("timeouts:\n  poll_interval_ms: 0\n").unwrap_err();
            assert!(err.to_string().contains("poll_interval_ms"));
        }

        #[test]
        fn test_load_from_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("playcheck.yaml");
            std::fs::write(&path, "sites:\n  todomvc: http://localhost:8080/\n").unwrap();
            let c = RunConfig::load(&path).unwrap();
            assert_eq!(c.sites.todomvc, "http://localhost:8080/");
            assert_eq!(c.sites.saucedemo, "https://www.saucedemo.com/");
        }

        #[test]
        fn test_load_error_names_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("bad.yaml");
            std::fs::write(&path, "sites:\n  todomvc: ''\n").unwrap();
            let err = RunConfig::load(&path).unwrap_err();
            assert!(err.to_string().contains("bad.yaml"));
        }

        #[test]
        fn test_load_missing_file() {
            let err = RunConfig::load(Path::new("/nonexistent/playcheck.yaml")).unwrap_err();
            assert!(matches!(err, PlaycheckError::Io(_)));
        }
    }

    mod env_tests {
        use super::*;

        fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
            let map: HashMap<String, String> = vars
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect();
            move |k| map.get(k).cloned()
        }

        #[test]
        fn test_env_overrides() {
            let c = RunConfig::default()
                .apply_env_from(lookup(&[
                    ("PLAYCHECK_HEADLESS", "false"),
                    ("PLAYCHECK_NO_SANDBOX", "1"),
                    ("PLAYCHECK_EXPECT_TIMEOUT_MS", "900"),
                    ("PLAYCHECK_RETRIES", "2"),
                ]))
                .unwrap();
            assert!(!c.launch.headless);
            assert!(!c.launch.sandbox);
            assert_eq!(c.timeouts.expect_ms, 900);
            assert_eq!(c.retries, 2);
        }

        #[test]
        fn test_chromium_path_fallback() {
            let c = RunConfig::default()
                .apply_env_from(lookup(&[("CHROMIUM_PATH", "/usr/bin/chromium")]))
                .unwrap();
            assert_eq!(
                c.launch.chromium_path,
                Some(PathBuf::from("/usr/bin/chromium"))
            );

            let c = RunConfig::default()
                .apply_env_from(lookup(&[
                    ("CHROMIUM_PATH", "/usr/bin/chromium"),
                    ("PLAYCHECK_CHROMIUM_PATH", "/opt/chrome"),
                ]))
                .unwrap();
            assert_eq!(c.launch.chromium_path, Some(PathBuf::from("/opt/chrome")));
        }

        #[test]
        fn test_env_bad_values() {
            let err = RunConfig::default()
                .apply_env_from(lookup(&[("PLAYCHECK_HEADLESS", "maybe")]))
                .unwrap_err();
            assert!(err.to_string().contains("PLAYCHECK_HEADLESS"));

            let err = RunConfig::default()
                .apply_env_from(lookup(&[("PLAYCHECK_RETRIES", "-1")]))
                .unwrap_err();
            assert!(err.to_string().contains("PLAYCHECK_RETRIES"));
        }

        #[test]
        fn test_no_env_is_identity() {
            let c = RunConfig::default().apply_env_from(|_| None).unwrap();
            assert_eq!(c, RunConfig::default());
        }
    }
}
