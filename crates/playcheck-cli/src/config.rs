//! CLI configuration
//!
//! Run settings are layered: defaults, then the YAML file given with
//! `--config`, then `PLAYCHECK_*` variables, then command-line flags.

use playcheck::RunConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CliError, CliResult};

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - failures and the summary only
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - extra output
    Verbose,
    /// Debug - maximum output
    Debug,
}

impl Verbosity {
    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// Default `tracing` filter for this level, used when `RUST_LOG` is unset
    #[must_use]
    pub const fn log_filter(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "info",
            Self::Debug => "debug",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => std::io::IsTerminal::is_terminal(&std::io::stderr()),
        }
    }
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
    /// Log line format
    pub log_format: LogFormat,
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    /// Set log format
    #[must_use]
    pub const fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }
}

/// Command-line overrides applied on top of file and environment settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOverrides {
    /// Show the browser window
    pub headed: bool,
    /// Chromium executable
    pub chromium_path: Option<PathBuf>,
    /// Disable the Chromium sandbox
    pub no_sandbox: bool,
    /// Extra attempts per failing scenario
    pub retries: Option<u32>,
    /// Stop at the first failure
    pub fail_fast: bool,
    /// Per-attempt limit
    pub test_timeout_ms: Option<u64>,
    /// Assertion polling limit
    pub expect_timeout_ms: Option<u64>,
    /// Artifacts directory
    pub artifacts_dir: Option<PathBuf>,
}

/// Build the effective run configuration
///
/// # Errors
///
/// Returns error if the file cannot be loaded, an environment variable is
/// malformed or the result fails validation
pub fn resolve_run_config(file: Option<&Path>, overrides: &RunOverrides) -> CliResult<RunConfig> {
    resolve_run_config_with(file, overrides, |name| std::env::var(name).ok())
}

/// [`resolve_run_config`] with an explicit environment lookup
///
/// # Errors
///
/// Same as [`resolve_run_config`]
pub fn resolve_run_config_with<F>(
    file: Option<&Path>,
    overrides: &RunOverrides,
    lookup: F,
) -> CliResult<RunConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let base = match file {
        Some(path) => RunConfig::load(path).map_err(|e| CliError::config(e.to_string()))?,
        None => RunConfig::default(),
    };
    let mut config = base
        .apply_env_from(lookup)
        .map_err(|e| CliError::config(e.to_string()))?;

    if overrides.headed {
        config.launch.headless = false;
    }
    if let Some(path) = &overrides.chromium_path {
        config.launch.chromium_path = Some(path.clone());
    }
    if overrides.no_sandbox {
        config.launch.sandbox = false;
    }
    if let Some(retries) = overrides.retries {
        config.retries = retries;
    }
    if overrides.fail_fast {
        config.fail_fast = true;
    }
    if let Some(ms) = overrides.test_timeout_ms {
        config.test_timeout_ms = ms;
    }
    if let Some(ms) = overrides.expect_timeout_ms {
        config.timeouts.expect_ms = ms;
    }
    if let Some(dir) = &overrides.artifacts_dir {
        config.artifacts_dir = dir.clone();
    }

    config.validate().map_err(|e| CliError::config(e.to_string()))?;
    Ok(config)
}
