//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::{ColorChoice, LogFormat, RunOverrides};

/// Playcheck: end-to-end browser suites for SauceDemo, The Internet and TodoMVC
#[derive(Parser, Debug)]
#[command(name = "playcheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Log line format
    #[arg(long, default_value = "text", global = true, env = "PLAYCHECK_LOG_FORMAT")]
    pub log_format: LogFormatArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List suites and scenarios
    List(ListArgs),

    /// Run scenarios in a browser
    Run(RunArgs),

    /// Show the effective run configuration
    Config(ConfigArgs),
}

/// Scenario selection shared by `list` and `run`
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SelectArgs {
    /// Case-insensitive substring of "suite-id scenario name"
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Only scenarios with this tag (repeatable; a site id is a tag)
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Scenario selection
    #[command(flatten)]
    pub select: SelectArgs,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: ListFormat,
}

/// Listing output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListFormat {
    /// One line per scenario, grouped by suite
    #[default]
    Text,
    /// JSON array of suites
    Json,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunArgs {
    /// Scenario selection
    #[command(flatten)]
    pub select: SelectArgs,

    /// YAML run configuration
    #[arg(short, long, env = "PLAYCHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Chromium executable
    #[arg(long, env = "PLAYCHECK_CHROMIUM_PATH")]
    pub chromium_path: Option<PathBuf>,

    /// Disable the Chromium sandbox (containers)
    #[arg(long)]
    pub no_sandbox: bool,

    /// Extra attempts for a failing scenario
    #[arg(short, long)]
    pub retries: Option<u32>,

    /// Stop at the first failing scenario
    #[arg(long)]
    pub fail_fast: bool,

    /// Per-attempt timeout in milliseconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Assertion timeout in milliseconds
    #[arg(long)]
    pub expect_timeout: Option<u64>,

    /// Output directory for reports and downloads
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Report formats to write into the output directory
    #[arg(long = "report", value_delimiter = ',')]
    pub reports: Vec<ReportFormat>,
}

impl RunArgs {
    /// Overrides the flags put on top of file and environment settings
    #[must_use]
    pub fn overrides(&self) -> RunOverrides {
        RunOverrides {
            headed: self.headed,
            chromium_path: self.chromium_path.clone(),
            no_sandbox: self.no_sandbox,
            retries: self.retries,
            fail_fast: self.fail_fast,
            test_timeout_ms: self.timeout,
            expect_timeout_ms: self.expect_timeout,
            artifacts_dir: self.output.clone(),
        }
    }
}

/// Report file format
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportFormat {
    /// `JUnit` XML (`junit.xml`)
    Junit,
    /// JSON (`report.json`)
    Json,
}

impl ReportFormat {
    /// File name inside the output directory
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Junit => "junit.xml",
            Self::Json => "report.json",
        }
    }
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// YAML run configuration
    #[arg(short, long, env = "PLAYCHECK_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Color argument
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

/// Log format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormatArg {
    /// Human-readable lines
    #[default]
    Text,
    /// JSON lines
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => Self::Text,
            LogFormatArg::Json => Self::Json,
        }
    }
}
