//! Playcheck CLI Library
//!
//! Command-line interface for listing and running the Playcheck suites.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::format_push_string)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod logging;
mod output;
mod runner;

pub use commands::{
    Cli, ColorArg, Commands, ConfigArgs, ListArgs, ListFormat, LogFormatArg, ReportFormat, RunArgs,
    SelectArgs,
};
pub use config::{
    resolve_run_config, resolve_run_config_with, CliConfig, ColorChoice, LogFormat, RunOverrides,
    Verbosity,
};
pub use error::{CliError, CliResult};
pub use output::{render_listing_text, ProgressReporter, SuiteListing};
pub use runner::{listing, render_list, scenario_filter, write_reports, SuiteRunner};
