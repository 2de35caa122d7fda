//! Listing and running scenarios from the catalogue

use playcheck::{Browser, Catalog, RunConfig, RunReport, Runner, ScenarioFilter, Selected};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::commands::{ListArgs, ListFormat, ReportFormat, RunArgs, SelectArgs};
use crate::config::{resolve_run_config, CliConfig};
use crate::error::{CliError, CliResult};
use crate::output::{render_listing_text, ProgressReporter, SuiteListing};

/// Translate selection flags into a scenario filter
#[must_use]
pub fn scenario_filter(select: &SelectArgs) -> ScenarioFilter {
    let mut filter = ScenarioFilter::new();
    if let Some(pattern) = &select.filter {
        filter = filter.with_pattern(pattern.clone());
    }
    for tag in &select.tags {
        filter = filter.with_tag(tag.clone());
    }
    filter
}

/// Group a selection by suite, keeping catalogue order
#[must_use]
pub fn listing(selection: &[Selected<'_>]) -> Vec<SuiteListing> {
    let mut listing: Vec<SuiteListing> = Vec::new();
    for selected in selection {
        match listing.last_mut() {
            Some(last) if last.id == selected.suite.id() => {
                last.scenarios.push(selected.scenario.name().to_string());
            }
            _ => listing.push(SuiteListing::new(
                selected.suite,
                vec![selected.scenario.name().to_string()],
            )),
        }
    }
    listing
}

/// Render the `list` output
///
/// # Errors
///
/// Returns error if JSON rendering fails
pub fn render_list(catalog: &Catalog, args: &ListArgs) -> CliResult<String> {
    let selection = catalog.select(&scenario_filter(&args.select));
    let listing = listing(&selection);
    match args.format {
        ListFormat::Text => Ok(render_listing_text(&listing)),
        ListFormat::Json => {
            let mut json = serde_json::to_string_pretty(&listing)
                .map_err(|e| CliError::report_generation(e.to_string()))?;
            json.push('\n');
            Ok(json)
        }
    }
}

/// Write the requested report files into `dir`
///
/// # Errors
///
/// Returns error if the directory or a file cannot be written
pub fn write_reports(report: &RunReport, dir: &Path, formats: &[ReportFormat]) -> CliResult<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(formats.len());
    for format in formats {
        let path = dir.join(format.file_name());
        match format {
            ReportFormat::Junit => report.write_junit(&path),
            ReportFormat::Json => report.write_json(&path),
        }
        .map_err(|e| CliError::report_generation(format!("{}: {e}", path.display())))?;
        written.push(path);
    }
    Ok(written)
}

/// Runs a selection in a freshly launched browser
#[derive(Debug)]
pub struct SuiteRunner {
    config: CliConfig,
    reporter: ProgressReporter,
}

impl SuiteRunner {
    /// Create a runner with the given output settings
    #[must_use]
    pub fn new(config: CliConfig) -> Self {
        let reporter = ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
        Self { config, reporter }
    }

    /// Resolve configuration, launch Chromium and run the selected scenarios
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid, nothing is selected, the
    /// browser cannot start or reports cannot be written. Failing scenarios
    /// are not an error here; they are in the returned report.
    pub async fn run(&mut self, catalog: &Catalog, args: &RunArgs) -> CliResult<RunReport> {
        let run_config = resolve_run_config(args.config.as_deref(), &args.overrides())?;
        let selection = catalog.select(&scenario_filter(&args.select));
        if selection.is_empty() {
            return Err(CliError::invalid_argument("no scenarios match the given filter"));
        }

        tokio::fs::create_dir_all(&run_config.artifacts_dir).await?;
        if self.config.verbosity.is_verbose() {
            self.reporter.info(&format!(
                "headless={} retries={} artifacts={}",
                run_config.launch.headless,
                run_config.retries,
                run_config.artifacts_dir.display()
            ));
        }

        let report = self.execute(run_config.clone(), &selection).await?;
        let written = write_reports(&report, &run_config.artifacts_dir, &args.reports)?;
        for path in written {
            self.reporter.info(&format!("report written to {}", path.display()));
        }
        Ok(report)
    }

    async fn execute(&mut self, run_config: RunConfig, selection: &[Selected<'_>]) -> CliResult<RunReport> {
        let browser = Browser::launch(&run_config).await?;
        info!(version = %browser.version().await.unwrap_or_default(), "browser ready");

        self.reporter.header("Running scenarios");
        self.reporter.start_progress(selection.len() as u64, "starting");
        let runner = Runner::new(browser.clone(), run_config);
        let reporter = &self.reporter;
        let report = runner
            .run_with(selection, |entry| {
                reporter.scenario_finished(entry);
                reporter.set_message(&entry.full_name());
            })
            .await;
        self.reporter.finish();
        self.reporter.summary(&report);

        browser.close().await?;
        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use playcheck::TestResultEntry;
    use std::time::Duration;

    fn select(filter: Option<&str>, tags: &[&str]) -> SelectArgs {
        SelectArgs {
            filter: filter.map(str::to_string),
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
        }
    }

    mod filter_tests {
        use super::*;

        #[test]
        fn test_empty_selection_flags_select_everything() {
            let catalog = playcheck::scenarios::catalog();
            let selected = catalog.select(&scenario_filter(&SelectArgs::default()));
            assert_eq!(selected.len(), catalog.scenario_count());
        }

        #[test]
        fn test_site_tag_and_pattern() {
            let catalog = playcheck::scenarios::catalog();
            let selected = catalog.select(&scenario_filter(&select(Some("locked"), &["saucedemo"])));
            assert!(!selected.is_empty());
            assert!(selected.iter().all(|s| s.suite.id().starts_with("saucedemo::")));
        }
    }

    mod listing_tests {
        use super::*;

        #[test]
        fn test_listing_groups_by_suite() {
            let catalog = playcheck::scenarios::catalog();
            let selected = catalog.select(&scenario_filter(&select(None, &["todomvc"])));
            let listing = listing(&selected);
            assert_eq!(listing.len(), 1);
            assert_eq!(listing[0].id, "todomvc::app");
            assert_eq!(listing[0].scenarios.len(), selected.len());
        }

        #[test]
        fn test_render_json_parses() {
            let catalog = playcheck::scenarios::catalog();
            let args = ListArgs {
                select: select(None, &["todomvc"]),
                format: ListFormat::Json,
            };
            let json = render_list(&catalog, &args).unwrap();
            let value: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(value[0]["id"], "todomvc::app");
        }

        #[test]
        fn test_render_text_for_no_match() {
            let catalog = playcheck::scenarios::catalog();
            let args = ListArgs {
                select: select(Some("no such scenario anywhere"), &[]),
                format: ListFormat::Text,
            };
            assert_eq!(render_list(&catalog, &args).unwrap(), "0 scenarios in 0 suites\n");
        }
    }

    mod report_tests {
        use super::*;

        #[test]
        fn test_write_both_formats() {
            let dir = tempfile::tempdir().unwrap();
            let mut report = RunReport::new();
            report.record(TestResultEntry::passed("todomvc::app", "should add a new todo", Duration::from_millis(10)));
            let written = write_reports(&report, dir.path(), &[ReportFormat::Junit, ReportFormat::Json]).unwrap();
            assert_eq!(written.len(), 2);
            let xml = std::fs::read_to_string(dir.path().join("junit.xml")).unwrap();
            assert!(xml.contains("should add a new todo"));
            assert!(dir.path().join("report.json").exists());
        }
    }
}
