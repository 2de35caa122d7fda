//! Output formatting and progress reporting

use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use playcheck::{RunReport, Suite, TestResultEntry, TestStatus};
use serde::Serialize;

/// Progress reporter for a run
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    fn line(&self, text: &str) {
        match &self.progress_bar {
            Some(pb) => pb.println(text),
            None => {
                let _ = self.term.write_line(text);
            }
        }
    }

    fn prefixed(&self, symbol: &str, plain: &str, paint: fn(&str) -> String, message: &str) {
        let prefix = if self.use_color {
            paint(symbol)
        } else {
            plain.to_string()
        };
        self.line(&format!("{prefix} {message}"));
    }

    /// Start a progress bar over `total` scenarios
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Update progress message
    pub fn set_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(message.to_string());
        }
    }

    /// Finish progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }

    /// Report one finished scenario and advance the bar
    pub fn scenario_finished(&self, entry: &TestResultEntry) {
        let name = entry.full_name();
        match entry.status {
            TestStatus::Passed => self.success(&format!("{name} ({} ms)", entry.duration.as_millis())),
            TestStatus::Flaky => self.warning(&format!("{name} passed after {} attempts", entry.attempts)),
            TestStatus::Skipped => self.info(&format!("{name} skipped")),
            TestStatus::Failed | TestStatus::TimedOut => self.failure(&format!(
                "{name}: {}",
                entry.error.as_deref().unwrap_or("unknown error")
            )),
        }
        if let Some(ref pb) = self.progress_bar {
            pb.inc(1);
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.prefixed("✓", "PASS", |s| style(s).green().bold().to_string(), message);
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Failures print even in quiet mode
        self.prefixed("✗", "FAIL", |s| style(s).red().bold().to_string(), message);
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.prefixed("⚠", "WARN", |s| style(s).yellow().bold().to_string(), message);
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.prefixed("ℹ", "INFO", |s| style(s).blue().bold().to_string(), message);
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };

        self.line("");
        self.line(&styled);
    }

    /// Print the run summary
    pub fn summary(&self, report: &RunReport) {
        let failed = report.failed_count();
        if self.quiet && failed == 0 {
            return;
        }

        let _ = self.term.write_line("");
        let duration_secs = report.total_duration().as_secs_f64();
        let counts = format!(
            "{} passed, {} failed, {} flaky, {} skipped",
            report.passed_count(),
            failed,
            report.flaky_count(),
            report.skipped_count()
        );

        let line = if self.use_color {
            let status = if failed > 0 {
                Style::new().red().bold().apply_to("FAILED")
            } else {
                Style::new().green().bold().apply_to("PASSED")
            };
            format!("{status} {} scenarios in {duration_secs:.2}s ({counts})", report.total_count())
        } else {
            let status = if failed > 0 { "FAILED" } else { "PASSED" };
            format!("{status} {} scenarios in {duration_secs:.2}s ({counts})", report.total_count())
        };
        let _ = self.term.write_line(&line);
    }
}

/// One suite in `list --format json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuiteListing {
    /// Suite id
    pub id: String,
    /// Suite title
    pub title: String,
    /// Suite tags
    pub tags: Vec<String>,
    /// Selected scenario names
    pub scenarios: Vec<String>,
}

impl SuiteListing {
    /// Listing of `suite` restricted to `names`
    #[must_use]
    pub fn new(suite: &Suite, names: Vec<String>) -> Self {
        Self {
            id: suite.id().to_string(),
            title: suite.title().to_string(),
            tags: suite.tags().to_vec(),
            scenarios: names,
        }
    }
}

/// Render a listing as indented text
#[must_use]
pub fn render_listing_text(listing: &[SuiteListing]) -> String {
    let mut out = String::new();
    let mut total = 0;
    for suite in listing {
        out.push_str(&format!("{} ({})\n", suite.id, suite.title));
        for name in &suite.scenarios {
            out.push_str(&format!("  {name}\n"));
        }
        total += suite.scenarios.len();
    }
    out.push_str(&format!("{total} scenarios in {} suites\n", listing.len()));
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    mod progress_reporter_tests {
        use super::*;

        #[test]
        fn test_new_reporter() {
            let reporter = ProgressReporter::new(true, false);
            assert!(reporter.use_color);
            assert!(!reporter.quiet);
        }

        #[test]
        fn test_every_status_reports() {
            let mut reporter = ProgressReporter::new(false, false);
            reporter.start_progress(4, "running");
            reporter.scenario_finished(&TestResultEntry::passed("s", "a", Duration::from_millis(5)));
            reporter.scenario_finished(
                &TestResultEntry::passed("s", "b", Duration::ZERO)
                    .with_status(TestStatus::Flaky)
                    .with_attempts(2),
            );
            reporter.scenario_finished(&TestResultEntry::failed("s", "c", Duration::ZERO, "boom"));
            reporter.scenario_finished(&TestResultEntry::skipped("s", "d"));
            reporter.finish();
        }

        #[test]
        fn test_summary() {
            let reporter = ProgressReporter::new(false, false);
            let mut report = RunReport::new();
            report.record(TestResultEntry::passed("s", "a", Duration::from_secs(1)));
            reporter.summary(&report);
        }

        #[test]
        fn test_quiet_mode_suppresses_output() {
            let mut reporter = ProgressReporter::new(false, true);
            reporter.start_progress(1, "running");
            assert!(reporter.progress_bar.is_none());
            reporter.success("hidden");
            reporter.header("hidden");
            reporter.failure("shown");
        }
    }

    mod listing_tests {
        use super::*;

        #[test]
        fn test_text_listing_counts() {
            let listing = vec![SuiteListing {
                id: "todomvc::app".to_string(),
                title: "TodoMVC Application".to_string(),
                tags: vec!["todomvc".to_string()],
                scenarios: vec!["should add a new todo".to_string(), "should delete a todo".to_string()],
            }];
            let text = render_listing_text(&listing);
            assert!(text.starts_with("todomvc::app (TodoMVC Application)\n"));
            assert!(text.contains("  should add a new todo\n"));
            assert!(text.ends_with("2 scenarios in 1 suites\n"));
        }
    }
}
