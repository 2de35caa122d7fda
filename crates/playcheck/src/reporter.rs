//! Run reports: per-scenario results, summaries, JUnit XML and JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;

use crate::result::PlaycheckResult;

/// Outcome of one scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    /// Passed on the first attempt
    Passed,
    /// Failed on every attempt
    Failed,
    /// Failed at least once, then passed on a retry
    Flaky,
    /// Not run (fail-fast stopped the run)
    Skipped,
    /// The last attempt hit the per-test timeout
    TimedOut,
}

impl TestStatus {
    /// Check if status is passing, flaky passes included
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed | Self::Flaky)
    }

    /// Check if status is failing
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed | Self::TimedOut)
    }

    /// Short label for terminal output
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Passed => "PASS",
            Self::Failed => "FAIL",
            Self::Flaky => "FLAKY",
            Self::Skipped => "SKIP",
            Self::TimedOut => "TIMEOUT",
        }
    }
}

/// Individual scenario result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResultEntry {
    /// Suite id, e.g. `saucedemo::login`
    pub suite: String,
    /// Scenario name
    pub name: String,
    /// Final status
    pub status: TestStatus,
    /// Duration of all attempts together
    pub duration: Duration,
    /// Attempts made
    pub attempts: u32,
    /// Error of the last failing attempt
    pub error: Option<String>,
}

impl TestResultEntry {
    /// Create a passing result
    #[must_use]
    pub fn passed(suite: impl Into<String>, name: impl Into<String>, duration: Duration) -> Self {
        Self {
            suite: suite.into(),
            name: name.into(),
            status: TestStatus::Passed,
            duration,
            attempts: 1,
            error: None,
        }
    }

    /// Create a failing result
    #[must_use]
    pub fn failed(
        suite: impl Into<String>,
        name: impl Into<String>,
        duration: Duration,
        error: impl Into<String>,
    ) -> Self {
        Self {
            suite: suite.into(),
            name: name.into(),
            status: TestStatus::Failed,
            duration,
            attempts: 1,
            error: Some(error.into()),
        }
    }

    /// Create a skipped result
    #[must_use]
    pub fn skipped(suite: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            suite: suite.into(),
            name: name.into(),
            status: TestStatus::Skipped,
            duration: Duration::ZERO,
            attempts: 0,
            error: None,
        }
    }

    /// Override the status
    #[must_use]
    pub const fn with_status(mut self, status: TestStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the attempt count
    #[must_use]
    pub const fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// `suite > name`
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} > {}", self.suite, self.name)
    }
}

/// Results of a whole run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique id of this run
    pub run_id: Uuid,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Results in execution order
    pub results: Vec<TestResultEntry>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReport {
    /// Start an empty report
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            results: Vec::new(),
        }
    }

    /// Record a result
    pub fn record(&mut self, result: TestResultEntry) {
        self.results.push(result);
    }

    fn count(&self, status: TestStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    /// Scenarios that passed first time
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.count(TestStatus::Passed)
    }

    /// Scenarios that failed or timed out
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| r.status.is_failed()).count()
    }

    /// Scenarios that passed on a retry
    #[must_use]
    pub fn flaky_count(&self) -> usize {
        self.count(TestStatus::Flaky)
    }

    /// Scenarios not run
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.count(TestStatus::Skipped)
    }

    /// Get total result count
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.results.len()
    }

    /// Whether nothing failed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed_count() == 0
    }

    /// Sum of scenario durations
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.results.iter().map(|r| r.duration).sum()
    }

    /// Failing results
    #[must_use]
    pub fn failures(&self) -> Vec<&TestResultEntry> {
        self.results.iter().filter(|r| r.status.is_failed()).collect()
    }

    /// Generate summary string
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} passed, {} failed, {} flaky, {} skipped ({} total) in {:.2}s",
            self.passed_count(),
            self.failed_count(),
            self.flaky_count(),
            self.skipped_count(),
            self.total_count(),
            self.total_duration().as_secs_f64()
        )
    }

    /// Suite ids in first-seen order
    fn suites(&self) -> Vec<&str> {
        let mut suites: Vec<&str> = Vec::new();
        for r in &self.results {
            if !suites.contains(&r.suite.as_str()) {
                suites.push(&r.suite);
            }
        }
        suites
    }

    /// Render JUnit XML content, one `<testsuite>` per suite
    #[must_use]
    pub fn render_junit(&self) -> String {
        let mut xml = String::new();

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(&format!(
            r#"<testsuites name="playcheck" tests="{}" failures="{}" skipped="{}" time="{:.3}">"#,
            self.total_count(),
            self.failed_count(),
            self.skipped_count(),
            self.total_duration().as_secs_f64()
        ));
        xml.push('\n');

        for suite in self.suites() {
            let results: Vec<&TestResultEntry> =
                self.results.iter().filter(|r| r.suite == suite).collect();
            let failures = results.iter().filter(|r| r.status.is_failed()).count();
            let skipped = results
                .iter()
                .filter(|r| r.status == TestStatus::Skipped)
                .count();
            let time: Duration = results.iter().map(|r| r.duration).sum();
            xml.push_str(&format!(
                r#"  <testsuite name="{}" tests="{}" failures="{}" skipped="{}" time="{:.3}">"#,
                escape_xml(suite),
                results.len(),
                failures,
                skipped,
                time.as_secs_f64()
            ));
            xml.push('\n');

            for result in results {
                xml.push_str(&format!(
                    r#"    <testcase classname="{}" name="{}" time="{:.3}">"#,
                    escape_xml(&result.suite),
                    escape_xml(&result.name),
                    result.duration.as_secs_f64()
                ));
                xml.push('\n');

                match result.status {
                    TestStatus::Failed | TestStatus::TimedOut => {
                        let error = result.error.as_deref().unwrap_or("failed");
                        xml.push_str(&format!(
                            r#"      <failure message="{}" type="{}">{}</failure>"#,
                            escape_xml(error),
                            result.status.label(),
                            escape_xml(error)
                        ));
                        xml.push('\n');
                    }
                    TestStatus::Skipped => xml.push_str("      <skipped/>\n"),
                    TestStatus::Flaky => {
                        xml.push_str(&format!(
                            "      <system-out>passed after {} attempts</system-out>\n",
                            result.attempts
                        ));
                    }
                    TestStatus::Passed => {}
                }

                xml.push_str("    </testcase>\n");
            }
            xml.push_str("  </testsuite>\n");
        }

        xml.push_str("</testsuites>\n");
        xml
    }

    /// Generate JUnit XML for CI integration
    ///
    /// # Errors
    ///
    /// Returns error if file writing fails
    pub fn write_junit(&self, output_path: &Path) -> PlaycheckResult<()> {
        std::fs::write(output_path, self.render_junit())?;
        Ok(())
    }

    /// Render the report as pretty JSON
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn render_json(&self) -> PlaycheckResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as JSON
    ///
    /// # Errors
    ///
    /// Returns error if serialization or file writing fails
    pub fn write_json(&self, output_path: &Path) -> PlaycheckResult<()> {
        std::fs::write(output_path, self.render_json()?)?;
        Ok(())
    }
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn sample_report() -> RunReport {
        let mut report = RunReport::new();
        report.record(TestResultEntry::passed("saucedemo::login", "standard user", Duration::from_millis(100)));
        report.record(TestResultEntry::failed(
            "saucedemo::login",
            "locked out <user>",
            Duration::from_millis(50),
            "expected \"x\"",
        ));
        report.record(
            TestResultEntry::passed("todomvc", "add", Duration::from_millis(30))
                .with_status(TestStatus::Flaky)
                .with_attempts(2),
        );
        report.record(TestResultEntry::skipped("todomvc", "edit"));
        report
    }

    mod test_status_tests {
        use super::*;

        #[test]
        fn test_status_is_passed() {
            assert!(TestStatus::Passed.is_passed());
            assert!(TestStatus::Flaky.is_passed());
            assert!(!TestStatus::Failed.is_passed());
            assert!(!TestStatus::Skipped.is_passed());
        }

        #[test]
        fn test_status_is_failed() {
            assert!(TestStatus::Failed.is_failed());
            assert!(TestStatus::TimedOut.is_failed());
            assert!(!TestStatus::Flaky.is_failed());
            assert!(!TestStatus::Skipped.is_failed());
        }

        #[test]
        fn test_status_serializes_snake_case() {
            assert_eq!(serde_json::to_string(&TestStatus::TimedOut).unwrap(), "\"timed_out\"");
        }
    }

    mod run_report_tests {
        use super::*;

        #[test]
        fn test_counts() {
            let report = sample_report();
            assert_eq!(report.total_count(), 4);
            assert_eq!(report.passed_count(), 1);
            assert_eq!(report.failed_count(), 1);
            assert_eq!(report.flaky_count(), 1);
            assert_eq!(report.skipped_count(), 1);
            assert!(!report.all_passed());
            assert_eq!(report.total_duration(), Duration::from_millis(180));
        }

        #[test]
        fn test_failures() {
            let report = sample_report();
            let failures = report.failures();
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].full_name(), "saucedemo::login > locked out <user>");
        }

        #[test]
        fn test_summary() {
            let summary = sample_report().summary();
            assert!(summary.contains("1 passed"));
            assert!(summary.contains("1 failed"));
            assert!(summary.contains("1 flaky"));
            assert!(summary.contains("4 total"));
        }

        #[test]
        fn test_empty_report_passes() {
            let report = RunReport::default();
            assert!(report.all_passed());
            assert_eq!(report.total_count(), 0);
        }

        #[test]
        fn test_render_junit_groups_by_suite() {
            let xml = sample_report().render_junit();
            assert!(xml.contains(r#"<testsuites name="playcheck" tests="4" failures="1" skipped="1""#));
            assert!(xml.contains(r#"<testsuite name="saucedemo::login" tests="2" failures="1""#));
            assert!(xml.contains(r#"<testsuite name="todomvc" tests="2" failures="0" skipped="1""#));
            assert!(xml.contains("locked out &lt;user&gt;"));
            assert!(xml.contains("expected &quot;x&quot;"));
            assert!(xml.contains("<skipped/>"));
            assert!(xml.contains("passed after 2 attempts"));
        }

        #[test]
        fn test_json_round_trip() {
            let report = sample_report();
            let json = report.render_json().unwrap();
            let back: RunReport = serde_json::from_str(&json).unwrap();
            assert_eq!(back, report);
        }

        #[test]
        fn test_write_files() {
            let dir = tempfile::tempdir().unwrap();
            let report = sample_report();
            let junit = dir.path().join("junit.xml");
            let json = dir.path().join("report.json");
            report.write_junit(&junit).unwrap();
            report.write_json(&json).unwrap();
            assert!(std::fs::read_to_string(junit).unwrap().starts_with("<?xml"));
            assert!(std::fs::read_to_string(json).unwrap().contains("run_id"));
        }
    }

    mod escape_xml_tests {
        use super::*;

        #[test]
        fn test_escape_special_chars() {
            assert_eq!(escape_xml("a & b"), "a &amp; b");
            assert_eq!(escape_xml("<tag>"), "&lt;tag&gt;");
            assert_eq!(escape_xml("\"quoted\""), "&quot;quoted&quot;");
            assert_eq!(escape_xml("it's"), "it&apos;s");
        }

        #[test]
        fn test_no_escape_needed() {
            assert_eq!(escape_xml("plain text"), "plain text");
        }
    }
}
