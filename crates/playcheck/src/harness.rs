//! Scenario harness: suites, catalogue, filtering and the runner.
//!
//! Every scenario attempt gets a fresh browser context and page, so cookies,
//! storage and dialogs never leak from one scenario into the next.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::browser::Browser;
use crate::config::RunConfig;
use crate::context::{BrowserContext, ContextOptions};
use crate::page::{Page, Response};
use crate::reporter::{RunReport, TestResultEntry, TestStatus};
use crate::result::PlaycheckResult;
use crate::sites::Site;

/// Boxed scenario future
pub type ScenarioFuture = Pin<Box<dyn Future<Output = PlaycheckResult<()>> + Send>>;

type StepFn = Arc<dyn Fn(TestContext) -> ScenarioFuture + Send + Sync>;

fn boxed<F, Fut>(f: F) -> StepFn
where
    F: Fn(TestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = PlaycheckResult<()>> + Send + 'static,
{
    Arc::new(move |t| Box::pin(f(t)))
}

// ============================================================================
// Fixture
// ============================================================================

/// Per-scenario fixture: a fresh context and page plus the run configuration
#[derive(Debug, Clone)]
pub struct TestContext {
    browser: Browser,
    context: BrowserContext,
    page: Page,
    config: Arc<RunConfig>,
}

impl TestContext {
    /// Build a fixture from existing handles
    #[must_use]
    pub fn new(browser: Browser, context: BrowserContext, page: Page, config: Arc<RunConfig>) -> Self {
        Self {
            browser,
            context,
            page,
            config,
        }
    }

    /// The scenario's page
    #[must_use]
    pub const fn page(&self) -> &Page {
        &self.page
    }

    /// The scenario's isolated context
    #[must_use]
    pub const fn context(&self) -> &BrowserContext {
        &self.context
    }

    /// The shared browser, for scenarios that need a second context
    #[must_use]
    pub const fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Run configuration
    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Absolute URL of `path` on `site`, honouring configured mirrors
    #[must_use]
    pub fn site_url(&self, site: Site, path: &str) -> String {
        site.url(&self.config.sites, path)
    }

    /// Navigate the page to `path` on `site`
    pub async fn goto(&self, site: Site, path: &str) -> PlaycheckResult<Response> {
        self.page.goto(&self.site_url(site, path)).await
    }
}

// ============================================================================
// Scenarios and suites
// ============================================================================

/// A named, tagged async test body
#[derive(Clone)]
pub struct Scenario {
    name: String,
    tags: Vec<String>,
    body: StepFn,
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .finish()
    }
}

impl Scenario {
    /// Create a scenario from an async function taking the fixture
    pub fn new<F, Fut>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(TestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PlaycheckResult<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            tags: Vec::new(),
            body: boxed(body),
        }
    }

    /// Add a tag
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Scenario name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scenario tags
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

/// A group of scenarios sharing hooks and context options
#[derive(Clone)]
pub struct Suite {
    id: String,
    title: String,
    tags: Vec<String>,
    context_options: ContextOptions,
    before_each: Option<StepFn>,
    after_each: Option<StepFn>,
    scenarios: Vec<Scenario>,
}

impl std::fmt::Debug for Suite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Suite")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("tags", &self.tags)
            .field("scenarios", &self.scenarios.len())
            .finish()
    }
}

impl Suite {
    /// Create an empty suite
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            tags: Vec::new(),
            context_options: ContextOptions::default(),
            before_each: None,
            after_each: None,
            scenarios: Vec::new(),
        }
    }

    /// Run `hook` before every scenario
    #[must_use]
    pub fn before_each<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(TestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PlaycheckResult<()>> + Send + 'static,
    {
        self.before_each = Some(boxed(hook));
        self
    }

    /// Run `hook` after every scenario that passed
    #[must_use]
    pub fn after_each<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(TestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PlaycheckResult<()>> + Send + 'static,
    {
        self.after_each = Some(boxed(hook));
        self
    }

    /// Navigate to `path` on `site` before every scenario
    #[must_use]
    pub fn start_at(self, site: Site, path: &'static str) -> Self {
        self.before_each(move |t| async move { t.goto(site, path).await.map(|_| ()) })
    }

    /// Options for the context each scenario gets
    #[must_use]
    pub fn with_context_options(mut self, options: ContextOptions) -> Self {
        self.context_options = options;
        self
    }

    /// Tag every scenario of the suite
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Add a scenario
    #[must_use]
    pub fn scenario<F, Fut>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(TestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PlaycheckResult<()>> + Send + 'static,
    {
        self.scenarios.push(Scenario::new(name, body));
        self
    }

    /// Add a prepared scenario
    #[must_use]
    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }

    /// Suite id such as `saucedemo::login`
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable title
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Suite tags
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Scenarios in declaration order
    #[must_use]
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Context options used for each scenario
    #[must_use]
    pub const fn context_options(&self) -> &ContextOptions {
        &self.context_options
    }
}

// ============================================================================
// Catalogue and filtering
// ============================================================================

/// Which scenarios to run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioFilter {
    /// Case-insensitive substring of `suite id + " " + scenario name`
    pub pattern: Option<String>,
    /// Run only scenarios carrying one of these tags (suite tags count)
    pub tags: Vec<String>,
}

impl ScenarioFilter {
    /// Filter that selects everything
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a substring match
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Require a tag
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Whether `scenario` of `suite` is selected
    #[must_use]
    pub fn matches(&self, suite: &Suite, scenario: &Scenario) -> bool {
        let pattern_ok = self.pattern.as_ref().map_or(true, |p| {
            format!("{} {}", suite.id(), scenario.name())
                .to_lowercase()
                .contains(&p.to_lowercase())
        });
        let tags_ok = self.tags.is_empty()
            || self.tags.iter().any(|t| {
                scenario.tags().contains(t) || suite.tags().contains(t)
            });
        pattern_ok && tags_ok
    }
}

/// A selected scenario together with its suite
#[derive(Debug, Clone, Copy)]
pub struct Selected<'a> {
    /// Owning suite
    pub suite: &'a Suite,
    /// Scenario to run
    pub scenario: &'a Scenario,
}

/// All known suites
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    suites: Vec<Suite>,
}

impl Catalog {
    /// Create an empty catalogue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a suite
    #[must_use]
    pub fn with_suite(mut self, suite: Suite) -> Self {
        self.suites.push(suite);
        self
    }

    /// Add several suites
    #[must_use]
    pub fn with_suites(mut self, suites: impl IntoIterator<Item = Suite>) -> Self {
        self.suites.extend(suites);
        self
    }

    /// Suites in registration order
    #[must_use]
    pub fn suites(&self) -> &[Suite] {
        &self.suites
    }

    /// Find a suite by id
    #[must_use]
    pub fn suite(&self, id: &str) -> Option<&Suite> {
        self.suites.iter().find(|s| s.id() == id)
    }

    /// Total number of scenarios
    #[must_use]
    pub fn scenario_count(&self) -> usize {
        self.suites.iter().map(|s| s.scenarios().len()).sum()
    }

    /// Scenarios selected by `filter`, in registration order
    #[must_use]
    pub fn select(&self, filter: &ScenarioFilter) -> Vec<Selected<'_>> {
        self.suites
            .iter()
            .flat_map(|suite| {
                suite
                    .scenarios()
                    .iter()
                    .filter(move |scenario| filter.matches(suite, scenario))
                    .map(move |scenario| Selected { suite, scenario })
            })
            .collect()
    }
}

// ============================================================================
// Runner
// ============================================================================

enum Attempt {
    Passed,
    Failed(String),
    TimedOut(String),
}

/// Runs scenarios with per-test isolation, timeouts and retries
#[derive(Debug, Clone)]
pub struct Runner {
    browser: Browser,
    config: Arc<RunConfig>,
}

impl Runner {
    /// Create a runner on `browser`
    #[must_use]
    pub fn new(browser: Browser, config: RunConfig) -> Self {
        Self {
            browser,
            config: Arc::new(config),
        }
    }

    /// Run configuration
    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run a selection and collect a report
    pub async fn run(&self, selection: &[Selected<'_>]) -> RunReport {
        self.run_with(selection, |_| {}).await
    }

    /// Run a selection, calling `on_result` after each scenario
    pub async fn run_with<F>(&self, selection: &[Selected<'_>], mut on_result: F) -> RunReport
    where
        F: FnMut(&TestResultEntry),
    {
        let mut report = RunReport::new();
        info!(run = %report.run_id, scenarios = selection.len(), "run started");
        let mut stopped = false;

        for selected in selection {
            let entry = if stopped {
                TestResultEntry::skipped(selected.suite.id(), selected.scenario.name())
            } else {
                self.run_scenario(selected).await
            };
            if entry.status.is_failed() && self.config.fail_fast {
                warn!(scenario = %entry.full_name(), "fail-fast: skipping remaining scenarios");
                stopped = true;
            }
            on_result(&entry);
            report.record(entry);
        }

        info!(summary = %report.summary(), "run finished");
        report
    }

    /// Run one scenario with retries
    pub async fn run_scenario(&self, selected: &Selected<'_>) -> TestResultEntry {
        let suite = selected.suite;
        let scenario = selected.scenario;
        let max_attempts = self.config.retries.saturating_add(1);
        let started = Instant::now();
        let mut last = Attempt::Failed("not run".to_string());
        let mut attempts = 0;

        while attempts < max_attempts {
            attempts += 1;
            info!(suite = suite.id(), scenario = scenario.name(), attempt = attempts, "scenario started");
            last = self.attempt(suite, scenario).await;
            match &last {
                Attempt::Passed => break,
                Attempt::Failed(e) | Attempt::TimedOut(e) => {
                    if attempts < max_attempts {
                        warn!(scenario = scenario.name(), attempt = attempts, error = %e, "scenario failed, retrying");
                    }
                }
            }
        }

        let duration = started.elapsed();
        let entry = match last {
            Attempt::Passed => {
                let status = if attempts > 1 {
                    TestStatus::Flaky
                } else {
                    TestStatus::Passed
                };
                TestResultEntry::passed(suite.id(), scenario.name(), duration).with_status(status)
            }
            Attempt::Failed(e) => TestResultEntry::failed(suite.id(), scenario.name(), duration, e),
            Attempt::TimedOut(e) => TestResultEntry::failed(suite.id(), scenario.name(), duration, e)
                .with_status(TestStatus::TimedOut),
        }
        .with_attempts(attempts);
        info!(scenario = %entry.full_name(), status = entry.status.label(), "scenario finished");
        entry
    }

    async fn attempt(&self, suite: &Suite, scenario: &Scenario) -> Attempt {
        let context = match self.browser.new_context(suite.context_options().clone()).await {
            Ok(c) => c,
            Err(e) => return Attempt::Failed(format!("context setup failed: {e}")),
        };
        let outcome = self.attempt_in(&context, suite, scenario).await;
        if let Err(e) = context.close().await {
            debug!(error = %e, "context close failed");
        }
        outcome
    }

    async fn attempt_in(&self, context: &BrowserContext, suite: &Suite, scenario: &Scenario) -> Attempt {
        let page = match context.new_page().await {
            Ok(p) => p,
            Err(e) => return Attempt::Failed(format!("page setup failed: {e}")),
        };
        let fixture = TestContext::new(self.browser.clone(), context.clone(), page, Arc::clone(&self.config));
        let before = suite.before_each.clone();
        let after = suite.after_each.clone();
        let body = Arc::clone(&scenario.body);

        let test = async move {
            if let Some(hook) = before {
                hook(fixture.clone()).await?;
            }
            body(fixture.clone()).await?;
            if let Some(hook) = after {
                hook(fixture).await?;
            }
            Ok::<(), crate::result::PlaycheckError>(())
        };

        let limit = self.config.test_timeout();
        // Spawned so a panicking scenario fails alone instead of aborting the run.
        let handle = tokio::spawn(tokio::time::timeout(limit, test));
        match handle.await {
            Ok(Ok(Ok(()))) => Attempt::Passed,
            Ok(Ok(Err(e))) => Attempt::Failed(e.to_string()),
            Ok(Err(_)) => Attempt::TimedOut(format!("test timeout of {}ms exceeded", limit.as_millis())),
            Err(e) if e.is_panic() => Attempt::Failed("scenario panicked".to_string()),
            Err(e) => Attempt::Failed(e.to_string()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{BrowserDriver, MockBrowser};
    use crate::result::PlaycheckError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn runner(mock: &Arc<MockBrowser>, config: RunConfig) -> Runner {
        let browser = Browser::with_driver(Arc::clone(mock) as Arc<dyn BrowserDriver>, &config);
        Runner::new(browser, config)
    }

    fn passing(_t: TestContext) -> impl Future<Output = PlaycheckResult<()>> + Send {
        async { Ok(()) }
    }

    fn failing(_t: TestContext) -> impl Future<Output = PlaycheckResult<()>> + Send {
        async { Err(PlaycheckError::assertion("boom")) }
    }

    fn catalog() -> Catalog {
        Catalog::new()
            .with_suite(
                Suite::new("saucedemo::login", "SauceDemo Authentication")
                    .with_tag("saucedemo")
                    .scenario("should login", passing)
                    .scenario("should show error", failing),
            )
            .with_suite(
                Suite::new("todomvc", "TodoMVC")
                    .with_scenario(Scenario::new("should add todo", passing).with_tag("smoke")),
            )
    }

    mod filter_tests {
        use super::*;

        #[test]
        fn test_empty_filter_selects_all() {
            let c = catalog();
            assert_eq!(c.select(&ScenarioFilter::new()).len(), 3);
            assert_eq!(c.scenario_count(), 3);
        }

        #[test]
        fn test_pattern_spans_suite_and_name() {
            let c = catalog();
            let picked = c.select(&ScenarioFilter::new().with_pattern("LOGIN should show"));
            assert_eq!(picked.len(), 1);
            assert_eq!(picked[0].scenario.name(), "should show error");
        }

        #[test]
        fn test_tag_filter_uses_suite_and_scenario_tags() {
            let c = catalog();
            assert_eq!(c.select(&ScenarioFilter::new().with_tag("saucedemo")).len(), 2);
            assert_eq!(c.select(&ScenarioFilter::new().with_tag("smoke")).len(), 1);
            assert!(c.select(&ScenarioFilter::new().with_tag("nope")).is_empty());
        }

        #[test]
        fn test_find_suite() {
            let c = catalog();
            assert_eq!(c.suite("todomvc").unwrap().title(), "TodoMVC");
            assert!(c.suite("missing").is_none());
        }
    }

    mod runner_tests {
        use super::*;

        #[tokio::test]
        async fn test_pass_and_fail() {
            let mock = Arc::new(MockBrowser::new());
            let c = catalog();
            let report = runner(&mock, RunConfig::default())
                .run(&c.select(&ScenarioFilter::new()))
                .await;
            assert_eq!(report.passed_count(), 2);
            assert_eq!(report.failed_count(), 1);
            let failure = report.failures()[0];
            assert!(failure.error.as_deref().unwrap().contains("boom"));
        }

        #[tokio::test]
        async fn test_each_attempt_gets_fresh_context_closed_afterwards() {
            let mock = Arc::new(MockBrowser::new());
            let c = catalog();
            runner(&mock, RunConfig::default())
                .run(&c.select(&ScenarioFilter::new()))
                .await;
            assert!(mock.was_called("close_context:"));
            assert_eq!(mock.context_count(), 0);
        }

        #[tokio::test]
        async fn test_retry_marks_flaky() {
            let mock = Arc::new(MockBrowser::new());
            let calls = Arc::new(AtomicU32::new(0));
            let counter = Arc::clone(&calls);
            let c = Catalog::new().with_suite(Suite::new("flaky", "Flaky").scenario("second time lucky", move |_t| {
                let counter = Arc::clone(&counter);
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(PlaycheckError::assertion("first attempt"))
                    } else {
                        Ok(())
                    }
                }
            }));
            let mut config = RunConfig::default();
            config.retries = 2;
            let report = runner(&mock, config).run(&c.select(&ScenarioFilter::new())).await;
            assert_eq!(report.results[0].status, TestStatus::Flaky);
            assert_eq!(report.results[0].attempts, 2);
            assert_eq!(calls.load(Ordering::SeqCst), 2);
        }

        #[tokio::test]
        async fn test_retries_exhausted() {
            let mock = Arc::new(MockBrowser::new());
            let c = Catalog::new().with_suite(Suite::new("s", "S").scenario("always fails", failing));
            let mut config = RunConfig::default();
            config.retries = 1;
            let report = runner(&mock, config).run(&c.select(&ScenarioFilter::new())).await;
            assert_eq!(report.results[0].status, TestStatus::Failed);
            assert_eq!(report.results[0].attempts, 2);
        }

        #[tokio::test]
        async fn test_timeout() {
            let mock = Arc::new(MockBrowser::new());
            let c = Catalog::new().with_suite(Suite::new("s", "S").scenario("hangs", |_t| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            }));
            let mut config = RunConfig::default();
            config.test_timeout_ms = 50;
            let report = runner(&mock, config).run(&c.select(&ScenarioFilter::new())).await;
            assert_eq!(report.results[0].status, TestStatus::TimedOut);
            assert!(report.results[0].error.as_deref().unwrap().contains("50ms"));
        }

        #[tokio::test]
        async fn test_panic_is_a_failure() {
            let mock = Arc::new(MockBrowser::new());
            let c = Catalog::new().with_suite(
                Suite::new("s", "S")
                    .scenario("panics", |_t| async {
                        if Instant::now().elapsed() < Duration::from_secs(60) {
                            panic!("bad scenario");
                        }
                        Ok(())
                    })
                    .scenario("still runs", passing),
            );
            let report = runner(&mock, RunConfig::default())
                .run(&c.select(&ScenarioFilter::new()))
                .await;
            assert_eq!(report.results[0].status, TestStatus::Failed);
            assert_eq!(report.results[1].status, TestStatus::Passed);
        }

        #[tokio::test]
        async fn test_fail_fast_skips_rest() {
            let mock = Arc::new(MockBrowser::new());
            let c = Catalog::new().with_suite(
                Suite::new("s", "S")
                    .scenario("fails", failing)
                    .scenario("skipped", passing),
            );
            let mut config = RunConfig::default();
            config.fail_fast = true;
            let mut seen = Vec::new();
            let report = runner(&mock, config)
                .run_with(&c.select(&ScenarioFilter::new()), |e| seen.push(e.status))
                .await;
            assert_eq!(seen, vec![TestStatus::Failed, TestStatus::Skipped]);
            assert_eq!(report.skipped_count(), 1);
        }

        #[tokio::test]
        async fn test_hooks_run_around_body() {
            let mock = Arc::new(MockBrowser::new());
            let order = Arc::new(std::sync::Mutex::new(Vec::new()));
            let (b, s, a) = (Arc::clone(&order), Arc::clone(&order), Arc::clone(&order));
            let suite = Suite::new("s", "S")
                .before_each(move |_t| {
                    let b = Arc::clone(&b);
                    async move {
                        b.lock().unwrap().push("before");
                        Ok(())
                    }
                })
                .after_each(move |_t| {
                    let a = Arc::clone(&a);
                    async move {
                        a.lock().unwrap().push("after");
                        Ok(())
                    }
                })
                .scenario("body", move |_t| {
                    let s = Arc::clone(&s);
                    async move {
                        s.lock().unwrap().push("body");
                        Ok(())
                    }
                });
            let c = Catalog::new().with_suite(suite);
            runner(&mock, RunConfig::default())
                .run(&c.select(&ScenarioFilter::new()))
                .await;
            assert_eq!(*order.lock().unwrap(), vec!["before", "body", "after"]);
        }

        #[tokio::test]
        async fn test_start_at_navigates_to_site() {
            let mock = Arc::new(MockBrowser::new());
            let page = Arc::new(crate::driver::MockPage::new("p"));
            mock.prepare_page(Arc::clone(&page));
            let c = Catalog::new().with_suite(
                Suite::new("s", "S")
                    .start_at(Site::TheInternet, "/abtest")
                    .scenario("noop", passing),
            );
            runner(&mock, RunConfig::default())
                .run(&c.select(&ScenarioFilter::new()))
                .await;
            assert!(page.was_called("navigate:https://the-internet.herokuapp.com/abtest"));
        }
    }
}
