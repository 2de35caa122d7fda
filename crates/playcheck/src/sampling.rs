//! Sampling of content that changes between page loads.
//!
//! A/B test variants, rotating notification messages and randomised content
//! cannot be asserted with a single observation. `VariantSampler` reloads and
//! observes repeatedly, stopping once a goal is met, and hands back the full
//! record so a scenario can decide what counts as a pass.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

use crate::page::Page;
use crate::result::PlaycheckResult;
use crate::wait::LoadState;

/// When sampling may stop early
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleGoal {
    /// Any observation differs from the first
    AnyChange,
    /// A specific value was observed
    SeenValue(String),
    /// At least this many distinct values were observed
    DistinctCount(usize),
}

impl SampleGoal {
    fn is_met(&self, report: &SampleReport) -> bool {
        match self {
            Self::AnyChange => report.first_change.is_some(),
            Self::SeenValue(value) => report.distinct.contains(value),
            Self::DistinctCount(n) => report.distinct.len() >= *n,
        }
    }
}

/// Everything observed during one sampling run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleReport {
    /// Observations in order; index 0 is the page as first loaded
    pub observations: Vec<String>,
    /// Distinct observed values
    pub distinct: BTreeSet<String>,
    /// Index of the first observation that differed from the first one
    pub first_change: Option<usize>,
    /// Whether the goal was reached before samples ran out
    pub goal_met: bool,
}

impl SampleReport {
    fn record(&mut self, observation: String) {
        if self.first_change.is_none()
            && self
                .observations
                .first()
                .is_some_and(|first| *first != observation)
        {
            self.first_change = Some(self.observations.len());
        }
        self.distinct.insert(observation.clone());
        self.observations.push(observation);
    }

    /// How often `value` was observed
    #[must_use]
    pub fn count_of(&self, value: &str) -> usize {
        self.observations.iter().filter(|o| *o == value).count()
    }

    /// Whether every observation is one of `allowed`
    #[must_use]
    pub fn all_within(&self, allowed: &[&str]) -> bool {
        self.distinct.iter().all(|d| allowed.contains(&d.as_str()))
    }

    /// One-line distribution such as `control=7 variation=3`
    #[must_use]
    pub fn distribution(&self) -> String {
        self.distinct
            .iter()
            .map(|d| format!("{d}={}", self.count_of(d)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Repeats "reload, then observe" until a goal is met or samples run out
#[derive(Debug, Clone)]
pub struct VariantSampler {
    samples: usize,
    pause: Duration,
    goal: Option<SampleGoal>,
    load_state: LoadState,
}

impl VariantSampler {
    /// Sample up to `samples` observations, the first one without a reload
    #[must_use]
    pub fn new(samples: usize) -> Self {
        Self {
            samples: samples.max(1),
            pause: Duration::ZERO,
            goal: None,
            load_state: LoadState::Load,
        }
    }

    /// Wait between samples
    #[must_use]
    pub const fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Stop as soon as `goal` is met
    #[must_use]
    pub fn until(mut self, goal: SampleGoal) -> Self {
        self.goal = Some(goal);
        self
    }

    /// Load state awaited after each reload
    #[must_use]
    pub const fn with_load_state(mut self, state: LoadState) -> Self {
        self.load_state = state;
        self
    }

    /// Run `observe` up to `samples` times; it gets the sample index
    pub async fn run<F, Fut>(&self, mut observe: F) -> PlaycheckResult<SampleReport>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = PlaycheckResult<String>>,
    {
        let mut report = SampleReport::default();
        for index in 0..self.samples {
            if index > 0 && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }
            let observation = observe(index).await?;
            debug!(index, observation = %observation, "sample observed");
            report.record(observation);
            if self.goal.as_ref().is_some_and(|g| g.is_met(&report)) {
                report.goal_met = true;
                break;
            }
        }
        info!(
            samples = report.observations.len(),
            goal_met = report.goal_met,
            distribution = %report.distribution(),
            "sampling finished"
        );
        Ok(report)
    }

    /// Observe `page` as loaded, then reload before every further sample
    pub async fn sample_reloads<F, Fut>(&self, page: &Page, mut observe: F) -> PlaycheckResult<SampleReport>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = PlaycheckResult<String>>,
    {
        let load_state = self.load_state;
        self.run(|index| {
            let observation = observe();
            async move {
                if index > 0 {
                    page.reload().await?;
                    page.wait_for_load_state(load_state).await?;
                }
                observation.await
            }
        })
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::browser::Browser;
    use crate::config::RunConfig;
    use crate::driver::{BrowserDriver, MockBrowser, MockPage, URL_EXPRESSION};
    use serde_json::json;
    use std::sync::Arc;

    fn scripted<'a>(values: &'a [&'a str]) -> impl FnMut(usize) -> std::future::Ready<PlaycheckResult<String>> + 'a {
        move |i| std::future::ready(Ok(values[i % values.len()].to_string()))
    }

    mod report_tests {
        use super::*;

        #[test]
        fn test_first_change_index() {
            let mut report = SampleReport::default();
            report.record("a".into());
            report.record("a".into());
            report.record("b".into());
            report.record("a".into());
            assert_eq!(report.first_change, Some(2));
            assert_eq!(report.distinct.len(), 2);
            assert_eq!(report.count_of("a"), 3);
        }

        #[test]
        fn test_all_within() {
            let mut report = SampleReport::default();
            report.record("control".into());
            report.record("variation".into());
            assert!(report.all_within(&["control", "variation"]));
            assert!(!report.all_within(&["control"]));
        }

        #[test]
        fn test_distribution() {
            let mut report = SampleReport::default();
            report.record("b".into());
            report.record("a".into());
            report.record("b".into());
            assert_eq!(report.distribution(), "a=1 b=2");
        }
    }

    mod sampler_tests {
        use super::*;

        #[tokio::test]
        async fn test_runs_all_samples_without_goal() {
            let report = VariantSampler::new(5).run(scripted(&["x"])).await.unwrap();
            assert_eq!(report.observations.len(), 5);
            assert!(report.first_change.is_none());
            assert!(!report.goal_met);
        }

        #[tokio::test]
        async fn test_any_change_stops_early() {
            let report = VariantSampler::new(10)
                .until(SampleGoal::AnyChange)
                .run(scripted(&["a", "a", "b"]))
                .await
                .unwrap();
            assert_eq!(report.observations, vec!["a", "a", "b"]);
            assert!(report.goal_met);
        }

        #[tokio::test]
        async fn test_seen_value_goal() {
            let report = VariantSampler::new(10)
                .until(SampleGoal::SeenValue("c".into()))
                .run(scripted(&["a", "b", "c", "d"]))
                .await
                .unwrap();
            assert_eq!(report.observations.len(), 3);
            assert!(report.goal_met);
        }

        #[tokio::test]
        async fn test_distinct_count_goal_not_met() {
            let report = VariantSampler::new(4)
                .until(SampleGoal::DistinctCount(3))
                .run(scripted(&["a", "b"]))
                .await
                .unwrap();
            assert_eq!(report.observations.len(), 4);
            assert!(!report.goal_met);
        }

        #[tokio::test]
        async fn test_zero_samples_still_observes_once() {
            let report = VariantSampler::new(0).run(scripted(&["a"])).await.unwrap();
            assert_eq!(report.observations.len(), 1);
        }

        #[tokio::test]
        async fn test_observer_error_propagates() {
            let result = VariantSampler::new(3)
                .run(|_| std::future::ready(Err(crate::result::PlaycheckError::page("gone"))))
                .await;
            assert!(result.is_err());
        }

        #[tokio::test]
        async fn test_sample_reloads_reloads_between_samples() {
            let mock = Arc::new(MockBrowser::new());
            let page_driver = Arc::new(MockPage::new("p"));
            page_driver.script("readyState", [json!("complete")]);
            mock.prepare_page(Arc::clone(&page_driver));
            let browser = Browser::with_driver(mock as Arc<dyn BrowserDriver>, &RunConfig::default());
            let page = browser.new_page().await.unwrap();

            let report = VariantSampler::new(3)
                .sample_reloads(&page, || {
                    let page = page.clone();
                    async move {
                        let url = page.evaluate(URL_EXPRESSION).await?;
                        Ok(url.as_str().unwrap_or_default().to_string())
                    }
                })
                .await
                .unwrap();
            assert_eq!(report.observations.len(), 3);
            let reloads = page_driver.calls().iter().filter(|c| c.starts_with("reload")).count();
            assert_eq!(reloads, 2);
        }
    }
}
