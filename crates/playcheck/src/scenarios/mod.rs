//! The end-to-end suites, one module per site.
//!
//! Every `describe` block of a site becomes a [`Suite`]; every test becomes a
//! [`Scenario`](crate::harness::Scenario) named after what it checks. Scenario
//! bodies are plain `async fn(TestContext) -> PlaycheckResult<()>`.

pub mod saucedemo;
pub mod the_internet;
pub mod todomvc;

use std::time::Duration;

use crate::assertion::Assertion;
use crate::dialog::Dialog;
use crate::harness::{Catalog, Scenario, Suite, TestContext};
use crate::locator::Locator;
use crate::matcher::TextMatcher;
use crate::page::Page;
use crate::result::PlaycheckResult;
use crate::selector::RoleOptions;
use crate::wait::{poll_until, Observation, WaitOptions};

/// Every suite of every site
#[must_use]
pub fn catalog() -> Catalog {
    Catalog::new()
        .with_suites(saucedemo::suites())
        .with_suites(the_internet::suites())
        .with_suites(todomvc::suites())
}

/// Suites of a single site, by site id
#[must_use]
pub fn site_suites(site: &str) -> Option<Vec<Suite>> {
    match site {
        "saucedemo" => Some(saucedemo::suites()),
        "the_internet" | "the-internet" => Some(the_internet::suites()),
        "todomvc" => Some(todomvc::suites()),
        _ => None,
    }
}

/// Element by ARIA role and loose accessible name
pub(crate) fn role(page: &Page, role: &str, name: &str) -> Locator {
    page.get_by_role(role, RoleOptions::default().name(name))
}

/// Scenario observing randomised content, tagged `sampled`
pub(crate) fn sampled<F, Fut>(name: &str, body: F) -> Scenario
where
    F: Fn(TestContext) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = PlaycheckResult<()>> + Send + 'static,
{
    Scenario::new(name, body).with_tag("sampled")
}

/// Matches any attribute value, for presence checks
pub(crate) fn any_value() -> PlaycheckResult<TextMatcher> {
    TextMatcher::regex("^")
}

/// Fail unless `count` is positive
pub(crate) fn non_empty(what: &str, count: usize) -> PlaycheckResult<()> {
    Assertion::greater_than(count, 0).context(what).check()
}

/// Wait until the page has seen a dialog with `message`
pub(crate) async fn dialog_seen(page: &Page, message: &str) -> PlaycheckResult<Dialog> {
    let options = WaitOptions::new(format!("dialog {message:?}"), page.settings().timeouts.action())
        .with_poll_interval(page.settings().timeouts.poll_interval());
    poll_until(&options, || async move {
        let dialogs = page.dialogs();
        Ok(match dialogs.iter().find(|d| d.message() == message) {
            Some(dialog) => Observation::Done(dialog.clone()),
            None => Observation::Retry(format!("{} dialogs seen", dialogs.len())),
        })
    })
    .await
}

/// Pause used where the site animates or reshuffles on a timer
pub(crate) const SETTLE: Duration = Duration::from_millis(500);

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::harness::ScenarioFilter;
    use std::collections::HashSet;

    mod catalog_tests {
        use super::*;

        #[test]
        fn test_suite_ids_are_unique() {
            let catalog = catalog();
            let ids: HashSet<&str> = catalog.suites().iter().map(Suite::id).collect();
            assert_eq!(ids.len(), catalog.suites().len());
        }

        #[test]
        fn test_scenario_names_unique_within_suite() {
            for suite in catalog().suites() {
                let names: HashSet<&str> = suite.scenarios().iter().map(|s| s.name()).collect();
                assert_eq!(names.len(), suite.scenarios().len(), "duplicate in {}", suite.id());
            }
        }

        #[test]
        fn test_every_suite_has_scenarios() {
            for suite in catalog().suites() {
                assert!(!suite.scenarios().is_empty(), "{} is empty", suite.id());
            }
        }

        #[test]
        fn test_site_prefixes() {
            let catalog = catalog();
            for suite in catalog.suites() {
                let site = suite.id().split("::").next().unwrap();
                assert!(["saucedemo", "the_internet", "todomvc"].contains(&site), "{}", suite.id());
            }
        }

        #[test]
        fn test_site_suites_match_catalog() {
            let total: usize = ["saucedemo", "the-internet", "todomvc"]
                .iter()
                .map(|s| site_suites(s).unwrap().len())
                .sum();
            assert_eq!(total, catalog().suites().len());
            assert!(site_suites("nope").is_none());
        }

        #[test]
        fn test_known_suites_present() {
            let catalog = catalog();
            for id in [
                "saucedemo::login",
                "saucedemo::inventory",
                "saucedemo::cart_checkout",
                "the_internet::auth::form_authentication",
                "the_internet::navigation::ab_testing",
                "the_internet::miscellaneous::javascript_alerts",
                "todomvc::app",
            ] {
                assert!(catalog.suite(id).is_some(), "missing {id}");
            }
        }

        #[test]
        fn test_sampled_tag_selects_flaky_content() {
            let catalog = catalog();
            let selected = catalog.select(&ScenarioFilter::new().with_tag("sampled"));
            let names: Vec<&str> = selected.iter().map(|s| s.scenario.name()).collect();
            assert!(names.contains(&"should show different content on page refresh"));
            assert!(names.contains(&"should show different notifications"));
        }

        #[test]
        fn test_pattern_over_site() {
            let catalog = catalog();
            let todo = catalog.select(&ScenarioFilter::new().with_pattern("todomvc"));
            assert_eq!(todo.len(), catalog.suite("todomvc::app").unwrap().scenarios().len());
        }
    }
}
