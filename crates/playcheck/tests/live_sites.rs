//! Live runs of every site suite against real Chromium
//!
//! Needs the `browser` feature, a Chromium install and network access.
//! Skipped unless `PLAYCHECK_LIVE=1`.
//!
//! ```bash
//! PLAYCHECK_LIVE=1 cargo test -p playcheck --features browser --test live_sites
//! ```

#![cfg(feature = "browser")]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use playcheck::{scenarios, Browser, Catalog, RunConfig, Runner, ScenarioFilter, TestStatus};

fn live_enabled() -> bool {
    let enabled = std::env::var("PLAYCHECK_LIVE").is_ok_and(|v| v == "1");
    if !enabled {
        eprintln!("skipping live browser test: set PLAYCHECK_LIVE=1 to run");
    }
    enabled
}

fn live_config() -> RunConfig {
    RunConfig::default()
        .apply_env()
        .expect("PLAYCHECK_* variables should parse")
        .with_retries(1)
}

/// Run every scenario tagged `site` and require that none failed
async fn run_site(site: &str) {
    if !live_enabled() {
        return;
    }

    let config = live_config();
    let browser = Browser::launch(&config).await.expect("chromium should launch");
    let catalog: Catalog = scenarios::catalog();
    let selection = catalog.select(&ScenarioFilter::new().with_tag(site));
    assert!(!selection.is_empty(), "no scenarios for {site}");

    let report = Runner::new(browser.clone(), config).run(&selection).await;
    browser.close().await.expect("browser should close");

    let failures: Vec<String> = report
        .failures()
        .iter()
        .map(|r| format!("{}: {}", r.full_name(), r.error.as_deref().unwrap_or("")))
        .collect();
    assert!(failures.is_empty(), "{}\n{}", report.summary(), failures.join("\n"));
    assert!(report
        .results
        .iter()
        .all(|r| r.status != TestStatus::Skipped));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_saucedemo_suites() {
    run_site("saucedemo").await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_the_internet_suites() {
    run_site("the_internet").await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_todomvc_suites() {
    run_site("todomvc").await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_browser_reports_version() {
    if !live_enabled() {
        return;
    }
    let browser = Browser::launch(&live_config()).await.expect("chromium should launch");
    let version = browser.version().await.expect("version");
    assert!(!version.is_empty());
    browser.close().await.expect("browser should close");
}
