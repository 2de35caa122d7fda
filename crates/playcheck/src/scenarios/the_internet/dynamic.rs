//! Dynamic loading, dynamic controls and randomised content.

use std::time::Duration;

use super::suite;
use crate::expect::expect;
use crate::harness::{Suite, TestContext};
use crate::locator::Locator;
use crate::page::Page;
use crate::result::PlaycheckResult;
use crate::sampling::{SampleGoal, VariantSampler};
use crate::scenarios::{any_value, role, sampled};
use crate::wait::LoadState;
use tracing::info;

/// Loading bars on these pages run for several seconds
const LOADING: Duration = Duration::from_secs(10);

pub(super) fn suites() -> Vec<Suite> {
    vec![dynamic_loading(), dynamic_controls(), dynamic_content()]
}

/// Wait for the `#loading` indicator to appear and go away again
async fn await_loading(page: &Page) -> PlaycheckResult<()> {
    let loading = page.locator("#loading");
    expect(&loading).with_timeout(LOADING).to_be_visible().await?;
    expect(&loading).with_timeout(LOADING).not().to_be_visible().await
}

// ============================================================================
// Dynamic loading
// ============================================================================

fn dynamic_loading() -> Suite {
    suite("dynamic::dynamic_loading", "Dynamic Loading", "dynamic_loading")
        .scenario("should display dynamic loading page", loading_page)
        .scenario("should handle Example 1: Element on page that is hidden", hidden_element)
        .scenario("should handle Example 2: Element rendered after the fact", rendered_element)
        .scenario("should handle multiple start clicks", repeated_start)
}

async fn loading_page(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&page.get_by_text("Dynamically Loaded Page Elements")).to_be_visible().await?;
    expect(&role(page, "link", "Example 1")).to_be_visible().await?;
    expect(&role(page, "link", "Example 2")).to_be_visible().await
}

async fn open_example(page: &Page, n: u8) -> PlaycheckResult<Locator> {
    role(page, "link", &format!("Example {n}")).click().await?;
    expect(&page.get_by_text("Dynamically Loaded Page Elements")).to_be_visible().await?;
    let start = role(page, "button", "Start");
    expect(&start).to_be_visible().await?;
    Ok(start)
}

async fn hidden_element(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    let start = open_example(page, 1).await?;
    let finish = page.locator("#finish");
    expect(&finish).not().to_be_visible().await?;

    start.click().await?;
    expect(&finish).with_timeout(LOADING).to_be_visible().await?;
    expect(&finish).to_contain_text("Hello World!").await?;
    expect(&page.locator("#loading")).not().to_be_visible().await
}

async fn rendered_element(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    let start = open_example(page, 2).await?;
    let finish = page.locator("#finish");
    expect(&finish).not().to_be_attached().await?;

    start.click().await?;
    expect(&finish).with_timeout(LOADING).to_be_attached().await?;
    expect(&finish).to_contain_text("Hello World!").await?;
    expect(&page.locator("#loading")).not().to_be_visible().await
}

async fn repeated_start(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    let start = open_example(page, 1).await?;
    start.click().await?;
    // the button hides once loading starts
    if start.is_visible().await? {
        start.click().await?;
    }
    let finish = page.locator("#finish");
    expect(&finish).with_timeout(LOADING).to_be_visible().await?;
    expect(&finish).to_contain_text("Hello World!").await
}

// ============================================================================
// Dynamic controls
// ============================================================================

fn dynamic_controls() -> Suite {
    suite("dynamic::dynamic_controls", "Dynamic Controls", "dynamic_controls")
        .scenario("should display dynamic controls page", controls_page)
        .scenario("should remove and add checkbox", remove_add_checkbox)
        .scenario("should enable and disable input", enable_disable_input)
        .scenario("should handle multiple enable/disable cycles", enable_cycles)
}

async fn controls_page(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&page.get_by_text("Dynamic Controls").first()).to_be_visible().await?;
    expect(&role(page, "button", "Remove")).to_be_visible().await?;
    expect(&role(page, "button", "Enable")).to_be_visible().await
}

async fn remove_add_checkbox(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    let checkbox = page.locator("#checkbox");
    let remove = role(page, "button", "Remove");
    let add = role(page, "button", "Add");

    expect(&checkbox).to_be_visible().await?;
    expect(&remove).to_be_visible().await?;

    remove.click().await?;
    await_loading(page).await?;
    expect(&checkbox).not().to_be_visible().await?;
    expect(&add).to_be_visible().await?;

    add.click().await?;
    await_loading(page).await?;
    expect(&checkbox).to_be_visible().await?;
    expect(&remove).to_be_visible().await
}

async fn enable_disable_input(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    let input = page.locator("input[type=\"text\"]");
    let enable = role(page, "button", "Enable");
    let disable = role(page, "button", "Disable");

    expect(&input).to_be_disabled().await?;
    expect(&enable).to_be_visible().await?;

    enable.click().await?;
    await_loading(page).await?;
    expect(&input).to_be_enabled().await?;
    expect(&disable).to_be_visible().await?;

    input.fill("Test text").await?;
    expect(&input).to_have_value("Test text").await?;

    disable.click().await?;
    await_loading(page).await?;
    expect(&input).to_be_disabled().await?;
    expect(&enable).to_be_visible().await?;
    expect(&input).to_have_value("Test text").await
}

async fn enable_cycles(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    let input = page.locator("input[type=\"text\"]");
    for _ in 0..3 {
        role(page, "button", "Enable").click().await?;
        await_loading(page).await?;
        expect(&input).to_be_enabled().await?;

        role(page, "button", "Disable").click().await?;
        await_loading(page).await?;
        expect(&input).to_be_disabled().await?;
    }
    Ok(())
}

// ============================================================================
// Dynamic content
// ============================================================================

fn dynamic_content() -> Suite {
    suite("dynamic::dynamic_content", "Dynamic Content", "dynamic_content")
        .scenario("should display dynamic content page", content_page)
        .with_scenario(sampled(
            "should load different content on each page refresh",
            content_changes_on_reload,
        ))
        .scenario("should handle Example 2 with dynamic content", |t| content_example(t, 2))
        .scenario("should handle Example 3 with dynamic content", |t| content_example(t, 3))
        .scenario("should verify all images have proper attributes", image_attributes)
}

async fn content_page(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&page.get_by_text("Dynamic Content").first()).to_be_visible().await?;
    for n in 1..=3 {
        expect(&role(page, "link", &format!("Example {n}"))).to_be_visible().await?;
    }
    Ok(())
}

async fn example_images(page: &Page, n: u8) -> PlaycheckResult<Locator> {
    role(page, "link", &format!("Example {n}")).click().await?;
    let images = page.locator(".example img");
    expect(&images).to_have_count(3).await?;
    Ok(images)
}

/// Random content may repeat, so an unchanged page is logged, not failed
async fn content_changes_on_reload(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    let images = example_images(page, 1).await?;
    let report = VariantSampler::new(6)
        .until(SampleGoal::AnyChange)
        .with_load_state(LoadState::NetworkIdle)
        .sample_reloads(page, || {
            let images = images.clone();
            async move {
                let mut sources = Vec::with_capacity(3);
                for i in 0..3 {
                    sources.push(images.nth(i).get_attribute("src").await?.unwrap_or_default());
                }
                Ok(sources.join(" "))
            }
        })
        .await?;
    info!(
        changed = report.goal_met,
        reloads = report.observations.len() - 1,
        "dynamic content sampled"
    );
    Ok(())
}

async fn content_example(t: TestContext, n: u8) -> PlaycheckResult<()> {
    let images = example_images(t.page(), n).await?;
    for i in 0..3 {
        expect(&images.nth(i)).to_be_visible().await?;
    }
    Ok(())
}

async fn image_attributes(t: TestContext) -> PlaycheckResult<()> {
    let images = example_images(t.page(), 1).await?;
    for i in 0..3 {
        let image = images.nth(i);
        expect(&image).to_have_attribute("src", any_value()?).await?;
        expect(&image).to_have_attribute("alt", any_value()?).await?;
    }
    Ok(())
}
