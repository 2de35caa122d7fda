//! Broken images, disappearing elements, shifting content and the floating menu.

use serde_json::Value;

use super::suite;
use crate::assertion::Assertion;
use crate::config::Viewport;
use crate::expect::expect;
use crate::harness::{Suite, TestContext};
use crate::locator::Locator;
use crate::page::{ClickOptions, Page};
use crate::result::PlaycheckResult;
use crate::sampling::VariantSampler;
use crate::scenarios::{any_value, non_empty, role, sampled, SETTLE};
use crate::wait::LoadState;
use tracing::{debug, info};

const MENU_ITEMS: [&str; 5] = ["Home", "About", "Contact Us", "Portfolio", "Gallery"];

const VIEWPORTS: [Viewport; 4] = [
    Viewport::new(1920, 1080),
    Viewport::new(1366, 768),
    Viewport::new(768, 1024),
    Viewport::new(375, 667),
];

pub(super) fn suites() -> Vec<Suite> {
    vec![broken_images(), disappearing_elements(), shifting_content(), floating_menu()]
}

// ============================================================================
// Broken images
// ============================================================================

fn broken_images() -> Suite {
    suite("ui_layout::broken_images", "Broken Images", "broken_images")
        .scenario("should display broken images page", broken_images_page)
        .scenario("should identify broken images", identify_broken)
        .scenario("should handle image loading errors", images_after_reload)
        .scenario("should have proper image attributes", image_attributes)
}

fn images(page: &Page) -> Locator {
    page.locator(".example img")
}

async fn broken_images_page(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&role(page, "heading", "Broken Images")).to_be_visible().await?;
    expect(&images(page)).to_have_count(3).await
}

/// The page deliberately serves two images that fail to load
async fn identify_broken(t: TestContext) -> PlaycheckResult<()> {
    let images = images(t.page());
    let mut broken = 0;
    for i in 0..images.count().await? {
        let image = images.nth(i as i64);
        let natural = image
            .evaluate("el => el.complete && el.naturalWidth === 0", Value::Null)
            .await?;
        let is_broken = natural.as_bool().unwrap_or(false);
        debug!(image = i + 1, broken = is_broken, "image checked");
        if is_broken {
            broken += 1;
        }
    }
    info!(broken, "broken images found");
    non_empty("broken images", broken)
}

async fn images_after_reload(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    page.reload().await?;
    page.wait_for_load_state(LoadState::NetworkIdle).await?;
    expect(&images(page)).to_have_count(3).await
}

async fn image_attributes(t: TestContext) -> PlaycheckResult<()> {
    let images = images(t.page());
    for i in 0..images.count().await? {
        expect(&images.nth(i as i64)).to_have_attribute("src", any_value()?).await?;
    }
    Ok(())
}

// ============================================================================
// Disappearing elements
// ============================================================================

fn disappearing_elements() -> Suite {
    suite("ui_layout::disappearing_elements", "Disappearing Elements", "disappearing_elements")
        .scenario("should display disappearing elements page", disappearing_page)
        .with_scenario(sampled("should handle menu elements that disappear", menu_across_reloads))
        .scenario("should verify specific menu items", specific_menu_items)
        .scenario("should handle element visibility changes", menu_after_pause)
        .scenario("should maintain page structure", menu_structure)
}

fn menu_links(page: &Page) -> Locator {
    page.locator("#content ul li a")
}

async fn disappearing_page(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&role(page, "heading", "Disappearing Elements")).to_be_visible().await?;
    expect(&page.locator("#content")).to_be_visible().await
}

/// "Gallery" comes and goes between loads; the other four always stay
async fn menu_across_reloads(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    let links = menu_links(page);
    let report = VariantSampler::new(10)
        .with_load_state(LoadState::NetworkIdle)
        .sample_reloads(page, || {
            let links = links.clone();
            async move { Ok(links.count().await?.to_string()) }
        })
        .await?;
    info!(distribution = %report.distribution(), "menu sizes across reloads");
    Assertion::is_true(report.all_within(&["4", "5"]), "menu lost a permanent item")
        .context(&report.distribution())
        .check()
}

async fn specific_menu_items(t: TestContext) -> PlaycheckResult<()> {
    let links = menu_links(t.page());
    for item in MENU_ITEMS {
        let link = links.filter_has_text(item);
        if link.count().await? > 0 {
            expect(&link.first()).to_be_visible().await?;
        }
    }
    Ok(())
}

async fn menu_after_pause(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    let before = menu_links(page).count().await?;
    page.wait_for_timeout(1000).await;
    let after = menu_links(page).count().await?;
    Assertion::equals(&before, &after).context("menu size without reload").check()
}

async fn menu_structure(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&page.locator("#content")).to_be_visible().await?;
    expect(&page.locator("#content ul")).to_be_visible().await
}

// ============================================================================
// Shifting content
// ============================================================================

fn shifting_content() -> Suite {
    suite("ui_layout::shifting_content", "Shifting Content", "shifting_content")
        .scenario("should display shifting content page", shifting_page)
        .scenario("should handle Example 1: Menu shifting", menu_shifting)
        .scenario("should handle Example 2: Image shifting", image_shifting)
        .scenario("should handle clicking shifting elements", click_shifting)
        .scenario("should maintain content visibility during shifts", visible_during_shifts)
        .scenario("should handle responsive layout shifts", responsive_viewports)
}

async fn open_example(page: &Page, n: u8) -> PlaycheckResult<()> {
    role(page, "link", &format!("Example {n}")).click().await?;
    expect(&page.get_by_text(&format!("Shifting Content: Example {n}")).first())
        .to_be_visible()
        .await
}

async fn shifting_page(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&role(page, "heading", "Shifting Content")).to_be_visible().await?;
    expect(&role(page, "link", "Example 1")).to_be_visible().await?;
    expect(&role(page, "link", "Example 2")).to_be_visible().await
}

async fn menu_shifting(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    open_example(page, 1).await?;
    let items = page.locator(".example ul li");
    let count = items.count().await?;
    non_empty("menu items", count)?;
    let report = VariantSampler::new(5)
        .with_pause(SETTLE)
        .run(|_| {
            let items = items.clone();
            async move {
                let mut xs = Vec::with_capacity(count);
                for i in 0..count {
                    if let Some(bounds) = items.nth(i as i64).bounding_box().await? {
                        xs.push(format!("{:.0}", bounds.x));
                    }
                }
                Ok(xs.join(","))
            }
        })
        .await?;
    info!(positions = %report.distribution(), "menu positions over time");
    Ok(())
}

async fn image_shifting(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    open_example(page, 2).await?;
    let images = page.locator(".example img");
    let count = images.count().await?;
    non_empty("images", count)?;
    for _ in 0..3 {
        for i in 0..count {
            let image = images.nth(i as i64);
            expect(&image).to_be_visible().await?;
            let bounds = image.bounding_box().await?;
            Assertion::is_true(
                bounds.is_some_and(|b| b.width > 0.0 && b.height > 0.0),
                "image has no area",
            )
            .check()?;
        }
        page.wait_for_timeout(1000).await;
    }
    Ok(())
}

/// A shifted item may be covered mid-move; fall back to a forced click
async fn click_shifting(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    open_example(page, 1).await?;
    let links = page.locator(".example ul li a");
    if links.count().await? == 0 {
        return Ok(());
    }
    let first = links.first();
    if let Err(e) = first.click().await {
        debug!(error = %e, "plain click failed, forcing");
        first.click_with(&ClickOptions::default().forced()).await?;
    }
    Ok(())
}

async fn visible_during_shifts(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    open_example(page, 1).await?;
    let items = page.locator(".example ul li");
    for _ in 0..5 {
        let count = items.count().await?;
        non_empty("menu items", count)?;
        for i in 0..count {
            expect(&items.nth(i as i64)).to_be_visible().await?;
        }
        page.wait_for_timeout(SETTLE.as_millis() as u64).await;
    }
    Ok(())
}

async fn responsive_viewports(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    for viewport in VIEWPORTS {
        page.set_viewport_size(viewport).await?;
        page.wait_for_timeout(SETTLE.as_millis() as u64).await;
        expect(&role(page, "heading", "Shifting Content")).to_be_visible().await?;
        let items = page.locator(".example ul li");
        for i in 0..items.count().await? {
            expect(&items.nth(i as i64)).to_be_visible().await?;
        }
    }
    Ok(())
}

// ============================================================================
// Floating menu
// ============================================================================

fn floating_menu() -> Suite {
    suite("ui_layout::floating_menu", "Floating Menu", "floating_menu")
        .scenario("should display floating menu page", floating_page)
        .scenario("should have floating menu that stays visible", menu_stays_visible)
        .scenario("should have working menu links", floating_links)
        .scenario("should maintain menu position during scroll", menu_position)
}

fn menu(page: &Page) -> Locator {
    page.locator("#menu")
}

async fn scroll_to(page: &Page, y: &str) -> PlaycheckResult<()> {
    page.evaluate(&format!("window.scrollTo(0, {y})")).await?;
    page.wait_for_timeout(SETTLE.as_millis() as u64).await;
    Ok(())
}

async fn floating_page(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&role(page, "heading", "Floating Menu")).to_be_visible().await?;
    expect(&menu(page)).to_be_visible().await
}

async fn menu_stays_visible(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    let menu = menu(page);
    expect(&menu).to_be_visible().await?;
    scroll_to(page, "document.body.scrollHeight").await?;
    expect(&menu).to_be_visible().await?;
    scroll_to(page, "0").await?;
    expect(&menu).to_be_visible().await
}

async fn floating_links(t: TestContext) -> PlaycheckResult<()> {
    let links = menu(t.page()).locator("a");
    let count = links.count().await?;
    non_empty("menu links", count)?;
    for i in 0..count {
        let link = links.nth(i as i64);
        expect(&link).to_be_visible().await?;
        expect(&link).to_have_attribute("href", any_value()?).await?;
    }
    Ok(())
}

/// The menu follows the scroll, so it ends up inside the viewport again
async fn menu_position(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    let menu = menu(page);
    let before = menu.bounding_box().await?;
    Assertion::is_some(&before).context("menu bounds before scroll").check()?;
    scroll_to(page, "500").await?;
    expect(&menu).to_be_visible().await?;
    let viewport = page.viewport_size().await?;
    let after = menu.bounding_box().await?;
    Assertion::is_true(
        after.is_some_and(|b| b.y + b.height > 0.0 && b.y < f64::from(viewport.height)),
        "menu scrolled out of the viewport",
    )
    .check()
}
