//! Drag and drop, hovers, context menu and key presses.

use super::suite;
use crate::assertion::Assertion;
use crate::expect::{expect, expect_page};
use crate::harness::{Suite, TestContext};
use crate::locator::Locator;
use crate::matcher::UrlMatcher;
use crate::page::{ClickOptions, Page};
use crate::result::PlaycheckResult;
use crate::scenarios::{dialog_seen, role};
use crate::sites::the_internet::key_press_result;
use crate::sites::Site;

const CONTEXT_MENU_ALERT: &str = "You selected a context menu";

pub(super) fn suites() -> Vec<Suite> {
    vec![drag_and_drop(), hovers(), context_menu(), key_presses()]
}

// ============================================================================
// Drag and drop
// ============================================================================

fn drag_and_drop() -> Suite {
    suite("interactions::drag_and_drop", "Drag and Drop", "drag_and_drop")
        .scenario("should display drag and drop page", drag_page)
        .scenario("should drag element from A to B", drag_a_to_b)
        .scenario("should drag element from B to A", drag_b_to_a)
        .scenario("should handle multiple drag operations", drag_repeatedly)
}

fn columns(page: &Page) -> (Locator, Locator) {
    (page.locator("#column-a"), page.locator("#column-b"))
}

/// Check which letter each column currently shows
async fn expect_columns(a: &Locator, b: &Locator, shown: (&str, &str)) -> PlaycheckResult<()> {
    expect(a).to_have_text(shown.0).await?;
    expect(b).to_have_text(shown.1).await
}

async fn drag_page(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&role(page, "heading", "Drag and Drop")).to_be_visible().await?;
    let (a, b) = columns(page);
    expect(&a).to_be_visible().await?;
    expect(&b).to_be_visible().await
}

async fn drag_a_to_b(t: TestContext) -> PlaycheckResult<()> {
    let (a, b) = columns(t.page());
    expect_columns(&a, &b, ("A", "B")).await?;
    a.drag_to(&b).await?;
    expect_columns(&a, &b, ("B", "A")).await
}

async fn drag_b_to_a(t: TestContext) -> PlaycheckResult<()> {
    let (a, b) = columns(t.page());
    a.drag_to(&b).await?;
    b.drag_to(&a).await?;
    expect_columns(&a, &b, ("A", "B")).await
}

async fn drag_repeatedly(t: TestContext) -> PlaycheckResult<()> {
    let (a, b) = columns(t.page());
    for _ in 0..3 {
        a.drag_to(&b).await?;
        expect_columns(&a, &b, ("B", "A")).await?;
        b.drag_to(&a).await?;
        expect_columns(&a, &b, ("A", "B")).await?;
    }
    Ok(())
}

// ============================================================================
// Hovers
// ============================================================================

fn hovers() -> Suite {
    suite("interactions::hovers", "Hovers", "hovers")
        .scenario("should display hovers page", hovers_page)
        .scenario("should show caption on hover", caption_on_hover)
        .scenario("should hide caption when hover ends", caption_hides)
        .scenario("should handle multiple figure hovers", every_figure)
        .scenario("should have working profile links", profile_link)
}

async fn hovers_page(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&role(page, "heading", "Hovers")).to_be_visible().await?;
    expect(&page.locator(".figure")).to_have_count(3).await
}

async fn caption_on_hover(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    let caption = page.locator(".figcaption").first();
    expect(&caption).not().to_be_visible().await?;
    page.locator(".figure").first().hover().await?;
    expect(&caption).to_be_visible().await?;
    expect(&caption).to_contain_text("name: user1").await
}

async fn caption_hides(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    let caption = page.locator(".figcaption").first();
    page.locator(".figure").first().hover().await?;
    expect(&caption).to_be_visible().await?;
    page.locator("h3").hover().await?;
    expect(&caption).not().to_be_visible().await
}

async fn every_figure(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    let figures = page.locator(".figure");
    let captions = page.locator(".figcaption");
    let count = figures.count().await?;
    Assertion::equals(&3, &count).context("figures").check()?;
    for i in 0..count {
        let caption = captions.nth(i as i64);
        figures.nth(i as i64).hover().await?;
        expect(&caption).to_be_visible().await?;

        let text = caption.text_content().await?;
        Assertion::contains(&text, "name: user").check()?;
        Assertion::contains(&text, "View profile").check()?;

        page.locator("h3").hover().await?;
        expect(&caption).not().to_be_visible().await?;
    }
    Ok(())
}

async fn profile_link(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    page.locator(".figure").first().hover().await?;
    let link = page.locator(".figcaption a").first();
    expect(&link).to_be_visible().await?;
    link.click().await?;
    let url = page.url().await?;
    let site = t.site_url(Site::TheInternet, "");
    Assertion::is_true(
        url.starts_with(site.trim_end_matches('/')),
        "profile link left the site",
    )
    .context(&url)
    .check()
}

// ============================================================================
// Context menu
// ============================================================================

fn context_menu() -> Suite {
    suite("interactions::context_menu", "Context Menu", "context_menu")
        .scenario("should display context menu page", context_menu_page)
        .scenario("should show context menu on right click", right_click_alert)
        .scenario("should handle left click normally", left_click)
        .scenario("should have proper hotspot element", hotspot_geometry)
}

fn hot_spot(page: &Page) -> Locator {
    page.locator("#hot-spot")
}

async fn context_menu_page(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&role(page, "heading", "Context Menu")).to_be_visible().await?;
    expect(&hot_spot(page)).to_be_visible().await
}

async fn right_click_alert(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    page.on_dialog(|dialog| dialog.accept());
    hot_spot(page).click_with(&ClickOptions::right()).await?;
    let dialog = dialog_seen(page, CONTEXT_MENU_ALERT).await?;
    Assertion::is_true(dialog.is_handled(), "context menu alert was left open").check()
}

async fn left_click(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    hot_spot(page).click().await?;
    expect_page(page).to_have_url(UrlMatcher::regex("context_menu")?).await?;
    Assertion::is_true(page.dialogs().is_empty(), "left click raised a dialog").check()
}

async fn hotspot_geometry(t: TestContext) -> PlaycheckResult<()> {
    let spot = hot_spot(t.page());
    expect(&spot).to_be_visible().await?;
    expect(&spot).to_have_attribute("id", "hot-spot").await?;
    let bounds = spot.bounding_box().await?;
    Assertion::is_some(&bounds).context("hot spot bounding box").check()?;
    if let Some(bounds) = bounds {
        Assertion::greater_than(bounds.width, 0.0).context("width").check()?;
        Assertion::greater_than(bounds.height, 0.0).context("height").check()?;
    }
    Ok(())
}

// ============================================================================
// Key presses
// ============================================================================

fn key_presses() -> Suite {
    suite("interactions::key_presses", "Key Presses", "key_presses")
        .scenario("should display key presses page", key_presses_page)
        .scenario("should register key presses", |t| press_each(t, &["A"]))
        .scenario("should handle special keys", |t| {
            press_each(t, &["Enter", "Escape", "Backspace", "Tab", "Space"])
        })
        .scenario("should handle modifier keys", |t| press_each(t, &["Shift+A", "Control+A", "Alt+A"]))
        .scenario("should handle arrow keys", |t| {
            press_each(t, &["ArrowUp", "ArrowDown", "ArrowLeft", "ArrowRight"])
        })
        .scenario("should handle function keys", |t| press_each(t, &["F1", "F12"]))
        .scenario("should handle numpad keys", |t| press_each(t, &["Numpad0", "Numpad5", "NumpadAdd"]))
        .scenario("should maintain focus on target", target_keeps_focus)
}

async fn key_presses_page(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&role(page, "heading", "Key Presses")).to_be_visible().await?;
    expect(&page.get_by_text("Target")).to_be_visible().await?;
    expect(&page.locator("#target")).to_be_visible().await
}

/// Press each chord into `#target`, refocusing between presses
async fn press_each(t: TestContext, chords: &'static [&'static str]) -> PlaycheckResult<()> {
    let page = t.page();
    let target = page.locator("#target");
    let result = page.locator("#result");
    for chord in chords {
        target.click().await?;
        page.keyboard().press(chord).await?;
        expect(&result).to_contain_text(&key_press_result(chord)?).await?;
    }
    Ok(())
}

async fn target_keeps_focus(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    let target = page.locator("#target");
    target.click().await?;
    expect(&target).to_be_focused().await?;
    for key in ["A", "B"] {
        page.keyboard().press(key).await?;
        expect(&target).to_be_focused().await?;
    }
    Ok(())
}
