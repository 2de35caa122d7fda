//! Geolocation, JavaScript dialogs, typos, notifications and the challenging DOM.

use std::time::Duration;

use super::suite;
use crate::assertion::Assertion;
use crate::context::{Geolocation, Permission};
use crate::dialog::DialogType;
use crate::expect::expect;
use crate::harness::{Suite, TestContext};
use crate::locator::Locator;
use crate::page::Page;
use crate::result::PlaycheckResult;
use crate::sampling::{SampleGoal, VariantSampler};
use crate::scenarios::{dialog_seen, non_empty, role, sampled, SETTLE};
use crate::sites::the_internet::{TheInternet, NOTIFICATION_MESSAGES};
use crate::sites::Site;
use crate::wait::LoadState;
use tracing::info;

/// Trafalgar Square
const LONDON: Geolocation = Geolocation::new(51.507_351, -0.127_758);

const TYPOS: [&str; 8] = [
    "commited",
    "occured",
    "recieve",
    "seperate",
    "definately",
    "accomodate",
    "begining",
    "existance",
];

pub(super) fn suites() -> Vec<Suite> {
    vec![
        geolocation(),
        javascript_alerts(),
        typos(),
        notification_messages(),
        challenging_dom(),
    ]
}

// ============================================================================
// Geolocation
// ============================================================================

fn geolocation() -> Suite {
    suite("miscellaneous::geolocation", "Geolocation", "geolocation")
        .scenario("should display geolocation page", geolocation_page)
        .scenario("should request geolocation", geolocation_granted)
        .scenario("should handle geolocation denial", geolocation_denied)
}

fn where_am_i(page: &Page) -> Locator {
    role(page, "button", "Where am I?")
}

async fn geolocation_page(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&role(page, "heading", "Geolocation")).to_be_visible().await?;
    expect(&where_am_i(page)).to_be_visible().await
}

async fn geolocation_granted(t: TestContext) -> PlaycheckResult<()> {
    let origin = t.site_url(Site::TheInternet, "");
    t.context()
        .grant_permissions(&[Permission::Geolocation], Some(origin.trim_end_matches('/')))
        .await?;
    t.context().set_geolocation(LONDON).await?;

    let page = t.page();
    where_am_i(page).click().await?;
    let latitude = page.locator("#lat-value");
    let longitude = page.locator("#long-value");
    expect(&latitude).to_have_text("51.507351").await?;
    expect(&longitude).to_have_text("-0.127758").await
}

/// Without the permission the page shows no coordinates
async fn geolocation_denied(t: TestContext) -> PlaycheckResult<()> {
    t.context().clear_permissions().await?;
    let page = t.page();
    where_am_i(page).click().await?;
    page.wait_for_timeout(2000).await;
    expect(&page.locator("#lat-value")).not().to_be_visible().await?;
    let error = page.locator(".error");
    if error.count().await? > 0 {
        expect(&error).to_be_visible().await?;
    }
    Ok(())
}

// ============================================================================
// JavaScript alerts
// ============================================================================

fn javascript_alerts() -> Suite {
    suite("miscellaneous::javascript_alerts", "JavaScript Alerts", "javascript_alerts")
        .scenario("should display JavaScript alerts page", alerts_page)
        .scenario("should handle JavaScript alert", js_alert)
        .scenario("should handle JavaScript confirm", |t| js_confirm(t, true))
        .scenario("should handle JavaScript confirm cancel", |t| js_confirm(t, false))
        .scenario("should handle JavaScript prompt", |t| js_prompt(t, Some("Test input")))
        .scenario("should handle JavaScript prompt cancel", |t| js_prompt(t, None))
}

async fn alerts_page(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&role(page, "heading", "JavaScript Alerts")).to_be_visible().await?;
    for button in ["Click for JS Alert", "Click for JS Confirm", "Click for JS Prompt"] {
        expect(&role(page, "button", button)).to_be_visible().await?;
    }
    Ok(())
}

/// Click `button`, check the dialog it raised and the result line
async fn raise_dialog(page: &Page, button: &str, message: &str, kind: DialogType, result: &str) -> PlaycheckResult<()> {
    role(page, "button", button).click().await?;
    let dialog = dialog_seen(page, message).await?;
    Assertion::equals(&kind, &dialog.dialog_type()).context(message).check()?;
    expect(&page.locator("#result")).to_have_text(result).await
}

async fn js_alert(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    page.on_dialog(|dialog| dialog.accept());
    raise_dialog(
        page,
        "Click for JS Alert",
        "I am a JS Alert",
        DialogType::Alert,
        "You successfully clicked an alert",
    )
    .await
}

async fn js_confirm(t: TestContext, accept: bool) -> PlaycheckResult<()> {
    let page = t.page();
    page.on_dialog(move |dialog| if accept { dialog.accept() } else { dialog.dismiss() });
    let result = if accept { "You clicked: Ok" } else { "You clicked: Cancel" };
    raise_dialog(page, "Click for JS Confirm", "I am a JS Confirm", DialogType::Confirm, result).await
}

async fn js_prompt(t: TestContext, answer: Option<&'static str>) -> PlaycheckResult<()> {
    let page = t.page();
    page.on_dialog(move |dialog| match answer {
        Some(text) => dialog.accept_with(text),
        None => dialog.dismiss(),
    });
    let result = format!("You entered: {}", answer.unwrap_or("null"));
    raise_dialog(page, "Click for JS Prompt", "I am a JS prompt", DialogType::Prompt, &result).await
}

// ============================================================================
// Typos
// ============================================================================

fn typos() -> Suite {
    suite("miscellaneous::typos", "Typos", "typos")
        .scenario("should display typos page", typos_page)
        .scenario("should find typos in content", find_typos)
        .scenario("should handle page refresh", typos_reload)
}

async fn typos_page(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&role(page, "heading", "Typos")).to_be_visible().await?;
    expect(&page.get_by_text(
        "This example demonstrates a typo being introduced in the page content.",
    ))
    .to_be_visible()
    .await
}

/// The page introduces typos on purpose; found ones are reported, not failed
async fn find_typos(t: TestContext) -> PlaycheckResult<()> {
    let content = t.page().locator("body").text_content().await?.to_lowercase();
    let found: Vec<&str> = TYPOS.iter().copied().filter(|typo| content.contains(typo)).collect();
    if !found.is_empty() {
        info!(typos = ?found, "typos found on the page");
    }
    non_empty("body text length", content.len())
}

async fn typos_reload(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    let paragraph = page.locator("p").first();
    let before = paragraph.text_content().await?;
    page.reload().await?;
    let after = paragraph.text_content().await?;
    Assertion::is_false(before.trim().is_empty(), "paragraph empty before reload").check()?;
    Assertion::is_false(after.trim().is_empty(), "paragraph empty after reload").check()
}

// ============================================================================
// Notification messages
// ============================================================================

fn notification_messages() -> Suite {
    suite(
        "miscellaneous::notification_messages",
        "Notification Messages",
        "notification_message",
    )
    .scenario("should display notification messages page", notifications_page)
    .scenario("should show notification on click", notification_on_click)
    .with_scenario(sampled("should show different notifications", notifications_vary))
    .scenario("should allow closing notifications", close_notification)
}

fn click_here(page: &Page) -> Locator {
    role(page, "link", "Click here")
}

async fn notifications_page(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&role(page, "heading", "Notification Message")).to_be_visible().await?;
    expect(&click_here(page)).to_be_visible().await
}

async fn notification_on_click(t: TestContext) -> PlaycheckResult<()> {
    let site = TheInternet::for_test(&t);
    click_here(site.page()).click().await?;
    expect(&site.flash()).to_be_visible().await?;
    let message = site.notification().await?.unwrap_or_default();
    Assertion::is_false(message.is_empty(), "notification is empty").check()
}

/// Each click loads a random message; collect until both have shown up
async fn notifications_vary(t: TestContext) -> PlaycheckResult<()> {
    let site = TheInternet::for_test(&t);
    let report = VariantSampler::new(8)
        .with_pause(SETTLE)
        .until(SampleGoal::DistinctCount(2))
        .run(|_| {
            let site = site.clone();
            async move {
                click_here(site.page()).click().await?;
                site.page().wait_for_load_state(LoadState::Load).await?;
                Ok(site.notification().await?.unwrap_or_default())
            }
        })
        .await?;
    info!(distribution = %report.distribution(), "notifications received");
    non_empty("notifications", report.observations.len())?;
    Assertion::is_true(
        report.all_within(&NOTIFICATION_MESSAGES),
        "unexpected notification message",
    )
    .context(&report.distribution())
    .check()
}

async fn close_notification(t: TestContext) -> PlaycheckResult<()> {
    let site = TheInternet::for_test(&t);
    let page = site.page();
    click_here(page).click().await?;
    page.wait_for_load_state(LoadState::NetworkIdle).await?;
    let flash = site.flash();
    expect(&flash).to_be_visible().await?;
    flash.locator("a").click().await?;
    expect(&flash)
        .with_timeout(Duration::from_secs(2))
        .not()
        .to_be_visible()
        .await
}

// ============================================================================
// Challenging DOM
// ============================================================================

fn challenging_dom() -> Suite {
    suite("miscellaneous::challenging_dom", "Challenging DOM", "challenging_dom")
        .scenario("should display challenging DOM page", challenging_page)
        .scenario("should handle dynamic buttons", dynamic_buttons)
        .scenario("should handle dynamic table", dynamic_table)
        .scenario("should handle canvas element", canvas)
        .scenario("should handle dynamic content changes", button_relabel)
}

async fn challenging_page(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&role(page, "heading", "Challenging DOM")).to_be_visible().await?;
    expect(&page.locator(".large-10").first()).to_be_visible().await
}

async fn dynamic_buttons(t: TestContext) -> PlaycheckResult<()> {
    let buttons = t.page().locator("a.button");
    expect(&buttons).to_have_count(3).await?;
    for text in buttons.all_text_contents().await? {
        Assertion::is_false(text.trim().is_empty(), "button has no label").check()?;
    }
    Ok(())
}

async fn dynamic_table(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    let table = page.locator(".large-10 table");
    expect(&table).to_be_visible().await?;
    non_empty("table rows", table.locator("tbody tr").count().await?)?;
    non_empty("edit links", page.locator("a[href=\"#edit\"]").count().await?)?;
    non_empty("delete links", page.locator("a[href=\"#delete\"]").count().await?)
}

async fn canvas(t: TestContext) -> PlaycheckResult<()> {
    let canvas = t.page().locator("#canvas");
    if canvas.count().await? > 0 {
        expect(&canvas).to_be_visible().await?;
    }
    Ok(())
}

/// Clicking any button reloads the page with new labels; the count stays
async fn button_relabel(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    let buttons = page.locator(".large-10 .button");
    let before = buttons.all_text_contents().await?;
    buttons.first().click().await?;
    page.wait_for_load_state(LoadState::Load).await?;
    let after = buttons.all_text_contents().await?;
    info!(?before, ?after, "button labels");
    Assertion::equals(&before.len(), &after.len()).context("button count").check()
}
