//! A/B testing, redirects, status codes, the entry ad and auth redirects.

use super::suite;
use crate::assertion::Assertion;
use crate::expect::{expect, expect_page};
use crate::harness::{Suite, TestContext};
use crate::locator::Locator;
use crate::matcher::UrlMatcher;
use crate::result::PlaycheckResult;
use crate::sampling::{SampleGoal, VariantSampler};
use crate::scenarios::{non_empty, role, sampled};
use crate::sites::the_internet::{status_code_path, AbVariant, FlashKind, TheInternet, STATUS_CODES};
use crate::sites::Site;
use crate::wait::LoadState;
use tracing::info;

/// Observation recorded when neither A/B heading is on the page
const UNCLASSIFIED: &str = "unclassified";

pub(super) fn suites() -> Vec<Suite> {
    vec![
        ab_testing(),
        redirect_link(),
        status_codes(),
        advert(),
        authentication_redirect(),
    ]
}

// ============================================================================
// A/B testing
// ============================================================================

fn ab_testing() -> Suite {
    suite("navigation::ab_testing", "A/B Testing", "abtest")
        .scenario("should display A/B testing page", ab_page)
        .with_scenario(sampled("should show different content on page refresh", ab_variants))
        .scenario("should have proper page structure", ab_structure)
}

async fn ab_page(t: TestContext) -> PlaycheckResult<()> {
    let site = TheInternet::for_test(&t);
    let variant = site.ab_variant().await?;
    Assertion::is_some(&variant).context("A/B heading").check()?;
    expect(&site.page().locator("h3")).to_contain_text("A/B Test").await
}

/// The server picks a variant per load; either may repeat, so only an
/// unrecognised page fails
async fn ab_variants(t: TestContext) -> PlaycheckResult<()> {
    let site = TheInternet::for_test(&t);
    let report = VariantSampler::new(11)
        .until(SampleGoal::AnyChange)
        .with_load_state(LoadState::NetworkIdle)
        .sample_reloads(site.page(), || {
            let site = site.clone();
            async move {
                Ok(site
                    .ab_variant()
                    .await?
                    .map_or(UNCLASSIFIED, AbVariant::label)
                    .to_string())
            }
        })
        .await?;
    info!(
        control = report.count_of(AbVariant::Control.label()),
        variation = report.count_of(AbVariant::Variation.label()),
        changed = report.goal_met,
        "A/B variants sampled"
    );
    Assertion::is_true(
        report.all_within(&[AbVariant::Control.label(), AbVariant::Variation.label()]),
        "page showed neither A/B variant",
    )
    .context(&report.distribution())
    .check()
}

async fn ab_structure(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&page.locator("h3")).to_be_visible().await?;
    non_empty("paragraphs", page.locator("p").count().await?)
}

// ============================================================================
// Redirect link
// ============================================================================

fn redirect_link() -> Suite {
    suite("navigation::redirect_link", "Redirect Link", "redirector")
        .scenario("should display redirector page", redirector_page)
        .scenario("should redirect to status codes page", follow_redirect)
        .scenario("should handle redirect properly", redirect_lands_exactly)
        .scenario("should show status codes after redirect", codes_after_redirect)
}

async fn redirector_page(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&page.get_by_text("Redirect Link Page")).to_be_visible().await?;
    expect(&role(page, "link", "here")).to_be_visible().await
}

async fn follow_redirect(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    role(page, "link", "here").click().await?;
    expect_page(page).to_have_url(UrlMatcher::regex("status_codes")?).await?;
    expect(&role(page, "heading", "Status Codes")).to_be_visible().await
}

async fn redirect_lands_exactly(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    let target = t.site_url(Site::TheInternet, "status_codes");
    role(page, "link", "here").click().await?;
    page.wait_for_url(target.as_str()).await?;
    expect_page(page).to_have_url(target.as_str()).await?;
    expect(&role(page, "heading", "Status Codes")).to_be_visible().await
}

async fn codes_after_redirect(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    role(page, "link", "here").click().await?;
    for code in STATUS_CODES {
        expect(&role(page, "link", &code.to_string())).to_be_visible().await?;
    }
    Ok(())
}

// ============================================================================
// Status codes
// ============================================================================

fn status_codes() -> Suite {
    suite("navigation::status_codes", "Status Codes", "status_codes")
        .scenario("should display status codes page", status_codes_page)
        .scenario("should handle 200 status code", |t| status_code(t, 200))
        .scenario("should handle 301 status code", |t| status_code(t, 301))
        .scenario("should handle 404 status code", |t| status_code(t, 404))
        .scenario("should handle 500 status code", |t| status_code(t, 500))
        .scenario("should navigate through status code links", every_status_link)
        .scenario("should have proper link structure", status_link_structure)
}

async fn status_codes_page(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&role(page, "heading", "Status Codes")).to_be_visible().await?;
    expect(&page.get_by_text("Each link below displays a different HTTP status code"))
        .to_be_visible()
        .await
}

async fn status_code(t: TestContext, code: u16) -> PlaycheckResult<()> {
    let response = t.goto(Site::TheInternet, &status_code_path(code)).await?;
    Assertion::equals(&code, &response.status()).context(response.url()).check()?;
    let page = t.page();
    expect(&role(page, "heading", "Status Codes")).to_be_visible().await?;
    expect(&page.get_by_text(&format!("This page returned a {code} status code")))
        .to_be_visible()
        .await
}

async fn every_status_link(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    let links = page.locator("a[href*=\"status_codes/\"]");
    let mut paths = Vec::new();
    for i in 0..links.count().await? {
        if let Some(href) = links.nth(i as i64).get_attribute("href").await? {
            paths.push(href);
        }
    }
    non_empty("status code links", paths.len())?;
    for path in paths {
        let response = t.goto(Site::TheInternet, &path).await?;
        Assertion::in_range(response.status(), 200, 599).context(&path).check()?;
        expect(&page.get_by_text("This page returned a")).to_be_visible().await?;
    }
    Ok(())
}

async fn status_link_structure(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    for code in STATUS_CODES {
        let link = page.locator(&format!("a[href*=\"status_codes/{code}\"]"));
        expect(&link).to_be_visible().await?;
        expect(&link).to_contain_text(&code.to_string()).await?;
    }
    Ok(())
}

// ============================================================================
// Advert
// ============================================================================

fn advert() -> Suite {
    suite("navigation::advert", "Advert", "entry_ad")
        .scenario("should display advert page", advert_page)
        .scenario("should handle ad rotation", advert_reload)
        .scenario("should have ad container", advert_container)
}

fn modal(t: &TestContext) -> Locator {
    t.page().locator("#modal")
}

async fn advert_page(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&role(page, "heading", "Entry Ad")).to_be_visible().await?;
    expect(&modal(&t)).to_be_attached().await
}

async fn advert_reload(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&modal(&t)).to_be_attached().await?;
    page.reload().await?;
    page.wait_for_load_state(LoadState::NetworkIdle).await?;
    expect(&modal(&t)).to_be_attached().await
}

async fn advert_container(t: TestContext) -> PlaycheckResult<()> {
    let modal = modal(&t);
    expect(&modal).to_be_visible().await?;
    expect(&modal.locator(".modal-title")).to_contain_text("This is a modal window").await?;
    non_empty("modal content", modal.locator("*").count().await?)?;
    modal.locator(".modal-footer p").click().await?;
    expect(&modal).not().to_be_visible().await
}

// ============================================================================
// Authentication redirect
// ============================================================================

fn authentication_redirect() -> Suite {
    suite("navigation::authentication_redirect", "Authentication Redirect", "redirect")
        .scenario("should display redirect page", redirect_page)
        .scenario("should redirect to login page", redirect_to_login)
        .scenario("should show login form after redirect", login_form_after_redirect)
}

async fn redirect_page(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&page.get_by_text("Redirection").first()).to_be_visible().await?;
    expect(&role(page, "link", "here")).to_be_visible().await
}

/// The secure area bounces anonymous visitors to the login form
async fn redirect_to_login(t: TestContext) -> PlaycheckResult<()> {
    let site = TheInternet::for_test(&t);
    let page = site.page();
    site.open("secure").await?;
    expect_page(page).to_have_url(UrlMatcher::regex("/login$")?).await?;
    expect(&role(page, "heading", "Login Page")).to_be_visible().await?;
    expect(&site.flash_of(FlashKind::Error))
        .to_contain_text("You must login to view the secure area!")
        .await
}

async fn login_form_after_redirect(t: TestContext) -> PlaycheckResult<()> {
    let site = TheInternet::for_test(&t);
    site.open("secure").await?;
    expect(&site.username()).to_be_visible().await?;
    expect(&site.password()).to_be_visible().await?;
    expect(&site.login_button()).to_be_visible().await
}
