//! Form login, basic and digest auth, forgot password.

use super::suite;
use crate::assertion::Assertion;
use crate::context::ContextOptions;
use crate::expect::{expect, expect_page};
use crate::harness::{Suite, TestContext};
use crate::result::{PlaycheckError, PlaycheckResult};
use crate::scenarios::role;
use crate::sites::the_internet::{Credentials, FlashKind, TheInternet};
use crate::sites::Site;

pub(super) fn suites() -> Vec<Suite> {
    vec![form_authentication(), basic_auth(), digest_auth(), forgot_password()]
}

// ============================================================================
// Form authentication
// ============================================================================

fn form_authentication() -> Suite {
    suite("auth::form_authentication", "Form Authentication", "login")
        .scenario("should display login page with correct elements", login_page_elements)
        .scenario("should show error message with invalid credentials", invalid_username)
        .scenario("should show error message with invalid password", invalid_password)
        .scenario("should login successfully with valid credentials", valid_login)
        .scenario("should logout successfully", logout)
        .scenario("should close flash message", close_flash)
}

async fn login_page_elements(t: TestContext) -> PlaycheckResult<()> {
    let site = TheInternet::for_test(&t);
    let page = site.page();
    expect(&role(page, "heading", "Login Page")).to_be_visible().await?;
    expect(&site.username()).to_be_visible().await?;
    expect(&site.password()).to_be_visible().await?;
    expect(&site.login_button()).to_be_visible().await?;
    expect(&page.get_by_text(Credentials::FORM.username)).to_be_visible().await?;
    expect(&page.get_by_text(Credentials::FORM.password)).to_be_visible().await
}

async fn invalid_username(t: TestContext) -> PlaycheckResult<()> {
    let site = TheInternet::for_test(&t);
    site.login_form("invaliduser", "invalidpass").await?;
    expect(&site.page().get_by_text("Your username is invalid!")).to_be_visible().await?;
    expect(&site.flash_of(FlashKind::Error)).to_be_visible().await?;
    expect_page(site.page()).to_have_url(site.url("login")).await
}

async fn invalid_password(t: TestContext) -> PlaycheckResult<()> {
    let site = TheInternet::for_test(&t);
    site.login_form(Credentials::FORM.username, "wrongpassword").await?;
    expect(&site.page().get_by_text("Your password is invalid!")).to_be_visible().await?;
    expect(&site.flash_of(FlashKind::Error)).to_be_visible().await?;
    expect_page(site.page()).to_have_url(site.url("login")).await
}

async fn valid_login(t: TestContext) -> PlaycheckResult<()> {
    let site = TheInternet::for_test(&t);
    let page = site.page();
    site.login_form(Credentials::FORM.username, Credentials::FORM.password).await?;
    expect(&page.get_by_text("You logged into a secure area!")).to_be_visible().await?;
    expect(&site.flash_of(FlashKind::Success)).to_be_visible().await?;
    expect_page(page).to_have_url(site.url("secure")).await?;
    expect(&role(page, "heading", "Secure Area")).to_be_visible().await?;
    expect(&role(page, "link", "Logout")).to_be_visible().await
}

async fn logout(t: TestContext) -> PlaycheckResult<()> {
    let site = TheInternet::for_test(&t);
    let page = site.page();
    site.login_form(Credentials::FORM.username, Credentials::FORM.password).await?;
    role(page, "link", "Logout").click().await?;
    expect(&page.get_by_text("You logged out of the secure area!")).to_be_visible().await?;
    expect(&site.flash_of(FlashKind::Success)).to_be_visible().await?;
    expect_page(page).to_have_url(site.url("login")).await?;
    expect(&role(page, "heading", "Login Page")).to_be_visible().await
}

async fn close_flash(t: TestContext) -> PlaycheckResult<()> {
    let site = TheInternet::for_test(&t);
    let page = site.page();
    site.login_form("invaliduser", "invalidpass").await?;
    let message = page.get_by_text("Your username is invalid!");
    expect(&message).to_be_visible().await?;
    site.flash().locator("a.close").click().await?;
    expect(&message).not().to_be_visible().await
}

// ============================================================================
// Basic and digest auth
// ============================================================================

/// Open `path` in a fresh context carrying `credentials` and return the status
async fn status_with_credentials(t: &TestContext, path: &str, username: &str, password: &str) -> PlaycheckResult<u16> {
    let context = t
        .browser()
        .new_context(ContextOptions::new().with_http_credentials(username, password))
        .await?;
    let page = context.new_page().await?;
    let outcome = async {
        let response = page.goto(&t.site_url(Site::TheInternet, path)).await?;
        if response.ok() {
            expect(&page.get_by_text("Congratulations! You must have the proper credentials."))
                .to_be_visible()
                .await?;
        }
        Ok::<_, PlaycheckError>(response.status())
    }
    .await;
    page.close().await?;
    context.close().await?;
    outcome
}

async fn expect_unauthorized(t: &TestContext, path: &str) -> PlaycheckResult<()> {
    let response = t.goto(Site::TheInternet, path).await?;
    Assertion::equals(&401, &response.status()).context(path).check()
}

fn basic_auth() -> Suite {
    Suite::new("the_internet::auth::basic_auth", "Basic Auth")
        .with_tag("the_internet")
        .scenario("should fail without credentials", basic_without_credentials)
        .scenario("should succeed with correct credentials", basic_with_credentials)
        .scenario("should fail with incorrect credentials", basic_wrong_credentials)
}

async fn basic_without_credentials(t: TestContext) -> PlaycheckResult<()> {
    expect_unauthorized(&t, "basic_auth").await
}

async fn basic_with_credentials(t: TestContext) -> PlaycheckResult<()> {
    let status = status_with_credentials(&t, "basic_auth", Credentials::HTTP.username, Credentials::HTTP.password).await?;
    Assertion::equals(&200, &status).context("basic_auth").check()
}

async fn basic_wrong_credentials(t: TestContext) -> PlaycheckResult<()> {
    let status = status_with_credentials(&t, "basic_auth", Credentials::HTTP.username, "wrong").await?;
    Assertion::equals(&401, &status).context("basic_auth").check()
}

fn digest_auth() -> Suite {
    Suite::new("the_internet::auth::digest_auth", "Digest Authentication")
        .with_tag("the_internet")
        .scenario("should succeed with correct credentials", digest_with_credentials)
        .scenario("should fail with incorrect credentials", digest_without_credentials)
}

async fn digest_with_credentials(t: TestContext) -> PlaycheckResult<()> {
    let status = status_with_credentials(&t, "digest_auth", Credentials::HTTP.username, Credentials::HTTP.password).await?;
    Assertion::equals(&200, &status).context("digest_auth").check()
}

async fn digest_without_credentials(t: TestContext) -> PlaycheckResult<()> {
    expect_unauthorized(&t, "digest_auth").await
}

// ============================================================================
// Forgot password
// ============================================================================

fn forgot_password() -> Suite {
    suite("auth::forgot_password", "Forgot Password", "forgot_password")
        .scenario("should display forgot password form", forgot_password_form)
        .scenario("should submit email for password recovery", forgot_password_submit)
        .scenario("should show error with empty email", forgot_password_empty)
}

async fn forgot_password_form(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&role(page, "heading", "Forgot Password")).to_be_visible().await?;
    expect(&role(page, "textbox", "E-mail")).to_be_visible().await?;
    expect(&role(page, "button", "Retrieve password")).to_be_visible().await
}

async fn forgot_password_submit(t: TestContext) -> PlaycheckResult<()> {
    let site = TheInternet::for_test(&t);
    let page = site.page();
    role(page, "textbox", "E-mail").fill("test@example.com").await?;
    role(page, "button", "Retrieve password").click().await?;
    expect(&page.get_by_text("Your e-mail has been sent!")).to_be_visible().await?;
    expect(&site.flash_of(FlashKind::Success)).to_be_visible().await
}

async fn forgot_password_empty(t: TestContext) -> PlaycheckResult<()> {
    let site = TheInternet::for_test(&t);
    role(site.page(), "button", "Retrieve password").click().await?;
    expect(&site.flash_of(FlashKind::Error)).to_be_visible().await
}
