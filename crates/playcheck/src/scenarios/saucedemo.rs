//! SauceDemo suites: login, inventory, cart and checkout.

use crate::assertion::Assertion;
use crate::expect::{expect, expect_page};
use crate::harness::{Suite, TestContext};
use crate::matcher::UrlMatcher;
use crate::result::PlaycheckResult;
use crate::scenarios::role;
use crate::selector::RoleOptions;
use crate::sites::saucedemo::{CheckoutInfo, SauceDemo, SortOrder, User, PRODUCTS};
use crate::sites::Site;
use crate::wait::LoadState;

/// Items used by the cart and checkout scenarios
const CART_ITEMS: [&str; 2] = [PRODUCTS[0], PRODUCTS[1]];

/// All SauceDemo suites
#[must_use]
pub fn suites() -> Vec<Suite> {
    vec![login(), inventory(), cart_checkout()]
}

// ============================================================================
// Authentication
// ============================================================================

fn login() -> Suite {
    Suite::new("saucedemo::login", "SauceDemo Authentication")
        .with_tag("saucedemo")
        .start_at(Site::SauceDemo, "")
        .scenario("should display login form elements", login_form_elements)
        .scenario("should login successfully with standard user", login_standard)
        .scenario("should logout successfully", logout)
        .scenario("should show error for locked out user", locked_out_user)
        .scenario("should show error for missing username", missing_username)
        .scenario("should show error for missing password", missing_password)
        .scenario("should show error for wrong credentials", wrong_credentials)
        .scenario("should allow closing error message", close_error)
        .scenario("should toggle password visibility help text", password_help_text)
        .scenario("problem user should still login but have visual issues", problem_user)
        .scenario("performance glitch user should login with potential delay", performance_glitch_user)
}

async fn login_form_elements(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&page.locator(".login_logo")).to_have_text("Swag Labs").await?;
    expect(&page.get_by_placeholder("Username")).to_be_visible().await?;
    expect(&page.get_by_placeholder("Password")).to_be_visible().await?;
    expect(&role(page, "button", "Login")).to_be_visible().await?;
    expect(&page.locator(".login_credentials"))
        .to_contain_text("Accepted usernames")
        .await
}

async fn login_standard(t: TestContext) -> PlaycheckResult<()> {
    let shop = SauceDemo::for_test(&t);
    shop.login(User::STANDARD).await?;
    shop.expect_on_inventory_page().await
}

async fn logout(t: TestContext) -> PlaycheckResult<()> {
    let shop = SauceDemo::for_test(&t);
    let page = shop.page();
    shop.login(User::STANDARD).await?;
    page.locator("#react-burger-menu-btn").click().await?;
    page.locator("#logout_sidebar_link").click().await?;
    expect_page(page).to_have_url(shop.base_url()).await?;
    expect(&role(page, "button", "Login")).to_be_visible().await
}

async fn locked_out_user(t: TestContext) -> PlaycheckResult<()> {
    let shop = SauceDemo::for_test(&t);
    shop.login(User::LOCKED_OUT).await?;
    expect(&shop.error()).to_contain_text("locked out").await?;
    expect_page(shop.page()).to_have_url(shop.base_url()).await
}

async fn missing_username(t: TestContext) -> PlaycheckResult<()> {
    let shop = SauceDemo::for_test(&t);
    shop.test_id("password").fill(User::STANDARD.password).await?;
    shop.test_id("login-button").click().await?;
    expect(&shop.error())
        .to_have_text("Epic sadface: Username is required")
        .await
}

async fn missing_password(t: TestContext) -> PlaycheckResult<()> {
    let shop = SauceDemo::for_test(&t);
    shop.test_id("username").fill(User::STANDARD.username).await?;
    shop.test_id("login-button").click().await?;
    expect(&shop.error())
        .to_have_text("Epic sadface: Password is required")
        .await
}

async fn wrong_credentials(t: TestContext) -> PlaycheckResult<()> {
    let shop = SauceDemo::for_test(&t);
    shop.test_id("username").fill("standard_user").await?;
    shop.test_id("password").fill("wrong_password").await?;
    shop.test_id("login-button").click().await?;
    expect(&shop.error())
        .to_have_text("Epic sadface: Username and password do not match any user in this service")
        .await
}

async fn close_error(t: TestContext) -> PlaycheckResult<()> {
    let shop = SauceDemo::for_test(&t);
    shop.test_id("login-button").click().await?;
    let error = shop.error();
    expect(&error).to_be_visible().await?;
    error.locator("button.error-button").click().await?;
    expect(&error).to_be_hidden().await
}

async fn password_help_text(t: TestContext) -> PlaycheckResult<()> {
    let shop = SauceDemo::for_test(&t);
    expect(&shop.test_id("password"))
        .to_have_attribute("type", "password")
        .await?;
    expect(&shop.page().locator(".login_password"))
        .to_contain_text("Password for all users")
        .await
}

async fn problem_user(t: TestContext) -> PlaycheckResult<()> {
    let shop = SauceDemo::for_test(&t);
    shop.login(User::PROBLEM).await?;
    shop.expect_on_inventory_page().await?;
    expect(&shop.page().locator(".inventory_item_img img").first())
        .to_be_visible()
        .await
}

async fn performance_glitch_user(t: TestContext) -> PlaycheckResult<()> {
    let shop = SauceDemo::for_test(&t);
    shop.login(User::PERFORMANCE_GLITCH).await?;
    shop.expect_on_inventory_page().await
}

// ============================================================================
// Inventory
// ============================================================================

async fn login_to_inventory(t: TestContext) -> PlaycheckResult<()> {
    let shop = SauceDemo::for_test(&t);
    shop.login(User::STANDARD).await?;
    shop.expect_on_inventory_page().await
}

async fn login_only(t: TestContext) -> PlaycheckResult<()> {
    SauceDemo::for_test(&t).login(User::STANDARD).await
}

async fn reset_state(t: TestContext) -> PlaycheckResult<()> {
    SauceDemo::for_test(&t).reset_app_state().await
}

fn inventory() -> Suite {
    Suite::new("saucedemo::inventory", "SauceDemo Inventory")
        .with_tag("saucedemo")
        .before_each(login_to_inventory)
        .after_each(reset_state)
        .scenario("should list all catalog items with prices and descriptions", catalog_items)
        .scenario("should add and remove item from cart badge", add_remove_badge)
        .scenario("should open product details and add to cart from detail view", product_details)
        .scenario("should support sorting products", sorting)
        .scenario("should open menu links", menu_links)
}

async fn catalog_items(t: TestContext) -> PlaycheckResult<()> {
    let shop = SauceDemo::for_test(&t);
    let items = shop.page().locator(".inventory_item");
    expect(&items).to_have_count(PRODUCTS.len()).await?;
    for product in &PRODUCTS[..3] {
        let card = items.filter_has_text(product);
        expect(&card.locator(".inventory_item_desc")).to_be_visible().await?;
        expect(&card.locator(".inventory_item_price")).to_be_visible().await?;
        expect(&card.get_by_role("button", RoleOptions::default())).to_be_visible().await?;
    }
    Ok(())
}

async fn add_remove_badge(t: TestContext) -> PlaycheckResult<()> {
    let shop = SauceDemo::for_test(&t);
    shop.add_item_to_cart_by_name(PRODUCTS[0]).await?;
    expect(&shop.cart_badge()).to_have_text("1").await?;
    shop.item_card(PRODUCTS[0])
        .get_by_role("button", RoleOptions::default().name("Remove"))
        .click()
        .await?;
    expect(&shop.cart_badge()).to_have_count(0).await
}

async fn product_details(t: TestContext) -> PlaycheckResult<()> {
    let shop = SauceDemo::for_test(&t);
    let page = shop.page();
    shop.item_card(PRODUCTS[1])
        .locator(".inventory_item_name")
        .click()
        .await?;
    page.wait_for_url(UrlMatcher::regex(r"inventory-item\.html")?).await?;
    expect(&page.locator(".inventory_details_name"))
        .to_have_text(PRODUCTS[1])
        .await?;
    role(page, "button", "Add to cart").click().await?;
    expect(&shop.cart_badge()).to_have_text("1").await?;
    role(page, "button", "Back to products").click().await?;
    shop.expect_on_inventory_page().await
}

async fn sorting(t: TestContext) -> PlaycheckResult<()> {
    let shop = SauceDemo::for_test(&t);
    for order in [SortOrder::NameDesc, SortOrder::PriceAsc, SortOrder::PriceDesc, SortOrder::NameAsc] {
        shop.sort_by(order).await?;
        shop.expect_sorted(order).await?;
    }
    Ok(())
}

async fn menu_links(t: TestContext) -> PlaycheckResult<()> {
    let shop = SauceDemo::for_test(&t);
    let page = shop.page();
    page.locator("#react-burger-menu-btn").click().await?;
    for link in [
        "#inventory_sidebar_link",
        "#about_sidebar_link",
        "#logout_sidebar_link",
        "#reset_sidebar_link",
    ] {
        expect(&page.locator(link)).to_be_visible().await?;
    }
    page.locator("#about_sidebar_link").click().await?;
    page.wait_for_load_state(LoadState::DomContentLoaded).await?;
    expect_page(page).to_have_url(UrlMatcher::regex(r"saucelabs\.com")?).await?;
    page.go_back().await?;
    shop.expect_on_inventory_page().await
}

// ============================================================================
// Cart and checkout
// ============================================================================

fn cart_checkout() -> Suite {
    Suite::new("saucedemo::cart_checkout", "SauceDemo Cart & Checkout")
        .with_tag("saucedemo")
        .before_each(login_only)
        .after_each(reset_state)
        .scenario("should add multiple items to cart and update badge", multiple_items)
        .scenario("should require customer information before checkout", checkout_validation)
        .scenario("should complete checkout successfully", complete_checkout)
        .scenario("should allow cancelling checkout and returning to cart", cancel_step_two)
        .scenario("should allow cancelling during checkout step one", cancel_step_one)
        .scenario("should empty the cart item by item", empty_cart)
}

async fn add_cart_items(shop: &SauceDemo, items: &[&str]) -> PlaycheckResult<()> {
    for item in items {
        shop.add_item_to_cart_by_name(item).await?;
    }
    Ok(())
}

async fn multiple_items(t: TestContext) -> PlaycheckResult<()> {
    let shop = SauceDemo::for_test(&t);
    let page = shop.page();
    add_cart_items(&shop, &CART_ITEMS).await?;
    expect(&shop.cart_badge())
        .to_have_text(CART_ITEMS.len().to_string())
        .await?;

    shop.open_cart().await?;
    let cart_items = page.locator(".cart_item");
    expect(&cart_items).to_have_count(CART_ITEMS.len()).await?;
    cart_items
        .first()
        .get_by_role("button", RoleOptions::default().name("Remove"))
        .click()
        .await?;
    expect(&cart_items).to_have_count(CART_ITEMS.len() - 1).await?;

    shop.test_id("continue-shopping").click().await?;
    expect_page(page).to_have_url(UrlMatcher::regex("inventory.html")?).await
}

async fn checkout_validation(t: TestContext) -> PlaycheckResult<()> {
    let shop = SauceDemo::for_test(&t);
    let customer = CheckoutInfo::default();
    shop.add_item_to_cart_by_name(CART_ITEMS[0]).await?;
    shop.go_to_checkout().await?;

    shop.test_id("continue").click().await?;
    expect(&shop.error()).to_have_text("Error: First Name is required").await?;

    shop.test_id("firstName").fill(&customer.first_name).await?;
    shop.test_id("continue").click().await?;
    expect(&shop.error()).to_have_text("Error: Last Name is required").await?;

    shop.test_id("lastName").fill(&customer.last_name).await?;
    shop.test_id("continue").click().await?;
    expect(&shop.error()).to_have_text("Error: Postal Code is required").await
}

async fn complete_checkout(t: TestContext) -> PlaycheckResult<()> {
    let shop = SauceDemo::for_test(&t);
    let page = shop.page();
    add_cart_items(&shop, &CART_ITEMS).await?;
    shop.go_to_checkout().await?;
    shop.fill_checkout_information(&CheckoutInfo::default()).await?;

    expect(&page.locator(".inventory_item_name"))
        .to_have_count(CART_ITEMS.len())
        .await?;
    let subtotal = page.locator(".summary_subtotal_label").text_content().await?;
    Assertion::contains(&subtotal, "Item total").check()?;

    shop.finish_checkout().await
}

async fn cancel_step_two(t: TestContext) -> PlaycheckResult<()> {
    let shop = SauceDemo::for_test(&t);
    shop.add_item_to_cart_by_name(CART_ITEMS[0]).await?;
    shop.go_to_checkout().await?;
    shop.fill_checkout_information(&CheckoutInfo::default()).await?;
    shop.test_id("cancel").click().await?;
    expect_page(shop.page())
        .to_have_url(UrlMatcher::regex("inventory.html")?)
        .await
}

async fn cancel_step_one(t: TestContext) -> PlaycheckResult<()> {
    let shop = SauceDemo::for_test(&t);
    shop.add_item_to_cart_by_name(CART_ITEMS[0]).await?;
    shop.go_to_checkout().await?;
    shop.test_id("cancel").click().await?;
    expect_page(shop.page())
        .to_have_url(UrlMatcher::regex("cart.html")?)
        .await
}

async fn empty_cart(t: TestContext) -> PlaycheckResult<()> {
    let shop = SauceDemo::for_test(&t);
    add_cart_items(&shop, &PRODUCTS[..3]).await?;
    expect(&shop.cart_badge()).to_have_text("3").await?;
    shop.remove_all_cart_items().await?;
    expect(&shop.page().locator(".cart_item")).to_have_count(0).await?;
    expect(&shop.cart_badge()).to_have_count(0).await
}
