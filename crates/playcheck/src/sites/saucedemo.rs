//! SauceDemo storefront: users, catalogue data and the shopping flow.

use crate::assertion::Assertion;
use crate::expect::{expect, expect_page};
use crate::harness::TestContext;
use crate::locator::Locator;
use crate::matcher::{Pattern, UrlMatcher};
use crate::page::Page;
use crate::result::{PlaycheckError, PlaycheckResult};
use crate::selector::RoleOptions;
use crate::sites::Site;
use tracing::debug;

/// Default storefront URL
pub const BASE_URL: &str = "https://www.saucedemo.com/";

/// Password shared by every demo account
pub const PASSWORD: &str = "secret_sauce";

/// The six catalogue items in default (A to Z) order
pub const PRODUCTS: [&str; 6] = [
    "Sauce Labs Backpack",
    "Sauce Labs Bike Light",
    "Sauce Labs Bolt T-Shirt",
    "Sauce Labs Fleece Jacket",
    "Sauce Labs Onesie",
    "Test.allTheThings() T-Shirt (Red)",
];

/// Login credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct User {
    /// Username
    pub username: &'static str,
    /// Password
    pub password: &'static str,
}

impl User {
    /// Regular account
    pub const STANDARD: Self = Self::demo("standard_user");
    /// Account refused at login
    pub const LOCKED_OUT: Self = Self::demo("locked_out_user");
    /// Account with broken images and buttons
    pub const PROBLEM: Self = Self::demo("problem_user");
    /// Account with slow responses
    pub const PERFORMANCE_GLITCH: Self = Self::demo("performance_glitch_user");

    const fn demo(username: &'static str) -> Self {
        Self {
            username,
            password: PASSWORD,
        }
    }

    /// Custom credentials
    #[must_use]
    pub const fn new(username: &'static str, password: &'static str) -> Self {
        Self { username, password }
    }
}

/// Customer details entered at checkout step one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutInfo {
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Zip / postal code
    pub postal_code: String,
}

impl CheckoutInfo {
    /// Create checkout details
    #[must_use]
    pub fn new(first_name: &str, last_name: &str, postal_code: &str) -> Self {
        Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            postal_code: postal_code.to_string(),
        }
    }
}

impl Default for CheckoutInfo {
    fn default() -> Self {
        Self::new("Sauce", "Customer", "12345")
    }
}

/// Product sort orders offered by the inventory dropdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Name (A to Z)
    NameAsc,
    /// Name (Z to A)
    NameDesc,
    /// Price (low to high)
    PriceAsc,
    /// Price (high to low)
    PriceDesc,
}

impl SortOrder {
    /// `<option>` value in the sort dropdown
    #[must_use]
    pub const fn value(self) -> &'static str {
        match self {
            Self::NameAsc => "az",
            Self::NameDesc => "za",
            Self::PriceAsc => "lohi",
            Self::PriceDesc => "hilo",
        }
    }
}

/// Parse a price such as `"$29.99"` or `"Item total: $39.98"` into cents
///
/// # Errors
///
/// Returns `AssertionFailed` if the text holds no `$d.cc` amount
pub fn parse_price(text: &str) -> PlaycheckResult<u64> {
    let invalid = || PlaycheckError::assertion(format!("not a price: {text:?}"));
    let amount = text.rsplit_once('$').map(|(_, a)| a.trim()).ok_or_else(invalid)?;
    let (dollars, cents) = amount.split_once('.').unwrap_or((amount, "00"));
    if cents.len() != 2 {
        return Err(invalid());
    }
    let dollars: u64 = dollars.parse().map_err(|_| invalid())?;
    let cents: u64 = cents.parse().map_err(|_| invalid())?;
    dollars
        .checked_mul(100)
        .and_then(|c| c.checked_add(cents))
        .ok_or_else(invalid)
}

/// Whether names are in case-insensitive ascending order
#[must_use]
pub fn names_sorted_ascending(names: &[String]) -> bool {
    names
        .windows(2)
        .all(|w| w[0].to_lowercase() <= w[1].to_lowercase())
}

/// Whether names are in case-insensitive descending order
#[must_use]
pub fn names_sorted_descending(names: &[String]) -> bool {
    names
        .windows(2)
        .all(|w| w[0].to_lowercase() >= w[1].to_lowercase())
}

/// Whether prices are non-decreasing (`ascending`) or non-increasing
#[must_use]
pub fn prices_sorted(prices: &[u64], ascending: bool) -> bool {
    prices
        .windows(2)
        .all(|w| if ascending { w[0] <= w[1] } else { w[0] >= w[1] })
}

/// Page object for the storefront
#[derive(Debug, Clone)]
pub struct SauceDemo {
    page: Page,
    base_url: String,
}

impl SauceDemo {
    /// Wrap `page`, with the storefront at `base_url`
    #[must_use]
    pub fn new(page: Page, base_url: impl Into<String>) -> Self {
        Self {
            page,
            base_url: base_url.into(),
        }
    }

    /// Page object for a scenario's page and configured URL
    #[must_use]
    pub fn for_test(t: &TestContext) -> Self {
        Self::new(t.page().clone(), t.site_url(Site::SauceDemo, ""))
    }

    /// Underlying page
    #[must_use]
    pub const fn page(&self) -> &Page {
        &self.page
    }

    /// Storefront URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Element by its `data-test` attribute
    #[must_use]
    pub fn test_id(&self, id: &str) -> Locator {
        self.page.get_by_test_id(id)
    }

    /// Login error banner
    #[must_use]
    pub fn error(&self) -> Locator {
        self.test_id("error")
    }

    /// Cart item counter
    #[must_use]
    pub fn cart_badge(&self) -> Locator {
        self.page.locator(".shopping_cart_badge")
    }

    /// Inventory card of one product
    #[must_use]
    pub fn item_card(&self, name: &str) -> Locator {
        self.page.locator(".inventory_item").filter_has_text(name)
    }

    /// Open the login page
    pub async fn open(&self) -> PlaycheckResult<()> {
        self.page.goto(&self.base_url).await?;
        Ok(())
    }

    /// Open the login page and sign in
    pub async fn login(&self, user: User) -> PlaycheckResult<()> {
        debug!(user = user.username, "logging in");
        self.open().await?;
        self.test_id("username").fill(user.username).await?;
        self.test_id("password").fill(user.password).await?;
        self.test_id("login-button").click().await
    }

    /// Assert the inventory page is showing
    pub async fn expect_on_inventory_page(&self) -> PlaycheckResult<()> {
        expect_page(&self.page).to_have_url(UrlMatcher::regex("inventory.html")?).await?;
        expect(&self.page.locator(".app_logo")).to_have_text("Swag Labs").await
    }

    /// Add a product from the inventory list; no-op when already in the cart
    pub async fn add_item_to_cart_by_name(&self, name: &str) -> PlaycheckResult<()> {
        let card = self.item_card(name);
        expect(&card).to_be_visible().await?;
        let add = card.get_by_role(
            "button",
            RoleOptions::default().name_matching(Pattern::ignore_case("Add to cart")?),
        );
        if add.count().await? > 0 {
            add.click().await?;
        }
        Ok(())
    }

    /// Open the cart page
    pub async fn open_cart(&self) -> PlaycheckResult<()> {
        self.page.locator("#shopping_cart_container a").click().await?;
        expect_page(&self.page).to_have_url(UrlMatcher::regex("cart.html")?).await
    }

    /// Reset the app state through the burger menu
    pub async fn reset_app_state(&self) -> PlaycheckResult<()> {
        self.page.locator("#react-burger-menu-btn").click().await?;
        self.page.locator("#reset_sidebar_link").click().await?;
        self.page.locator("#react-burger-cross-btn").click().await
    }

    /// Open the cart and remove every item
    pub async fn remove_all_cart_items(&self) -> PlaycheckResult<()> {
        self.open_cart().await?;
        let remove = self.page.locator("button").filter_has_text("Remove");
        let mut left = remove.count().await?;
        while left > 0 {
            remove.first().click().await?;
            expect(&remove).to_have_count(left - 1).await?;
            left -= 1;
        }
        Ok(())
    }

    /// Open the cart and start checkout
    pub async fn go_to_checkout(&self) -> PlaycheckResult<()> {
        self.open_cart().await?;
        self.test_id("checkout").click().await?;
        expect_page(&self.page)
            .to_have_url(UrlMatcher::regex("checkout-step-one.html")?)
            .await
    }

    /// Fill step one and continue to the overview
    pub async fn fill_checkout_information(&self, info: &CheckoutInfo) -> PlaycheckResult<()> {
        self.test_id("firstName").fill(&info.first_name).await?;
        self.test_id("lastName").fill(&info.last_name).await?;
        self.test_id("postalCode").fill(&info.postal_code).await?;
        self.test_id("continue").click().await?;
        expect_page(&self.page)
            .to_have_url(UrlMatcher::regex("checkout-step-two.html")?)
            .await
    }

    /// Finish the order, check the confirmation and return to the inventory
    pub async fn finish_checkout(&self) -> PlaycheckResult<()> {
        self.test_id("finish").click().await?;
        expect_page(&self.page)
            .to_have_url(UrlMatcher::regex("checkout-complete.html")?)
            .await?;
        expect(&self.page.get_by_role(
            "heading",
            RoleOptions::default().name("Thank you for your order!"),
        ))
        .to_be_visible()
        .await?;
        self.test_id("back-to-products").click().await?;
        self.expect_on_inventory_page().await
    }

    /// Pick a sort order in the inventory dropdown
    pub async fn sort_by(&self, order: SortOrder) -> PlaycheckResult<()> {
        self.test_id("product-sort-container")
            .select_option(order.value())
            .await?;
        Ok(())
    }

    /// Prices of the listed items in cents, in display order
    pub async fn listed_prices(&self) -> PlaycheckResult<Vec<u64>> {
        self.page
            .locator(".inventory_item_price")
            .all_text_contents()
            .await?
            .iter()
            .map(|t| parse_price(t))
            .collect()
    }

    /// Names of the listed items, in display order
    pub async fn listed_names(&self) -> PlaycheckResult<Vec<String>> {
        self.page.locator(".inventory_item_name").all_text_contents().await
    }

    /// Assert the listing follows `order`
    pub async fn expect_sorted(&self, order: SortOrder) -> PlaycheckResult<()> {
        match order {
            SortOrder::NameAsc => {
                let names = self.listed_names().await?;
                Assertion::is_true(names_sorted_ascending(&names), &format!("names not A to Z: {names:?}")).check()
            }
            SortOrder::NameDesc => {
                let names = self.listed_names().await?;
                Assertion::is_true(names_sorted_descending(&names), &format!("names not Z to A: {names:?}")).check()
            }
            SortOrder::PriceAsc | SortOrder::PriceDesc => {
                let prices = self.listed_prices().await?;
                let ascending = order == SortOrder::PriceAsc;
                Assertion::is_true(prices_sorted(&prices, ascending), &format!("prices not sorted: {prices:?}")).check()
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::Timeouts;
    use crate::context::ContextOptions;
    use crate::driver::{BrowserDriver, MockBrowser, MockPage, MouseEventKind};
    use crate::page::PageSettings;
    use serde_json::json;
    use std::sync::Arc;

    async fn fixture() -> (Arc<MockPage>, SauceDemo) {
        let browser = Arc::new(MockBrowser::new());
        let mock = Arc::new(MockPage::new("main"));
        browser.prepare_page(Arc::clone(&mock));
        let ctx = browser.new_context(&ContextOptions::new()).await.unwrap();
        let driver = browser.new_page(&ctx).await.unwrap();
        let settings = PageSettings {
            timeouts: Timeouts {
                expect_ms: 100,
                action_ms: 100,
                navigation_ms: 100,
                poll_interval_ms: 10,
            },
            ..PageSettings::default()
        };
        let page = Page::new(driver, browser, ctx, Arc::new(settings));
        (mock, SauceDemo::new(page, BASE_URL))
    }

    fn ready() -> serde_json::Value {
        json!({
            "status": "ready",
            "box": {"x": 10.0, "y": 10.0, "width": 20.0, "height": 10.0},
            "point": {"x": 20.0, "y": 15.0},
            "draggable": false
        })
    }

    mod price_tests {
        use super::*;

        #[test]
        fn test_parse_price() {
            assert_eq!(parse_price("$29.99").unwrap(), 2999);
            assert_eq!(parse_price("$7.99").unwrap(), 799);
            assert_eq!(parse_price("Item total: $39.98").unwrap(), 3998);
            assert_eq!(parse_price("$10").unwrap(), 1000);
        }

        #[test]
        fn test_parse_price_rejects_garbage() {
            assert!(parse_price("29.99").is_err());
            assert!(parse_price("$29.9").is_err());
            assert!(parse_price("$abc").is_err());
            assert!(parse_price("$18446744073709551615.00").is_err());
            assert!(parse_price("$184467440737095516.99").is_err());
        }
    }

    mod sort_tests {
        use super::*;

        fn strings(v: &[&str]) -> Vec<String> {
            v.iter().map(|s| (*s).to_string()).collect()
        }

        #[test]
        fn test_default_catalogue_is_ascending() {
            assert!(names_sorted_ascending(&strings(&PRODUCTS)));
            assert!(!names_sorted_descending(&strings(&PRODUCTS)));
        }

        #[test]
        fn test_descending_names() {
            let mut names = strings(&PRODUCTS);
            names.reverse();
            assert!(names_sorted_descending(&names));
        }

        #[test]
        fn test_prices_sorted() {
            assert!(prices_sorted(&[799, 999, 1599, 1599], true));
            assert!(prices_sorted(&[4999, 2999, 799], false));
            assert!(!prices_sorted(&[999, 799], true));
        }

        #[test]
        fn test_sort_values() {
            assert_eq!(SortOrder::NameAsc.value(), "az");
            assert_eq!(SortOrder::NameDesc.value(), "za");
            assert_eq!(SortOrder::PriceAsc.value(), "lohi");
            assert_eq!(SortOrder::PriceDesc.value(), "hilo");
        }
    }

    mod user_tests {
        use super::*;

        #[test]
        fn test_demo_users_share_password() {
            for user in [User::STANDARD, User::LOCKED_OUT, User::PROBLEM, User::PERFORMANCE_GLITCH] {
                assert_eq!(user.password, "secret_sauce");
            }
            assert_eq!(User::LOCKED_OUT.username, "locked_out_user");
        }

        #[test]
        fn test_default_checkout_info() {
            let info = CheckoutInfo::default();
            assert_eq!(info.first_name, "Sauce");
            assert_eq!(info.postal_code, "12345");
        }
    }

    mod flow_tests {
        use super::*;

        #[tokio::test]
        async fn test_login_fills_and_submits() {
            let (mock, shop) = fixture().await;
            mock.script("actionable", [ready()]);
            mock.script("prepareFill", [json!({"status": "type"})]);
            shop.login(User::STANDARD).await.unwrap();
            assert!(mock.was_called("navigate:https://www.saucedemo.com/"));
            assert_eq!(mock.inserted_text(), vec!["standard_user", "secret_sauce"]);
            assert!(mock
                .mouse_events()
                .iter()
                .any(|e| e.kind == MouseEventKind::Down));
        }

        #[tokio::test]
        async fn test_add_item_skips_when_no_add_button() {
            let (mock, shop) = fixture().await;
            mock.script("probe", [json!({"count": 1, "value": true})]);
            mock.script("count", [json!(0)]);
            shop.add_item_to_cart_by_name("Sauce Labs Backpack").await.unwrap();
            assert!(mock.mouse_events().is_empty());
        }

        #[tokio::test]
        async fn test_listed_prices_parse() {
            let (mock, shop) = fixture().await;
            mock.script("texts", [json!(["$49.99", "$29.99"])]);
            assert_eq!(shop.listed_prices().await.unwrap(), vec![4999, 2999]);
            shop.expect_sorted(SortOrder::PriceDesc).await.unwrap();
        }
    }
}
