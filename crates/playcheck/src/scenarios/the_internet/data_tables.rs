//! Sortable data tables, large and deep DOM.

use std::time::Instant;

use super::suite;
use crate::assertion::Assertion;
use crate::expect::expect;
use crate::harness::{Suite, TestContext};
use crate::locator::Locator;
use crate::page::Page;
use crate::result::PlaycheckResult;
use crate::matcher::TextMatcher;
use crate::scenarios::{non_empty, SETTLE};
use crate::selector::RoleOptions;
use tracing::info;

/// Column headers of the example tables, in order
const HEADERS: [&str; 5] = ["Last Name", "First Name", "Email", "Due", "Web Site"];

pub(super) fn suites() -> Vec<Suite> {
    vec![sortable_tables(), large_dom()]
}

// ============================================================================
// Sortable data tables
// ============================================================================

fn sortable_tables() -> Suite {
    suite("data_tables::sortable_data_tables", "Sortable Data Tables", "tables")
        .scenario("should display sortable data tables page", tables_page)
        .scenario("should have proper table structure", table_structure)
        .scenario("should sort table by Last Name", sort_last_name)
        .scenario("should sort table by First Name", sort_first_name)
        .scenario("should sort table by Email", sort_email)
        .scenario("should sort table by Due amount", sort_due)
        .scenario("should sort table by Web Site", sort_web_site)
        .scenario("should handle multiple sort clicks", repeated_sort)
        .scenario("should work with both tables", both_tables)
        .scenario("should handle table cell interactions", cell_links)
}

fn table(page: &Page, id: &str) -> Locator {
    page.locator(&format!("#{id}"))
}

async fn tables_page(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&page.get_by_text("Data Tables")).to_be_visible().await?;
    expect(&table(page, "table1")).to_be_visible().await?;
    expect(&table(page, "table2")).to_be_visible().await
}

async fn table_structure(t: TestContext) -> PlaycheckResult<()> {
    let table1 = table(t.page(), "table1");
    let headers = table1.locator("thead th");
    let header_count = headers.count().await?;
    non_empty("header count", header_count)?;
    non_empty("row count", table1.locator("tbody tr").count().await?)?;
    for (i, expected) in HEADERS.iter().enumerate().take(header_count) {
        expect(&headers.nth(i as i64)).to_contain_text(expected).await?;
    }
    Ok(())
}

/// Click the header of `column` (0-based) and check the column keeps its length
async fn sort_by_column(page: &Page, column: usize) -> PlaycheckResult<()> {
    let table1 = table(page, "table1");
    let cells = table1.locator(&format!("tbody tr td:nth-child({})", column + 1));
    let before = cells.all_text_contents().await?;
    table1.locator("thead th").nth(column as i64).click().await?;
    page.wait_for_timeout(SETTLE.as_millis() as u64).await;
    let after = cells.all_text_contents().await?;
    Assertion::equals(&before.len(), &after.len())
        .context(HEADERS[column])
        .check()?;
    let mut expected = before;
    expected.sort();
    let mut sorted = after;
    sorted.sort();
    Assertion::equals(&expected, &sorted)
        .context("sorting changed the cell values")
        .check()
}

async fn sort_last_name(t: TestContext) -> PlaycheckResult<()> {
    sort_by_column(t.page(), 0).await
}

async fn sort_first_name(t: TestContext) -> PlaycheckResult<()> {
    sort_by_column(t.page(), 1).await
}

async fn sort_email(t: TestContext) -> PlaycheckResult<()> {
    sort_by_column(t.page(), 2).await
}

async fn sort_due(t: TestContext) -> PlaycheckResult<()> {
    sort_by_column(t.page(), 3).await
}

async fn sort_web_site(t: TestContext) -> PlaycheckResult<()> {
    sort_by_column(t.page(), 4).await
}

async fn repeated_sort(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    let table1 = table(page, "table1");
    for _ in 0..3 {
        table1.locator("thead th").first().click().await?;
        page.wait_for_timeout(SETTLE.as_millis() as u64).await;
        non_empty("rows after sorting", table1.locator("tbody tr").count().await?)?;
    }
    Ok(())
}

async fn both_tables(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    let table2 = table(page, "table2");
    non_empty("table2 headers", table2.locator("thead th").count().await?)?;
    let rows = table2.locator("tbody tr");
    let row_count = rows.count().await?;
    non_empty("table2 rows", row_count)?;
    table2.locator("thead th").nth(1).click().await?;
    page.wait_for_timeout(SETTLE.as_millis() as u64).await;
    expect(&rows).to_have_count(row_count).await
}

async fn cell_links(t: TestContext) -> PlaycheckResult<()> {
    let table1 = table(t.page(), "table1");
    let links = table1.locator("tbody tr td a");
    for i in 0..links.count().await? {
        let link = links.nth(i as i64);
        expect(&link).to_be_visible().await?;
        expect(&link).to_have_attribute("href", TextMatcher::regex(r"\S")?).await?;
    }
    let inputs = table1.locator("tbody tr input");
    for i in 0..inputs.count().await? {
        expect(&inputs.nth(i as i64)).to_be_visible().await?;
    }
    Ok(())
}

// ============================================================================
// Large & deep DOM
// ============================================================================

fn large_dom() -> Suite {
    suite("data_tables::large_deep_dom", "Large & Deep DOM", "large")
        .scenario("should display large DOM page", large_page)
        .scenario("should handle large number of elements", many_elements)
        .scenario("should navigate through deep DOM structure", deep_structure)
        .scenario("should handle scrolling with large DOM", scrolling)
        .scenario("should handle element selection in large DOM", selection)
        .scenario("should handle performance with large DOM", performance)
        .scenario("should handle text extraction from large DOM", text_extraction)
        .scenario("should handle attribute access in large DOM", attribute_access)
}

async fn large_page(t: TestContext) -> PlaycheckResult<()> {
    expect(&t.page().get_by_text("Large & Deep DOM")).to_be_visible().await
}

async fn many_elements(t: TestContext) -> PlaycheckResult<()> {
    let siblings = t.page().locator("#siblings .parent");
    let count = siblings.count().await?;
    non_empty("sibling blocks", count)?;
    non_empty(
        "children of the first block",
        siblings.first().locator(":scope > div").count().await?,
    )
}

async fn deep_structure(t: TestContext) -> PlaycheckResult<()> {
    let deep = t.page().locator(".deep");
    let count = deep.count().await?;
    for i in 0..count.min(5) {
        let element = deep.nth(i as i64);
        expect(&element).to_be_visible().await?;
        non_empty("nested children", element.locator("*").count().await?)?;
    }
    Ok(())
}

async fn scrolling(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    let height: u64 = page.evaluate_as("document.body.scrollHeight").await?;
    Assertion::greater_than(height, 1000).context("page height").check()?;

    page.evaluate("window.scrollTo(0, document.body.scrollHeight)").await?;
    page.wait_for_timeout(1000).await;
    expect(&page.get_by_role("cell", RoleOptions::default().exact_name("50.6")).last())
        .to_be_visible()
        .await?;

    page.evaluate("window.scrollTo(0, 0)").await?;
    page.wait_for_timeout(1000).await;
    expect(&page.locator(".siblings").first()).to_be_visible().await
}

async fn selection(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    non_empty("by class", page.locator(".siblings").count().await?)?;
    Assertion::greater_than(page.locator("div").count().await?, 10)
        .context("by tag")
        .check()?;
    non_empty("by selector", page.locator(".siblings .child").count().await?)
}

async fn performance(t: TestContext) -> PlaycheckResult<()> {
    let start = Instant::now();
    let divs = t.page().locator("div").count().await?;
    let elapsed = start.elapsed();
    info!(divs, elapsed_ms = elapsed.as_millis() as u64, "counted divs");
    Assertion::is_true(elapsed.as_millis() < 5000, "counting divs took over 5s").check()?;
    Assertion::greater_than(divs, 50).context("div count").check()
}

async fn text_extraction(t: TestContext) -> PlaycheckResult<()> {
    let siblings = t.page().locator(".siblings");
    for i in 0..siblings.count().await?.min(3) {
        let text = siblings.nth(i as i64).text_content().await?;
        Assertion::is_false(text.trim().is_empty(), "sibling text is empty").check()?;
    }
    Ok(())
}

async fn attribute_access(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    let with_class = page.locator("[class]");
    let count = with_class.count().await?;
    non_empty("elements with class", count)?;
    for i in 0..count.min(5) {
        let class = with_class.nth(i as i64).get_attribute("class").await?;
        Assertion::is_true(class.is_some_and(|c| !c.is_empty()), "class attribute is empty").check()?;
    }
    Ok(())
}
