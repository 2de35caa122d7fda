//! Add/remove elements, checkboxes, dropdown, number input and range slider.

use super::suite;
use crate::assertion::Assertion;
use crate::expect::expect;
use crate::harness::{Suite, TestContext};
use crate::locator::Locator;
use crate::page::Page;
use crate::result::PlaycheckResult;
use crate::scenarios::role;

pub(super) fn suites() -> Vec<Suite> {
    vec![add_remove(), checkboxes(), dropdown(), inputs(), horizontal_slider()]
}

// ============================================================================
// Add/remove elements
// ============================================================================

fn add_remove() -> Suite {
    suite("elements::add_remove_elements", "Add/Remove Elements", "add_remove_elements/")
        .scenario("should display add/remove elements page", add_remove_page)
        .scenario("should add elements when button is clicked", add_elements)
        .scenario("should remove elements when delete button is clicked", remove_elements)
        .scenario("should remove specific element", remove_specific)
}

fn delete_buttons(page: &Page) -> Locator {
    role(page, "button", "Delete")
}

async fn add_element(page: &Page, times: usize) -> PlaycheckResult<()> {
    let add = role(page, "button", "Add Element");
    for _ in 0..times {
        add.click().await?;
    }
    Ok(())
}

async fn add_remove_page(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&role(page, "heading", "Add/Remove Elements")).to_be_visible().await?;
    expect(&role(page, "button", "Add Element")).to_be_visible().await
}

async fn add_elements(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    add_element(page, 1).await?;
    expect(&delete_buttons(page)).to_be_visible().await?;
    for expected in 2..=3 {
        add_element(page, 1).await?;
        expect(&delete_buttons(page)).to_have_count(expected).await?;
    }
    Ok(())
}

async fn remove_elements(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    add_element(page, 3).await?;
    let deletes = delete_buttons(page);
    expect(&deletes).to_have_count(3).await?;
    for remaining in (0..3).rev() {
        deletes.first().click().await?;
        expect(&deletes).to_have_count(remaining).await?;
    }
    Ok(())
}

async fn remove_specific(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    add_element(page, 2).await?;
    let deletes = delete_buttons(page);
    expect(&deletes).to_have_count(2).await?;
    deletes.nth(1).click().await?;
    expect(&deletes).to_have_count(1).await
}

// ============================================================================
// Checkboxes
// ============================================================================

fn checkboxes() -> Suite {
    suite("elements::checkboxes", "Checkboxes", "checkboxes")
        .scenario("should display checkboxes page", checkboxes_page)
        .scenario("should check and uncheck checkboxes", check_uncheck)
        .scenario("should handle multiple checkbox interactions", check_both)
}

fn checkbox_inputs(page: &Page) -> Locator {
    page.locator("input[type=\"checkbox\"]")
}

async fn checkboxes_page(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&role(page, "heading", "Checkboxes")).to_be_visible().await?;
    expect(&checkbox_inputs(page)).to_have_count(2).await
}

async fn check_uncheck(t: TestContext) -> PlaycheckResult<()> {
    let boxes = checkbox_inputs(t.page());
    let (first, second) = (boxes.first(), boxes.nth(1));

    expect(&first).not().to_be_checked().await?;
    expect(&second).to_be_checked().await?;

    first.check().await?;
    expect(&first).to_be_checked().await?;
    second.uncheck().await?;
    expect(&second).not().to_be_checked().await?;

    first.click().await?;
    second.click().await?;
    expect(&first).not().to_be_checked().await?;
    expect(&second).to_be_checked().await
}

async fn check_both(t: TestContext) -> PlaycheckResult<()> {
    let boxes = checkbox_inputs(t.page());
    let (first, second) = (boxes.first(), boxes.nth(1));

    first.check().await?;
    expect(&first).to_be_checked().await?;
    expect(&second).to_be_checked().await?;

    first.uncheck().await?;
    second.uncheck().await?;
    expect(&first).not().to_be_checked().await?;
    expect(&second).not().to_be_checked().await
}

// ============================================================================
// Dropdown
// ============================================================================

fn dropdown() -> Suite {
    suite("elements::dropdown", "Dropdown", "dropdown")
        .scenario("should display dropdown page", dropdown_page)
        .scenario("should select dropdown options", select_options)
        .scenario("should handle disabled option", disabled_option)
        .scenario("should get selected option text", selected_text)
}

fn select(page: &Page) -> Locator {
    page.locator("select#dropdown")
}

async fn dropdown_page(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&page.get_by_text("Dropdown List")).to_be_visible().await?;
    expect(&select(page)).to_be_visible().await
}

async fn select_options(t: TestContext) -> PlaycheckResult<()> {
    let dropdown = select(t.page());
    expect(&dropdown).to_have_value("").await?;
    for value in ["1", "2"] {
        let selected = dropdown.select_option(value).await?;
        Assertion::equals(&vec![value.to_string()], &selected).check()?;
        expect(&dropdown).to_have_value(value).await?;
    }
    Ok(())
}

async fn disabled_option(t: TestContext) -> PlaycheckResult<()> {
    let dropdown = select(t.page());
    expect(&dropdown.locator("option[value=\"\"]")).to_be_disabled().await?;

    dropdown.select_option("1").await?;
    expect(&dropdown).to_have_value("1").await?;

    let rejected = dropdown.select_option("").await;
    Assertion::is_true(rejected.is_err(), "selecting the disabled option succeeded").check()?;
    expect(&dropdown).to_have_value("1").await
}

async fn selected_text(t: TestContext) -> PlaycheckResult<()> {
    let dropdown = select(t.page());
    let selected = dropdown.locator("option:checked");
    dropdown.select_option("1").await?;
    expect(&selected).to_have_text("Option 1").await?;
    dropdown.select_option("2").await?;
    expect(&selected).to_have_text("Option 2").await
}

// ============================================================================
// Inputs
// ============================================================================

fn inputs() -> Suite {
    suite("elements::inputs", "Inputs", "inputs")
        .scenario("should display inputs page", inputs_page)
        .scenario("should accept numeric input", numeric_input)
        .scenario("should handle arrow keys for increment/decrement", arrow_steps)
        .scenario("should handle non-numeric input", non_numeric_input)
        .scenario("should handle negative numbers", negative_numbers)
        .scenario("should handle decimal numbers with arrows", decimal_arrows)
}

fn number_input(page: &Page) -> Locator {
    page.locator("input[type=\"number\"]")
}

/// Press each key in turn, checking the value after each press
async fn press_expecting(input: &Locator, steps: &[(&str, &str)]) -> PlaycheckResult<()> {
    for (key, value) in steps {
        input.press(key).await?;
        expect(input).to_have_value(*value).await?;
    }
    Ok(())
}

async fn inputs_page(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&role(page, "heading", "Inputs")).to_be_visible().await?;
    expect(&number_input(page)).to_be_visible().await
}

async fn numeric_input(t: TestContext) -> PlaycheckResult<()> {
    let input = number_input(t.page());
    for value in ["123", "456.789", "0"] {
        input.fill(value).await?;
        expect(&input).to_have_value(value).await?;
    }
    Ok(())
}

async fn arrow_steps(t: TestContext) -> PlaycheckResult<()> {
    let input = number_input(t.page());
    input.fill("100").await?;
    expect(&input).to_have_value("100").await?;
    press_expecting(
        &input,
        &[("ArrowUp", "101"), ("ArrowDown", "100"), ("ArrowUp", "101"), ("ArrowUp", "102"), ("ArrowUp", "103")],
    )
    .await
}

/// Filling text into a number input is refused; typing it drops the letters
async fn non_numeric_input(t: TestContext) -> PlaycheckResult<()> {
    let input = number_input(t.page());
    let refused = input.fill("abc").await;
    Assertion::is_true(refused.is_err(), "filling \"abc\" into a number input succeeded").check()?;
    expect(&input).to_have_value("").await?;

    input.press_sequentially("123abc").await?;
    expect(&input).to_have_value("123").await?;

    input.clear().await?;
    input.press_sequentially("abc").await?;
    expect(&input).to_have_value("").await
}

async fn negative_numbers(t: TestContext) -> PlaycheckResult<()> {
    let input = number_input(t.page());
    input.fill("-50").await?;
    expect(&input).to_have_value("-50").await?;
    press_expecting(&input, &[("ArrowUp", "-49"), ("ArrowUp", "-48")]).await
}

async fn decimal_arrows(t: TestContext) -> PlaycheckResult<()> {
    let input = number_input(t.page());
    input.fill("10.5").await?;
    expect(&input).to_have_value("10.5").await?;
    press_expecting(&input, &[("ArrowUp", "11.5"), ("ArrowDown", "10.5")]).await
}

// ============================================================================
// Horizontal slider
// ============================================================================

fn horizontal_slider() -> Suite {
    suite("elements::horizontal_slider", "Horizontal Slider", "horizontal_slider")
        .scenario("should display horizontal slider page", slider_page)
        .scenario("should move slider and display value", move_slider)
        .scenario("should handle arrow keys", slider_arrows)
}

fn slider(page: &Page) -> Locator {
    page.locator("input[type=\"range\"]")
}

async fn slider_page(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&role(page, "heading", "Horizontal Slider")).to_be_visible().await?;
    expect(&slider(page)).to_be_visible().await
}

async fn move_slider(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    let range = slider(page);
    let shown = page.locator("#range");
    expect(&range).to_have_value("0").await?;
    for value in ["5", "0", "2.5"] {
        range.fill(value).await?;
        expect(&shown).to_have_text(value).await?;
        expect(&range).to_have_value(value).await?;
    }
    Ok(())
}

async fn slider_arrows(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    let range = slider(page);
    let shown = page.locator("#range");
    range.fill("2").await?;
    expect(&shown).to_have_text("2").await?;
    for (key, value) in [("ArrowRight", "2.5"), ("ArrowLeft", "2"), ("ArrowUp", "2.5"), ("ArrowDown", "2")] {
        range.press(key).await?;
        expect(&shown).to_have_text(value).await?;
    }
    Ok(())
}
