//! TodoMVC demo page object.

use crate::expect::expect;
use crate::harness::TestContext;
use crate::locator::Locator;
use crate::page::Page;
use crate::result::PlaycheckResult;
use crate::selector::RoleOptions;
use crate::sites::Site;
use tracing::debug;

/// Default TodoMVC URL
pub const BASE_URL: &str = "https://demo.playwright.dev/todomvc/#/";

/// Accessible name of the new-todo input
pub const NEW_TODO_LABEL: &str = "What needs to be done?";

/// List filters in the footer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoFilter {
    /// Every todo
    All,
    /// Todos not yet completed
    Active,
    /// Completed todos
    Completed,
}

impl TodoFilter {
    /// Link text of the filter
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Active => "Active",
            Self::Completed => "Completed",
        }
    }
}

/// Footer counter wording: `"1 item left"`, `"3 items left"`
#[must_use]
pub fn items_left_text(count: usize) -> String {
    let noun = if count == 1 { "item" } else { "items" };
    format!("{count} {noun} left")
}

/// Page object for the TodoMVC demo
#[derive(Debug, Clone)]
pub struct TodoPage {
    page: Page,
    url: String,
}

impl TodoPage {
    /// Wrap `page`, with the app at `url`
    #[must_use]
    pub fn new(page: Page, url: impl Into<String>) -> Self {
        Self { page, url: url.into() }
    }

    /// Page object for a scenario's page and configured URL
    #[must_use]
    pub fn for_test(t: &TestContext) -> Self {
        Self::new(t.page().clone(), t.site_url(Site::TodoMvc, ""))
    }

    /// Underlying page
    #[must_use]
    pub const fn page(&self) -> &Page {
        &self.page
    }

    /// Open the app
    pub async fn goto(&self) -> PlaycheckResult<()> {
        self.page.goto(&self.url).await?;
        Ok(())
    }

    /// The new-todo input
    #[must_use]
    pub fn new_todo(&self) -> Locator {
        self.page
            .get_by_role("textbox", RoleOptions::default().name(NEW_TODO_LABEL))
    }

    /// Every listed todo item
    #[must_use]
    pub fn todo_items(&self) -> Locator {
        self.page.locator(".todo-list li")
    }

    /// The listed item whose text contains `text`
    #[must_use]
    pub fn todo_item(&self, text: &str) -> Locator {
        self.todo_items().filter_has_text(text)
    }

    /// Completion checkboxes of every item
    #[must_use]
    pub fn toggles(&self) -> Locator {
        self.page.get_by_label("Toggle Todo")
    }

    /// Footer counter
    #[must_use]
    pub fn items_left(&self) -> Locator {
        self.page.locator(".todo-count")
    }

    /// Type a todo and submit it with Enter
    pub async fn add_todo(&self, text: &str) -> PlaycheckResult<()> {
        debug!(text, "adding todo");
        let input = self.new_todo();
        input.fill(text).await?;
        input.press("Enter").await
    }

    /// Add several todos in order
    pub async fn add_todos(&self, texts: &[&str]) -> PlaycheckResult<()> {
        for text in texts {
            self.add_todo(text).await?;
        }
        Ok(())
    }

    /// Toggle completion of the item containing `text`
    pub async fn toggle(&self, text: &str) -> PlaycheckResult<()> {
        self.todo_item(text).get_by_label("Toggle Todo").click().await
    }

    /// Toggle completion of the item at `index`
    pub async fn toggle_nth(&self, index: i64) -> PlaycheckResult<()> {
        self.toggles().nth(index).click().await
    }

    /// Mark every todo complete, or active again if all were complete
    pub async fn toggle_all(&self) -> PlaycheckResult<()> {
        self.page.locator("label[for=\"toggle-all\"]").click().await
    }

    /// Delete the item containing `text` through its hover-only button
    pub async fn delete(&self, text: &str) -> PlaycheckResult<()> {
        let item = self.todo_item(text);
        item.hover().await?;
        item.locator("button.destroy").click().await
    }

    fn editor(&self) -> Locator {
        self.page
            .get_by_role("textbox", RoleOptions::default().name("Edit todo"))
    }

    async fn start_edit(&self, text: &str, replacement: &str) -> PlaycheckResult<Locator> {
        self.todo_item(text).get_by_text(text).dblclick().await?;
        let editor = self.editor();
        editor.fill(replacement).await?;
        Ok(editor)
    }

    /// Replace the text of the item containing `text`
    pub async fn edit(&self, text: &str, replacement: &str) -> PlaycheckResult<()> {
        self.start_edit(text, replacement).await?.press("Enter").await
    }

    /// Start editing, type `draft`, then abandon the edit with Escape
    pub async fn cancel_edit(&self, text: &str, draft: &str) -> PlaycheckResult<()> {
        self.start_edit(text, draft).await?.press("Escape").await
    }

    /// Switch the list filter
    pub async fn filter(&self, filter: TodoFilter) -> PlaycheckResult<()> {
        self.page
            .get_by_role("link", RoleOptions::default().exact_name(filter.label()))
            .click()
            .await
    }

    /// Remove every completed todo
    pub async fn clear_completed(&self) -> PlaycheckResult<()> {
        self.page
            .get_by_role("button", RoleOptions::default().name("Clear completed"))
            .click()
            .await
    }

    /// Assert the footer counter reads `count` items left
    pub async fn expect_items_left(&self, count: usize) -> PlaycheckResult<()> {
        expect(&self.items_left())
            .to_have_text(items_left_text(count))
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::Timeouts;
    use crate::context::ContextOptions;
    use crate::driver::{BrowserDriver, MockBrowser, MockPage};
    use crate::page::PageSettings;
    use serde_json::json;
    use std::sync::Arc;

    async fn fixture() -> (Arc<MockPage>, TodoPage) {
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
        (mock, TodoPage::new(page, BASE_URL))
    }

    mod wording_tests {
        use super::*;

        #[test]
        fn test_items_left_text() {
            assert_eq!(items_left_text(0), "0 items left");
            assert_eq!(items_left_text(1), "1 item left");
            assert_eq!(items_left_text(3), "3 items left");
        }

        #[test]
        fn test_filter_labels() {
            assert_eq!(TodoFilter::All.label(), "All");
            assert_eq!(TodoFilter::Active.label(), "Active");
            assert_eq!(TodoFilter::Completed.label(), "Completed");
        }
    }

    mod page_tests {
        use super::*;

        #[tokio::test]
        async fn test_add_todos_types_and_submits_each() {
            let (mock, todo) = fixture().await;
            mock.script(
                "actionable",
                [json!({
                    "status": "ready",
                    "box": {"x": 0.0, "y": 0.0, "width": 200.0, "height": 40.0},
                    "point": {"x": 100.0, "y": 20.0},
                    "draggable": false
                })],
            );
            mock.script("prepareFill", [json!({"status": "type"})]);
            mock.script("focus", [json!(true)]);
            todo.add_todos(&["First todo", "Second todo"]).await.unwrap();
            assert_eq!(mock.inserted_text(), vec!["First todo", "Second todo"]);
            let enters = mock
                .key_events()
                .iter()
                .filter(|e| e.key == "Enter")
                .count();
            assert!(enters >= 2);
        }

        #[tokio::test]
        async fn test_expect_items_left_reads_counter() {
            let (mock, todo) = fixture().await;
            mock.script("probe", [json!({"count": 1, "value": "2 items left"})]);
            todo.expect_items_left(2).await.unwrap();
            assert!(todo.expect_items_left(1).await.is_err());
        }
    }
}
