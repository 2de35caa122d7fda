//! TodoMVC suite.

use crate::expect::expect;
use crate::harness::{Suite, TestContext};
use crate::result::PlaycheckResult;
use crate::scenarios::role;
use crate::sites::todomvc::{TodoFilter, TodoPage, NEW_TODO_LABEL};
use crate::sites::Site;

const ACTIVE: &str = "Active todo";
const COMPLETED: &str = "Completed todo";
const ORIGINAL: &str = "Original todo text";
const EDITED: &str = "Edited todo text";

/// All TodoMVC suites
#[must_use]
pub fn suites() -> Vec<Suite> {
    vec![app()]
}

fn app() -> Suite {
    Suite::new("todomvc::app", "TodoMVC Application")
        .with_tag("todomvc")
        .start_at(Site::TodoMvc, "")
        .scenario("should load the TodoMVC application", loads)
        .scenario("should add a new todo", add_one)
        .scenario("should add multiple todos", add_several)
        .scenario("should toggle todo completion", toggle_completion)
        .scenario("should delete a todo", delete_one)
        .scenario("should filter todos - All", filter_all)
        .scenario("should filter todos - Active", filter_active)
        .scenario("should filter todos - Completed", filter_completed)
        .scenario("should mark all todos as complete", mark_all)
        .scenario("should clear completed todos", clear_completed)
        .scenario("should edit a todo", edit)
        .scenario("should cancel todo edit with escape", cancel_edit)
        .scenario("should handle empty todo submission", empty_submission)
        .scenario("should persist todos across filter changes", persist_across_filters)
}

/// Add "Active todo" and "Completed todo", completing the second
async fn active_and_completed(todo: &TodoPage) -> PlaycheckResult<()> {
    todo.add_todos(&[ACTIVE, COMPLETED]).await?;
    todo.toggle(COMPLETED).await
}

async fn loads(t: TestContext) -> PlaycheckResult<()> {
    let todo = TodoPage::for_test(&t);
    let page = todo.page();
    expect(&role(page, "heading", "todos")).to_be_visible().await?;
    expect(&role(page, "textbox", NEW_TODO_LABEL)).to_be_visible().await?;
    expect(&page.get_by_text("Double-click to edit a todo")).to_be_visible().await
}

async fn add_one(t: TestContext) -> PlaycheckResult<()> {
    let todo = TodoPage::for_test(&t);
    todo.add_todo("Learn Playcheck testing").await?;
    expect(&todo.todo_item("Learn Playcheck testing")).to_be_visible().await?;
    todo.expect_items_left(1).await
}

async fn add_several(t: TestContext) -> PlaycheckResult<()> {
    let todo = TodoPage::for_test(&t);
    let texts = ["First todo", "Second todo", "Third todo"];
    todo.add_todos(&texts).await?;
    todo.expect_items_left(3).await?;
    expect(&todo.todo_items()).to_have_texts(&texts).await
}

async fn toggle_completion(t: TestContext) -> PlaycheckResult<()> {
    let todo = TodoPage::for_test(&t);
    todo.add_todo("Complete this task").await?;
    todo.toggle_nth(0).await?;
    todo.expect_items_left(0).await?;
    expect(&todo.toggles().first()).to_be_checked().await?;
    todo.toggle_nth(0).await?;
    todo.expect_items_left(1).await
}

async fn delete_one(t: TestContext) -> PlaycheckResult<()> {
    let todo = TodoPage::for_test(&t);
    let text = "Todo to delete";
    todo.add_todo(text).await?;
    expect(&todo.todo_item(text)).to_be_visible().await?;
    todo.expect_items_left(1).await?;

    todo.delete(text).await?;
    expect(&todo.todo_item(text)).not().to_be_visible().await?;
    // the footer goes away with the last item
    expect(&todo.todo_items()).to_have_count(0).await
}

async fn filter_all(t: TestContext) -> PlaycheckResult<()> {
    let todo = TodoPage::for_test(&t);
    active_and_completed(&todo).await?;
    todo.filter(TodoFilter::All).await?;
    expect(&todo.todo_items()).to_have_texts(&[ACTIVE, COMPLETED]).await
}

async fn filter_active(t: TestContext) -> PlaycheckResult<()> {
    let todo = TodoPage::for_test(&t);
    active_and_completed(&todo).await?;
    todo.filter(TodoFilter::Active).await?;
    expect(&todo.todo_item(ACTIVE)).to_be_visible().await?;
    expect(&todo.todo_item(COMPLETED)).not().to_be_visible().await
}

async fn filter_completed(t: TestContext) -> PlaycheckResult<()> {
    let todo = TodoPage::for_test(&t);
    active_and_completed(&todo).await?;
    todo.filter(TodoFilter::Completed).await?;
    expect(&todo.todo_item(ACTIVE)).not().to_be_visible().await?;
    expect(&todo.todo_item(COMPLETED)).to_be_visible().await
}

async fn mark_all(t: TestContext) -> PlaycheckResult<()> {
    let todo = TodoPage::for_test(&t);
    todo.add_todos(&["First todo", "Second todo", "Third todo"]).await?;
    todo.toggle_all().await?;
    todo.expect_items_left(0).await?;
    let toggles = todo.toggles();
    for i in 0..toggles.count().await? {
        expect(&toggles.nth(i as i64)).to_be_checked().await?;
    }
    Ok(())
}

async fn clear_completed(t: TestContext) -> PlaycheckResult<()> {
    let todo = TodoPage::for_test(&t);
    active_and_completed(&todo).await?;
    todo.clear_completed().await?;
    expect(&todo.todo_item(ACTIVE)).to_be_visible().await?;
    expect(&todo.todo_item(COMPLETED)).not().to_be_visible().await?;
    todo.expect_items_left(1).await
}

async fn edit(t: TestContext) -> PlaycheckResult<()> {
    let todo = TodoPage::for_test(&t);
    todo.add_todo(ORIGINAL).await?;
    todo.edit(ORIGINAL, EDITED).await?;
    expect(&todo.todo_item(ORIGINAL)).not().to_be_visible().await?;
    expect(&todo.todo_item(EDITED)).to_be_visible().await
}

async fn cancel_edit(t: TestContext) -> PlaycheckResult<()> {
    let todo = TodoPage::for_test(&t);
    todo.add_todo(ORIGINAL).await?;
    todo.cancel_edit(ORIGINAL, EDITED).await?;
    expect(&todo.todo_item(ORIGINAL)).to_be_visible().await?;
    expect(&todo.todo_item(EDITED)).not().to_be_visible().await
}

/// An empty submission adds nothing, so the list and its footer stay hidden
async fn empty_submission(t: TestContext) -> PlaycheckResult<()> {
    let todo = TodoPage::for_test(&t);
    todo.add_todo("").await?;
    expect(&todo.todo_items()).to_have_count(0).await?;
    expect(&todo.items_left()).not().to_be_visible().await
}

async fn persist_across_filters(t: TestContext) -> PlaycheckResult<()> {
    let todo = TodoPage::for_test(&t);
    let texts = ["First todo", "Second todo"];
    todo.add_todos(&texts).await?;
    for filter in [TodoFilter::Active, TodoFilter::Completed, TodoFilter::All] {
        todo.filter(filter).await?;
    }
    expect(&todo.todo_items()).to_have_texts(&texts).await?;
    todo.expect_items_left(2).await
}
