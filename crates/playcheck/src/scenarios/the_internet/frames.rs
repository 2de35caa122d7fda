//! Frames, nested frames and popup windows.

use super::suite;
use crate::assertion::Assertion;
use crate::expect::{expect, expect_page};
use crate::harness::{Suite, TestContext};
use crate::locator::FrameLocator;
use crate::matcher::UrlMatcher;
use crate::page::Page;
use crate::result::{PlaycheckError, PlaycheckResult};
use crate::scenarios::role;
use crate::sites::Site;

const EDITOR_FRAME: &str = "#mce_0_ifr";

pub(super) fn suites() -> Vec<Suite> {
    vec![frames(), nested_frames(), multiple_windows()]
}

// ============================================================================
// Frames
// ============================================================================

fn frames() -> Suite {
    suite("frames::frames", "Frames", "frames")
        .scenario("should display frames page", frames_page)
        .scenario("should navigate to iframe page", open_iframe_page)
        .scenario("should handle iframe content", iframe_content)
        .scenario("should handle iframe formatting", iframe_formatting)
        .scenario("should handle iframe focus", iframe_focus)
}

/// Open the TinyMCE page and return its editor frame
async fn editor(t: &TestContext) -> PlaycheckResult<FrameLocator> {
    t.goto(Site::TheInternet, "iframe").await?;
    Ok(t.page().frame_locator(EDITOR_FRAME))
}

async fn frames_page(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&role(page, "heading", "Frames")).to_be_visible().await?;
    expect(&role(page, "link", "iFrame")).to_be_visible().await
}

async fn open_iframe_page(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    role(page, "link", "iFrame").click().await?;
    expect_page(page).to_have_url(UrlMatcher::regex("iframe")?).await?;
    expect(&page.get_by_text("An iFrame containing the TinyMCE WYSIWYG Editor"))
        .to_be_visible()
        .await
}

async fn iframe_content(t: TestContext) -> PlaycheckResult<()> {
    let frame = editor(&t).await?;
    let body = frame.locator("#tinymce");
    let paragraph = frame.locator("#tinymce p");
    expect(&body).to_be_visible().await?;

    let initial = paragraph.text_content().await?;
    Assertion::contains(&initial, "Your content goes here.").check()?;

    body.click().await?;
    paragraph.fill("Hello from Playcheck!").await?;
    let updated = paragraph.text_content().await?;
    Assertion::equals("Hello from Playcheck!", updated.as_str()).check()
}

async fn iframe_formatting(t: TestContext) -> PlaycheckResult<()> {
    let frame = editor(&t).await?;
    frame.locator("#tinymce").click().await?;
    let toolbar = t.page().locator(".tox-toolbar__primary, .mce-toolbar");
    if toolbar.count().await? > 0 {
        expect(&toolbar.first()).to_be_visible().await?;
    }
    Ok(())
}

async fn iframe_focus(t: TestContext) -> PlaycheckResult<()> {
    let frame = editor(&t).await?;
    let body = frame.locator("#tinymce");
    body.click().await?;
    expect(&body).to_be_focused().await?;

    let paragraph = frame.locator("#tinymce p");
    paragraph.fill("Test focus").await?;
    expect(&paragraph).to_contain_text("Test focus").await
}

// ============================================================================
// Nested frames
// ============================================================================

fn nested_frames() -> Suite {
    suite("frames::nested_frames", "Nested Frames", "nested_frames")
        .scenario("should display nested frames page", nested_page)
        .scenario("should handle frame hierarchy", frame_hierarchy)
        .scenario("should interact with top frame", top_frame)
        .scenario("should interact with left frame", |t| inner_frame(t, "left"))
        .scenario("should interact with middle frame", |t| inner_frame(t, "middle"))
        .scenario("should interact with right frame", |t| inner_frame(t, "right"))
        .scenario("should interact with bottom frame", bottom_frame)
        .scenario("should verify all frames are present", all_frames_present)
}

fn named_frame(name: &str) -> String {
    format!("frame[name=\"frame-{name}\"]")
}

fn top(page: &Page) -> FrameLocator {
    page.frame_locator(&named_frame("top"))
}

/// The page is a bare frameset, so its title is the only text it carries
async fn nested_page(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect_page(page).to_have_url(UrlMatcher::regex("nested_frames")?).await?;
    expect(&page.locator(&named_frame("top"))).to_be_attached().await
}

async fn frame_hierarchy(t: TestContext) -> PlaycheckResult<()> {
    let outer: u32 = t.page().evaluate_as("window.frames.length").await?;
    Assertion::greater_than(outer, 1).context("top-level frames").check()?;
    let inner: u32 = t
        .page()
        .evaluate_as("window.frames['frame-top'].frames.length")
        .await?;
    Assertion::equals(&3, &inner).context("frames inside frame-top").check()
}

async fn top_frame(t: TestContext) -> PlaycheckResult<()> {
    expect(&top(t.page()).body()).to_be_visible().await
}

async fn inner_frame(t: TestContext, name: &'static str) -> PlaycheckResult<()> {
    let frame = top(t.page()).frame_locator(&named_frame(name));
    expect(&frame.body()).to_contain_text(&name.to_uppercase()).await
}

async fn bottom_frame(t: TestContext) -> PlaycheckResult<()> {
    let frame = t.page().frame_locator(&named_frame("bottom"));
    expect(&frame.body()).to_contain_text("BOTTOM").await
}

async fn all_frames_present(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&page.locator(&named_frame("top"))).to_be_visible().await?;
    expect(&page.locator(&named_frame("bottom"))).to_be_visible().await?;
    let top = top(page);
    for name in ["left", "middle", "right"] {
        expect(&top.locator(&named_frame(name))).to_be_visible().await?;
    }
    Ok(())
}

// ============================================================================
// Multiple windows
// ============================================================================

fn multiple_windows() -> Suite {
    suite("frames::multiple_windows", "Multiple Windows", "windows")
        .scenario("should display windows page", windows_page)
        .scenario("should open new window", open_window)
        .scenario("should handle multiple windows", open_many_windows)
        .scenario("should maintain original page focus", opener_unchanged)
        .scenario("should switch between windows", switch_windows)
        .scenario("should handle window content interaction", window_content)
}

/// Click "Click Here" and return the window it opens
async fn open_new_window(page: &Page) -> PlaycheckResult<Page> {
    let link = role(page, "link", "Click Here");
    page.expect_popup(|| link.click()).await
}

/// Run `check` against a fresh popup, closing it either way
async fn with_new_window<F, Fut>(page: &Page, check: F) -> PlaycheckResult<()>
where
    F: FnOnce(Page) -> Fut,
    Fut: std::future::Future<Output = PlaycheckResult<()>>,
{
    let popup = open_new_window(page).await?;
    let outcome = check(popup.clone()).await;
    popup.close().await?;
    outcome
}

async fn windows_page(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&page.get_by_text("Opening a new window")).to_be_visible().await?;
    expect(&role(page, "link", "Click Here")).to_be_visible().await
}

async fn open_window(t: TestContext) -> PlaycheckResult<()> {
    with_new_window(t.page(), |popup| async move {
        expect(&popup.get_by_text("New Window")).to_be_visible().await?;
        expect(&popup.locator("h3")).to_contain_text("New Window").await?;
        expect_page(&popup).to_have_url(UrlMatcher::regex(r"windows/new")?).await
    })
    .await
}

async fn open_many_windows(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    let mut popups = Vec::with_capacity(3);
    for _ in 0..3 {
        popups.push(open_new_window(page).await?);
    }
    let mut outcome = Ok(());
    for popup in &popups {
        if outcome.is_ok() {
            outcome = expect(&popup.get_by_text("New Window")).to_be_visible().await;
        }
    }
    for popup in popups {
        popup.close().await?;
    }
    outcome
}

async fn opener_unchanged(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    let original = page.url().await?;
    with_new_window(page, |_| async {
        expect_page(page).to_have_url(original.as_str()).await?;
        expect(&role(page, "link", "Click Here")).to_be_visible().await
    })
    .await
}

async fn switch_windows(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    with_new_window(page, |popup| async move {
        page.bring_to_front().await?;
        expect(&role(page, "link", "Click Here")).to_be_visible().await?;
        popup.bring_to_front().await?;
        expect(&popup.get_by_text("New Window")).to_be_visible().await
    })
    .await
}

async fn window_content(t: TestContext) -> PlaycheckResult<()> {
    with_new_window(t.page(), |popup| async move {
        expect(&popup.locator("div.example")).to_be_visible().await?;
        expect(&popup.locator("h3")).to_have_text("New Window").await?;
        let links = popup.locator("a");
        if links.count().await? > 0 {
            expect(&links.first()).to_be_visible().await?;
        }
        Ok::<_, PlaycheckError>(())
    })
    .await
}
