//! Downloads, uploads and the basic-auth protected download list.

use std::path::PathBuf;

use super::suite;
use crate::assertion::Assertion;
use crate::context::ContextOptions;
use crate::download::Download;
use crate::expect::expect;
use crate::harness::{Suite, TestContext};
use crate::locator::Locator;
use crate::page::Page;
use crate::result::{PlaycheckError, PlaycheckResult};
use crate::scenarios::{non_empty, role};
use crate::sites::the_internet::Credentials;
use crate::sites::Site;
use tracing::debug;

const UPLOAD_NAME: &str = "test-upload.txt";
const UPLOAD_CONTENT: &str = "This is a test file for upload testing.";

pub(super) fn suites() -> Vec<Suite> {
    vec![file_download(), file_upload(), secure_download()]
}

fn download_links(page: &Page) -> Locator {
    page.locator(".example a")
}

/// Click `link`, wait for the download and check it landed on disk
async fn download_via(page: &Page, link: &Locator) -> PlaycheckResult<Download> {
    let download = page.expect_download(|| link.click()).await?;
    Assertion::is_false(download.suggested_filename().is_empty(), "download has no filename").check()?;
    let path = download.path()?;
    debug!(file = %download.suggested_filename(), path = %path.display(), "downloaded");
    Ok(download)
}

// ============================================================================
// File download
// ============================================================================

fn file_download() -> Suite {
    suite("files::file_download", "File Download", "download")
        .scenario("should display download page with files", download_page)
        .scenario("should list available files", list_files)
        .scenario("should download a file", download_one)
        .scenario("should handle multiple downloads", download_several)
}

async fn download_page(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&page.get_by_text("File Downloader")).to_be_visible().await?;
    non_empty("download links", download_links(page).count().await?)
}

async fn list_files(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    for name in ["some-file.txt", "file.txt"] {
        let link = page.locator(&format!("a[href*=\"{name}\"]"));
        if link.count().await? > 0 {
            expect(&link.first()).to_be_visible().await?;
        }
    }
    Ok(())
}

async fn download_one(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    let link = download_links(page).first();
    let name = link.text_content().await?;
    let download = download_via(page, &link).await?;
    Assertion::equals(name.trim(), download.suggested_filename()).check()
}

async fn download_several(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    let links = download_links(page);
    let wanted = links.count().await?.min(3);
    for i in 0..wanted {
        download_via(page, &links.nth(i as i64)).await?;
    }
    Ok(())
}

// ============================================================================
// File upload
// ============================================================================

fn file_upload() -> Suite {
    suite("files::file_upload", "File Upload", "upload")
        .scenario("should display upload page", upload_page)
        .scenario("should upload a file successfully", upload_one)
        .scenario("should show uploaded file details", upload_details)
        .scenario("should handle drag and drop upload", upload_drag_area)
        .scenario("should handle multiple file upload", upload_several)
        .scenario("should handle upload without selecting file", upload_nothing)
}

/// Write an upload fixture under the run's artifacts directory
async fn upload_file(t: &TestContext, name: &str, content: &str) -> PlaycheckResult<PathBuf> {
    let dir = t.config().artifacts_dir.join("uploads");
    tokio::fs::create_dir_all(&dir).await?;
    let path = dir.join(name);
    tokio::fs::write(&path, content).await?;
    Ok(path)
}

async fn upload(t: &TestContext, files: &[PathBuf]) -> PlaycheckResult<()> {
    let page = t.page();
    page.locator("#file-upload").set_input_files(files).await?;
    role(page, "button", "Upload").click().await
}

async fn upload_page(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&page.get_by_text("File Uploader")).to_be_visible().await?;
    expect(&page.locator("#file-upload")).to_be_visible().await?;
    expect(&role(page, "button", "Upload")).to_be_visible().await
}

async fn upload_one(t: TestContext) -> PlaycheckResult<()> {
    let file = upload_file(&t, UPLOAD_NAME, UPLOAD_CONTENT).await?;
    upload(&t, &[file]).await?;
    let page = t.page();
    expect(&page.get_by_text("File Uploaded!")).to_be_visible().await?;
    expect(&page.locator("#uploaded-files")).to_contain_text(UPLOAD_NAME).await
}

async fn upload_details(t: TestContext) -> PlaycheckResult<()> {
    let file = upload_file(&t, UPLOAD_NAME, UPLOAD_CONTENT).await?;
    upload(&t, &[file]).await?;
    let uploaded = t.page().locator("#uploaded-files");
    expect(&uploaded).to_be_visible().await?;
    expect(&uploaded).to_contain_text(UPLOAD_NAME).await
}

/// The drag area feeds the same form, so the input path covers it
async fn upload_drag_area(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    expect(&page.locator("#drag-drop-upload")).to_be_visible().await?;
    let file = upload_file(&t, UPLOAD_NAME, UPLOAD_CONTENT).await?;
    upload(&t, &[file]).await?;
    expect(&page.get_by_text("File Uploaded!")).to_be_visible().await
}

async fn upload_several(t: TestContext) -> PlaycheckResult<()> {
    let mut files = vec![upload_file(&t, UPLOAD_NAME, UPLOAD_CONTENT).await?];
    for n in 2..=3 {
        files.push(upload_file(&t, &format!("test-upload-{n}.txt"), &format!("Test file content {n}")).await?);
    }
    let outcome = async {
        upload(&t, &files).await?;
        expect(&t.page().get_by_text("File Uploaded!")).to_be_visible().await
    }
    .await;
    for file in &files[1..] {
        if let Err(e) = tokio::fs::remove_file(file).await {
            debug!(file = %file.display(), error = %e, "upload fixture not removed");
        }
    }
    outcome
}

async fn upload_nothing(t: TestContext) -> PlaycheckResult<()> {
    let page = t.page();
    role(page, "button", "Upload").click().await?;
    expect(&page.locator("#file-upload")).to_be_visible().await
}

// ============================================================================
// Secure file download
// ============================================================================

fn secure_download() -> Suite {
    Suite::new("the_internet::files::secure_file_download", "Secure File Download")
        .with_tag("the_internet")
        .scenario("should require credentials for secure download", secure_unauthorized)
        .scenario("should allow download after authentication", secure_authorized)
        .scenario("should deny access without authentication", secure_denied)
}

async fn secure_unauthorized(t: TestContext) -> PlaycheckResult<()> {
    let response = t.goto(Site::TheInternet, "download_secure").await?;
    Assertion::equals(&401, &response.status()).context("download_secure").check()
}

async fn secure_authorized(t: TestContext) -> PlaycheckResult<()> {
    let context = t
        .browser()
        .new_context(ContextOptions::new().with_http_credentials(Credentials::HTTP.username, Credentials::HTTP.password))
        .await?;
    let page = context.new_page().await?;
    let outcome = async {
        let response = page.goto(&t.site_url(Site::TheInternet, "download_secure")).await?;
        Assertion::equals(&200, &response.status()).context("download_secure").check()?;
        let links = download_links(&page);
        non_empty("secure download links", links.count().await?)?;
        download_via(&page, &links.first()).await?;
        Ok::<_, PlaycheckError>(())
    }
    .await;
    context.close().await?;
    outcome
}

async fn secure_denied(t: TestContext) -> PlaycheckResult<()> {
    let context = t
        .browser()
        .new_context(ContextOptions::new().with_http_credentials(Credentials::HTTP.username, "not-the-password"))
        .await?;
    let page = context.new_page().await?;
    let outcome = async {
        let response = page.goto(&t.site_url(Site::TheInternet, "download_secure")).await?;
        expect(&download_links(&page)).to_have_count(0).await?;
        Assertion::equals(&401, &response.status()).context("download_secure").check()
    }
    .await;
    context.close().await?;
    outcome
}
