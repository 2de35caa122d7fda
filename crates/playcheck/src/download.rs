//! Downloaded files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::result::{PlaycheckError, PlaycheckResult};

/// Progress of a browser download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownloadState {
    /// Bytes are still arriving
    InProgress,
    /// File is complete on disk
    Completed,
    /// Download was cancelled or failed
    Canceled,
}

/// Download as reported by the driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadInfo {
    /// Browser-assigned identifier
    pub guid: String,
    /// URL the file was fetched from
    pub url: String,
    /// Filename proposed by the server or link
    pub suggested_filename: String,
    /// Location of the finished file
    pub path: Option<PathBuf>,
    /// Current state
    pub state: DownloadState,
}

/// A finished download handed to a scenario
#[derive(Debug, Clone)]
pub struct Download {
    info: DownloadInfo,
}

impl Download {
    /// Wrap driver information
    #[must_use]
    pub const fn new(info: DownloadInfo) -> Self {
        Self { info }
    }

    /// URL the file was fetched from
    #[must_use]
    pub fn url(&self) -> &str {
        &self.info.url
    }

    /// Filename proposed by the server or link
    #[must_use]
    pub fn suggested_filename(&self) -> &str {
        &self.info.suggested_filename
    }

    /// Where the browser stored the file
    ///
    /// # Errors
    ///
    /// Returns a download error when the download did not complete
    pub fn path(&self) -> PlaycheckResult<&Path> {
        match (&self.info.state, &self.info.path) {
            (DownloadState::Completed, Some(path)) => Ok(path),
            (state, _) => Err(PlaycheckError::DownloadError {
                message: format!("{} is {state:?}", self.info.suggested_filename),
            }),
        }
    }

    /// Copy the file to `target`, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns an error if the download is incomplete or the copy fails
    pub async fn save_as(&self, target: impl AsRef<Path>) -> PlaycheckResult<PathBuf> {
        let source = self.path()?;
        let target = target.as_ref();
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(source, target).await?;
        info!(file = %self.info.suggested_filename, target = %target.display(), "download saved");
        Ok(target.to_path_buf())
    }

    /// Size of the downloaded file in bytes
    ///
    /// # Errors
    ///
    /// Returns an error if the download is incomplete or unreadable
    pub async fn size(&self) -> PlaycheckResult<u64> {
        let meta = tokio::fs::metadata(self.path()?).await?;
        Ok(meta.len())
    }
}
