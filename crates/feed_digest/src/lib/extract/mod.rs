pub mod captions;
pub mod enclosure;

use std::{
    fmt::{Debug, Display},
    future::Future,
    path::{Path, PathBuf},
};

use crate::types::FeedItem;

/// Text or audio handed to the summarizer for one feed item
#[derive(Debug)]
pub enum ExtractedContent {
    Transcript(String),
    Audio(ScratchFile),
}

pub trait ContentExtractor {
    type Error: Debug + Display + Send;

    /// `workdir` is a scratch directory the extractor may write into
    fn extract(
        &self,
        item: &FeedItem,
        workdir: &Path,
    ) -> impl Future<Output = Result<ExtractedContent, Self::Error>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("Timed out waiting for data from {url}")]
    ReadTimeout { url: String },
    #[error("No captions available in any language")]
    NoCaptions,
    #[error("Item has no audio url")]
    MissingAudioUrl,
    #[error(transparent)]
    Parse(#[from] crate::error::Error),
}

/// A file in the scratch directory that is deleted when dropped
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    mime_type: String,
}

impl ScratchFile {
    pub fn new(path: impl Into<PathBuf>, mime_type: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if !self.path.exists() {
            return;
        }

        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(error = ?e, path = ?self.path, "Failed to remove scratch file");
        } else {
            tracing::debug!(path = ?self.path, "Removed scratch file");
        }
    }
}
