use std::{path::Path, time::Duration};

use futures::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;

use crate::{
    extract::{ContentExtractor, ExtractError, ExtractedContent, ScratchFile},
    types::FeedItem,
};

/// Downloads a podcast episode's audio enclosure into the scratch directory
#[derive(Debug, Clone)]
pub struct EnclosureDownloader {
    client: Client,
}

impl EnclosureDownloader {
    const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    /// Applies to each chunk; a long episode may take minutes overall
    const READ_TIMEOUT: Duration = Duration::from_secs(60);
    const DEFAULT_MIME_TYPE: &str = "audio/mpeg";

    pub fn new() -> Result<Self, ExtractError> {
        let client = Client::builder()
            .connect_timeout(Self::CONNECT_TIMEOUT)
            .build()?;

        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Streams `url` into `dest` chunk by chunk, returning the number of bytes written
    #[tracing::instrument(skip(self))]
    pub async fn download_to(&self, url: &str, dest: &Path) -> Result<u64, ExtractError> {
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(ExtractError::Status {
                status: resp.status().as_u16(),
                url: url.to_string(),
            });
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = resp.bytes_stream();
        let mut written = 0u64;

        loop {
            let next = tokio::time::timeout(Self::READ_TIMEOUT, stream.next())
                .await
                .map_err(|_| ExtractError::ReadTimeout {
                    url: url.to_string(),
                })?;

            let Some(chunk) = next else { break };
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        tracing::info!(bytes = written, "Downloaded audio");

        Ok(written)
    }
}

/// File name safe for any filesystem, derived from an item id that may be a URL
pub fn scratch_file_name(item_id: &str) -> String {
    let stem = item_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(80)
        .collect::<String>();

    format!("{stem}.audio")
}

impl ContentExtractor for EnclosureDownloader {
    type Error = ExtractError;

    #[tracing::instrument(skip_all, fields(item_id = %item.id))]
    async fn extract(
        &self,
        item: &FeedItem,
        workdir: &Path,
    ) -> Result<ExtractedContent, Self::Error> {
        let url = item.audio_url.as_deref().ok_or(ExtractError::MissingAudioUrl)?;
        let mime_type = item
            .audio_mime_type
            .as_deref()
            .filter(|m| m.starts_with("audio/"))
            .unwrap_or(Self::DEFAULT_MIME_TYPE);

        // created before the download so a partial file is removed on failure
        let scratch = ScratchFile::new(
            workdir.join("audio").join(scratch_file_name(&item.id)),
            mime_type,
        );

        self.download_to(url, scratch.path()).await?;

        Ok(ExtractedContent::Audio(scratch))
    }
}
