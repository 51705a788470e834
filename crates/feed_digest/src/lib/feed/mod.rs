pub mod podcast;
pub mod youtube;

use std::{future::Future, time::Duration};

use anyhow::Context;
use reqwest::Client;

use crate::types::FeedItem;

pub use podcast::PodcastFeed;
pub use youtube::YoutubeFeed;

pub trait FeedSource {
    /// Parsed entries in feed order. Errors are reported, never retried.
    fn fetch_items(&self) -> impl Future<Output = anyhow::Result<Vec<FeedItem>>> + Send;
}

impl<T: FeedSource + Send + Sync> FeedSource for &T {
    async fn fetch_items(&self) -> anyhow::Result<Vec<FeedItem>> {
        (**self).fetch_items().await
    }
}

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn feed_client() -> anyhow::Result<Client> {
    Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .context("Failed to build feed http client")
}

/// GETs the raw feed document, treating a non-2xx status as an error
#[tracing::instrument(skip(client))]
pub(crate) async fn fetch_feed_document(
    client: &Client,
    url: Option<&str>,
) -> anyhow::Result<Vec<u8>> {
    let url = url.context("Feed URL not configured")?;

    let bytes = client
        .get(url)
        .send()
        .await
        .context("Failed to fetch feed")?
        .error_for_status()
        .with_context(|| format!("Feed returned error status: {url}"))?
        .bytes()
        .await
        .context("Failed to read feed body")?;

    tracing::debug!(bytes = bytes.len(), "Fetched feed document");
    Ok(bytes.to_vec())
}
