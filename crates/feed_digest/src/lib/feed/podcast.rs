use reqwest::Client;

use crate::{
    feed::{feed_client, fetch_feed_document, FeedSource},
    parser::parse_rss_feed,
    types::FeedItem,
};

/// An RSS 2.0 podcast feed; episodes without an audio enclosure are dropped
#[derive(Debug, Clone)]
pub struct PodcastFeed {
    client: Client,
    url: Option<String>,
    limit: usize,
}

impl PodcastFeed {
    pub fn new(url: Option<String>, limit: usize) -> anyhow::Result<Self> {
        Ok(Self {
            client: feed_client()?,
            url,
            limit,
        })
    }
}

impl FeedSource for PodcastFeed {
    async fn fetch_items(&self) -> anyhow::Result<Vec<FeedItem>> {
        let document = fetch_feed_document(&self.client, self.url.as_deref()).await?;
        let items = parse_rss_feed(&document, self.limit, true)?;

        tracing::info!(count = items.len(), "Parsed podcast feed");
        Ok(items)
    }
}
