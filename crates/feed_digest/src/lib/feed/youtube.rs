use reqwest::Client;

use crate::{
    feed::{feed_client, fetch_feed_document, FeedSource},
    parser::parse_atom_feed,
    types::FeedItem,
};

/// A YouTube channel's Atom upload feed
#[derive(Debug, Clone)]
pub struct YoutubeFeed {
    client: Client,
    url: Option<String>,
    limit: usize,
}

impl YoutubeFeed {
    pub fn new(url: Option<String>, limit: usize) -> anyhow::Result<Self> {
        Ok(Self {
            client: feed_client()?,
            url,
            limit,
        })
    }
}

impl FeedSource for YoutubeFeed {
    async fn fetch_items(&self) -> anyhow::Result<Vec<FeedItem>> {
        let document = fetch_feed_document(&self.client, self.url.as_deref()).await?;
        let items = parse_atom_feed(&document, self.limit)?;

        tracing::info!(count = items.len(), "Parsed video feed");
        Ok(items)
    }
}
