use std::sync::{Arc, Mutex};

use feed_digest::{
    feed::FeedSource,
    parser::{parse_atom_feed, parse_rss_feed},
    types::FeedItem,
};

#[derive(Clone)]
pub struct MockFeedSource {
    pub items: Vec<FeedItem>,
    pub calls: Arc<Mutex<usize>>,
    pub fail_with: Option<String>,
}

impl MockFeedSource {
    pub fn new(items: Vec<FeedItem>) -> Self {
        Self {
            items,
            calls: Arc::new(Mutex::new(0)),
            fail_with: None,
        }
    }

    pub fn from_video_fixture() -> Self {
        let items = parse_atom_feed(include_bytes!("../fixtures/youtube_feed.xml"), 20)
            .expect("Video fixture should parse");
        Self::new(items)
    }

    pub fn from_podcast_fixture() -> Self {
        let items = parse_rss_feed(include_bytes!("../fixtures/podcast_feed.xml"), 20, true)
            .expect("Podcast fixture should parse");
        Self::new(items)
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Self::new(Vec::new())
        }
    }
}

impl FeedSource for MockFeedSource {
    async fn fetch_items(&self) -> anyhow::Result<Vec<FeedItem>> {
        *self.calls.lock().unwrap() += 1;
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        Ok(self.items.clone())
    }
}
