use std::{path::Path, time::Duration};

use reqwest::Client;

use crate::{
    extract::{ContentExtractor, ExtractError, ExtractedContent},
    parser::{caption_tracks, parse_timed_text, select_caption_track, WatchPageDocument},
    types::{CaptionTrack, FeedItem, PlayerResponse},
};

/// Builds a transcript for a YouTube video from its caption track
#[derive(Debug, Clone)]
pub struct CaptionExtractor {
    client: Client,
    preferred_language: String,
}

impl CaptionExtractor {
    const WATCH_URL: &str = "https://www.youtube.com/watch";
    const TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(preferred_language: impl Into<String>) -> Result<Self, ExtractError> {
        let client = Client::builder().timeout(Self::TIMEOUT).build()?;

        Ok(Self {
            client,
            preferred_language: preferred_language.into(),
        })
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_watch_page(&self, video_id: &str) -> Result<WatchPageDocument, ExtractError> {
        let resp = self
            .client
            .get(Self::WATCH_URL)
            .query(&[("v", video_id)])
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ExtractError::Status {
                status: resp.status().as_u16(),
                url: resp.url().to_string(),
            });
        }

        Ok(resp.text().await?.into())
    }

    #[tracing::instrument(skip_all, fields(language = %track.language_code, generated = track.is_generated()))]
    async fn fetch_transcript(&self, track: &CaptionTrack) -> Result<String, ExtractError> {
        // srv3 is a different XML dialect; the default format has plain <text> segments
        let url = track.base_url.replace("&fmt=srv3", "");

        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(ExtractError::Status {
                status: resp.status().as_u16(),
                url,
            });
        }

        let document = resp.text().await?;
        Ok(parse_timed_text(&document).join(" "))
    }
}

impl ContentExtractor for CaptionExtractor {
    type Error = ExtractError;

    #[tracing::instrument(skip_all, fields(item_id = %item.id))]
    async fn extract(
        &self,
        item: &FeedItem,
        _workdir: &Path,
    ) -> Result<ExtractedContent, Self::Error> {
        let page = self.fetch_watch_page(&item.id).await?;
        let player = page.to_json::<PlayerResponse>()?;

        let track = select_caption_track(caption_tracks(&player), &self.preferred_language)
            .ok_or(ExtractError::NoCaptions)?;

        if !track.matches_language(&self.preferred_language) {
            tracing::info!(
                preferred = %self.preferred_language,
                using = %track.language_code,
                "Preferred caption language unavailable, falling back"
            );
        }

        let transcript = self.fetch_transcript(track).await?;
        if transcript.is_empty() {
            return Err(ExtractError::NoCaptions);
        }

        tracing::info!(chars = transcript.len(), "Fetched transcript");
        Ok(ExtractedContent::Transcript(transcript))
    }
}
