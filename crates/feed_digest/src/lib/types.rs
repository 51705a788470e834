use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One discrete piece of content (video or podcast episode) discovered in a feed.
///
/// Built fresh on every fetch; only `id` and `title` outlive a run, as a processed marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedItem {
    /// Stable identifier: guid, else link, else audio url
    pub id: String,
    pub title: String,
    pub link: Option<String>,
    pub audio_url: Option<String>,
    pub audio_mime_type: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// The subset of `ytInitialPlayerResponse` needed to locate caption tracks
#[derive(Debug, Deserialize)]
pub struct PlayerResponse {
    pub captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
pub struct Captions {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    pub tracklist: Option<CaptionTracklist>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTracklist {
    #[serde(default)]
    pub caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: String,
    pub language_code: String,
    /// `"asr"` for auto-generated tracks
    pub kind: Option<String>,
}

impl CaptionTrack {
    pub fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }

    /// Matches `en` against both `en` and regional tags such as `en-GB`
    pub fn matches_language(&self, language: &str) -> bool {
        self.language_code == language
            || self
                .language_code
                .split_once('-')
                .is_some_and(|(primary, _)| primary == language)
    }
}
