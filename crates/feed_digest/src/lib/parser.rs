//! # Feed Parser
//!
//! Turns raw feed documents into [`FeedItem`]s and pulls caption data out of
//! YouTube watch pages.
//!
//! Two feed dialects are understood: the Atom document YouTube publishes per channel,
//! and plain RSS 2.0 podcast feeds with `enclosure` elements.

use std::{ops::Deref, sync::LazyLock};

use chrono::{DateTime, Utc};
use regex::{Captures, Regex};
use serde::de::DeserializeOwned;

use crate::{
    error::Error,
    types::{CaptionTrack, FeedItem, PlayerResponse},
};

static YT_PLAYER_RESPONSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)var\s+ytInitialPlayerResponse\s*=\s*(\{.*?\});\s*(?:var\s|</script>)")
        .unwrap()
});

static TIMED_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<text\b[^>]*>(.*?)</text>").unwrap());

static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[xX][0-9A-Fa-f]+|#[0-9]+|[A-Za-z]+);").unwrap());

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

const YT_VIDEO_ID_PREFIX: &str = "yt:video:";

/// Parses a YouTube channel Atom feed.
///
/// # Parameters
/// * `document`: raw bytes of the Atom document.
/// * `limit`: maximum number of entries to consider, in feed order.
///
/// # Returns
/// * `Ok(Vec<FeedItem>)` in feed order; entries without an id or title are dropped.
/// * `Err(Error::Feed)` if the document cannot be parsed at all.
#[tracing::instrument(skip(document))]
pub fn parse_atom_feed(document: &[u8], limit: usize) -> Result<Vec<FeedItem>, Error> {
    let feed = feed_rs::parser::parse(document).map_err(|e| Error::Feed(e.to_string()))?;

    let items = feed
        .entries
        .into_iter()
        .take(limit)
        .filter_map(|entry| {
            let link = entry.links.first().map(|l| l.href.trim().to_string());
            let id = entry.id.trim();
            let id = id.strip_prefix(YT_VIDEO_ID_PREFIX).unwrap_or(id).to_string();
            let id = if id.is_empty() { link.clone()? } else { id };

            let Some(title) = entry
                .title
                .map(|t| t.content.trim().to_string())
                .filter(|t| !t.is_empty())
            else {
                tracing::debug!(id = %id, "Dropping feed entry without a title");
                return None;
            };

            Some(FeedItem {
                id,
                title,
                link,
                published_at: entry.published.or(entry.updated),
                ..Default::default()
            })
        })
        .collect();

    Ok(items)
}

/// Parses an RSS 2.0 feed.
///
/// The item id is the `guid`, falling back to `link` and then to the enclosure url.
/// Items with none of those, or without a title, are dropped. When
/// `require_enclosure` is set, items without an enclosure url are dropped as well.
/// A malformed `pubDate` keeps the item but leaves `published_at` empty.
#[tracing::instrument(skip(document))]
pub fn parse_rss_feed(
    document: &[u8],
    limit: usize,
    require_enclosure: bool,
) -> Result<Vec<FeedItem>, Error> {
    let channel = rss::Channel::read_from(document).map_err(|e| Error::Feed(e.to_string()))?;

    let items = channel
        .items()
        .iter()
        .take(limit)
        .filter_map(|item| rss_item_to_feed_item(item, require_enclosure))
        .collect();

    Ok(items)
}

fn rss_item_to_feed_item(item: &rss::Item, require_enclosure: bool) -> Option<FeedItem> {
    let non_empty = |s: &str| {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    };

    let audio_url = item.enclosure().and_then(|e| non_empty(e.url()));
    let audio_mime_type = item.enclosure().and_then(|e| non_empty(e.mime_type()));
    let link = item.link().and_then(non_empty);

    if require_enclosure && audio_url.is_none() {
        tracing::debug!(title = ?item.title(), "Dropping feed item without an audio enclosure");
        return None;
    }

    let id = item
        .guid()
        .and_then(|g| non_empty(g.value()))
        .or_else(|| link.clone())
        .or_else(|| audio_url.clone())?;

    let Some(title) = item.title().and_then(non_empty) else {
        tracing::debug!(id = %id, "Dropping feed item without a title");
        return None;
    };

    let published_at = item.pub_date().and_then(parse_rfc2822);

    Some(FeedItem {
        id,
        title,
        link,
        audio_url,
        audio_mime_type,
        published_at,
    })
}

fn parse_rfc2822(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .inspect_err(|e| tracing::warn!(error = %e, raw, "Failed to parse pubDate"))
        .ok()
}

/// Picks the caption track to transcribe from.
///
/// Preference order: a manually created track in `preferred_language`, an
/// auto-generated one in that language, the first manually created track in any
/// language, then the first track of any kind.
pub fn select_caption_track<'a>(
    tracks: &'a [CaptionTrack],
    preferred_language: &str,
) -> Option<&'a CaptionTrack> {
    tracks
        .iter()
        .find(|t| !t.is_generated() && t.matches_language(preferred_language))
        .or_else(|| {
            tracks
                .iter()
                .find(|t| t.is_generated() && t.matches_language(preferred_language))
        })
        .or_else(|| tracks.iter().find(|t| !t.is_generated()))
        .or_else(|| tracks.first())
}

/// Caption tracks advertised by a player response, in page order
pub fn caption_tracks(player: &PlayerResponse) -> &[CaptionTrack] {
    player
        .captions
        .as_ref()
        .and_then(|c| c.tracklist.as_ref())
        .map(|t| t.caption_tracks.as_slice())
        .unwrap_or_default()
}

/// Extracts the text of every `<text>` segment in a YouTube timed-text document.
///
/// Segment bodies arrive entity-escaped twice and may carry inline formatting tags;
/// both are removed. Empty segments are skipped.
pub fn parse_timed_text(document: &str) -> Vec<String> {
    TIMED_TEXT_RE
        .captures_iter(document)
        .filter_map(|cap| {
            let raw = cap.get(1)?.as_str();
            let text = unescape_entities(&unescape_entities(raw));
            let text = TAG_RE.replace_all(&text, "").replace('\n', " ");
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        })
        .collect()
}

fn unescape_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ if entity.starts_with("#x") || entity.starts_with("#X") => {
                    u32::from_str_radix(&entity[2..], 16)
                        .ok()
                        .and_then(char::from_u32)
                }
                _ if entity.starts_with('#') => {
                    entity[1..].parse::<u32>().ok().and_then(char::from_u32)
                }
                _ => None,
            };

            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

pub struct WatchPageDocument(String);

impl Deref for WatchPageDocument {
    type Target = String;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl WatchPageDocument {
    pub fn new(doc: String) -> Self {
        WatchPageDocument(doc)
    }

    /// Deserializes the `ytInitialPlayerResponse` object embedded in the page
    pub fn to_json<T>(&self) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let json = YT_PLAYER_RESPONSE_RE
            .captures(self)
            .and_then(|cap| cap.get(1))
            .ok_or(Error::ParseError(
                "Failed to find ytInitialPlayerResponse in the page's script tags",
            ))?;

        Ok(serde_json::from_str(json.as_str())?)
    }
}

impl From<String> for WatchPageDocument {
    fn from(value: String) -> Self {
        WatchPageDocument(value)
    }
}
