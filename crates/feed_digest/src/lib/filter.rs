//! Recency policies deciding which feed items are candidates for the current run.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use itertools::Itertools;

use crate::types::FeedItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecencyPolicy {
    /// The first feed entry is the only candidate, whatever its date
    LatestOnly,
    /// Every item published on the target date, most recent first
    TargetDate { date_override: Option<NaiveDate> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub candidates: Vec<FeedItem>,
    /// Set when the policy selected by date
    pub target_date: Option<NaiveDate>,
}

impl RecencyPolicy {
    pub fn select(&self, items: Vec<FeedItem>, timezone: Tz, now: DateTime<Utc>) -> Selection {
        match self {
            RecencyPolicy::LatestOnly => Selection {
                candidates: items.into_iter().take(1).collect(),
                target_date: None,
            },
            RecencyPolicy::TargetDate { date_override } => {
                let target_date = resolve_target_date(timezone, *date_override, now);
                Selection {
                    candidates: published_on(items, timezone, target_date),
                    target_date: Some(target_date),
                }
            }
        }
    }
}

/// The override if present, else today's date in `timezone`
pub fn resolve_target_date(
    timezone: Tz,
    date_override: Option<NaiveDate>,
    now: DateTime<Utc>,
) -> NaiveDate {
    date_override.unwrap_or_else(|| now.with_timezone(&timezone).date_naive())
}

/// Civil date an item was published on, as seen from `timezone`
pub fn local_date(item: &FeedItem, timezone: Tz) -> Option<NaiveDate> {
    item.published_at
        .map(|published| published.with_timezone(&timezone).date_naive())
}

/// Items whose publish time falls on `date` in `timezone`, sorted most recent first.
/// Items without a publish time never match.
pub fn published_on(items: Vec<FeedItem>, timezone: Tz, date: NaiveDate) -> Vec<FeedItem> {
    items
        .into_iter()
        .filter(|item| local_date(item, timezone) == Some(date))
        .sorted_by(|a, b| b.published_at.cmp(&a.published_at))
        .collect()
}
