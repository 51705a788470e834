use chrono::{DateTime, NaiveDate, Utc};

/// Durable proof that a feed item was fully handled (summarized and emailed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedMarker {
    pub item_id: String,
    pub title: String,
    /// Local civil date the item was published on, when known
    pub published_date: Option<NaiveDate>,
    pub processed_at: DateTime<Utc>,
}

impl ProcessedMarker {
    pub fn new(item_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            title: title.into(),
            published_date: None,
            processed_at: Utc::now(),
        }
    }

    pub fn with_published_date(mut self, date: Option<NaiveDate>) -> Self {
        self.published_date = date;
        self
    }
}
