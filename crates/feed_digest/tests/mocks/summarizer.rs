use std::sync::{Arc, Mutex};

use feed_digest::{extract::ExtractedContent, Summarizer, SummaryResponse};

#[derive(Clone)]
pub struct MockSummarizer {
    pub summary: String,
    /// Titles, in call order
    pub calls: Arc<Mutex<Vec<String>>>,
    /// Whether the scratch audio file existed while summarizing, per audio call
    pub audio_present: Arc<Mutex<Vec<bool>>>,
    pub fail_with: Option<String>,
    pub fail_on_title: Option<String>,
}

impl MockSummarizer {
    pub fn new(summary: &str) -> Self {
        Self {
            summary: summary.to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
            audio_present: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
            fail_on_title: None,
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Self::new("")
        }
    }

    /// Fails only for the item with this title
    pub fn failing_on(title: &str, summary: &str) -> Self {
        Self {
            fail_on_title: Some(title.to_string()),
            ..Self::new(summary)
        }
    }
}

impl Summarizer for MockSummarizer {
    type Error = anyhow::Error;

    async fn summarize(
        &self,
        title: &str,
        content: &ExtractedContent,
    ) -> Result<SummaryResponse, Self::Error> {
        self.calls.lock().unwrap().push(title.to_string());
        if let ExtractedContent::Audio(scratch) = content {
            self.audio_present
                .lock()
                .unwrap()
                .push(scratch.path().exists());
        }

        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        if self.fail_on_title.as_deref() == Some(title) {
            return Err(anyhow::anyhow!("API error: 503 - model overloaded"));
        }

        Ok(SummaryResponse {
            summary: self.summary.clone(),
        })
    }
}
