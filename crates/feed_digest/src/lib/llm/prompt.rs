use std::{path::Path, sync::LazyLock};

use regex::{Captures, Regex};

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(title|video_title|transcript)\}").unwrap());

/// A prompt with `{title}` and `{transcript}` placeholders.
///
/// `{video_title}` is accepted as an alias for `{title}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub async fn load(path: &Path) -> std::io::Result<Self> {
        let template = tokio::fs::read_to_string(path).await?;
        Ok(Self::new(template))
    }

    /// Substitutes the placeholders in a single pass, so braces inside the
    /// substituted values are left as they are. Without a transcript (audio
    /// input) the `{transcript}` placeholder is removed.
    pub fn render(&self, title: &str, transcript: Option<&str>) -> String {
        PLACEHOLDER_RE
            .replace_all(&self.template, |caps: &Captures| match &caps[1] {
                "transcript" => transcript.unwrap_or_default().to_string(),
                _ => title.to_string(),
            })
            .into_owned()
    }
}
