use std::{
    fmt::{Debug, Display},
    future::Future,
};

use crate::extract::ExtractedContent;

pub trait Summarizer {
    type Error: Debug + Display + Send;

    /// Renders the prompt for `title` and `content` and returns the generated text
    fn summarize(
        &self,
        title: &str,
        content: &ExtractedContent,
    ) -> impl Future<Output = Result<SummaryResponse, Self::Error>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryResponse {
    pub summary: String,
}
