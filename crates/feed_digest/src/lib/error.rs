#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Parse error: {0}")]
    ParseError(&'static str),

    #[error("Invalid feed document: {0}")]
    Feed(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
