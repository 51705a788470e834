pub mod config;
mod error;
pub mod extract;
pub mod feed;
pub mod filter;
pub mod handler;
mod llm;
pub mod markdown;
pub mod notifier;
pub mod parser;
mod processor;
pub mod tracing;
pub mod types;

pub use error::Error;
pub use llm::gemini;
pub use llm::{
    prompt::PromptTemplate,
    summarizer::{Summarizer, SummaryResponse},
};
pub use processor::{
    builder::DigestProcessorBuilder,
    report::{RunOutcome, RunReport, RunTally, SkipReason},
    DigestProcessor,
};
