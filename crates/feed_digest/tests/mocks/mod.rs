pub mod datastore;
pub mod extractor;
pub mod feed_source;
pub mod mailer;
pub mod summarizer;
