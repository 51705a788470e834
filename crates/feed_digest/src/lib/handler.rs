//! Invocation entry point: wires concrete collaborators from configuration and runs once.

use anyhow::Context;
use digest_datastore::{DataStore, LogOnlyDataStore, PgDataStore};
use serde::Serialize;

use crate::{
    config::{AppConfig, Variant},
    extract::{captions::CaptionExtractor, enclosure::EnclosureDownloader},
    feed::{PodcastFeed, YoutubeFeed},
    filter::RecencyPolicy,
    gemini::GeminiClient,
    notifier::{smtp::SmtpMailer, EmailComposer, LogMailer, Mailer},
    DigestProcessorBuilder, RunReport,
};

/// What a scheduler invocation gets back
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResult {
    pub status_code: u16,
    pub message: String,
}

impl InvocationResult {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status_code: 500,
            message: message.into(),
        }
    }
}

impl From<&RunReport> for InvocationResult {
    fn from(report: &RunReport) -> Self {
        Self {
            status_code: report.status_code(),
            message: report.message(),
        }
    }
}

/// Runs the pipeline once. The trigger payload is accepted for compatibility and ignored.
#[tracing::instrument(skip_all, fields(variant = ?config.variant, local_test_mode = config.local_test_mode))]
pub async fn handle_trigger(_payload: serde_json::Value, config: &AppConfig) -> InvocationResult {
    match execute(config).await {
        Ok(report) => InvocationResult::from(&report),
        Err(e) => {
            tracing::error!(error = ?e, "Invocation failed before the run started");
            InvocationResult::error(format!("{e:#}"))
        }
    }
}

async fn execute(config: &AppConfig) -> anyhow::Result<RunReport> {
    if config.local_test_mode {
        tracing::info!("Local test mode: processed markers and emails are only logged");
        return run_with(config, LogOnlyDataStore, LogMailer).await;
    }

    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL not set")?;
    let store = PgDataStore::init(database_url, &config.table).await?;
    let mailer = SmtpMailer::new(&config.smtp)?;

    run_with(config, store, mailer).await
}

/// Builds the variant's feed, extractor and summarizer around the given store and mailer
pub async fn run_with<D, M>(config: &AppConfig, store: D, mailer: M) -> anyhow::Result<RunReport>
where
    D: DataStore + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let summarizer = GeminiClient::new(config.gemini_api_key.clone(), &config.gemini_model)?
        .with_prompt_path(config.prompt_path());
    let composer = EmailComposer::new(
        config.sender_email.clone(),
        config.recipient_email.as_deref(),
        &config.subject_prefix,
    )
    .with_link_label(config.variant.link_label());
    let feed_url = config.resolved_feed_url();

    let report = match config.variant {
        Variant::Video => {
            let processor = DigestProcessorBuilder::new(config.workdir.clone())
                .feed(YoutubeFeed::new(feed_url, config.feed_limit)?)
                .extractor(CaptionExtractor::new(&config.caption_language)?)
                .summarizer(summarizer)
                .mailer(mailer)
                .store(store)
                .composer(composer)
                .policy(RecencyPolicy::LatestOnly)
                .timezone(config.timezone)
                .max_items(config.max_items)
                .stop_on_skip(true)
                .build();

            processor.run().await
        }
        Variant::Podcast => {
            let processor = DigestProcessorBuilder::new(config.workdir.clone())
                .feed(PodcastFeed::new(feed_url, config.feed_limit)?)
                .extractor(EnclosureDownloader::new()?)
                .summarizer(summarizer)
                .mailer(mailer)
                .store(store)
                .composer(composer)
                .policy(RecencyPolicy::TargetDate {
                    date_override: config.target_date,
                })
                .timezone(config.timezone)
                .max_items(config.max_items)
                .build();

            processor.run().await
        }
    };

    Ok(report)
}
