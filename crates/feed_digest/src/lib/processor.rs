pub mod builder;
pub mod report;

use std::{fs::remove_dir_all, path::PathBuf};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use digest_datastore::{DataStore, ProcessedMarker};

use crate::{
    extract::ContentExtractor,
    feed::FeedSource,
    filter::{local_date, RecencyPolicy},
    markdown::clean_html_output,
    notifier::{EmailComposer, Mailer},
    types::FeedItem,
    Summarizer,
};
use report::{RunOutcome, RunReport, RunTally, SkipReason};

/// What happened to a single candidate
#[derive(Debug)]
enum ItemOutcome {
    Processed,
    AlreadyProcessed,
    Skipped(SkipReason),
}

// Runs one fetch -> filter -> summarize -> email pass over a feed
#[derive(Debug)]
pub struct DigestProcessor<F, X, S, M, D>
where
    F: FeedSource + Send + Sync + 'static,
    X: ContentExtractor + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
    D: DataStore + Send + Sync + 'static,
{
    workdir: PathBuf,
    feed: F,
    extractor: X,
    summarizer: S,
    mailer: M,
    store: D,
    composer: EmailComposer,
    policy: RecencyPolicy,
    timezone: Tz,
    max_items: usize,
    stop_on_skip: bool,
}

impl<F, X, S, M, D> DigestProcessor<F, X, S, M, D>
where
    F: FeedSource + Send + Sync + 'static,
    X: ContentExtractor + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
    D: DataStore + Send + Sync + 'static,
{
    pub async fn run(&self) -> RunReport {
        self.run_at(Utc::now()).await
    }

    /// Runs with `now` as the wall clock used to resolve the target date
    #[tracing::instrument(skip(self), fields(policy = ?self.policy, max_items = self.max_items))]
    pub async fn run_at(&self, now: DateTime<Utc>) -> RunReport {
        // a failed fetch is the same as an empty feed
        let items = self
            .feed
            .fetch_items()
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to fetch feed"))
            .unwrap_or_default();

        if items.is_empty() {
            tracing::info!("No items found in feed");
            return RunReport::new(RunOutcome::NothingFound);
        }

        let selection = self.policy.select(items, self.timezone, now);
        if selection.candidates.is_empty() {
            tracing::info!(target_date = ?selection.target_date, "No eligible items");
            return RunReport::new(RunOutcome::NothingEligible {
                target_date: selection.target_date,
            });
        }

        tracing::info!(
            count = selection.candidates.len(),
            target_date = ?selection.target_date,
            "Processing candidates"
        );

        let mut tally = RunTally::default();
        let mut candidates = selection.candidates.into_iter();

        while let Some(item) = candidates.next() {
            // failed attempts spend the budget too; already processed ones do not
            let attempted = tally.processed.len() + tally.skipped.len();
            if attempted >= self.max_items {
                tally.deferred = 1 + candidates.len();
                tracing::info!(attempted, deferred = tally.deferred, "Per-run cap reached");
                break;
            }

            let stop = match self.process_item(&item).await {
                ItemOutcome::Processed => {
                    tally.processed.push(item.id);
                    false
                }
                ItemOutcome::AlreadyProcessed => {
                    tally.already_processed.push(item.id);
                    self.stop_on_skip
                }
                ItemOutcome::Skipped(reason) => {
                    tally.skipped.push((item.id, reason));
                    self.stop_on_skip
                }
            };

            if stop {
                break;
            }
        }

        let report = RunReport::new(RunOutcome::Finished {
            target_date: selection.target_date,
            tally,
        });
        tracing::info!(status = report.status_code(), message = %report.message(), "Run finished");

        report
    }

    #[tracing::instrument(skip_all, fields(item_id = %item.id, title = %item.title))]
    async fn process_item(&self, item: &FeedItem) -> ItemOutcome {
        match self.store.is_processed(&item.id).await {
            Ok(true) => {
                tracing::info!("Item already processed, skipping");
                return ItemOutcome::AlreadyProcessed;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::error!(error = ?e, "Failed to check processed marker");
                return ItemOutcome::Skipped(SkipReason::DedupCheckFailed);
            }
        }

        let content = match self.extractor.extract(item, &self.workdir).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(error = %e, "No content extracted");
                return ItemOutcome::Skipped(SkipReason::NoContent);
            }
        };

        let summary = self.summarizer.summarize(&item.title, &content).await;
        // removes any scratch audio before moving on
        drop(content);

        let summary = match summary {
            Ok(resp) if !resp.summary.trim().is_empty() => resp.summary,
            Ok(_) => {
                tracing::warn!("Summarizer returned an empty summary");
                return ItemOutcome::Skipped(SkipReason::SummaryFailed);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to summarize item");
                return ItemOutcome::Skipped(SkipReason::SummaryFailed);
            }
        };

        let html = clean_html_output(&summary);

        let sent = match self.composer.compose(&item.title, item.link.as_deref(), &html) {
            Ok(email) => self.mailer.send(&email).await,
            Err(e) => Err(e),
        };
        if let Err(e) = sent {
            tracing::error!(error = ?e, "Failed to send email");
            return ItemOutcome::Skipped(SkipReason::EmailFailed);
        }

        let marker = ProcessedMarker::new(&item.id, &item.title)
            .with_published_date(local_date(item, self.timezone));

        // the email already went out, so a failed write only costs a possible duplicate later
        if let Err(e) = self.store.record_processed(&marker).await {
            tracing::error!(error = ?e, "Failed to record processed marker");
        }

        tracing::info!("Item processed");
        ItemOutcome::Processed
    }
}

impl<F, X, S, M, D> Drop for DigestProcessor<F, X, S, M, D>
where
    F: FeedSource + Send + Sync + 'static,
    X: ContentExtractor + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
    D: DataStore + Send + Sync + 'static,
{
    fn drop(&mut self) {
        let audio_path = self.workdir.join("audio");

        if audio_path.exists() {
            if let Err(e) = remove_dir_all(&audio_path) {
                tracing::warn!(error = ?e, path = ?audio_path, "Failed to clean up audio directory");
            } else {
                tracing::info!(path = ?audio_path, "Cleaned up audio directory");
            }
        }
    }
}
