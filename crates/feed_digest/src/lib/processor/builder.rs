use std::path::PathBuf;

use chrono_tz::Tz;
use digest_datastore::DataStore;

use crate::{
    extract::ContentExtractor, feed::FeedSource, filter::RecencyPolicy, notifier::EmailComposer,
    notifier::Mailer, DigestProcessor, Summarizer,
};

pub struct DigestProcessorBuilder<F = (), X = (), S = (), M = (), D = ()> {
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

impl DigestProcessorBuilder {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            feed: (),
            extractor: (),
            summarizer: (),
            mailer: (),
            store: (),
            composer: EmailComposer::default(),
            policy: RecencyPolicy::LatestOnly,
            timezone: chrono_tz::America::New_York,
            max_items: 2,
            stop_on_skip: false,
        }
    }
}

impl<F, X, S, M, D> DigestProcessorBuilder<F, X, S, M, D> {
    pub fn feed<F2: FeedSource + Send + Sync + 'static>(
        self,
        feed: F2,
    ) -> DigestProcessorBuilder<F2, X, S, M, D> {
        DigestProcessorBuilder {
            workdir: self.workdir,
            feed,
            extractor: self.extractor,
            summarizer: self.summarizer,
            mailer: self.mailer,
            store: self.store,
            composer: self.composer,
            policy: self.policy,
            timezone: self.timezone,
            max_items: self.max_items,
            stop_on_skip: self.stop_on_skip,
        }
    }

    pub fn extractor<X2: ContentExtractor + Send + Sync + 'static>(
        self,
        extractor: X2,
    ) -> DigestProcessorBuilder<F, X2, S, M, D> {
        DigestProcessorBuilder {
            workdir: self.workdir,
            feed: self.feed,
            extractor,
            summarizer: self.summarizer,
            mailer: self.mailer,
            store: self.store,
            composer: self.composer,
            policy: self.policy,
            timezone: self.timezone,
            max_items: self.max_items,
            stop_on_skip: self.stop_on_skip,
        }
    }

    pub fn summarizer<S2: Summarizer + Send + Sync + 'static>(
        self,
        summarizer: S2,
    ) -> DigestProcessorBuilder<F, X, S2, M, D> {
        DigestProcessorBuilder {
            workdir: self.workdir,
            feed: self.feed,
            extractor: self.extractor,
            summarizer,
            mailer: self.mailer,
            store: self.store,
            composer: self.composer,
            policy: self.policy,
            timezone: self.timezone,
            max_items: self.max_items,
            stop_on_skip: self.stop_on_skip,
        }
    }

    pub fn mailer<M2: Mailer + Send + Sync + 'static>(
        self,
        mailer: M2,
    ) -> DigestProcessorBuilder<F, X, S, M2, D> {
        DigestProcessorBuilder {
            workdir: self.workdir,
            feed: self.feed,
            extractor: self.extractor,
            summarizer: self.summarizer,
            mailer,
            store: self.store,
            composer: self.composer,
            policy: self.policy,
            timezone: self.timezone,
            max_items: self.max_items,
            stop_on_skip: self.stop_on_skip,
        }
    }

    pub fn store<D2: DataStore + Send + Sync + 'static>(
        self,
        store: D2,
    ) -> DigestProcessorBuilder<F, X, S, M, D2> {
        DigestProcessorBuilder {
            workdir: self.workdir,
            feed: self.feed,
            extractor: self.extractor,
            summarizer: self.summarizer,
            mailer: self.mailer,
            store,
            composer: self.composer,
            policy: self.policy,
            timezone: self.timezone,
            max_items: self.max_items,
            stop_on_skip: self.stop_on_skip,
        }
    }

    pub fn composer(mut self, composer: EmailComposer) -> Self {
        self.composer = composer;
        self
    }

    pub fn policy(mut self, policy: RecencyPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Attempted items, processed or skipped, after which the run stops
    pub fn max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    /// End the run at the first candidate that is skipped or already processed
    pub fn stop_on_skip(mut self, stop_on_skip: bool) -> Self {
        self.stop_on_skip = stop_on_skip;
        self
    }
}

impl<F, X, S, M, D> DigestProcessorBuilder<F, X, S, M, D>
where
    F: FeedSource + Send + Sync + 'static,
    X: ContentExtractor + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
    D: DataStore + Send + Sync + 'static,
{
    pub fn build(self) -> DigestProcessor<F, X, S, M, D> {
        DigestProcessor {
            workdir: self.workdir,
            feed: self.feed,
            extractor: self.extractor,
            summarizer: self.summarizer,
            mailer: self.mailer,
            store: self.store,
            composer: self.composer,
            policy: self.policy,
            timezone: self.timezone,
            max_items: self.max_items,
            stop_on_skip: self.stop_on_skip,
        }
    }
}
