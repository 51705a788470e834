use crate::{datastore::DataStore, ProcessedMarker};

/// Offline stand-in: nothing is ever considered processed and writes are only logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOnlyDataStore;

impl DataStore for LogOnlyDataStore {
    async fn is_processed(&self, item_id: &str) -> anyhow::Result<bool> {
        tracing::debug!(item_id, "[log-only store] reporting item as unprocessed");
        Ok(false)
    }

    async fn record_processed(&self, marker: &ProcessedMarker) -> anyhow::Result<()> {
        tracing::info!(
            item_id = %marker.item_id,
            title = %marker.title,
            "[log-only store] would record processed item"
        );
        Ok(())
    }
}
