use std::future::Future;

use crate::ProcessedMarker;

pub mod log_only;
pub mod postgres;

pub trait DataStore {
    /// Whether a marker already exists for `item_id`
    fn is_processed(&self, item_id: &str) -> impl Future<Output = anyhow::Result<bool>> + Send;

    /// Inserts a marker. An existing marker for the same id is left untouched.
    fn record_processed(
        &self,
        marker: &ProcessedMarker,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;
}

impl<T: DataStore + Send + Sync> DataStore for &T {
    async fn is_processed(&self, item_id: &str) -> anyhow::Result<bool> {
        (**self).is_processed(item_id).await
    }

    async fn record_processed(&self, marker: &ProcessedMarker) -> anyhow::Result<()> {
        (**self).record_processed(marker).await
    }
}
