use std::sync::{Arc, Mutex};

use digest_datastore::{DataStore, ProcessedMarker};

/// In-memory marker table; clones share the same table
#[derive(Clone, Default)]
pub struct MockDataStore {
    pub markers: Arc<Mutex<Vec<ProcessedMarker>>>,
    pub fail_with: Option<String>,
}

impl MockDataStore {
    pub fn with_processed(ids: &[&str]) -> Self {
        let store = Self::default();
        store
            .markers
            .lock()
            .unwrap()
            .extend(ids.iter().map(|id| ProcessedMarker::new(*id, "seeded")));
        store
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }

    pub fn recorded_ids(&self) -> Vec<String> {
        self.markers
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.title != "seeded")
            .map(|m| m.item_id.clone())
            .collect()
    }
}

impl DataStore for MockDataStore {
    async fn is_processed(&self, item_id: &str) -> anyhow::Result<bool> {
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        Ok(self
            .markers
            .lock()
            .unwrap()
            .iter()
            .any(|m| m.item_id == item_id))
    }

    async fn record_processed(&self, marker: &ProcessedMarker) -> anyhow::Result<()> {
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        let mut markers = self.markers.lock().unwrap();
        if !markers.iter().any(|m| m.item_id == marker.item_id) {
            markers.push(marker.clone());
        }
        Ok(())
    }
}
