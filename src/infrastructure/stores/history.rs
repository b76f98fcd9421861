use std::sync::Arc;

use crate::domain::records::HistoryRecord;
use crate::error::Result;
use crate::infrastructure::object_store::ObjectStore;

use super::{load_collection, save_collection};

const HISTORY_PATH: &str = "history.json";

/// Store for generated-report snapshots, backed by `history.json`.
///
/// Records are immutable except for deletion and are not deduplicated by
/// address: generating twice for the same property appends two snapshots.
pub struct HistoryStore {
    store: Arc<dyn ObjectStore>,
}

impl HistoryStore {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Lists history records, most recently updated first.
    pub async fn list(&self) -> Result<Vec<HistoryRecord>> {
        let mut records: Vec<HistoryRecord> =
            load_collection(self.store.as_ref(), HISTORY_PATH).await?;
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(records)
    }

    /// Appends a snapshot taken at report-generation time.
    pub async fn append(&self, record: HistoryRecord) -> Result<()> {
        let mut records: Vec<HistoryRecord> =
            load_collection(self.store.as_ref(), HISTORY_PATH).await?;
        records.push(record);
        save_collection(self.store.as_ref(), HISTORY_PATH, &records).await
    }

    /// Deletes a snapshot by id. Returns true when a record was removed;
    /// deleting an unknown id is not an error.
    pub async fn delete_by_id(&self, draft_id: &str) -> Result<bool> {
        let mut records: Vec<HistoryRecord> =
            load_collection(self.store.as_ref(), HISTORY_PATH).await?;
        let before = records.len();
        records.retain(|r| r.draft_id != draft_id);

        if records.len() == before {
            return Ok(false);
        }

        save_collection(self.store.as_ref(), HISTORY_PATH, &records).await?;
        Ok(true)
    }
}
