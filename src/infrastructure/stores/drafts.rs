use std::sync::Arc;

use crate::domain::records::{Draft, DraftSummary};
use crate::error::Result;
use crate::infrastructure::object_store::ObjectStore;

use super::{load_collection, save_collection};

const DRAFTS_PATH: &str = "drafts.json";

/// Store for in-progress valuations, backed by `drafts.json`.
///
/// Upserts are deduplicated by `place_id`: saving a form whose address
/// resolves to an existing draft's place updates that draft in place
/// instead of appending a second record.
pub struct DraftStore {
    store: Arc<dyn ObjectStore>,
}

impl DraftStore {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Lists draft summaries, most recently updated first.
    pub async fn list(&self) -> Result<Vec<DraftSummary>> {
        let mut drafts: Vec<Draft> = load_collection(self.store.as_ref(), DRAFTS_PATH).await?;
        drafts.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(drafts.iter().map(DraftSummary::from).collect())
    }

    /// Fetches a single draft by id.
    pub async fn get(&self, draft_id: &str) -> Result<Option<Draft>> {
        let drafts: Vec<Draft> = load_collection(self.store.as_ref(), DRAFTS_PATH).await?;
        Ok(drafts.into_iter().find(|d| d.draft_id == draft_id))
    }

    /// Saves a form, updating in place when a draft with the same
    /// `place_id` already exists. Returns the stored draft.
    pub async fn upsert(
        &self,
        property_address: String,
        place_id: String,
        form_data: serde_json::Value,
    ) -> Result<Draft> {
        let mut drafts: Vec<Draft> = load_collection(self.store.as_ref(), DRAFTS_PATH).await?;

        let stored = match drafts.iter_mut().find(|d| d.place_id == place_id) {
            Some(existing) => {
                existing.apply_update(property_address, form_data);
                existing.clone()
            }
            None => {
                let draft = Draft::new(property_address, place_id, form_data)?;
                drafts.push(draft.clone());
                draft
            }
        };

        save_collection(self.store.as_ref(), DRAFTS_PATH, &drafts).await?;
        Ok(stored)
    }

    /// Deletes a draft by id. Returns true when a record was removed;
    /// deleting an unknown id is not an error.
    pub async fn delete_by_id(&self, draft_id: &str) -> Result<bool> {
        let mut drafts: Vec<Draft> = load_collection(self.store.as_ref(), DRAFTS_PATH).await?;
        let before = drafts.len();
        drafts.retain(|d| d.draft_id != draft_id);

        if drafts.len() == before {
            return Ok(false);
        }

        save_collection(self.store.as_ref(), DRAFTS_PATH, &drafts).await?;
        Ok(true)
    }
}
