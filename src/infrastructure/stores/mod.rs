// Record stores (data access layer)
// Flat JSON collections and binary blobs behind the ObjectStore interface.
// Every read re-fetches the backing document and every write overwrites it
// in full: last-writer-wins, no version token.

pub mod config;
pub mod drafts;
pub mod history;
pub mod templates;

pub use config::{ConfigStore, OptionCollection};
pub use drafts::DraftStore;
pub use history::HistoryStore;
pub use templates::TemplateRepository;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::infrastructure::object_store::ObjectStore;

pub(crate) const JSON_CONTENT_TYPE: &str = "application/json";

/// Loads a JSON collection document, initializing it to an empty collection
/// when the backing object is absent. The initialization is persisted
/// before returning so subsequent reads see the document without
/// re-triggering it.
pub(crate) async fn load_collection<T>(store: &dyn ObjectStore, path: &str) -> Result<Vec<T>>
where
    T: DeserializeOwned + Serialize,
{
    let bytes = match store.read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.is_not_found() => {
            tracing::info!(path, "initializing empty collection");
            store.write(path, b"[]", JSON_CONTENT_TYPE).await?;
            return Ok(Vec::new());
        }
        Err(e) => return Err(e),
    };

    serde_json::from_slice(&bytes)
        .map_err(|e| Error::Validation(format!("malformed collection {path}: {e}")))
}

/// Serializes the full collection back to its document. No incremental
/// append exists at the storage level.
pub(crate) async fn save_collection<T>(
    store: &dyn ObjectStore,
    path: &str,
    records: &[T],
) -> Result<()>
where
    T: Serialize,
{
    let bytes = serde_json::to_vec(records)?;
    store.write(path, &bytes, JSON_CONTENT_TYPE).await
}
