// Object storage adapter
// All JSON documents and binary blobs (templates, images, reports) live
// behind this interface.

pub mod gcs;
pub mod memory;

pub use gcs::GcsObjectStore;
pub use memory::MemoryObjectStore;

use async_trait::async_trait;

use crate::error::Result;

/// Uniform read/write/list/delete over named paths.
///
/// A `write` is a single atomic blob replace at the storage layer. There is
/// no multi-path transaction: a caller that writes two related documents may
/// leave them inconsistent if the second write fails.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write (or fully overwrite) the blob at `path`.
    async fn write(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<()>;

    /// Read the blob at `path`. Fails with the `NotFound` kind when absent.
    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// List object names under `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Delete the blob at `path`. Deleting a missing path succeeds silently.
    async fn delete(&self, path: &str) -> Result<()>;

    /// Public URL for the blob at `path`.
    fn url_for(&self, path: &str) -> String;
}
