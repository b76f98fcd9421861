use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::ObjectStore;

/// In-memory object store for tests and local development.
///
/// Implements the same contract as the cloud backend: reads of missing
/// paths fail with `NotFound`, deletes of missing paths succeed silently.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects. Test helper.
    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn write(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        self.objects
            .lock()
            .unwrap()
            .insert(path.to_string(), (bytes.to_vec(), content_type.to_string()));
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(path)
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| Error::NotFound(format!("object not found: {path}")))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        names.sort();
        Ok(names)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.objects.lock().unwrap().remove(path);
        Ok(())
    }

    fn url_for(&self, path: &str) -> String {
        format!("memory://{path}")
    }
}
