use std::sync::Arc;

use crate::domain::config::{AiConfig, CommentaryCard, ImageOption};
use crate::error::{Error, Result};
use crate::infrastructure::object_store::ObjectStore;

use super::{load_collection, save_collection, JSON_CONTENT_TYPE};

const IMAGE_OPTIONS_PATH: &str = "image-options.json";
const AI_CONFIG_PATH: &str = "ai-config.json";

/// The three card-shaped configuration collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionCollection {
    /// Single-select commentary snippets (`commentary-options.json`)
    Commentary,
    /// Multi-select option groups (`multi-options.json`)
    Multi,
    /// Free-text commentary cards (`commentary-cards.json`)
    Cards,
}

impl OptionCollection {
    pub fn path(&self) -> &'static str {
        match self {
            OptionCollection::Commentary => "commentary-options.json",
            OptionCollection::Multi => "multi-options.json",
            OptionCollection::Cards => "commentary-cards.json",
        }
    }

    /// Maps the URL slug used by the config routes.
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "commentary-options" => Some(OptionCollection::Commentary),
            "multi-options" => Some(OptionCollection::Multi),
            "commentary-cards" => Some(OptionCollection::Cards),
            _ => None,
        }
    }
}

/// Store for the configuration documents: commentary/multi/card option
/// collections, image placeholder definitions, and assist-model parameters.
pub struct ConfigStore {
    store: Arc<dyn ObjectStore>,
}

impl ConfigStore {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub async fn cards(&self, collection: OptionCollection) -> Result<Vec<CommentaryCard>> {
        load_collection(self.store.as_ref(), collection.path()).await
    }

    /// Replaces a card collection in full.
    pub async fn save_cards(
        &self,
        collection: OptionCollection,
        cards: &[CommentaryCard],
    ) -> Result<()> {
        save_collection(self.store.as_ref(), collection.path(), cards).await
    }

    pub async fn image_options(&self) -> Result<Vec<ImageOption>> {
        load_collection(self.store.as_ref(), IMAGE_OPTIONS_PATH).await
    }

    pub async fn save_image_options(&self, options: &[ImageOption]) -> Result<()> {
        save_collection(self.store.as_ref(), IMAGE_OPTIONS_PATH, options).await
    }

    /// Reads the assist-model parameters, initializing the document with
    /// defaults when absent. Re-fetched on every call; there is no
    /// in-process cache to invalidate after a write.
    pub async fn ai_config(&self) -> Result<AiConfig> {
        let bytes = match self.store.read(AI_CONFIG_PATH).await {
            Ok(bytes) => bytes,
            Err(e) if e.is_not_found() => {
                let config = AiConfig::default();
                self.save_ai_config(&config).await?;
                return Ok(config);
            }
            Err(e) => return Err(e),
        };

        serde_json::from_slice(&bytes)
            .map_err(|e| Error::Validation(format!("malformed {AI_CONFIG_PATH}: {e}")))
    }

    pub async fn save_ai_config(&self, config: &AiConfig) -> Result<()> {
        let bytes = serde_json::to_vec(config)?;
        self.store
            .write(AI_CONFIG_PATH, &bytes, JSON_CONTENT_TYPE)
            .await
    }
}
