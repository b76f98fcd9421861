use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::infrastructure::object_store::ObjectStore;

const TEMPLATE_PREFIX: &str = "templates/";
const IMAGE_PREFIX: &str = "images/";
const REPORT_PREFIX: &str = "reports/";

pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// A stored template, as returned by listings.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateEntry {
    pub name: String,
    pub url: String,
}

/// Repository for named `.docx` template blobs plus the image and report
/// blobs that surround a render.
///
/// Template names are caller-supplied (collisions silently overwrite);
/// image and report names are server-generated to avoid collision.
pub struct TemplateRepository {
    store: Arc<dyn ObjectStore>,
}

impl TemplateRepository {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Lists stored templates, filtered to the recognized extension.
    pub async fn list(&self) -> Result<Vec<TemplateEntry>> {
        let names = self.store.list(TEMPLATE_PREFIX).await?;
        Ok(names
            .into_iter()
            .filter(|n| n.ends_with(".docx"))
            .map(|path| {
                let url = self.store.url_for(&path);
                let name = path.trim_start_matches(TEMPLATE_PREFIX).to_string();
                TemplateEntry { name, url }
            })
            .collect())
    }

    /// Uploads a template under its file name, overwriting any existing
    /// blob with the same name.
    pub async fn upload(&self, name: &str, bytes: &[u8]) -> Result<TemplateEntry> {
        validate_file_name(name)?;
        let path = format!("{TEMPLATE_PREFIX}{name}");
        self.store.write(&path, bytes, DOCX_CONTENT_TYPE).await?;
        Ok(TemplateEntry {
            name: name.to_string(),
            url: self.store.url_for(&path),
        })
    }

    /// Fetches template bytes for rendering.
    pub async fn read(&self, name: &str) -> Result<Vec<u8>> {
        validate_file_name(name)?;
        self.store.read(&format!("{TEMPLATE_PREFIX}{name}")).await
    }

    /// Deletes a template by name. Absence is not an error.
    pub async fn delete(&self, name: &str) -> Result<()> {
        validate_file_name(name)?;
        self.store.delete(&format!("{TEMPLATE_PREFIX}{name}")).await
    }

    /// Stores an image blob under a generated name (random hex plus the
    /// extension for the given content type). Returns the generated name
    /// and its URL.
    pub async fn upload_image(
        &self,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(String, String)> {
        let ext = mime_guess::get_mime_extensions_str(content_type)
            .and_then(|exts| exts.first().copied())
            .unwrap_or("bin");
        let name = format!("{}.{ext}", Uuid::new_v4().simple());
        let path = format!("{IMAGE_PREFIX}{name}");
        self.store.write(&path, bytes, content_type).await?;
        Ok((name, self.store.url_for(&path)))
    }

    /// Fetches image bytes by generated name.
    pub async fn read_image(&self, name: &str) -> Result<Vec<u8>> {
        validate_file_name(name)?;
        self.store.read(&format!("{IMAGE_PREFIX}{name}")).await
    }

    /// Stores a rendered report under a generated name. Returns the
    /// generated name and its URL.
    pub async fn save_report(&self, bytes: &[u8]) -> Result<(String, String)> {
        let name = format!("{}.docx", Uuid::new_v4().simple());
        let path = format!("{REPORT_PREFIX}{name}");
        self.store.write(&path, bytes, DOCX_CONTENT_TYPE).await?;
        Ok((name, self.store.url_for(&path)))
    }
}

/// Rejects caller-supplied file names that could escape their storage
/// prefix before anything touches storage.
fn validate_file_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidInput("file name cannot be empty".to_string()));
    }
    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(Error::InvalidInput(format!(
            "file name contains path traversal: {name}"
        )));
    }
    Ok(())
}
