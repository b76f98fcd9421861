// Document rendering pipeline
// Placeholder resolution feeds the docx substitution engine; the renderer
// drives the multi-attempt delimiter/line-break fallback strategy.

pub mod docx;
pub mod image;
pub mod renderer;
pub mod resolve;
pub mod schema;

pub use renderer::{render, Rendered};
pub use resolve::{resolve, ResolvedPlaceholders};
pub use schema::Schema;

use std::collections::BTreeMap;
use std::path::PathBuf;

/// A staged image ready for embedding: bytes on disk plus the pixel size
/// the caller asked for. Dimensions come from configuration or the
/// request, never from the image bytes.
#[derive(Debug, Clone)]
pub struct ImageBinding {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// One flat row of the repeating section, placeholder key to value.
pub type Row = BTreeMap<String, String>;

/// Value bound to a placeholder key.
#[derive(Debug, Clone)]
pub enum Binding {
    /// Scalar text substituted into the document body.
    Text(String),
    /// Image embedded at the bound dimensions.
    Image(ImageBinding),
    /// Ordered rows for the single repeating table section.
    Rows(Vec<Row>),
}

impl Binding {
    pub fn text(value: impl Into<String>) -> Self {
        Binding::Text(value.into())
    }
}
