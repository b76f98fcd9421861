use serde::{Deserialize, Serialize};

/// One selectable option inside a commentary card.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionEntry {
    pub id: String,
    pub label: String,
    pub option: String,
}

/// A configurable commentary section: a display label plus the placeholder
/// tag its chosen text substitutes into.
///
/// Used for `commentary-options.json`, `multi-options.json` and
/// `commentary-cards.json`, which share this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentaryCard {
    pub id: String,
    pub card_name: String,
    pub placeholder: String,
    #[serde(default)]
    pub options: Vec<OptionEntry>,
}

/// An image placeholder definition: which tag in the template receives an
/// image, and at what pixel size it is embedded.
///
/// Dimensions are caller-supplied configuration, never derived from the
/// image bytes themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageOption {
    pub id: String,
    pub card_name: String,
    pub placeholder: String,
    pub width: u32,
    pub height: u32,
}

/// Generation parameters for the assist model, persisted as
/// `ai-config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiConfig {
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            temperature: 0.7,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 2048,
        }
    }
}

/// Strips surrounding delimiter characters and whitespace from a
/// placeholder tag so config entries written as `{{Replace_X}}`,
/// `{%Replace_X%}` or `Replace_X` all key the same mapping entry.
///
/// Tags are free-form strings; no uniqueness is enforced here.
pub fn normalize_tag(tag: &str) -> String {
    tag.trim_matches(|c: char| matches!(c, '{' | '}' | '%' | '$' | '#' | ' ' | '\t'))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_double_brace() {
        assert_eq!(normalize_tag("{{Replace_Address}}"), "Replace_Address");
    }

    #[test]
    fn normalize_strips_percent_bracket() {
        assert_eq!(normalize_tag("{%Replace_Image%}"), "Replace_Image");
    }

    #[test]
    fn normalize_leaves_bare_tag() {
        assert_eq!(normalize_tag("Replace_Valuation"), "Replace_Valuation");
    }

    #[test]
    fn normalize_keeps_interior_characters() {
        assert_eq!(normalize_tag("{{comparables.address}}"), "comparables.address");
    }

    #[test]
    fn ai_config_serializes_in_camel_case() {
        let value = serde_json::to_value(AiConfig::default()).unwrap();
        assert!(value.get("topP").is_some());
        assert!(value.get("topK").is_some());
        assert!(value.get("maxOutputTokens").is_some());
    }
}
