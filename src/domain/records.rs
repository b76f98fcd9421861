use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// One in-progress valuation.
///
/// # Invariants
/// - `property_address` is never empty
/// - At most one draft per `place_id` exists in the collection; the store
///   enforces this by updating in place on a matching `place_id`
///
/// Field names serialize in camelCase to match the persisted
/// `drafts.json` document shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub draft_id: String,
    pub property_address: String,
    pub place_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub form_data: serde_json::Value,
}

impl Draft {
    /// Creates a new draft for a resolved address.
    ///
    /// # Business Rules Enforced
    /// - Address must not be empty
    /// - `created_at` and `updated_at` start equal
    pub fn new(
        property_address: String,
        place_id: String,
        form_data: serde_json::Value,
    ) -> Result<Self> {
        if property_address.trim().is_empty() {
            return Err(Error::Validation(
                "property address cannot be empty".to_string(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            draft_id: Uuid::new_v4().to_string(),
            property_address,
            place_id,
            created_at: now,
            updated_at: now,
            form_data,
        })
    }

    /// Applies a subsequent save to an existing draft.
    ///
    /// Preserves `draft_id` and `created_at`, advances `updated_at`.
    pub fn apply_update(&mut self, property_address: String, form_data: serde_json::Value) {
        self.property_address = property_address;
        self.form_data = form_data;
        self.updated_at = Utc::now();
    }
}

/// List-view projection of a draft. Full form data stays out of listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSummary {
    pub draft_id: String,
    pub property_address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Draft> for DraftSummary {
    fn from(draft: &Draft) -> Self {
        Self {
            draft_id: draft.draft_id.clone(),
            property_address: draft.property_address.clone(),
            created_at: draft.created_at,
            updated_at: draft.updated_at,
        }
    }
}

/// A finalized/generated report snapshot.
///
/// Created at report-generation time; immutable except for deletion. Not
/// deduplicated by address, so multiple snapshots may coexist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub draft_id: String,
    pub property_address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub data: serde_json::Value,
    /// True when at least one text placeholder was substituted.
    pub if_replace_text: bool,
    /// True when at least one image placeholder was substituted.
    pub if_replace_image: bool,
}

impl HistoryRecord {
    /// Snapshots a generated report.
    pub fn new(
        property_address: String,
        data: serde_json::Value,
        if_replace_text: bool,
        if_replace_image: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            draft_id: Uuid::new_v4().to_string(),
            property_address,
            created_at: now,
            updated_at: now,
            data,
            if_replace_text,
            if_replace_image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_draft_with_valid_address() {
        let draft = Draft::new(
            "12 Test St".to_string(),
            "place-1".to_string(),
            json!({"Info": {}}),
        )
        .unwrap();

        assert_eq!(draft.property_address, "12 Test St");
        assert_eq!(draft.place_id, "place-1");
        assert_eq!(draft.created_at, draft.updated_at);
    }

    #[test]
    fn create_draft_with_empty_address_fails() {
        let result = Draft::new("   ".to_string(), "place-1".to_string(), json!({}));
        assert!(result.is_err());
    }

    #[test]
    fn apply_update_preserves_identity() {
        let mut draft = Draft::new(
            "12 Test St".to_string(),
            "place-1".to_string(),
            json!({"v": 1}),
        )
        .unwrap();
        let id = draft.draft_id.clone();
        let created = draft.created_at;

        draft.apply_update("12 Test Street".to_string(), json!({"v": 2}));

        assert_eq!(draft.draft_id, id);
        assert_eq!(draft.created_at, created);
        assert!(draft.updated_at >= created);
        assert_eq!(draft.form_data, json!({"v": 2}));
    }

    #[test]
    fn draft_serializes_in_camel_case() {
        let draft = Draft::new("12 Test St".to_string(), "p".to_string(), json!({})).unwrap();
        let value = serde_json::to_value(&draft).unwrap();

        assert!(value.get("draftId").is_some());
        assert!(value.get("propertyAddress").is_some());
        assert!(value.get("placeId").is_some());
        assert!(value.get("formData").is_some());
    }

    #[test]
    fn history_record_carries_replacement_flags() {
        let record = HistoryRecord::new("12 Test St".to_string(), json!({}), true, false);

        assert!(record.if_replace_text);
        assert!(!record.if_replace_image);

        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("ifReplaceText").is_some());
        assert!(value.get("ifReplaceImage").is_some());
    }
}
