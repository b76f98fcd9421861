//! Record-store integration tests
//!
//! These exercise the drafts, history, configuration and template stores
//! against the in-memory object store, verifying the collection
//! initialization, dedupe and idempotent-delete contracts.

use std::sync::Arc;

use propval_api::infrastructure::object_store::{MemoryObjectStore, ObjectStore};
use propval_api::infrastructure::stores::{
    ConfigStore, DraftStore, HistoryStore, OptionCollection, TemplateRepository,
};

use propval_api::domain::records::HistoryRecord;
use serde_json::json;

fn memory() -> Arc<MemoryObjectStore> {
    Arc::new(MemoryObjectStore::new())
}

#[tokio::test]
async fn saving_twice_with_same_place_id_keeps_one_record() {
    let store = memory();
    let drafts = DraftStore::new(store.clone());

    let first = drafts
        .upsert(
            "12 Test St".to_string(),
            "place-1".to_string(),
            json!({"v": 1}),
        )
        .await
        .unwrap();

    let second = drafts
        .upsert(
            "12 Test Street".to_string(),
            "place-1".to_string(),
            json!({"v": 2}),
        )
        .await
        .unwrap();

    let listed = drafts.list().await.unwrap();
    assert_eq!(listed.len(), 1);

    // Identity and creation time survive the update; the update time moves.
    assert_eq!(second.draft_id, first.draft_id);
    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at >= first.updated_at);
    assert_eq!(second.form_data, json!({"v": 2}));
    assert_eq!(second.property_address, "12 Test Street");
}

#[tokio::test]
async fn different_place_ids_append_separate_drafts() {
    let store = memory();
    let drafts = DraftStore::new(store.clone());

    drafts
        .upsert("12 Test St".to_string(), "place-1".to_string(), json!({}))
        .await
        .unwrap();
    drafts
        .upsert("14 Test St".to_string(), "place-2".to_string(), json!({}))
        .await
        .unwrap();

    assert_eq!(drafts.list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn deleting_nonexistent_draft_succeeds_and_changes_nothing() {
    let store = memory();
    let drafts = DraftStore::new(store.clone());

    drafts
        .upsert("12 Test St".to_string(), "place-1".to_string(), json!({}))
        .await
        .unwrap();

    let removed = drafts.delete_by_id("no-such-id").await.unwrap();
    assert!(!removed);
    assert_eq!(drafts.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn delete_by_id_removes_the_record() {
    let store = memory();
    let drafts = DraftStore::new(store.clone());

    let draft = drafts
        .upsert("12 Test St".to_string(), "place-1".to_string(), json!({}))
        .await
        .unwrap();

    let removed = drafts.delete_by_id(&draft.draft_id).await.unwrap();
    assert!(removed);
    assert!(drafts.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn listing_sorts_by_updated_at_descending() {
    let store = memory();
    let drafts = DraftStore::new(store.clone());

    drafts
        .upsert("12 Test St".to_string(), "place-1".to_string(), json!({}))
        .await
        .unwrap();
    drafts
        .upsert("14 Test St".to_string(), "place-2".to_string(), json!({}))
        .await
        .unwrap();
    // Touch the first draft so it becomes the most recent.
    drafts
        .upsert("12 Test St".to_string(), "place-1".to_string(), json!({}))
        .await
        .unwrap();

    let listed = drafts.list().await.unwrap();
    assert_eq!(listed[0].property_address, "12 Test St");
}

#[tokio::test]
async fn absent_collection_initializes_and_persists() {
    let store = memory();
    let config = ConfigStore::new(store.clone());

    assert!(store.read("commentary-options.json").await.is_err());

    let cards = config.cards(OptionCollection::Commentary).await.unwrap();
    assert!(cards.is_empty());

    // The initialized document now exists in storage.
    let bytes = store.read("commentary-options.json").await.unwrap();
    assert_eq!(bytes, b"[]");

    // A subsequent read sees it without re-initializing.
    let cards = config.cards(OptionCollection::Commentary).await.unwrap();
    assert!(cards.is_empty());
}

#[tokio::test]
async fn absent_ai_config_initializes_with_defaults() {
    let store = memory();
    let config = ConfigStore::new(store.clone());

    let ai = config.ai_config().await.unwrap();
    assert!(!ai.model.is_empty());

    let bytes = store.read("ai-config.json").await.unwrap();
    let persisted: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(persisted["model"], ai.model.as_str());
}

#[tokio::test]
async fn malformed_collection_surfaces_validation_error() {
    let store = memory();
    store
        .write("drafts.json", b"{\"not\": \"an array\"}", "application/json")
        .await
        .unwrap();

    let drafts = DraftStore::new(store.clone());
    let err = drafts.list().await.unwrap_err();
    assert!(err.to_string().contains("drafts.json"));
}

#[tokio::test]
async fn template_upload_list_delete_round_trip() {
    let store = memory();
    let templates = TemplateRepository::new(store.clone());

    templates.upload("report.docx", b"template-bytes").await.unwrap();

    let listed = templates.list().await.unwrap();
    assert!(listed.iter().any(|t| t.name == "report.docx"));

    templates.delete("report.docx").await.unwrap();

    let listed = templates.list().await.unwrap();
    assert!(!listed.iter().any(|t| t.name == "report.docx"));

    // Deleting again is idempotent.
    templates.delete("report.docx").await.unwrap();
}

#[tokio::test]
async fn history_is_not_deduplicated() {
    let store = memory();
    let history = HistoryStore::new(store.clone());

    history
        .append(HistoryRecord::new(
            "12 Test St".to_string(),
            json!({}),
            true,
            false,
        ))
        .await
        .unwrap();
    history
        .append(HistoryRecord::new(
            "12 Test St".to_string(),
            json!({}),
            true,
            true,
        ))
        .await
        .unwrap();

    let listed = history.list().await.unwrap();
    assert_eq!(listed.len(), 2);
}

#[tokio::test]
async fn deleting_nonexistent_history_succeeds() {
    let store = memory();
    let history = HistoryStore::new(store.clone());

    let removed = history.delete_by_id("no-such-id").await.unwrap();
    assert!(!removed);
}
