//! Tests for the item manager
//!
//! - Both status vocabularies land in the same canonical buckets
//! - Toggle flips native words and refuses archived items
//! - Kinds sharing the places table stay apart, for reads and writes

use serde_json::json;
use std::sync::Arc;
use tourism_cms::audit::AuditLog;
use tourism_cms::backend::{DataBackend, MemoryBackend};
use tourism_cms::bulk::{BulkAction, BulkActionsService};
use tourism_cms::manager::{ItemFilter, ItemManager, SortKey};
use tourism_cms::repository::{AccommodationService, PlaceService};
use tourism_cms::status::CanonicalStatus;
use tourism_cms::types::*;
use tourism_cms::CmsError;

async fn setup() -> (MemoryBackend, ItemManager) {
    let backend = MemoryBackend::new();
    backend
        .seed(
            PLACES_TABLE,
            vec![
                json!({ "id": "m1", "name": "Musée du Vin", "type": "museum", "status": "active",
                        "updated_at": "2024-03-01T00:00:00Z" }),
                json!({ "id": "m2", "name": "Abbaye", "type": "museum", "status": "inactive",
                        "updated_at": "2024-02-01T00:00:00Z" }),
                json!({ "id": "m3", "name": "Château", "type": "museum", "status": "archived",
                        "updated_at": "2024-01-01T00:00:00Z" }),
                json!({ "id": "m4", "name": "Cave Souterraine", "type": "museum" }),
                json!({ "id": "r1", "name": "Le Bistrot", "type": "restaurant", "status": "active" }),
            ],
        )
        .await;
    backend
        .seed(
            ACCOMMODATIONS_TABLE,
            vec![
                json!({ "id": "a1", "name": "Gîte du Lac", "status": "published" }),
                json!({ "id": "a2", "name": "Le Clos Fleuri" }),
            ],
        )
        .await;

    let shared: Arc<dyn DataBackend> = Arc::new(backend.clone());
    let accommodations = AccommodationService::new(shared.clone());
    let places = PlaceService::new(shared.clone());
    let bulk = BulkActionsService::new(accommodations.clone(), places.clone(), AuditLog::new(shared));
    (backend, ItemManager::new(accommodations, places, bulk))
}

fn ids(items: &[tourism_cms::manager::ManagedItem]) -> Vec<&str> {
    items.iter().map(|i| i.id.as_str()).collect()
}

// ═══════════════════════════════════════════════════════════════════════════
// Listing
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_list_is_scoped_to_place_type() {
    let (_backend, manager) = setup().await;

    let museums = manager.list(EntityKind::Museums, &ItemFilter::default()).await.unwrap();
    assert_eq!(ids(&museums), vec!["m2", "m4", "m3", "m1"]);
    assert!(museums.iter().all(|m| m.kind == EntityKind::Museums));

    let restaurants = manager
        .list(EntityKind::Restaurants, &ItemFilter::default())
        .await
        .unwrap();
    assert_eq!(ids(&restaurants), vec!["r1"]);
}

#[tokio::test]
async fn test_missing_status_defaults_per_family() {
    let (_backend, manager) = setup().await;

    let m4 = manager.get(EntityKind::Museums, "m4").await.unwrap().unwrap();
    assert_eq!(m4.status, CanonicalStatus::Active);
    assert_eq!(m4.native_status, "active");

    let a2 = manager.get(EntityKind::Accommodation, "a2").await.unwrap().unwrap();
    assert_eq!(a2.status, CanonicalStatus::Inactive);
    assert_eq!(a2.native_status, "draft");
}

#[tokio::test]
async fn test_filter_by_canonical_status_across_vocabularies() {
    let (_backend, manager) = setup().await;
    let active = ItemFilter {
        status: Some(CanonicalStatus::Active),
        ..Default::default()
    };

    let museums = manager.list(EntityKind::Museums, &active).await.unwrap();
    assert_eq!(ids(&museums), vec!["m4", "m1"]);

    let stays = manager.list(EntityKind::Accommodation, &active).await.unwrap();
    assert_eq!(ids(&stays), vec!["a1"]);
}

#[tokio::test]
async fn test_sort_by_updated_at_descending() {
    let (_backend, manager) = setup().await;
    let filter = ItemFilter {
        status: Some(CanonicalStatus::Active),
        sort: SortKey::UpdatedAt,
        descending: true,
        ..Default::default()
    };

    let museums = manager.list(EntityKind::Museums, &filter).await.unwrap();
    // rows without a timestamp sort first ascending, so last descending
    assert_eq!(ids(&museums), vec!["m1", "m4"]);
}

#[tokio::test]
async fn test_counts_per_bucket() {
    let (_backend, manager) = setup().await;
    let counts = manager.counts(EntityKind::Museums).await.unwrap();
    assert_eq!(counts.active, 2);
    assert_eq!(counts.inactive, 1);
    assert_eq!(counts.archived, 1);
    assert_eq!(counts.total, 4);
}

#[tokio::test]
async fn test_unsupported_kind_is_rejected() {
    let (_backend, manager) = setup().await;
    let err = manager
        .list(EntityKind::Products, &ItemFilter::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CmsError::UnsupportedType(_)));
}

#[tokio::test]
async fn test_get_under_wrong_kind_is_none() {
    let (_backend, manager) = setup().await;
    assert!(manager.get(EntityKind::Restaurants, "m1").await.unwrap().is_none());
}

// ═══════════════════════════════════════════════════════════════════════════
// Status actions
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_toggle_flips_native_status() {
    let (backend, manager) = setup().await;

    let outcome = manager.toggle_status(EntityKind::Museums, "m1").await.unwrap();
    assert!(outcome.is_persisted());
    assert_eq!(outcome.value().status, CanonicalStatus::Inactive);
    assert_eq!(backend.row(PLACES_TABLE, "m1").await.unwrap()["status"], "inactive");

    let outcome = manager.toggle_status(EntityKind::Accommodation, "a2").await.unwrap();
    assert_eq!(outcome.value().native_status, "published");
    assert_eq!(
        backend.row(ACCOMMODATIONS_TABLE, "a2").await.unwrap()["status"],
        "published"
    );
}

#[tokio::test]
async fn test_double_toggle_restores_status() {
    let (backend, manager) = setup().await;
    manager.toggle_status(EntityKind::Museums, "m2").await.unwrap();
    manager.toggle_status(EntityKind::Museums, "m2").await.unwrap();
    assert_eq!(backend.row(PLACES_TABLE, "m2").await.unwrap()["status"], "inactive");
}

#[tokio::test]
async fn test_toggle_archived_is_rejected() {
    let (backend, manager) = setup().await;
    let err = manager.toggle_status(EntityKind::Museums, "m3").await.unwrap_err();
    assert!(matches!(err, CmsError::InvalidTransition(_)));
    assert_eq!(backend.row(PLACES_TABLE, "m3").await.unwrap()["status"], "archived");
}

#[tokio::test]
async fn test_toggle_missing_is_not_found() {
    let (_backend, manager) = setup().await;
    let err = manager.toggle_status(EntityKind::Museums, "nope").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_archive_then_delete() {
    let (backend, manager) = setup().await;

    let outcome = manager.archive(EntityKind::Accommodation, "a1").await.unwrap();
    assert_eq!(outcome.value().status, CanonicalStatus::Archived);
    assert_eq!(outcome.value().native_status, "archived");

    manager.delete(EntityKind::Accommodation, "a1").await.unwrap();
    assert!(backend.row(ACCOMMODATIONS_TABLE, "a1").await.is_none());
}

#[tokio::test]
async fn test_set_status_uses_native_word() {
    let (backend, manager) = setup().await;
    manager
        .set_status(EntityKind::Accommodation, "a2", CanonicalStatus::Active)
        .await
        .unwrap();
    assert_eq!(
        backend.row(ACCOMMODATIONS_TABLE, "a2").await.unwrap()["status"],
        "published"
    );
}

#[tokio::test]
async fn test_bulk_through_manager() {
    let (_backend, manager) = setup().await;
    let result = manager
        .bulk(
            EntityKind::Museums,
            &["m1".to_string(), "m2".to_string()],
            BulkAction::SetStatus(CanonicalStatus::Archived),
        )
        .await;
    assert_eq!(result.success, 2);

    let counts = manager.counts(EntityKind::Museums).await.unwrap();
    assert_eq!(counts.archived, 3);
}

// ═══════════════════════════════════════════════════════════════════════════
// Shared places table
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_single_writes_under_wrong_kind_are_not_found() {
    let (backend, manager) = setup().await;

    let err = manager.archive(EntityKind::Walks, "r1").await.unwrap_err();
    assert!(err.is_not_found());
    let err = manager
        .set_status(EntityKind::Museums, "r1", CanonicalStatus::Inactive)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    let err = manager.toggle_status(EntityKind::Merchants, "r1").await.unwrap_err();
    assert!(err.is_not_found());
    let err = manager.delete(EntityKind::Events, "r1").await.unwrap_err();
    assert!(err.is_not_found());

    let stored = backend.row(PLACES_TABLE, "r1").await.unwrap();
    assert_eq!(stored["status"], "active");
}

#[tokio::test]
async fn test_bulk_under_wrong_kind_fails_per_id() {
    let (backend, manager) = setup().await;

    let result = manager
        .bulk(
            EntityKind::Museums,
            &["m1".to_string(), "r1".to_string()],
            BulkAction::SetStatus(CanonicalStatus::Archived),
        )
        .await;
    assert_eq!(result.success, 1);
    assert_eq!(result.failed, 1);
    assert!(result.errors[0].starts_with("r1:"));
    assert_eq!(backend.row(PLACES_TABLE, "r1").await.unwrap()["status"], "active");
    assert_eq!(backend.row(PLACES_TABLE, "m1").await.unwrap()["status"], "archived");

    let result = manager
        .bulk(EntityKind::Museums, &["r1".to_string()], BulkAction::Delete)
        .await;
    assert_eq!(result.failed, 1);
    assert!(backend.row(PLACES_TABLE, "r1").await.is_some());
}

#[tokio::test]
async fn test_list_keeps_rows_with_null_name() {
    let (backend, manager) = setup().await;
    backend
        .seed(
            ACCOMMODATIONS_TABLE,
            vec![json!({ "id": "a3", "name": null, "status": "published" })],
        )
        .await;

    let stays = manager
        .list(EntityKind::Accommodation, &ItemFilter::default())
        .await
        .unwrap();
    assert_eq!(stays.len(), 3);
    assert!(stays.iter().any(|s| s.id == "a3" && s.name.is_empty()));
}
