//! Bulk operation executor
//!
//! Applies one action to a list of ids of one item type:
//! - ids are processed one after another, never concurrently
//! - a failing id is recorded and the batch carries on
//! - the caller always gets a `BulkActionResult`, even if every id failed
//!
//! Nothing is rolled back; a partially failed batch leaves the items in a
//! mixed state, which the `failed`/`errors` fields report.

use chrono::Utc;
use std::fmt;
use tracing::{info, warn};

use crate::audit::{AuditEntry, AuditLog};
use crate::error::CmsResult;
use crate::repository::{AccommodationService, PlaceService};
use crate::status::{CanonicalStatus, ContentStatus, PlaceStatus};
use crate::types::{BulkActionResult, EntityKind, Route};

/// Action applied to every id of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    SetStatus(CanonicalStatus),
    Delete,
}

impl fmt::Display for BulkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BulkAction::SetStatus(status) => write!(f, "set_status:{status}"),
            BulkAction::Delete => f.write_str("delete"),
        }
    }
}

/// Whether a single item write reached storage.
enum ItemWrite {
    Persisted,
    OptimisticOnly,
}

#[derive(Clone)]
pub struct BulkActionsService {
    accommodations: AccommodationService,
    places: PlaceService,
    audit: AuditLog,
}

impl BulkActionsService {
    pub fn new(accommodations: AccommodationService, places: PlaceService, audit: AuditLog) -> Self {
        Self {
            accommodations,
            places,
            audit,
        }
    }

    /// Move every id to the canonical status, in the kind's own vocabulary.
    pub async fn update_status(
        &self,
        kind: EntityKind,
        ids: &[String],
        status: CanonicalStatus,
    ) -> BulkActionResult {
        self.execute(kind, ids, BulkAction::SetStatus(status)).await
    }

    /// Hard delete every id.
    pub async fn delete(&self, kind: EntityKind, ids: &[String]) -> BulkActionResult {
        self.execute(kind, ids, BulkAction::Delete).await
    }

    /// Run one action over a list of ids.
    pub async fn execute(&self, kind: EntityKind, ids: &[String], action: BulkAction) -> BulkActionResult {
        let Some(route) = kind.route() else {
            warn!(kind = %kind, "Bulk action on unsupported item type");
            return BulkActionResult::all_failed(
                ids.len(),
                format!("Unsupported item type for bulk actions: {kind}"),
            );
        };

        let mut result = BulkActionResult::default();
        for id in ids {
            match self.apply(route, id, action).await {
                Ok(ItemWrite::Persisted) => result.success += 1,
                Ok(ItemWrite::OptimisticOnly) => {
                    result.success += 1;
                    result.optimistic_only.push(id.clone());
                }
                Err(e) => {
                    result.failed += 1;
                    result.errors.push(format!("{id}: {e}"));
                }
            }
        }

        info!(
            kind = %kind,
            action = %action,
            success = result.success,
            failed = result.failed,
            "Bulk action finished"
        );
        if !result.optimistic_only.is_empty() {
            warn!(
                kind = %kind,
                ids = ?result.optimistic_only,
                "Bulk action reported success for writes that were not persisted"
            );
        }

        if !ids.is_empty() {
            self.audit
                .record(AuditEntry {
                    action: format!("bulk_{action}"),
                    entity_type: kind.to_string(),
                    entity_ids: ids.to_vec(),
                    success: result.success,
                    failed: result.failed,
                    created_at: Utc::now(),
                })
                .await;
        }

        result
    }

    async fn apply(&self, route: Route, id: &str, action: BulkAction) -> CmsResult<ItemWrite> {
        let persisted = match (route, action) {
            (Route::Accommodations, BulkAction::SetStatus(status)) => self
                .accommodations
                .update_status(id, ContentStatus::from_canonical(status))
                .await?
                .is_persisted(),
            (Route::Places { place_type }, BulkAction::SetStatus(status)) => self
                .places
                .update_status(place_type, id, PlaceStatus::from_canonical(status))
                .await?
                .is_persisted(),
            (Route::Accommodations, BulkAction::Delete) => {
                self.accommodations.delete(id).await?;
                true
            }
            (Route::Places { place_type }, BulkAction::Delete) => {
                self.places.delete(place_type, id).await?;
                true
            }
        };

        Ok(if persisted {
            ItemWrite::Persisted
        } else {
            ItemWrite::OptimisticOnly
        })
    }
}
