//! Place repository - CRUD operations for the shared `places` table.
//!
//! Museums, restaurants, merchants, walks, experiences and events all live
//! in one table and are told apart by the `type` column.

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::{fetch_optional, from_row, from_rows, is_blank, to_row};
use crate::backend::{DataBackend, Query};
use crate::error::{CmsError, CmsResult};
use crate::fallback::{update_with_fallback, WriteOutcome};
use crate::slug::generate_slug;
use crate::status::PlaceStatus;
use crate::types::{Place, PlaceInput, PLACES_TABLE};

const ENTITY: &str = "place";

/// Check a new place before insert.
pub fn validate_place(input: &PlaceInput) -> Vec<String> {
    let mut errors = Vec::new();
    if is_blank(&input.name) {
        errors.push("Name is required".to_string());
    }
    errors
}

/// Repository for place operations.
#[derive(Clone)]
pub struct PlaceService {
    backend: Arc<dyn DataBackend>,
}

impl PlaceService {
    pub fn new(backend: Arc<dyn DataBackend>) -> Self {
        Self { backend }
    }

    /// List places of one type by name. Errors are logged, not returned.
    pub async fn get_all(&self, place_type: &str) -> Vec<Place> {
        let query = Query::new()
            .eq("type", place_type)
            .order_by("name", true);

        let result = self
            .backend
            .select(PLACES_TABLE, &query)
            .await
            .map(from_rows);

        match result {
            Ok(places) => places,
            Err(e) => {
                error!(place_type, "Failed to load places: {}", e);
                Vec::new()
            }
        }
    }

    /// Get a place by ID.
    pub async fn get_by_id(&self, id: &str) -> CmsResult<Option<Place>> {
        fetch_optional(self.backend.as_ref(), PLACES_TABLE, "id", id)
            .await?
            .map(from_row)
            .transpose()
    }

    /// Get a place by slug.
    pub async fn get_by_slug(&self, slug: &str) -> CmsResult<Option<Place>> {
        fetch_optional(self.backend.as_ref(), PLACES_TABLE, "slug", slug)
            .await?
            .map(from_row)
            .transpose()
    }

    /// Validate and insert a new place of the given type.
    pub async fn create(&self, place_type: &str, mut input: PlaceInput) -> CmsResult<Place> {
        let errors = validate_place(&input);
        if !errors.is_empty() {
            return Err(CmsError::Validation(errors));
        }

        let slug = match input.slug.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(slug) => generate_slug(slug),
            None => generate_slug(input.name.as_deref().unwrap_or_default()),
        };
        input.slug = Some(slug);
        input.status.get_or_insert(PlaceStatus::Active);

        let mut row = to_row(&input)?;
        row.remove("id");
        row.insert("type".to_string(), Value::String(place_type.to_string()));

        let created = self.backend.insert(PLACES_TABLE, row).await?;
        let place: Place = from_row(created)?;

        info!(id = %place.id, place_type, "Place created");
        Ok(place)
    }

    /// Fail with `NotFound` unless the row exists and carries `place_type`.
    /// Writes go through this so one kind cannot touch another kind's rows.
    async fn ensure_type(&self, place_type: &str, id: &str) -> CmsResult<()> {
        match self.get_by_id(id).await? {
            Some(place) if place.place_type == place_type => Ok(()),
            Some(place) => {
                warn!(
                    id,
                    place_type,
                    stored_type = %place.place_type,
                    "Place write refused: row belongs to another type"
                );
                Err(CmsError::not_found(ENTITY, id))
            }
            None => Err(CmsError::not_found(ENTITY, id)),
        }
    }

    /// Apply a partial patch to a place of `place_type`. The `type` column is
    /// never changed here.
    pub async fn update(
        &self,
        place_type: &str,
        id: &str,
        mut patch: PlaceInput,
    ) -> CmsResult<WriteOutcome<Place>> {
        if patch.name.is_some() && is_blank(&patch.name) {
            return Err(CmsError::Validation(vec!["Name cannot be empty".to_string()]));
        }
        self.ensure_type(place_type, id).await?;
        if let Some(slug) = patch.slug.take() {
            patch.slug = Some(generate_slug(&slug));
        }

        let mut row = to_row(&patch)?;
        row.remove("id");
        row.remove("type");
        row.insert(
            "updated_at".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );

        update_with_fallback(self.backend.as_ref(), PLACES_TABLE, id, row)
            .await?
            .try_map(from_row)
    }

    /// Set the status column only.
    pub async fn update_status(
        &self,
        place_type: &str,
        id: &str,
        status: PlaceStatus,
    ) -> CmsResult<WriteOutcome<Place>> {
        let patch = PlaceInput {
            status: Some(status),
            ..Default::default()
        };
        self.update(place_type, id, patch).await
    }

    /// Hard delete of a place of `place_type`.
    pub async fn delete(&self, place_type: &str, id: &str) -> CmsResult<()> {
        self.ensure_type(place_type, id).await?;
        match self.backend.delete(PLACES_TABLE, id).await {
            Ok(()) => {
                info!(id, "Place deleted");
                Ok(())
            }
            Err(e) if e.is_no_rows() => Err(CmsError::not_found(ENTITY, id)),
            Err(e) => Err(e),
        }
    }
}
