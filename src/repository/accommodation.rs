//! Accommodation repository - CRUD operations for the `accommodations` table.

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

use super::{fetch_optional, from_row, from_rows, is_blank, to_row};
use crate::backend::{DataBackend, Query};
use crate::error::{CmsError, CmsResult};
use crate::fallback::{update_with_fallback, WriteOutcome};
use crate::slug::generate_slug;
use crate::status::ContentStatus;
use crate::types::{Accommodation, AccommodationInput, ACCOMMODATIONS_TABLE};

const ENTITY: &str = "accommodation";

/// Check a full accommodation before insert.
///
/// Returns human-readable messages; an empty list means the input is valid.
pub fn validate_accommodation(input: &AccommodationInput) -> Vec<String> {
    let mut errors = Vec::new();

    if is_blank(&input.name) {
        errors.push("Name is required".to_string());
    }
    if is_blank(&input.description) {
        errors.push("Description is required".to_string());
    }
    if is_blank(&input.accommodation_type) {
        errors.push("Type is required".to_string());
    }
    if !input.capacity.is_some_and(|c| c >= 1) {
        errors.push("Capacity must be at least 1".to_string());
    }
    if is_blank(&input.address) {
        errors.push("Address is required".to_string());
    }
    errors.extend(contact_errors(input));

    errors
}

/// Check only the fields a patch actually sets.
fn validate_patch(patch: &AccommodationInput) -> Vec<String> {
    let mut errors = Vec::new();

    let required = [
        (&patch.name, "Name cannot be empty"),
        (&patch.description, "Description cannot be empty"),
        (&patch.accommodation_type, "Type cannot be empty"),
        (&patch.address, "Address cannot be empty"),
    ];
    for (field, message) in required {
        if field.is_some() && is_blank(field) {
            errors.push(message.to_string());
        }
    }
    if patch.capacity.is_some_and(|c| c < 1) {
        errors.push("Capacity must be at least 1".to_string());
    }
    errors.extend(contact_errors(patch));

    errors
}

/// Email and website are optional but must look right when present.
fn contact_errors(input: &AccommodationInput) -> Vec<String> {
    let mut errors = Vec::new();
    if let Some(email) = input.email.as_deref().filter(|e| !e.trim().is_empty()) {
        if !email.contains('@') {
            errors.push("Email must be a valid address".to_string());
        }
    }
    if let Some(website) = input.website.as_deref().filter(|w| !w.trim().is_empty()) {
        if !website.starts_with("http") {
            errors.push("Website must start with http".to_string());
        }
    }
    errors
}

/// Repository for accommodation operations.
#[derive(Clone)]
pub struct AccommodationService {
    backend: Arc<dyn DataBackend>,
}

impl AccommodationService {
    pub fn new(backend: Arc<dyn DataBackend>) -> Self {
        Self { backend }
    }

    async fn list(&self, query: Query) -> Vec<Accommodation> {
        let result = self
            .backend
            .select(ACCOMMODATIONS_TABLE, &query)
            .await
            .map(from_rows);

        match result {
            Ok(items) => items,
            Err(e) => {
                error!("Failed to load accommodations: {}", e);
                Vec::new()
            }
        }
    }

    /// List all accommodations by name.
    pub async fn get_all(&self) -> Vec<Accommodation> {
        self.list(Query::new().order_by("name", true)).await
    }

    /// List published accommodations by name.
    pub async fn get_published(&self) -> Vec<Accommodation> {
        let query = Query::new()
            .eq("status", ContentStatus::Published.as_str())
            .order_by("name", true);
        self.list(query).await
    }

    /// One page of accommodations, newest first.
    pub async fn list_page(&self, offset: usize, limit: usize) -> Vec<Accommodation> {
        let query = Query::new()
            .order_by("created_at", false)
            .range(offset, limit);
        self.list(query).await
    }

    /// Get an accommodation by ID.
    pub async fn get_by_id(&self, id: &str) -> CmsResult<Option<Accommodation>> {
        fetch_optional(self.backend.as_ref(), ACCOMMODATIONS_TABLE, "id", id)
            .await?
            .map(from_row)
            .transpose()
    }

    /// Get an accommodation by slug.
    pub async fn get_by_slug(&self, slug: &str) -> CmsResult<Option<Accommodation>> {
        fetch_optional(self.backend.as_ref(), ACCOMMODATIONS_TABLE, "slug", slug)
            .await?
            .map(from_row)
            .transpose()
    }

    /// Validate and insert a new accommodation.
    ///
    /// The slug defaults to one generated from the name and the status to
    /// draft. Nothing is sent when validation fails.
    pub async fn create(&self, mut input: AccommodationInput) -> CmsResult<Accommodation> {
        let errors = validate_accommodation(&input);
        if !errors.is_empty() {
            return Err(CmsError::Validation(errors));
        }

        let slug = match input.slug.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(slug) => generate_slug(slug),
            None => generate_slug(input.name.as_deref().unwrap_or_default()),
        };
        input.slug = Some(slug);
        input.status.get_or_insert(ContentStatus::Draft);

        let created = self
            .backend
            .insert(ACCOMMODATIONS_TABLE, to_row(&input)?)
            .await?;
        let accommodation: Accommodation = from_row(created)?;

        info!(
            id = %accommodation.id,
            slug = %accommodation.slug,
            "Accommodation created"
        );
        Ok(accommodation)
    }

    /// Apply a partial patch.
    pub async fn update(
        &self,
        id: &str,
        mut patch: AccommodationInput,
    ) -> CmsResult<WriteOutcome<Accommodation>> {
        let errors = validate_patch(&patch);
        if !errors.is_empty() {
            return Err(CmsError::Validation(errors));
        }
        if let Some(slug) = patch.slug.take() {
            patch.slug = Some(generate_slug(&slug));
        }

        let mut row = to_row(&patch)?;
        row.insert(
            "updated_at".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );

        update_with_fallback(self.backend.as_ref(), ACCOMMODATIONS_TABLE, id, row)
            .await?
            .try_map(from_row)
    }

    /// Set the status column only.
    pub async fn update_status(
        &self,
        id: &str,
        status: ContentStatus,
    ) -> CmsResult<WriteOutcome<Accommodation>> {
        let patch = AccommodationInput {
            status: Some(status),
            ..Default::default()
        };
        self.update(id, patch).await
    }

    /// Hard delete.
    pub async fn delete(&self, id: &str) -> CmsResult<()> {
        match self.backend.delete(ACCOMMODATIONS_TABLE, id).await {
            Ok(()) => {
                info!(id, "Accommodation deleted");
                Ok(())
            }
            Err(e) if e.is_no_rows() => Err(CmsError::not_found(ENTITY, id)),
            Err(e) => Err(e),
        }
    }
}
