//! Item manager
//!
//! What the admin list screens consume: every item type flattened into a
//! `ManagedItem` with a canonical status, filtered, sorted and paged in one
//! place, plus the single-item and bulk actions those screens dispatch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bulk::{BulkAction, BulkActionsService};
use crate::error::{CmsError, CmsResult};
use crate::fallback::WriteOutcome;
use crate::repository::{AccommodationService, PlaceService};
use crate::slug::generate_slug;
use crate::status::{CanonicalStatus, ContentStatus, EntityStatus, PlaceStatus};
use crate::types::{Accommodation, BulkActionResult, EntityKind, Place, Route};

/// One row of an admin list, whatever table it came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManagedItem {
    pub id: String,
    pub name: String,
    pub kind: EntityKind,
    pub slug: String,
    pub status: CanonicalStatus,
    /// Status in the item's own vocabulary, defaults applied.
    pub native_status: String,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ManagedItem {
    pub fn from_accommodation(accommodation: Accommodation) -> Self {
        let status = accommodation.entity_status();
        Self {
            id: accommodation.id,
            name: accommodation.name,
            kind: EntityKind::Accommodation,
            slug: accommodation.slug,
            status: status.canonical(),
            native_status: status.as_str().to_string(),
            updated_at: accommodation.updated_at,
        }
    }

    pub fn from_place(kind: EntityKind, place: Place) -> Self {
        let status = place.entity_status();
        Self {
            id: place.id,
            name: place.name,
            kind,
            slug: place.slug,
            status: status.canonical(),
            native_status: status.as_str().to_string(),
            updated_at: place.updated_at,
        }
    }

    pub fn entity_status(&self) -> EntityStatus {
        EntityStatus::from_raw(self.kind.family(), Some(&self.native_status))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Name,
    UpdatedAt,
    Status,
}

/// List screen filter state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemFilter {
    pub status: Option<CanonicalStatus>,
    pub search: Option<String>,
    pub sort: SortKey,
    pub descending: bool,
    pub offset: usize,
    pub limit: Option<usize>,
}

/// Item count per canonical bucket.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct StatusCounts {
    pub active: usize,
    pub inactive: usize,
    pub archived: usize,
    pub total: usize,
}

/// Filter, sort and page already-loaded items.
pub fn apply_filter(items: Vec<ManagedItem>, filter: &ItemFilter) -> Vec<ManagedItem> {
    let needle = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| (s.to_lowercase(), generate_slug(s)));

    let mut items: Vec<ManagedItem> = items
        .into_iter()
        .filter(|item| filter.status.is_none_or(|s| item.status == s))
        .filter(|item| match &needle {
            Some((lower, slug)) => {
                item.name.to_lowercase().contains(lower)
                    || (!slug.is_empty() && item.slug.contains(slug.as_str()))
            }
            None => true,
        })
        .collect();

    items.sort_by(|a, b| {
        let ord = match filter.sort {
            SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortKey::Status => a
                .status
                .cmp(&b.status)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase())),
        };
        if filter.descending { ord.reverse() } else { ord }
    });

    items
        .into_iter()
        .skip(filter.offset)
        .take(filter.limit.unwrap_or(usize::MAX))
        .collect()
}

fn route_for(kind: EntityKind) -> CmsResult<Route> {
    kind.route()
        .ok_or_else(|| CmsError::UnsupportedType(kind.to_string()))
}

#[derive(Clone)]
pub struct ItemManager {
    accommodations: AccommodationService,
    places: PlaceService,
    bulk: BulkActionsService,
}

impl ItemManager {
    pub fn new(
        accommodations: AccommodationService,
        places: PlaceService,
        bulk: BulkActionsService,
    ) -> Self {
        Self {
            accommodations,
            places,
            bulk,
        }
    }

    async fn load(&self, kind: EntityKind) -> CmsResult<Vec<ManagedItem>> {
        let items = match route_for(kind)? {
            Route::Accommodations => self
                .accommodations
                .get_all()
                .await
                .into_iter()
                .map(ManagedItem::from_accommodation)
                .collect(),
            Route::Places { place_type } => self
                .places
                .get_all(place_type)
                .await
                .into_iter()
                .map(|p| ManagedItem::from_place(kind, p))
                .collect(),
        };
        Ok(items)
    }

    /// Filtered, sorted, paged list of one item type.
    pub async fn list(&self, kind: EntityKind, filter: &ItemFilter) -> CmsResult<Vec<ManagedItem>> {
        let items = self.load(kind).await?;
        Ok(apply_filter(items, filter))
    }

    pub async fn counts(&self, kind: EntityKind) -> CmsResult<StatusCounts> {
        let items = self.load(kind).await?;
        let mut counts = StatusCounts {
            total: items.len(),
            ..Default::default()
        };
        for item in &items {
            match item.status {
                CanonicalStatus::Active => counts.active += 1,
                CanonicalStatus::Inactive => counts.inactive += 1,
                CanonicalStatus::Archived => counts.archived += 1,
            }
        }
        Ok(counts)
    }

    /// One item; `None` when missing or stored under another place type.
    pub async fn get(&self, kind: EntityKind, id: &str) -> CmsResult<Option<ManagedItem>> {
        match route_for(kind)? {
            Route::Accommodations => Ok(self
                .accommodations
                .get_by_id(id)
                .await?
                .map(ManagedItem::from_accommodation)),
            Route::Places { place_type } => Ok(self
                .places
                .get_by_id(id)
                .await?
                .filter(|p| p.place_type == place_type)
                .map(|p| ManagedItem::from_place(kind, p))),
        }
    }

    /// Move one item to a canonical status, in its own vocabulary.
    pub async fn set_status(
        &self,
        kind: EntityKind,
        id: &str,
        status: CanonicalStatus,
    ) -> CmsResult<WriteOutcome<ManagedItem>> {
        match route_for(kind)? {
            Route::Accommodations => Ok(self
                .accommodations
                .update_status(id, ContentStatus::from_canonical(status))
                .await?
                .map(ManagedItem::from_accommodation)),
            Route::Places { place_type } => Ok(self
                .places
                .update_status(place_type, id, PlaceStatus::from_canonical(status))
                .await?
                .map(|p| ManagedItem::from_place(kind, p))),
        }
    }

    /// Flip between visible and hidden. Archived items are refused.
    pub async fn toggle_status(&self, kind: EntityKind, id: &str) -> CmsResult<WriteOutcome<ManagedItem>> {
        let item = self
            .get(kind, id)
            .await?
            .ok_or_else(|| CmsError::not_found(kind.to_string(), id))?;

        let next = item.entity_status().toggled().ok_or_else(|| {
            CmsError::InvalidTransition(format!("{kind} {id} is archived and cannot be toggled"))
        })?;

        self.set_status(kind, id, next.canonical()).await
    }

    pub async fn archive(&self, kind: EntityKind, id: &str) -> CmsResult<WriteOutcome<ManagedItem>> {
        self.set_status(kind, id, CanonicalStatus::Archived).await
    }

    pub async fn delete(&self, kind: EntityKind, id: &str) -> CmsResult<()> {
        match route_for(kind)? {
            Route::Accommodations => self.accommodations.delete(id).await,
            Route::Places { place_type } => self.places.delete(place_type, id).await,
        }
    }

    pub async fn bulk(&self, kind: EntityKind, ids: &[String], action: BulkAction) -> BulkActionResult {
        self.bulk.execute(kind, ids, action).await
    }
}
