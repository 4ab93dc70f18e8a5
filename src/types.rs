//! Data types for the content tables
//!
//! Based on:
//! - `accommodations` table (content-like status vocabulary)
//! - `places` table shared by museums, restaurants, merchants, walks,
//!   experiences and events (place-like status vocabulary, `type` column)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::CmsError;
use crate::status::{ContentStatus, EntityStatus, PlaceStatus, StatusFamily};

pub const ACCOMMODATIONS_TABLE: &str = "accommodations";
pub const PLACES_TABLE: &str = "places";
pub const AUDIT_LOGS_TABLE: &str = "audit_logs";

/// Treat an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ═══════════════════════════════════════════════════════════════════════════
// Entity kinds and routing
// ═══════════════════════════════════════════════════════════════════════════

/// Item types the admin screens switch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Museums,
    Restaurants,
    Accommodation,
    Merchants,
    Walks,
    Experiences,
    Events,
    Articles,
    Products,
}

/// Where an entity kind is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Dedicated `accommodations` table with its own validation.
    Accommodations,
    /// Shared `places` table, rows distinguished by `type`.
    Places { place_type: &'static str },
}

impl Route {
    pub fn table(&self) -> &'static str {
        match self {
            Route::Accommodations => ACCOMMODATIONS_TABLE,
            Route::Places { .. } => PLACES_TABLE,
        }
    }
}

impl EntityKind {
    pub const ALL: [EntityKind; 9] = [
        EntityKind::Museums,
        EntityKind::Restaurants,
        EntityKind::Accommodation,
        EntityKind::Merchants,
        EntityKind::Walks,
        EntityKind::Experiences,
        EntityKind::Events,
        EntityKind::Articles,
        EntityKind::Products,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Museums => "museums",
            EntityKind::Restaurants => "restaurants",
            EntityKind::Accommodation => "accommodation",
            EntityKind::Merchants => "merchants",
            EntityKind::Walks => "walks",
            EntityKind::Experiences => "experiences",
            EntityKind::Events => "events",
            EntityKind::Articles => "articles",
            EntityKind::Products => "products",
        }
    }

    /// Status vocabulary of this kind.
    pub fn family(&self) -> StatusFamily {
        match self {
            EntityKind::Accommodation | EntityKind::Articles | EntityKind::Products => {
                StatusFamily::Content
            }
            EntityKind::Museums
            | EntityKind::Restaurants
            | EntityKind::Merchants
            | EntityKind::Walks
            | EntityKind::Experiences
            | EntityKind::Events => StatusFamily::Place,
        }
    }

    /// Routing table. `None` means the kind has no backing table here.
    pub fn route(&self) -> Option<Route> {
        match self {
            EntityKind::Accommodation => Some(Route::Accommodations),
            EntityKind::Museums => Some(Route::Places { place_type: "museum" }),
            EntityKind::Restaurants => Some(Route::Places { place_type: "restaurant" }),
            EntityKind::Merchants => Some(Route::Places { place_type: "merchant" }),
            EntityKind::Walks => Some(Route::Places { place_type: "walk" }),
            EntityKind::Experiences => Some(Route::Places { place_type: "experience" }),
            EntityKind::Events => Some(Route::Places { place_type: "event" }),
            EntityKind::Articles | EntityKind::Products => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = CmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CmsError::InvalidInput(format!("unknown item type '{s}'")))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Accommodation
// ═══════════════════════════════════════════════════════════════════════════

/// Row of the `accommodations` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Accommodation {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub accommodation_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub capacity: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub price_range: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub amenities: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub featured: bool,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Accommodation {
    /// Typed status; a missing value reads as draft.
    pub fn entity_status(&self) -> EntityStatus {
        EntityStatus::from_raw(StatusFamily::Content, self.status.as_deref())
    }
}

/// Field set for creating or patching an accommodation.
///
/// Every field is optional so the same shape serves a full create (checked
/// with `validate_accommodation`) and a partial patch (checked field by field).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AccommodationInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub accommodation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amenities: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ContentStatus>,
}

// ═══════════════════════════════════════════════════════════════════════════
// Places (museums, restaurants, merchants, walks, experiences, events)
// ═══════════════════════════════════════════════════════════════════════════

/// Row of the shared `places` table.
///
/// Columns specific to one place type (opening hours, cuisine, distance, ...)
/// are kept in `details` untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Place {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "type")]
    pub place_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl Place {
    /// Typed status; a missing value reads as active.
    pub fn entity_status(&self) -> EntityStatus {
        EntityStatus::from_raw(StatusFamily::Place, self.status.as_deref())
    }
}

/// Field set for creating or patching a place.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlaceInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PlaceStatus>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

// ═══════════════════════════════════════════════════════════════════════════
// Bulk action result
// ═══════════════════════════════════════════════════════════════════════════

/// Summary of one bulk invocation, returned to the admin screen as is.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BulkActionResult {
    pub success: usize,
    pub failed: usize,
    pub errors: Vec<String>,
    /// Ids whose write was accepted but not persisted (permission-filtered).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub optimistic_only: Vec<String>,
}

impl BulkActionResult {
    /// Every id failed for the same reason; nothing was attempted.
    pub fn all_failed(count: usize, reason: impl Into<String>) -> Self {
        Self {
            success: 0,
            failed: count,
            errors: vec![reason.into()],
            optimistic_only: Vec::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.success + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_round_trips_through_str() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.as_str().parse::<EntityKind>().unwrap(), kind);
        }
        assert!("hotels".parse::<EntityKind>().is_err());
    }

    #[test]
    fn place_kinds_share_one_table() {
        for kind in [
            EntityKind::Museums,
            EntityKind::Restaurants,
            EntityKind::Merchants,
            EntityKind::Walks,
        ] {
            assert_eq!(kind.route().unwrap().table(), PLACES_TABLE);
            assert_eq!(kind.family(), StatusFamily::Place);
        }
        assert_eq!(EntityKind::Accommodation.route(), Some(Route::Accommodations));
        assert!(EntityKind::Articles.route().is_none());
        assert!(EntityKind::Products.route().is_none());
    }

    #[test]
    fn accommodation_tolerates_nulls() {
        let row = json!({
            "id": "a1",
            "name": "Gîte du Lac",
            "description": null,
            "amenities": null,
            "capacity": 4,
            "type": "gite",
        });
        let acc: Accommodation = serde_json::from_value(row).unwrap();
        assert_eq!(acc.description, "");
        assert!(acc.amenities.is_empty());
        assert_eq!(acc.entity_status(), EntityStatus::Content(ContentStatus::Draft));
    }

    #[test]
    fn place_keeps_extra_columns() {
        let row = json!({
            "id": "p1",
            "name": "Musée du Vin",
            "type": "museum",
            "opening_hours": "10h-18h",
        });
        let place: Place = serde_json::from_value(row).unwrap();
        assert_eq!(place.details["opening_hours"], "10h-18h");
        assert_eq!(place.entity_status(), EntityStatus::Place(PlaceStatus::Active));
    }

    #[test]
    fn null_name_reads_as_empty() {
        let acc: Accommodation =
            serde_json::from_value(json!({ "id": "a1", "name": null })).unwrap();
        assert_eq!(acc.name, "");

        let place: Place =
            serde_json::from_value(json!({ "id": "p1", "name": null, "type": "walk" })).unwrap();
        assert_eq!(place.name, "");
        assert!(place.details.is_empty());
    }

    #[test]
    fn input_serializes_only_set_fields() {
        let input = AccommodationInput {
            capacity: Some(3),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&input).unwrap(), json!({ "capacity": 3 }));
    }
}
