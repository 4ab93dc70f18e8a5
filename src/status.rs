//! Status normalizer
//!
//! Two vocabularies coexist in the content tables:
//! - content-like rows (accommodations, articles): `draft | published | archived`
//! - place-like rows (museums, restaurants, ...): `active | inactive | archived`
//!
//! Both collapse onto a canonical `active | inactive | archived` bucket for
//! filtering and display. A missing status means `draft` for content and
//! `active` for places; the two families have different default visibility.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CmsError;

// ═══════════════════════════════════════════════════════════════════════════
// Vocabularies
// ═══════════════════════════════════════════════════════════════════════════

/// Which status vocabulary an entity family uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFamily {
    Content,
    Place,
}

/// Status vocabulary of content-like entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    Draft,
    Published,
    Archived,
}

/// Status vocabulary of place-like entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceStatus {
    Active,
    Inactive,
    Archived,
}

/// Canonical display bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalStatus {
    Active,
    Inactive,
    Archived,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Published => "published",
            ContentStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(ContentStatus::Draft),
            "published" => Some(ContentStatus::Published),
            "archived" => Some(ContentStatus::Archived),
            _ => None,
        }
    }

    pub fn from_canonical(canonical: CanonicalStatus) -> Self {
        match canonical {
            CanonicalStatus::Active => ContentStatus::Published,
            CanonicalStatus::Inactive => ContentStatus::Draft,
            CanonicalStatus::Archived => ContentStatus::Archived,
        }
    }
}

impl PlaceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceStatus::Active => "active",
            PlaceStatus::Inactive => "inactive",
            PlaceStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(PlaceStatus::Active),
            "inactive" => Some(PlaceStatus::Inactive),
            "archived" => Some(PlaceStatus::Archived),
            _ => None,
        }
    }

    pub fn from_canonical(canonical: CanonicalStatus) -> Self {
        match canonical {
            CanonicalStatus::Active => PlaceStatus::Active,
            CanonicalStatus::Inactive => PlaceStatus::Inactive,
            CanonicalStatus::Archived => PlaceStatus::Archived,
        }
    }
}

impl CanonicalStatus {
    pub const ALL: [CanonicalStatus; 3] = [
        CanonicalStatus::Active,
        CanonicalStatus::Inactive,
        CanonicalStatus::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalStatus::Active => "active",
            CanonicalStatus::Inactive => "inactive",
            CanonicalStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for CanonicalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts canonical words as well as either native vocabulary, so a
/// request may say `published` where it means the active bucket.
impl FromStr for CanonicalStatus {
    type Err = CmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" | "published" => Ok(CanonicalStatus::Active),
            "inactive" | "draft" => Ok(CanonicalStatus::Inactive),
            "archived" => Ok(CanonicalStatus::Archived),
            other => Err(CmsError::InvalidInput(format!("unknown status '{other}'"))),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Tagged union over both vocabularies
// ═══════════════════════════════════════════════════════════════════════════

/// A native status value tagged with its family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityStatus {
    Content(ContentStatus),
    Place(PlaceStatus),
}

impl EntityStatus {
    /// Status assumed when a row has none.
    pub fn default_for(family: StatusFamily) -> Self {
        match family {
            StatusFamily::Content => EntityStatus::Content(ContentStatus::Draft),
            StatusFamily::Place => EntityStatus::Place(PlaceStatus::Active),
        }
    }

    /// Parse a raw column value. Missing or unrecognised values fall back to
    /// the family default.
    pub fn from_raw(family: StatusFamily, raw: Option<&str>) -> Self {
        let parsed = raw.and_then(|s| match family {
            StatusFamily::Content => ContentStatus::parse(s).map(EntityStatus::Content),
            StatusFamily::Place => PlaceStatus::parse(s).map(EntityStatus::Place),
        });
        parsed.unwrap_or_else(|| Self::default_for(family))
    }

    /// Native word for the given canonical bucket in the given family.
    pub fn for_canonical(family: StatusFamily, canonical: CanonicalStatus) -> Self {
        match family {
            StatusFamily::Content => EntityStatus::Content(ContentStatus::from_canonical(canonical)),
            StatusFamily::Place => EntityStatus::Place(PlaceStatus::from_canonical(canonical)),
        }
    }

    pub fn family(&self) -> StatusFamily {
        match self {
            EntityStatus::Content(_) => StatusFamily::Content,
            EntityStatus::Place(_) => StatusFamily::Place,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityStatus::Content(s) => s.as_str(),
            EntityStatus::Place(s) => s.as_str(),
        }
    }

    pub fn canonical(&self) -> CanonicalStatus {
        match self {
            EntityStatus::Content(ContentStatus::Published)
            | EntityStatus::Place(PlaceStatus::Active) => CanonicalStatus::Active,
            EntityStatus::Content(ContentStatus::Draft)
            | EntityStatus::Place(PlaceStatus::Inactive) => CanonicalStatus::Inactive,
            EntityStatus::Content(ContentStatus::Archived)
            | EntityStatus::Place(PlaceStatus::Archived) => CanonicalStatus::Archived,
        }
    }

    /// Flip between the visible and hidden state. Archived rows are not
    /// part of the toggle cycle.
    pub fn toggled(&self) -> Option<Self> {
        match self {
            EntityStatus::Content(ContentStatus::Published) => {
                Some(EntityStatus::Content(ContentStatus::Draft))
            }
            EntityStatus::Content(ContentStatus::Draft) => {
                Some(EntityStatus::Content(ContentStatus::Published))
            }
            EntityStatus::Place(PlaceStatus::Active) => Some(EntityStatus::Place(PlaceStatus::Inactive)),
            EntityStatus::Place(PlaceStatus::Inactive) => Some(EntityStatus::Place(PlaceStatus::Active)),
            EntityStatus::Content(ContentStatus::Archived)
            | EntityStatus::Place(PlaceStatus::Archived) => None,
        }
    }
}

impl fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical bucket for a raw status column value.
pub fn canonical_bucket(raw: Option<&str>, family: StatusFamily) -> CanonicalStatus {
    EntityStatus::from_raw(family, raw).canonical()
}
