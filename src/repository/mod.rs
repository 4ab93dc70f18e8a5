//! Entity repositories
//!
//! One service per table. List reads log failures and return an empty list;
//! single-row reads return `Ok(None)` only for the no-rows sentinel and
//! propagate every other error.

pub mod accommodation;
pub mod place;

pub use accommodation::{validate_accommodation, AccommodationService};
pub use place::{validate_place, PlaceService};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::backend::{DataBackend, Row};
use crate::error::{CmsError, CmsResult};

pub(crate) fn from_row<T: DeserializeOwned>(row: Row) -> CmsResult<T> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

/// Decode a list row by row. A row that does not decode is logged and
/// skipped so the rest of the list still shows.
pub(crate) fn from_rows<T: DeserializeOwned>(rows: Vec<Row>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or("<no id>")
                .to_string();
            match from_row(row) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!(id = %id, error = %e, "Skipping row that does not decode");
                    None
                }
            }
        })
        .collect()
}

pub(crate) fn to_row<T: Serialize>(value: &T) -> CmsResult<Row> {
    match serde_json::to_value(value)? {
        Value::Object(row) => Ok(row),
        other => Err(CmsError::InvalidInput(format!(
            "expected an object, got {other}"
        ))),
    }
}

/// Single-row fetch where zero rows means `None`.
pub(crate) async fn fetch_optional(
    backend: &dyn DataBackend,
    table: &str,
    column: &str,
    value: &str,
) -> CmsResult<Option<Row>> {
    match backend.select_single(table, column, value).await {
        Ok(row) => Ok(Some(row)),
        Err(err) if err.is_no_rows() => Ok(None),
        Err(err) => Err(err),
    }
}

pub(crate) fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|s| s.trim().is_empty())
}
