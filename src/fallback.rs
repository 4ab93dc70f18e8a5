//! Optimistic fallback for permission-filtered writes
//!
//! A row-level security policy can make a well-formed update match zero rows
//! without raising an error. The backend reports that exactly like a missing
//! row (the no-rows sentinel), so this layer cannot tell the two apart. When
//! it happens the current row is re-read; if it exists, the requested patch
//! is merged over it client-side and returned as `OptimisticOnly` so the
//! admin screen can carry on, while a warning records that nothing was stored.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::backend::{DataBackend, Row};
use crate::error::{CmsError, CmsResult};

/// Result of a write that may not have been persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome<T> {
    /// The backend stored the change and returned the row.
    Persisted(T),
    /// The backend matched no row; `value` is a client-side merge only.
    OptimisticOnly { value: T, reason: String },
}

impl<T> WriteOutcome<T> {
    pub fn value(&self) -> &T {
        match self {
            WriteOutcome::Persisted(value) => value,
            WriteOutcome::OptimisticOnly { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            WriteOutcome::Persisted(value) => value,
            WriteOutcome::OptimisticOnly { value, .. } => value,
        }
    }

    pub fn is_persisted(&self) -> bool {
        matches!(self, WriteOutcome::Persisted(_))
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            WriteOutcome::Persisted(_) => None,
            WriteOutcome::OptimisticOnly { reason, .. } => Some(reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> WriteOutcome<U> {
        match self {
            WriteOutcome::Persisted(value) => WriteOutcome::Persisted(f(value)),
            WriteOutcome::OptimisticOnly { value, reason } => WriteOutcome::OptimisticOnly {
                value: f(value),
                reason,
            },
        }
    }

    pub fn try_map<U>(self, f: impl FnOnce(T) -> CmsResult<U>) -> CmsResult<WriteOutcome<U>> {
        Ok(match self {
            WriteOutcome::Persisted(value) => WriteOutcome::Persisted(f(value)?),
            WriteOutcome::OptimisticOnly { value, reason } => WriteOutcome::OptimisticOnly {
                value: f(value)?,
                reason,
            },
        })
    }
}

/// Wire shape for write responses, so clients can tell both cases apart.
#[derive(Debug, Clone, Serialize)]
pub struct WriteResponse<T> {
    pub data: T,
    pub persisted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl<T> From<WriteOutcome<T>> for WriteResponse<T> {
    fn from(outcome: WriteOutcome<T>) -> Self {
        match outcome {
            WriteOutcome::Persisted(data) => Self {
                data,
                persisted: true,
                warning: None,
            },
            WriteOutcome::OptimisticOnly { value, reason } => Self {
                data: value,
                persisted: false,
                warning: Some(reason),
            },
        }
    }
}

/// Apply a partial update, falling back to a client-side merge when the
/// backend matches no row but the row can still be read.
pub async fn update_with_fallback(
    backend: &dyn DataBackend,
    table: &str,
    id: &str,
    patch: Row,
) -> CmsResult<WriteOutcome<Row>> {
    let err = match backend.update(table, id, patch.clone()).await {
        Ok(row) => return Ok(WriteOutcome::Persisted(row)),
        Err(err) if err.is_no_rows() => err,
        Err(err) => return Err(err),
    };

    warn!(
        table,
        id,
        "Update matched no rows ({}); a row-level security policy may have filtered it",
        err
    );

    let current = match backend.select_single(table, "id", id).await {
        Ok(row) => row,
        Err(fetch_err) => {
            warn!(
                table,
                id,
                error = %fetch_err,
                "Re-fetch after empty update failed; reporting the row as not found"
            );
            return Err(CmsError::not_found(table, id));
        }
    };

    let mut merged = current;
    for (key, value) in patch {
        merged.insert(key, value);
    }
    merged.insert("id".to_string(), Value::String(id.to_string()));
    merged.insert(
        "updated_at".to_string(),
        Value::String(Utc::now().to_rfc3339()),
    );

    warn!(
        table,
        id,
        "UPDATE NOT PERSISTED: returning a client-side merge; stored row is unchanged"
    );

    Ok(WriteOutcome::OptimisticOnly {
        value: merged,
        reason: format!("update of {table} {id} was not persisted (no rows matched)"),
    })
}
