//! Error types for the content service.
//!
//! Single-item operations return these to the caller. List-level reads log
//! and degrade to an empty list instead, and bulk actions fold them into a
//! `BulkActionResult`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// PostgREST code for "JSON object requested, multiple (or no) rows returned".
///
/// This is the only wire-level code the service interprets. It covers both
/// a missing row and a row filtered out by a row-level security policy.
pub const NO_ROWS_CODE: &str = "PGRST116";

/// Content service errors.
#[derive(Error, Debug)]
pub enum CmsError {
    /// Client-side validation failed; nothing was sent to the backend.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Entity not found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Single-row query returned zero rows.
    #[error("No rows returned: {0}")]
    NoRows(String),

    /// Any other error reported by the backend.
    #[error("Backend error [{code}]: {message}")]
    Backend { code: String, message: String },

    /// Item type has no route to a table.
    #[error("Unsupported item type: {0}")]
    UnsupportedType(String),

    /// Status change not allowed from the current state.
    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    /// Malformed request input (unknown kind, bad status word, ...).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Missing or wrong admin token.
    #[error("Unauthorized")]
    Unauthorized,

    /// Transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local I/O error (file page store).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CmsError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Check if this is the zero-rows sentinel.
    pub fn is_no_rows(&self) -> bool {
        matches!(self, Self::NoRows(_))
    }

    /// Check if this is a not found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::UnsupportedType(_) | Self::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound { .. } | Self::NoRows(_) => StatusCode::NOT_FOUND,
            Self::InvalidTransition(_) => StatusCode::CONFLICT,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Backend { .. } | Self::Http(_) => StatusCode::BAD_GATEWAY,
            Self::Serialization(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CmsError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            Self::Validation(errors) => json!({
                "error": "Validation failed",
                "details": errors,
            }),
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for content service operations.
pub type CmsResult<T> = Result<T, CmsError>;
