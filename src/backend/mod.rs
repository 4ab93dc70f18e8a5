//! Data-access layer
//!
//! The content service never talks to Postgres directly. It goes through a
//! generated REST interface (PostgREST, as hosted by Supabase) and a storage
//! bucket. `DataBackend` is the seam:
//! - `RestBackend` binds to the hosted REST + storage endpoints
//! - `MemoryBackend` keeps tables in process for tests and local runs

pub mod memory;
pub mod rest;

pub use memory::MemoryBackend;
pub use rest::RestBackend;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::CmsResult;

/// A table row as returned by the backend.
pub type Row = Map<String, Value>;

// ═══════════════════════════════════════════════════════════════════════════
// Query description
// ═══════════════════════════════════════════════════════════════════════════

/// Filter predicate on one column.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, String),
    Neq(String, String),
    In(String, Vec<String>),
    /// Case-insensitive substring match.
    Search(String, String),
}

/// Sort order on one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// Filtered, ordered, paginated select.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl Into<String>) -> Self {
        self.filters.push(Filter::Eq(column.to_string(), value.into()));
        self
    }

    pub fn neq(mut self, column: &str, value: impl Into<String>) -> Self {
        self.filters.push(Filter::Neq(column.to_string(), value.into()));
        self
    }

    pub fn one_of(mut self, column: &str, values: Vec<String>) -> Self {
        self.filters.push(Filter::In(column.to_string(), values));
        self
    }

    pub fn search(mut self, column: &str, term: impl Into<String>) -> Self {
        self.filters.push(Filter::Search(column.to_string(), term.into()));
        self
    }

    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    pub fn range(mut self, offset: usize, limit: usize) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }
}

/// Render a JSON cell the way PostgREST filters compare it (as text).
pub(crate) fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Backend trait
// ═══════════════════════════════════════════════════════════════════════════

/// Operations the content service needs from its backend.
///
/// Single-row operations (`select_single`, `update`, `delete`) report zero
/// matched rows as `CmsError::NoRows`. For writes this is also what a
/// row-level security policy produces when it silently filters the row.
#[async_trait]
pub trait DataBackend: Send + Sync {
    /// Filtered, ordered, paginated select.
    async fn select(&self, table: &str, query: &Query) -> CmsResult<Vec<Row>>;

    /// Exactly one row where `column = value`.
    async fn select_single(&self, table: &str, column: &str, value: &str) -> CmsResult<Row>;

    /// Insert one row, returning it with server-assigned fields.
    async fn insert(&self, table: &str, row: Row) -> CmsResult<Row>;

    /// Apply a partial patch to the row with the given id.
    async fn update(&self, table: &str, id: &str, patch: Row) -> CmsResult<Row>;

    /// Hard delete by id.
    async fn delete(&self, table: &str, id: &str) -> CmsResult<()>;

    /// Store an object in a bucket and return its public URL.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> CmsResult<String>;
}
