//! In-process backend
//!
//! Behaves like the REST backend as far as the content service can observe:
//! server-assigned ids and timestamps, the no-rows sentinel on single-row
//! operations, and writes silently filtered by a permission policy
//! (`deny_writes`). Used by the test suite and by local runs without a
//! Supabase project.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{cell_text, DataBackend, Filter, Query, Row};
use crate::error::{CmsError, CmsResult};

#[derive(Default)]
struct Tables {
    rows: HashMap<String, Vec<Row>>,
    denied_writes: HashSet<(String, String)>,
    failing: HashMap<String, String>,
    objects: HashMap<String, (Vec<u8>, String)>,
}

impl Tables {
    fn check_failing(&self, table: &str) -> CmsResult<()> {
        match self.failing.get(table) {
            Some(message) => Err(CmsError::Backend {
                code: "XX000".to_string(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn is_denied(&self, table: &str, id: &str) -> bool {
        self.denied_writes
            .contains(&(table.to_string(), id.to_string()))
    }
}

/// Tables held in memory behind an async lock.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<RwLock<Tables>>,
}

fn no_rows(table: &str, id: &str) -> CmsError {
    CmsError::NoRows(format!(
        "JSON object requested, multiple (or no) rows returned ({table} id={id})"
    ))
}

fn row_id(row: &Row) -> Option<String> {
    row.get("id").and_then(cell_text)
}

fn matches(row: &Row, filter: &Filter) -> bool {
    let cell = |column: &str| row.get(column).and_then(cell_text);
    match filter {
        Filter::Eq(column, value) => cell(column).as_deref() == Some(value.as_str()),
        Filter::Neq(column, value) => cell(column).is_some_and(|c| c != *value),
        Filter::In(column, values) => cell(column).is_some_and(|c| values.contains(&c)),
        Filter::Search(column, term) => cell(column)
            .is_some_and(|c| c.to_lowercase().contains(&term.to_lowercase())),
    }
}

/// Compare two cells; numbers numerically, everything else as lowercase text.
fn compare_cells(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => {
            let x = cell_text(a).unwrap_or_default().to_lowercase();
            let y = cell_text(b).unwrap_or_default().to_lowercase();
            x.cmp(&y)
        }
    }
}

fn now_value() -> Value {
    Value::String(Utc::now().to_rfc3339())
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert rows exactly as given (no id or timestamp assignment).
    pub async fn seed(&self, table: &str, rows: Vec<Value>) {
        let mut tables = self.inner.write().await;
        let entries = tables.rows.entry(table.to_string()).or_default();
        entries.extend(rows.into_iter().filter_map(|v| match v {
            Value::Object(row) => Some(row),
            _ => None,
        }));
    }

    /// Snapshot of a table.
    pub async fn rows(&self, table: &str) -> Vec<Row> {
        let tables = self.inner.read().await;
        tables.rows.get(table).cloned().unwrap_or_default()
    }

    /// Stored row by id, bypassing every simulated policy.
    pub async fn row(&self, table: &str, id: &str) -> Option<Row> {
        let tables = self.inner.read().await;
        tables
            .rows
            .get(table)?
            .iter()
            .find(|row| row_id(row).as_deref() == Some(id))
            .cloned()
    }

    /// Make updates and deletes of one row match nothing, the way a
    /// row-level security policy filters a write without raising an error.
    pub async fn deny_writes(&self, table: &str, id: &str) {
        let mut tables = self.inner.write().await;
        tables
            .denied_writes
            .insert((table.to_string(), id.to_string()));
    }

    /// Make every operation on a table fail with a backend error.
    pub async fn fail_table(&self, table: &str, message: &str) {
        let mut tables = self.inner.write().await;
        tables.failing.insert(table.to_string(), message.to_string());
    }

    /// Uploaded object bytes, if any.
    pub async fn object(&self, bucket: &str, path: &str) -> Option<Vec<u8>> {
        let tables = self.inner.read().await;
        tables
            .objects
            .get(&format!("{bucket}/{path}"))
            .map(|(bytes, _)| bytes.clone())
    }
}

#[async_trait]
impl DataBackend for MemoryBackend {
    async fn select(&self, table: &str, query: &Query) -> CmsResult<Vec<Row>> {
        let tables = self.inner.read().await;
        tables.check_failing(table)?;

        let mut rows: Vec<Row> = tables
            .rows
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| query.filters.iter().all(|f| matches(row, f)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                match (a.get(&order.column), b.get(&order.column)) {
                    (Some(x), Some(y)) if !x.is_null() && !y.is_null() => {
                        let ord = compare_cells(x, y);
                        if order.ascending { ord } else { ord.reverse() }
                    }
                    // nulls last in either direction
                    (Some(x), _) if !x.is_null() => Ordering::Less,
                    (_, Some(y)) if !y.is_null() => Ordering::Greater,
                    _ => Ordering::Equal,
                }
            });
        }

        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn select_single(&self, table: &str, column: &str, value: &str) -> CmsResult<Row> {
        let query = Query::new().eq(column, value);
        let mut rows = self.select(table, &query).await?;
        if rows.len() != 1 {
            return Err(no_rows(table, value));
        }
        Ok(rows.remove(0))
    }

    async fn insert(&self, table: &str, mut row: Row) -> CmsResult<Row> {
        let mut tables = self.inner.write().await;
        tables.check_failing(table)?;

        if row.get("id").is_none_or(Value::is_null) {
            row.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        let now = now_value();
        row.entry("created_at").or_insert_with(|| now.clone());
        row.entry("updated_at").or_insert(now);

        tables
            .rows
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: &str, id: &str, patch: Row) -> CmsResult<Row> {
        let mut tables = self.inner.write().await;
        tables.check_failing(table)?;
        if tables.is_denied(table, id) {
            return Err(no_rows(table, id));
        }

        let row = tables
            .rows
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|row| row_id(row).as_deref() == Some(id)))
            .ok_or_else(|| no_rows(table, id))?;

        let touched = patch.contains_key("updated_at");
        for (key, value) in patch {
            row.insert(key, value);
        }
        if !touched {
            row.insert("updated_at".to_string(), now_value());
        }
        Ok(row.clone())
    }

    async fn delete(&self, table: &str, id: &str) -> CmsResult<()> {
        let mut tables = self.inner.write().await;
        tables.check_failing(table)?;
        if tables.is_denied(table, id) {
            return Err(no_rows(table, id));
        }

        let rows = tables.rows.entry(table.to_string()).or_default();
        let before = rows.len();
        rows.retain(|row| row_id(row).as_deref() != Some(id));
        if rows.len() == before {
            return Err(no_rows(table, id));
        }
        Ok(())
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> CmsResult<String> {
        let mut tables = self.inner.write().await;
        tables
            .objects
            .insert(format!("{bucket}/{path}"), (bytes, content_type.to_string()));
        Ok(format!("memory://{bucket}/{path}"))
    }
}
