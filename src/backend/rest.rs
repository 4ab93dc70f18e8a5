//! REST backend for the hosted Postgres REST interface and storage bucket
//!
//! Matches the requests the admin screens make through the Supabase client:
//! - `GET/POST/PATCH/DELETE {url}/rest/v1/{table}` with PostgREST filters
//! - `POST {url}/storage/v1/object/{bucket}/{path}` for image uploads

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{DataBackend, Filter, Query, Row};
use crate::error::{CmsError, CmsResult, NO_ROWS_CODE};

/// Media type asking PostgREST for a single JSON object instead of an array.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Error body returned by PostgREST (and, loosely, by the storage API).
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

/// Backend bound to a Supabase project (REST + storage).
#[derive(Clone)]
pub struct RestBackend {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl RestBackend {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Public URL of an object in a public bucket.
    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, bucket, path)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Turn a non-success response into a `CmsError`, keeping the no-rows
    /// sentinel distinct from every other failure.
    async fn ensure_success(response: Response) -> CmsResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
        let code = body.code.unwrap_or_else(|| status.as_u16().to_string());
        let mut message = body.message.unwrap_or(text);
        if let Some(details) = body.details.filter(|d| !d.is_empty()) {
            message = format!("{message} ({details})");
        }
        if let Some(hint) = body.hint.filter(|h| !h.is_empty()) {
            message = format!("{message} hint: {hint}");
        }

        if code == NO_ROWS_CODE {
            return Err(CmsError::NoRows(message));
        }

        warn!(status = %status, code = %code, "Backend request failed: {}", message);
        Err(CmsError::Backend { code, message })
    }
}

/// Quote a value for use inside a PostgREST `in.(...)` list.
fn quote_list_value(value: &str) -> String {
    if value.contains([',', '(', ')', '"', ' ']) {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

/// PostgREST query string parameters for a `Query`.
pub(crate) fn query_params(query: &Query) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];

    for filter in &query.filters {
        let (column, expr) = match filter {
            Filter::Eq(column, value) => (column, format!("eq.{value}")),
            Filter::Neq(column, value) => (column, format!("neq.{value}")),
            Filter::In(column, values) => {
                let list: Vec<String> = values.iter().map(|v| quote_list_value(v)).collect();
                (column, format!("in.({})", list.join(",")))
            }
            Filter::Search(column, term) => (column, format!("ilike.*{term}*")),
        };
        params.push((column.clone(), expr));
    }

    if let Some(order) = &query.order {
        let direction = if order.ascending { "asc" } else { "desc" };
        params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
    }
    if let Some(offset) = query.offset {
        params.push(("offset".to_string(), offset.to_string()));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }

    params
}

#[async_trait]
impl DataBackend for RestBackend {
    async fn select(&self, table: &str, query: &Query) -> CmsResult<Vec<Row>> {
        let params = query_params(query);
        debug!(table, ?params, "select");

        let response = self
            .authed(self.client.get(self.table_url(table)))
            .query(&params)
            .send()
            .await?;

        let rows = Self::ensure_success(response).await?.json().await?;
        Ok(rows)
    }

    async fn select_single(&self, table: &str, column: &str, value: &str) -> CmsResult<Row> {
        let response = self
            .authed(self.client.get(self.table_url(table)))
            .header("Accept", SINGLE_OBJECT)
            .query(&[("select", "*".to_string()), (column, format!("eq.{value}"))])
            .send()
            .await?;

        let row = Self::ensure_success(response).await?.json().await?;
        Ok(row)
    }

    async fn insert(&self, table: &str, row: Row) -> CmsResult<Row> {
        let response = self
            .authed(self.client.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .header("Accept", SINGLE_OBJECT)
            .json(&row)
            .send()
            .await?;

        let created = Self::ensure_success(response).await?.json().await?;
        Ok(created)
    }

    async fn update(&self, table: &str, id: &str, patch: Row) -> CmsResult<Row> {
        let response = self
            .authed(self.client.patch(self.table_url(table)))
            .header("Prefer", "return=representation")
            .header("Accept", SINGLE_OBJECT)
            .query(&[("id", format!("eq.{id}"))])
            .json(&patch)
            .send()
            .await?;

        let updated = Self::ensure_success(response).await?.json().await?;
        Ok(updated)
    }

    async fn delete(&self, table: &str, id: &str) -> CmsResult<()> {
        let response = self
            .authed(self.client.delete(self.table_url(table)))
            .header("Prefer", "return=representation")
            .query(&[("id", format!("eq.{id}"))])
            .send()
            .await?;

        let deleted: Vec<Row> = Self::ensure_success(response).await?.json().await?;
        if deleted.is_empty() {
            return Err(CmsError::NoRows(format!("no row with id {id} in {table}")));
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
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, path);
        let response = self
            .authed(self.client.post(&url))
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;

        Self::ensure_success(response).await?;
        Ok(self.public_url(bucket, path))
    }
}
