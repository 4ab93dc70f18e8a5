//! HTTP request handlers for the admin API
//!
//! - `/api/items/:kind/...` (generic item manager, every item type)
//! - `/api/accommodations/...` (full accommodation CRUD)
//! - `/api/uploads` (image upload)
//! - `/api/pages/...` (editable page sections)
//! - `/healthz`

use axum::{
    body::Bytes,
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::bulk::BulkAction;
use crate::config::AppState;
use crate::error::{CmsError, CmsResult};
use crate::fallback::WriteResponse;
use crate::manager::{ItemFilter, ManagedItem, SortKey, StatusCounts};
use crate::status::CanonicalStatus;
use crate::types::{Accommodation, AccommodationInput, BulkActionResult, EntityKind};

/// Assemble the full router with CORS, request tracing and the admin guard.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        // Generic item manager
        .route("/api/items/:kind", get(list_items_handler))
        .route("/api/counts/:kind", get(item_counts_handler))
        .route("/api/bulk/:kind", post(bulk_handler))
        .route(
            "/api/items/:kind/:id",
            get(get_item_handler).delete(delete_item_handler),
        )
        .route("/api/items/:kind/:id/toggle", post(toggle_item_handler))
        .route("/api/items/:kind/:id/archive", post(archive_item_handler))
        // Accommodations
        .route(
            "/api/accommodations",
            get(list_accommodations_handler).post(create_accommodation_handler),
        )
        .route(
            "/api/accommodations/slug/:slug",
            get(accommodation_by_slug_handler),
        )
        .route(
            "/api/accommodations/:id",
            get(get_accommodation_handler)
                .patch(update_accommodation_handler)
                .delete(delete_accommodation_handler),
        )
        // Uploads
        .route("/api/uploads", post(upload_handler))
        // Page content
        .route("/api/pages/:page", get(page_handler))
        .route(
            "/api/pages/:page/:section",
            get(get_section_handler)
                .put(put_section_handler)
                .delete(delete_section_handler),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/healthz", get(health_handler))
        .merge(api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)),
        )
        .with_state(state)
}

// ═══════════════════════════════════════════════════════════════════════════
// Admin guard
// ═══════════════════════════════════════════════════════════════════════════

/// Single-flag permission model: holding the admin token grants everything.
async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, CmsError> {
    if let Some(expected) = state.config.admin_token.as_deref() {
        let provided = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        if provided != Some(expected) {
            warn!(path = %request.uri().path(), "Rejected request without valid admin token");
            return Err(CmsError::Unauthorized);
        }
    }
    Ok(next.run(request).await)
}

fn parse_kind(raw: &str) -> CmsResult<EntityKind> {
    raw.parse()
}

// ═══════════════════════════════════════════════════════════════════════════
// Item manager
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
    pub search: Option<String>,
    pub sort: Option<SortKey>,
    /// `asc` or `desc`
    pub order: Option<String>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl ListParams {
    fn into_filter(self) -> CmsResult<ItemFilter> {
        let status = self
            .status
            .as_deref()
            .filter(|s| !s.is_empty() && *s != "all")
            .map(str::parse::<CanonicalStatus>)
            .transpose()?;

        let descending = match self.order.as_deref() {
            None | Some("asc") => false,
            Some("desc") => true,
            Some(other) => {
                return Err(CmsError::InvalidInput(format!("unknown sort order '{other}'")));
            }
        };

        Ok(ItemFilter {
            status,
            search: self.search,
            sort: self.sort.unwrap_or_default(),
            descending,
            offset: self.offset.unwrap_or(0),
            limit: self.limit,
        })
    }
}

/// GET /api/items/:kind
pub async fn list_items_handler(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(params): Query<ListParams>,
) -> CmsResult<Json<Vec<ManagedItem>>> {
    let kind = parse_kind(&kind)?;
    let filter = params.into_filter()?;
    Ok(Json(state.manager.list(kind, &filter).await?))
}

/// GET /api/counts/:kind
pub async fn item_counts_handler(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> CmsResult<Json<StatusCounts>> {
    let kind = parse_kind(&kind)?;
    Ok(Json(state.manager.counts(kind).await?))
}

/// GET /api/items/:kind/:id
pub async fn get_item_handler(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> CmsResult<Json<ManagedItem>> {
    let kind = parse_kind(&kind)?;
    state
        .manager
        .get(kind, &id)
        .await?
        .map(Json)
        .ok_or_else(|| CmsError::not_found(kind.to_string(), id))
}

/// DELETE /api/items/:kind/:id
pub async fn delete_item_handler(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> CmsResult<StatusCode> {
    let kind = parse_kind(&kind)?;
    state.manager.delete(kind, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/items/:kind/:id/toggle
pub async fn toggle_item_handler(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> CmsResult<Json<WriteResponse<ManagedItem>>> {
    let kind = parse_kind(&kind)?;
    let outcome = state.manager.toggle_status(kind, &id).await?;
    Ok(Json(outcome.into()))
}

/// POST /api/items/:kind/:id/archive
pub async fn archive_item_handler(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> CmsResult<Json<WriteResponse<ManagedItem>>> {
    let kind = parse_kind(&kind)?;
    let outcome = state.manager.archive(kind, &id).await?;
    Ok(Json(outcome.into()))
}

#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    pub ids: Vec<String>,
    pub action: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl BulkRequest {
    fn action(&self) -> CmsResult<BulkAction> {
        match self.action.as_str() {
            "set_status" => {
                let status = self.status.as_deref().ok_or_else(|| {
                    CmsError::InvalidInput("set_status requires a status".to_string())
                })?;
                Ok(BulkAction::SetStatus(status.parse()?))
            }
            "archive" => Ok(BulkAction::SetStatus(CanonicalStatus::Archived)),
            "delete" => Ok(BulkAction::Delete),
            other => Err(CmsError::InvalidInput(format!("unknown bulk action '{other}'"))),
        }
    }
}

/// POST /api/bulk/:kind
///
/// Per-item failures are part of the 200 response body.
pub async fn bulk_handler(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(body): Json<BulkRequest>,
) -> CmsResult<Json<BulkActionResult>> {
    let kind = parse_kind(&kind)?;
    let action = body.action()?;
    Ok(Json(state.manager.bulk(kind, &body.ids, action).await))
}

// ═══════════════════════════════════════════════════════════════════════════
// Accommodations
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default, Deserialize)]
pub struct AccommodationListParams {
    #[serde(default)]
    pub published: bool,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

/// GET /api/accommodations
pub async fn list_accommodations_handler(
    State(state): State<AppState>,
    Query(params): Query<AccommodationListParams>,
) -> Json<Vec<Accommodation>> {
    let service = &state.accommodations;
    let list = if params.published {
        service.get_published().await
    } else if let Some(limit) = params.limit {
        service.list_page(params.offset.unwrap_or(0), limit).await
    } else {
        service.get_all().await
    };
    Json(list)
}

/// POST /api/accommodations
pub async fn create_accommodation_handler(
    State(state): State<AppState>,
    Json(input): Json<AccommodationInput>,
) -> CmsResult<(StatusCode, Json<Accommodation>)> {
    let created = state.accommodations.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/accommodations/:id
pub async fn get_accommodation_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> CmsResult<Json<Accommodation>> {
    state
        .accommodations
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| CmsError::not_found("accommodation", id))
}

/// GET /api/accommodations/slug/:slug
pub async fn accommodation_by_slug_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> CmsResult<Json<Accommodation>> {
    state
        .accommodations
        .get_by_slug(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| CmsError::not_found("accommodation", slug))
}

/// PATCH /api/accommodations/:id
pub async fn update_accommodation_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<AccommodationInput>,
) -> CmsResult<Json<WriteResponse<Accommodation>>> {
    let outcome = state.accommodations.update(&id, patch).await?;
    Ok(Json(outcome.into()))
}

/// DELETE /api/accommodations/:id
pub async fn delete_accommodation_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> CmsResult<StatusCode> {
    state.accommodations.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ═══════════════════════════════════════════════════════════════════════════
// Uploads
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub name: String,
}

/// POST /api/uploads?name=<file name>
///
/// Raw image bytes in the body; `Content-Type` is passed through.
pub async fn upload_handler(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> CmsResult<(StatusCode, Json<Value>)> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream");

    let url = state
        .storage
        .upload_image(&params.name, body.to_vec(), content_type)
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "url": url }))))
}

// ═══════════════════════════════════════════════════════════════════════════
// Page content
// ═══════════════════════════════════════════════════════════════════════════

/// GET /api/pages/:page
pub async fn page_handler(
    State(state): State<AppState>,
    Path(page): Path<String>,
) -> CmsResult<Json<Map<String, Value>>> {
    Ok(Json(state.pages.page_sections(&page).await?))
}

/// GET /api/pages/:page/:section
pub async fn get_section_handler(
    State(state): State<AppState>,
    Path((page, section)): Path<(String, String)>,
) -> CmsResult<Json<Value>> {
    state
        .pages
        .get_section(&page, &section)
        .await?
        .map(Json)
        .ok_or_else(|| CmsError::not_found("page section", format!("{page}:{section}")))
}

/// PUT /api/pages/:page/:section
pub async fn put_section_handler(
    State(state): State<AppState>,
    Path((page, section)): Path<(String, String)>,
    Json(content): Json<Value>,
) -> CmsResult<Json<Value>> {
    state.pages.set_section(&page, &section, content.clone()).await?;
    Ok(Json(json!({
        "page": page,
        "section": section,
        "data": content,
    })))
}

/// DELETE /api/pages/:page/:section
pub async fn delete_section_handler(
    State(state): State<AppState>,
    Path((page, section)): Path<(String, String)>,
) -> CmsResult<StatusCode> {
    if state.pages.remove_section(&page, &section).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(CmsError::not_found("page section", format!("{page}:{section}")))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Health Check
// ═══════════════════════════════════════════════════════════════════════════

/// GET /healthz
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
