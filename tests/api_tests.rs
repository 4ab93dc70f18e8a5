//! Tests for the HTTP surface
//!
//! Router built over the in-memory backend and driven with `oneshot`.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use tourism_cms::backend::MemoryBackend;
use tourism_cms::config::{AppState, Config};
use tourism_cms::handlers::build_router;
use tourism_cms::page_content::MemoryPageStore;
use tourism_cms::types::*;

fn app_with(config: Config) -> (MemoryBackend, Router) {
    let backend = MemoryBackend::new();
    let state = AppState::with_backend(
        config,
        Arc::new(backend.clone()),
        Arc::new(MemoryPageStore::new()),
    );
    (backend, build_router(state))
}

fn app() -> (MemoryBackend, Router) {
    app_with(Config::default())
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn with_json(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn seed_museums(backend: &MemoryBackend) {
    backend
        .seed(
            PLACES_TABLE,
            vec![
                json!({ "id": "m1", "name": "Musée du Vin", "type": "museum", "status": "active" }),
                json!({ "id": "m2", "name": "Abbaye", "type": "museum", "status": "inactive" }),
                json!({ "id": "m3", "name": "Château", "type": "museum", "status": "archived" }),
            ],
        )
        .await;
}

// ═══════════════════════════════════════════════════════════════════════════
// Health and auth
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_healthz() {
    let (_backend, app) = app();
    let (status, body) = send(&app, get("/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_admin_token_guards_api() {
    let config = Config {
        admin_token: Some("secret".to_string()),
        ..Default::default()
    };
    let (_backend, app) = app_with(config);

    let (status, body) = send(&app, get("/api/items/museums")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let request = Request::builder()
        .uri("/api/items/museums")
        .header(header::AUTHORIZATION, "Bearer secret")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, get("/healthz")).await;
    assert_eq!(status, StatusCode::OK);
}

// ═══════════════════════════════════════════════════════════════════════════
// Item manager
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_list_items_with_filters() {
    let (backend, app) = app();
    seed_museums(&backend).await;

    let (status, body) = send(&app, get("/api/items/museums?status=active")).await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], "m1");
    assert_eq!(items[0]["kind"], "museums");

    let (_, body) = send(&app, get("/api/items/museums?sort=name&order=desc&limit=2")).await;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Musée du Vin", "Château"]);
}

#[tokio::test]
async fn test_list_rejects_unknown_kind_and_status() {
    let (_backend, app) = app();

    let (status, _) = send(&app, get("/api/items/hotels")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get("/api/items/museums?status=deleted")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get("/api/items/articles")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_counts() {
    let (backend, app) = app();
    seed_museums(&backend).await;

    let (status, body) = send(&app, get("/api/counts/museums")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "active": 1, "inactive": 1, "archived": 1, "total": 3 }));
}

#[tokio::test]
async fn test_toggle_and_archive() {
    let (backend, app) = app();
    seed_museums(&backend).await;

    let (status, body) = send(&app, empty(Method::POST, "/api/items/museums/m1/toggle")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["persisted"], true);
    assert_eq!(body["data"]["status"], "inactive");
    assert!(body.get("warning").is_none());

    let (status, _) = send(&app, empty(Method::POST, "/api/items/museums/m3/toggle")).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, empty(Method::POST, "/api/items/museums/m2/archive")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["native_status"], "archived");
}

#[tokio::test]
async fn test_get_and_delete_item() {
    let (backend, app) = app();
    seed_museums(&backend).await;

    let (status, body) = send(&app, get("/api/items/museums/m1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slug"], "");

    let (status, _) = send(&app, empty(Method::DELETE, "/api/items/museums/m1")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, get("/api/items/museums/m1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_item_ids_never_clash_with_collection_routes() {
    let (backend, app) = app();
    backend
        .seed(
            PLACES_TABLE,
            vec![
                json!({ "id": "bulk", "name": "Halle aux Grains", "type": "museum" }),
                json!({ "id": "counts", "name": "Tour des Comptes", "type": "museum" }),
            ],
        )
        .await;

    let (status, body) = send(&app, get("/api/items/museums/bulk")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Halle aux Grains");

    let (status, body) = send(&app, get("/api/items/museums/counts")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Tour des Comptes");

    let (status, body) = send(&app, get("/api/counts/museums")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
}

#[tokio::test]
async fn test_item_actions_under_wrong_kind_are_not_found() {
    let (backend, app) = app();
    seed_museums(&backend).await;

    let (status, _) = send(&app, empty(Method::POST, "/api/items/walks/m1/archive")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, empty(Method::DELETE, "/api/items/events/m1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(backend.row(PLACES_TABLE, "m1").await.unwrap()["status"], "active");
}

#[tokio::test]
async fn test_bulk_endpoint_reports_partial_failure() {
    let (backend, app) = app();
    seed_museums(&backend).await;

    let request = with_json(
        Method::POST,
        "/api/bulk/museums",
        json!({ "ids": ["m1", "m2", "ghost"], "action": "set_status", "status": "archived" }),
    );
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], 2);
    assert_eq!(body["failed"], 1);
    assert!(body["errors"][0].as_str().unwrap().contains("ghost"));
}

#[tokio::test]
async fn test_bulk_endpoint_validates_action() {
    let (_backend, app) = app();

    let request = with_json(
        Method::POST,
        "/api/bulk/museums",
        json!({ "ids": ["m1"], "action": "publish" }),
    );
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = with_json(
        Method::POST,
        "/api/bulk/museums",
        json!({ "ids": ["m1"], "action": "set_status" }),
    );
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ═══════════════════════════════════════════════════════════════════════════
// Accommodations
// ═══════════════════════════════════════════════════════════════════════════

fn accommodation_body() -> Value {
    json!({
        "name": "La Maison d'à Côté",
        "description": "Chambres d'hôtes",
        "type": "chambre_hote",
        "capacity": 2,
        "address": "3 place du Marché",
    })
}

#[tokio::test]
async fn test_create_and_fetch_accommodation() {
    let (_backend, app) = app();

    let (status, created) = send(
        &app,
        with_json(Method::POST, "/api/accommodations", accommodation_body()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["slug"], "la-maison-da-cote");
    assert_eq!(created["status"], "draft");

    let (status, by_slug) = send(&app, get("/api/accommodations/slug/la-maison-da-cote")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_slug["id"], created["id"]);

    let (_, list) = send(&app, get("/api/accommodations")).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (_, published) = send(&app, get("/api/accommodations?published=true")).await;
    assert!(published.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_accommodation_validation_details() {
    let (_backend, app) = app();

    let (status, body) = send(&app, with_json(Method::POST, "/api/accommodations", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
    assert!(body["details"].as_array().unwrap().len() >= 4);
}

#[tokio::test]
async fn test_patch_filtered_write_is_flagged() {
    let (backend, app) = app();
    let (_, created) = send(
        &app,
        with_json(Method::POST, "/api/accommodations", accommodation_body()),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();
    backend.deny_writes(ACCOMMODATIONS_TABLE, &id).await;

    let (status, body) = send(
        &app,
        with_json(
            Method::PATCH,
            &format!("/api/accommodations/{id}"),
            json!({ "status": "published" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["persisted"], false);
    assert_eq!(body["data"]["status"], "published");
    assert!(body["warning"].is_string());
}

#[tokio::test]
async fn test_delete_accommodation() {
    let (_backend, app) = app();
    let (_, created) = send(
        &app,
        with_json(Method::POST, "/api/accommodations", accommodation_body()),
    )
    .await;
    let uri = format!("/api/accommodations/{}", created["id"].as_str().unwrap());

    let (status, _) = send(&app, empty(Method::DELETE, &uri)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, empty(Method::DELETE, &uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ═══════════════════════════════════════════════════════════════════════════
// Uploads and pages
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_upload_returns_url() {
    let (_backend, app) = app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/uploads?name=Vue%20du%20Lac.jpg")
        .header(header::CONTENT_TYPE, "image/jpeg")
        .body(Body::from(vec![0xFF, 0xD8, 0xFF]))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::CREATED);
    let url = body["url"].as_str().unwrap();
    assert!(url.starts_with("memory://images/"));
    assert!(url.ends_with("-vue-du-lac.jpg"));
}

#[tokio::test]
async fn test_page_sections_roundtrip() {
    let (_backend, app) = app();

    let (status, _) = send(
        &app,
        with_json(Method::PUT, "/api/pages/home/hero", json!({ "title": "Bienvenue" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, get("/api/pages/home/hero")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Bienvenue");

    let (_, page) = send(&app, get("/api/pages/home")).await;
    assert_eq!(page, json!({ "hero": { "title": "Bienvenue" } }));

    let (status, _) = send(&app, empty(Method::DELETE, "/api/pages/home/hero")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, get("/api/pages/home/hero")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
