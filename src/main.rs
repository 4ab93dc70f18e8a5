//! Tourism CMS content service
//!
//! ## Endpoints
//!
//! - `GET /api/items/:kind` - List items of one type (status/search/sort/page)
//! - `GET|DELETE /api/items/:kind/:id` - Read or delete one item
//! - `POST /api/items/:kind/:id/toggle` - Flip visible/hidden
//! - `POST /api/items/:kind/:id/archive` - Archive one item
//! - `GET /api/counts/:kind` - Item count per status bucket
//! - `POST /api/bulk/:kind` - Bulk status change or delete
//! - `/api/accommodations[/:id|/slug/:slug]` - Accommodation CRUD
//! - `POST /api/uploads?name=` - Image upload
//! - `/api/pages/:page[/:section]` - Editable page sections
//! - `GET /healthz` - Health check

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tourism_cms::config::{AppState, Config};
use tourism_cms::handlers::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tourism_cms=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env();
    let bind_addr = config.bind_addr();

    info!("Starting tourism CMS content service");
    info!("Supabase URL: {}", config.supabase_url);
    info!("Storage bucket: {}", config.storage_bucket);
    if config.admin_token.is_none() {
        info!("CMS_ADMIN_TOKEN not set, admin API is open");
    }

    let state = AppState::new(config).context("Failed to build application state")?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {bind_addr}"))?;

    info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
