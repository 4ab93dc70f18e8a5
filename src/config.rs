//! Configuration module - Environment-based configuration
//!
//! Matches the variables the admin front end is deployed with
//! (`SUPABASE_URL`, `SUPABASE_ANON_KEY`) plus the service's own `CMS_*` settings.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::audit::AuditLog;
use crate::backend::{DataBackend, MemoryBackend, RestBackend};
use crate::bulk::BulkActionsService;
use crate::error::CmsResult;
use crate::manager::ItemManager;
use crate::page_content::{FilePageStore, MemoryPageStore, PageContentRepository, PageContentStore};
use crate::repository::{AccommodationService, PlaceService};
use crate::storage::ImageStorage;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server config
    pub host: String,
    pub port: u16,

    // Supabase project
    pub supabase_url: String,
    pub supabase_anon_key: String,
    /// Bypasses row-level security when set; preferred for writes.
    pub supabase_service_key: Option<String>,
    pub storage_bucket: String,

    // Local state
    pub page_content_path: Option<PathBuf>,

    // Auth
    pub admin_token: Option<String>,

    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_service_key: None,
            storage_bucket: "images".to_string(),
            page_content_path: None,
            admin_token: None,
            http_timeout: Duration::from_secs(30),
        }
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: non_empty("CMS_HOST").unwrap_or(defaults.host),
            port: env::var("CMS_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            supabase_url: non_empty("SUPABASE_URL").unwrap_or_default(),
            supabase_anon_key: non_empty("SUPABASE_ANON_KEY").unwrap_or_default(),
            supabase_service_key: non_empty("SUPABASE_SERVICE_KEY"),
            storage_bucket: non_empty("CMS_STORAGE_BUCKET").unwrap_or(defaults.storage_bucket),
            page_content_path: non_empty("CMS_PAGE_CONTENT_PATH").map(PathBuf::from),
            admin_token: non_empty("CMS_ADMIN_TOKEN"),
            http_timeout: env::var("CMS_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
        }
    }

    /// Get server bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Key sent to the REST API: the service key when configured.
    pub fn api_key(&self) -> &str {
        self.supabase_service_key
            .as_deref()
            .unwrap_or(&self.supabase_anon_key)
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub accommodations: AccommodationService,
    pub places: PlaceService,
    pub manager: ItemManager,
    pub pages: PageContentRepository,
    pub storage: ImageStorage,
}

impl AppState {
    /// Wire the services to the configured Supabase project, or to an
    /// in-process backend when no project URL is set.
    pub fn new(config: Config) -> CmsResult<Self> {
        let backend: Arc<dyn DataBackend> = if config.supabase_url.is_empty() {
            warn!("SUPABASE_URL not set, using in-memory backend");
            Arc::new(MemoryBackend::new())
        } else {
            let http_client = reqwest::Client::builder()
                .timeout(config.http_timeout)
                .build()?;
            if config.supabase_service_key.is_none() {
                info!("No service key configured, writes are subject to row-level security");
            }
            Arc::new(RestBackend::new(
                config.supabase_url.clone(),
                config.api_key(),
                http_client,
            ))
        };

        let store: Arc<dyn PageContentStore> = match &config.page_content_path {
            Some(path) => Arc::new(FilePageStore::new(path.clone())),
            None => Arc::new(MemoryPageStore::new()),
        };

        Ok(Self::with_backend(config, backend, store))
    }

    /// Build the state around explicit backends.
    pub fn with_backend(
        config: Config,
        backend: Arc<dyn DataBackend>,
        store: Arc<dyn PageContentStore>,
    ) -> Self {
        let accommodations = AccommodationService::new(backend.clone());
        let places = PlaceService::new(backend.clone());
        let bulk = BulkActionsService::new(
            accommodations.clone(),
            places.clone(),
            AuditLog::new(backend.clone()),
        );
        let manager = ItemManager::new(accommodations.clone(), places.clone(), bulk);
        let storage = ImageStorage::new(backend, config.storage_bucket.clone());

        Self {
            config: Arc::new(config),
            accommodations,
            places,
            manager,
            pages: PageContentRepository::new(store),
            storage,
        }
    }
}
