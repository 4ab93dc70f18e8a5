//! Editable page content
//!
//! Public pages (home, about, contact, ...) carry free-form JSON sections the
//! admin edits in place. Sections are addressed by `(page, section)` and kept
//! in an injected `PageContentStore`, so nothing reaches for ambient state.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{CmsError, CmsResult};

/// Key-value store behind the page content repository.
#[async_trait]
pub trait PageContentStore: Send + Sync {
    async fn get(&self, key: &str) -> CmsResult<Option<Value>>;
    async fn put(&self, key: &str, value: Value) -> CmsResult<()>;
    /// Returns whether the key existed.
    async fn remove(&self, key: &str) -> CmsResult<bool>;
    async fn entries(&self) -> CmsResult<Vec<(String, Value)>>;
}

// ═══════════════════════════════════════════════════════════════════════════
// In-memory store
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct MemoryPageStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PageContentStore for MemoryPageStore {
    async fn get(&self, key: &str) -> CmsResult<Option<Value>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> CmsResult<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> CmsResult<bool> {
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn entries(&self) -> CmsResult<Vec<(String, Value)>> {
        let entries = self.entries.read().await;
        Ok(entries.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// JSON file store
// ═══════════════════════════════════════════════════════════════════════════

/// Whole-file JSON object, rewritten on every change.
///
/// The lock serializes writers inside one process; concurrent processes
/// sharing the file are not supported.
#[derive(Debug)]
pub struct FilePageStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl FilePageStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    async fn load(&self) -> CmsResult<BTreeMap<String, Value>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(CmsError::Io(e)),
        }
    }

    async fn save(&self, entries: &BTreeMap<String, Value>) -> CmsResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(entries)?;
        tokio::fs::write(&self.path, bytes).await?;
        debug!(path = %self.path.display(), entries = entries.len(), "Page content saved");
        Ok(())
    }
}

#[async_trait]
impl PageContentStore for FilePageStore {
    async fn get(&self, key: &str) -> CmsResult<Option<Value>> {
        let _guard = self.lock.read().await;
        Ok(self.load().await?.remove(key))
    }

    async fn put(&self, key: &str, value: Value) -> CmsResult<()> {
        let _guard = self.lock.write().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value);
        self.save(&entries).await
    }

    async fn remove(&self, key: &str) -> CmsResult<bool> {
        let _guard = self.lock.write().await;
        let mut entries = self.load().await?;
        if entries.remove(key).is_none() {
            return Ok(false);
        }
        self.save(&entries).await?;
        Ok(true)
    }

    async fn entries(&self) -> CmsResult<Vec<(String, Value)>> {
        let _guard = self.lock.read().await;
        Ok(self.load().await?.into_iter().collect())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Repository
// ═══════════════════════════════════════════════════════════════════════════

fn section_key(page: &str, section: &str) -> CmsResult<String> {
    let valid = |s: &str| !s.is_empty() && !s.contains(':');
    if !valid(page) || !valid(section) {
        return Err(CmsError::InvalidInput(format!(
            "invalid page section '{page}:{section}'"
        )));
    }
    Ok(format!("{page}:{section}"))
}

#[derive(Clone)]
pub struct PageContentRepository {
    store: Arc<dyn PageContentStore>,
}

impl PageContentRepository {
    pub fn new(store: Arc<dyn PageContentStore>) -> Self {
        Self { store }
    }

    pub async fn get_section(&self, page: &str, section: &str) -> CmsResult<Option<Value>> {
        self.store.get(&section_key(page, section)?).await
    }

    pub async fn set_section(&self, page: &str, section: &str, content: Value) -> CmsResult<()> {
        let key = section_key(page, section)?;
        self.store.put(&key, content).await?;
        info!(page, section, "Page section saved");
        Ok(())
    }

    pub async fn remove_section(&self, page: &str, section: &str) -> CmsResult<bool> {
        self.store.remove(&section_key(page, section)?).await
    }

    /// Every section of one page, keyed by section name.
    pub async fn page_sections(&self, page: &str) -> CmsResult<Map<String, Value>> {
        let prefix = format!("{page}:");
        let mut sections: Vec<(String, Value)> = self
            .store
            .entries()
            .await?
            .into_iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(&prefix)
                    .map(|section| (section.to_string(), value))
            })
            .collect();
        sections.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(sections.into_iter().collect())
    }
}
