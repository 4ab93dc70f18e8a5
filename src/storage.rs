//! Image uploads to the storage bucket.

use std::path::Path;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::backend::DataBackend;
use crate::error::{CmsError, CmsResult};
use crate::slug::generate_slug;

#[derive(Clone)]
pub struct ImageStorage {
    backend: Arc<dyn DataBackend>,
    bucket: String,
}

impl ImageStorage {
    pub fn new(backend: Arc<dyn DataBackend>, bucket: impl Into<String>) -> Self {
        Self {
            backend,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Store an image under a fresh unique path and return its public URL.
    pub async fn upload_image(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> CmsResult<String> {
        if bytes.is_empty() {
            return Err(CmsError::InvalidInput("empty upload".to_string()));
        }

        let path = object_path(file_name, Uuid::new_v4());
        let size = bytes.len();
        let url = self
            .backend
            .upload(&self.bucket, &path, bytes, content_type)
            .await?;

        info!(bucket = %self.bucket, path = %path, size, "Image uploaded");
        Ok(url)
    }
}

/// `<uuid>-<slug of stem>.<ext>`, extension lowercased.
fn object_path(file_name: &str, id: Uuid) -> String {
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(generate_slug)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "image".to_string());

    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => format!("{id}-{stem}.{}", ext.to_ascii_lowercase()),
        _ => format!("{id}-{stem}"),
    }
}
