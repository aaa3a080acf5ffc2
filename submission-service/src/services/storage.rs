use async_trait::async_trait;
use chrono::{Datelike, Utc};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::services::error::ServiceError;

/// Binary content store. Paths returned by `save` are relative to the store.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn save(&self, data: &[u8], file_name: &str) -> Result<String, ServiceError>;
    async fn read(&self, path: &str) -> Result<Vec<u8>, ServiceError>;
    /// Deleting a path that does not exist succeeds.
    async fn delete(&self, path: &str) -> Result<(), ServiceError>;
}

pub struct LocalBlobStore {
    base_path: PathBuf,
}

impl LocalBlobStore {
    pub async fn new(base_path: impl Into<PathBuf>) -> Result<Self, ServiceError> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)
            .await
            .map_err(|e| ServiceError::Storage(anyhow::anyhow!(e)))?;
        Ok(Self { base_path })
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, ServiceError> {
        let relative = Path::new(path);
        let safe = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(ServiceError::Storage(anyhow::anyhow!(
                "Refusing blob path outside the store: {}",
                path
            )));
        }
        Ok(self.base_path.join(relative))
    }
}

/// Keep ASCII alphanumerics, dot, dash and underscore.
pub fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(100)
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn save(&self, data: &[u8], file_name: &str) -> Result<String, ServiceError> {
        let now = Utc::now();
        let relative = format!(
            "{:04}/{:02}/{}_{}",
            now.year(),
            now.month(),
            Uuid::new_v4(),
            sanitize_file_name(file_name)
        );
        let path = self.resolve(&relative)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ServiceError::Storage(anyhow::anyhow!(e)))?;
        }
        fs::write(&path, data).await.map_err(|e| {
            tracing::error!(path = %relative, error = %e, "Failed to write blob");
            ServiceError::Storage(anyhow::anyhow!(e))
        })?;
        Ok(relative)
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, ServiceError> {
        let full = self.resolve(path)?;
        fs::read(full).await.map_err(|e| {
            tracing::error!(path, error = %e, "Failed to read blob");
            ServiceError::Storage(anyhow::anyhow!(e))
        })
    }

    async fn delete(&self, path: &str) -> Result<(), ServiceError> {
        let full = self.resolve(path)?;
        match fs::remove_file(full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ServiceError::Storage(anyhow::anyhow!(e))),
        }
    }
}
