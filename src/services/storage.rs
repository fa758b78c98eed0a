use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

use crate::api::error::AppError;
use crate::utils::validation::sanitize_filename;

/// Raw byte persistence, addressed by an opaque storage key. The key is
/// generated on `put` and never interpreted by callers.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Persists the bytes and returns the generated storage key.
    async fn put(&self, bytes: &[u8], original_name: &str) -> Result<String, AppError>;

    /// Opens the blob for streaming reads.
    async fn open(&self, storage_key: &str) -> Result<fs::File, AppError>;

    /// Best-effort removal; returns false when the blob was already gone.
    async fn delete(&self, storage_key: &str) -> Result<bool, AppError>;
}

/// Blob store backed by a single local directory. Keys are
/// `{uuid}-{sanitized-name}` and never contain path separators.
pub struct LocalDiskStorage {
    root: PathBuf,
}

impl LocalDiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, storage_key: &str) -> Result<PathBuf, AppError> {
        if storage_key.is_empty()
            || storage_key.contains('/')
            || storage_key.contains('\\')
            || storage_key.contains("..")
        {
            tracing::warn!("Rejected suspicious storage key: {}", storage_key);
            return Err(AppError::NotFound("File not found on server".to_string()));
        }
        Ok(self.root.join(storage_key))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl BlobStore for LocalDiskStorage {
    async fn put(&self, bytes: &[u8], original_name: &str) -> Result<String, AppError> {
        let storage_key = format!("{}-{}", Uuid::new_v4(), sanitize_filename(original_name)?);
        let path = self.root.join(&storage_key);

        fs::write(&path, bytes).await?;
        tracing::debug!("Blob written: {} ({} bytes)", storage_key, bytes.len());

        Ok(storage_key)
    }

    async fn open(&self, storage_key: &str) -> Result<fs::File, AppError> {
        let path = self.resolve(storage_key)?;
        match fs::File::open(&path).await {
            Ok(file) => Ok(file),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(AppError::NotFound("File not found on server".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, storage_key: &str) -> Result<bool, AppError> {
        let path = self.resolve(storage_key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
