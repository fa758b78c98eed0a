use std::sync::Arc;

use tracing::info;

use crate::services::storage::LocalDiskStorage;

pub async fn setup_storage(upload_dir: &str) -> anyhow::Result<Arc<LocalDiskStorage>> {
    tokio::fs::create_dir_all(upload_dir).await?;
    info!("📦 Upload directory ready: {}", upload_dir);
    Ok(Arc::new(LocalDiskStorage::new(upload_dir)))
}
