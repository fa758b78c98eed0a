use std::sync::Arc;

use chrono::Utc;
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::error::{AppError, FILE_NOT_AVAILABLE};
use crate::config::AppConfig;
use crate::models::{
    AccessLevel, DashboardSummary, FilePage, FilePatch, FileRecord, Pagination, Principal,
    ShareWithUser, UserSummary,
};
use crate::services::access_control::{self, Decision, Denial, Operation};
use crate::services::storage::BlobStore;
use crate::store::RecordStore;

/// Orchestrates every file and share mutation: loads snapshots from the
/// record store, asks the access-control engine, then performs the blob and
/// record operations in the required order. No other component writes file
/// or share rows.
pub struct FileService {
    store: RecordStore,
    storage: Arc<dyn BlobStore>,
    config: AppConfig,
}

impl FileService {
    pub fn new(store: RecordStore, storage: Arc<dyn BlobStore>, config: AppConfig) -> Self {
        Self {
            store,
            storage,
            config,
        }
    }

    fn deny(denial: Denial, message: &str) -> AppError {
        match denial {
            Denial::Unauthenticated => {
                AppError::Unauthenticated("Authentication required".to_string())
            }
            Denial::Forbidden => AppError::Forbidden(message.to_string()),
        }
    }

    /// Loads the file as visible to the principal, or the conflated
    /// not-found error. This is the only entry point for by-id access.
    async fn visible_file(
        &self,
        principal: &Principal,
        file_id: &str,
    ) -> Result<FileRecord, AppError> {
        self.store
            .find_file_visible_to(file_id, principal.user_id())
            .await?
            .ok_or_else(|| AppError::NotFound(FILE_NOT_AVAILABLE.to_string()))
    }

    /// Stores the bytes first, then the metadata row. If the insert fails
    /// after a successful blob write the blob is orphaned; that is accepted
    /// and logged rather than compensated.
    pub async fn upload(
        &self,
        principal: &Principal,
        bytes: &[u8],
        original_filename: &str,
        mime_type: Option<&str>,
    ) -> Result<FileRecord, AppError> {
        let owner_id = principal
            .user_id()
            .ok_or_else(|| AppError::Unauthenticated("Authentication required".to_string()))?;

        let filename = crate::utils::validation::sanitize_filename(original_filename)?;
        crate::utils::validation::validate_file_size(bytes.len(), self.config.max_file_size)?;

        let storage_key = self.storage.put(bytes, &filename).await?;

        let file = FileRecord {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            original_filename: filename,
            storage_key,
            mime_type: mime_type
                .unwrap_or("application/octet-stream")
                .to_string(),
            size_bytes: bytes.len() as i64,
            is_public: false,
            created_at: Utc::now(),
        };

        if let Err(e) = self.store.insert_file(&file).await {
            warn!(
                "File insert failed after blob write, orphaning blob {}: {}",
                file.storage_key, e
            );
            return Err(e);
        }

        info!(
            "File uploaded: id={}, owner={}, size={}",
            file.id, file.owner_id, file.size_bytes
        );
        Ok(file)
    }

    pub async fn get_details(
        &self,
        principal: &Principal,
        file_id: &str,
    ) -> Result<(FileRecord, Option<UserSummary>, Vec<ShareWithUser>), AppError> {
        let file = self.visible_file(principal, file_id).await?;
        let owner = self
            .store
            .find_user_by_id(&file.owner_id)
            .await?
            .map(UserSummary::from);
        let shares = self.store.list_shares_for_file(&file.id).await?;
        Ok((file, owner, shares))
    }

    /// Authorizes view access and opens the blob for streaming.
    pub async fn download(
        &self,
        principal: &Principal,
        file_id: &str,
    ) -> Result<(FileRecord, fs::File), AppError> {
        let file = self.visible_file(principal, file_id).await?;
        let blob = self.storage.open(&file.storage_key).await?;
        Ok((file, blob))
    }

    /// Applies a typed patch atomically: every requested field is authorized
    /// before anything is written, and a single-field failure rejects the
    /// whole request.
    pub async fn update(
        &self,
        principal: &Principal,
        file_id: &str,
        patch: FilePatch,
    ) -> Result<FileRecord, AppError> {
        if patch.is_empty() {
            return Err(AppError::Validation(
                "No valid fields to update".to_string(),
            ));
        }

        let new_name = match &patch.original_filename {
            Some(name) => Some(crate::utils::validation::sanitize_filename(name)?),
            None => None,
        };

        let file = self.visible_file(principal, file_id).await?;
        let shares = self.store.shares_snapshot(&file.id).await?;

        if let Decision::Deny(denial) =
            access_control::authorize_patch(principal, &file, &shares, &patch)
        {
            return Err(Self::deny(
                denial,
                "You do not have permission to update this file",
            ));
        }

        self.store
            .apply_file_patch(&file.id, new_name.as_deref(), patch.is_public)
            .await?;

        self.visible_file(principal, file_id).await
    }

    /// Blob removal is best-effort; the record delete is authoritative and
    /// its failure fails the operation.
    pub async fn delete(&self, principal: &Principal, file_id: &str) -> Result<(), AppError> {
        let file = self.visible_file(principal, file_id).await?;
        let shares = self.store.shares_snapshot(&file.id).await?;

        if let Decision::Deny(denial) =
            access_control::authorize(principal, &file, &shares, Operation::Delete)
        {
            return Err(Self::deny(
                denial,
                "You do not have permission to delete this file",
            ));
        }

        match self.storage.delete(&file.storage_key).await {
            Ok(true) => {}
            Ok(false) => warn!("Blob already missing for file {}", file.id),
            Err(e) => warn!("Blob delete failed for file {}: {}", file.id, e),
        }

        self.store.delete_file(&file.id).await?;
        info!("File deleted: id={}", file.id);
        Ok(())
    }

    pub async fn grant_share(
        &self,
        principal: &Principal,
        file_id: &str,
        grantee_id: &str,
        access_level: AccessLevel,
    ) -> Result<(), AppError> {
        let file = self.visible_file(principal, file_id).await?;
        let shares = self.store.shares_snapshot(&file.id).await?;

        if let Decision::Deny(denial) =
            access_control::authorize(principal, &file, &shares, Operation::ManageShares)
        {
            return Err(Self::deny(denial, "Only the file owner can share the file"));
        }

        let grantee = self
            .store
            .find_user_by_id(grantee_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Target user not found".to_string()))?;

        if grantee.id == file.owner_id {
            return Err(AppError::Validation(
                "A file cannot be shared with its owner".to_string(),
            ));
        }

        self.store
            .upsert_share(&file.id, &grantee.id, access_level)
            .await?;

        info!(
            "Share granted: file={}, grantee={}, level={}",
            file.id,
            grantee.id,
            access_level.as_str()
        );
        Ok(())
    }

    /// Idempotent: revoking a share that does not exist succeeds with zero
    /// effect.
    pub async fn revoke_share(
        &self,
        principal: &Principal,
        file_id: &str,
        grantee_id: &str,
    ) -> Result<(), AppError> {
        let file = self.visible_file(principal, file_id).await?;
        let shares = self.store.shares_snapshot(&file.id).await?;

        if let Decision::Deny(denial) =
            access_control::authorize(principal, &file, &shares, Operation::ManageShares)
        {
            return Err(Self::deny(
                denial,
                "Only the file owner can modify sharing",
            ));
        }

        let removed = self.store.delete_share(&file.id, grantee_id).await?;
        if removed == 0 {
            info!("No share to revoke: file={}, user={}", file.id, grantee_id);
        }
        Ok(())
    }

    pub async fn list_accessible(
        &self,
        principal: &Principal,
        search: Option<&str>,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Result<FilePage, AppError> {
        let principal_id = principal
            .user_id()
            .ok_or_else(|| AppError::Unauthenticated("Authentication required".to_string()))?;

        let (page, page_size) = crate::utils::validation::normalize_paging(
            page,
            page_size,
            self.config.default_page_size,
            self.config.max_page_size,
        );
        let search = search.map(str::trim).filter(|s| !s.is_empty());

        let (files, total) = self
            .store
            .list_files_visible_to(principal_id, search, page, page_size)
            .await?;

        Ok(FilePage {
            files,
            pagination: Pagination {
                total,
                page,
                page_size,
                total_pages: (total + page_size as i64 - 1) / page_size as i64,
            },
        })
    }

    pub async fn dashboard(&self, principal: &Principal) -> Result<DashboardSummary, AppError> {
        let owner_id = principal
            .user_id()
            .ok_or_else(|| AppError::Unauthenticated("Authentication required".to_string()))?;

        Ok(DashboardSummary {
            total_files: self.store.count_files_owned_by(owner_id).await?,
            total_bytes: self.store.total_bytes_owned_by(owner_id).await?,
            recent_files: self.store.recent_files_owned_by(owner_id, 5).await?,
            shared_files: self.store.count_shared_files_owned_by(owner_id).await?,
        })
    }
}
