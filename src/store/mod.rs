use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::api::error::AppError;
use crate::models::{AccessLevel, FileRecord, FileWithOwner, Share, ShareWithUser, User, UserSummary};

/// Relational persistence for users, files and shares, plus the composite
/// lookups access control is built on. All file/share writes go through the
/// `FileService`; this layer carries no business logic of its own beyond the
/// owner-grantee invariant on `upsert_share`.
#[derive(Clone)]
pub struct RecordStore {
    pool: SqlitePool,
}

impl RecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ── Users ─────────────────────────────────────────────────────────

    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_user_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at FROM users \
             WHERE username = ? OR email = ?",
        )
        .bind(username)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Substring search over username/email for the share picker, excluding
    /// the searching user.
    pub async fn search_users(
        &self,
        term: &str,
        exclude_id: &str,
        limit: u32,
    ) -> Result<Vec<UserSummary>, AppError> {
        let pattern = format!("%{}%", term);
        let users = sqlx::query_as::<_, UserSummary>(
            "SELECT id, username, email FROM users \
             WHERE id != ? AND (username LIKE ? OR email LIKE ?) \
             ORDER BY username LIMIT ?",
        )
        .bind(exclude_id)
        .bind(&pattern)
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    // ── Files ─────────────────────────────────────────────────────────

    pub async fn insert_file(&self, file: &FileRecord) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO files \
             (id, owner_id, original_filename, storage_key, mime_type, size_bytes, is_public, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&file.id)
        .bind(&file.owner_id)
        .bind(&file.original_filename)
        .bind(&file.storage_key)
        .bind(&file.mime_type)
        .bind(file.size_bytes)
        .bind(file.is_public)
        .bind(file.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// The security boundary for every by-id file access: returns the row
    /// only if the principal owns it, holds a share on it, or it is public.
    /// A file the principal cannot at least view is indistinguishable from a
    /// file that does not exist.
    pub async fn find_file_visible_to(
        &self,
        file_id: &str,
        principal_id: Option<&str>,
    ) -> Result<Option<FileRecord>, AppError> {
        let file = sqlx::query_as::<_, FileRecord>(
            "SELECT id, owner_id, original_filename, storage_key, mime_type, size_bytes, is_public, created_at \
             FROM files f \
             WHERE f.id = ? \
               AND (f.is_public = 1 \
                 OR f.owner_id = ? \
                 OR EXISTS (SELECT 1 FROM shares s WHERE s.file_id = f.id AND s.user_id = ?))",
        )
        .bind(file_id)
        .bind(principal_id)
        .bind(principal_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(file)
    }

    /// Owned, shared and public files in one deduplicated listing, newest
    /// first, with optional case-insensitive filename filtering.
    pub async fn list_files_visible_to(
        &self,
        principal_id: &str,
        search: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<(Vec<FileWithOwner>, i64), AppError> {
        let pattern = search.map(|s| format!("%{}%", s));
        let offset = (page.saturating_sub(1)) * page_size;

        let files = sqlx::query_as::<_, FileWithOwner>(
            "SELECT f.id, f.owner_id, f.original_filename, f.storage_key, f.mime_type, \
                    f.size_bytes, f.is_public, f.created_at, u.username AS owner_name \
             FROM files f \
             JOIN users u ON u.id = f.owner_id \
             WHERE (f.owner_id = ? \
                 OR f.is_public = 1 \
                 OR EXISTS (SELECT 1 FROM shares s WHERE s.file_id = f.id AND s.user_id = ?)) \
               AND (? IS NULL OR f.original_filename LIKE ?) \
             ORDER BY f.created_at DESC \
             LIMIT ? OFFSET ?",
        )
        .bind(principal_id)
        .bind(principal_id)
        .bind(&pattern)
        .bind(&pattern)
        .bind(page_size)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) \
             FROM files f \
             WHERE (f.owner_id = ? \
                 OR f.is_public = 1 \
                 OR EXISTS (SELECT 1 FROM shares s WHERE s.file_id = f.id AND s.user_id = ?)) \
               AND (? IS NULL OR f.original_filename LIKE ?)",
        )
        .bind(principal_id)
        .bind(principal_id)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        Ok((files, total))
    }

    /// Applies a validated, authorized patch in a single statement. Absent
    /// fields keep their current value.
    pub async fn apply_file_patch(
        &self,
        file_id: &str,
        original_filename: Option<&str>,
        is_public: Option<bool>,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE files SET \
             original_filename = COALESCE(?, original_filename), \
             is_public = COALESCE(?, is_public) \
             WHERE id = ?",
        )
        .bind(original_filename)
        .bind(is_public)
        .bind(file_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Removes the file row; shares cascade with it.
    pub async fn delete_file(&self, file_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(file_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    // ── Shares ────────────────────────────────────────────────────────

    pub async fn list_shares_for_file(
        &self,
        file_id: &str,
    ) -> Result<Vec<ShareWithUser>, AppError> {
        let shares = sqlx::query_as::<_, ShareWithUser>(
            "SELECT s.file_id, s.user_id, s.access_level, u.username \
             FROM shares s \
             JOIN users u ON u.id = s.user_id \
             WHERE s.file_id = ?",
        )
        .bind(file_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(shares)
    }

    /// Create-or-replace keyed on (file_id, user_id): a re-grant overwrites
    /// the previous level, never accumulates. Granting to the file's owner
    /// is rejected here so the invariant holds no matter the caller.
    pub async fn upsert_share(
        &self,
        file_id: &str,
        user_id: &str,
        access_level: AccessLevel,
    ) -> Result<(), AppError> {
        let owner_id = sqlx::query_scalar::<_, String>("SELECT owner_id FROM files WHERE id = ?")
            .bind(file_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(crate::api::error::FILE_NOT_AVAILABLE.to_string()))?;

        if owner_id == user_id {
            return Err(AppError::Validation(
                "A file cannot be shared with its owner".to_string(),
            ));
        }

        sqlx::query(
            "INSERT INTO shares (file_id, user_id, access_level) VALUES (?, ?, ?) \
             ON CONFLICT(file_id, user_id) DO UPDATE SET access_level = excluded.access_level",
        )
        .bind(file_id)
        .bind(user_id)
        .bind(access_level)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Idempotent: deleting a share that does not exist affects zero rows
    /// and is not an error.
    pub async fn delete_share(&self, file_id: &str, user_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM shares WHERE file_id = ? AND user_id = ?")
            .bind(file_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    // ── Dashboard ─────────────────────────────────────────────────────

    pub async fn count_files_owned_by(&self, owner_id: &str) -> Result<i64, AppError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM files WHERE owner_id = ?")
                .bind(owner_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    pub async fn total_bytes_owned_by(&self, owner_id: &str) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, Option<i64>>(
            "SELECT SUM(size_bytes) FROM files WHERE owner_id = ?",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }

    pub async fn recent_files_owned_by(
        &self,
        owner_id: &str,
        limit: u32,
    ) -> Result<Vec<FileRecord>, AppError> {
        let files = sqlx::query_as::<_, FileRecord>(
            "SELECT id, owner_id, original_filename, storage_key, mime_type, size_bytes, is_public, created_at \
             FROM files WHERE owner_id = ? ORDER BY created_at DESC LIMIT ?",
        )
        .bind(owner_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(files)
    }

    pub async fn count_shared_files_owned_by(&self, owner_id: &str) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(DISTINCT f.id) FROM files f \
             JOIN shares s ON s.file_id = f.id \
             WHERE f.owner_id = ?",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Used by shares-snapshot loads in the service layer; returns plain
    /// share rows without the username join.
    pub async fn shares_snapshot(&self, file_id: &str) -> Result<Vec<Share>, AppError> {
        let shares = sqlx::query_as::<_, Share>(
            "SELECT file_id, user_id, access_level FROM shares WHERE file_id = ?",
        )
        .bind(file_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(shares)
    }
}
