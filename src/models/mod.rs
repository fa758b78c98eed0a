use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::utils::auth::Claims;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Public projection of a user, safe to return to other users.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub email: String,
}

impl From<User> for UserSummary {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
        }
    }
}

/// Per-user, per-file access grant level. Ownership is implicit and never
/// represented as a share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AccessLevel {
    Read,
    Write,
    Admin,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Read => "read",
            AccessLevel::Write => "write",
            AccessLevel::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct FileRecord {
    pub id: String,
    pub owner_id: String,
    pub original_filename: String,
    pub storage_key: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

/// File row joined with its owner's username, as returned by listings.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct FileWithOwner {
    pub id: String,
    pub owner_id: String,
    pub original_filename: String,
    pub storage_key: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub owner_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Share {
    pub file_id: String,
    pub user_id: String,
    pub access_level: AccessLevel,
}

/// Share row joined with the grantee's username.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ShareWithUser {
    pub file_id: String,
    pub user_id: String,
    pub access_level: AccessLevel,
    pub username: String,
}

/// The identity making a request: a verified user, or explicit anonymous.
#[derive(Debug, Clone)]
pub enum Principal {
    Anonymous,
    User { id: String, username: String },
}

impl Principal {
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Principal::Anonymous => None,
            Principal::User { id, .. } => Some(id),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Principal::Anonymous)
    }

    pub fn from_claims(claims: Option<&Claims>) -> Self {
        match claims {
            Some(c) => Principal::User {
                id: c.sub.clone(),
                username: c.username.clone(),
            },
            None => Principal::Anonymous,
        }
    }
}

/// Typed patch for the two mutable file fields. Fields left as `None` are
/// not touched; authorization is evaluated per present field and the whole
/// patch is rejected if any field fails.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct FilePatch {
    pub original_filename: Option<String>,
    pub is_public: Option<bool>,
}

impl FilePatch {
    pub fn is_empty(&self) -> bool {
        self.original_filename.is_none() && self.is_public.is_none()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Pagination {
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FilePage {
    pub files: Vec<FileWithOwner>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardSummary {
    pub total_files: i64,
    pub total_bytes: i64,
    pub recent_files: Vec<FileRecord>,
    pub shared_files: i64,
}
