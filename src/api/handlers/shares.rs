use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::AppState;
use crate::api::error::AppError;
use crate::models::{AccessLevel, Principal};
use crate::utils::auth::Claims;

#[derive(Deserialize, ToSchema)]
pub struct GrantShareRequest {
    pub user_id: String,
    pub access_level: AccessLevel,
}

/// Grant (or re-grant) access to a file. Re-granting for the same user
/// replaces the previous level.
#[utoipa::path(
    post,
    path = "/files/{id}/shares",
    params(("id" = String, Path, description = "File ID")),
    request_body = GrantShareRequest,
    responses(
        (status = 204, description = "Share granted"),
        (status = 400, description = "Invalid grantee"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only the file owner can share"),
        (status = 404, description = "File or target user not found")
    ),
    security(("jwt" = [])),
    tag = "shares"
)]
pub async fn grant_share(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(file_id): Path<String>,
    Json(req): Json<GrantShareRequest>,
) -> Result<StatusCode, AppError> {
    let principal = Principal::from_claims(Some(&claims));
    state
        .files
        .grant_share(&principal, &file_id, &req.user_id, req.access_level)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Revoke a user's access to a file. Revoking a share that does not exist
/// still succeeds.
#[utoipa::path(
    delete,
    path = "/files/{id}/shares/{user_id}",
    params(
        ("id" = String, Path, description = "File ID"),
        ("user_id" = String, Path, description = "Grantee user ID")
    ),
    responses(
        (status = 204, description = "Share revoked"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only the file owner can modify sharing"),
        (status = 404, description = "File not found or access denied")
    ),
    security(("jwt" = [])),
    tag = "shares"
)]
pub async fn revoke_share(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((file_id, user_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let principal = Principal::from_claims(Some(&claims));
    state
        .files
        .revoke_share(&principal, &file_id, &user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
