use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::AppState;
use crate::api::error::AppError;
use crate::models::UserSummary;
use crate::utils::auth::Claims;

#[derive(Deserialize)]
pub struct UserSearchQuery {
    pub search: Option<String>,
}

#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Current user profile", body = UserSummary),
        (status = 401, description = "Unauthorized")
    ),
    security(("jwt" = [])),
    tag = "users"
)]
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserSummary>, AppError> {
    let user = state
        .store
        .find_user_by_id(&claims.sub)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

/// Search users to share a file with. Excludes the caller.
#[utoipa::path(
    get,
    path = "/users",
    params(
        ("search" = String, Query, description = "Username/email substring, min 2 chars")
    ),
    responses(
        (status = 200, description = "Matching users", body = Vec<UserSummary>),
        (status = 400, description = "Search query too short"),
        (status = 401, description = "Unauthorized")
    ),
    security(("jwt" = [])),
    tag = "users"
)]
pub async fn search_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<UserSearchQuery>,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    let term = query.search.as_deref().unwrap_or("").trim().to_string();
    if term.len() < 2 {
        return Err(AppError::Validation(
            "Search query must be at least 2 characters".to_string(),
        ));
    }

    let users = state.store.search_users(&term, &claims.sub, 10).await?;
    Ok(Json(users))
}
