use axum::{Extension, Json, extract::State};

use crate::AppState;
use crate::api::error::AppError;
use crate::models::{DashboardSummary, Principal};
use crate::utils::auth::Claims;

#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Storage usage summary for the caller", body = DashboardSummary),
        (status = 401, description = "Unauthorized")
    ),
    security(("jwt" = [])),
    tag = "users"
)]
pub async fn summary(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<DashboardSummary>, AppError> {
    let principal = Principal::from_claims(Some(&claims));
    let summary = state.files.dashboard(&principal).await?;
    Ok(Json(summary))
}
