use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::AppState;
use crate::api::error::AppError;
use crate::utils::auth::{Claims, validate_jwt};

fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}

async fn resolve_claims(state: &AppState, token: Option<String>) -> Option<Claims> {
    let token = token?;
    let claims = validate_jwt(&token, &state.config.jwt_secret).ok()?;

    // A token may outlive its user; treat it as no identity.
    match state.store.find_user_by_id(&claims.sub).await {
        Ok(Some(_)) => Some(claims),
        _ => None,
    }
}

/// Rejects the request unless a valid bearer token resolves to an existing
/// user; on success the claims are available as a request extension.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req);
    match resolve_claims(&state, token).await {
        Some(claims) => {
            req.extensions_mut().insert(claims);
            Ok(next.run(req).await)
        }
        None => Err(AppError::Unauthenticated(
            "Authentication required".to_string(),
        )),
    }
}

/// Resolves the caller's identity when a valid token is present and passes
/// the request through either way. Used by endpoints that also serve public
/// files to anonymous callers.
pub async fn identify(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let token = bearer_token(&req);
    if let Some(claims) = resolve_claims(&state, token).await {
        req.extensions_mut().insert(claims);
    }
    next.run(req).await
}
