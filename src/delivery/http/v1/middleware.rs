use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::usecase::error::UsecaseError;
use crate::AppState;

#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub display_name: String,
}

fn bearer_token(header: Option<&str>) -> Option<&str> {
    header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, UsecaseError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = bearer_token(auth_header) else {
        tracing::warn!("missing or invalid authorization header");
        return Err(UsecaseError::Unauthorized(
            "Missing or invalid Authorization header".to_string(),
        ));
    };

    let claims = state.jwt_service.validate_token(token).map_err(|e| {
        tracing::warn!(?e, "invalid token");
        UsecaseError::Unauthorized(format!("Invalid token: {}", e))
    })?;

    let user_id = Uuid::parse_str(&claims.sub).map_err(|e| {
        tracing::warn!(?e, "failed to parse user_id from token");
        UsecaseError::Unauthorized("Invalid user ID in token".to_string())
    })?;

    let authenticated_user = AuthenticatedUser {
        user_id,
        display_name: claims.display_name(),
    };

    tracing::debug!(?authenticated_user, "user authenticated successfully");
    request.extensions_mut().insert(authenticated_user);

    Ok(next.run(request).await)
}
