//! Favorites and route stops. Both are per-user location sets with the
//! same endpoints shape, backed by separate use case instances.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::delivery::http::v1::extract::PathId;
use crate::delivery::http::v1::locations::LocationResponse;
use crate::delivery::http::v1::middleware::AuthenticatedUser;
use crate::domain::membership::Membership;
use crate::usecase::error::UsecaseError;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipResponse {
    pub id: Uuid,
    pub location_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<Membership> for MembershipResponse {
    fn from(m: Membership) -> Self {
        Self {
            id: m.id,
            location_id: m.location_id,
            created_at: m.created_at,
        }
    }
}

#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn list_favorites(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, UsecaseError> {
    let locations = state.favorites_usecase.list(user.user_id).await?;
    let response: Vec<LocationResponse> = locations.into_iter().map(Into::into).collect();

    Ok((StatusCode::OK, Json(response)))
}

#[tracing::instrument(skip(state), fields(user_id = %user.user_id, location_id = %location_id))]
pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    PathId(location_id): PathId<Uuid>,
) -> Result<impl IntoResponse, UsecaseError> {
    let membership = state.favorites_usecase.add(user.user_id, location_id).await?;

    Ok((StatusCode::CREATED, Json(MembershipResponse::from(membership))))
}

#[tracing::instrument(skip(state), fields(user_id = %user.user_id, location_id = %location_id))]
pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    PathId(location_id): PathId<Uuid>,
) -> Result<impl IntoResponse, UsecaseError> {
    state.favorites_usecase.remove(user.user_id, location_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn get_route(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, UsecaseError> {
    let stops = state.route_usecase.list(user.user_id).await?;
    let response: Vec<LocationResponse> = stops.into_iter().map(Into::into).collect();

    tracing::debug!(count = response.len(), "route retrieved");
    Ok((StatusCode::OK, Json(response)))
}

#[tracing::instrument(skip(state), fields(user_id = %user.user_id, location_id = %location_id))]
pub async fn add_route_stop(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    PathId(location_id): PathId<Uuid>,
) -> Result<impl IntoResponse, UsecaseError> {
    let membership = state.route_usecase.add(user.user_id, location_id).await?;

    Ok((StatusCode::CREATED, Json(MembershipResponse::from(membership))))
}

#[tracing::instrument(skip(state), fields(user_id = %user.user_id, location_id = %location_id))]
pub async fn remove_route_stop(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    PathId(location_id): PathId<Uuid>,
) -> Result<impl IntoResponse, UsecaseError> {
    state.route_usecase.remove(user.user_id, location_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
