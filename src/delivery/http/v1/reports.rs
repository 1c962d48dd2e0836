use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::delivery::http::v1::extract::{JsonBody, PathId};
use crate::delivery::http::v1::middleware::AuthenticatedUser;
use crate::domain::report::Report;
use crate::usecase::error::UsecaseError;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub id: Uuid,
    pub location_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl From<Report> for ReportResponse {
    fn from(r: Report) -> Self {
        Self {
            id: r.id,
            location_id: r.location_id,
            body: r.body,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReportRequest {
    #[validate(length(min = 10, max = 1000))]
    pub body: String,
}

fn validate(payload: &ReportRequest, user: &AuthenticatedUser) -> Result<(), UsecaseError> {
    payload.validate().map_err(|validation_errors| {
        tracing::warn!(user_id = %user.user_id, ?validation_errors, "validation failed");
        UsecaseError::Validation(format!("{:?}", validation_errors))
    })
}

#[tracing::instrument(skip(state, payload), fields(user_id = %user.user_id, location_id = %location_id))]
pub async fn create_report(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    PathId(location_id): PathId<Uuid>,
    JsonBody(payload): JsonBody<ReportRequest>,
) -> Result<impl IntoResponse, UsecaseError> {
    tracing::debug!("handling create report request");
    validate(&payload, &user)?;

    let report = state
        .reports_usecase
        .create_report(location_id, user.user_id, payload.body)
        .await?;

    Ok((StatusCode::CREATED, Json(ReportResponse::from(report))))
}

#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn list_reports(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, UsecaseError> {
    let reports = state.reports_usecase.list_reports(user.user_id).await?;
    let response: Vec<ReportResponse> = reports.into_iter().map(Into::into).collect();

    Ok((StatusCode::OK, Json(response)))
}

#[tracing::instrument(skip(state, payload), fields(user_id = %user.user_id, report_id = %report_id))]
pub async fn update_report(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    PathId(report_id): PathId<Uuid>,
    JsonBody(payload): JsonBody<ReportRequest>,
) -> Result<impl IntoResponse, UsecaseError> {
    tracing::debug!("handling update report request");
    validate(&payload, &user)?;

    let report = state
        .reports_usecase
        .update_report(report_id, user.user_id, payload.body)
        .await?;

    Ok((StatusCode::OK, Json(ReportResponse::from(report))))
}

#[tracing::instrument(skip(state), fields(user_id = %user.user_id, report_id = %report_id))]
pub async fn delete_report(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    PathId(report_id): PathId<Uuid>,
) -> Result<impl IntoResponse, UsecaseError> {
    state
        .reports_usecase
        .delete_report(report_id, user.user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
