use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::delivery::http::v1::extract::PathId;
use crate::domain::catalog::{Aspect, AspectRating, Category};
use crate::domain::location::{GeoPoint, Location};
use crate::domain::opening_hours::{HoursGroup, OpenStatus};
use crate::domain::search::parse_coordinate;
use crate::usecase::error::UsecaseError;
use crate::usecase::locations::LocationDetails;
use crate::AppState;

/// Fields every location payload carries.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationResponse {
    pub id: Uuid,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub rating: Option<f64>,
    pub image_urls: Vec<String>,
}

impl From<Location> for LocationResponse {
    fn from(l: Location) -> Self {
        Self {
            id: l.id,
            name: l.name,
            latitude: l.latitude,
            longitude: l.longitude,
            category_id: l.category_id,
            category_name: l.category_name,
            rating: l.rating,
            image_urls: l.image_urls,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AspectRatingResponse {
    pub aspect_id: Uuid,
    pub aspect_name: String,
    pub rating: i16,
    pub generated_on: NaiveDate,
}

impl From<AspectRating> for AspectRatingResponse {
    fn from(a: AspectRating) -> Self {
        Self {
            aspect_id: a.aspect_id,
            aspect_name: a.aspect_name,
            rating: a.rating,
            generated_on: a.generated_on,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationDetailsResponse {
    #[serde(flatten)]
    pub location: LocationResponse,
    pub review_count: i64,
    pub open_status: OpenStatus,
    pub hours: Vec<HoursGroup>,
    pub aspect_ratings: Vec<AspectRatingResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

impl From<LocationDetails> for LocationDetailsResponse {
    fn from(d: LocationDetails) -> Self {
        Self {
            location: d.record.location.into(),
            review_count: d.record.review_count,
            open_status: d.open_status,
            hours: d.hours,
            aspect_ratings: d.record.aspect_ratings.into_iter().map(Into::into).collect(),
            distance_km: d.distance_km,
        }
    }
}

/// Optional caller position; malformed or repeated values are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct OriginParams {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

impl OriginParams {
    fn origin(&self) -> Option<GeoPoint> {
        GeoPoint::new(
            parse_coordinate(self.latitude.as_deref())?,
            parse_coordinate(self.longitude.as_deref())?,
        )
    }
}

#[tracing::instrument(skip(state, params), fields(location_id = %location_id))]
pub async fn get_location(
    State(state): State<Arc<AppState>>,
    PathId(location_id): PathId<Uuid>,
    params: Result<Query<OriginParams>, QueryRejection>,
) -> Result<impl IntoResponse, UsecaseError> {
    tracing::debug!("handling get location request");

    let params = params.map(|Query(p)| p).unwrap_or_default();

    let details = state
        .locations_usecase
        .get_location(location_id, params.origin())
        .await?;

    Ok((StatusCode::OK, Json(LocationDetailsResponse::from(details))))
}

#[tracing::instrument(skip(state))]
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Category>>, UsecaseError> {
    let categories = state.locations_usecase.list_categories().await?;
    Ok(Json(categories))
}

#[tracing::instrument(skip(state))]
pub async fn list_aspects(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Aspect>>, UsecaseError> {
    let aspects = state.locations_usecase.list_aspects().await?;
    Ok(Json(aspects))
}
