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
use crate::domain::review::{Review, ReviewSource};
use crate::usecase::error::UsecaseError;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub id: Uuid,
    pub location_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    pub author_name: String,
    pub rating: i16,
    pub body: String,
    pub source: ReviewSource,
    pub created_at: DateTime<Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(r: Review) -> Self {
        Self {
            id: r.id,
            location_id: r.location_id,
            user_id: r.user_id,
            author_name: r.author_name,
            rating: r.rating,
            body: r.body,
            source: r.source,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewMutationResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<ReviewResponse>,
    pub location_rating: Option<f64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[validate(range(min = 1, max = 5))]
    pub rating: i16,
    #[validate(length(min = 10, max = 1000))]
    pub body: String,
}

#[tracing::instrument(skip(state, payload), fields(user_id = %user.user_id, location_id = %location_id))]
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    PathId(location_id): PathId<Uuid>,
    JsonBody(payload): JsonBody<CreateReviewRequest>,
) -> Result<impl IntoResponse, UsecaseError> {
    tracing::debug!("handling create review request");

    if let Err(validation_errors) = payload.validate() {
        tracing::warn!(user_id = %user.user_id, ?validation_errors, "validation failed");
        return Err(UsecaseError::Validation(format!("{:?}", validation_errors)));
    }

    let outcome = state
        .reviews_usecase
        .create_review(
            location_id,
            user.user_id,
            user.display_name,
            payload.rating,
            payload.body,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ReviewMutationResponse {
            review: Some(outcome.review.into()),
            location_rating: outcome.location_rating,
        }),
    ))
}

#[tracing::instrument(skip(state), fields(location_id = %location_id))]
pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    PathId(location_id): PathId<Uuid>,
) -> Result<impl IntoResponse, UsecaseError> {
    tracing::debug!("handling list reviews request");

    let reviews = state.reviews_usecase.list_reviews(location_id).await?;
    let response: Vec<ReviewResponse> = reviews.into_iter().map(Into::into).collect();

    tracing::debug!(location_id = %location_id, count = response.len(), "reviews listed successfully");
    Ok((StatusCode::OK, Json(response)))
}

#[tracing::instrument(skip(state), fields(user_id = %user.user_id, location_id = %location_id))]
pub async fn get_my_review(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    PathId(location_id): PathId<Uuid>,
) -> Result<impl IntoResponse, UsecaseError> {
    let review = state
        .reviews_usecase
        .get_user_review(location_id, user.user_id)
        .await?;

    Ok((StatusCode::OK, Json(ReviewResponse::from(review))))
}

#[tracing::instrument(skip(state), fields(user_id = %user.user_id, review_id = %review_id))]
pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    PathId(review_id): PathId<Uuid>,
) -> Result<impl IntoResponse, UsecaseError> {
    tracing::debug!("handling delete review request");

    let location_rating = state
        .reviews_usecase
        .delete_review(review_id, user.user_id)
        .await?;

    Ok((
        StatusCode::OK,
        Json(ReviewMutationResponse {
            review: None,
            location_rating,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_review_request_validation_valid() {
        let request = CreateReviewRequest {
            rating: 4,
            body: "Lovely view of the lake.".to_string(),
        };

        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_create_review_request_validation_rating_out_of_range() {
        for rating in [0, 6] {
            let request = CreateReviewRequest {
                rating,
                body: "Lovely view of the lake.".to_string(),
            };
            assert!(request.validate().is_err());
        }
    }

    #[test]
    fn test_create_review_request_validation_body_length() {
        let short = CreateReviewRequest {
            rating: 3,
            body: "meh".to_string(),
        };
        assert!(short.validate().is_err());

        let long = CreateReviewRequest {
            rating: 3,
            body: "a".repeat(1001),
        };
        assert!(long.validate().is_err());

        // Lengths count characters, not bytes.
        let multibyte = CreateReviewRequest {
            rating: 3,
            body: "é".repeat(1000),
        };
        assert!(multibyte.validate().is_ok());
    }

    #[test]
    fn test_review_response_serialization() {
        let review = Review::new_user(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Ann".to_string(),
            5,
            "Best hot dogs in town.".to_string(),
        );

        let json = serde_json::to_value(ReviewResponse::from(review)).unwrap();
        assert_eq!(json["authorName"], "Ann");
        assert_eq!(json["source"], "user");

        let deleted = ReviewMutationResponse {
            review: None,
            location_rating: None,
        };
        let json = serde_json::to_value(deleted).unwrap();
        assert!(json.get("review").is_none());
        assert!(json["locationRating"].is_null());
    }
}
