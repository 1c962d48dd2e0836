//! Extractors whose rejections render as `UsecaseError`, so malformed
//! bodies and identifiers get the same JSON error shape as everything else.

use axum::extract::{FromRequest, FromRequestParts};

use crate::usecase::error::UsecaseError;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(UsecaseError))]
pub struct JsonBody<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(UsecaseError))]
pub struct PathId<T>(pub T);

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header::CONTENT_TYPE, Request, StatusCode},
        routing::{get, post},
        Router,
    };
    use serde::Deserialize;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;

    #[derive(Deserialize)]
    struct Payload {
        rating: i16,
    }

    async fn echo_rating(JsonBody(payload): JsonBody<Payload>) -> String {
        payload.rating.to_string()
    }

    async fn echo_id(PathId(id): PathId<Uuid>) -> String {
        id.to_string()
    }

    fn app() -> Router {
        Router::new()
            .route("/items", post(echo_rating))
            .route("/items/{id}", get(echo_id))
    }

    async fn error_body(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_wrongly_typed_body_is_json_bad_request() {
        let request = Request::post("/items")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"rating":"five"}"#))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = error_body(response).await;
        assert!(json["error"].as_str().unwrap().contains("rating"));
    }

    #[tokio::test]
    async fn test_missing_content_type_is_json_bad_request() {
        let request = Request::post("/items").body(Body::from(r#"{"rating":3}"#)).unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(error_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_valid_body_passes_through() {
        let request = Request::post("/items")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"rating":3}"#))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"3");
    }

    #[tokio::test]
    async fn test_malformed_id_is_json_bad_request() {
        let request = Request::get("/items/not-a-uuid").body(Body::empty()).unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(error_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_valid_id_passes_through() {
        let id = Uuid::new_v4();
        let request = Request::get(format!("/items/{id}")).body(Body::empty()).unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
