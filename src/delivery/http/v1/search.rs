use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use crate::delivery::http::v1::locations::LocationResponse;
use crate::domain::opening_hours::OpenStatus;
use crate::domain::search::{
    parse_coordinate, parse_flag, parse_id_list, parse_param, GeoFilter, Pagination, SearchFilter,
};
use crate::usecase::error::UsecaseError;
use crate::usecase::search::{SearchHit, SearchPage};
use crate::AppState;

/// Raw query string. Every value is text so that a malformed parameter
/// drops out of the filter instead of failing the request.
#[derive(Debug, Default, PartialEq)]
pub struct SearchParams {
    pub name: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub distance: Option<String>,
    pub category_ids: Option<String>,
    pub aspect_ids: Option<String>,
    pub is_open_now: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

impl SearchParams {
    /// Folds raw key/value pairs into params. The first occurrence of a
    /// repeated key wins and unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "name" => &mut params.name,
                "latitude" => &mut params.latitude,
                "longitude" => &mut params.longitude,
                "distance" => &mut params.distance,
                "categoryIds" => &mut params.category_ids,
                "aspectIds" => &mut params.aspect_ids,
                "isOpenNow" => &mut params.is_open_now,
                "page" => &mut params.page,
                "perPage" => &mut params.per_page,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        params
    }

    pub fn into_query(self) -> (SearchFilter, Pagination) {
        let geo = GeoFilter::new(
            parse_coordinate(self.latitude.as_deref()),
            parse_coordinate(self.longitude.as_deref()),
            parse_coordinate(self.distance.as_deref()),
        );

        let filter = SearchFilter::new(
            self.name,
            geo,
            parse_id_list(self.category_ids.as_deref()),
            parse_id_list(self.aspect_ids.as_deref()),
            parse_flag(self.is_open_now.as_deref()),
        );

        let pagination = Pagination::new(
            parse_param(self.page.as_deref()),
            parse_param(self.per_page.as_deref()),
        );

        (filter, pagination)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultResponse {
    #[serde(flatten)]
    pub location: LocationResponse,
    pub review_count: i64,
    pub open_status: OpenStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

impl From<SearchHit> for SearchResultResponse {
    fn from(hit: SearchHit) -> Self {
        Self {
            review_count: hit.summary.review_count,
            distance_km: hit.summary.distance_km,
            location: hit.summary.location.into(),
            open_status: hit.open_status,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub locations: Vec<SearchResultResponse>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

impl From<SearchPage> for SearchResponse {
    fn from(page: SearchPage) -> Self {
        Self {
            locations: page.hits.into_iter().map(Into::into).collect(),
            page: page.pagination.page,
            per_page: page.pagination.per_page,
            total: page.total,
        }
    }
}

#[tracing::instrument(skip(state, query))]
pub async fn search_locations(
    State(state): State<Arc<AppState>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<impl IntoResponse, UsecaseError> {
    tracing::debug!("handling search request");

    let params = match query {
        Ok(Query(pairs)) => SearchParams::from_pairs(pairs),
        Err(rejection) => {
            tracing::debug!(%rejection, "unreadable query string, searching with defaults");
            SearchParams::default()
        }
    };
    let (filter, pagination) = params.into_query();
    let page = state.search_usecase.search(filter, pagination).await?;

    tracing::debug!(total = page.total, returned = page.hits.len(), "search request served");
    Ok((StatusCode::OK, Json(SearchResponse::from(page))))
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::domain::location::{Location, LocationSummary};

    #[test]
    fn test_full_query_parses() {
        let category = Uuid::new_v4();
        let aspect = Uuid::new_v4();
        let params = SearchParams {
            name: Some("  zoo ".to_string()),
            latitude: Some("41.92".to_string()),
            longitude: Some("-87.63".to_string()),
            distance: Some("5".to_string()),
            category_ids: Some(format!("{category}")),
            aspect_ids: Some(format!("{aspect},not-a-uuid")),
            is_open_now: Some("true".to_string()),
            page: Some("3".to_string()),
            per_page: Some("10".to_string()),
        };

        let (filter, pagination) = params.into_query();

        assert_eq!(filter.name.as_deref(), Some("zoo"));
        assert_eq!(filter.geo.map(|g| g.radius_km), Some(5.0));
        assert_eq!(filter.category_ids, vec![category]);
        assert_eq!(filter.aspect_ids, vec![aspect]);
        assert!(filter.open_now);
        assert_eq!(pagination, Pagination { page: 3, per_page: 10 });
    }

    #[test]
    fn test_malformed_values_are_dropped() {
        let params = SearchParams {
            latitude: Some("north".to_string()),
            longitude: Some("-87.63".to_string()),
            distance: Some("5".to_string()),
            is_open_now: Some("maybe".to_string()),
            page: Some("-1".to_string()),
            per_page: Some("NaN".to_string()),
            ..Default::default()
        };

        let (filter, pagination) = params.into_query();

        assert_eq!(filter, SearchFilter::default());
        assert_eq!(pagination, Pagination::default());
    }

    #[test]
    fn test_non_positive_radius_disables_geo() {
        let params = SearchParams {
            latitude: Some("41.92".to_string()),
            longitude: Some("-87.63".to_string()),
            distance: Some("0".to_string()),
            ..Default::default()
        };

        let (filter, _) = params.into_query();
        assert!(filter.geo.is_none());
    }

    fn params_from(uri: &str) -> SearchParams {
        let uri: axum::http::Uri = uri.parse().unwrap();
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&uri).unwrap();
        SearchParams::from_pairs(pairs)
    }

    #[test]
    fn test_query_string_uses_camel_case() {
        let params = params_from("/api/v1/search?categoryIds=a,b&isOpenNow=1&perPage=5");

        assert_eq!(params.category_ids.as_deref(), Some("a,b"));
        assert_eq!(params.is_open_now.as_deref(), Some("1"));
        assert_eq!(params.per_page.as_deref(), Some("5"));
    }

    #[test]
    fn test_repeated_key_keeps_first_value() {
        let params = params_from("/api/v1/search?page=1&page=2&name=zoo&name=park");

        assert_eq!(params.page.as_deref(), Some("1"));
        assert_eq!(params.name.as_deref(), Some("zoo"));
        assert_eq!(params.into_query().1.page, 1);
    }

    #[test]
    fn test_unknown_and_empty_query_yield_defaults() {
        assert_eq!(params_from("/api/v1/search?sort=asc&utm_source=x"), SearchParams::default());
        assert_eq!(params_from("/api/v1/search"), SearchParams::default());
    }

    #[test]
    fn test_search_response_serialization() {
        let page = SearchPage {
            hits: vec![SearchHit {
                summary: LocationSummary {
                    location: Location {
                        id: Uuid::new_v4(),
                        name: "The Bean".to_string(),
                        latitude: 41.8827,
                        longitude: -87.6233,
                        category_id: None,
                        category_name: Some("Landmarks".to_string()),
                        rating: Some(4.6),
                        opening_hours: None,
                        image_urls: vec![],
                    },
                    review_count: 40,
                    distance_km: Some(1.25),
                },
                open_status: OpenStatus::Open,
            }],
            pagination: Pagination { page: 1, per_page: 20 },
            total: 1,
        };

        let json = serde_json::to_value(SearchResponse::from(page)).unwrap();

        assert_eq!(json["perPage"], 20);
        assert_eq!(json["total"], 1);
        let first = &json["locations"][0];
        assert_eq!(first["name"], "The Bean");
        assert_eq!(first["categoryName"], "Landmarks");
        assert_eq!(first["reviewCount"], 40);
        assert_eq!(first["openStatus"], "open");
        assert_eq!(first["distanceKm"], 1.25);
    }
}
