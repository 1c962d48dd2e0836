mod config;
mod delivery;
mod domain;
mod repository;
mod telemetry;
mod usecase;

use std::sync::Arc;

use axum::{
    extract::State,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tower_http::trace::TraceLayer;

use crate::delivery::http::v1::locations::{get_location, list_aspects, list_categories};
use crate::delivery::http::v1::memberships::{
    add_favorite, add_route_stop, get_route, list_favorites, remove_favorite, remove_route_stop,
};
use crate::delivery::http::v1::middleware::auth_middleware;
use crate::delivery::http::v1::reports::{create_report, delete_report, list_reports, update_report};
use crate::delivery::http::v1::reviews::{create_review, delete_review, get_my_review, list_reviews};
use crate::delivery::http::v1::search::search_locations;
use crate::repository::postgres::{
    create_pool, MembershipTable, PostgresLocationRepository, PostgresMembershipRepository,
    PostgresReportRepository, PostgresReviewRepository,
};
use crate::usecase::cache::TtlCache;
use crate::usecase::jwt::JwtService;
use crate::usecase::locations::LocationsUseCase;
use crate::usecase::memberships::MembershipsUseCase;
use crate::usecase::reports::ReportsUseCase;
use crate::usecase::reviews::ReviewsUseCase;
use crate::usecase::search::SearchUseCase;

type Memberships = MembershipsUseCase<PostgresMembershipRepository, PostgresLocationRepository>;

pub struct AppState {
    pub search_usecase: SearchUseCase<PostgresLocationRepository>,
    pub locations_usecase: LocationsUseCase<PostgresLocationRepository, PostgresReviewRepository>,
    pub reviews_usecase: ReviewsUseCase<PostgresReviewRepository, PostgresLocationRepository>,
    pub reports_usecase: ReportsUseCase<PostgresReportRepository, PostgresLocationRepository>,
    pub favorites_usecase: Memberships,
    pub route_usecase: Memberships,
    pub jwt_service: JwtService,
    pub metrics_handle: PrometheusHandle,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::AppConfig::from_env()?;

    let tracer_provider = telemetry::init_tracing(&config)?;

    tracing::info!("starting the locations service");

    let metrics_handle = PrometheusBuilder::new().install_recorder()?;
    metrics_process::Collector::default().describe();
    tracing::info!("prometheus metrics initialized");

    let timezone = config.timezone()?;
    tracing::info!(
        telemetry_enabled = config.telemetry_enabled,
        %timezone,
        cache_ttl_secs = config.cache_ttl_secs,
        "config loaded"
    );

    let pool = create_pool(&config.database_url, config.database_max_connections).await?;
    tracing::info!("database pool created");

    sqlx::migrate!().run(&pool).await?;
    tracing::info!("database migrations applied");

    let locations = || PostgresLocationRepository::new(pool.clone(), config.database_retry_attempts);

    let search_cache = TtlCache::new("search", config.cache_ttl());
    let location_cache = TtlCache::new("location", config.cache_ttl());

    let shared_state = Arc::new(AppState {
        search_usecase: SearchUseCase::new(locations(), search_cache.clone(), timezone),
        locations_usecase: LocationsUseCase::new(
            locations(),
            PostgresReviewRepository::new(pool.clone()),
            location_cache.clone(),
            timezone,
        ),
        reviews_usecase: ReviewsUseCase::new(
            PostgresReviewRepository::new(pool.clone()),
            locations(),
            search_cache,
            location_cache,
        ),
        reports_usecase: ReportsUseCase::new(PostgresReportRepository::new(pool.clone()), locations()),
        favorites_usecase: MembershipsUseCase::new(
            "favorites",
            PostgresMembershipRepository::new(pool.clone(), MembershipTable::Favorites),
            locations(),
        ),
        route_usecase: MembershipsUseCase::new(
            "route",
            PostgresMembershipRepository::new(pool.clone(), MembershipTable::RouteStops),
            locations(),
        ),
        jwt_service: JwtService::new(config.jwt_secret.clone()),
        metrics_handle,
    });

    let auth = middleware::from_fn_with_state(shared_state.clone(), auth_middleware);

    let public_api = Router::new()
        .route("/api/v1/search", get(search_locations))
        .route("/api/v1/categories", get(list_categories))
        .route("/api/v1/aspects", get(list_aspects))
        .route("/api/v1/locations/{id}", get(get_location))
        // Reading reviews is public; writing one is not.
        .route(
            "/api/v1/locations/{id}/reviews",
            get(list_reviews).merge(post(create_review).layer(auth.clone())),
        );

    let user_api = Router::new()
        .route("/api/v1/locations/{id}/reviews/mine", get(get_my_review))
        .route("/api/v1/reviews/{id}", delete(delete_review))
        .route("/api/v1/locations/{id}/reports", post(create_report))
        .route("/api/v1/reports", get(list_reports))
        .route("/api/v1/reports/{id}", put(update_report).delete(delete_report))
        .route("/api/v1/favorites", get(list_favorites))
        .route(
            "/api/v1/favorites/{location_id}",
            post(add_favorite).delete(remove_favorite),
        )
        .route("/api/v1/route", get(get_route))
        .route(
            "/api/v1/route/stops/{location_id}",
            post(add_route_stop).delete(remove_route_stop),
        )
        .layer(auth);

    let router = Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .merge(public_api)
        .merge(user_api)
        .layer(TraceLayer::new_for_http())
        .with_state(shared_state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    tracing::info!(listen_addr = %config.listen_addr, "locations service running");
    axum::serve(listener, router).await?;

    if let Some(provider) = tracer_provider {
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error = %e, "tracer provider shutdown failed");
        }
    }

    Ok(())
}

async fn metrics(State(state): State<Arc<AppState>>) -> String {
    metrics_process::Collector::default().collect();
    state.metrics_handle.render()
}

#[tracing::instrument]
async fn healthz() -> &'static str {
    "OK"
}
