mod search;

use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    domain::catalog::{Aspect, AspectRating, Category},
    domain::location::{Location, LocationSummary},
    domain::membership::Membership,
    domain::report::Report,
    domain::review::{aggregate_rating, Review},
    domain::search::{Pagination, SearchFilter},
    repository::errors::RepositoryError,
    repository::retry::with_retry,
    usecase::contracts::{LocationRepository, MembershipRepository, ReportRepository, ReviewRepository},
};

const LOCATION_COLUMNS: &str = "l.id, l.name, l.latitude, l.longitude, l.category_id, \
     c.name AS category_name, l.rating, l.opening_hours, l.image_urls";

const REVIEW_COLUMNS: &str = "id, location_id, user_id, author_name, rating, body, source, created_at";

pub struct PostgresLocationRepository {
    pool: PgPool,
    retry_attempts: u32,
}

impl PostgresLocationRepository {
    pub fn new(pool: PgPool, retry_attempts: u32) -> Self {
        Self { pool, retry_attempts }
    }
}

impl LocationRepository for PostgresLocationRepository {
    #[tracing::instrument(skip(self, filter), fields(open_now = filter.open_now))]
    async fn search(
        &self,
        filter: &SearchFilter,
        pagination: Option<Pagination>,
    ) -> Result<Vec<LocationSummary>, RepositoryError> {
        tracing::debug!(?filter, "searching locations");

        let rows = with_retry(self.retry_attempts, || async move {
            let mut qb = search::build_search_query(filter, pagination);
            qb.build_query_as::<LocationSummary>().fetch_all(&self.pool).await
        })
        .await?;

        tracing::debug!(count = rows.len(), "found locations");
        Ok(rows)
    }

    #[tracing::instrument(skip(self, filter))]
    async fn count(&self, filter: &SearchFilter) -> Result<i64, RepositoryError> {
        tracing::debug!(?filter, "counting locations");

        let count = with_retry(self.retry_attempts, || async move {
            let mut qb = search::build_count_query(filter);
            qb.build_query_scalar::<i64>().fetch_one(&self.pool).await
        })
        .await?;

        tracing::debug!(count, "counted locations");
        Ok(count)
    }

    #[tracing::instrument(skip(self), fields(location_id = %id))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Location>, RepositoryError> {
        tracing::debug!("finding location by id");

        let query = format!(
            "SELECT {LOCATION_COLUMNS} FROM locations l \
             LEFT JOIN categories c ON c.id = l.category_id \
             WHERE l.id = $1"
        );

        let location = with_retry(self.retry_attempts, || {
            sqlx::query_as::<_, Location>(&query)
                .bind(id)
                .fetch_optional(&self.pool)
        })
        .await?;

        Ok(location)
    }

    #[tracing::instrument(skip(self), fields(location_id = %location_id))]
    async fn find_aspect_ratings(&self, location_id: Uuid) -> Result<Vec<AspectRating>, RepositoryError> {
        tracing::debug!("finding latest aspect ratings");

        let ratings = with_retry(self.retry_attempts, || {
            sqlx::query_as::<_, AspectRating>(
                r#"
                SELECT DISTINCT ON (ar.aspect_id)
                       ar.aspect_id, a.name AS aspect_name, ar.rating, ar.generated_on
                FROM aspect_ratings ar
                JOIN aspects a ON a.id = ar.aspect_id
                WHERE ar.location_id = $1
                ORDER BY ar.aspect_id, ar.generated_on DESC
                "#,
            )
            .bind(location_id)
            .fetch_all(&self.pool)
        })
        .await?;

        tracing::debug!(count = ratings.len(), "found aspect ratings");
        Ok(ratings)
    }

    #[tracing::instrument(skip(self))]
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        tracing::debug!("listing categories");

        let categories = with_retry(self.retry_attempts, || {
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY name")
                .fetch_all(&self.pool)
        })
        .await?;

        Ok(categories)
    }

    #[tracing::instrument(skip(self))]
    async fn list_aspects(&self) -> Result<Vec<Aspect>, RepositoryError> {
        tracing::debug!("listing aspects");

        let aspects = with_retry(self.retry_attempts, || {
            sqlx::query_as::<_, Aspect>("SELECT id, name FROM aspects ORDER BY name")
                .fetch_all(&self.pool)
        })
        .await?;

        Ok(aspects)
    }
}

pub struct PostgresReviewRepository {
    pool: PgPool,
}

impl PostgresReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Locks the location row so concurrent review mutations recompute in turn.
async fn lock_location(tx: &mut Transaction<'_, Postgres>, location_id: Uuid) -> Result<(), RepositoryError> {
    sqlx::query("SELECT id FROM locations WHERE id = $1 FOR UPDATE")
        .bind(location_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;
    Ok(())
}

async fn recompute_rating(tx: &mut Transaction<'_, Postgres>, location_id: Uuid) -> Result<Option<f64>, RepositoryError> {
    let ratings: Vec<i16> = sqlx::query_scalar("SELECT rating FROM reviews WHERE location_id = $1")
        .bind(location_id)
        .fetch_all(&mut **tx)
        .await?;

    let aggregate = aggregate_rating(&ratings);

    sqlx::query("UPDATE locations SET rating = $2 WHERE id = $1")
        .bind(location_id)
        .bind(aggregate)
        .execute(&mut **tx)
        .await?;

    tracing::debug!(%location_id, ?aggregate, review_count = ratings.len(), "aggregate rating recomputed");
    Ok(aggregate)
}

impl ReviewRepository for PostgresReviewRepository {
    #[tracing::instrument(skip(self, review), fields(review_id = %review.id, location_id = %review.location_id, rating = review.rating))]
    async fn upsert_user_review(&self, review: &Review) -> Result<(Review, Option<f64>), RepositoryError> {
        tracing::debug!("upserting user review");

        let mut tx = self.pool.begin().await?;
        lock_location(&mut tx, review.location_id).await?;

        let query = format!(
            r#"
            INSERT INTO reviews (id, location_id, user_id, author_name, rating, body, source, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (location_id, user_id) WHERE source = 'user'
            DO UPDATE SET author_name = EXCLUDED.author_name,
                          rating = EXCLUDED.rating,
                          body = EXCLUDED.body,
                          created_at = EXCLUDED.created_at
            RETURNING {REVIEW_COLUMNS}
            "#
        );

        let stored = sqlx::query_as::<_, Review>(&query)
            .bind(review.id)
            .bind(review.location_id)
            .bind(review.user_id)
            .bind(&review.author_name)
            .bind(review.rating)
            .bind(&review.body)
            .bind(review.source.as_str())
            .bind(review.created_at)
            .fetch_one(&mut *tx)
            .await?;

        let aggregate = recompute_rating(&mut tx, review.location_id).await?;
        tx.commit().await?;

        tracing::debug!(review_id = %stored.id, overwritten = stored.id != review.id, "review stored");
        Ok((stored, aggregate))
    }

    #[tracing::instrument(skip(self), fields(review_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<Option<f64>, RepositoryError> {
        tracing::debug!("deleting review");

        let mut tx = self.pool.begin().await?;

        let location_id: Uuid = sqlx::query_scalar("SELECT location_id FROM reviews WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        lock_location(&mut tx, location_id).await?;

        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        let aggregate = recompute_rating(&mut tx, location_id).await?;
        tx.commit().await?;

        tracing::debug!(review_id = %id, "review deleted successfully");
        Ok(aggregate)
    }

    #[tracing::instrument(skip(self), fields(review_id = %id))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>, RepositoryError> {
        tracing::debug!("finding review by id");

        let review = sqlx::query_as::<_, Review>(&format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(review)
    }

    #[tracing::instrument(skip(self), fields(location_id = %location_id))]
    async fn find_by_location_id(&self, location_id: Uuid) -> Result<Vec<Review>, RepositoryError> {
        tracing::debug!("finding reviews by location_id");

        let reviews = sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE location_id = $1 ORDER BY created_at DESC"
        ))
        .bind(location_id)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(count = reviews.len(), "found reviews");
        Ok(reviews)
    }

    #[tracing::instrument(skip(self), fields(location_id = %location_id, user_id = %user_id))]
    async fn find_user_review(&self, location_id: Uuid, user_id: Uuid) -> Result<Option<Review>, RepositoryError> {
        tracing::debug!("finding user review");

        let review = sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews \
             WHERE location_id = $1 AND user_id = $2 AND source = 'user'"
        ))
        .bind(location_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(review)
    }

    #[tracing::instrument(skip(self), fields(location_id = %location_id))]
    async fn count_by_location_id(&self, location_id: Uuid) -> Result<i64, RepositoryError> {
        tracing::debug!("counting reviews by location_id");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE location_id = $1")
            .bind(location_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

pub struct PostgresReportRepository {
    pool: PgPool,
}

impl PostgresReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ReportRepository for PostgresReportRepository {
    #[tracing::instrument(skip(self, report), fields(report_id = %report.id, location_id = %report.location_id, user_id = %report.user_id))]
    async fn create(&self, report: &Report) -> Result<(), RepositoryError> {
        tracing::debug!("creating report");

        sqlx::query(
            r#"
            INSERT INTO reports (id, location_id, user_id, body, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(report.id)
        .bind(report.location_id)
        .bind(report.user_id)
        .bind(&report.body)
        .bind(report.created_at)
        .execute(&self.pool)
        .await?;

        tracing::debug!(report_id = %report.id, "report created successfully");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(report_id = %id))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Report>, RepositoryError> {
        tracing::debug!("finding report by id");

        let report = sqlx::query_as::<_, Report>(
            "SELECT id, location_id, user_id, body, created_at FROM reports WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(report)
    }

    #[tracing::instrument(skip(self), fields(user_id = %user_id))]
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<Report>, RepositoryError> {
        tracing::debug!("finding reports by user_id");

        let reports = sqlx::query_as::<_, Report>(
            r#"
            SELECT id, location_id, user_id, body, created_at
            FROM reports
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(count = reports.len(), "found reports");
        Ok(reports)
    }

    #[tracing::instrument(skip(self, body), fields(report_id = %id))]
    async fn update_body(&self, id: Uuid, body: &str) -> Result<(), RepositoryError> {
        tracing::debug!("updating report body");

        let result = sqlx::query("UPDATE reports SET body = $2 WHERE id = $1")
            .bind(id)
            .bind(body)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(report_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        tracing::debug!("deleting report");

        let result = sqlx::query("DELETE FROM reports WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tracing::debug!(report_id = %id, "report deleted successfully");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipTable {
    Favorites,
    RouteStops,
}

impl MembershipTable {
    fn as_str(&self) -> &'static str {
        match self {
            MembershipTable::Favorites => "favorites",
            MembershipTable::RouteStops => "route_stops",
        }
    }
}

pub struct PostgresMembershipRepository {
    pool: PgPool,
    table: MembershipTable,
}

impl PostgresMembershipRepository {
    pub fn new(pool: PgPool, table: MembershipTable) -> Self {
        Self { pool, table }
    }
}

impl MembershipRepository for PostgresMembershipRepository {
    #[tracing::instrument(skip(self, membership), fields(table = self.table.as_str(), user_id = %membership.user_id, location_id = %membership.location_id))]
    async fn create(&self, membership: &Membership) -> Result<(), RepositoryError> {
        tracing::debug!("creating membership");

        let query = format!(
            "INSERT INTO {} (id, user_id, location_id, created_at) VALUES ($1, $2, $3, $4)",
            self.table.as_str()
        );

        sqlx::query(&query)
            .bind(membership.id)
            .bind(membership.user_id)
            .bind(membership.location_id)
            .bind(membership.created_at)
            .execute(&self.pool)
            .await?;

        tracing::debug!(membership_id = %membership.id, "membership created successfully");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(table = self.table.as_str(), user_id = %user_id, location_id = %location_id))]
    async fn delete_by_user_and_location(&self, user_id: Uuid, location_id: Uuid) -> Result<(), RepositoryError> {
        tracing::debug!("deleting membership");

        let query = format!(
            "DELETE FROM {} WHERE user_id = $1 AND location_id = $2",
            self.table.as_str()
        );

        let result = sqlx::query(&query)
            .bind(user_id)
            .bind(location_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tracing::debug!("membership deleted successfully");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(table = self.table.as_str(), user_id = %user_id))]
    async fn find_locations_by_user_id(&self, user_id: Uuid) -> Result<Vec<Location>, RepositoryError> {
        tracing::debug!("finding member locations");

        let query = format!(
            "SELECT {LOCATION_COLUMNS} FROM {} m \
             JOIN locations l ON l.id = m.location_id \
             LEFT JOIN categories c ON c.id = l.category_id \
             WHERE m.user_id = $1 \
             ORDER BY m.created_at ASC",
            self.table.as_str()
        );

        let locations = sqlx::query_as::<_, Location>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(count = locations.len(), "found member locations");
        Ok(locations)
    }
}

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}
