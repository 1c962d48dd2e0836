//! Search query construction.
//!
//! All filter values are bound as parameters; only fixed SQL fragments are
//! pushed as text.

use sqlx::{Postgres, QueryBuilder};

use crate::domain::location::GeoPoint;
use crate::domain::search::{ASPECT_RATING_THRESHOLD, MIN_REVIEW_COUNT, Pagination, SearchFilter};

const SEARCH_COLUMNS: &str = "l.id, l.name, l.latitude, l.longitude, l.category_id, \
     c.name AS category_name, l.rating, l.opening_hours, l.image_urls, rc.review_count";

/// Page query, or the full ordered match set when `pagination` is `None`.
pub fn build_search_query(filter: &SearchFilter, pagination: Option<Pagination>) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT ");
    qb.push(SEARCH_COLUMNS);
    qb.push(", ");
    match &filter.geo {
        Some(geo) => push_distance(&mut qb, geo.center),
        None => {
            qb.push("NULL::float8");
        }
    }
    qb.push(" AS distance_km");

    push_from_and_predicates(&mut qb, filter);

    if filter.geo.is_some() {
        qb.push(" ORDER BY distance_km ASC, l.id");
    } else {
        qb.push(" ORDER BY l.rating DESC NULLS LAST, l.id");
    }

    if let Some(pagination) = pagination {
        qb.push(" LIMIT ");
        qb.push_bind(pagination.limit());
        qb.push(" OFFSET ");
        qb.push_bind(pagination.offset());
    }

    qb
}

pub fn build_count_query(filter: &SearchFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*)");
    push_from_and_predicates(&mut qb, filter);
    qb
}

fn push_from_and_predicates(qb: &mut QueryBuilder<'static, Postgres>, filter: &SearchFilter) {
    qb.push(
        " FROM locations l \
         JOIN (SELECT location_id, COUNT(*) AS review_count FROM reviews GROUP BY location_id) rc \
         ON rc.location_id = l.id \
         LEFT JOIN categories c ON c.id = l.category_id \
         WHERE rc.review_count >= ",
    );
    qb.push_bind(MIN_REVIEW_COUNT);

    if let Some(geo) = &filter.geo {
        qb.push(" AND ");
        push_distance(qb, geo.center);
        qb.push(" <= ");
        qb.push_bind(geo.radius_km);
    }

    if let Some(name) = &filter.name {
        qb.push(" AND l.name ILIKE ");
        qb.push_bind(format!("%{}%", escape_like(name)));
    }

    if !filter.category_ids.is_empty() {
        qb.push(" AND l.category_id = ANY(");
        qb.push_bind(filter.category_ids.clone());
        qb.push(")");
    }

    // Every requested aspect must have its latest rating at or above the
    // threshold: count the qualifying aspects and require all of them.
    if !filter.aspect_ids.is_empty() {
        qb.push(
            " AND (SELECT COUNT(*) FROM (\
             SELECT DISTINCT ON (ar.aspect_id) ar.aspect_id, ar.rating \
             FROM aspect_ratings ar \
             WHERE ar.location_id = l.id AND ar.aspect_id = ANY(",
        );
        qb.push_bind(filter.aspect_ids.clone());
        qb.push(") ORDER BY ar.aspect_id, ar.generated_on DESC) latest WHERE latest.rating >= ");
        qb.push_bind(ASPECT_RATING_THRESHOLD);
        qb.push(") = ");
        qb.push_bind(filter.aspect_ids.len() as i64);
    }
}

/// Haversine distance in km between `l` and `center`, as a SQL expression.
fn push_distance(qb: &mut QueryBuilder<'static, Postgres>, center: GeoPoint) {
    qb.push("(6371.0 * 2 * ASIN(LEAST(1.0, SQRT(POWER(SIN(RADIANS(l.latitude - ");
    qb.push_bind(center.latitude);
    qb.push(") / 2), 2) + COS(RADIANS(");
    qb.push_bind(center.latitude);
    qb.push(")) * COS(RADIANS(l.latitude)) * POWER(SIN(RADIANS(l.longitude - ");
    qb.push_bind(center.longitude);
    qb.push(") / 2), 2)))))");
}

/// Makes `%`, `_` and `\` match literally under the default LIKE escape.
pub fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
