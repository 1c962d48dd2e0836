use std::str::FromStr;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::location::GeoPoint;

/// Locations with fewer reviews never show up in search.
pub const MIN_REVIEW_COUNT: i64 = 4;
/// An aspect filter matches only ratings at or above this value.
pub const ASPECT_RATING_THRESHOLD: i16 = 5;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoFilter {
    pub center: GeoPoint,
    pub radius_km: f64,
}

impl GeoFilter {
    pub fn new(latitude: Option<f64>, longitude: Option<f64>, radius_km: Option<f64>) -> Option<Self> {
        let center = GeoPoint::new(latitude?, longitude?)?;
        let radius_km = radius_km.filter(|r| r.is_finite() && *r > 0.0)?;
        Some(Self { center, radius_km })
    }
}

/// Every active field narrows the result set; inactive fields are `None` or
/// empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchFilter {
    pub name: Option<String>,
    pub geo: Option<GeoFilter>,
    pub category_ids: Vec<Uuid>,
    pub aspect_ids: Vec<Uuid>,
    pub open_now: bool,
}

impl SearchFilter {
    pub fn new(
        name: Option<String>,
        geo: Option<GeoFilter>,
        category_ids: Vec<Uuid>,
        aspect_ids: Vec<Uuid>,
        open_now: bool,
    ) -> Self {
        Self {
            name: name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            geo,
            category_ids: dedup(category_ids),
            aspect_ids: dedup(aspect_ids),
            open_now,
        }
    }

    pub fn cache_key(&self, pagination: &Pagination) -> String {
        format!(
            "search:{}:{}:{}",
            serde_json::to_string(self).unwrap_or_default(),
            pagination.page,
            pagination.per_page
        )
    }
}

fn dedup(mut ids: Vec<Uuid>) -> Vec<Uuid> {
    ids.sort();
    ids.dedup();
    ids
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl Pagination {
    /// Out-of-range values fall back to the defaults or are clamped.
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.filter(|p| *p >= 1).unwrap_or(DEFAULT_PAGE),
            per_page: per_page
                .filter(|p| *p >= 1)
                .map(|p| p.min(MAX_PER_PAGE))
                .unwrap_or(DEFAULT_PER_PAGE),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }

    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        let offset = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        items.into_iter().skip(offset).take(self.per_page as usize).collect()
    }
}

/// Lenient scalar parsing: blank, malformed and non-finite input all read
/// as absent.
pub fn parse_param<T: FromStr>(raw: Option<&str>) -> Option<T> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

pub fn parse_coordinate(raw: Option<&str>) -> Option<f64> {
    parse_param::<f64>(raw).filter(|v| v.is_finite())
}

/// Comma-separated identifiers; malformed members are skipped.
pub fn parse_id_list(raw: Option<&str>) -> Vec<Uuid> {
    raw.map(|s| s.split(',').filter_map(|id| Uuid::parse_str(id.trim()).ok()).collect())
        .unwrap_or_default()
}

pub fn parse_flag(raw: Option<&str>) -> bool {
    matches!(
        raw.map(|s| s.trim().to_ascii_lowercase()).as_deref(),
        Some("true" | "1" | "yes" | "on")
    )
}
