use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::opening_hours::OpeningHours;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Returns `None` unless both components are finite and inside their
    /// valid ranges.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);

        valid.then_some(Self {
            latitude,
            longitude,
        })
    }

    /// Great-circle distance in kilometers (haversine).
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlng = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().min(1.0).asin();

        EARTH_RADIUS_KM * c
    }
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub rating: Option<f64>,
    pub opening_hours: Option<Vec<String>>,
    pub image_urls: Vec<String>,
}

impl Location {
    pub fn position(&self) -> GeoPoint {
        GeoPoint {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    pub fn hours(&self) -> OpeningHours {
        OpeningHours::from_entries(self.opening_hours.clone())
    }
}

/// A search result row: the location plus the annotations the search
/// query computes.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct LocationSummary {
    #[sqlx(flatten)]
    pub location: Location,
    pub review_count: i64,
    pub distance_km: Option<f64>,
}
