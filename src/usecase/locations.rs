use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use crate::domain::catalog::{Aspect, AspectRating, Category};
use crate::domain::location::{GeoPoint, Location};
use crate::domain::opening_hours::{HoursGroup, OpenStatus};
use crate::usecase::cache::TtlCache;
use crate::usecase::contracts::{LocationRepository, ReviewRepository};
use crate::usecase::error::UsecaseError;

/// The time-independent part of a location's details.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationRecord {
    pub location: Location,
    pub review_count: i64,
    pub aspect_ratings: Vec<AspectRating>,
}

pub type LocationCache = TtlCache<Uuid, LocationRecord>;

#[derive(Debug, Clone, PartialEq)]
pub struct LocationDetails {
    pub record: LocationRecord,
    pub open_status: OpenStatus,
    pub hours: Vec<HoursGroup>,
    pub distance_km: Option<f64>,
}

pub struct LocationsUseCase<L, R>
where
    L: LocationRepository,
    R: ReviewRepository,
{
    location_repository: L,
    review_repository: R,
    cache: LocationCache,
    timezone: Tz,
}

impl<L, R> LocationsUseCase<L, R>
where
    L: LocationRepository,
    R: ReviewRepository,
{
    pub fn new(location_repository: L, review_repository: R, cache: LocationCache, timezone: Tz) -> Self {
        Self {
            location_repository,
            review_repository,
            cache,
            timezone,
        }
    }

    pub async fn get_location(&self, id: Uuid, origin: Option<GeoPoint>) -> Result<LocationDetails, UsecaseError> {
        self.get_location_at(id, origin, Utc::now()).await
    }

    #[tracing::instrument(skip(self), fields(location_id = %id))]
    pub async fn get_location_at(
        &self,
        id: Uuid,
        origin: Option<GeoPoint>,
        now: DateTime<Utc>,
    ) -> Result<LocationDetails, UsecaseError> {
        tracing::debug!("getting location details");

        let record = match self.cache.get(&id) {
            Some(record) => record,
            None => {
                let record = self.load(id).await?;
                self.cache.insert(id, record.clone());
                record
            }
        };

        let hours = record.location.hours();
        let distance_km = origin.map(|o| o.distance_km(&record.location.position()));

        Ok(LocationDetails {
            open_status: hours.status_at(self.timezone, now),
            hours: hours.grouped(),
            distance_km,
            record,
        })
    }

    async fn load(&self, id: Uuid) -> Result<LocationRecord, UsecaseError> {
        let location = self
            .location_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| UsecaseError::NotFound("Location".to_string()))?;

        let review_count = self.review_repository.count_by_location_id(id).await?;
        let aspect_ratings = self.location_repository.find_aspect_ratings(id).await?;

        tracing::debug!(location_id = %id, review_count, aspects = aspect_ratings.len(), "location loaded");
        Ok(LocationRecord {
            location,
            review_count,
            aspect_ratings,
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, UsecaseError> {
        let categories = self.location_repository.list_categories().await?;
        tracing::debug!(count = categories.len(), "retrieved categories");
        Ok(categories)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_aspects(&self) -> Result<Vec<Aspect>, UsecaseError> {
        let aspects = self.location_repository.list_aspects().await?;
        tracing::debug!(count = aspects.len(), "retrieved aspects");
        Ok(aspects)
    }
}
