use uuid::Uuid;

use crate::domain::catalog::{Aspect, AspectRating, Category};
use crate::domain::location::{Location, LocationSummary};
use crate::domain::membership::Membership;
use crate::domain::report::Report;
use crate::domain::review::Review;
use crate::domain::search::{Pagination, SearchFilter};
use crate::repository::errors::RepositoryError;

#[cfg_attr(test, mockall::automock)]
pub trait LocationRepository: Send + Sync {
    /// `None` pagination returns every match, in search order.
    async fn search(
        &self,
        filter: &SearchFilter,
        pagination: Option<Pagination>,
    ) -> Result<Vec<LocationSummary>, RepositoryError>;
    async fn count(&self, filter: &SearchFilter) -> Result<i64, RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Location>, RepositoryError>;
    async fn find_aspect_ratings(&self, location_id: Uuid) -> Result<Vec<AspectRating>, RepositoryError>;
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;
    async fn list_aspects(&self) -> Result<Vec<Aspect>, RepositoryError>;
}

/// Mutations recompute the location's aggregate rating in the same
/// transaction and return the new value.
#[cfg_attr(test, mockall::automock)]
pub trait ReviewRepository: Send + Sync {
    async fn upsert_user_review(&self, review: &Review) -> Result<(Review, Option<f64>), RepositoryError>;
    async fn delete(&self, id: Uuid) -> Result<Option<f64>, RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>, RepositoryError>;
    async fn find_by_location_id(&self, location_id: Uuid) -> Result<Vec<Review>, RepositoryError>;
    async fn find_user_review(&self, location_id: Uuid, user_id: Uuid) -> Result<Option<Review>, RepositoryError>;
    async fn count_by_location_id(&self, location_id: Uuid) -> Result<i64, RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
pub trait ReportRepository: Send + Sync {
    async fn create(&self, report: &Report) -> Result<(), RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Report>, RepositoryError>;
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<Report>, RepositoryError>;
    async fn update_body(&self, id: Uuid, body: &str) -> Result<(), RepositoryError>;
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

/// Favorites and route stops share this shape; each has its own table.
#[cfg_attr(test, mockall::automock)]
pub trait MembershipRepository: Send + Sync {
    async fn create(&self, membership: &Membership) -> Result<(), RepositoryError>;
    async fn delete_by_user_and_location(&self, user_id: Uuid, location_id: Uuid) -> Result<(), RepositoryError>;
    async fn find_locations_by_user_id(&self, user_id: Uuid) -> Result<Vec<Location>, RepositoryError>;
}
