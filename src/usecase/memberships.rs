use uuid::Uuid;

use crate::domain::location::Location;
use crate::domain::membership::Membership;
use crate::repository::errors::RepositoryError;
use crate::usecase::contracts::{LocationRepository, MembershipRepository};
use crate::usecase::error::UsecaseError;

/// Per-user set of locations. One instance serves favorites and another
/// serves route stops; `kind` names the set in errors and logs.
pub struct MembershipsUseCase<M, L>
where
    M: MembershipRepository,
    L: LocationRepository,
{
    kind: &'static str,
    membership_repository: M,
    location_repository: L,
}

impl<M, L> MembershipsUseCase<M, L>
where
    M: MembershipRepository,
    L: LocationRepository,
{
    pub fn new(kind: &'static str, membership_repository: M, location_repository: L) -> Self {
        Self {
            kind,
            membership_repository,
            location_repository,
        }
    }

    #[tracing::instrument(skip(self), fields(kind = self.kind, user_id = %user_id, location_id = %location_id))]
    pub async fn add(&self, user_id: Uuid, location_id: Uuid) -> Result<Membership, UsecaseError> {
        self.location_repository
            .find_by_id(location_id)
            .await?
            .ok_or_else(|| UsecaseError::NotFound("Location".to_string()))?;

        let membership = Membership::new(user_id, location_id);
        self.membership_repository
            .create(&membership)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => UsecaseError::Conflict(format!("Location already in {}", self.kind)),
                other => other.into(),
            })?;

        tracing::info!(membership_id = %membership.id, "location added");
        Ok(membership)
    }

    #[tracing::instrument(skip(self), fields(kind = self.kind, user_id = %user_id, location_id = %location_id))]
    pub async fn remove(&self, user_id: Uuid, location_id: Uuid) -> Result<(), UsecaseError> {
        self.membership_repository
            .delete_by_user_and_location(user_id, location_id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => UsecaseError::NotFound(format!("Location in {}", self.kind)),
                other => other.into(),
            })?;

        tracing::info!("location removed");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(kind = self.kind, user_id = %user_id))]
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Location>, UsecaseError> {
        let locations = self.membership_repository.find_locations_by_user_id(user_id).await?;
        tracing::debug!(count = locations.len(), "retrieved locations");
        Ok(locations)
    }
}
