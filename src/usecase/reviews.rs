use uuid::Uuid;

use crate::domain::review::{is_valid_body, is_valid_rating, Review, BODY_MAX_CHARS, BODY_MIN_CHARS};
use crate::repository::errors::RepositoryError;
use crate::usecase::contracts::{LocationRepository, ReviewRepository};
use crate::usecase::error::UsecaseError;
use crate::usecase::locations::LocationCache;
use crate::usecase::search::SearchCache;

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewOutcome {
    pub review: Review,
    pub location_rating: Option<f64>,
}

pub struct ReviewsUseCase<Rv, L>
where
    Rv: ReviewRepository,
    L: LocationRepository,
{
    review_repository: Rv,
    location_repository: L,
    search_cache: SearchCache,
    location_cache: LocationCache,
}

impl<Rv, L> ReviewsUseCase<Rv, L>
where
    Rv: ReviewRepository,
    L: LocationRepository,
{
    pub fn new(
        review_repository: Rv,
        location_repository: L,
        search_cache: SearchCache,
        location_cache: LocationCache,
    ) -> Self {
        Self {
            review_repository,
            location_repository,
            search_cache,
            location_cache,
        }
    }

    /// Creates the caller's review, or overwrites it if one already exists.
    #[tracing::instrument(skip(self, author_name, body), fields(location_id = %location_id, user_id = %user_id))]
    pub async fn create_review(
        &self,
        location_id: Uuid,
        user_id: Uuid,
        author_name: String,
        rating: i16,
        body: String,
    ) -> Result<ReviewOutcome, UsecaseError> {
        tracing::debug!("creating review");

        if !is_valid_rating(rating) {
            return Err(UsecaseError::Validation("Rating must be between 1 and 5".to_string()));
        }
        if !is_valid_body(&body) {
            return Err(UsecaseError::Validation(format!(
                "Review must be between {BODY_MIN_CHARS} and {BODY_MAX_CHARS} characters"
            )));
        }

        self.location_repository
            .find_by_id(location_id)
            .await?
            .ok_or_else(|| UsecaseError::NotFound("Location".to_string()))?;

        let review = Review::new_user(location_id, user_id, author_name, rating, body);
        let (stored, location_rating) = self
            .review_repository
            .upsert_user_review(&review)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => UsecaseError::NotFound("Location".to_string()),
                other => other.into(),
            })?;

        self.invalidate(location_id);
        metrics::counter!("review_mutations_total", "action" => "upsert").increment(1);

        tracing::info!(review_id = %stored.id, location_id = %location_id, ?location_rating, "review stored");
        Ok(ReviewOutcome {
            review: stored,
            location_rating,
        })
    }

    #[tracing::instrument(skip(self), fields(location_id = %location_id))]
    pub async fn list_reviews(&self, location_id: Uuid) -> Result<Vec<Review>, UsecaseError> {
        tracing::debug!("listing reviews");

        let reviews = self.review_repository.find_by_location_id(location_id).await?;

        tracing::debug!(count = reviews.len(), "retrieved reviews");
        Ok(reviews)
    }

    #[tracing::instrument(skip(self), fields(location_id = %location_id, user_id = %user_id))]
    pub async fn get_user_review(&self, location_id: Uuid, user_id: Uuid) -> Result<Review, UsecaseError> {
        self.review_repository
            .find_user_review(location_id, user_id)
            .await?
            .ok_or_else(|| UsecaseError::NotFound("Review".to_string()))
    }

    #[tracing::instrument(skip(self), fields(review_id = %review_id, user_id = %user_id))]
    pub async fn delete_review(&self, review_id: Uuid, user_id: Uuid) -> Result<Option<f64>, UsecaseError> {
        tracing::debug!("deleting review");

        let review = self
            .review_repository
            .find_by_id(review_id)
            .await?
            .ok_or_else(|| UsecaseError::NotFound("Review".to_string()))?;

        if !review.is_owned_by(user_id) {
            tracing::warn!(review_id = %review_id, user_id = %user_id, "unauthorized review delete attempt");
            return Err(UsecaseError::Forbidden("Not authorized to delete this review".to_string()));
        }

        let location_rating = self
            .review_repository
            .delete(review_id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => UsecaseError::NotFound("Review".to_string()),
                other => other.into(),
            })?;

        self.invalidate(review.location_id);
        metrics::counter!("review_mutations_total", "action" => "delete").increment(1);

        tracing::info!(review_id = %review_id, ?location_rating, "review deleted");
        Ok(location_rating)
    }

    /// Any search page may contain the location, so those are dropped
    /// wholesale; the details entry is dropped by key.
    fn invalidate(&self, location_id: Uuid) {
        self.search_cache.clear();
        self.location_cache.remove(&location_id);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::location::Location;
    use crate::domain::review::ReviewSource;
    use crate::usecase::cache::TtlCache;
    use crate::usecase::contracts::{MockLocationRepository, MockReviewRepository};
    use crate::usecase::locations::LocationRecord;

    fn make_location(id: Uuid) -> Location {
        Location {
            id,
            name: "Lincoln Park Zoo".to_string(),
            latitude: 41.9211,
            longitude: -87.6340,
            category_id: None,
            category_name: None,
            rating: None,
            opening_hours: None,
            image_urls: vec![],
        }
    }

    fn caches() -> (SearchCache, LocationCache) {
        (
            TtlCache::new("search", Duration::from_secs(60)),
            TtlCache::new("location", Duration::from_secs(60)),
        )
    }

    fn location_repo_with(id: Uuid) -> MockLocationRepository {
        let mut mock_location_repo = MockLocationRepository::new();
        let location = make_location(id);
        mock_location_repo
            .expect_find_by_id()
            .with(mockall::predicate::eq(id))
            .times(1)
            .returning(move |_| Ok(Some(location.clone())));
        mock_location_repo
    }

    const BODY: &str = "Great place for a Sunday walk.";

    #[tokio::test]
    async fn test_create_review_success() {
        let mut mock_review_repo = MockReviewRepository::new();
        let location_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        mock_review_repo
            .expect_upsert_user_review()
            .withf(move |r| r.location_id == location_id && r.user_id == Some(user_id) && r.source == ReviewSource::User)
            .times(1)
            .returning(|r| Ok((r.clone(), Some(4.0))));

        let (search_cache, location_cache) = caches();
        let usecase = ReviewsUseCase::new(
            mock_review_repo,
            location_repo_with(location_id),
            search_cache,
            location_cache,
        );

        let outcome = usecase
            .create_review(location_id, user_id, "Ann".to_string(), 4, BODY.to_string())
            .await
            .unwrap();

        assert_eq!(outcome.review.rating, 4);
        assert_eq!(outcome.location_rating, Some(4.0));
    }

    #[tokio::test]
    async fn test_second_review_overwrites_in_place() {
        let mut mock_review_repo = MockReviewRepository::new();
        let location_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let existing_id = Uuid::new_v4();

        // The store keeps the existing row's identifier on conflict.
        mock_review_repo
            .expect_upsert_user_review()
            .times(1)
            .returning(move |r| {
                let mut stored = r.clone();
                stored.id = existing_id;
                Ok((stored, Some(2.0)))
            });

        let (search_cache, location_cache) = caches();
        let usecase = ReviewsUseCase::new(
            mock_review_repo,
            location_repo_with(location_id),
            search_cache,
            location_cache,
        );

        let outcome = usecase
            .create_review(location_id, user_id, "Ann".to_string(), 2, BODY.to_string())
            .await
            .unwrap();

        assert_eq!(outcome.review.id, existing_id);
        assert_eq!(outcome.review.rating, 2);
    }

    #[tokio::test]
    async fn test_create_review_validation() {
        let (search_cache, location_cache) = caches();
        let usecase = ReviewsUseCase::new(
            MockReviewRepository::new(),
            MockLocationRepository::new(),
            search_cache,
            location_cache,
        );
        let location_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        for rating in [0, 6] {
            let result = usecase
                .create_review(location_id, user_id, "Ann".to_string(), rating, BODY.to_string())
                .await;
            assert!(matches!(result, Err(UsecaseError::Validation(_))));
        }

        let result = usecase
            .create_review(location_id, user_id, "Ann".to_string(), 3, "short".to_string())
            .await;
        assert!(matches!(result, Err(UsecaseError::Validation(_))));

        let result = usecase
            .create_review(location_id, user_id, "Ann".to_string(), 3, "x".repeat(1001))
            .await;
        assert!(matches!(result, Err(UsecaseError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_review_location_not_found() {
        let mut mock_location_repo = MockLocationRepository::new();
        mock_location_repo
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let (search_cache, location_cache) = caches();
        let usecase = ReviewsUseCase::new(
            MockReviewRepository::new(),
            mock_location_repo,
            search_cache,
            location_cache,
        );

        let result = usecase
            .create_review(Uuid::new_v4(), Uuid::new_v4(), "Ann".to_string(), 3, BODY.to_string())
            .await;

        assert!(matches!(result, Err(UsecaseError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_review_mutation_invalidates_caches() {
        let mut mock_review_repo = MockReviewRepository::new();
        let location_id = Uuid::new_v4();
        let other_location_id = Uuid::new_v4();

        mock_review_repo
            .expect_upsert_user_review()
            .times(1)
            .returning(|r| Ok((r.clone(), Some(5.0))));

        let (search_cache, location_cache) = caches();
        search_cache.insert("search:any".to_string(), (vec![], 0));
        for id in [location_id, other_location_id] {
            location_cache.insert(
                id,
                LocationRecord {
                    location: make_location(id),
                    review_count: 4,
                    aspect_ratings: vec![],
                },
            );
        }

        let usecase = ReviewsUseCase::new(
            mock_review_repo,
            location_repo_with(location_id),
            search_cache.clone(),
            location_cache.clone(),
        );

        usecase
            .create_review(location_id, Uuid::new_v4(), "Ann".to_string(), 5, BODY.to_string())
            .await
            .unwrap();

        assert!(search_cache.get(&"search:any".to_string()).is_none());
        assert!(location_cache.get(&location_id).is_none());
        assert!(location_cache.get(&other_location_id).is_some());
    }

    #[tokio::test]
    async fn test_delete_review_by_author() {
        let mut mock_review_repo = MockReviewRepository::new();
        let user_id = Uuid::new_v4();
        let review = Review::new_user(Uuid::new_v4(), user_id, "Ann".to_string(), 5, BODY.to_string());
        let review_id = review.id;

        mock_review_repo
            .expect_find_by_id()
            .with(mockall::predicate::eq(review_id))
            .times(1)
            .returning(move |_| Ok(Some(review.clone())));
        // Deleting the only review leaves no aggregate.
        mock_review_repo
            .expect_delete()
            .with(mockall::predicate::eq(review_id))
            .times(1)
            .returning(|_| Ok(None));

        let (search_cache, location_cache) = caches();
        let usecase = ReviewsUseCase::new(
            mock_review_repo,
            MockLocationRepository::new(),
            search_cache,
            location_cache,
        );

        let rating = usecase.delete_review(review_id, user_id).await.unwrap();
        assert_eq!(rating, None);
    }

    #[tokio::test]
    async fn test_delete_review_forbidden_for_others() {
        let mut mock_review_repo = MockReviewRepository::new();
        let review = Review::new_user(Uuid::new_v4(), Uuid::new_v4(), "Ann".to_string(), 5, BODY.to_string());
        let review_id = review.id;

        mock_review_repo
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(review.clone())));
        mock_review_repo.expect_delete().never();

        let (search_cache, location_cache) = caches();
        let usecase = ReviewsUseCase::new(
            mock_review_repo,
            MockLocationRepository::new(),
            search_cache,
            location_cache,
        );

        let result = usecase.delete_review(review_id, Uuid::new_v4()).await;
        assert!(matches!(result, Err(UsecaseError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_delete_review_not_found() {
        let mut mock_review_repo = MockReviewRepository::new();
        mock_review_repo
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let (search_cache, location_cache) = caches();
        let usecase = ReviewsUseCase::new(
            mock_review_repo,
            MockLocationRepository::new(),
            search_cache,
            location_cache,
        );

        let result = usecase.delete_review(Uuid::new_v4(), Uuid::new_v4()).await;
        assert!(matches!(result, Err(UsecaseError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_user_review_missing() {
        let mut mock_review_repo = MockReviewRepository::new();
        mock_review_repo
            .expect_find_user_review()
            .times(1)
            .returning(|_, _| Ok(None));

        let (search_cache, location_cache) = caches();
        let usecase = ReviewsUseCase::new(
            mock_review_repo,
            MockLocationRepository::new(),
            search_cache,
            location_cache,
        );

        let result = usecase.get_user_review(Uuid::new_v4(), Uuid::new_v4()).await;
        assert!(matches!(result, Err(UsecaseError::NotFound(_))));
    }
}
