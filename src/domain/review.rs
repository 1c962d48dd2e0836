use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MIN_RATING: i16 = 1;
pub const MAX_RATING: i16 = 5;
pub const BODY_MIN_CHARS: usize = 10;
pub const BODY_MAX_CHARS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewSource {
    User,
    External,
}

impl ReviewSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewSource::User => "user",
            ReviewSource::External => "external",
        }
    }
}

impl TryFrom<String> for ReviewSource {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "user" => Ok(ReviewSource::User),
            "external" => Ok(ReviewSource::External),
            other => Err(format!("unknown review source: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Review {
    pub id: Uuid,
    pub location_id: Uuid,
    pub user_id: Option<Uuid>,
    pub author_name: String,
    pub rating: i16,
    pub body: String,
    #[sqlx(try_from = "String")]
    pub source: ReviewSource,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn new_user(
        location_id: Uuid,
        user_id: Uuid,
        author_name: String,
        rating: i16,
        body: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            location_id,
            user_id: Some(user_id),
            author_name,
            rating,
            body,
            source: ReviewSource::User,
            created_at: Utc::now(),
        }
    }

    /// External reviews have no owner inside this system.
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.source == ReviewSource::User && self.user_id == Some(user_id)
    }
}

pub fn is_valid_rating(rating: i16) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&rating)
}

/// Shared by review and report bodies; counts characters, not bytes.
pub fn is_valid_body(body: &str) -> bool {
    (BODY_MIN_CHARS..=BODY_MAX_CHARS).contains(&body.chars().count())
}

/// Arithmetic mean of the ratings, `None` for a location without reviews.
pub fn aggregate_rating(ratings: &[i16]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let sum: f64 = ratings.iter().map(|r| f64::from(*r)).sum();
    Some(sum / ratings.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_review_creation() {
        let location_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let review = Review::new_user(location_id, user_id, "Ann".to_string(), 4, "Lovely park".to_string());

        assert_eq!(review.location_id, location_id);
        assert_eq!(review.user_id, Some(user_id));
        assert_eq!(review.source, ReviewSource::User);
        assert!(review.is_owned_by(user_id));
        assert!(!review.is_owned_by(Uuid::new_v4()));
    }

    #[test]
    fn test_external_review_has_no_owner() {
        let user_id = Uuid::new_v4();
        let mut review = Review::new_user(Uuid::new_v4(), user_id, "Ann".to_string(), 4, "Lovely park".to_string());
        review.source = ReviewSource::External;

        assert!(!review.is_owned_by(user_id));
    }

    #[test]
    fn test_review_source_round_trips_through_text() {
        for source in [ReviewSource::User, ReviewSource::External] {
            assert_eq!(ReviewSource::try_from(source.as_str().to_string()), Ok(source));
        }
        assert!(ReviewSource::try_from("google".to_string()).is_err());
    }

    #[test]
    fn test_rating_bounds() {
        assert!(!is_valid_rating(0));
        assert!(is_valid_rating(1));
        assert!(is_valid_rating(5));
        assert!(!is_valid_rating(6));
    }

    #[test]
    fn test_body_bounds_count_characters() {
        assert!(!is_valid_body("too short"));
        assert!(is_valid_body("ten chars!"));
        assert!(is_valid_body(&"é".repeat(1000)));
        assert!(!is_valid_body(&"a".repeat(1001)));
    }

    #[test]
    fn test_aggregate_rating() {
        assert_eq!(aggregate_rating(&[]), None);
        assert_eq!(aggregate_rating(&[4]), Some(4.0));
        assert_eq!(aggregate_rating(&[5, 4, 3]), Some(4.0));
        assert_eq!(aggregate_rating(&[5, 4]), Some(4.5));
    }

    #[test]
    fn test_aggregate_after_deleting_reviews() {
        let mut ratings = vec![5, 2, 2];

        ratings.remove(0);
        assert_eq!(aggregate_rating(&ratings), Some(2.0));

        ratings.clear();
        assert_eq!(aggregate_rating(&ratings), None);
    }
}
