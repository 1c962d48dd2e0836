use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Aspect {
    pub id: Uuid,
    pub name: String,
}

/// Most recent rating of one aspect for a location.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct AspectRating {
    pub aspect_id: Uuid,
    pub aspect_name: String,
    pub rating: i16,
    pub generated_on: NaiveDate,
}
