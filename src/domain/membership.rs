use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A (user, location) pair. Backs both favorites and route stops, which
/// live in separate tables.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Membership {
    pub id: Uuid,
    pub user_id: Uuid,
    pub location_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Membership {
    pub fn new(user_id: Uuid, location_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            location_id,
            created_at: Utc::now(),
        }
    }
}
