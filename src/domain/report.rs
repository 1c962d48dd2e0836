use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Report {
    pub id: Uuid,
    pub location_id: Uuid,
    pub user_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Report {
    pub fn new(location_id: Uuid, user_id: Uuid, body: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            location_id,
            user_id,
            body,
            created_at: Utc::now(),
        }
    }
}
