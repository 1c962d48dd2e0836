use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Not found")]
    NotFound,
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db_error) = e.as_database_error() {
            if db_error.is_unique_violation() {
                let constraint = db_error.constraint().unwrap_or("unique constraint");
                return RepositoryError::Conflict(constraint.to_string());
            }
        }

        match e {
            sqlx::Error::RowNotFound => RepositoryError::NotFound,
            other => RepositoryError::DatabaseError(other.to_string()),
        }
    }
}
