use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The database rejected the record: {0}")]
    ConstraintViolation(String),
    #[error("{0} was not found")]
    NotFound(String),
    #[error("The {operation} operation did not complete within {seconds}s")]
    Timeout { operation: &'static str, seconds: u64 },
}

impl From<sqlx::Error> for PersistenceError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => PersistenceError::NotFound("Record".to_string()),
            sqlx::Error::Database(ref de)
                if de.is_unique_violation() || de.is_foreign_key_violation() || de.is_check_violation() =>
            {
                PersistenceError::ConstraintViolation(de.message().to_string())
            },
            other => PersistenceError::DatabaseError(other.to_string()),
        }
    }
}
