use thiserror::Error;

use crate::shared::AppError;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Session store error: {0}")]
    Sessions(#[from] AppError),
}

impl From<StatsError> for AppError {
    fn from(error: StatsError) -> Self {
        match error {
            StatsError::Repository(msg) => AppError::DatabaseError(msg),
            StatsError::Sessions(inner) => inner,
        }
    }
}
