//! Assessment workflow errors.

use talentscope_common::{ApiError, ScoringError};
use talentscope_db::DbError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error(transparent)]
    Store(#[from] DbError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Scoring(e) => e.into(),
            ServiceError::Store(e) => e.into(),
            ServiceError::NotFound(what) => ApiError::NotFound(format!("{what} not found")),
            ServiceError::Forbidden(why) => ApiError::Forbidden(why),
            ServiceError::Validation(why) => ApiError::BadRequest(why),
        }
    }
}
