use models::error::ValidationError;
use sea_orm::DbErr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("{collection}/{id} was modified concurrently; re-read and retry")]
    Conflict { collection: String, id: String },
    #[error("Commit failed: {0}")]
    CommitFailure(String),
    #[error("Document could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn conflict(collection: &str, id: &str) -> Self {
        Self::Conflict {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    /// Whether re-reading state and retrying the same request can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<DbErr> for Error {
    fn from(err: DbErr) -> Self {
        Self::CommitFailure(err.to_string())
    }
}
