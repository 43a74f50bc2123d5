//! Failure taxonomy shared by the asset and folder repositories.

use thiserror::Error;

use super::object_store::ObjectStoreError;

/// Every repository call returns one of these; nothing is retried or
/// swallowed on the way up.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("you must be signed in to do that")]
    AuthRequired,
    #[error("{0}")]
    Validation(String),
    #[error("storage write failed: {0}")]
    StorageWrite(#[source] ObjectStoreError),
    #[error("storage read failed: {0}")]
    StorageRead(#[source] ObjectStoreError),
    #[error("metadata write failed: {0}")]
    MetadataWrite(#[source] sqlx::Error),
    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),
    #[error("{entity} `{id}` not found")]
    NotFound { entity: &'static str, id: String },
}

impl LibraryError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

pub type LibraryResult<T> = Result<T, LibraryError>;
