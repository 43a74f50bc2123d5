use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::services::{
    error::LibraryError,
    object_store::ObjectStoreError,
    session::AuthError,
    url_signer::SignatureError,
};

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal(err.to_string())
    }
}

impl From<LibraryError> for AppError {
    fn from(err: LibraryError) -> Self {
        let status = match &err {
            LibraryError::AuthRequired => StatusCode::UNAUTHORIZED,
            LibraryError::Validation(_) => StatusCode::BAD_REQUEST,
            LibraryError::NotFound { .. } => StatusCode::NOT_FOUND,
            LibraryError::StorageWrite(ObjectStoreError::AlreadyExists(_)) => StatusCode::CONFLICT,
            LibraryError::StorageWrite(ObjectStoreError::InvalidObjectKey) => {
                StatusCode::BAD_REQUEST
            }
            LibraryError::StorageRead(ObjectStoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            LibraryError::StorageWrite(_)
            | LibraryError::StorageRead(_)
            | LibraryError::MetadataWrite(_)
            | LibraryError::Query(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("{}", err);
        }
        AppError::new(status, err.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidEmail(_) => AppError::bad_request(err.to_string()),
            AuthError::InvalidLink => AppError::unauthorized(err.to_string()),
            AuthError::Sqlx(_) => AppError::internal(err.to_string()),
        }
    }
}

impl From<SignatureError> for AppError {
    fn from(err: SignatureError) -> Self {
        AppError::new(StatusCode::FORBIDDEN, err.to_string())
    }
}

impl From<ObjectStoreError> for AppError {
    fn from(err: ObjectStoreError) -> Self {
        match err {
            ObjectStoreError::NotFound(_) => AppError::not_found(err.to_string()),
            ObjectStoreError::InvalidObjectKey => AppError::bad_request(err.to_string()),
            _ => AppError::internal(err.to_string()),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::new(err.status(), err.body_text())
    }
}
