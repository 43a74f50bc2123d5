//! Shared application state and the per-request session extractor.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use sqlx::SqlitePool;
use std::{path::PathBuf, sync::Arc};
use tracing::debug;

use crate::{
    errors::AppError,
    services::{
        asset_repository::AssetRepository,
        folder_repository::FolderRepository,
        object_store::ObjectStore,
        session::{Session, SessionProvider},
        url_signer::UrlSigner,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<SqlitePool>,
    pub storage_dir: PathBuf,
    pub assets: AssetRepository,
    pub folders: FolderRepository,
    pub sessions: Arc<dyn SessionProvider>,
    pub objects: Arc<dyn ObjectStore>,
    pub signer: Arc<UrlSigner>,
}

/// Resolves `Authorization: Bearer <token>` into a [`Session`]. Missing or
/// unknown tokens give an anonymous session; handlers decide whether that
/// is acceptable.
impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
        else {
            return Ok(Session::anonymous());
        };

        match state.sessions.get_current_user(token).await? {
            Some(user) => Ok(Session::signed_in(user).with_token(token)),
            None => {
                debug!("unknown bearer token, treating request as anonymous");
                Ok(Session::anonymous())
            }
        }
    }
}
