//! HTTP handlers for folder operations.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    errors::AppError,
    models::folder::Folder,
    services::session::{CurrentUser, Session},
    state::AppState,
};

/// Body for `POST /folders` and `PUT /folders/{id}`.
#[derive(Debug, Deserialize)]
pub struct FolderNameReq {
    pub name: String,
}

/// `GET /folders`: oldest first.
pub async fn list_folders(State(state): State<AppState>) -> Result<Json<Vec<Folder>>, AppError> {
    Ok(Json(state.folders.list_folders().await?))
}

pub async fn create_folder(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<FolderNameReq>,
) -> Result<impl IntoResponse, AppError> {
    let folder = state.folders.create_folder(&session, &req.name).await?;
    Ok((StatusCode::CREATED, Json(folder)))
}

pub async fn rename_folder(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(req): Json<FolderNameReq>,
) -> Result<Json<Folder>, AppError> {
    session.require_user()?;
    Ok(Json(state.folders.rename_folder(id, &req.name).await?))
}

/// `DELETE /folders/{id}`: assets inside keep their (now dangling) folder id.
pub async fn delete_folder(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    session.require_user()?;
    state.folders.delete_folder(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
