//! HTTP handlers for asset operations. Storage and metadata concerns are
//! delegated to `AssetRepository`.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    errors::AppError,
    models::{
        asset::{Asset, AssetFilter, NewAsset, UploadFile, parse_tags},
        file_kind::FileKind,
        folder::resolve_folder,
    },
    services::{
        asset_repository::Preview,
        session::{CurrentUser, Session},
        url_signer::SignedUrl,
    },
    state::AppState,
};

/// Query params accepted by `GET /assets`.
#[derive(Debug, Deserialize)]
pub struct ListAssetsQuery {
    pub search: Option<String>,
    pub tag: Option<String>,
    pub folder: Option<Uuid>,
}

/// Body for `PUT /assets/{id}/folder`. `null` un-files the asset.
#[derive(Debug, Deserialize)]
pub struct MoveAssetReq {
    pub folder_id: Option<Uuid>,
}

/// An asset as listed: the row plus its preview kind and folder name.
#[derive(Debug, Serialize)]
pub struct AssetListing {
    #[serde(flatten)]
    pub asset: Asset,
    pub kind: FileKind,
    /// `None` when unfiled, including when the folder was deleted.
    pub folder_name: Option<String>,
}

/// `GET /assets`: newest first, optionally filtered by name, tag and folder.
///
/// A `folder` that does not resolve lists everything, same as no folder.
pub async fn list_assets(
    State(state): State<AppState>,
    Query(q): Query<ListAssetsQuery>,
) -> Result<Json<Vec<AssetListing>>, AppError> {
    let filter = AssetFilter {
        search: q.search,
        tag: q.tag,
    };
    let assets = state.assets.list_assets(&filter).await?;
    let folders = state.folders.list_folders().await?;
    let selected = resolve_folder(&folders, q.folder).map(|f| f.id);

    let listings = assets
        .into_iter()
        .filter(|a| selected.is_none() || a.folder_id == selected)
        .map(|asset| {
            let folder_name = resolve_folder(&folders, asset.folder_id).map(|f| f.name.clone());
            AssetListing {
                kind: asset.kind(),
                asset,
                folder_name,
            }
        })
        .collect();

    Ok(Json(listings))
}

/// `POST /assets`: multipart upload with `file`, `name` and `tags` fields.
///
/// `name` defaults to the file's own name; `tags` is comma separated.
pub async fn upload_asset(
    State(state): State<AppState>,
    session: Session,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    session.require_user()?;

    let mut file: Option<UploadFile> = None;
    let mut name: Option<String> = None;
    let mut tags = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                file = Some(UploadFile {
                    filename,
                    content_type,
                    bytes,
                });
            }
            Some("name") => name = Some(field.text().await?),
            Some("tags") => tags = parse_tags(&field.text().await?),
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::bad_request("missing `file` field"))?;
    let display_name = name.unwrap_or_else(|| file.filename.clone());
    let asset = state
        .assets
        .upload_asset(
            &session,
            NewAsset {
                file,
                display_name,
                tags,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(asset)))
}

/// `PUT /assets/{id}/folder`
pub async fn move_asset(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(req): Json<MoveAssetReq>,
) -> Result<Json<Asset>, AppError> {
    session.require_user()?;
    let asset = state.assets.move_asset(id, req.folder_id).await?;
    Ok(Json(asset))
}

/// `DELETE /assets/{id}`
pub async fn delete_asset(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    session.require_user()?;
    state.assets.delete_asset(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /assets/{id}/download-url`: a fresh signed URL on every call.
pub async fn download_url(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SignedUrl>, AppError> {
    Ok(Json(state.assets.get_preview_url(id).await?))
}

/// `GET /assets/{id}/preview`
pub async fn preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Preview>, AppError> {
    Ok(Json(state.assets.inline_preview(id).await?))
}
