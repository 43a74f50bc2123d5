//! Defines routes for the asset library API.
//!
//! ## Structure
//! - **Auth**
//!   - `POST /auth/magic-link` - issue a sign-in link
//!   - `GET  /auth/verify`     - redeem a link for a bearer token
//!   - `GET  /auth/user`       - current user, if any
//!   - `POST /auth/sign-out`
//!
//! - **Assets**
//!   - `GET    /assets`                  - list (`search`, `tag`, `folder`)
//!   - `POST   /assets`                  - multipart upload
//!   - `DELETE /assets/{id}`
//!   - `PUT    /assets/{id}/folder`      - move into a folder or un-file
//!   - `GET    /assets/{id}/download-url`
//!   - `GET    /assets/{id}/preview`
//!
//! - **Folders**
//!   - `GET /folders`, `POST /folders`, `PUT /folders/{id}`, `DELETE /folders/{id}`
//!
//! - **Objects**
//!   - `GET /objects/{*key}` - signed payload download; `*key` spans `owner/file` paths.

use crate::{
    handlers::{
        asset_handlers::{delete_asset, download_url, list_assets, move_asset, preview, upload_asset},
        auth_handlers::{current_user, request_magic_link, sign_out, verify_magic_link},
        folder_handlers::{create_folder, delete_folder, list_folders, rename_folder},
        health_handlers::{healthz, readyz},
        object_handlers::get_object,
    },
    state::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
};

/// Build the router. `max_upload_bytes` caps multipart bodies.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // auth
        .route("/auth/magic-link", post(request_magic_link))
        .route("/auth/verify", get(verify_magic_link))
        .route("/auth/user", get(current_user))
        .route("/auth/sign-out", post(sign_out))
        // assets
        .route(
            "/assets",
            get(list_assets)
                .post(upload_asset)
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/assets/{id}", delete(delete_asset))
        .route("/assets/{id}/folder", put(move_asset))
        .route("/assets/{id}/download-url", get(download_url))
        .route("/assets/{id}/preview", get(preview))
        // folders
        .route("/folders", get(list_folders).post(create_folder))
        .route("/folders/{id}", put(rename_folder).delete(delete_folder))
        // signed object downloads
        .route("/objects/{*key}", get(get_object))
}
