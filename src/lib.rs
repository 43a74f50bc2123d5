//! Internal asset library: folders of uploaded files with signed previews,
//! backed by SQLite metadata and a local-disk object store.

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use std::{path::PathBuf, sync::Arc};

use sqlx::SqlitePool;

use config::AppConfig;
use services::{
    asset_repository::AssetRepository, auth_service::AuthService,
    folder_repository::FolderRepository, object_store::LocalObjectStore, url_signer::UrlSigner,
};
use state::AppState;

/// Wire repositories and collaborators for a configured service.
pub fn build_state(cfg: &AppConfig, db: Arc<SqlitePool>) -> AppState {
    let signer = Arc::new(UrlSigner::new(&cfg.signing_secret, &cfg.public_url));
    let objects = Arc::new(LocalObjectStore::new(
        &cfg.storage_dir,
        &cfg.bucket,
        signer.clone(),
    ));

    AppState {
        db: db.clone(),
        storage_dir: PathBuf::from(&cfg.storage_dir),
        assets: AssetRepository::new(db.clone(), objects.clone(), &cfg.bucket, cfg.signed_url_ttl),
        folders: FolderRepository::new(db.clone()),
        sessions: Arc::new(AuthService::new(db, &cfg.public_url)),
        objects,
        signer,
    }
}
