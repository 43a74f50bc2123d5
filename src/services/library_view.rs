//! Client-side state for the library page.
//!
//! Refreshes are tagged with a request token; only the response to the
//! latest request for a list is applied. A failed refresh records its message
//! and keeps whatever was loaded before.

use uuid::Uuid;

use super::{
    asset_repository::AssetRepository, error::LibraryResult, folder_repository::FolderRepository,
};
use crate::models::{
    asset::{Asset, AssetFilter},
    folder::{Folder, resolve_folder},
};

pub const UNFILED_LABEL: &str = "Unfiled";

/// Monotonic token source for one logical operation.
#[derive(Debug, Default)]
pub struct LatestRequest {
    latest: u64,
}

impl LatestRequest {
    pub fn issue(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn is_current(&self, token: u64) -> bool {
        token == self.latest
    }
}

#[derive(Debug, Default)]
pub struct LibraryView {
    assets: Option<Vec<Asset>>,
    folders: Option<Vec<Folder>>,
    assets_error: Option<String>,
    folders_error: Option<String>,
    selected_folder: Option<Uuid>,
    asset_requests: LatestRequest,
    folder_requests: LatestRequest,
}

impl LibraryView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assets(&self) -> Option<&[Asset]> {
        self.assets.as_deref()
    }

    pub fn folders(&self) -> Option<&[Folder]> {
        self.folders.as_deref()
    }

    pub fn assets_error(&self) -> Option<&str> {
        self.assets_error.as_deref()
    }

    pub fn folders_error(&self) -> Option<&str> {
        self.folders_error.as_deref()
    }

    pub fn select_folder(&mut self, folder_id: Option<Uuid>) {
        self.selected_folder = folder_id;
    }

    /// Start an asset refresh; hand the token back to [`Self::apply_assets`].
    pub fn begin_assets_refresh(&mut self) -> u64 {
        self.asset_requests.issue()
    }

    /// Apply a listing result. Returns false if the response was stale and
    /// ignored.
    pub fn apply_assets(&mut self, token: u64, result: LibraryResult<Vec<Asset>>) -> bool {
        if !self.asset_requests.is_current(token) {
            return false;
        }
        match result {
            Ok(assets) => {
                self.assets = Some(assets);
                self.assets_error = None;
            }
            Err(err) => self.assets_error = Some(err.to_string()),
        }
        true
    }

    pub fn begin_folders_refresh(&mut self) -> u64 {
        self.folder_requests.issue()
    }

    pub fn apply_folders(&mut self, token: u64, result: LibraryResult<Vec<Folder>>) -> bool {
        if !self.folder_requests.is_current(token) {
            return false;
        }
        match result {
            Ok(folders) => {
                self.folders = Some(folders);
                self.folders_error = None;
            }
            Err(err) => self.folders_error = Some(err.to_string()),
        }
        true
    }

    pub async fn refresh_assets(&mut self, repo: &AssetRepository, filter: &AssetFilter) {
        let token = self.begin_assets_refresh();
        let result = repo.list_assets(filter).await;
        self.apply_assets(token, result);
    }

    pub async fn refresh_folders(&mut self, repo: &FolderRepository) {
        let token = self.begin_folders_refresh();
        let result = repo.list_folders().await;
        self.apply_folders(token, result);
    }

    /// Assets in the selected folder. A selection that no longer resolves
    /// falls back to showing everything.
    pub fn visible_assets(&self) -> Vec<&Asset> {
        let Some(assets) = self.assets.as_deref() else {
            return Vec::new();
        };
        let folders = self.folders.as_deref().unwrap_or_default();
        match resolve_folder(folders, self.selected_folder) {
            Some(folder) => assets
                .iter()
                .filter(|a| a.folder_id == Some(folder.id))
                .collect(),
            None => assets.iter().collect(),
        }
    }

    /// Folder name for display, or [`UNFILED_LABEL`] when the asset has no
    /// folder or its folder is gone.
    pub fn folder_label(&self, asset: &Asset) -> &str {
        let folders = self.folders.as_deref().unwrap_or_default();
        resolve_folder(folders, asset.folder_id)
            .map(|f| f.name.as_str())
            .unwrap_or(UNFILED_LABEL)
    }
}
