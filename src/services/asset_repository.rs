//! src/services/asset_repository.rs
//!
//! AssetRepository composes the SQLite metadata table with the object store
//! into the asset lifecycle: list, upload, move, delete and signed previews.
//!
//! Ordering rule shared by every write here: object content goes in before
//! its metadata row, and the metadata row goes out before its content. A
//! failure in between can leave an unreferenced object behind, never a row
//! pointing at nothing.

use chrono::Utc;
use serde::Serialize;
use sqlx::{QueryBuilder, SqlitePool, sqlite::Sqlite, types::Json};
use std::{sync::Arc, time::Duration};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    error::{LibraryError, LibraryResult},
    object_store::{ObjectStore, PutOptions},
    session::CurrentUser,
    url_signer::SignedUrl,
};
use crate::models::{
    asset::{Asset, AssetFilter, NewAsset, extension_of, normalize_tags},
    file_kind::FileKind,
};

const ASSET_COLUMNS: &str = "id, name, type, extension, storage_key, bucket, tags, version, \
                             uploaded_by, folder_id, created_at, updated_at";

/// What an inline preview should render.
#[derive(Serialize, Clone, Debug)]
pub struct Preview {
    pub asset_id: Uuid,
    pub kind: FileKind,
    /// Present only for kinds that render inline.
    pub url: Option<SignedUrl>,
}

#[derive(Clone)]
pub struct AssetRepository {
    db: Arc<SqlitePool>,
    store: Arc<dyn ObjectStore>,
    bucket: String,
    url_ttl: Duration,
}

impl AssetRepository {
    pub fn new(
        db: Arc<SqlitePool>,
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        url_ttl: Duration,
    ) -> Self {
        Self {
            db,
            store,
            bucket: bucket.into(),
            url_ttl,
        }
    }

    /// List assets, newest `updated_at` first.
    ///
    /// `tag` must equal one of the asset's tags and is matched in SQL.
    /// `search` is a literal substring of `name` under Unicode lowercasing
    /// and is applied to the fetched rows.
    pub async fn list_assets(&self, filter: &AssetFilter) -> LibraryResult<Vec<Asset>> {
        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {ASSET_COLUMNS} FROM assets WHERE 1 = 1"
        ));

        if let Some(tag) = filter.tag() {
            builder.push(
                " AND EXISTS (SELECT 1 FROM json_each(assets.tags) WHERE json_each.value = ",
            );
            builder.push_bind(tag.to_string());
            builder.push(")");
        }

        builder.push(" ORDER BY updated_at DESC, rowid DESC");

        let mut assets = builder
            .build_query_as::<Asset>()
            .fetch_all(&*self.db)
            .await
            .map_err(LibraryError::Query)?;

        if let Some(search) = filter.search() {
            let needle = search.to_lowercase();
            assets.retain(|asset| asset.name.to_lowercase().contains(&needle));
        }

        Ok(assets)
    }

    pub async fn get_asset(&self, id: Uuid) -> LibraryResult<Asset> {
        sqlx::query_as::<_, Asset>(&format!("SELECT {ASSET_COLUMNS} FROM assets WHERE id = ?"))
            .bind(id)
            .fetch_optional(&*self.db)
            .await
            .map_err(LibraryError::Query)?
            .ok_or_else(|| LibraryError::not_found("asset", id))
    }

    /// Upload a file for the session's user.
    ///
    /// Auth and input are validated before any I/O. The storage key keeps the
    /// file name exactly as given; extension and content type come from the
    /// trimmed name. The object is written
    /// with no-overwrite semantics; only after that succeeds is the row
    /// inserted. If the insert fails the object stays behind unreferenced
    /// and the error is still returned.
    pub async fn upload_asset(
        &self,
        session: &impl CurrentUser,
        new: NewAsset,
    ) -> LibraryResult<Asset> {
        let owner = session.require_user()?;

        let display_name = new.display_name.trim();
        if display_name.is_empty() {
            return Err(LibraryError::validation("asset name must not be empty"));
        }
        let original_filename = new.file.filename.as_str();
        let filename = original_filename.trim();
        if filename.is_empty() {
            return Err(LibraryError::validation("file name must not be empty"));
        }
        if filename.contains(['/', '\\']) {
            return Err(LibraryError::validation(
                "file name must not contain path separators",
            ));
        }

        let extension = extension_of(filename);
        let content_type = new
            .file
            .content_type
            .filter(|ct| !ct.trim().is_empty())
            .unwrap_or_else(|| {
                mime_guess::from_path(filename)
                    .first_or_octet_stream()
                    .to_string()
            });
        let tags = normalize_tags(&new.tags);

        let now = Utc::now();
        let storage_key = storage_key_for(&owner.id, now.timestamp_millis(), original_filename);
        let size = new.file.bytes.len();

        self.store
            .put_object(&storage_key, new.file.bytes, PutOptions { overwrite: false })
            .await
            .map_err(LibraryError::StorageWrite)?;

        let inserted = sqlx::query_as::<_, Asset>(&format!(
            "INSERT INTO assets (
                id, name, type, extension, storage_key, bucket, tags, version,
                uploaded_by, folder_id, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?, NULL, ?, ?)
            RETURNING {ASSET_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(display_name)
        .bind(&content_type)
        .bind(&extension)
        .bind(&storage_key)
        .bind(&self.bucket)
        .bind(Json(&tags))
        .bind(&owner.id)
        .bind(now)
        .bind(now)
        .fetch_one(&*self.db)
        .await;

        match inserted {
            Ok(asset) => {
                info!(
                    asset_id = %asset.id,
                    owner = %owner.id,
                    "uploaded {} ({} bytes) to {}",
                    asset.name,
                    size,
                    storage_key
                );
                Ok(asset)
            }
            Err(err) => {
                warn!(
                    storage_key = %storage_key,
                    "metadata insert failed, object left unreferenced: {}",
                    err
                );
                Err(LibraryError::MetadataWrite(err))
            }
        }
    }

    /// Point an asset at a folder, or at none.
    ///
    /// Moving to the folder it is already in returns the asset without a
    /// write. A target folder that does not exist is `NotFound`.
    pub async fn move_asset(&self, id: Uuid, target: Option<Uuid>) -> LibraryResult<Asset> {
        let current = self.get_asset(id).await?;
        if current.folder_id == target {
            debug!(asset_id = %id, "move skipped, already in target folder");
            return Ok(current);
        }

        if let Some(folder_id) = target {
            let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM folders WHERE id = ?")
                .bind(folder_id)
                .fetch_optional(&*self.db)
                .await
                .map_err(LibraryError::Query)?;
            if exists.is_none() {
                return Err(LibraryError::not_found("folder", folder_id));
            }
        }

        let moved = sqlx::query_as::<_, Asset>(&format!(
            "UPDATE assets SET folder_id = ?, updated_at = ? WHERE id = ?
             RETURNING {ASSET_COLUMNS}"
        ))
        .bind(target)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&*self.db)
        .await
        .map_err(LibraryError::MetadataWrite)?
        .ok_or_else(|| LibraryError::not_found("asset", id))?;

        info!(asset_id = %id, folder_id = ?target, "moved asset");
        Ok(moved)
    }

    /// Delete the row, then the object. A failed object delete is logged
    /// and does not fail the call.
    pub async fn delete_asset(&self, id: Uuid) -> LibraryResult<Asset> {
        let deleted = sqlx::query_as::<_, Asset>(&format!(
            "DELETE FROM assets WHERE id = ? RETURNING {ASSET_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&*self.db)
        .await
        .map_err(LibraryError::MetadataWrite)?
        .ok_or_else(|| LibraryError::not_found("asset", id))?;

        if let Err(err) = self.store.delete_object(&deleted.storage_key).await {
            warn!(
                storage_key = %deleted.storage_key,
                "asset row deleted but object removal failed: {}",
                err
            );
        }

        info!(asset_id = %id, "deleted asset");
        Ok(deleted)
    }

    /// A fresh signed URL for the asset's content.
    ///
    /// Nothing is cached: call this immediately before opening the URL,
    /// since it stops resolving once the TTL passes.
    pub async fn get_preview_url(&self, id: Uuid) -> LibraryResult<SignedUrl> {
        let asset = self.get_asset(id).await?;
        self.signed_url_for(&asset).await
    }

    /// Inline preview data. Only image, video and pdf assets fetch a URL.
    pub async fn inline_preview(&self, id: Uuid) -> LibraryResult<Preview> {
        let asset = self.get_asset(id).await?;
        let kind = asset.kind();
        let url = if kind.previews_inline() {
            Some(self.signed_url_for(&asset).await?)
        } else {
            None
        };
        Ok(Preview {
            asset_id: asset.id,
            kind,
            url,
        })
    }

    async fn signed_url_for(&self, asset: &Asset) -> LibraryResult<SignedUrl> {
        self.store
            .signed_url(&asset.storage_key, self.url_ttl)
            .await
            .map_err(LibraryError::StorageRead)
    }
}

/// `<owner>/<millis>_<filename>`. The owner prefix lets storage access be
/// scoped per user by path alone.
pub fn storage_key_for(owner_id: &str, millis: i64, filename: &str) -> String {
    format!("{}/{}_{}", owner_id, millis, filename)
}
