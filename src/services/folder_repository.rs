//! Folder lifecycle. Folders never own their assets: deleting one leaves
//! every asset row untouched, with a `folder_id` that no longer resolves.

use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    error::{LibraryError, LibraryResult},
    session::CurrentUser,
};
use crate::models::folder::Folder;

#[derive(Clone)]
pub struct FolderRepository {
    db: Arc<SqlitePool>,
}

impl FolderRepository {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// All folders, oldest first.
    pub async fn list_folders(&self) -> LibraryResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT id, name, created_by, created_at FROM folders
             ORDER BY created_at ASC, rowid ASC",
        )
        .fetch_all(&*self.db)
        .await
        .map_err(LibraryError::Query)
    }

    pub async fn get_folder(&self, id: Uuid) -> LibraryResult<Folder> {
        sqlx::query_as::<_, Folder>(
            "SELECT id, name, created_by, created_at FROM folders WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&*self.db)
        .await
        .map_err(LibraryError::Query)?
        .ok_or_else(|| LibraryError::not_found("folder", id))
    }

    pub async fn create_folder(
        &self,
        session: &impl CurrentUser,
        name: &str,
    ) -> LibraryResult<Folder> {
        let owner = session.require_user()?;
        let name = required_name(name)?;

        let folder = sqlx::query_as::<_, Folder>(
            "INSERT INTO folders (id, name, created_by, created_at) VALUES (?, ?, ?, ?)
             RETURNING id, name, created_by, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(&owner.id)
        .bind(Utc::now())
        .fetch_one(&*self.db)
        .await
        .map_err(LibraryError::MetadataWrite)?;

        info!(folder_id = %folder.id, owner = %owner.id, "created folder {}", folder.name);
        Ok(folder)
    }

    /// Rename a folder. Renaming to the current name skips the write.
    pub async fn rename_folder(&self, id: Uuid, new_name: &str) -> LibraryResult<Folder> {
        let new_name = required_name(new_name)?;
        let current = self.get_folder(id).await?;
        if current.name == new_name {
            debug!(folder_id = %id, "rename skipped, name unchanged");
            return Ok(current);
        }

        let folder = sqlx::query_as::<_, Folder>(
            "UPDATE folders SET name = ? WHERE id = ?
             RETURNING id, name, created_by, created_at",
        )
        .bind(new_name)
        .bind(id)
        .fetch_optional(&*self.db)
        .await
        .map_err(LibraryError::MetadataWrite)?
        .ok_or_else(|| LibraryError::not_found("folder", id))?;

        info!(folder_id = %id, "renamed folder to {}", folder.name);
        Ok(folder)
    }

    /// Delete the folder row only. Assets pointing at it are not modified.
    pub async fn delete_folder(&self, id: Uuid) -> LibraryResult<()> {
        let result = sqlx::query("DELETE FROM folders WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await
            .map_err(LibraryError::MetadataWrite)?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::not_found("folder", id));
        }

        info!(folder_id = %id, "deleted folder");
        Ok(())
    }
}

fn required_name(name: &str) -> LibraryResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        Err(LibraryError::validation("folder name must not be empty"))
    } else {
        Ok(name)
    }
}
