//! Represents a flat, named grouping of assets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A folder. Folders do not nest, and their names need not be unique.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq)]
pub struct Folder {
    pub id: Uuid,

    pub name: String,

    /// Id of the user that created the folder.
    pub created_by: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// Look up the folder an asset points at.
///
/// `None` and ids that no longer resolve (the folder was deleted) both
/// come back as `None`, i.e. unfiled.
pub fn resolve_folder(folders: &[Folder], folder_id: Option<Uuid>) -> Option<&Folder> {
    let id = folder_id?;
    folders.iter().find(|f| f.id == id)
}
