//! Represents an uploaded file and its metadata record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::file_kind::FileKind;

/// A single user-uploaded file.
///
/// The struct stores metadata only; the content bytes live in the object
/// store under `storage_key`.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq)]
pub struct Asset {
    /// Identifier assigned on insert.
    pub id: Uuid,

    /// Display name chosen at upload time.
    pub name: String,

    /// MIME type captured from the uploaded file.
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub content_type: String,

    /// Lower-cased filename suffix, if the filename had one.
    pub extension: Option<String>,

    /// `<owner_id>/<upload_millis>_<filename>` path into the object store.
    pub storage_key: String,

    /// Object store bucket the payload was written to.
    pub bucket: String,

    /// Free-text labels, ordered as entered.
    #[sqlx(json)]
    pub tags: Vec<String>,

    /// Always 1; nothing increments it yet.
    pub version: i64,

    /// Owner id, immutable after creation.
    pub uploaded_by: String,

    /// Containing folder, `None` when unfiled.
    pub folder_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Asset {
    /// Preview classification derived from the stored extension.
    pub fn kind(&self) -> FileKind {
        FileKind::classify(self.extension.as_deref())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Filter accepted by asset listing. Empty strings count as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetFilter {
    pub search: Option<String>,
    pub tag: Option<String>,
}

impl AssetFilter {
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref().filter(|t| !t.is_empty())
    }
}

/// The raw file handed to an upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: bytes::Bytes,
}

/// Everything an upload needs besides the session.
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub file: UploadFile,
    pub display_name: String,
    pub tags: Vec<String>,
}

/// Split a comma-separated tag string into trimmed, non-empty labels.
pub fn parse_tags(input: &str) -> Vec<String> {
    normalize_tags(input.split(','))
}

/// Trim labels, drop empties and repeats, keep first-seen order.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

/// Lower-cased suffix after the last `.`, if any.
pub fn extension_of(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
        .map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_tags() {
        assert_eq!(parse_tags("q1, finance"), vec!["q1", "finance"]);
        assert_eq!(parse_tags(" , a,,b , a "), vec!["a", "b"]);
        assert!(parse_tags("").is_empty());
    }

    #[test]
    fn extension_is_lower_cased_suffix() {
        assert_eq!(extension_of("report.PDF").as_deref(), Some("pdf"));
        assert_eq!(extension_of("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(extension_of("README"), None);
        assert_eq!(extension_of("trailing."), None);
    }
}
