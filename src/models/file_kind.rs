//! Preview classification for uploaded files.

use serde::Serialize;

/// How an asset is rendered in a preview.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Video,
    Pdf,
    Document,
    Other,
}

impl FileKind {
    /// Classify a file extension. Total: missing or unknown input is `Other`.
    pub fn classify(extension: Option<&str>) -> Self {
        let Some(ext) = extension else {
            return FileKind::Other;
        };
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "webp" => FileKind::Image,
            "mp4" | "webm" => FileKind::Video,
            "pdf" => FileKind::Pdf,
            "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx" => FileKind::Document,
            _ => FileKind::Other,
        }
    }

    /// Whether an inline preview fetches a signed URL. Documents and other
    /// files only get one on explicit download.
    pub fn previews_inline(self) -> bool {
        matches!(self, FileKind::Image | FileKind::Video | FileKind::Pdf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_extensions() {
        assert_eq!(FileKind::classify(Some("jpg")), FileKind::Image);
        assert_eq!(FileKind::classify(Some("WEBP")), FileKind::Image);
        assert_eq!(FileKind::classify(Some("webm")), FileKind::Video);
        assert_eq!(FileKind::classify(Some("PDF")), FileKind::Pdf);
        assert_eq!(FileKind::classify(Some("pptx")), FileKind::Document);
        assert_eq!(FileKind::classify(Some("xls")), FileKind::Document);
    }

    #[test]
    fn missing_or_unknown_is_other() {
        assert_eq!(FileKind::classify(None), FileKind::Other);
        assert_eq!(FileKind::classify(Some("")), FileKind::Other);
        assert_eq!(FileKind::classify(Some("tar.gz")), FileKind::Other);
        assert_eq!(FileKind::classify(Some("exe")), FileKind::Other);
    }

    #[test]
    fn only_media_previews_inline() {
        assert!(FileKind::Image.previews_inline());
        assert!(FileKind::Video.previews_inline());
        assert!(FileKind::Pdf.previews_inline());
        assert!(!FileKind::Document.previews_inline());
        assert!(!FileKind::Other.previews_inline());
    }
}
