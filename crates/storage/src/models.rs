//! Storage models.

use std::path::{Path, PathBuf};
use time::OffsetDateTime;

/// Content type sent to remote stores when the extension is not recognised.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// File metadata returned by storage backends.
///
/// Listings of the artifact pool are made of these; the version resolver only
/// ever looks at [`path`](Self::path).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Relative path from storage root
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modified timestamp
    pub modified: OffsetDateTime,
}
impl FileInfo {
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: OffsetDateTime) -> Self {
        Self { path: path.into(), size, modified }
    }

    /// The path as a UTF-8 string, if it is one.
    ///
    /// Pool filenames are ASCII by convention, anything else can't be a
    /// generated artifact anyway.
    pub fn name(&self) -> Option<&str> {
        self.path.to_str()
    }
}

/// Guess a MIME type from the file extension of `path`.
///
/// Only covers the formats an image pipeline produces; everything else is
/// uploaded as an opaque byte stream.
pub fn content_type_for(path: impl AsRef<Path>) -> &'static str {
    let ext = path.as_ref().extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("json") => "application/json",
        _ => FALLBACK_CONTENT_TYPE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("001_two_sum.png"), "image/png");
        assert_eq!(content_type_for("nested/001_two_sum_v2.PNG"), "image/png");
        assert_eq!(content_type_for("photo.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("notes.txt"), FALLBACK_CONTENT_TYPE);
        assert_eq!(content_type_for("no-extension"), FALLBACK_CONTENT_TYPE);
    }

    #[test]
    fn test_name() {
        let info = FileInfo::new("005_x_v3.png", 10, OffsetDateTime::UNIX_EPOCH);
        assert_eq!(info.name(), Some("005_x_v3.png"));
    }
}
