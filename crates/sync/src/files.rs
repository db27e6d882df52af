//! Local directory scanning.

use std::path::Path;

use thiserror::Error;

use media_sync_core::LocalFile;

/// Errors that can occur while scanning the input directory.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("input directory not found: {0}")]
    MissingDirectory(String),
    #[error("failed to read {0}: {1}")]
    Io(String, #[source] std::io::Error),
}

/// Extensions recognized as uploadable media, with their MIME types.
const MEDIA_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("avif", "image/avif"),
    ("mp4", "video/mp4"),
    ("mov", "video/quicktime"),
    ("webm", "video/webm"),
];

/// MIME type for a filename, when its extension is a recognized media type.
#[must_use]
pub fn mime_for(filename: &str) -> Option<&'static str> {
    let ext = filename.rsplit_once('.')?.1.to_ascii_lowercase();
    MEDIA_TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
}

/// Collect the media files in `dir`, sorted by basename.
///
/// Non-media files and subdirectories are skipped. `limit` caps the number
/// of files taken, applied after sorting.
///
/// # Errors
///
/// Returns [`ScanError::MissingDirectory`] if `dir` does not exist or is not
/// a directory, [`ScanError::Io`] on read failures.
pub fn scan_dir(dir: impl AsRef<Path>, limit: Option<usize>) -> Result<Vec<LocalFile>, ScanError> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(ScanError::MissingDirectory(dir.display().to_string()));
    }

    let entries = std::fs::read_dir(dir)
        .map_err(|e| ScanError::Io(dir.display().to_string(), e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ScanError::Io(dir.display().to_string(), e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let basename = entry.file_name().to_string_lossy().into_owned();
        let Some(mime_type) = mime_for(&basename) else {
            tracing::debug!(file = %basename, "skipping non-media file");
            continue;
        };
        let metadata = entry
            .metadata()
            .map_err(|e| ScanError::Io(path.display().to_string(), e))?;
        files.push(LocalFile {
            path,
            basename,
            size: metadata.len(),
            mime_type: mime_type.to_string(),
        });
    }

    files.sort_by(|a, b| a.basename.cmp(&b.basename));
    if let Some(limit) = limit {
        files.truncate(limit);
    }
    Ok(files)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn mime_mapping() {
        assert_eq!(mime_for("a.JPG"), Some("image/jpeg"));
        assert_eq!(mime_for("clip.mp4"), Some("video/mp4"));
        assert_eq!(mime_for("notes.txt"), None);
        assert_eq!(mime_for("no_extension"), None);
    }

    #[test]
    fn scan_sorts_filters_and_limits() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b_1.jpg", "a.png", "skip.txt", "c.mov"] {
            std::fs::write(dir.path().join(name), b"data").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let files = scan_dir(dir.path(), None).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.basename.as_str()).collect();
        assert_eq!(names, ["a.png", "b_1.jpg", "c.mov"]);
        assert_eq!(files.first().unwrap().size, 4);

        let limited = scan_dir(dir.path(), Some(2)).unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let err = scan_dir("/definitely/not/here", None).unwrap_err();
        assert!(matches!(err, ScanError::MissingDirectory(_)));
    }
}
