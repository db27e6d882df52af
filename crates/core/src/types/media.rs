//! Entity references and remote media snapshots.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Media content class accepted by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaKind {
    /// Still image (attachable directly by staged source).
    Image,
    /// Video (must be registered and processed before attaching).
    Video,
}

impl MediaKind {
    /// Classify a MIME type string.
    #[must_use]
    pub fn from_mime(mime_type: &str) -> Self {
        if mime_type.starts_with("video/") {
            Self::Video
        } else {
            Self::Image
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image => write!(f, "IMAGE"),
            Self::Video => write!(f, "VIDEO"),
        }
    }
}

/// Remote processing state of a media asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaStatus {
    /// Still uploading or processing.
    Pending,
    /// Terminal: safe to attach and display.
    Ready,
    /// Terminal: processing failed remotely.
    Failed,
}

impl MediaStatus {
    /// Whether this is a terminal processing state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }
}

/// A product reference, optionally paired with one of its variants.
///
/// Owned by the remote catalog; the pipeline only holds references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    /// Product ID (e.g. `gid://shopify/Product/123`).
    pub entity_id: String,
    /// Product title, used to derive media alt labels.
    pub entity_title: String,
    /// Variant ID when resolved through a variant code.
    pub variant_id: Option<String>,
    /// Variant title when resolved through a variant code.
    pub variant_title: Option<String>,
}

impl EntityRef {
    /// Whether this reference carries a variant pairing.
    #[must_use]
    pub const fn is_variant_scoped(&self) -> bool {
        self.variant_id.is_some()
    }
}

/// Read-only snapshot of one media asset on the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAsset {
    /// Media ID (e.g. `gid://shopify/MediaImage/123`).
    pub id: String,
    /// Image or video.
    pub kind: MediaKind,
    /// Alt label as stored remotely.
    pub alt: Option<String>,
    /// Basename of the original upload source, when the catalog exposes it.
    pub source_basename: Option<String>,
    /// Remote processing state at snapshot time.
    pub status: MediaStatus,
}

/// A local media file queued for upload. Read-only input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Absolute or relative path on disk.
    pub path: PathBuf,
    /// Final path component.
    pub basename: String,
    /// Size in bytes.
    pub size: u64,
    /// MIME type derived from the extension.
    pub mime_type: String,
}

impl LocalFile {
    /// Media class this file uploads as.
    #[must_use]
    pub fn kind(&self) -> MediaKind {
        MediaKind::from_mime(&self.mime_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_classification() {
        assert_eq!(MediaKind::from_mime("image/jpeg"), MediaKind::Image);
        assert_eq!(MediaKind::from_mime("video/mp4"), MediaKind::Video);
        assert_eq!(MediaKind::from_mime("application/pdf"), MediaKind::Image);
    }

    #[test]
    fn terminal_states() {
        assert!(MediaStatus::Ready.is_terminal());
        assert!(MediaStatus::Failed.is_terminal());
        assert!(!MediaStatus::Pending.is_terminal());
    }

    #[test]
    fn variant_scoping() {
        let entity = EntityRef {
            entity_id: "gid://shopify/Product/1".to_string(),
            entity_title: "Shirt".to_string(),
            variant_id: None,
            variant_title: None,
        };
        assert!(!entity.is_variant_scoped());

        let variant = EntityRef {
            variant_id: Some("gid://shopify/ProductVariant/2".to_string()),
            variant_title: Some("Blue / M".to_string()),
            ..entity
        };
        assert!(variant.is_variant_scoped());
    }
}
