//! Abstract remote catalog operations consumed by the pipeline.
//!
//! The pipeline never talks to the wire directly; everything it needs from
//! the hosted catalog goes through [`Catalog`]. Production runs use
//! [`crate::shopify::ShopifyClient`]; tests drive the pipeline with an
//! in-memory fake.

use async_trait::async_trait;
use thiserror::Error;

use media_sync_core::{EntityRef, LocalFile, MediaAsset, MediaKind, MediaStatus};

/// One-time upload location allocated by the remote service.
///
/// Single-use and short-lived: created fresh per file, consumed at most
/// once, never persisted. A failed transfer must request a new target.
#[derive(Debug, Clone)]
pub struct StagedTarget {
    /// The URL to upload the file bytes to.
    pub upload_url: String,
    /// The resource URL the remote service assigns after upload completes.
    pub resource_url: String,
    /// Form parameters required by the upload endpoint.
    pub parameters: Vec<(String, String)>,
}

/// Errors that can occur when interacting with the remote catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// File I/O failed while preparing an upload.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the remote service.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication/authorization failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User error from a mutation (e.g., invalid input), verbatim.
    #[error("User error: {0}")]
    UserError(String),

    /// Byte transfer to a staged target returned a non-2xx status.
    #[error("Transfer failed with HTTP status {0}")]
    TransferFailed(u16),
}

impl CatalogError {
    /// Whether a retry of the whole per-file pipeline could plausibly
    /// succeed. Validation-style rejections are not transient.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Io(_) | Self::RateLimited(_) | Self::TransferFailed(_)
        )
    }
}

/// A GraphQL error returned by the remote catalog.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    errors
        .iter()
        .map(|e| e.message.clone())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Remote catalog operations.
///
/// Method granularity mirrors the remote mutations one-to-one; there is no
/// transactional grouping, which is why the orchestrator serializes all
/// calls touching one entity behind a per-entity lock.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Resolve a primary (out-of-band custom identifier) key to an entity.
    async fn lookup_by_key(&self, key: &str) -> Result<Option<EntityRef>, CatalogError>;

    /// Resolve a variant SKU to its owning entity plus the variant pair.
    async fn lookup_by_sku(&self, sku: &str) -> Result<Option<EntityRef>, CatalogError>;

    /// Snapshot the media currently attached to an entity, in display order.
    async fn list_media(&self, entity_id: &str) -> Result<Vec<MediaAsset>, CatalogError>;

    /// Delete media from an entity. Returns the number actually deleted.
    async fn delete_media(
        &self,
        entity_id: &str,
        media_ids: &[String],
    ) -> Result<usize, CatalogError>;

    /// Allocate a one-time upload target sized and typed for a file.
    async fn create_staged_target(
        &self,
        filename: &str,
        mime_type: &str,
        size: u64,
        kind: MediaKind,
    ) -> Result<StagedTarget, CatalogError>;

    /// Stream the file's bytes to the staged target. Success is judged
    /// purely on HTTP status class; never retries internally.
    async fn transfer(&self, target: &StagedTarget, file: &LocalFile) -> Result<(), CatalogError>;

    /// Materialize a managed asset from staged bytes.
    async fn register_resource(
        &self,
        resource_url: &str,
        kind: MediaKind,
        alt: &str,
    ) -> Result<MediaAsset, CatalogError>;

    /// Current processing status of a registered asset.
    async fn get_status(&self, asset_id: &str) -> Result<MediaStatus, CatalogError>;

    /// Attach media directly by its staged resource URL.
    async fn attach_by_source(
        &self,
        entity_id: &str,
        resource_url: &str,
        kind: MediaKind,
        alt: &str,
    ) -> Result<Vec<MediaAsset>, CatalogError>;

    /// Attach an already-registered asset by ID.
    async fn attach_by_id(
        &self,
        entity_id: &str,
        asset_id: &str,
        alt: &str,
    ) -> Result<(), CatalogError>;

    /// Point a variant's media at an asset via the bulk-update path.
    async fn set_variant_media(
        &self,
        entity_id: &str,
        variant_id: &str,
        asset_id: &str,
    ) -> Result<(), CatalogError>;

    /// Detach media from a variant.
    async fn detach_variant_media(
        &self,
        entity_id: &str,
        variant_id: &str,
        media_ids: &[String],
    ) -> Result<(), CatalogError>;

    /// Append one asset to a variant's media.
    async fn append_variant_media(
        &self,
        entity_id: &str,
        variant_id: &str,
        asset_id: &str,
    ) -> Result<(), CatalogError>;

    /// Reorder an entity's media. Moves are `(media_id, new_position)`.
    async fn reorder_media(
        &self,
        entity_id: &str,
        moves: &[(String, i64)],
    ) -> Result<(), CatalogError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graphql_error_formatting() {
        let errors = vec![
            GraphQLError {
                message: "Field not found".to_string(),
                locations: vec![],
                path: vec![],
            },
            GraphQLError {
                message: "Invalid ID".to_string(),
                locations: vec![],
                path: vec![],
            },
        ];
        let err = CatalogError::GraphQL(errors);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: Field not found; Invalid ID"
        );
    }

    #[test]
    fn rate_limited_error_display() {
        let err = CatalogError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }

    #[test]
    fn user_error_display() {
        let err = CatalogError::UserError("alt: too long".to_string());
        assert_eq!(err.to_string(), "User error: alt: too long");
    }

    #[test]
    fn transience() {
        assert!(CatalogError::RateLimited(5).is_transient());
        assert!(CatalogError::TransferFailed(503).is_transient());
        assert!(!CatalogError::UserError("bad input".to_string()).is_transient());
        assert!(!CatalogError::NotFound("x".to_string()).is_transient());
    }
}
