//! GraphQL execution plumbing for the Admin API.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

use media_sync_core::{EntityRef, LocalFile, MediaAsset, MediaKind, MediaStatus};

use crate::catalog::{
    Catalog, CatalogError, GraphQLError, GraphQLErrorLocation, StagedTarget,
};
use crate::config::ShopifyConfig;

/// Shopify Admin API GraphQL client.
///
/// Cheap to clone; all state lives behind an `Arc`.
#[derive(Clone)]
pub struct ShopifyClient {
    pub(super) inner: Arc<ShopifyClientInner>,
}

pub(super) struct ShopifyClientInner {
    pub(super) client: reqwest::Client,
    pub(super) endpoint: String,
    pub(super) access_token: String,
    /// `(namespace, key)` of the metafield holding the primary lookup key.
    pub(super) key_field: (String, String),
}

/// GraphQL response wrapper.
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLErrorResponse>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorResponse {
    message: String,
    #[serde(default)]
    locations: Vec<GraphQLErrorLocationResponse>,
    #[serde(default)]
    path: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorLocationResponse {
    line: i64,
    column: i64,
}

/// A `userErrors` entry on a mutation payload.
#[derive(Debug, Deserialize)]
pub(super) struct UserError {
    pub field: Option<Vec<String>>,
    pub message: String,
}

/// Convert a mutation's `userErrors` into a `CatalogError::UserError`,
/// preserving the remote messages verbatim.
pub(super) fn check_user_errors(errors: Vec<UserError>) -> Result<(), CatalogError> {
    if errors.is_empty() {
        return Ok(());
    }
    let messages: Vec<String> = errors
        .iter()
        .map(|e| {
            let field = e.field.as_ref().map_or_else(String::new, |f| f.join("."));
            format!("{}: {}", field, e.message)
        })
        .collect();
    Err(CatalogError::UserError(messages.join("; ")))
}

/// Error for a mutation that returned neither a payload nor errors.
pub(super) fn missing_payload(operation: &str) -> CatalogError {
    CatalogError::GraphQL(vec![GraphQLError {
        message: format!("{operation} returned no payload"),
        locations: vec![],
        path: vec![],
    }])
}

impl ShopifyClient {
    /// Create a new Admin API client.
    #[must_use]
    pub fn new(config: &ShopifyConfig) -> Self {
        let endpoint = format!(
            "https://{}/admin/api/{}/graphql.json",
            config.store, config.api_version
        );
        let (namespace, key) = config.key_field_parts();

        Self {
            inner: Arc::new(ShopifyClientInner {
                client: reqwest::Client::new(),
                endpoint,
                access_token: config.access_token.expose_secret().to_string(),
                key_field: (namespace.to_string(), key.to_string()),
            }),
        }
    }

    /// Execute a GraphQL document with variables.
    pub(super) async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, CatalogError> {
        let body = serde_json::json!({
            "query": query,
            "variables": variables,
        });

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header("X-Shopify-Access-Token", &self.inner.access_token)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        // Check for rate limiting
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return Err(CatalogError::RateLimited(retry_after));
        }

        // Check for unauthorized
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(CatalogError::Unauthorized(
                "Invalid or expired access token".to_string(),
            ));
        }

        let graphql_response: GraphQLResponse<T> = response.json().await?;

        // Check for GraphQL errors
        if let Some(errors) = graphql_response.errors
            && !errors.is_empty()
        {
            let converted_errors: Vec<GraphQLError> = errors
                .into_iter()
                .map(|e| GraphQLError {
                    message: e.message,
                    locations: e
                        .locations
                        .into_iter()
                        .map(|l| GraphQLErrorLocation {
                            line: l.line,
                            column: l.column,
                        })
                        .collect(),
                    path: e.path,
                })
                .collect();
            return Err(CatalogError::GraphQL(converted_errors));
        }

        graphql_response.data.ok_or_else(|| {
            CatalogError::GraphQL(vec![GraphQLError {
                message: "No data in response".to_string(),
                locations: vec![],
                path: vec![],
            }])
        })
    }
}

// Inherent methods live in `products.rs` and `media.rs`; this impl hands the
// pipeline's abstract operations to them.
#[async_trait]
impl Catalog for ShopifyClient {
    async fn lookup_by_key(&self, key: &str) -> Result<Option<EntityRef>, CatalogError> {
        Self::lookup_by_key(self, key).await
    }

    async fn lookup_by_sku(&self, sku: &str) -> Result<Option<EntityRef>, CatalogError> {
        Self::lookup_by_sku(self, sku).await
    }

    async fn list_media(&self, entity_id: &str) -> Result<Vec<MediaAsset>, CatalogError> {
        Self::list_media(self, entity_id).await
    }

    async fn delete_media(
        &self,
        entity_id: &str,
        media_ids: &[String],
    ) -> Result<usize, CatalogError> {
        Self::delete_media(self, entity_id, media_ids).await
    }

    async fn create_staged_target(
        &self,
        filename: &str,
        mime_type: &str,
        size: u64,
        kind: MediaKind,
    ) -> Result<StagedTarget, CatalogError> {
        Self::create_staged_target(self, filename, mime_type, size, kind).await
    }

    async fn transfer(&self, target: &StagedTarget, file: &LocalFile) -> Result<(), CatalogError> {
        Self::transfer(self, target, file).await
    }

    async fn register_resource(
        &self,
        resource_url: &str,
        kind: MediaKind,
        alt: &str,
    ) -> Result<MediaAsset, CatalogError> {
        Self::register_resource(self, resource_url, kind, alt).await
    }

    async fn get_status(&self, asset_id: &str) -> Result<MediaStatus, CatalogError> {
        Self::get_status(self, asset_id).await
    }

    async fn attach_by_source(
        &self,
        entity_id: &str,
        resource_url: &str,
        kind: MediaKind,
        alt: &str,
    ) -> Result<Vec<MediaAsset>, CatalogError> {
        Self::attach_by_source(self, entity_id, resource_url, kind, alt).await
    }

    async fn attach_by_id(
        &self,
        entity_id: &str,
        asset_id: &str,
        alt: &str,
    ) -> Result<(), CatalogError> {
        Self::attach_by_id(self, entity_id, asset_id, alt).await
    }

    async fn set_variant_media(
        &self,
        entity_id: &str,
        variant_id: &str,
        asset_id: &str,
    ) -> Result<(), CatalogError> {
        Self::set_variant_media(self, entity_id, variant_id, asset_id).await
    }

    async fn detach_variant_media(
        &self,
        entity_id: &str,
        variant_id: &str,
        media_ids: &[String],
    ) -> Result<(), CatalogError> {
        Self::detach_variant_media(self, entity_id, variant_id, media_ids).await
    }

    async fn append_variant_media(
        &self,
        entity_id: &str,
        variant_id: &str,
        asset_id: &str,
    ) -> Result<(), CatalogError> {
        Self::append_variant_media(self, entity_id, variant_id, asset_id).await
    }

    async fn reorder_media(
        &self,
        entity_id: &str,
        moves: &[(String, i64)],
    ) -> Result<(), CatalogError> {
        Self::reorder_media(self, entity_id, moves).await
    }
}
