//! Media and file operations for the Admin API.
//!
//! Covers the staged-transfer handshake (`stagedUploadsCreate` → multipart
//! POST → `fileCreate`), media listing/deletion, both attach paths, the
//! variant media mutations, and display reordering.

use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use media_sync_core::{LocalFile, MediaAsset, MediaKind, MediaStatus, slot};

use super::ShopifyClient;
use super::client::{UserError, check_user_errors, missing_payload};
use crate::catalog::{CatalogError, StagedTarget};

const PRODUCT_MEDIA_QUERY: &str = r"
query ProductMedia($id: ID!) {
  product(id: $id) {
    media(first: 250) {
      nodes {
        id
        alt
        mediaContentType
        status
        ... on MediaImage {
          image {
            url
          }
        }
        ... on Video {
          originalSource {
            url
          }
        }
      }
    }
  }
}
";

const PRODUCT_DELETE_MEDIA_MUTATION: &str = r"
mutation ProductDeleteMedia($productId: ID!, $mediaIds: [ID!]!) {
  productDeleteMedia(productId: $productId, mediaIds: $mediaIds) {
    deletedMediaIds
    mediaUserErrors {
      field
      message
    }
  }
}
";

const STAGED_UPLOADS_CREATE_MUTATION: &str = r"
mutation StagedUploadsCreate($input: [StagedUploadInput!]!) {
  stagedUploadsCreate(input: $input) {
    stagedTargets {
      url
      resourceUrl
      parameters {
        name
        value
      }
    }
    userErrors {
      field
      message
    }
  }
}
";

const FILE_CREATE_MUTATION: &str = r"
mutation FileCreate($files: [FileCreateInput!]!) {
  fileCreate(files: $files) {
    files {
      id
      fileStatus
      alt
    }
    userErrors {
      field
      message
    }
  }
}
";

const MEDIA_STATUS_QUERY: &str = r"
query MediaProcessingStatus($id: ID!) {
  node(id: $id) {
    ... on Media {
      status
    }
  }
}
";

const PRODUCT_CREATE_MEDIA_MUTATION: &str = r"
mutation ProductCreateMedia($productId: ID!, $media: [CreateMediaInput!]!) {
  productCreateMedia(productId: $productId, media: $media) {
    media {
      id
      alt
      mediaContentType
      status
    }
    mediaUserErrors {
      field
      message
    }
  }
}
";

const FILE_UPDATE_MUTATION: &str = r"
mutation FileUpdate($files: [FileUpdateInput!]!) {
  fileUpdate(files: $files) {
    files {
      id
    }
    userErrors {
      field
      message
    }
  }
}
";

const VARIANTS_BULK_UPDATE_MUTATION: &str = r"
mutation ProductVariantsBulkUpdate($productId: ID!, $variants: [ProductVariantsBulkInput!]!) {
  productVariantsBulkUpdate(productId: $productId, variants: $variants) {
    userErrors {
      field
      message
    }
  }
}
";

const VARIANT_DETACH_MEDIA_MUTATION: &str = r"
mutation ProductVariantDetachMedia($productId: ID!, $variantMedia: [ProductVariantDetachMediaInput!]!) {
  productVariantDetachMedia(productId: $productId, variantMedia: $variantMedia) {
    userErrors {
      field
      message
    }
  }
}
";

const VARIANT_APPEND_MEDIA_MUTATION: &str = r"
mutation ProductVariantAppendMedia($productId: ID!, $variantMedia: [ProductVariantAppendMediaInput!]!) {
  productVariantAppendMedia(productId: $productId, variantMedia: $variantMedia) {
    userErrors {
      field
      message
    }
  }
}
";

const PRODUCT_REORDER_MEDIA_MUTATION: &str = r"
mutation ProductReorderMedia($id: ID!, $moves: [MoveInput!]!) {
  productReorderMedia(id: $id, moves: $moves) {
    mediaUserErrors {
      field
      message
    }
  }
}
";

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct ProductMediaData {
    product: Option<ProductMediaProduct>,
}

#[derive(Debug, Deserialize)]
struct ProductMediaProduct {
    media: MediaConnection,
}

#[derive(Debug, Deserialize)]
struct MediaConnection {
    nodes: Vec<MediaNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MediaNode {
    id: String,
    alt: Option<String>,
    media_content_type: String,
    status: String,
    image: Option<UrlRef>,
    original_source: Option<UrlRef>,
}

#[derive(Debug, Deserialize)]
struct UrlRef {
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductDeleteMediaData {
    product_delete_media: Option<ProductDeleteMediaPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductDeleteMediaPayload {
    deleted_media_ids: Option<Vec<String>>,
    media_user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StagedUploadsCreateData {
    staged_uploads_create: Option<StagedUploadsCreatePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StagedUploadsCreatePayload {
    staged_targets: Option<Vec<StagedTargetNode>>,
    user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StagedTargetNode {
    url: Option<String>,
    resource_url: Option<String>,
    parameters: Vec<StagedParameter>,
}

#[derive(Debug, Deserialize)]
struct StagedParameter {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileCreateData {
    file_create: Option<FileCreatePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileCreatePayload {
    files: Option<Vec<FileNode>>,
    user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileNode {
    id: String,
    file_status: String,
    alt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NodeStatusData {
    node: Option<NodeStatus>,
}

#[derive(Debug, Deserialize)]
struct NodeStatus {
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductCreateMediaData {
    product_create_media: Option<ProductCreateMediaPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductCreateMediaPayload {
    media: Option<Vec<CreatedMediaNode>>,
    media_user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedMediaNode {
    id: String,
    alt: Option<String>,
    media_content_type: String,
    status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileUpdateData {
    file_update: Option<UserErrorsOnly>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariantsBulkUpdateData {
    product_variants_bulk_update: Option<UserErrorsOnly>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariantDetachMediaData {
    product_variant_detach_media: Option<UserErrorsOnly>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariantAppendMediaData {
    product_variant_append_media: Option<UserErrorsOnly>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductReorderMediaData {
    product_reorder_media: Option<MediaUserErrorsOnly>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserErrorsOnly {
    user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MediaUserErrorsOnly {
    media_user_errors: Vec<UserError>,
}

fn parse_media_kind(content_type: &str) -> MediaKind {
    match content_type {
        "VIDEO" | "EXTERNAL_VIDEO" => MediaKind::Video,
        _ => MediaKind::Image,
    }
}

fn parse_media_status(status: &str) -> MediaStatus {
    match status {
        "READY" => MediaStatus::Ready,
        "FAILED" => MediaStatus::Failed,
        _ => MediaStatus::Pending,
    }
}

fn convert_media_node(node: MediaNode) -> MediaAsset {
    let source = node.image.or(node.original_source);
    MediaAsset {
        id: node.id,
        kind: parse_media_kind(&node.media_content_type),
        alt: node.alt,
        source_basename: source.map(|s| slot::basename(&s.url).to_string()),
        status: parse_media_status(&node.status),
    }
}

// =============================================================================
// Operations
// =============================================================================

impl ShopifyClient {
    /// Snapshot a product's media in current display order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails; an unknown product ID is
    /// `NotFound`.
    #[instrument(skip(self))]
    pub async fn list_media(&self, entity_id: &str) -> Result<Vec<MediaAsset>, CatalogError> {
        let variables = json!({ "id": entity_id });
        let response: ProductMediaData = self.execute(PRODUCT_MEDIA_QUERY, variables).await?;

        let product = response
            .product
            .ok_or_else(|| CatalogError::NotFound(entity_id.to_string()))?;

        Ok(product
            .media
            .nodes
            .into_iter()
            .map(convert_media_node)
            .collect())
    }

    /// Delete media from a product. Returns the number actually deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or reports user errors.
    #[instrument(skip(self, media_ids), fields(count = media_ids.len()))]
    pub async fn delete_media(
        &self,
        entity_id: &str,
        media_ids: &[String],
    ) -> Result<usize, CatalogError> {
        let variables = json!({
            "productId": entity_id,
            "mediaIds": media_ids,
        });

        let response: ProductDeleteMediaData = self
            .execute(PRODUCT_DELETE_MEDIA_MUTATION, variables)
            .await?;

        let payload = response
            .product_delete_media
            .ok_or_else(|| missing_payload("productDeleteMedia"))?;
        check_user_errors(payload.media_user_errors)?;

        Ok(payload.deleted_media_ids.unwrap_or_default().len())
    }

    /// Create a staged upload target for a file.
    ///
    /// # Errors
    ///
    /// Remote validation errors surface verbatim as `UserError`.
    #[instrument(skip(self))]
    pub async fn create_staged_target(
        &self,
        filename: &str,
        mime_type: &str,
        size: u64,
        kind: MediaKind,
    ) -> Result<StagedTarget, CatalogError> {
        let variables = json!({
            "input": [{
                "filename": filename,
                "mimeType": mime_type,
                "resource": kind.to_string(),
                "fileSize": size.to_string(),
                "httpMethod": "POST",
            }]
        });

        let response: StagedUploadsCreateData = self
            .execute(STAGED_UPLOADS_CREATE_MUTATION, variables)
            .await?;

        let payload = response
            .staged_uploads_create
            .ok_or_else(|| missing_payload("stagedUploadsCreate"))?;
        check_user_errors(payload.user_errors)?;

        let target = payload
            .staged_targets
            .and_then(|targets| targets.into_iter().next())
            .ok_or_else(|| missing_payload("stagedUploadsCreate"))?;

        Ok(StagedTarget {
            upload_url: target.url.unwrap_or_default(),
            resource_url: target.resource_url.unwrap_or_default(),
            parameters: target
                .parameters
                .into_iter()
                .map(|p| (p.name, p.value))
                .collect(),
        })
    }

    /// Stream a file's bytes to a staged target as a multipart POST.
    ///
    /// The target's auth parameters become form fields, in order, ahead of
    /// the file part. Success is judged purely on HTTP status class; this
    /// never retries; a failed target must be abandoned and a fresh one
    /// requested.
    ///
    /// # Errors
    ///
    /// `TransferFailed` carries the non-2xx status; I/O and transport
    /// failures map through.
    #[instrument(skip(self, target), fields(file = %file.basename))]
    pub async fn transfer(
        &self,
        target: &StagedTarget,
        file: &LocalFile,
    ) -> Result<(), CatalogError> {
        let bytes = tokio::fs::read(&file.path).await?;

        let mut form = reqwest::multipart::Form::new();
        for (name, value) in &target.parameters {
            form = form.text(name.clone(), value.clone());
        }
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file.basename.clone())
            .mime_str(&file.mime_type)?;
        form = form.part("file", part);

        let response = self
            .inner
            .client
            .post(&target.upload_url)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CatalogError::TransferFailed(response.status().as_u16()));
        }
        Ok(())
    }

    /// Materialize a managed file from staged bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or reports user errors.
    #[instrument(skip(self, resource_url))]
    pub async fn register_resource(
        &self,
        resource_url: &str,
        kind: MediaKind,
        alt: &str,
    ) -> Result<MediaAsset, CatalogError> {
        let content_type = match kind {
            MediaKind::Image => "IMAGE",
            MediaKind::Video => "VIDEO",
        };
        let variables = json!({
            "files": [{
                "originalSource": resource_url,
                "contentType": content_type,
                "alt": alt,
            }]
        });

        let response: FileCreateData = self.execute(FILE_CREATE_MUTATION, variables).await?;

        let payload = response
            .file_create
            .ok_or_else(|| missing_payload("fileCreate"))?;
        check_user_errors(payload.user_errors)?;

        let file = payload
            .files
            .and_then(|files| files.into_iter().next())
            .ok_or_else(|| missing_payload("fileCreate"))?;

        Ok(MediaAsset {
            id: file.id,
            kind,
            alt: file.alt,
            source_basename: Some(slot::basename(resource_url).to_string()),
            status: parse_media_status(&file.file_status),
        })
    }

    /// Current processing status of a media asset.
    ///
    /// # Errors
    ///
    /// An unknown asset ID is `NotFound`.
    #[instrument(skip(self))]
    pub async fn get_status(&self, asset_id: &str) -> Result<MediaStatus, CatalogError> {
        let variables = json!({ "id": asset_id });
        let response: NodeStatusData = self.execute(MEDIA_STATUS_QUERY, variables).await?;

        let status = response
            .node
            .and_then(|n| n.status)
            .ok_or_else(|| CatalogError::NotFound(asset_id.to_string()))?;

        Ok(parse_media_status(&status))
    }

    /// Attach media to a product directly by staged resource URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or reports user errors.
    #[instrument(skip(self, resource_url))]
    pub async fn attach_by_source(
        &self,
        entity_id: &str,
        resource_url: &str,
        kind: MediaKind,
        alt: &str,
    ) -> Result<Vec<MediaAsset>, CatalogError> {
        let variables = json!({
            "productId": entity_id,
            "media": [{
                "originalSource": resource_url,
                "mediaContentType": kind.to_string(),
                "alt": alt,
            }]
        });

        let response: ProductCreateMediaData = self
            .execute(PRODUCT_CREATE_MEDIA_MUTATION, variables)
            .await?;

        let payload = response
            .product_create_media
            .ok_or_else(|| missing_payload("productCreateMedia"))?;
        check_user_errors(payload.media_user_errors)?;

        let source_basename = slot::basename(resource_url).to_string();
        Ok(payload
            .media
            .unwrap_or_default()
            .into_iter()
            .map(|m| MediaAsset {
                id: m.id,
                kind: parse_media_kind(&m.media_content_type),
                alt: m.alt,
                source_basename: Some(source_basename.clone()),
                status: parse_media_status(&m.status),
            })
            .collect())
    }

    /// Attach an already-registered file to a product by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or reports user errors.
    #[instrument(skip(self))]
    pub async fn attach_by_id(
        &self,
        entity_id: &str,
        asset_id: &str,
        alt: &str,
    ) -> Result<(), CatalogError> {
        let variables = json!({
            "files": [{
                "id": asset_id,
                "alt": alt,
                "referencesToAdd": [entity_id],
            }]
        });

        let response: FileUpdateData = self.execute(FILE_UPDATE_MUTATION, variables).await?;

        let payload = response
            .file_update
            .ok_or_else(|| missing_payload("fileUpdate"))?;
        check_user_errors(payload.user_errors)
    }

    /// Point a variant at a media asset via the bulk-update path.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or reports user errors.
    #[instrument(skip(self))]
    pub async fn set_variant_media(
        &self,
        entity_id: &str,
        variant_id: &str,
        asset_id: &str,
    ) -> Result<(), CatalogError> {
        let variables = json!({
            "productId": entity_id,
            "variants": [{
                "id": variant_id,
                "mediaId": asset_id,
            }]
        });

        let response: VariantsBulkUpdateData = self
            .execute(VARIANTS_BULK_UPDATE_MUTATION, variables)
            .await?;

        let payload = response
            .product_variants_bulk_update
            .ok_or_else(|| missing_payload("productVariantsBulkUpdate"))?;
        check_user_errors(payload.user_errors)
    }

    /// Detach media from a variant.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or reports user errors.
    #[instrument(skip(self, media_ids), fields(count = media_ids.len()))]
    pub async fn detach_variant_media(
        &self,
        entity_id: &str,
        variant_id: &str,
        media_ids: &[String],
    ) -> Result<(), CatalogError> {
        let variables = json!({
            "productId": entity_id,
            "variantMedia": [{
                "variantId": variant_id,
                "mediaIds": media_ids,
            }]
        });

        let response: VariantDetachMediaData = self
            .execute(VARIANT_DETACH_MEDIA_MUTATION, variables)
            .await?;

        let payload = response
            .product_variant_detach_media
            .ok_or_else(|| missing_payload("productVariantDetachMedia"))?;
        check_user_errors(payload.user_errors)
    }

    /// Append one media asset to a variant.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or reports user errors.
    #[instrument(skip(self))]
    pub async fn append_variant_media(
        &self,
        entity_id: &str,
        variant_id: &str,
        asset_id: &str,
    ) -> Result<(), CatalogError> {
        let variables = json!({
            "productId": entity_id,
            "variantMedia": [{
                "variantId": variant_id,
                "mediaIds": [asset_id],
            }]
        });

        let response: VariantAppendMediaData = self
            .execute(VARIANT_APPEND_MEDIA_MUTATION, variables)
            .await?;

        let payload = response
            .product_variant_append_media
            .ok_or_else(|| missing_payload("productVariantAppendMedia"))?;
        check_user_errors(payload.user_errors)
    }

    /// Reorder product media. Moves are `(media_id, new_position)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or reports user errors.
    #[instrument(skip(self, moves), fields(moves = moves.len()))]
    pub async fn reorder_media(
        &self,
        entity_id: &str,
        moves: &[(String, i64)],
    ) -> Result<(), CatalogError> {
        let move_inputs: Vec<serde_json::Value> = moves
            .iter()
            .map(|(id, new_position)| {
                json!({
                    "id": id,
                    "newPosition": new_position.to_string(),
                })
            })
            .collect();

        let variables = json!({
            "id": entity_id,
            "moves": move_inputs,
        });

        let response: ProductReorderMediaData = self
            .execute(PRODUCT_REORDER_MEDIA_MUTATION, variables)
            .await?;

        let payload = response
            .product_reorder_media
            .ok_or_else(|| missing_payload("productReorderMedia"))?;
        check_user_errors(payload.media_user_errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_kind_parsing() {
        assert_eq!(parse_media_kind("IMAGE"), MediaKind::Image);
        assert_eq!(parse_media_kind("VIDEO"), MediaKind::Video);
        assert_eq!(parse_media_kind("EXTERNAL_VIDEO"), MediaKind::Video);
        assert_eq!(parse_media_kind("MODEL_3D"), MediaKind::Image);
    }

    #[test]
    fn media_status_parsing() {
        assert_eq!(parse_media_status("READY"), MediaStatus::Ready);
        assert_eq!(parse_media_status("FAILED"), MediaStatus::Failed);
        assert_eq!(parse_media_status("UPLOADED"), MediaStatus::Pending);
        assert_eq!(parse_media_status("PROCESSING"), MediaStatus::Pending);
    }

    #[test]
    fn media_node_conversion_derives_basename() {
        let node = MediaNode {
            id: "gid://shopify/MediaImage/1".to_string(),
            alt: Some("Shirt".to_string()),
            media_content_type: "IMAGE".to_string(),
            status: "READY".to_string(),
            image: Some(UrlRef {
                url: "https://cdn.shopify.com/s/files/7001_2.jpg?v=99".to_string(),
            }),
            original_source: None,
        };
        let asset = convert_media_node(node);
        assert_eq!(asset.source_basename.as_deref(), Some("7001_2.jpg"));
        assert_eq!(asset.kind, MediaKind::Image);
        assert_eq!(asset.status, MediaStatus::Ready);
    }
}
