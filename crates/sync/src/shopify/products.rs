//! Entity lookup operations for the Admin API.

use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use media_sync_core::EntityRef;

use super::ShopifyClient;
use crate::catalog::CatalogError;

const PRODUCT_BY_IDENTIFIER_QUERY: &str = r"
query ProductByIdentifier($identifier: ProductIdentifierInput!) {
  productByIdentifier(identifier: $identifier) {
    id
    title
  }
}
";

const VARIANTS_BY_SKU_QUERY: &str = r#"
query VariantsBySku($query: String!) {
  productVariants(first: 5, query: $query) {
    nodes {
      id
      title
      sku
      product {
        id
        title
      }
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductByIdentifierData {
    product_by_identifier: Option<ProductNode>,
}

#[derive(Debug, Deserialize)]
struct ProductNode {
    id: String,
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariantsBySkuData {
    product_variants: VariantConnection,
}

#[derive(Debug, Deserialize)]
struct VariantConnection {
    nodes: Vec<VariantNode>,
}

#[derive(Debug, Deserialize)]
struct VariantNode {
    id: String,
    title: String,
    sku: Option<String>,
    product: ProductNode,
}

impl ShopifyClient {
    /// Resolve a custom-identifier metafield value to a product.
    ///
    /// The metafield namespace/key pair comes from configuration
    /// (`MEDIA_SYNC_KEY_FIELD`, default `custom.number`).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn lookup_by_key(&self, key: &str) -> Result<Option<EntityRef>, CatalogError> {
        let (namespace, field_key) = &self.inner.key_field;
        let variables = json!({
            "identifier": {
                "customId": {
                    "namespace": namespace,
                    "key": field_key,
                    "value": key,
                }
            }
        });

        let response: ProductByIdentifierData = self
            .execute(PRODUCT_BY_IDENTIFIER_QUERY, variables)
            .await?;

        Ok(response.product_by_identifier.map(|p| EntityRef {
            entity_id: p.id,
            entity_title: p.title,
            variant_id: None,
            variant_title: None,
        }))
    }

    /// Resolve a variant SKU to its owning product plus the variant pair.
    ///
    /// The search is exact: a variant whose SKU merely prefixes the key does
    /// not match.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn lookup_by_sku(&self, sku: &str) -> Result<Option<EntityRef>, CatalogError> {
        let variables = json!({
            "query": format!("sku:{sku}"),
        });

        let response: VariantsBySkuData = self.execute(VARIANTS_BY_SKU_QUERY, variables).await?;

        // The search query matches loosely; require SKU equality.
        let matched = response
            .product_variants
            .nodes
            .into_iter()
            .find(|v| v.sku.as_deref().is_some_and(|s| s.eq_ignore_ascii_case(sku)));

        Ok(matched.map(|v| EntityRef {
            entity_id: v.product.id,
            entity_title: v.product.title,
            variant_id: Some(v.id),
            variant_title: Some(v.title),
        }))
    }
}
