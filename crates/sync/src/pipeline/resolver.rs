//! Filename key to entity resolution.

use media_sync_core::{EntityRef, ResolutionMode};

use crate::catalog::{Catalog, CatalogError};

/// Resolve a filename-derived key to an entity reference.
///
/// `PrimaryOnly` tries the custom-identifier lookup, `SecondaryOnly` the
/// variant SKU lookup, `Auto` tries primary then falls back to the SKU.
/// `Ok(None)` means no strategy matched; the caller records a non-fatal
/// `no_match` outcome.
///
/// # Errors
///
/// Transport and API failures propagate; they are distinct from a clean
/// non-match.
pub async fn resolve<C: Catalog + ?Sized>(
    catalog: &C,
    mode: ResolutionMode,
    key: &str,
) -> Result<Option<EntityRef>, CatalogError> {
    match mode {
        ResolutionMode::PrimaryOnly => catalog.lookup_by_key(key).await,
        ResolutionMode::SecondaryOnly => catalog.lookup_by_sku(key).await,
        ResolutionMode::Auto => {
            if let Some(entity) = catalog.lookup_by_key(key).await? {
                return Ok(Some(entity));
            }
            catalog.lookup_by_sku(key).await
        }
    }
}
