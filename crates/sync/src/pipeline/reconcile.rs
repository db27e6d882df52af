//! Media reconciliation: replace-detection, the attach fallback chain, and
//! display-order planning.
//!
//! Alt labels double as the slot bookkeeping: an entity-scoped asset in slot
//! 0 carries the entity title verbatim, slot n carries `"{title} ({n})"`,
//! and a variant-scoped asset carries `"{title} - {variant}"` with the same
//! suffix rule. Reordering classifies remote media back out of these labels.

use media_sync_core::{EntityRef, MediaAsset, MediaKind, SlotLabel};

use crate::catalog::{Catalog, CatalogError};

/// The alt label this run assigns to a file landing in `slot` on `entity`.
#[must_use]
pub fn assign_alt(entity: &EntityRef, slot: &SlotLabel) -> String {
    let base = entity.variant_title.as_ref().map_or_else(
        || entity.entity_title.clone(),
        |variant| format!("{} - {variant}", entity.entity_title),
    );
    if slot.index > 0 {
        format!("{base} ({})", slot.index)
    } else {
        base
    }
}

/// Whether an existing asset occupies the slot this upload targets.
///
/// Matches on the alt label the run would assign, or on the source basename
/// of the uploading file (case-insensitive). Matching occupants are deleted
/// before the new asset is created, so re-runs converge instead of
/// accumulating duplicates.
#[must_use]
pub fn occupies(asset: &MediaAsset, alt: &str, basename: &str) -> bool {
    if asset.alt.as_deref() == Some(alt) {
        return true;
    }
    asset
        .source_basename
        .as_deref()
        .is_some_and(|source| source.eq_ignore_ascii_case(basename))
}

/// IDs of currently attached media claimed by the entity's paired variant.
///
/// Used as detach candidates by the unlink-then-link fallback.
#[must_use]
pub fn variant_media_ids(assets: &[MediaAsset], entity: &EntityRef) -> Vec<String> {
    let Some(variant_title) = entity.variant_title.as_deref() else {
        return Vec::new();
    };
    let prefix = format!("{} - {variant_title}", entity.entity_title);
    assets
        .iter()
        .filter(|a| {
            a.alt
                .as_deref()
                .is_some_and(|alt| alt == prefix || alt.starts_with(&format!("{prefix} (")))
        })
        .map(|a| a.id.clone())
        .collect()
}

/// Attach a newly uploaded asset to an entity, preferring the registered
/// asset ID and falling back to the staged resource URL.
///
/// Returns the ID of the attached media.
///
/// # Errors
///
/// Returns the last attach error once every path is exhausted.
pub async fn attach<C: Catalog + ?Sized>(
    catalog: &C,
    entity_id: &str,
    registered: Option<&MediaAsset>,
    resource_url: &str,
    kind: MediaKind,
    alt: &str,
) -> Result<String, CatalogError> {
    if let Some(asset) = registered {
        match catalog.attach_by_id(entity_id, &asset.id, alt).await {
            Ok(()) => return Ok(asset.id.clone()),
            Err(e) => {
                tracing::warn!(
                    entity_id,
                    asset_id = %asset.id,
                    error = %e,
                    "attach by id failed, falling back to staged source"
                );
            }
        }
    }

    let created = catalog
        .attach_by_source(entity_id, resource_url, kind, alt)
        .await?;
    created
        .into_iter()
        .next()
        .map(|m| m.id)
        .ok_or_else(|| CatalogError::NotFound(format!("no media created for {resource_url}")))
}

/// Link an asset to a variant, falling back from the bulk-update path to an
/// unlink-then-link pair.
///
/// The bulk path can reject combinations the detach/append path accepts, so
/// a `UserError` there triggers the fallback: detach `detach_candidates`
/// from the variant, then append the new asset. Only a rejection falls
/// back; on a transport error the bulk update may have landed, and a
/// detach/append on top of it would mutate twice.
///
/// # Errors
///
/// Transport errors from the bulk path propagate unchanged; a rejection
/// followed by a failed fallback returns the fallback's error.
pub async fn link_variant<C: Catalog + ?Sized>(
    catalog: &C,
    entity_id: &str,
    variant_id: &str,
    asset_id: &str,
    detach_candidates: &[String],
) -> Result<(), CatalogError> {
    match catalog
        .set_variant_media(entity_id, variant_id, asset_id)
        .await
    {
        Ok(()) => Ok(()),
        Err(CatalogError::UserError(message)) => {
            tracing::warn!(
                entity_id,
                variant_id,
                error = %message,
                "bulk variant media update rejected, trying detach/append"
            );
            if !detach_candidates.is_empty() {
                catalog
                    .detach_variant_media(entity_id, variant_id, detach_candidates)
                    .await?;
            }
            catalog
                .append_variant_media(entity_id, variant_id, asset_id)
                .await
        }
        Err(e) => Err(e),
    }
}

// =============================================================================
// Reorder planning
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MediaGroup {
    /// Entity-level media with its parsed slot index.
    Entity(u32),
    /// Media labeled for a variant.
    Variant,
    /// Everything else (manually uploaded, foreign labels).
    Other,
}

/// Classify an asset by its alt label relative to the entity's title.
fn classify(alt: Option<&str>, entity_title: &str) -> MediaGroup {
    let Some(alt) = alt else {
        return MediaGroup::Other;
    };
    if alt == entity_title {
        return MediaGroup::Entity(0);
    }
    if let Some(rest) = alt.strip_prefix(entity_title) {
        if let Some(index) = parse_slot_suffix(rest) {
            return MediaGroup::Entity(index);
        }
        if rest.starts_with(" - ") {
            return MediaGroup::Variant;
        }
    }
    MediaGroup::Other
}

/// Parse `" (n)"` into `n`.
fn parse_slot_suffix(rest: &str) -> Option<u32> {
    rest.strip_prefix(" (")?.strip_suffix(')')?.parse().ok()
}

/// Compute the moves that put an entity's media into display order.
///
/// Desired order: entity-level media ascending by slot index, then media
/// claimed by neither group, then variant-level media. When no entity-level
/// media exist but variant-level ones do, the variant group is promoted to
/// the front so the featured slot is never left empty while a usable asset
/// exists. Returns an empty plan when the media already sit in the desired
/// order.
#[must_use]
pub fn plan_reorder(assets: &[MediaAsset], entity_title: &str) -> Vec<(String, i64)> {
    let mut entity_level: Vec<(u32, usize, &str)> = Vec::new();
    let mut variant_level: Vec<&str> = Vec::new();
    let mut other: Vec<&str> = Vec::new();

    for (position, asset) in assets.iter().enumerate() {
        match classify(asset.alt.as_deref(), entity_title) {
            MediaGroup::Entity(index) => entity_level.push((index, position, &asset.id)),
            MediaGroup::Variant => variant_level.push(&asset.id),
            MediaGroup::Other => other.push(&asset.id),
        }
    }

    // Slot index first; original position breaks ties deterministically.
    entity_level.sort_by_key(|(index, position, _)| (*index, *position));

    let desired: Vec<&str> = if entity_level.is_empty() && !variant_level.is_empty() {
        variant_level.iter().chain(other.iter()).copied().collect()
    } else {
        entity_level
            .iter()
            .map(|(_, _, id)| *id)
            .chain(other.iter().copied())
            .chain(variant_level.iter().copied())
            .collect()
    };

    let unchanged = desired
        .iter()
        .zip(assets.iter())
        .all(|(id, asset)| *id == asset.id);
    if unchanged {
        return Vec::new();
    }

    desired
        .into_iter()
        .enumerate()
        .map(|(position, id)| (id.to_string(), position as i64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_sync_core::{MediaStatus, SlotLabel};

    fn entity() -> EntityRef {
        EntityRef {
            entity_id: "gid://shopify/Product/1".to_string(),
            entity_title: "Canvas Tote".to_string(),
            variant_id: None,
            variant_title: None,
        }
    }

    fn variant_entity() -> EntityRef {
        EntityRef {
            variant_id: Some("gid://shopify/ProductVariant/5".to_string()),
            variant_title: Some("Navy".to_string()),
            ..entity()
        }
    }

    fn asset(id: &str, alt: Option<&str>) -> MediaAsset {
        MediaAsset {
            id: id.to_string(),
            kind: MediaKind::Image,
            alt: alt.map(String::from),
            source_basename: None,
            status: MediaStatus::Ready,
        }
    }

    #[test]
    fn alt_assignment() {
        let slot0 = SlotLabel {
            key: "7001".to_string(),
            index: 0,
        };
        let slot2 = SlotLabel {
            index: 2,
            ..slot0.clone()
        };
        assert_eq!(assign_alt(&entity(), &slot0), "Canvas Tote");
        assert_eq!(assign_alt(&entity(), &slot2), "Canvas Tote (2)");
        assert_eq!(assign_alt(&variant_entity(), &slot0), "Canvas Tote - Navy");
        assert_eq!(
            assign_alt(&variant_entity(), &slot2),
            "Canvas Tote - Navy (2)"
        );
    }

    #[test]
    fn occupancy_by_alt_or_basename() {
        let by_alt = asset("m1", Some("Canvas Tote (2)"));
        assert!(occupies(&by_alt, "Canvas Tote (2)", "7001_2.jpg"));
        assert!(!occupies(&by_alt, "Canvas Tote", "other.jpg"));

        let by_source = MediaAsset {
            source_basename: Some("7001_2.JPG".to_string()),
            ..asset("m2", Some("old label"))
        };
        assert!(occupies(&by_source, "Canvas Tote (2)", "7001_2.jpg"));
    }

    #[test]
    fn classification() {
        assert_eq!(
            classify(Some("Canvas Tote"), "Canvas Tote"),
            MediaGroup::Entity(0)
        );
        assert_eq!(
            classify(Some("Canvas Tote (3)"), "Canvas Tote"),
            MediaGroup::Entity(3)
        );
        assert_eq!(
            classify(Some("Canvas Tote - Navy"), "Canvas Tote"),
            MediaGroup::Variant
        );
        assert_eq!(
            classify(Some("Canvas Tote - Navy (2)"), "Canvas Tote"),
            MediaGroup::Variant
        );
        assert_eq!(classify(Some("lifestyle shot"), "Canvas Tote"), MediaGroup::Other);
        assert_eq!(classify(None, "Canvas Tote"), MediaGroup::Other);
    }

    #[test]
    fn reorder_puts_entity_media_first_ascending() {
        let assets = vec![
            asset("v1", Some("Canvas Tote - Navy")),
            asset("e2", Some("Canvas Tote (2)")),
            asset("x1", Some("lifestyle shot")),
            asset("e0", Some("Canvas Tote")),
            asset("e1", Some("Canvas Tote (1)")),
        ];
        let plan = plan_reorder(&assets, "Canvas Tote");
        let order: Vec<&str> = plan.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(order, ["e0", "e1", "e2", "x1", "v1"]);
        let positions: Vec<i64> = plan.iter().map(|(_, p)| *p).collect();
        assert_eq!(positions, [0, 1, 2, 3, 4]);
    }

    #[test]
    fn reorder_promotes_variant_media_when_no_entity_media() {
        let assets = vec![
            asset("x1", Some("lifestyle shot")),
            asset("v1", Some("Canvas Tote - Navy")),
        ];
        let plan = plan_reorder(&assets, "Canvas Tote");
        let order: Vec<&str> = plan.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(order, ["v1", "x1"]);
    }

    #[test]
    fn reorder_is_empty_when_already_ordered() {
        let assets = vec![
            asset("e0", Some("Canvas Tote")),
            asset("e1", Some("Canvas Tote (1)")),
            asset("v1", Some("Canvas Tote - Navy")),
        ];
        assert!(plan_reorder(&assets, "Canvas Tote").is_empty());
    }

    #[test]
    fn variant_detach_candidates() {
        let assets = vec![
            asset("v1", Some("Canvas Tote - Navy")),
            asset("v2", Some("Canvas Tote - Navy (1)")),
            asset("w1", Some("Canvas Tote - Sand")),
            asset("e0", Some("Canvas Tote")),
        ];
        assert_eq!(variant_media_ids(&assets, &variant_entity()), ["v1", "v2"]);
        assert!(variant_media_ids(&assets, &entity()).is_empty());
    }
}
