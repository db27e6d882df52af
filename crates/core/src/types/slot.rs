//! Filename-derived slot labels.
//!
//! Media files are matched to catalog entities by naming convention: the
//! file stem is a lookup key, optionally followed by `_<n>` selecting the
//! n-th media slot. `7001.jpg` targets the featured slot (index 0) of the
//! entity keyed `7001`; `7001_2.jpg` targets its second additional slot.

use serde::{Deserialize, Serialize};

/// A lookup key plus positional slot index parsed from a filename.
///
/// Index 0 is the featured slot; index n > 0 is the n-th additional slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotLabel {
    /// Catalog lookup key (custom identifier or SKU).
    pub key: String,
    /// Zero-based media slot index.
    pub index: u32,
}

impl SlotLabel {
    /// Parse a slot label from a filename or URL.
    ///
    /// Strips any directory prefix and query suffix, drops the final
    /// extension, then splits a trailing `_<n>` (n a non-negative integer)
    /// into the slot index. A trailing segment that is not an integer is
    /// folded back into the key, with index 0.
    #[must_use]
    pub fn parse(filename: &str) -> Self {
        let stem = strip_extension(basename(filename));

        if let Some((key, suffix)) = stem.rsplit_once('_')
            && !key.is_empty()
            && let Ok(index) = suffix.parse::<u32>()
        {
            return Self {
                key: key.to_string(),
                index,
            };
        }

        Self {
            key: stem.to_string(),
            index: 0,
        }
    }
}

impl std::fmt::Display for SlotLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.key, self.index)
    }
}

/// The final path segment of a filename or URL, without any query suffix.
#[must_use]
pub fn basename(path: &str) -> &str {
    let no_query = path.split(['?', '#']).next().unwrap_or(path);
    no_query
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(no_query)
}

fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(name: &str) -> (String, u32) {
        let label = SlotLabel::parse(name);
        (label.key, label.index)
    }

    #[test]
    fn bare_key_is_featured_slot() {
        assert_eq!(parsed("7001.jpg"), ("7001".to_string(), 0));
    }

    #[test]
    fn numeric_suffix_selects_slot() {
        assert_eq!(parsed("7001_2.jpg"), ("7001".to_string(), 2));
        assert_eq!(parsed("7001_0.png"), ("7001".to_string(), 0));
        assert_eq!(parsed("7001_14.webp"), ("7001".to_string(), 14));
    }

    #[test]
    fn non_numeric_suffix_folds_into_key() {
        assert_eq!(parsed("7001_front.jpg"), ("7001_front".to_string(), 0));
        assert_eq!(parsed("blue_shirt.jpg"), ("blue_shirt".to_string(), 0));
    }

    #[test]
    fn only_last_segment_is_an_index() {
        assert_eq!(parsed("blue_shirt_3.jpg"), ("blue_shirt".to_string(), 3));
    }

    #[test]
    fn path_and_query_are_stripped() {
        assert_eq!(parsed("/tmp/photos/7001_1.jpg"), ("7001".to_string(), 1));
        assert_eq!(
            parsed("https://cdn.example.com/7001_1.jpg?v=12345"),
            ("7001".to_string(), 1)
        );
    }

    #[test]
    fn no_extension_is_accepted() {
        assert_eq!(parsed("7001"), ("7001".to_string(), 0));
        assert_eq!(parsed("7001_3"), ("7001".to_string(), 3));
    }

    #[test]
    fn hidden_file_keeps_leading_dot() {
        assert_eq!(parsed(".env"), (".env".to_string(), 0));
    }

    #[test]
    fn basename_strips_query_and_fragment() {
        assert_eq!(basename("https://x.test/a/b/c.jpg?sig=1"), "c.jpg");
        assert_eq!(basename("c.jpg"), "c.jpg");
        assert_eq!(basename("a\\b\\c.jpg"), "c.jpg");
    }

    #[test]
    fn display_round_trips_key_and_index() {
        let label = SlotLabel::parse("7001_2.jpg");
        assert_eq!(label.to_string(), "7001_2");
    }
}
