//! # Tag Normalization
//!
//! Raw tag input arrives as a list of comma-separated groups. Normalizing
//! flattens, trims and de-duplicates it; selecting then lower-cases the
//! result and applies the per-image cap.

use std::collections::HashSet;

/// Longest tag name the store accepts, in characters.
pub const MAX_TAG_LEN: usize = 25;

/// Most tags a single image may carry.
pub const MAX_TAGS_PER_IMAGE: usize = 5;

pub const TAG_OVERFLOW_NOTICE: &str = "Only five tags can be added to an image";

/// Flattens `["a, b", "c"]` into `["a", "b", "c"]`: every entry is cut to
/// [`MAX_TAG_LEN`] characters and trimmed, empty entries are dropped and
/// duplicates removed while keeping first-seen order.
pub fn normalize<S: AsRef<str>>(raw_groups: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    raw_groups
        .iter()
        .flat_map(|group| group.as_ref().split(','))
        .map(|tag| cap_len(tag).trim().to_string())
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}

fn cap_len(tag: &str) -> String {
    tag.chars().take(MAX_TAG_LEN).collect()
}

/// The tags actually applied to an image, plus a notice when some were cut.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSelection {
    pub applied: Vec<String>,
    pub overflow: Option<&'static str>,
}

impl TagSelection {
    /// Lower-cases normalized tags, keeps the first [`MAX_TAGS_PER_IMAGE`] distinct ones
    /// and flags (without rejecting) anything beyond that.
    ///
    /// Lower-casing may lengthen a tag (`İ` becomes two chars), so the length cap is
    /// applied again afterwards.
    pub fn from_normalized(tags: Vec<String>) -> Self {
        let mut seen = HashSet::new();
        let lowered: Vec<String> = tags
            .into_iter()
            .map(|t| cap_len(&t.to_lowercase()).trim().to_string())
            .filter(|t| seen.insert(t.clone()))
            .collect();

        let overflow = (lowered.len() > MAX_TAGS_PER_IMAGE).then_some(TAG_OVERFLOW_NOTICE);
        let applied = lowered.into_iter().take(MAX_TAGS_PER_IMAGE).collect();
        TagSelection { applied, overflow }
    }

    pub fn from_raw<S: AsRef<str>>(raw_groups: &[S]) -> Self {
        Self::from_normalized(normalize(raw_groups))
    }
}
