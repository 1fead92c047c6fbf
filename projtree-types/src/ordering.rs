//! Sibling ordering for directory listings.
//!
//! Folders come before files. Within a kind, names compare on a primary
//! collation key (decomposed, accents stripped, lowercased) so `apple`,
//! `Banana`, `été` and `fig` list in dictionary order. Ties fall through to
//! the lowercased NFC form, the NFC form, the raw name and finally the entry
//! id. Two distinct entries therefore never compare equal and `cmp(a, b)` is
//! always the reverse of `cmp(b, a)`.

use crate::Entry;
use std::cmp::Ordering;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Precomputed ordering key for one entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SiblingKey {
    rank: u8,
    primary: String,
    folded: String,
    normalized: String,
    raw: String,
    id: uuid::Uuid,
}

impl SiblingKey {
    #[must_use]
    pub fn of(entry: &Entry) -> Self {
        let normalized: String = entry.name.nfc().collect();
        let primary: String = entry
            .name
            .nfd()
            .filter(|c| !is_combining_mark(*c))
            .collect::<String>()
            .to_lowercase();
        Self {
            rank: entry.kind.listing_rank(),
            primary,
            folded: normalized.to_lowercase(),
            normalized,
            raw: entry.name.clone(),
            id: entry.id.as_uuid(),
        }
    }
}

/// Compares two siblings for listing order.
#[must_use]
pub fn compare_siblings(a: &Entry, b: &Entry) -> Ordering {
    SiblingKey::of(a).cmp(&SiblingKey::of(b))
}

/// Sorts a sibling listing in place.
pub fn sort_siblings(entries: &mut [Entry]) {
    entries.sort_by_cached_key(SiblingKey::of);
}
