//! Run-scoped memo of resolved road names.

use std::collections::BTreeMap;

use crate::normalize::StreetKey;

/// Road names resolved during one run, keyed on raw parcel tokens.
///
/// Only successful resolutions are stored: a street that failed to
/// resolve is queried again for the next building that names it.
#[derive(Debug, Default, Clone)]
pub struct StreetCache {
    entries: BTreeMap<StreetKey, String>,
}

impl StreetCache {
    /// Creates an empty cache.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Cached road name for `key`.
    #[must_use]
    pub fn get(&self, key: &StreetKey) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Stores a resolved road name.
    pub fn insert(&mut self, key: StreetKey, name: String) {
        self.entries.insert(key, name);
    }

    /// Number of cached streets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
