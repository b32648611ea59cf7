//! Tagged key/value cache backend contract.
//!
//! # Responsibility
//! - Define the operations the cache-aside handler needs from a cache.
//! - Keep entries opaque: the backend never interprets payloads.
//!
//! # Invariants
//! - `invalidate_tags` removes every entry carrying any of the given tags.
//! - Entries have no expiry; they live until deleted or invalidated.
//! - Errors are reported, never swallowed; callers decide how to proceed.

use std::collections::{BTreeSet, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type CacheResult<T> = Result<T, CacheError>;

/// Cache backend failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Internal lock was poisoned by a panicking writer.
    Poisoned,
    /// Backend-specific failure (connection loss, rejected command, ...).
    Backend(String),
}

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Poisoned => write!(f, "cache state lock poisoned"),
            Self::Backend(message) => write!(f, "cache backend error: {message}"),
        }
    }
}

impl Error for CacheError {}

/// One cached blob with its invalidation tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: String,
    pub payload: String,
    pub tags: BTreeSet<String>,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, payload: impl Into<String>, tags: BTreeSet<String>) -> Self {
        Self {
            key: key.into(),
            payload: payload.into(),
            tags,
        }
    }
}

/// Key/value cache with tag-based group invalidation.
pub trait TaggedCache {
    /// Returns the entry stored under `key`, or `None` on a miss.
    fn get_item(&self, key: &str) -> CacheResult<Option<CacheEntry>>;

    /// Returns the entries found for `keys`; missing keys are absent from the map.
    fn get_items(&self, keys: &[String]) -> CacheResult<HashMap<String, CacheEntry>> {
        let mut found = HashMap::with_capacity(keys.len());
        for key in keys {
            if let Some(entry) = self.get_item(key)? {
                found.insert(key.clone(), entry);
            }
        }
        Ok(found)
    }

    /// Stores `entry`, replacing any entry with the same key and its tags.
    fn save(&self, entry: CacheEntry) -> CacheResult<()>;

    /// Removes the given keys. Unknown keys are ignored.
    fn delete_items(&self, keys: &[String]) -> CacheResult<()>;

    /// Removes every entry tagged with any of `tags`.
    fn invalidate_tags(&self, tags: &[String]) -> CacheResult<()>;
}

impl<C: TaggedCache + ?Sized> TaggedCache for Arc<C> {
    fn get_item(&self, key: &str) -> CacheResult<Option<CacheEntry>> {
        (**self).get_item(key)
    }

    fn get_items(&self, keys: &[String]) -> CacheResult<HashMap<String, CacheEntry>> {
        (**self).get_items(keys)
    }

    fn save(&self, entry: CacheEntry) -> CacheResult<()> {
        (**self).save(entry)
    }

    fn delete_items(&self, keys: &[String]) -> CacheResult<()> {
        (**self).delete_items(keys)
    }

    fn invalidate_tags(&self, tags: &[String]) -> CacheResult<()> {
        (**self).invalidate_tags(tags)
    }
}
