//! In-process tagged cache with an explicit tag index.
//!
//! # Responsibility
//! - Store opaque entries by key.
//! - Maintain `tag -> keys` so tag invalidation never scans all entries.
//!
//! # Invariants
//! - Entry map and tag index are mutated under one lock, so they never
//!   disagree between calls.
//! - A key appears in the index of exactly the tags its current entry carries.

use crate::cache::backend::{CacheEntry, CacheError, CacheResult, TaggedCache};
use log::trace;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    tag_index: HashMap<String, HashSet<String>>,
}

impl CacheState {
    fn insert(&mut self, entry: CacheEntry) {
        self.remove(&entry.key);
        for tag in &entry.tags {
            self.tag_index
                .entry(tag.clone())
                .or_default()
                .insert(entry.key.clone());
        }
        self.entries.insert(entry.key.clone(), entry);
    }

    fn remove(&mut self, key: &str) -> bool {
        let Some(entry) = self.entries.remove(key) else {
            return false;
        };
        for tag in &entry.tags {
            if let Some(keys) = self.tag_index.get_mut(tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.tag_index.remove(tag);
                }
            }
        }
        true
    }

    fn invalidate(&mut self, tag: &str) -> usize {
        let Some(keys) = self.tag_index.remove(tag) else {
            return 0;
        };
        keys.iter().filter(|key| self.remove(key)).count()
    }
}

/// Thread-safe in-memory implementation of [`TaggedCache`].
///
/// Share one instance between handlers with `Arc<InMemoryTaggedCache>`.
#[derive(Debug, Default)]
pub struct InMemoryTaggedCache {
    state: Mutex<CacheState>,
}

impl InMemoryTaggedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.lock().map(|state| state.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.lock()
            .map(|state| state.entries.contains_key(key))
            .unwrap_or(false)
    }

    /// Sorted keys of the entries currently carrying `tag`.
    pub fn keys_for_tag(&self, tag: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .lock()
            .ok()
            .and_then(|state| state.tag_index.get(tag).cloned())
            .map(|keys| keys.into_iter().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    /// Drops every entry and the whole tag index.
    pub fn clear(&self) -> CacheResult<()> {
        let mut state = self.lock()?;
        state.entries.clear();
        state.tag_index.clear();
        Ok(())
    }

    fn lock(&self) -> CacheResult<MutexGuard<'_, CacheState>> {
        self.state.lock().map_err(|_| CacheError::Poisoned)
    }
}

impl TaggedCache for InMemoryTaggedCache {
    fn get_item(&self, key: &str) -> CacheResult<Option<CacheEntry>> {
        Ok(self.lock()?.entries.get(key).cloned())
    }

    fn get_items(&self, keys: &[String]) -> CacheResult<HashMap<String, CacheEntry>> {
        let state = self.lock()?;
        Ok(keys
            .iter()
            .filter_map(|key| {
                state
                    .entries
                    .get(key)
                    .map(|entry| (key.clone(), entry.clone()))
            })
            .collect())
    }

    fn save(&self, entry: CacheEntry) -> CacheResult<()> {
        trace!(
            "event=cache_save module=cache status=ok key={} tags={}",
            entry.key,
            entry.tags.len()
        );
        self.lock()?.insert(entry);
        Ok(())
    }

    fn delete_items(&self, keys: &[String]) -> CacheResult<()> {
        let mut state = self.lock()?;
        let removed = keys.iter().filter(|key| state.remove(key)).count();
        trace!("event=cache_delete module=cache status=ok keys={} removed={removed}", keys.len());
        Ok(())
    }

    fn invalidate_tags(&self, tags: &[String]) -> CacheResult<()> {
        let mut state = self.lock()?;
        let removed: usize = tags.iter().map(|tag| state.invalidate(tag)).sum();
        trace!("event=cache_invalidate module=cache status=ok tags={} removed={removed}", tags.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryTaggedCache;
    use crate::cache::backend::{CacheEntry, TaggedCache};
    use std::collections::BTreeSet;

    fn entry(key: &str, tags: &[&str]) -> CacheEntry {
        let tags: BTreeSet<String> = tags.iter().map(|tag| tag.to_string()).collect();
        CacheEntry::new(key, format!("payload-{key}"), tags)
    }

    #[test]
    fn save_then_get_returns_entry() {
        let cache = InMemoryTaggedCache::new();
        cache.save(entry("cai-2-1-a", &["cai-2"])).unwrap();

        let found = cache.get_item("cai-2-1-a").unwrap().unwrap();
        assert_eq!(found.payload, "payload-cai-2-1-a");
        assert!(cache.get_item("cai-2-1-b").unwrap().is_none());
    }

    #[test]
    fn resave_replaces_tags_in_index() {
        let cache = InMemoryTaggedCache::new();
        cache.save(entry("k", &["old"])).unwrap();
        cache.save(entry("k", &["new"])).unwrap();

        assert!(cache.keys_for_tag("old").is_empty());
        assert_eq!(cache.keys_for_tag("new"), vec!["k"]);

        cache.invalidate_tags(&["old".to_string()]).unwrap();
        assert!(cache.contains_key("k"));
    }

    #[test]
    fn invalidate_tag_removes_all_tagged_entries_and_their_index_refs() {
        let cache = InMemoryTaggedCache::new();
        cache.save(entry("cai-2-1-a", &["cai-2", "cai-2-1"])).unwrap();
        cache.save(entry("cai-2-2-a", &["cai-2", "cai-2-2"])).unwrap();
        cache.save(entry("cai-3-1-a", &["cai-3", "cai-3-1"])).unwrap();

        cache.invalidate_tags(&["cai-2".to_string()]).unwrap();

        assert_eq!(cache.len(), 1);
        assert!(cache.contains_key("cai-3-1-a"));
        assert!(cache.keys_for_tag("cai-2-1").is_empty());
        assert!(cache.keys_for_tag("cai-2-2").is_empty());
    }

    #[test]
    fn delete_items_ignores_unknown_keys() {
        let cache = InMemoryTaggedCache::new();
        cache.save(entry("a", &["t"])).unwrap();

        cache
            .delete_items(&["a".to_string(), "missing".to_string()])
            .unwrap();

        assert!(cache.is_empty());
        assert!(cache.keys_for_tag("t").is_empty());
    }

    #[test]
    fn get_items_returns_only_hits() {
        let cache = InMemoryTaggedCache::new();
        cache.save(entry("a", &[])).unwrap();

        let found = cache
            .get_items(&["a".to_string(), "b".to_string()])
            .unwrap();
        assert_eq!(found.len(), 1);
        assert!(found.contains_key("a"));
    }
}
