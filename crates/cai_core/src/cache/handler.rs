//! Cache-aside handler over an additional information repository.
//!
//! # Responsibility
//! - Serve `load`/`list`/`load_many` from the tagged cache, filling it on miss.
//! - On writes, persist through the inner repository first, then evict the
//!   cache entries that may now be stale.
//!
//! # Invariants
//! - A failed inner write returns before any cache mutation.
//! - `NotFound` is never cached; a later create is visible on the next read.
//! - Every cached record, alone or inside a list, carries its content,
//!   version and record tags.
//! - Cache failures propagate; there is no serve-stale fallback.
//!
//! # Write eviction
//! | operation            | eviction                                   |
//! |----------------------|--------------------------------------------|
//! | `create`             | delete key `cai-c-v`                       |
//! | `update`             | delete keys `cai-c-v-id`, `cai-c-v`        |
//! | `delete(Some(id))`   | delete keys `cai-c-v-id`, `cai-c-v`        |
//! | `delete(None)`       | invalidate tag `cai-c-v`                   |
//! | `purge(ids)`         | invalidate tag `cai-c` for each id         |
//!
//! `create`, `update` and `delete(Some)` evict more than the record key alone:
//! they also drop the version list key `cai-c-v`, so a cached list never
//! outlives a write to one of its records.

use crate::cache::backend::{CacheEntry, TaggedCache};
use crate::cache::keys;
use crate::cache::logger::{CacheStats, PersistenceLogger};
use crate::model::info::{AdditionalInfo, ContentId, VersionNo};
use crate::repo::info_repo::{AdditionalInfoRepository, RepoResult};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

/// Repository decorator implementing the cache-aside protocol.
pub struct CachedInfoRepository<R, C> {
    inner: R,
    cache: C,
    logger: PersistenceLogger,
}

impl<R: AdditionalInfoRepository, C: TaggedCache> CachedInfoRepository<R, C> {
    pub fn new(inner: R, cache: C) -> Self {
        Self {
            inner,
            cache,
            logger: PersistenceLogger::new(),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Hit/miss/call counters observed by this handler.
    pub fn stats(&self) -> CacheStats {
        self.logger.stats()
    }

    fn store_entry<T: Serialize + ?Sized>(
        &self,
        key: String,
        value: &T,
        tags: BTreeSet<String>,
    ) -> RepoResult<()> {
        let payload = serde_json::to_string(value)?;
        self.cache.save(CacheEntry::new(key, payload, tags))?;
        Ok(())
    }
}

impl<R: AdditionalInfoRepository, C: TaggedCache> AdditionalInfoRepository
    for CachedInfoRepository<R, C>
{
    fn load(
        &self,
        content_id: ContentId,
        version_no: VersionNo,
        identifier: &str,
    ) -> RepoResult<AdditionalInfo> {
        let key = keys::record_key(content_id, version_no, identifier);
        if let Some(entry) = self.cache.get_item(&key)? {
            self.logger.log_cache_hit(&key);
            return Ok(serde_json::from_str(&entry.payload)?);
        }

        self.logger.log_cache_miss(&key);
        let info = self.inner.load(content_id, version_no, identifier)?;
        let tags = keys::record_tags(&info);
        self.store_entry(key, &info, tags)?;
        Ok(info)
    }

    fn list(
        &self,
        content_id: ContentId,
        version_no: VersionNo,
    ) -> RepoResult<Vec<AdditionalInfo>> {
        let key = keys::list_key(content_id, version_no);
        if let Some(entry) = self.cache.get_item(&key)? {
            self.logger.log_cache_hit(&key);
            return Ok(serde_json::from_str(&entry.payload)?);
        }

        self.logger.log_cache_miss(&key);
        let items = self.inner.list(content_id, version_no)?;
        let tags = keys::list_tags(content_id, version_no, &items);
        self.store_entry(key, items.as_slice(), tags)?;
        Ok(items)
    }

    fn load_many(
        &self,
        content_id: ContentId,
        version_no: VersionNo,
        identifiers: &[&str],
    ) -> RepoResult<Vec<AdditionalInfo>> {
        let cache_keys: Vec<String> = identifiers
            .iter()
            .map(|identifier| keys::record_key(content_id, version_no, identifier))
            .collect();
        let cached = self.cache.get_items(&cache_keys)?;

        let mut found = Vec::with_capacity(identifiers.len());
        for (identifier, key) in identifiers.iter().zip(cache_keys) {
            if let Some(entry) = cached.get(&key) {
                self.logger.log_cache_hit(&key);
                found.push(serde_json::from_str(&entry.payload)?);
                continue;
            }

            self.logger.log_cache_miss(&key);
            match self.inner.load(content_id, version_no, identifier) {
                Ok(info) => {
                    let tags = keys::record_tags(&info);
                    self.store_entry(key, &info, tags)?;
                    found.push(info);
                }
                Err(err) if err.is_not_found() => continue,
                Err(err) => return Err(err),
            }
        }
        Ok(found)
    }

    fn create(
        &self,
        content_id: ContentId,
        version_no: VersionNo,
        identifier: &str,
        value: &Value,
    ) -> RepoResult<()> {
        self.logger
            .log_call("create", &call_args(content_id, version_no, Some(identifier)));
        self.inner.create(content_id, version_no, identifier, value)?;
        self.cache
            .delete_items(&[keys::list_key(content_id, version_no)])?;
        Ok(())
    }

    fn update(
        &self,
        content_id: ContentId,
        version_no: VersionNo,
        identifier: &str,
        value: &Value,
    ) -> RepoResult<()> {
        self.logger
            .log_call("update", &call_args(content_id, version_no, Some(identifier)));
        self.inner.update(content_id, version_no, identifier, value)?;
        self.cache.delete_items(&[
            keys::record_key(content_id, version_no, identifier),
            keys::list_key(content_id, version_no),
        ])?;
        Ok(())
    }

    fn delete(
        &self,
        content_id: ContentId,
        version_no: VersionNo,
        identifier: Option<&str>,
    ) -> RepoResult<()> {
        self.logger
            .log_call("delete", &call_args(content_id, version_no, identifier));
        self.inner.delete(content_id, version_no, identifier)?;
        match identifier {
            Some(identifier) => self.cache.delete_items(&[
                keys::record_key(content_id, version_no, identifier),
                keys::list_key(content_id, version_no),
            ])?,
            None => self
                .cache
                .invalidate_tags(&[keys::version_tag(content_id, version_no)])?,
        }
        Ok(())
    }

    fn purge(&self, content_ids: &[ContentId]) -> RepoResult<()> {
        self.logger
            .log_call("purge", &format!("content_ids={content_ids:?}"));
        if content_ids.is_empty() {
            return Ok(());
        }

        self.inner.purge(content_ids)?;
        let tags: Vec<String> = content_ids
            .iter()
            .map(|content_id| keys::content_tag(*content_id))
            .collect();
        self.cache.invalidate_tags(&tags)?;
        Ok(())
    }
}

fn call_args(content_id: ContentId, version_no: VersionNo, identifier: Option<&str>) -> String {
    match identifier {
        Some(identifier) => {
            format!("content_id={content_id} version_no={version_no} identifier={identifier}")
        }
        None => format!("content_id={content_id} version_no={version_no}"),
    }
}
