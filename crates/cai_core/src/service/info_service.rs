//! Additional information use-case service.
//!
//! # Responsibility
//! - Provide get/get_all/set/delete/purge entry points for callers.
//! - Implement the upsert policy of `set` and version copy-forward.
//!
//! # Invariants
//! - The service never touches caches or SQL directly; it only sees an
//!   `AdditionalInfoRepository` (cached or not).
//! - `set` is read-then-write and not atomic. Two concurrent `set` calls for
//!   one new key may both create; the store's primary key rejects the second
//!   and that error is returned unchanged, without retry.

use crate::cache::backend::TaggedCache;
use crate::cache::handler::CachedInfoRepository;
use crate::config::CacheSettings;
use crate::model::info::{AdditionalInfo, ContentId, VersionNo};
use crate::repo::info_repo::{AdditionalInfoRepository, RepoResult, StoreBackedRepository};
use crate::repo::record_store::SqliteRecordStore;
use log::{debug, info};
use rusqlite::Connection;
use serde_json::Value;

/// Repository handle used by services assembled at runtime.
pub type DynInfoRepository<'a> = Box<dyn AdditionalInfoRepository + 'a>;

/// What `set` ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    Created,
    Updated,
}

/// Use-case service for additional information records.
pub struct AdditionalInfoService<R: AdditionalInfoRepository> {
    repo: R,
}

impl<R: AdditionalInfoRepository> AdditionalInfoService<R> {
    /// Creates a service over a plain or cached repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Gets one record; fails with `RepoError::NotFound` when absent.
    pub fn get(
        &self,
        content_id: ContentId,
        version_no: VersionNo,
        identifier: &str,
    ) -> RepoResult<AdditionalInfo> {
        self.repo.load(content_id, version_no, identifier)
    }

    /// Gets every record of one content version, ordered by identifier.
    pub fn get_all(
        &self,
        content_id: ContentId,
        version_no: VersionNo,
    ) -> RepoResult<Vec<AdditionalInfo>> {
        self.repo.list(content_id, version_no)
    }

    /// Gets the existing records among `identifiers`, in request order.
    pub fn get_many(
        &self,
        content_id: ContentId,
        version_no: VersionNo,
        identifiers: &[&str],
    ) -> RepoResult<Vec<AdditionalInfo>> {
        self.repo.load_many(content_id, version_no, identifiers)
    }

    /// Updates the record when it exists, creates it otherwise.
    pub fn set(
        &self,
        content_id: ContentId,
        version_no: VersionNo,
        identifier: &str,
        value: &Value,
    ) -> RepoResult<SetOutcome> {
        match self.repo.load(content_id, version_no, identifier) {
            Ok(_) => {
                self.repo.update(content_id, version_no, identifier, value)?;
                Ok(SetOutcome::Updated)
            }
            Err(err) if err.is_not_found() => {
                self.repo.create(content_id, version_no, identifier, value)?;
                Ok(SetOutcome::Created)
            }
            Err(err) => Err(err),
        }
    }

    /// Deletes one record, or all records of the version when `identifier` is `None`.
    pub fn delete(
        &self,
        content_id: ContentId,
        version_no: VersionNo,
        identifier: Option<&str>,
    ) -> RepoResult<()> {
        self.repo.delete(content_id, version_no, identifier)
    }

    /// Deletes every record of every version of the given content items.
    pub fn purge(&self, content_ids: &[ContentId]) -> RepoResult<()> {
        self.repo.purge(content_ids)
    }

    /// Copies every record of a source version onto a target version.
    ///
    /// Existing target records with the same identifier are overwritten.
    /// Returns the number of records copied.
    pub fn copy_version(
        &self,
        source_content_id: ContentId,
        source_version_no: VersionNo,
        target_content_id: ContentId,
        target_version_no: VersionNo,
    ) -> RepoResult<usize> {
        let records = self.get_all(source_content_id, source_version_no)?;
        for record in &records {
            self.set(
                target_content_id,
                target_version_no,
                &record.identifier,
                &record.value,
            )?;
        }
        debug!(
            "event=copy_version module=service status=ok source={source_content_id}/{source_version_no} target={target_content_id}/{target_version_no} records={}",
            records.len()
        );
        Ok(records.len())
    }
}

/// Assembles a service over SQLite, cached when `settings.enabled`.
pub fn build_service<'a, C>(
    conn: &'a Connection,
    cache: C,
    settings: &CacheSettings,
) -> AdditionalInfoService<DynInfoRepository<'a>>
where
    C: TaggedCache + 'a,
{
    let repo = StoreBackedRepository::new(SqliteRecordStore::new(conn));
    info!(
        "event=service_build module=service status=ok cache_enabled={}",
        settings.enabled
    );
    let repo: DynInfoRepository<'a> = if settings.enabled {
        Box::new(CachedInfoRepository::new(repo, cache))
    } else {
        Box::new(repo)
    };
    AdditionalInfoService::new(repo)
}
