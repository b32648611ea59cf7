//! Additional information repository contracts and store-backed implementation.
//!
//! # Responsibility
//! - Provide typed load/list/create/update/delete/purge APIs.
//! - Encode and decode JSON value payloads around the raw record store.
//!
//! # Invariants
//! - Single-record `load` reports `NotFound` when no row matches.
//! - `list` returns an empty vector for unknown content versions.
//! - Persisted payloads that fail to decode are surfaced, never masked.

use crate::cache::backend::CacheError;
use crate::db::DbError;
use crate::model::info::{AdditionalInfo, ContentId, InfoKey, VersionNo};
use crate::repo::record_store::{RecordStore, StoredRow};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for additional information persistence and caching.
#[derive(Debug)]
pub enum RepoError {
    /// No record exists for the requested key.
    NotFound(InfoKey),
    Db(DbError),
    /// Stored or cached payload is not valid JSON for the expected shape.
    Serialization(serde_json::Error),
    Cache(CacheError),
}

impl RepoError {
    /// Whether this error is the recoverable "no such record" signal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(key) => write!(f, "content additional information not found: {key}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "invalid additional information payload: {err}"),
            Self::Cache(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::Cache(err) => Some(err),
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

impl From<CacheError> for RepoError {
    fn from(value: CacheError) -> Self {
        Self::Cache(value)
    }
}

/// Repository interface for additional information records.
///
/// Implemented by the store-backed repository and by the cache-aside handler,
/// so callers can stack the cache in front of any repository.
pub trait AdditionalInfoRepository {
    fn load(
        &self,
        content_id: ContentId,
        version_no: VersionNo,
        identifier: &str,
    ) -> RepoResult<AdditionalInfo>;
    fn list(&self, content_id: ContentId, version_no: VersionNo)
        -> RepoResult<Vec<AdditionalInfo>>;
    fn create(
        &self,
        content_id: ContentId,
        version_no: VersionNo,
        identifier: &str,
        value: &Value,
    ) -> RepoResult<()>;
    fn update(
        &self,
        content_id: ContentId,
        version_no: VersionNo,
        identifier: &str,
        value: &Value,
    ) -> RepoResult<()>;
    fn delete(
        &self,
        content_id: ContentId,
        version_no: VersionNo,
        identifier: Option<&str>,
    ) -> RepoResult<()>;
    fn purge(&self, content_ids: &[ContentId]) -> RepoResult<()>;

    /// Loads several identifiers of one version, skipping missing ones.
    ///
    /// Result order follows `identifiers`.
    fn load_many(
        &self,
        content_id: ContentId,
        version_no: VersionNo,
        identifiers: &[&str],
    ) -> RepoResult<Vec<AdditionalInfo>> {
        let mut found = Vec::with_capacity(identifiers.len());
        for identifier in identifiers {
            match self.load(content_id, version_no, identifier) {
                Ok(info) => found.push(info),
                Err(err) if err.is_not_found() => continue,
                Err(err) => return Err(err),
            }
        }
        Ok(found)
    }
}

macro_rules! forward_repository {
    ($($target:ty),+) => {$(
        impl<R: AdditionalInfoRepository + ?Sized> AdditionalInfoRepository for $target {
            fn load(
                &self,
                content_id: ContentId,
                version_no: VersionNo,
                identifier: &str,
            ) -> RepoResult<AdditionalInfo> {
                (**self).load(content_id, version_no, identifier)
            }

            fn list(
                &self,
                content_id: ContentId,
                version_no: VersionNo,
            ) -> RepoResult<Vec<AdditionalInfo>> {
                (**self).list(content_id, version_no)
            }

            fn create(
                &self,
                content_id: ContentId,
                version_no: VersionNo,
                identifier: &str,
                value: &Value,
            ) -> RepoResult<()> {
                (**self).create(content_id, version_no, identifier, value)
            }

            fn update(
                &self,
                content_id: ContentId,
                version_no: VersionNo,
                identifier: &str,
                value: &Value,
            ) -> RepoResult<()> {
                (**self).update(content_id, version_no, identifier, value)
            }

            fn delete(
                &self,
                content_id: ContentId,
                version_no: VersionNo,
                identifier: Option<&str>,
            ) -> RepoResult<()> {
                (**self).delete(content_id, version_no, identifier)
            }

            fn purge(&self, content_ids: &[ContentId]) -> RepoResult<()> {
                (**self).purge(content_ids)
            }

            fn load_many(
                &self,
                content_id: ContentId,
                version_no: VersionNo,
                identifiers: &[&str],
            ) -> RepoResult<Vec<AdditionalInfo>> {
                (**self).load_many(content_id, version_no, identifiers)
            }
        }
    )+};
}

forward_repository!(&R, Box<R>);

/// Repository that maps rows of a `RecordStore` into typed records.
pub struct StoreBackedRepository<S: RecordStore> {
    store: S,
}

impl<S: RecordStore> StoreBackedRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: RecordStore> AdditionalInfoRepository for StoreBackedRepository<S> {
    fn load(
        &self,
        content_id: ContentId,
        version_no: VersionNo,
        identifier: &str,
    ) -> RepoResult<AdditionalInfo> {
        let rows = self.store.load(content_id, version_no, Some(identifier))?;
        match rows.into_iter().next() {
            Some(row) => map_row(row),
            None => Err(RepoError::NotFound(InfoKey::new(
                content_id, version_no, identifier,
            ))),
        }
    }

    fn list(
        &self,
        content_id: ContentId,
        version_no: VersionNo,
    ) -> RepoResult<Vec<AdditionalInfo>> {
        self.store
            .load(content_id, version_no, None)?
            .into_iter()
            .map(map_row)
            .collect()
    }

    fn create(
        &self,
        content_id: ContentId,
        version_no: VersionNo,
        identifier: &str,
        value: &Value,
    ) -> RepoResult<()> {
        let encoded = encode_value(value)?;
        self.store.insert(content_id, version_no, identifier, &encoded)
    }

    fn update(
        &self,
        content_id: ContentId,
        version_no: VersionNo,
        identifier: &str,
        value: &Value,
    ) -> RepoResult<()> {
        let encoded = encode_value(value)?;
        self.store.update(content_id, version_no, identifier, &encoded)
    }

    fn delete(
        &self,
        content_id: ContentId,
        version_no: VersionNo,
        identifier: Option<&str>,
    ) -> RepoResult<()> {
        self.store.delete(content_id, version_no, identifier)
    }

    fn purge(&self, content_ids: &[ContentId]) -> RepoResult<()> {
        self.store.purge(content_ids)
    }
}

fn map_row(row: StoredRow) -> RepoResult<AdditionalInfo> {
    let value = decode_value(&row.value)?;
    Ok(AdditionalInfo::new(
        row.content_id,
        row.version_no,
        row.identifier,
        value,
    ))
}

fn encode_value(value: &Value) -> RepoResult<String> {
    Ok(serde_json::to_string(value)?)
}

fn decode_value(stored: &str) -> RepoResult<Value> {
    Ok(serde_json::from_str(stored)?)
}
