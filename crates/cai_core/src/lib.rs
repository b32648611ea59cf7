//! Content additional information core.
//!
//! Versioned, identifier-keyed JSON metadata for content items, persisted in
//! SQLite and served through a tagged cache-aside layer.

pub mod cache;
pub mod config;
pub mod db;
pub mod lifecycle;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use cache::backend::{CacheEntry, CacheError, CacheResult, TaggedCache};
pub use cache::handler::CachedInfoRepository;
pub use cache::logger::CacheStats;
pub use cache::memory::InMemoryTaggedCache;
pub use config::{CacheSettings, ConfigError, CoreConfig, LogSettings};
pub use lifecycle::{ContentEvent, ContentEventSubscriber};
pub use logging::{default_level, init_logging, logging_status, ActiveLogging, LoggingError};
pub use model::info::{AdditionalInfo, ContentId, InfoKey, VersionNo};
pub use repo::info_repo::{
    AdditionalInfoRepository, RepoError, RepoResult, StoreBackedRepository,
};
pub use repo::record_store::{RecordStore, SqliteRecordStore, StoredRow, PURGE_BATCH_SIZE};
pub use service::info_service::{
    build_service, AdditionalInfoService, DynInfoRepository, SetOutcome,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
