//! Additional information record.
//!
//! # Responsibility
//! - Define the canonical `(content, version, identifier) -> value` record.
//! - Provide the composite key used by persistence and cache layers.
//!
//! # Invariants
//! - `identifier` is unique per content version.
//! - `value` is any JSON value and is treated as opaque by core code.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};

/// Integer id of a content item in the host repository.
pub type ContentId = i64;

/// Version sequence number, scoped to one content item.
pub type VersionNo = i64;

/// Composite identity of one additional information record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InfoKey {
    pub content_id: ContentId,
    pub version_no: VersionNo,
    pub identifier: String,
}

impl InfoKey {
    pub fn new(content_id: ContentId, version_no: VersionNo, identifier: impl Into<String>) -> Self {
        Self {
            content_id,
            version_no,
            identifier: identifier.into(),
        }
    }
}

impl Display for InfoKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "content_id={} version_no={} identifier={}",
            self.content_id, self.version_no, self.identifier
        )
    }
}

/// One metadata slot attached to a content version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditionalInfo {
    pub content_id: ContentId,
    /// Serialized as `version` to keep cache payloads short.
    #[serde(rename = "version")]
    pub version_no: VersionNo,
    pub identifier: String,
    /// Arbitrary JSON payload. Callers only store, retrieve and compare it.
    pub value: Value,
}

impl AdditionalInfo {
    pub fn new(
        content_id: ContentId,
        version_no: VersionNo,
        identifier: impl Into<String>,
        value: Value,
    ) -> Self {
        Self {
            content_id,
            version_no,
            identifier: identifier.into(),
            value,
        }
    }

    /// Returns the composite key of this record.
    pub fn key(&self) -> InfoKey {
        InfoKey::new(self.content_id, self.version_no, self.identifier.as_str())
    }
}
