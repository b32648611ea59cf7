//! Domain model for content additional information.
//!
//! # Responsibility
//! - Define the record shape shared by store, repository, cache and service.
//!
//! # Invariants
//! - A record is identified by `(content_id, version_no, identifier)`.
//! - Only `value` may change after a record is created.

pub mod info;
