//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - `record_store`: raw row persistence, SQL lives only here.
//! - `info_repo`: typed records and JSON value encoding on top of the store.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.
//! - Write ordering is left to callers; the repository never touches caches.

pub mod info_repo;
pub mod record_store;
