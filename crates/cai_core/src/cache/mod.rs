//! Cache-aside layer for additional information records.
//!
//! # Responsibility
//! - `keys`: cache key and tag derivation.
//! - `backend`: tagged cache contract plus `memory`, its in-process implementation.
//! - `handler`: cache-aside decorator over any repository.
//! - `logger`: call/hit/miss observations.
//!
//! # Invariants
//! - Cached entries are derived replicas; the record store always wins.
//! - Writes reach the durable store strictly before cache eviction.

pub mod backend;
pub mod handler;
pub mod keys;
pub mod logger;
pub mod memory;
