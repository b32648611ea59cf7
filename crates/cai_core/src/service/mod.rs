//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep callers (CLI, lifecycle adapter) decoupled from caching and storage.

pub mod info_service;
