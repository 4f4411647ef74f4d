//! # LeadFlow Store
//!
//! Persistence contract for the outreach engine.
//!
//! ## Features
//!
//! - Async key-value store trait with fallible `get`/`set`/`remove`
//! - In-memory and file-backed implementations
//! - One versioned envelope per logical entity under a canonical key
//! - One-shot migration of legacy unversioned keys

pub mod error;
pub mod file;
pub mod kv;
pub mod migrate;
pub mod schema;
pub mod settings;

pub use error::StoreError;
pub use file::FileKeyValueStore;
pub use kv::{KeyValueStore, MemoryKeyValueStore};
pub use migrate::{migrate_key, MigrationOutcome};
pub use schema::{load_versioned, save_versioned, Versioned, keys};
pub use settings::{load_rate_limit_config, migrate_rate_limit_config, save_rate_limit_config};
