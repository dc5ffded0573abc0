//! # Storage Feature
//!
//! String-keyed persistence adapters backing the plant store and the
//! reminder scheduler. Values are JSON documents, one per well-known key.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Atomic `update` so separate processes can share one database
//! - 1.1.0: SQLite-backed store for durable installs
//! - 1.0.0: Initial release with in-memory store and typed JSON helpers

pub mod kv;
pub mod sqlite;

pub use kv::{
    load_json, save_json, update_json, KeyValueStore, MemoryKeyValueStore, StorageError, UpdateFn,
    NOTIFICATIONS_KEY, PLANTS_KEY, USER_KEY,
};
pub use self::sqlite::SqliteKeyValueStore;
