//! # Features
//!
//! Each submodule is one feature with its own version header.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Catalog client
//! - 1.1.0: Store-backed reminder scheduler
//! - 1.0.0: Plants and storage

pub mod catalog;
pub mod plants;
pub mod reminders;
pub mod storage;

pub use catalog::{CatalogClient, CatalogError, CatalogPlant, Environment};
pub use plants::{Frequency, Plant, PlantStore, RepeatEvery, StoredPlant, User};
pub use reminders::{
    LogSink, NotificationContent, NotificationScheduler, NotificationSink, NotificationTrigger,
    ReminderScheduler, ScheduleHandle, SchedulerError,
};
pub use storage::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore, StorageError};
