// Core layer - config, errors, clock
pub mod core;

// Features layer - storage, reminders, plants, catalog
pub mod features;

pub use core::{Config, StoreError, StoreResult};

pub use features::{
    // Catalog
    CatalogClient, CatalogError, CatalogPlant, Environment,
    // Plants
    Frequency, Plant, PlantStore, RepeatEvery, StoredPlant, User,
    // Reminders
    LogSink, NotificationContent, NotificationScheduler, NotificationSink, NotificationTrigger,
    ReminderScheduler, ScheduleHandle, SchedulerError,
    // Storage
    KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore, StorageError,
};
