//! # Plants Feature
//!
//! The saved-plant store: user profile, saved plants, and the watering
//! reminder attached to each one.
//!
//! - **Version**: 1.3.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.3.0: Serialize plant collection writes behind a single-writer lock
//! - 1.2.0: Re-saving a plant cancels the reminder it replaces
//! - 1.1.0: Watering summary headline for the saved plant list
//! - 1.0.0: Initial release with save/load/remove and weekly recurrence

pub mod models;
pub mod recurrence;
pub mod store;
pub mod summary;

pub use models::{Frequency, Plant, PlantCollection, RepeatEvery, StoredPlant, User};
pub use recurrence::{
    delay_seconds, format_hour, next_watering, watering_interval, MIN_DELAY_SECONDS,
};
pub use store::PlantStore;
pub use summary::{humanize_distance, watering_summary};
