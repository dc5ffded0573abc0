//! # Plant Store
//!
//! Single source of truth for the user profile and the saved plants.
//! Both live as JSON blobs in a [`KeyValueStore`]; each saved plant owns
//! exactly one reminder in a [`NotificationScheduler`].
//!
//! - **Version**: 1.4.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.4.0: Collection writes are atomic in the store; `hour` is never persisted
//! - 1.3.0: Collection read-modify-write runs behind a single-writer lock
//! - 1.2.0: Re-save cancels the replaced reminder; unknown ids are reported
//! - 1.1.0: `plan_reminder` for catalog selections
//! - 1.0.0: Initial release

use super::models::{Plant, PlantCollection, StoredPlant, User};
use super::recurrence::{delay_seconds, format_hour, next_watering};
use super::summary::watering_summary;
use crate::core::{Clock, StoreError, StoreResult, SystemClock};
use crate::features::catalog::CatalogPlant;
use crate::features::reminders::{
    NotificationContent, NotificationPriority, NotificationScheduler, NotificationTrigger,
    ScheduleHandle,
};
use crate::features::storage::{
    load_json, save_json, update_json, KeyValueStore, PLANTS_KEY, USER_KEY,
};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

pub const REMINDER_TITLE: &str = "Heeeey, 🌱";

pub struct PlantStore {
    kv: Arc<dyn KeyValueStore>,
    scheduler: Arc<dyn NotificationScheduler>,
    clock: Arc<dyn Clock>,
    /// Orders schedule/cancel with the collection write inside this process
    plants_lock: Mutex<()>,
}

impl PlantStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, scheduler: Arc<dyn NotificationScheduler>) -> Self {
        Self {
            kv,
            scheduler,
            clock: Arc::new(SystemClock),
            plants_lock: Mutex::new(()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Store the profile entered during onboarding, replacing any previous one
    pub async fn save_user(&self, name: &str, picture: Option<&str>) -> StoreResult<User> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::validation("name", "must not be empty"));
        }

        let user = User {
            name: name.to_string(),
            picture: picture.unwrap_or_default().to_string(),
        };
        save_json(self.kv.as_ref(), USER_KEY, &user).await?;

        info!("Saved user profile for {}", user.name);
        Ok(user)
    }

    /// The saved profile, or the visitor placeholder before onboarding
    pub async fn get_user(&self) -> StoreResult<User> {
        let user: Option<User> = load_json(self.kv.as_ref(), USER_KEY).await?;
        Ok(user.unwrap_or_else(User::visitor))
    }

    /// Schedule the plant's next reminder and save it, replacing any entry
    /// with the same id. Returns the new schedule handle.
    ///
    /// A reminder scheduled before a failed write is not rolled back.
    pub async fn save_plant(&self, mut plant: Plant) -> StoreResult<ScheduleHandle> {
        if plant.id.trim().is_empty() {
            return Err(StoreError::validation("id", "must not be empty"));
        }
        if plant.frequency.times == 0 {
            return Err(StoreError::validation(
                "frequency.times",
                "must be greater than zero",
            ));
        }

        // Derived on load
        plant.hour.clear();

        let now = self.clock.now();
        let next = next_watering(&plant);
        let delay = delay_seconds(now, next);
        debug!(
            "Plant {} next watering at {} ({}s from now)",
            plant.id,
            next.to_rfc3339(),
            delay
        );

        let _guard = self.plants_lock.lock().await;

        let handle = self
            .scheduler
            .schedule(
                reminder_content(&plant),
                NotificationTrigger::once_after(delay),
            )
            .await?;

        let id = plant.id.clone();
        let stored = StoredPlant {
            data: plant,
            notification_id: handle.clone(),
        };
        let previous = update_json(
            self.kv.as_ref(),
            PLANTS_KEY,
            move |plants: &mut PlantCollection| {
                Ok::<_, StoreError>(plants.insert(stored.data.id.clone(), stored))
            },
        )
        .await?;

        if let Some(previous) = previous {
            if let Err(e) = self.scheduler.cancel(&previous.notification_id).await {
                warn!(
                    "Could not cancel replaced reminder {} for plant {id}: {e}",
                    previous.notification_id
                );
            }
        }

        info!("Saved plant {id} with reminder {handle}");
        Ok(handle)
    }

    /// Every saved plant with its `hour` filled in, earliest reminder first
    pub async fn load_plants(&self) -> StoreResult<Vec<Plant>> {
        let plants = self.load_collection().await?;

        let mut sorted: Vec<Plant> = plants
            .into_values()
            .map(|stored| {
                let mut plant = stored.data;
                plant.hour = format_hour(plant.date_time_notification);
                plant
            })
            .collect();
        sorted.sort_by_key(|plant| plant.date_time_notification.timestamp());

        Ok(sorted)
    }

    /// Cancel the plant's reminder and forget the plant
    pub async fn remove_plant(&self, id: &str) -> StoreResult<()> {
        let _guard = self.plants_lock.lock().await;

        let plants = self.load_collection().await?;
        let Some(stored) = plants.get(id) else {
            return Err(StoreError::NotFound { id: id.to_string() });
        };

        self.scheduler.cancel(&stored.notification_id).await?;

        let target = id.to_string();
        update_json(
            self.kv.as_ref(),
            PLANTS_KEY,
            move |plants: &mut PlantCollection| {
                plants.remove(&target);
                Ok::<_, StoreError>(())
            },
        )
        .await?;

        info!("Removed plant {id}");
        Ok(())
    }

    /// Turn a catalog selection into a plant reminded at `at`, which must
    /// lie in the future
    pub fn plan_reminder(&self, plant: CatalogPlant, at: DateTime<Utc>) -> StoreResult<Plant> {
        if at <= self.clock.now() {
            return Err(StoreError::validation(
                "dateTimeNotification",
                "choose a moment in the future",
            ));
        }
        Ok(plant.into_plant(at))
    }

    /// Headline for the saved plant list
    pub async fn watering_summary(&self) -> StoreResult<String> {
        let plants = self.load_plants().await?;
        Ok(watering_summary(&plants, self.clock.now()))
    }

    async fn load_collection(&self) -> StoreResult<PlantCollection> {
        let plants: Option<PlantCollection> = load_json(self.kv.as_ref(), PLANTS_KEY).await?;
        Ok(plants.unwrap_or_default())
    }
}

fn reminder_content(plant: &Plant) -> NotificationContent {
    NotificationContent {
        title: REMINDER_TITLE.to_string(),
        body: format!("Está na hora de cuidar da sua {}!", plant.name),
        sound: true,
        priority: NotificationPriority::High,
        data: serde_json::json!({
            "plant": { "id": plant.id, "name": plant.name }
        }),
    }
}
