//! # Reminder Scheduler
//!
//! The notification contract consumed by the plant store, plus the
//! concrete scheduler that keeps pending reminders in a [`KeyValueStore`].
//!
//! - **Version**: 2.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.1.0: Atomic table updates; `due` and `mark_delivered` replace `take_due`
//! - 2.0.0: `NotificationScheduler` trait; handles are UUID v4 strings
//! - 1.1.0: Keep delivered records so late cancels still succeed
//! - 1.0.0: Initial release

use crate::core::{Clock, SystemClock};
use crate::features::storage::{
    load_json, update_json, KeyValueStore, StorageError, NOTIFICATIONS_KEY,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("trigger rejected: {0}")]
    Rejected(String),
    #[error("no scheduled notification with handle '{0}'")]
    UnknownHandle(String),
    #[error("notification storage failure: {0}")]
    Storage(#[from] StorageError),
}

/// Android-style priority hint carried with the content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Min,
    Low,
    #[default]
    Default,
    High,
    Max,
}

/// What the user sees when the reminder fires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub sound: bool,
    #[serde(default)]
    pub priority: NotificationPriority,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// When the reminder fires, relative to the moment it is scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationTrigger {
    #[serde(rename = "seconds")]
    pub delay_seconds: u64,
    pub repeats: bool,
}

impl NotificationTrigger {
    pub fn once_after(delay_seconds: u64) -> Self {
        Self {
            delay_seconds,
            repeats: false,
        }
    }
}

/// Opaque identifier of a scheduled notification
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduleHandle(String);

impl ScheduleHandle {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ScheduleHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Host notification service as seen by the plant store
#[async_trait]
pub trait NotificationScheduler: Send + Sync {
    async fn schedule(
        &self,
        content: NotificationContent,
        trigger: NotificationTrigger,
    ) -> Result<ScheduleHandle, SchedulerError>;

    async fn cancel(&self, handle: &ScheduleHandle) -> Result<(), SchedulerError>;
}

/// A reminder record as persisted by [`ReminderScheduler`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingNotification {
    pub handle: ScheduleHandle,
    pub content: NotificationContent,
    pub scheduled_at: DateTime<Utc>,
    pub fire_at: DateTime<Utc>,
    /// Set once the delivery loop has handed the reminder to a sink
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
}

type NotificationTable = BTreeMap<ScheduleHandle, PendingNotification>;

/// Store-backed scheduler. Records survive restarts, so a reminder saved
/// by one process is delivered by whichever process runs the loop. Every
/// change goes through [`update_json`], so processes sharing the store do
/// not overwrite each other's records.
pub struct ReminderScheduler {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl ReminderScheduler {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    async fn load_table(&self) -> Result<NotificationTable, StorageError> {
        Ok(load_json(self.store.as_ref(), NOTIFICATIONS_KEY)
            .await?
            .unwrap_or_default())
    }

    /// Reminders not yet delivered, earliest first
    pub async fn pending(&self) -> Result<Vec<PendingNotification>, SchedulerError> {
        let table = self.load_table().await?;
        let mut pending: Vec<PendingNotification> = table
            .into_values()
            .filter(|n| n.delivered_at.is_none())
            .collect();
        pending.sort_by_key(|n| n.fire_at);
        Ok(pending)
    }

    /// Look up a record by handle, delivered or not
    pub async fn get(
        &self,
        handle: &ScheduleHandle,
    ) -> Result<Option<PendingNotification>, SchedulerError> {
        Ok(self.load_table().await?.remove(handle))
    }

    /// Undelivered reminders due at `now`, earliest first. Nothing is
    /// marked; call [`mark_delivered`](Self::mark_delivered) once a sink
    /// has accepted one.
    pub async fn due(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<PendingNotification>, SchedulerError> {
        let mut due: Vec<PendingNotification> = self
            .load_table()
            .await?
            .into_values()
            .filter(|n| n.delivered_at.is_none() && n.fire_at <= now)
            .collect();
        due.sort_by_key(|n| n.fire_at);
        Ok(due)
    }

    /// Record that `handle` was delivered at `at`. Returns `false` when the
    /// reminder was cancelled or already marked in the meantime. Delivered
    /// records stay in the table until cancelled.
    pub async fn mark_delivered(
        &self,
        handle: &ScheduleHandle,
        at: DateTime<Utc>,
    ) -> Result<bool, SchedulerError> {
        let handle = handle.clone();
        let marked = update_json(
            self.store.as_ref(),
            NOTIFICATIONS_KEY,
            move |table: &mut NotificationTable| {
                Ok::<_, SchedulerError>(match table.get_mut(&handle) {
                    Some(record) if record.delivered_at.is_none() => {
                        record.delivered_at = Some(at);
                        true
                    }
                    _ => false,
                })
            },
        )
        .await?;
        Ok(marked)
    }
}

#[async_trait]
impl NotificationScheduler for ReminderScheduler {
    async fn schedule(
        &self,
        content: NotificationContent,
        trigger: NotificationTrigger,
    ) -> Result<ScheduleHandle, SchedulerError> {
        if trigger.repeats {
            return Err(SchedulerError::Rejected(
                "repeating triggers are not supported".to_string(),
            ));
        }
        if trigger.delay_seconds == 0 {
            return Err(SchedulerError::Rejected(
                "trigger delay must be at least one second".to_string(),
            ));
        }
        let delay = i64::try_from(trigger.delay_seconds)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| {
                SchedulerError::Rejected(format!(
                    "trigger delay of {}s is out of range",
                    trigger.delay_seconds
                ))
            })?;

        let now = self.clock.now();
        let fire_at = now
            .checked_add_signed(delay)
            .ok_or_else(|| SchedulerError::Rejected("fire time overflows".to_string()))?;
        let handle = ScheduleHandle::new(Uuid::new_v4().to_string());

        let record = PendingNotification {
            handle: handle.clone(),
            content,
            scheduled_at: now,
            fire_at,
            delivered_at: None,
        };
        update_json(
            self.store.as_ref(),
            NOTIFICATIONS_KEY,
            move |table: &mut NotificationTable| {
                table.insert(record.handle.clone(), record);
                Ok::<_, SchedulerError>(())
            },
        )
        .await?;

        info!(
            "Scheduled reminder {} in {}s ({})",
            handle,
            trigger.delay_seconds,
            fire_at.to_rfc3339()
        );
        Ok(handle)
    }

    async fn cancel(&self, handle: &ScheduleHandle) -> Result<(), SchedulerError> {
        let target = handle.clone();
        update_json(
            self.store.as_ref(),
            NOTIFICATIONS_KEY,
            move |table: &mut NotificationTable| match table.remove(&target) {
                Some(_) => Ok(()),
                None => Err(SchedulerError::UnknownHandle(target.to_string())),
            },
        )
        .await?;

        info!("Cancelled reminder {handle}");
        Ok(())
    }
}
