//! # Reminders Feature
//!
//! One-shot notification scheduling with persisted pending reminders and a
//! polling delivery loop.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Scheduler contract split from the concrete store-backed scheduler
//! - 1.1.0: Delivered reminders stay cancellable until their plant is removed
//! - 1.0.0: Initial release with interval-driven delivery

pub mod delivery;
pub mod scheduler;

pub use delivery::{ChannelSink, LogSink, NotificationSink};
pub use scheduler::{
    NotificationContent, NotificationPriority, NotificationScheduler, NotificationTrigger,
    PendingNotification, ReminderScheduler, ScheduleHandle, SchedulerError,
};
