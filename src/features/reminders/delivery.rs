//! Reminder delivery: sinks and the polling loop that feeds them.

use super::scheduler::{PendingNotification, ReminderScheduler};
use anyhow::Result;
use async_trait::async_trait;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

/// Destination for reminders that have come due
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: &PendingNotification) -> Result<()>;
}

/// Delivers reminders by logging them
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn deliver(&self, notification: &PendingNotification) -> Result<()> {
        info!(
            "🔔 {} {} [{}]",
            notification.content.title, notification.content.body, notification.handle
        );
        Ok(())
    }
}

/// Forwards reminders into an mpsc channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<PendingNotification>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PendingNotification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl NotificationSink for ChannelSink {
    async fn deliver(&self, notification: &PendingNotification) -> Result<()> {
        self.tx
            .send(notification.clone())
            .map_err(|_| anyhow::anyhow!("reminder receiver dropped"))
    }
}

impl ReminderScheduler {
    /// Hand every reminder due now to `sink`. Returns how many were delivered.
    ///
    /// A reminder is marked delivered only after the sink accepts it, so a
    /// failed delivery is retried on the next call.
    pub async fn deliver_due(&self, sink: &dyn NotificationSink) -> usize {
        let due = match self.due(self.now()).await {
            Ok(due) => due,
            Err(e) => {
                error!("Failed to read due reminders: {e}");
                return 0;
            }
        };

        let mut delivered = 0;
        for notification in &due {
            if let Err(e) = sink.deliver(notification).await {
                warn!("Failed to deliver reminder {}: {e}", notification.handle);
                continue;
            }
            delivered += 1;
            match self.mark_delivered(&notification.handle, self.now()).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!("Reminder {} was cancelled during delivery", notification.handle)
                }
                Err(e) => error!(
                    "Delivered reminder {} but could not record it: {e}",
                    notification.handle
                ),
            }
        }
        delivered
    }

    /// Poll for due reminders every `poll_interval` until `shutdown` flips
    /// to `true` or its sender is dropped.
    pub async fn run(
        self: Arc<Self>,
        sink: Arc<dyn NotificationSink>,
        poll_interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut interval = tokio::time::interval(poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Reminder loop started (every {}s)", poll_interval.as_secs());

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let delivered = self.deliver_due(sink.as_ref()).await;
                    if delivered > 0 {
                        info!("Delivered {delivered} reminder(s)");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Reminder loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FixedClock;
    use crate::core::clock::Clock;
    use crate::features::reminders::{
        NotificationContent, NotificationPriority, NotificationScheduler, NotificationTrigger,
    };
    use crate::features::storage::MemoryKeyValueStore;
    use chrono::{TimeZone, Utc};

    struct FailingSink;

    #[async_trait]
    impl NotificationSink for FailingSink {
        async fn deliver(&self, _notification: &PendingNotification) -> Result<()> {
            Err(anyhow::anyhow!("device offline"))
        }
    }

    fn content() -> NotificationContent {
        NotificationContent {
            title: "Heeeey, 🌱".to_string(),
            body: "Está na hora de cuidar da sua Aningapara!".to_string(),
            sound: true,
            priority: NotificationPriority::High,
            data: serde_json::Value::Null,
        }
    }

    #[tokio::test]
    async fn test_deliver_due_forwards_to_sink() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let clock = Arc::new(FixedClock::new(start));
        let scheduler = ReminderScheduler::new(Arc::new(MemoryKeyValueStore::new()))
            .with_clock(clock.clone());
        let handle = scheduler
            .schedule(content(), NotificationTrigger::once_after(60))
            .await
            .unwrap();

        let (sink, mut rx) = ChannelSink::new();
        assert_eq!(scheduler.deliver_due(&sink).await, 0);

        clock.advance(chrono::Duration::seconds(61));
        assert_eq!(scheduler.deliver_due(&sink).await, 1);
        let received = rx.recv().await.unwrap();
        assert_eq!(received.handle, handle);
        assert_eq!(received.content.body, content().body);
    }

    #[tokio::test]
    async fn test_sink_failure_is_not_counted() {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let scheduler = ReminderScheduler::new(Arc::new(MemoryKeyValueStore::new()))
            .with_clock(clock.clone());
        scheduler
            .schedule(content(), NotificationTrigger::once_after(60))
            .await
            .unwrap();
        clock.advance(chrono::Duration::minutes(2));

        assert_eq!(scheduler.deliver_due(&FailingSink).await, 0);
    }

    #[tokio::test]
    async fn test_failed_delivery_is_retried_next_tick() {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let scheduler = ReminderScheduler::new(Arc::new(MemoryKeyValueStore::new()))
            .with_clock(clock.clone());
        let handle = scheduler
            .schedule(content(), NotificationTrigger::once_after(60))
            .await
            .unwrap();
        clock.advance(chrono::Duration::minutes(2));

        assert_eq!(scheduler.deliver_due(&FailingSink).await, 0);
        assert_eq!(scheduler.pending().await.unwrap().len(), 1);

        let (sink, mut rx) = ChannelSink::new();
        assert_eq!(scheduler.deliver_due(&sink).await, 1);
        assert_eq!(rx.recv().await.unwrap().handle, handle);

        // Marked once accepted
        assert_eq!(scheduler.deliver_due(&sink).await, 0);
        let record = scheduler.get(&handle).await.unwrap().unwrap();
        assert_eq!(record.delivered_at, Some(clock.now()));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let scheduler = Arc::new(
            ReminderScheduler::new(Arc::new(MemoryKeyValueStore::new())).with_clock(clock.clone()),
        );
        scheduler
            .schedule(content(), NotificationTrigger::once_after(60))
            .await
            .unwrap();
        clock.advance(chrono::Duration::minutes(5));

        let (sink, mut rx) = ChannelSink::new();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(scheduler.clone().run(
            Arc::new(sink),
            Duration::from_millis(10),
            shutdown_rx,
        ));

        let delivered = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap();
        assert!(delivered.is_some());

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .unwrap()
            .unwrap();
    }
}
