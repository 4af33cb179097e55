// ── User-visible notifications ──
//
// Failed remote mutations and other events a human should see are sent
// on a broadcast channel owned by the `Hub`. The CLI prints them; tests
// subscribe and assert on them.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use strum::Display;
use tokio::sync::broadcast;

const NOTIFICATION_CHANNEL_SIZE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    /// Resource the notification concerns (`timings`, `minions`, ...).
    pub resource: &'static str,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Sending half of the notification channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Arc<Notification>>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(NOTIFICATION_CHANNEL_SIZE);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Notification>> {
        self.tx.subscribe()
    }

    pub fn notify(&self, level: NotificationLevel, resource: &'static str, message: impl Into<String>) {
        let notification = Notification {
            level,
            resource,
            message: message.into(),
            at: Utc::now(),
        };
        tracing::debug!(%level, resource, message = %notification.message, "notification");
        // Nobody listening is fine
        let _ = self.tx.send(Arc::new(notification));
    }

    pub fn error(&self, resource: &'static str, message: impl Into<String>) {
        self.notify(NotificationLevel::Error, resource, message);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn error_notification_reaches_subscribers() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();
        notifier.error("timings", "could not delete timing");
        let n = rx.try_recv().unwrap();
        assert_eq!(n.level, NotificationLevel::Error);
        assert_eq!(n.resource, "timings");
        assert_eq!(n.message, "could not delete timing");
    }
}
