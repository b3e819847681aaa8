//! Broadcast notifications to recipients.
//!
//! A delivery failure is contained to the recipient it happened for: the
//! [`Notifier`] logs it and moves on. Each send is attempted exactly once.

pub mod message;
pub mod telegram;

pub use message::{format_tinker_message, NO_NEW_TINKERS_NOTICE};
pub use telegram::{TelegramChannel, TelegramConfig};

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use tinkerscout_core::{Recipient, RecipientId};

/// External delivery channel (Telegram in production).
#[async_trait::async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, recipient: &RecipientId, text: &str) -> Result<(), DeliveryError>;
}

/// A single recipient could not be reached.
#[derive(Debug, Clone, thiserror::Error)]
#[error("delivery to {recipient} failed: {cause}")]
pub struct DeliveryError {
    pub recipient: RecipientId,
    pub cause: String,
}

impl DeliveryError {
    pub fn new(recipient: &RecipientId, cause: impl Into<String>) -> Self {
        Self {
            recipient: recipient.clone(),
            cause: cause.into(),
        }
    }
}

/// Per-broadcast delivery counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

impl BroadcastReport {
    pub fn merge(&mut self, other: BroadcastReport) {
        self.delivered += other.delivered;
        self.failed += other.failed;
    }
}

/// Fans a message out over a [`NotificationChannel`], isolating failures.
#[derive(Clone)]
pub struct Notifier {
    channel: Arc<dyn NotificationChannel>,
}

impl Notifier {
    pub fn new(channel: Arc<dyn NotificationChannel>) -> Self {
        Self { channel }
    }

    /// Deliver to one recipient. Failures are logged, never returned.
    pub async fn notify(&self, recipient: &RecipientId, text: &str) -> bool {
        match self.channel.send(recipient, text).await {
            Ok(()) => {
                debug!(recipient = %recipient, "notification delivered");
                true
            }
            Err(e) => {
                warn!(recipient = %e.recipient, cause = %e.cause, "notification delivery failed");
                false
            }
        }
    }

    /// Deliver to every recipient, in order, regardless of earlier failures.
    pub async fn broadcast(&self, recipients: &[Recipient], text: &str) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        for r in recipients {
            if self.notify(&r.identifier, text).await {
                report.delivered += 1;
            } else {
                report.failed += 1;
            }
        }
        report
    }
}

/// In-memory channel for tests/dev.
///
/// Records every successful delivery; recipients registered with
/// [`RecordingChannel::fail_for`] get a `DeliveryError` instead.
#[derive(Debug, Default)]
pub struct RecordingChannel {
    sent: Mutex<Vec<(RecipientId, String)>>,
    failing: Mutex<HashSet<RecipientId>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, recipient: &RecipientId) {
        lock(&self.failing).insert(recipient.clone());
    }

    pub fn sent(&self) -> Vec<(RecipientId, String)> {
        lock(&self.sent).clone()
    }

    pub fn sent_to(&self, recipient: &str) -> Vec<String> {
        lock(&self.sent)
            .iter()
            .filter(|(r, _)| r.as_str() == recipient)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn clear(&self) {
        lock(&self.sent).clear();
    }
}

/// Inspection helpers recover the data from a poisoned lock.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait::async_trait]
impl NotificationChannel for RecordingChannel {
    async fn send(&self, recipient: &RecipientId, text: &str) -> Result<(), DeliveryError> {
        let failing = self
            .failing
            .lock()
            .map_err(|_| DeliveryError::new(recipient, "lock poisoned"))?
            .contains(recipient);
        if failing {
            return Err(DeliveryError::new(recipient, "recipient unreachable"));
        }
        self.sent
            .lock()
            .map_err(|_| DeliveryError::new(recipient, "lock poisoned"))?
            .push((recipient.clone(), text.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn recipients(ids: &[&str]) -> Vec<Recipient> {
        ids.iter()
            .map(|id| Recipient::new(RecipientId::new(*id).unwrap(), Utc::now()))
            .collect()
    }

    #[tokio::test]
    async fn broadcast_reaches_everyone() {
        let channel = Arc::new(RecordingChannel::new());
        let notifier = Notifier::new(channel.clone());

        let report = notifier.broadcast(&recipients(&["a", "b"]), "hello").await;

        assert_eq!(report, BroadcastReport { delivered: 2, failed: 0 });
        assert_eq!(channel.sent_to("a"), ["hello"]);
        assert_eq!(channel.sent_to("b"), ["hello"]);
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_rest() {
        let channel = Arc::new(RecordingChannel::new());
        channel.fail_for(&RecipientId::new("b").unwrap());
        let notifier = Notifier::new(channel.clone());

        let report = notifier.broadcast(&recipients(&["a", "b", "c"]), "hello").await;

        assert_eq!(report, BroadcastReport { delivered: 2, failed: 1 });
        assert_eq!(channel.sent_to("a"), ["hello"]);
        assert!(channel.sent_to("b").is_empty());
        assert_eq!(channel.sent_to("c"), ["hello"]);
    }

    #[tokio::test]
    async fn poisoned_recording_channel_reports_delivery_error() {
        let channel = Arc::new(RecordingChannel::new());
        let poisoner = channel.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.sent.lock().unwrap();
            panic!("poison the sent log");
        })
        .join();

        let report = Notifier::new(channel.clone())
            .broadcast(&recipients(&["a"]), "hello")
            .await;

        assert_eq!(report, BroadcastReport { delivered: 0, failed: 1 });
        assert!(channel.sent().is_empty());
    }

    #[tokio::test]
    async fn empty_recipient_list_is_a_no_op() {
        let channel = Arc::new(RecordingChannel::new());
        let report = Notifier::new(channel.clone()).broadcast(&[], "hello").await;
        assert_eq!(report, BroadcastReport::default());
        assert!(channel.sent().is_empty());
    }
}
