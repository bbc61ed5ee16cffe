//! Notification channel.
//!
//! Delivers confirmation codes to users. Delivery is fire-and-forget:
//!
//! ```text
//! request_signup ──► dispatch(notifier, message) ──► returns immediately
//!                              │
//!                              ▼ spawn_blocking (detached)
//!                        notifier.send(&message)
//!                              │
//!                              └── Err ──► warn!, dropped
//! ```

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// One outgoing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Notification delivery failure.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Notification channel closed")]
    Closed,
}

/// A delivery backend. Implementations may block (SMTP, files...).
pub trait Notifier: Send + Sync + 'static {
    fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Hands `notification` to `notifier` on a detached blocking task.
///
/// Must be called from within a tokio runtime.
pub fn dispatch(notifier: Arc<dyn Notifier>, notification: Notification) {
    tokio::task::spawn_blocking(move || {
        if let Err(e) = notifier.send(&notification) {
            warn!(to = %notification.to, error = %e, "Failed to deliver notification");
        }
    });
}

/// Writes messages to the log instead of sending them.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            from = %notification.from,
            to = %notification.to,
            subject = %notification.subject,
            body = %notification.body,
            "Notification"
        );
        Ok(())
    }
}

/// Forwards messages into a tokio channel, for embedding callers and tests.
#[derive(Debug)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelNotifier { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.tx
            .send(notification.clone())
            .map_err(|_| NotifyError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        fn send(&self, _: &Notification) -> Result<(), NotifyError> {
            Err(NotifyError::Delivery("smtp down".to_string()))
        }
    }

    fn message() -> Notification {
        Notification {
            from: "noreply@yamdb.test".to_string(),
            to: "alice@example.com".to_string(),
            subject: "Confirmation code".to_string(),
            body: "abc-123".to_string(),
        }
    }

    #[tokio::test]
    async fn test_dispatch_delivers() {
        let (notifier, mut rx) = ChannelNotifier::channel();
        dispatch(Arc::new(notifier), message());

        assert_eq!(rx.recv().await, Some(message()));
    }

    #[tokio::test]
    async fn test_dispatch_swallows_failures() {
        // Must not panic or propagate.
        dispatch(Arc::new(FailingNotifier), message());
        dispatch(Arc::new(LogNotifier), message());
    }

    #[test]
    fn test_closed_channel_reports_error() {
        let (notifier, rx) = ChannelNotifier::channel();
        drop(rx);
        assert!(matches!(notifier.send(&message()), Err(NotifyError::Closed)));
    }
}
