//! Notification channel port and adapters.
//!
//! Downstream consumers learn about a population refresh through a single
//! fire-and-forget message. Delivery is one attempt; failures propagate.

mod webhook;

pub use webhook::WebhookNotifier;

use crate::error::NotifyError;
use async_trait::async_trait;
use tracing::info;

/// Port for publishing a message body to downstream consumers.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Publish `body`, a JSON document.
    async fn send(&self, body: &str) -> Result<(), NotifyError>;
}

/// Notifier that writes messages to the log.
///
/// Used when no webhook is configured, so a local run still records the
/// update signal.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, body: &str) -> Result<(), NotifyError> {
        info!(body = %body, "Notification published");
        Ok(())
    }
}

/// Notifier that records every message, for test assertions.
#[cfg(test)]
#[derive(Default)]
pub struct InMemoryNotifier {
    sent: std::sync::Mutex<Vec<String>>,
    fail: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far.
    pub fn sent(&self) -> Vec<String> {
        self.sent
            .lock()
            .expect("InMemoryNotifier: lock poisoned")
            .clone()
    }

    /// Make every subsequent `send` fail.
    pub fn fail_sends(&self) {
        self.fail.store(true, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn send(&self, body: &str) -> Result<(), NotifyError> {
        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(NotifyError::Transport("queue unavailable".to_string()));
        }
        self.sent
            .lock()
            .expect("InMemoryNotifier: lock poisoned")
            .push(body.to_string());
        Ok(())
    }
}
