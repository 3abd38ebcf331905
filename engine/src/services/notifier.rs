//! Notifier implementations
//!
//! The engine hands finished intents to one of these; the external
//! dispatcher (email/SMS/push) consumes them from the channel end.

use tokio::sync::mpsc;
use tracing::info;

use shared::NotificationIntent;

use crate::error::{EngineError, EngineResult};
use crate::traits::Notifier;

/// Forwards intents over an in-process channel to the dispatcher task
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<NotificationIntent>,
}

impl ChannelNotifier {
    /// Create the notifier and the receiving end for the dispatcher.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NotificationIntent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait::async_trait]
impl Notifier for ChannelNotifier {
    async fn dispatch(&self, intent: NotificationIntent) -> EngineResult<()> {
        self.tx.send(intent).map_err(|e| EngineError::Storage {
            detail: format!("notification channel closed: {e}"),
        })
    }
}

/// Logs intents instead of delivering them; used by the CLI binary
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

#[async_trait::async_trait]
impl Notifier for TracingNotifier {
    async fn dispatch(&self, intent: NotificationIntent) -> EngineResult<()> {
        info!(
            kind = intent.kind(),
            booking_id = %intent.booking_id(),
            payload = %serde_json::to_string(&intent).unwrap_or_default(),
            "Notification intent"
        );
        Ok(())
    }
}
