//! Notification sinks

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::common::channels::Notification;
use crate::common::traits::Notifier;
use crate::session::events::SessionEvent;

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _target: &str, _event: &SessionEvent) {}
}

/// Writes events to the tracing log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, target: &str, event: &SessionEvent) {
        info!(target_id = %target, "{}", event);
    }
}

/// Forwards rendered events to the interface layer over a bounded channel
///
/// When the channel is full or closed the event is dropped.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::Sender<Notification>,
}

impl ChannelNotifier {
    pub fn new(sender: mpsc::Sender<Notification>) -> Self {
        Self { sender }
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, target: &str, event: &SessionEvent) {
        let notification = Notification {
            target: target.to_string(),
            text: event.to_string(),
        };
        if let Err(e) = self.sender.try_send(notification) {
            debug!("Dropping notification: {}", e);
        }
    }
}
