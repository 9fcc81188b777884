//! Channel type definitions for handing notifications to the interface layer

use tokio::sync::mpsc;

/// Rendered status message addressed to a notification target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub target: String,
    pub text: String,
}

/// Create a new notification channel with a custom buffer size
pub fn create_notification_channel_with_size(
    size: usize,
) -> (mpsc::Sender<Notification>, mpsc::Receiver<Notification>) {
    mpsc::channel(size)
}
