//! In-process event broadcasting.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;
use webdesq_sdk::prelude::Publisher;

/// Buffered notifications per subscriber before the slowest lags.
pub const DEFAULT_CAPACITY: usize = 256;

/// A published event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub channel: String,
    pub event: String,
}

#[derive(Debug, Clone)]
pub struct Broadcaster {
    tx: broadcast::Sender<Notification>,
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Publisher for Broadcaster {
    fn publish(&self, channel: &str, event: &str) {
        let notification = Notification {
            channel: channel.to_string(),
            event: event.to_string(),
        };
        match self.tx.send(notification) {
            Ok(receivers) => debug!(channel, event, receivers, "published"),
            // No subscribers is not an error
            Err(_) => debug!(channel, event, "published without subscribers"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_receive_published_events() {
        let broadcaster = Broadcaster::default();
        let mut rx = broadcaster.subscribe();

        broadcaster.publish("cms", "acme/pages/reload");

        assert_eq!(
            rx.try_recv().unwrap(),
            Notification {
                channel: "cms".into(),
                event: "acme/pages/reload".into(),
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        Broadcaster::new(4).publish("cms", "nobody/listens");
    }
}
