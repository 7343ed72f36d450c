//! Fire-and-forget notifications.

/// Broadcast channel offered by the host.
///
/// Publishing never fails and never waits for subscribers.
pub trait Publisher: Send + Sync {
    fn publish(&self, channel: &str, event: &str);
}
