//! Fire-and-forget lifecycle notifications

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

const BUS_CAPACITY: usize = 256;

/// Coarse phase of the lifecycle, for UI and telemetry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Bootstrap,
    Authenticating,
    AuthenticationFailed,
    Loading,
    Gameplay,
    Paused,
    Quitting,
    Finished,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A notification published by the lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleMessage {
    PhaseEntered { phase: Phase },
    AuthenticationFailed { retryable: bool, reason: String },
    DeviceLinked { device_id: String },
    Paused { is_paused: bool },
    Quitting { reason: String },
}

/// Broadcast channel for [`LifecycleMessage`]s
///
/// Publishing never blocks and never fails: with no subscriber the message
/// is simply dropped, and a subscriber that falls behind by more than the
/// channel capacity loses the oldest messages.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LifecycleMessage>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    pub fn publish(&self, message: LifecycleMessage) {
        tracing::trace!(?message, "lifecycle message");
        let _ = self.tx.send(message);
    }

    /// Receive every message published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleMessage> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        bus.publish(LifecycleMessage::Paused { is_paused: true });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_subscribers_see_later_messages_in_order() {
        let bus = EventBus::new();
        bus.publish(LifecycleMessage::Paused { is_paused: true });

        let mut rx = bus.subscribe();
        bus.publish(LifecycleMessage::PhaseEntered {
            phase: Phase::Gameplay,
        });
        bus.clone().publish(LifecycleMessage::Quitting {
            reason: "done".to_string(),
        });

        assert_eq!(
            rx.recv().await.unwrap(),
            LifecycleMessage::PhaseEntered {
                phase: Phase::Gameplay
            }
        );
        assert!(matches!(
            rx.recv().await.unwrap(),
            LifecycleMessage::Quitting { .. }
        ));
    }
}
