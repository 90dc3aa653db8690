//! Fire-and-forget publication of domain events.
//!
//! [`EventPublisher`] is the seam the services publish through. [`EventBus`]
//! is the in-process implementation: a `tokio::sync::broadcast` channel that
//! any number of consumers can subscribe to. [`EventLogSink`] is the default
//! consumer and simply records every event in the log.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

/// Default buffer capacity for the broadcast channel.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Publishes an event without waiting for delivery.
///
/// Implementations must never block the caller and never report failure;
/// delivery is best-effort and consumers must tolerate loss.
#[cfg_attr(test, mockall::automock)]
pub trait EventPublisher: Send + Sync {
    fn publish(&self, topic: &str, payload: String);
}

/// Serialize `payload` as JSON and publish it under `topic`.
///
/// A payload that cannot be serialized is logged and dropped.
pub fn publish_json<T: Serialize>(publisher: &dyn EventPublisher, topic: &str, payload: &T) {
    match serde_json::to_string(payload) {
        Ok(json) => publisher.publish(topic, json),
        Err(e) => {
            tracing::error!(error = %e, topic = %topic, "Failed to serialize event payload");
        }
    }
}

/// An event as carried on the bus.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainEvent {
    pub topic: String,
    pub payload: String,
    pub published_at: DateTime<Utc>,
}

pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// When the buffer is full the oldest events are dropped and slow
    /// receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventPublisher for EventBus {
    fn publish(&self, topic: &str, payload: String) {
        let event = DomainEvent {
            topic: topic.to_string(),
            payload,
            published_at: Utc::now(),
        };

        // A send error only means there are no subscribers right now.
        if self.sender.send(event).is_err() {
            tracing::debug!(topic = %topic, "No event subscribers, event dropped");
        }
    }
}

/// Background consumer that writes every published event to the log.
pub struct EventLogSink;

impl EventLogSink {
    /// Runs until the bus is dropped.
    pub async fn run(mut receiver: broadcast::Receiver<DomainEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    tracing::info!(
                        topic = %event.topic,
                        published_at = %event.published_at,
                        payload = %event.payload,
                        "Domain event published"
                    );
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event log sink lagged, some events were not logged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, event log sink shutting down");
                    break;
                }
            }
        }
    }
}
