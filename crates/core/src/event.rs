//! Domain event system — pipeline progress without coupling.
//!
//! The orchestrator publishes an event at every stage boundary. The CLI
//! (or a test) subscribes to follow a run; nobody has to listen.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A pipeline stage began
    StageStarted {
        stage: String,
        query: String,
        timestamp: DateTime<Utc>,
    },

    /// A pipeline stage finished (possibly with a contained error)
    StageCompleted {
        stage: String,
        duration_ms: u64,
        error: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// One search attempt was executed
    SearchExecuted {
        query: String,
        records: usize,
        retry: bool,
        timestamp: DateTime<Utc>,
    },

    /// The final document was written
    ReportExported {
        path: String,
        timestamp: DateTime<Utc>,
    },

    /// A run ended on the failure branch
    PipelineFailed {
        query: String,
        error: String,
        artifact: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(DomainEvent::SearchExecuted {
            query: "climate policy".into(),
            records: 3,
            retry: false,
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            DomainEvent::SearchExecuted { query, records, retry, .. } => {
                assert_eq!(query, "climate policy");
                assert_eq!(*records, 3);
                assert!(!retry);
            }
            _ => panic!("Expected SearchExecuted event"),
        }
    }

    #[test]
    fn event_bus_no_subscribers_doesnt_panic() {
        let bus = EventBus::new(16);
        bus.publish(DomainEvent::PipelineFailed {
            query: "q".into(),
            error: "no subscribers".into(),
            artifact: "error_report.txt".into(),
            timestamp: Utc::now(),
        });
    }
}
