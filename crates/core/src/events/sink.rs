//! Domain event sink trait and implementations.

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use super::DomainEvent;

/// Default capacity of the broadcast channel. Slow observers lag and skip
/// events instead of growing memory.
const DEFAULT_BROADCAST_CAPACITY: usize = 64;

/// Trait for receiving domain events.
///
/// `emit()` must be fast and non-blocking (no network calls, no disk writes).
/// Failure to emit must not affect the operation that produced the event.
pub trait DomainEventSink: Send + Sync {
    /// Emit a single domain event.
    fn emit(&self, event: DomainEvent);

    /// Emit multiple domain events.
    fn emit_batch(&self, events: Vec<DomainEvent>) {
        for event in events {
            self.emit(event);
        }
    }
}

/// No-op implementation for contexts that don't need events.
#[derive(Clone, Default)]
pub struct NoOpDomainEventSink;

impl DomainEventSink for NoOpDomainEventSink {
    fn emit(&self, _event: DomainEvent) {}
}

/// Publish-on-change sink: every observer registered through
/// [`BroadcastEventSink::subscribe`] receives each emitted event.
#[derive(Clone)]
pub struct BroadcastEventSink {
    sender: broadcast::Sender<DomainEvent>,
}

impl BroadcastEventSink {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BROADCAST_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Register an observer.
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    pub fn observer_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainEventSink for BroadcastEventSink {
    fn emit(&self, event: DomainEvent) {
        // No observers is not an error.
        let _ = self.sender.send(event);
    }
}

/// Mock sink for testing - collects emitted events.
#[derive(Clone, Default)]
pub struct MockDomainEventSink {
    events: Arc<Mutex<Vec<DomainEvent>>>,
}

impl MockDomainEventSink {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns all collected events.
    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Clears collected events.
    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    /// Returns the number of collected events.
    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Returns true if no events have been collected.
    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap().is_empty()
    }
}

impl DomainEventSink for MockDomainEventSink {
    fn emit(&self, event: DomainEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_sink_does_not_panic() {
        let sink = NoOpDomainEventSink;
        sink.emit(DomainEvent::SessionCleared);
        sink.emit_batch(vec![
            DomainEvent::ReadingsCleared,
            DomainEvent::ReadingsRefreshed { count: 2 },
        ]);
    }

    #[test]
    fn test_mock_sink_collects_events() {
        let sink = MockDomainEventSink::new();
        assert!(sink.is_empty());

        sink.emit(DomainEvent::SessionEstablished { user_id: 7 });
        assert_eq!(sink.len(), 1);

        sink.emit_batch(vec![
            DomainEvent::ReadingsRefreshed { count: 3 },
            DomainEvent::SessionCleared,
        ]);
        assert_eq!(sink.len(), 3);
        assert_eq!(sink.events()[0], DomainEvent::SessionEstablished { user_id: 7 });

        sink.clear();
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_sink_notifies_every_observer() {
        let sink = BroadcastEventSink::new();
        let mut first = sink.subscribe();
        let mut second = sink.subscribe();
        assert_eq!(sink.observer_count(), 2);

        sink.emit(DomainEvent::ReadingsRefreshed { count: 4 });

        assert_eq!(
            first.recv().await.unwrap(),
            DomainEvent::ReadingsRefreshed { count: 4 }
        );
        assert_eq!(
            second.recv().await.unwrap(),
            DomainEvent::ReadingsRefreshed { count: 4 }
        );
    }

    #[test]
    fn test_broadcast_sink_without_observers() {
        let sink = BroadcastEventSink::with_capacity(1);
        sink.emit(DomainEvent::SessionCleared);
        sink.emit(DomainEvent::SessionCleared);
        assert_eq!(sink.observer_count(), 0);
    }
}
