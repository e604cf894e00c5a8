//! Connection state machine, subscription queue and message dispatch.

use log::{debug, error, info, warn};
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{Result, TelemetryError};
use crate::qos::QoS;
use crate::topic::topic_matches;
use crate::transport::{BrokerTransport, TransportEvent};

/// Capacity of the channel between the transport and the dispatcher.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Callback invoked with the topic and raw payload of a matching message.
pub type MessageHandler = Arc<dyn Fn(&str, &[u8]) -> anyhow::Result<()> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone, PartialEq)]
struct BrokerSubscription {
    filter: String,
    qos: QoS,
}

struct RegisteredHandler {
    filter: String,
    handler: MessageHandler,
}

#[derive(Default)]
struct LinkState {
    connection: ConnectionState,
    /// Requested but not yet sent to the broker, in request order.
    pending: VecDeque<BrokerSubscription>,
    /// Sent to the broker on the current connection, in request order.
    active: Vec<BrokerSubscription>,
    /// Bumped by every `connect()` that leaves the disconnected state.
    attempt: u64,
}

impl LinkState {
    fn restoring(&self, attempt: u64) -> bool {
        self.connection == ConnectionState::Connecting && self.attempt == attempt
    }
}

/// Single logical connection to the telemetry broker.
///
/// Handlers are kept in registration order and survive reconnects; broker
/// subscriptions lost with a dropped connection are queued again and
/// restored by the next successful [`TelemetryLink::connect`].
pub struct TelemetryLink {
    transport: Arc<dyn BrokerTransport>,
    state: Arc<Mutex<LinkState>>,
    handlers: Arc<RwLock<Vec<RegisteredHandler>>>,
    events_tx: mpsc::Sender<TransportEvent>,
    events_rx: Mutex<Option<mpsc::Receiver<TransportEvent>>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl TelemetryLink {
    pub fn new(transport: Arc<dyn BrokerTransport>) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            transport,
            state: Arc::new(Mutex::new(LinkState::default())),
            handlers: Arc::new(RwLock::new(Vec::new())),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
            dispatcher: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ConnectionState {
        lock(&self.state).connection
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Number of broker subscriptions waiting for a connection.
    pub fn pending_subscriptions(&self) -> usize {
        lock(&self.state).pending.len()
    }

    /// Connect to the broker. A no-op while connecting or connected.
    ///
    /// On success every queued subscription is sent exactly once, in the
    /// order it was requested. Failures leave the link disconnected and are
    /// not retried. A connection lost while the queue is being sent also
    /// fails, with the unsent subscriptions still queued.
    pub async fn connect(&self) -> Result<()> {
        let attempt = {
            let mut state = lock(&self.state);
            if state.connection != ConnectionState::Disconnected {
                debug!("connect() ignored: link is {:?}", state.connection);
                return Ok(());
            }
            state.connection = ConnectionState::Connecting;
            state.attempt += 1;
            state.attempt
        };

        self.ensure_dispatcher();

        if let Err(e) = self.transport.connect(self.events_tx.clone()).await {
            lock(&self.state).connection = ConnectionState::Disconnected;
            error!("Telemetry broker connection failed: {}", e);
            return Err(match e {
                TelemetryError::Connection(_) => e,
                other => TelemetryError::connection(other.to_string()),
            });
        }

        info!("Connected to telemetry broker");
        self.flush_pending(attempt).await
    }

    /// Drain the pending queue, then mark the link connected. Subscriptions
    /// requested during the flush land in the same queue and keep their order.
    ///
    /// Each entry leaves the queue only after it was sent, so a drop in the
    /// middle of the flush keeps the rest queued in order.
    async fn flush_pending(&self, attempt: u64) -> Result<()> {
        loop {
            let next = {
                let mut state = lock(&self.state);
                if !state.restoring(attempt) {
                    return Err(connection_lost());
                }
                match state.pending.front() {
                    Some(sub) => sub.clone(),
                    None => {
                        state.connection = ConnectionState::Connected;
                        return Ok(());
                    }
                }
            };

            match self.transport.subscribe(&next.filter, next.qos).await {
                Ok(()) => debug!("Subscribed to {}", next.filter),
                Err(e) => error!("Queued subscription to {} failed: {}", next.filter, e),
            }

            let mut state = lock(&self.state);
            if !state.restoring(attempt) {
                return Err(connection_lost());
            }
            // Failed ones are retried after the next reconnect.
            if let Some(sent) = state.pending.pop_front() {
                state.active.push(sent);
            }
        }
    }

    /// Register `handler` for messages matching `filter`.
    ///
    /// While connected the broker subscription is made immediately;
    /// otherwise it is queued until [`TelemetryLink::connect`] succeeds.
    /// Repeated subscriptions to the same filter are not merged.
    ///
    /// If the broker rejects an immediate subscription the handler is
    /// unregistered and the error returned, so the call can be retried.
    pub async fn subscribe<F>(&self, filter: &str, qos: QoS, handler: F) -> Result<()>
    where
        F: Fn(&str, &[u8]) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let handler: MessageHandler = Arc::new(handler);
        self.handlers
            .write()
            .map_err(|_| TelemetryError::transport("Handler registry lock poisoned"))?
            .push(RegisteredHandler {
                filter: filter.to_string(),
                handler: Arc::clone(&handler),
            });

        let subscription = BrokerSubscription {
            filter: filter.to_string(),
            qos,
        };
        {
            let mut state = lock(&self.state);
            if state.connection != ConnectionState::Connected {
                debug!("Queued subscription to {}", filter);
                state.pending.push_back(subscription);
                return Ok(());
            }
        }

        match self.transport.subscribe(filter, qos).await {
            Ok(()) => {
                debug!("Subscribed to {}", filter);
                lock(&self.state).active.push(subscription);
                Ok(())
            }
            Err(e) => {
                error!("Subscription to {} failed: {}", filter, e);
                self.unregister(&handler);
                Err(e)
            }
        }
    }

    fn unregister(&self, handler: &MessageHandler) {
        let mut registry = match self.handlers.write() {
            Ok(registry) => registry,
            Err(poisoned) => poisoned.into_inner(),
        };
        registry.retain(|h| !Arc::ptr_eq(&h.handler, handler));
    }

    /// Publish `payload` on `topic`. Fails with `NotConnected` unless the
    /// link is connected.
    pub async fn publish(&self, topic: &str, payload: &[u8], qos: QoS) -> Result<()> {
        if !self.is_connected() {
            error!("Cannot publish to {}: not connected", topic);
            return Err(TelemetryError::NotConnected);
        }
        self.transport.publish(topic, payload, qos).await.map_err(|e| {
            error!("Publish to {} failed: {}", topic, e);
            e
        })
    }

    fn ensure_dispatcher(&self) {
        let Some(rx) = lock(&self.events_rx).take() else {
            return;
        };
        let handle = tokio::spawn(run_dispatcher(
            rx,
            Arc::clone(&self.state),
            Arc::clone(&self.handlers),
        ));
        *lock(&self.dispatcher) = Some(handle);
    }
}

impl Drop for TelemetryLink {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.dispatcher).take() {
            handle.abort();
        }
    }
}

/// Single consumer of transport events: delivers messages and tracks drops.
async fn run_dispatcher(
    mut rx: mpsc::Receiver<TransportEvent>,
    state: Arc<Mutex<LinkState>>,
    handlers: Arc<RwLock<Vec<RegisteredHandler>>>,
) {
    while let Some(event) = rx.recv().await {
        match event {
            TransportEvent::Message { topic, payload } => {
                dispatch(&handlers, &topic, &payload);
            }
            TransportEvent::Disconnected { reason } => {
                warn!("Telemetry broker connection lost: {}", reason);
                let mut guard = lock(&state);
                guard.connection = ConnectionState::Disconnected;
                let mut restored: VecDeque<BrokerSubscription> =
                    guard.active.drain(..).collect();
                restored.extend(guard.pending.drain(..));
                guard.pending = restored;
            }
        }
    }
    debug!("Telemetry dispatcher stopped");
}

fn dispatch(handlers: &RwLock<Vec<RegisteredHandler>>, topic: &str, payload: &[u8]) {
    let matching: Vec<MessageHandler> = match handlers.read() {
        Ok(registry) => registry
            .iter()
            .filter(|h| topic_matches(&h.filter, topic))
            .map(|h| Arc::clone(&h.handler))
            .collect(),
        Err(poisoned) => poisoned
            .into_inner()
            .iter()
            .filter(|h| topic_matches(&h.filter, topic))
            .map(|h| Arc::clone(&h.handler))
            .collect(),
    };

    if matching.is_empty() {
        debug!("No handler for message on {}", topic);
        return;
    }

    for handler in matching {
        match catch_unwind(AssertUnwindSafe(|| handler(topic, payload))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Handler for {} failed: {:#}", topic, e),
            Err(_) => error!("Handler for {} panicked", topic),
        }
    }
}

fn connection_lost() -> TelemetryError {
    warn!("Telemetry broker connection lost while restoring subscriptions");
    TelemetryError::connection("Connection lost while restoring subscriptions")
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
