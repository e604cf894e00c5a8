use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::qos::QoS;

/// What a transport reports back to the link after connecting.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Message { topic: String, payload: Vec<u8> },
    Disconnected { reason: String },
}

/// A broker connection the link drives.
///
/// Implementations push inbound traffic into the channel handed to
/// [`BrokerTransport::connect`]; the link owns the receiving end.
#[async_trait]
pub trait BrokerTransport: Send + Sync {
    /// Authenticate and wait for the broker's acknowledgement.
    async fn connect(&self, events: mpsc::Sender<TransportEvent>) -> Result<()>;

    async fn subscribe(&self, filter: &str, qos: QoS) -> Result<()>;

    async fn publish(&self, topic: &str, payload: &[u8], qos: QoS) -> Result<()>;
}
