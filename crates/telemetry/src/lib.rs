//! SmartBite telemetry link.
//!
//! Connects to the plate's message broker, queues subscriptions until the
//! connection is up and fans inbound payloads out to registered handlers.

mod error;
mod link;
mod mqtt;
mod qos;
mod topic;
mod transport;


pub use error::{Result, TelemetryError};
pub use link::{ConnectionState, MessageHandler, TelemetryLink};
pub use mqtt::{MqttSettings, MqttTransport};
pub use qos::QoS;
pub use topic::topic_matches;
pub use transport::{BrokerTransport, TransportEvent};
