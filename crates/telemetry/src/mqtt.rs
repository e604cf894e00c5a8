//! MQTT 3.1.1 transport over `rumqttc`.

use async_trait::async_trait;
use log::{debug, error, info, warn};
use std::sync::Mutex;
use std::time::Duration;

use rumqttc::{AsyncClient, ConnectReturnCode, ConnectionError, Event, EventLoop, MqttOptions, Packet};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{Result, TelemetryError};
use crate::qos::QoS;
use crate::transport::{BrokerTransport, TransportEvent};

const DEFAULT_KEEP_ALIVE_SECS: u64 = 30;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const REQUEST_CHANNEL_CAPACITY: usize = 64;

/// Broker address and credentials.
#[derive(Clone)]
pub struct MqttSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keep_alive: Duration,
    pub connect_timeout: Duration,
}

impl MqttSettings {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            username: None,
            password: None,
            keep_alive: Duration::from_secs(DEFAULT_KEEP_ALIVE_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// `rumqttc` options with a fresh `smartbite_<millis>` client id.
    fn to_options(&self) -> MqttOptions {
        let client_id = format!("smartbite_{}", chrono::Utc::now().timestamp_millis());
        let mut options = MqttOptions::new(client_id, self.host.clone(), self.port);
        options.set_keep_alive(self.keep_alive);
        options.set_clean_session(true);
        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            options.set_credentials(username.clone(), password.clone());
        }
        options
    }
}

impl std::fmt::Debug for MqttSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// [`BrokerTransport`] backed by a `rumqttc` client and its event loop task.
pub struct MqttTransport {
    settings: MqttSettings,
    client: Mutex<Option<AsyncClient>>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl MqttTransport {
    pub fn new(settings: MqttSettings) -> Self {
        Self {
            settings,
            client: Mutex::new(None),
            poller: Mutex::new(None),
        }
    }

    fn client(&self) -> Result<AsyncClient> {
        self.client
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .ok_or(TelemetryError::NotConnected)
    }
}

#[async_trait]
impl BrokerTransport for MqttTransport {
    async fn connect(&self, events: mpsc::Sender<TransportEvent>) -> Result<()> {
        let options = self.settings.to_options();
        info!(
            "Connecting to MQTT broker {}:{} as {}",
            self.settings.host,
            self.settings.port,
            options.client_id()
        );

        let (client, eventloop) = AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY);
        let (ack_tx, ack_rx) = oneshot::channel();
        let poller = tokio::spawn(poll_events(eventloop, ack_tx, events));

        let previous = self
            .poller
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(poller);
        if let Some(old) = previous {
            old.abort();
        }

        let outcome = match tokio::time::timeout(self.settings.connect_timeout, ack_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(TelemetryError::connection("Event loop stopped before acknowledgement")),
            Err(_) => Err(TelemetryError::connection(format!(
                "No acknowledgement within {:?}",
                self.settings.connect_timeout
            ))),
        };

        match outcome {
            Ok(()) => {
                *self.client.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(client);
                Ok(())
            }
            Err(e) => {
                if let Some(poller) = self
                    .poller
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .take()
                {
                    poller.abort();
                }
                Err(e)
            }
        }
    }

    async fn subscribe(&self, filter: &str, qos: QoS) -> Result<()> {
        self.client()?
            .subscribe(filter, qos.into())
            .await
            .map_err(|e| TelemetryError::transport(e.to_string()))
    }

    async fn publish(&self, topic: &str, payload: &[u8], qos: QoS) -> Result<()> {
        self.client()?
            .publish(topic, qos.into(), false, payload.to_vec())
            .await
            .map_err(|e| TelemetryError::transport(e.to_string()))
    }
}

impl Drop for MqttTransport {
    fn drop(&mut self) {
        if let Some(poller) = self
            .poller
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
        {
            poller.abort();
        }
    }
}

/// Drive the `rumqttc` event loop until the connection fails. The first
/// outcome goes to `ack`; later failures are reported as `Disconnected`.
async fn poll_events(
    mut eventloop: EventLoop,
    ack: oneshot::Sender<Result<()>>,
    events: mpsc::Sender<TransportEvent>,
) {
    let mut ack = Some(ack);
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(conn_ack))) => {
                let result = if conn_ack.code == ConnectReturnCode::Success {
                    Ok(())
                } else {
                    Err(TelemetryError::connection(format!(
                        "Broker refused connection: {:?}",
                        conn_ack.code
                    )))
                };
                let refused = result.is_err();
                if let Some(ack) = ack.take() {
                    let _ = ack.send(result);
                }
                if refused {
                    return;
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                debug!("MQTT message on {} ({} bytes)", publish.topic, publish.payload.len());
                let event = TransportEvent::Message {
                    topic: publish.topic.clone(),
                    payload: publish.payload.to_vec(),
                };
                if events.send(event).await.is_err() {
                    debug!("Telemetry link gone, stopping MQTT event loop");
                    return;
                }
            }
            Ok(_) => {}
            Err(e) => {
                let reason = describe(&e);
                match ack.take() {
                    Some(ack) => {
                        error!("MQTT connection failed: {}", reason);
                        let _ = ack.send(Err(TelemetryError::connection(reason)));
                    }
                    None => {
                        warn!("MQTT connection dropped: {}", reason);
                        let _ = events.send(TransportEvent::Disconnected { reason }).await;
                    }
                }
                return;
            }
        }
    }
}

fn describe(err: &ConnectionError) -> String {
    match err {
        ConnectionError::ConnectionRefused(code) => format!("Broker refused connection: {:?}", code),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_id_prefix() {
        let options = MqttSettings::new("localhost", 1883).to_options();
        assert!(options.client_id().starts_with("smartbite_"));
        assert_eq!(options.broker_address(), ("localhost".to_string(), 1883));
    }

    #[test]
    fn test_debug_redacts_password() {
        let settings = MqttSettings::new("localhost", 1883).with_credentials("user", "secret");
        let rendered = format!("{:?}", settings);
        assert!(rendered.contains("user"));
        assert!(!rendered.contains("secret"));
    }

    #[tokio::test]
    async fn test_publish_before_connect_is_not_connected() {
        let transport = MqttTransport::new(MqttSettings::new("localhost", 1883));
        let err = transport
            .publish("smartbite/sensor/lectura", b"{}", QoS::AtLeastOnce)
            .await
            .unwrap_err();
        assert_eq!(err, TelemetryError::NotConnected);
    }

    #[tokio::test]
    async fn test_unreachable_broker_fails_to_connect() {
        let mut settings = MqttSettings::new("127.0.0.1", 9);
        settings.connect_timeout = Duration::from_secs(5);
        let transport = MqttTransport::new(settings);
        let (tx, _rx) = mpsc::channel(1);

        let err = transport.connect(tx).await.unwrap_err();
        assert!(matches!(err, TelemetryError::Connection(_)));
    }
}
