//! MQTT transport.
//!
//! Owns the broker connection: subscribes on every (re)connect, feeds inbound
//! publishes to the [`Gateway`], and publishes status messages.

use std::thread;
use std::time::Duration;

use rumqttc::{Client, Connection, Event, MqttOptions, Packet, QoS};
use tracing::{debug, info, warn};

use crate::error::BusError;
use crate::gateway::{Gateway, StatusMessage, StatusSink};
use crate::params::{BusConfig, Topics};

/// Request queue depth between client handles and the event loop
const REQUEST_CAPACITY: usize = 16;

/// Handle for subscribing and publishing; cheap to clone
#[derive(Clone)]
pub struct MqttBus {
    client: Client,
    topics: Topics,
}

impl MqttBus {
    /// Create the client; nothing is sent until the connection is polled
    pub fn connect(config: &BusConfig) -> (Self, Connection) {
        let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));

        let (client, connection) = Client::new(options, REQUEST_CAPACITY);
        info!("MQTT broker {}:{}", config.host, config.port);

        (
            Self {
                client,
                topics: config.topics.clone(),
            },
            connection,
        )
    }

    /// Queue subscriptions for all inbound topics.
    ///
    /// Called from the event loop thread, so it must not block on a full queue.
    fn subscribe_all(&self) -> Result<(), BusError> {
        for topic in self.topics.inbound() {
            self.client.try_subscribe(topic, QoS::AtMostOnce)?;
        }
        Ok(())
    }

    /// Drive the connection forever, dispatching inbound messages to `gateway`
    pub fn run(&self, connection: &mut Connection, gateway: &Gateway, reconnect_delay: Duration) {
        for notification in connection.iter() {
            match notification {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!("Connected to broker");
                    if let Err(e) = self.subscribe_all() {
                        warn!("Subscribe failed: {}", e);
                    }
                }
                Ok(Event::Incoming(Packet::SubAck(ack))) => {
                    debug!("Subscribed (pkid {})", ack.pkid);
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    gateway.handle(&publish.topic, &publish.payload);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(
                        "MQTT connection error: {}; retrying in {}ms",
                        e,
                        reconnect_delay.as_millis()
                    );
                    thread::sleep(reconnect_delay);
                }
            }
        }
    }
}

impl StatusSink for MqttBus {
    fn publish_status(&self, status: &StatusMessage) -> Result<(), BusError> {
        let payload = serde_json::to_vec(status)?;
        self.client
            .publish(&self.topics.status, QoS::AtMostOnce, false, payload)?;
        Ok(())
    }
}
