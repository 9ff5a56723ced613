// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT command transport and status sink.
//!
//! Topic structure under a configurable prefix:
//! - Commands in: `<prefix>/set/<identity>` (JSON command payload)
//! - Status out: `<prefix>/status/<identity>/<key>` (JSON value)
//!
//! Each incoming command is handled on its own task so a slow device
//! never blocks the broker event loop.

use std::sync::Arc;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};

use crate::command::{Command, CommandHandler};
use crate::error::{Error, LinkError};
use crate::status::{StatusKey, StatusPayload, StatusSink};
use crate::types::DeviceIdentity;

/// MQTT bridge endpoint: subscribes to command topics and hands out
/// status-publishing sinks.
///
/// # Examples
///
/// ```ignore
/// use lifxbridge::mqtt::MqttBridge;
///
/// let bridge = MqttBridge::connect("mqtt://broker:1883", "lifx").await?;
/// let sink = bridge.status_sink();
/// // build a registry and dispatcher around `sink`, then:
/// bridge.serve(dispatcher).await?;
/// ```
pub struct MqttBridge {
    client: AsyncClient,
    event_loop: EventLoop,
    topic_prefix: String,
}

impl MqttBridge {
    /// Connects to an MQTT broker with the default options.
    ///
    /// # Arguments
    ///
    /// * `broker_url` - The broker URL (e.g., `mqtt://192.168.1.50:1883`)
    /// * `topic_prefix` - The prefix under which command and status
    ///   topics live (e.g., `lifx`)
    ///
    /// # Errors
    ///
    /// Returns [`LinkError`] if the broker URL is malformed.
    pub fn connect(
        broker_url: impl Into<String>,
        topic_prefix: impl Into<String>,
    ) -> Result<Self, LinkError> {
        MqttBridgeBuilder::new()
            .broker(broker_url)
            .topic_prefix(topic_prefix)
            .build()
    }

    /// Returns the configured topic prefix.
    #[must_use]
    pub fn topic_prefix(&self) -> &str {
        &self.topic_prefix
    }

    /// Returns a cloneable sink that publishes status events to
    /// `<prefix>/status/<identity>/<key>`.
    #[must_use]
    pub fn status_sink(&self) -> MqttStatusSink {
        MqttStatusSink {
            client: self.client.clone(),
            topic_prefix: self.topic_prefix.clone(),
        }
    }

    /// Subscribes to `<prefix>/set/#` and drives the broker event loop,
    /// delivering each parsed command to `handler` on its own task.
    ///
    /// Runs until the connection is lost.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError`] when the subscription fails or the event
    /// loop ends with a connection error.
    pub async fn serve<H>(self, handler: H) -> Result<(), LinkError>
    where
        H: CommandHandler,
    {
        let set_prefix = format!("{}/set/", self.topic_prefix);
        let filter = format!("{set_prefix}#");

        self.client.subscribe(&filter, QoS::AtLeastOnce).await?;
        tracing::info!(topic = %filter, "subscribed to command topic");

        let handler = Arc::new(handler);
        let mut event_loop = self.event_loop;

        loop {
            match event_loop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                    tracing::debug!(?connack, "MQTT connected");
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    let Some(identity) = publish.topic.strip_prefix(&set_prefix) else {
                        continue;
                    };

                    match Command::parse_payload(&publish.payload) {
                        Ok(command) => {
                            tracing::debug!(identity, %command, "received command");
                            let handler = Arc::clone(&handler);
                            let identity = identity.to_string();
                            tokio::spawn(async move {
                                if let Err(error) = handler.handle_command(&identity, command).await
                                {
                                    tracing::warn!(%identity, %error, "command failed");
                                }
                            });
                        }
                        Err(error) => {
                            tracing::warn!(
                                topic = %publish.topic,
                                %error,
                                "discarding unparseable command payload"
                            );
                        }
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    tracing::error!(%error, "MQTT event loop error");
                    return Err(LinkError::ConnectionFailed(error.to_string()));
                }
            }
        }
    }
}

/// Publishes status events over MQTT.
#[derive(Debug, Clone)]
pub struct MqttStatusSink {
    client: AsyncClient,
    topic_prefix: String,
}

impl StatusSink for MqttStatusSink {
    async fn emit_status(
        &self,
        identity: &DeviceIdentity,
        key: StatusKey,
        payload: StatusPayload,
    ) -> Result<(), Error> {
        let topic = format!("{}/status/{}/{}", self.topic_prefix, identity, key);
        let body = serde_json::to_string(&payload).map_err(crate::error::ParseError::Json)?;

        tracing::debug!(topic = %topic, payload = %body, "publishing status");

        self.client
            .publish(&topic, QoS::AtLeastOnce, false, body)
            .await
            .map_err(LinkError::from)?;
        Ok(())
    }
}

/// Builder for an [`MqttBridge`] with custom configuration.
#[derive(Debug, Default)]
pub struct MqttBridgeBuilder {
    broker: Option<String>,
    topic_prefix: Option<String>,
    username: Option<String>,
    password: Option<String>,
    client_id: Option<String>,
    keep_alive: Option<Duration>,
}

impl MqttBridgeBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the MQTT broker URL.
    #[must_use]
    pub fn broker(mut self, broker: impl Into<String>) -> Self {
        self.broker = Some(broker.into());
        self
    }

    /// Sets the topic prefix for command and status topics.
    #[must_use]
    pub fn topic_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.topic_prefix = Some(prefix.into());
        self
    }

    /// Sets authentication credentials for the MQTT broker.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Sets a custom client ID.
    #[must_use]
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    /// Sets the keep-alive interval.
    #[must_use]
    pub fn keep_alive(mut self, duration: Duration) -> Self {
        self.keep_alive = Some(duration);
        self
    }

    /// Builds the bridge endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError`] if required fields are missing or the
    /// broker URL is malformed.
    pub fn build(self) -> Result<MqttBridge, LinkError> {
        let broker = self
            .broker
            .ok_or_else(|| LinkError::ConnectionFailed("broker is required".to_string()))?;
        let topic_prefix = self
            .topic_prefix
            .ok_or_else(|| LinkError::ConnectionFailed("topic_prefix is required".to_string()))?;

        let (host, port) = parse_mqtt_url(&broker)?;

        // Random suffix avoids client-id collisions when several bridge
        // instances share a broker.
        let client_id = self
            .client_id
            .unwrap_or_else(|| format!("lifxbridge_{}", uuid::Uuid::new_v4().simple()));

        let mut mqtt_options = MqttOptions::new(&client_id, host, port);
        mqtt_options.set_keep_alive(self.keep_alive.unwrap_or(Duration::from_secs(30)));
        mqtt_options.set_clean_session(true);

        if let (Some(username), Some(password)) = (self.username, self.password) {
            mqtt_options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(mqtt_options, 10);

        Ok(MqttBridge {
            client,
            event_loop,
            topic_prefix,
        })
    }
}

/// Parses an MQTT URL into host and port.
fn parse_mqtt_url(url: &str) -> Result<(String, u16), LinkError> {
    let url = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url);

    let (host, port) = if let Some((h, p)) = url.rsplit_once(':') {
        let port = p
            .parse()
            .map_err(|_| LinkError::ConnectionFailed(format!("invalid port: {p}")))?;
        (h.to_string(), port)
    } else {
        (url.to_string(), 1883)
    };

    Ok((host, port))
}
