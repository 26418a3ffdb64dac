use super::client::{ManagementClient, ManagementConfig, ensure_success};
use super::publisher::{Channel, ExchangeKind, MessageProperties, PublishError, Publisher};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Serialize)]
struct DeclareExchangeRequest<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    durable: bool,
    auto_delete: bool,
    internal: bool,
    arguments: serde_json::Map<String, serde_json::Value>,
}

#[derive(Serialize)]
struct PublishRequest<'a> {
    properties: &'a MessageProperties,
    routing_key: &'a str,
    payload: &'a str,
    payload_encoding: &'a str,
}

#[derive(Deserialize)]
struct PublishResponse {
    routed: bool,
}

/// [`Publisher`] over the RabbitMQ HTTP management API.
///
/// Every publish is one `POST .../publish` request; there is no AMQP
/// connection underneath, so "opening" checks that the vhost is reachable with
/// the configured credentials.
#[derive(Debug, Clone)]
pub struct ManagementPublisher {
    config: ManagementConfig,
}

impl ManagementPublisher {
    pub fn new(config: ManagementConfig) -> Self {
        Self { config }
    }
}

impl Publisher for ManagementPublisher {
    type Channel = ManagementChannel;

    async fn open_connection(&self) -> Result<ManagementChannel, PublishError> {
        let client = ManagementClient::new(self.config.clone())?;

        let response = client
            .get(client.vhost_url())
            .send()
            .await
            .map_err(|e| PublishError::ConnectionFailed(e.to_string()))?;
        ensure_success(response).await.map_err(|e| {
            PublishError::ConnectionFailed(format!(
                "vhost '{}' is not reachable: {}",
                self.config.vhost, e
            ))
        })?;

        info!(
            "Connected to broker management API at {} (vhost '{}')",
            self.config.broker_url, self.config.vhost
        );
        Ok(ManagementChannel {
            client,
            closed: false,
        })
    }
}

#[derive(Debug)]
pub struct ManagementChannel {
    client: ManagementClient,
    closed: bool,
}

impl ManagementChannel {
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Channel for ManagementChannel {
    async fn declare_exchange(
        &mut self,
        name: &str,
        kind: ExchangeKind,
        durable: bool,
    ) -> Result<(), PublishError> {
        if self.closed {
            return Err(PublishError::ChannelClosed);
        }

        let request = DeclareExchangeRequest {
            kind: kind.as_str(),
            durable,
            auto_delete: false,
            internal: false,
            arguments: serde_json::Map::new(),
        };

        let response = self
            .client
            .put(self.client.exchange_url(name))
            .json(&request)
            .send()
            .await?;
        ensure_success(response)
            .await
            .map_err(|e| PublishError::DeclareFailed(format!("exchange '{name}': {e}")))?;

        info!("Declared {} exchange '{}' (durable: {})", kind.as_str(), name, durable);
        Ok(())
    }

    async fn publish(
        &mut self,
        exchange: &str,
        routing_key: &str,
        properties: Option<&MessageProperties>,
        body: Bytes,
    ) -> Result<(), PublishError> {
        if self.closed {
            return Err(PublishError::ChannelClosed);
        }

        let default_properties = MessageProperties::default();
        let payload = String::from_utf8_lossy(&body);
        let request = PublishRequest {
            properties: properties.unwrap_or(&default_properties),
            routing_key,
            payload: &payload,
            payload_encoding: "string",
        };

        let response = self
            .client
            .post(self.client.publish_url(exchange))
            .json(&request)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        // A fanout exchange without bound queues accepts and discards.
        if let Ok(result) = response.json::<PublishResponse>().await
            && !result.routed
        {
            debug!("Message to exchange '{}' was not routed to any queue", exchange);
        }

        Ok(())
    }

    async fn close(&mut self) -> Result<(), PublishError> {
        self.closed = true;
        Ok(())
    }
}
