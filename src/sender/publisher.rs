use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Exchange declaration failed: {0}")]
    DeclareFailed(String),
    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },
    #[error("Channel is closed")]
    ChannelClosed,
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Publish failed: {0}")]
    Other(String),
}

/// Exchange routing model. Only fanout is declared by the shipper; the others
/// exist so a channel can report what a broker already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeKind {
    #[default]
    Fanout,
    Direct,
    Topic,
    Headers,
}

impl ExchangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ExchangeKind::Fanout => "fanout",
            ExchangeKind::Direct => "direct",
            ExchangeKind::Topic => "topic",
            ExchangeKind::Headers => "headers",
        }
    }
}

/// Optional AMQP basic properties. The shipper always publishes without them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_mode: Option<u8>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub headers: BTreeMap<String, String>,
}

/// Connection factory for a message broker.
///
/// The shipping worker calls [`Publisher::open_connection`] once, on its own
/// thread, and owns the returned channel for the rest of its life.
pub trait Publisher: Send + 'static {
    type Channel: Channel;

    fn open_connection(
        &self,
    ) -> impl Future<Output = Result<Self::Channel, PublishError>> + Send;
}

/// An open, write-only channel to the broker.
pub trait Channel: Send + 'static {
    fn declare_exchange(
        &mut self,
        name: &str,
        kind: ExchangeKind,
        durable: bool,
    ) -> impl Future<Output = Result<(), PublishError>> + Send;

    fn publish(
        &mut self,
        exchange: &str,
        routing_key: &str,
        properties: Option<&MessageProperties>,
        body: Bytes,
    ) -> impl Future<Output = Result<(), PublishError>> + Send;

    fn close(&mut self) -> impl Future<Output = Result<(), PublishError>> + Send;
}
