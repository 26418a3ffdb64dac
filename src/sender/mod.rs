//! Broker transport: the [`Publisher`]/[`Channel`] seam the shipping worker
//! talks to, and the RabbitMQ management API implementation of it.

pub mod client;
pub mod management;
pub mod publisher;
pub mod stats;

pub use client::{ManagementClient, ManagementConfig};
pub use management::{ManagementChannel, ManagementPublisher};
pub use publisher::{Channel, ExchangeKind, MessageProperties, PublishError, Publisher};
pub use stats::{PublishStats, PublishStatsSnapshot};
