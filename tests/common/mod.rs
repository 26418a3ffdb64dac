#![allow(dead_code)]

use bytes::Bytes;
use parking_lot::Mutex;
use rask_log_shipper::domain::LogMessage;
use rask_log_shipper::sender::{Channel, ExchangeKind, MessageProperties, PublishError, Publisher};
use rask_log_shipper::{EnvironmentInfo, ShipperConfig};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum BrokerEvent {
    Opened,
    Declared {
        name: String,
        kind: ExchangeKind,
        durable: bool,
    },
    Published {
        exchange: String,
        routing_key: String,
        had_properties: bool,
        thread: Option<String>,
        body: Bytes,
    },
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Behavior {
    #[default]
    Healthy,
    RefuseConnection,
    RejectDeclare,
    FailEveryPublish,
    /// Panics on the n-th publish (0-based), succeeds otherwise.
    PanicOnPublish(usize),
    SlowPublish(Duration),
}

/// In-memory broker that records every call made by the worker.
#[derive(Debug, Clone, Default)]
pub struct RecordingPublisher {
    events: Arc<Mutex<Vec<BrokerEvent>>>,
    publishes: Arc<AtomicUsize>,
    behavior: Behavior,
}

impl RecordingPublisher {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<BrokerEvent> {
        self.events.lock().clone()
    }

    pub fn count(&self, predicate: impl Fn(&BrokerEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|e| predicate(e)).count()
    }

    pub fn closed_count(&self) -> usize {
        self.count(|e| matches!(e, BrokerEvent::Closed))
    }

    pub fn publish_attempts(&self) -> usize {
        self.publishes.load(Ordering::SeqCst)
    }

    pub fn published_bodies(&self) -> Vec<Bytes> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                BrokerEvent::Published { body, .. } => Some(body.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn published_messages(&self) -> Vec<LogMessage> {
        self.published_bodies()
            .iter()
            .map(|body| serde_json::from_slice(body).expect("published body is a LogMessage"))
            .collect()
    }
}

impl Publisher for RecordingPublisher {
    type Channel = RecordingChannel;

    async fn open_connection(&self) -> Result<RecordingChannel, PublishError> {
        if self.behavior == Behavior::RefuseConnection {
            return Err(PublishError::ConnectionFailed("connection refused".to_string()));
        }
        self.events.lock().push(BrokerEvent::Opened);
        Ok(RecordingChannel {
            publisher: self.clone(),
        })
    }
}

#[derive(Debug)]
pub struct RecordingChannel {
    publisher: RecordingPublisher,
}

impl Channel for RecordingChannel {
    async fn declare_exchange(
        &mut self,
        name: &str,
        kind: ExchangeKind,
        durable: bool,
    ) -> Result<(), PublishError> {
        if self.publisher.behavior == Behavior::RejectDeclare {
            return Err(PublishError::DeclareFailed(format!("exchange '{name}' rejected")));
        }
        self.publisher.events.lock().push(BrokerEvent::Declared {
            name: name.to_string(),
            kind,
            durable,
        });
        Ok(())
    }

    async fn publish(
        &mut self,
        exchange: &str,
        routing_key: &str,
        properties: Option<&MessageProperties>,
        body: Bytes,
    ) -> Result<(), PublishError> {
        let attempt = self.publisher.publishes.fetch_add(1, Ordering::SeqCst);

        match self.publisher.behavior {
            Behavior::FailEveryPublish => {
                return Err(PublishError::Other("broker unavailable".to_string()));
            }
            Behavior::PanicOnPublish(n) if n == attempt => panic!("publisher blew up"),
            Behavior::SlowPublish(delay) => tokio::time::sleep(delay).await,
            _ => {}
        }

        self.publisher.events.lock().push(BrokerEvent::Published {
            exchange: exchange.to_string(),
            routing_key: routing_key.to_string(),
            had_properties: properties.is_some(),
            thread: std::thread::current().name().map(str::to_string),
            body,
        });
        Ok(())
    }

    async fn close(&mut self) -> Result<(), PublishError> {
        self.publisher.events.lock().push(BrokerEvent::Closed);
        Ok(())
    }
}

/// Deterministic identity for records built in tests.
#[derive(Debug, Default)]
pub struct FixedEnvironment;

impl EnvironmentInfo for FixedEnvironment {
    fn application_name(&self) -> String {
        "billing".to_string()
    }

    fn host(&self) -> String {
        "billing-01".to_string()
    }

    fn process_id(&self) -> u32 {
        4242
    }

    fn ip_address(&self) -> String {
        "10.0.0.7".to_string()
    }

    fn ip_address_remote(&self) -> Option<String> {
        None
    }

    fn user_agent(&self) -> Option<String> {
        Some("billing-cli/2.1".to_string())
    }

    fn operation(&self) -> Option<String> {
        Some("nightly-close".to_string())
    }
}

pub fn test_config() -> ShipperConfig {
    ShipperConfig::new("billing", "billing.logs")
}

/// Polls `condition` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = std::time::Instant::now() + timeout;
    while std::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}
