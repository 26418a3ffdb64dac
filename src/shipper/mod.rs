//! The shipping pipeline: gate, encode, enqueue on the caller's thread, and
//! publish from one background worker.

pub mod worker;

pub use worker::{WORKER_THREAD_NAME, WorkerState, WorkerStateCell};

use crate::app::ShipperConfig;
use crate::buffer::{MessageQueue, QueueMetrics, QueueSender};
use crate::domain::{Severity, ShipperError};
use crate::encoder::{EnvironmentInfo, EventEncoder, MessageSerializer, SystemEnvironment};
use crate::provider::{LogProvider, SeverityGate};
use crate::sender::{PublishStats, PublishStatsSnapshot, Publisher};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, trace, warn};
use worker::WorkerContext;

pub struct LogShipperBuilder {
    config: ShipperConfig,
    environment: Option<Arc<dyn EnvironmentInfo>>,
    cancel: Option<CancellationToken>,
}

impl LogShipperBuilder {
    pub fn new(config: ShipperConfig) -> Self {
        Self {
            config,
            environment: None,
            cancel: None,
        }
    }

    /// Replaces the default [`SystemEnvironment`] sampled for every record.
    pub fn environment(mut self, environment: Arc<dyn EnvironmentInfo>) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Stops the worker when `token` is cancelled, in addition to
    /// [`LogShipper::shutdown`]. Shutting the shipper down never cancels `token`.
    pub fn cancellation(mut self, token: &CancellationToken) -> Self {
        self.cancel = Some(token.child_token());
        self
    }

    /// Validates the configuration, opens the publisher's channel, declares
    /// the exchange and starts the worker. Returns only once the worker is
    /// draining; any failure along the way is returned and nothing keeps running.
    pub fn start<P: Publisher>(self, publisher: P) -> Result<LogShipper, ShipperError> {
        self.config.validate()?;

        let environment = self.environment.unwrap_or_else(|| {
            Arc::new(SystemEnvironment::new(self.config.application_name.clone()))
        });
        let encoder = EventEncoder::new(
            environment,
            MessageSerializer::new(self.config.serializer_format),
        );

        let (sender, receiver) = MessageQueue::unbounded();
        let cancel = self.cancel.unwrap_or_default();
        let state = Arc::new(WorkerStateCell::new());
        let stats = Arc::new(PublishStats::new());

        let handle = worker::spawn(
            publisher,
            WorkerContext {
                exchange: self.config.exchange.clone(),
                receiver,
                cancel: cancel.clone(),
                state: state.clone(),
                stats: stats.clone(),
            },
        )?;

        info!(
            "Log shipper started (exchange: '{}', level: {})",
            self.config.exchange, self.config.level
        );

        Ok(LogShipper {
            gate: SeverityGate::new(self.config.level),
            encoder,
            sender,
            cancel,
            worker: Mutex::new(Some(handle)),
            released: AtomicBool::new(false),
            state,
            stats,
            exchange: self.config.exchange,
        })
    }
}

/// A [`LogProvider`] that ships every accepted record to a fanout exchange.
///
/// Emit calls never block on the transport: records are encoded on the
/// calling thread and handed to an unbounded queue. A single worker thread
/// publishes them in FIFO order until [`shutdown`](Self::shutdown) or drop.
pub struct LogShipper {
    gate: SeverityGate,
    encoder: EventEncoder,
    sender: QueueSender,
    cancel: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
    released: AtomicBool,
    state: Arc<WorkerStateCell>,
    stats: Arc<PublishStats>,
    exchange: String,
}

impl LogShipper {
    pub fn builder(config: ShipperConfig) -> LogShipperBuilder {
        LogShipperBuilder::new(config)
    }

    pub fn start<P: Publisher>(config: ShipperConfig, publisher: P) -> Result<Self, ShipperError> {
        LogShipperBuilder::new(config).start(publisher)
    }

    /// Stops the worker after it has shipped what is already queued, then
    /// waits for it to close the channel. Returns `false` if the shipper was
    /// already shut down.
    pub fn shutdown(&self) -> bool {
        if self.released.swap(true, Ordering::AcqRel) {
            return false;
        }

        self.cancel.cancel();

        let Some(handle) = self.worker.lock().take() else {
            return true;
        };
        if handle.thread().id() == thread::current().id() {
            warn!("Shutdown requested from the worker thread; not waiting for it");
            return true;
        }
        if handle.join().is_err() {
            error!("Log shipping worker panicked");
        }

        let stats = self.stats.snapshot();
        info!(
            "Log shipper stopped (published: {}, failed: {})",
            stats.published, stats.failed
        );
        true
    }

    pub fn is_shut_down(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    pub fn worker_state(&self) -> WorkerState {
        self.state.get()
    }

    pub fn queue_metrics(&self) -> QueueMetrics {
        self.sender.metrics()
    }

    pub fn publish_stats(&self) -> PublishStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    pub fn environment(&self) -> &Arc<dyn EnvironmentInfo> {
        self.encoder.environment()
    }
}

impl LogProvider for LogShipper {
    fn gate(&self) -> &SeverityGate {
        &self.gate
    }

    fn serializer(&self) -> &MessageSerializer {
        self.encoder.serializer()
    }

    fn write(&self, severity: Severity, category: &str, message: &str, identifier: Option<&str>) {
        let encoded = match self.encoder.encode(severity, category, message, identifier) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!("Failed to encode log message for category '{}': {}", category, e);
                return;
            }
        };

        if self.sender.enqueue(encoded).is_err() {
            trace!("Log shipper is stopped; dropping message for category '{}'", category);
        }
    }
}

impl Drop for LogShipper {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for LogShipper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogShipper")
            .field("exchange", &self.exchange)
            .field("level", &self.gate.get())
            .field("state", &self.state.get())
            .finish_non_exhaustive()
    }
}
