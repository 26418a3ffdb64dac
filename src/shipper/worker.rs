use crate::buffer::QueueReceiver;
use crate::domain::ShipperError;
use crate::sender::{Channel, ExchangeKind, PublishError, PublishStats, Publisher};
use bytes::Bytes;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc as std_mpsc;
use std::thread::{self, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub const WORKER_THREAD_NAME: &str = "rask-log-shipper-worker";

/// Lifecycle of the shipping worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerState {
    Starting,
    Draining,
    Idle,
    ShuttingDown,
    Stopped,
}

impl WorkerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => WorkerState::Starting,
            1 => WorkerState::Draining,
            2 => WorkerState::Idle,
            3 => WorkerState::ShuttingDown,
            _ => WorkerState::Stopped,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            WorkerState::Starting => 0,
            WorkerState::Draining => 1,
            WorkerState::Idle => 2,
            WorkerState::ShuttingDown => 3,
            WorkerState::Stopped => 4,
        }
    }
}

/// Worker state readable from producer threads.
#[derive(Debug)]
pub struct WorkerStateCell(AtomicU8);

impl WorkerStateCell {
    pub fn new() -> Self {
        Self(AtomicU8::new(WorkerState::Starting.as_u8()))
    }

    pub fn get(&self) -> WorkerState {
        WorkerState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn set(&self, state: WorkerState) {
        self.0.store(state.as_u8(), Ordering::Release);
    }
}

impl Default for WorkerStateCell {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) struct WorkerContext {
    pub exchange: String,
    pub receiver: QueueReceiver,
    pub cancel: CancellationToken,
    pub state: Arc<WorkerStateCell>,
    pub stats: Arc<PublishStats>,
}

/// Starts the worker thread and blocks until it has opened the connection and
/// declared the exchange. Startup failures are returned here; once this
/// returns `Ok`, the thread owns the channel until it stops.
pub(crate) fn spawn<P: Publisher>(
    publisher: P,
    context: WorkerContext,
) -> Result<JoinHandle<()>, ShipperError> {
    let (ready_tx, ready_rx) = std_mpsc::sync_channel::<Result<(), ShipperError>>(1);
    let state = context.state.clone();

    let handle = thread::Builder::new()
        .name(WORKER_THREAD_NAME.to_string())
        .spawn(move || run_thread(publisher, context, ready_tx))
        .map_err(|e| ShipperError::Worker(format!("Failed to spawn worker thread: {e}")))?;

    match ready_rx.recv() {
        Ok(Ok(())) => Ok(handle),
        Ok(Err(e)) => {
            let _ = handle.join();
            Err(e)
        }
        Err(_) => {
            let _ = handle.join();
            state.set(WorkerState::Stopped);
            Err(ShipperError::Worker(
                "Worker exited before reporting startup".to_string(),
            ))
        }
    }
}

fn run_thread<P: Publisher>(
    publisher: P,
    context: WorkerContext,
    ready_tx: std_mpsc::SyncSender<Result<(), ShipperError>>,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            context.state.set(WorkerState::Stopped);
            let _ = ready_tx.send(Err(ShipperError::Worker(format!(
                "Failed to build worker runtime: {e}"
            ))));
            return;
        }
    };

    runtime.block_on(async move {
        let state = context.state.clone();
        let mut channel = match start_channel(&publisher, &context.exchange).await {
            Ok(channel) => channel,
            Err(e) => {
                state.set(WorkerState::Stopped);
                let _ = ready_tx.send(Err(ShipperError::Startup(e)));
                return;
            }
        };

        state.set(WorkerState::Draining);
        let _ = ready_tx.send(Ok(()));
        drop(ready_tx);

        drain(&mut channel, context).await;

        state.set(WorkerState::ShuttingDown);
        match AssertUnwindSafe(channel.close()).catch_unwind().await {
            Ok(Ok(())) => info!("Log shipping channel closed"),
            Ok(Err(e)) => warn!("Failed to close log shipping channel: {}", e),
            Err(_) => error!("Publisher panicked while closing the channel"),
        }
        state.set(WorkerState::Stopped);
    });
}

async fn start_channel<P: Publisher>(
    publisher: &P,
    exchange: &str,
) -> Result<P::Channel, PublishError> {
    let mut channel = publisher.open_connection().await?;
    if let Err(e) = channel.declare_exchange(exchange, ExchangeKind::Fanout, true).await {
        let _ = channel.close().await;
        return Err(e);
    }
    Ok(channel)
}

/// Publishes until cancellation is observed with an empty queue.
///
/// Pending messages win over cancellation, so everything enqueued before the
/// worker sees an empty queue after cancel goes out. The receiver is closed on
/// exit; later enqueues fail and are counted as dropped by the queue.
async fn drain<C: Channel>(channel: &mut C, context: WorkerContext) {
    let WorkerContext {
        exchange,
        mut receiver,
        cancel,
        state,
        stats,
    } = context;

    loop {
        if receiver.is_empty() {
            state.set(WorkerState::Idle);
        }
        tokio::select! {
            biased;
            message = receiver.dequeue() => match message {
                Some(message) => {
                    state.set(WorkerState::Draining);
                    publish_one(channel, &exchange, message, &stats).await;
                }
                None => {
                    debug!("All producers gone, stopping log shipping worker");
                    break;
                }
            },
            () = cancel.cancelled() => {
                debug!("Cancellation observed with empty queue");
                break;
            }
        }
    }

    receiver.close();
    let abandoned = receiver.discard_pending();
    if abandoned > 0 {
        debug!("{} log messages enqueued during shutdown were not shipped", abandoned);
    }
}

/// One publish attempt. Failures and panics are logged and counted, never
/// retried, never surfaced.
async fn publish_one<C: Channel>(
    channel: &mut C,
    exchange: &str,
    message: Bytes,
    stats: &PublishStats,
) {
    let size = message.len() as u64;
    let attempt = AssertUnwindSafe(channel.publish(exchange, "", None, message)).catch_unwind();

    match attempt.await {
        Ok(Ok(())) => stats.record_published(size),
        Ok(Err(e)) => {
            stats.record_failed();
            warn!(exchange, error = %e, "Dropping log message after failed publish");
        }
        Err(_) => {
            stats.record_panicked();
            error!(exchange, "Publisher panicked; dropping log message");
        }
    }
}
