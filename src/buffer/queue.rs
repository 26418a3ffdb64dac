use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("Queue is closed")]
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueMetrics {
    pub enqueued: u64,
    pub dequeued: u64,
    pub dropped: u64,
    pub depth: usize,
    pub peak_depth: usize,
    pub throughput_per_second: f64,
}

#[derive(Debug)]
pub struct QueueMetricsCollector {
    enqueued: AtomicU64,
    dequeued: AtomicU64,
    dropped: AtomicU64,
    depth: AtomicUsize,
    peak_depth: AtomicUsize,
    start_time: Instant,
}

impl QueueMetricsCollector {
    fn new() -> Self {
        Self {
            enqueued: AtomicU64::new(0),
            dequeued: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            depth: AtomicUsize::new(0),
            peak_depth: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn snapshot(&self) -> QueueMetrics {
        let enqueued = self.enqueued.load(Ordering::Relaxed);
        let elapsed_secs = self.start_time.elapsed().as_secs_f64();

        QueueMetrics {
            enqueued,
            dequeued: self.dequeued.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            depth: self.depth.load(Ordering::Relaxed),
            peak_depth: self.peak_depth.load(Ordering::Relaxed),
            throughput_per_second: if elapsed_secs > 0.0 {
                enqueued as f64 / elapsed_secs
            } else {
                0.0
            },
        }
    }

    fn record_enqueue(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
        let depth = self.depth.fetch_add(1, Ordering::AcqRel) + 1;
        self.update_peak_depth(depth);
    }

    fn record_dequeue(&self) {
        self.dequeued.fetch_add(1, Ordering::Relaxed);
        // The consumer can observe an item before the producer's increment lands.
        let _ = self
            .depth
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |d| Some(d.saturating_sub(1)));
    }

    fn record_rejected(&self) {
        self.enqueued.fetch_sub(1, Ordering::Relaxed);
        let _ = self
            .depth
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |d| Some(d.saturating_sub(1)));
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    fn record_discarded(&self) {
        let _ = self
            .depth
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |d| Some(d.saturating_sub(1)));
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    fn update_peak_depth(&self, current: usize) {
        let mut peak = self.peak_depth.load(Ordering::Relaxed);
        while current > peak {
            match self.peak_depth.compare_exchange_weak(
                peak,
                current,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(x) => peak = x,
            }
        }
    }
}

/// Unbounded multi-producer, single-consumer queue of encoded log messages.
///
/// Enqueue never blocks and never fails for capacity reasons. Depth is not
/// bounded: a producer that outpaces the broker grows memory without limit,
/// which is why depth and peak depth are exported through [`QueueMetrics`].
pub struct MessageQueue;

impl MessageQueue {
    pub fn unbounded() -> (QueueSender, QueueReceiver) {
        let metrics = Arc::new(QueueMetricsCollector::new());
        let (tx, rx) = mpsc::unbounded_channel();

        (
            QueueSender {
                tx,
                metrics: metrics.clone(),
            },
            QueueReceiver { rx, metrics },
        )
    }
}

/// Producer half. Cheap to clone and safe to share between threads.
#[derive(Clone)]
pub struct QueueSender {
    tx: UnboundedSender<Bytes>,
    metrics: Arc<QueueMetricsCollector>,
}

impl QueueSender {
    /// Appends a message. Fails only once the consumer is gone; the message is
    /// then counted as dropped.
    pub fn enqueue(&self, message: Bytes) -> Result<(), QueueError> {
        self.metrics.record_enqueue();
        match self.tx.send(message) {
            Ok(()) => Ok(()),
            Err(_) => {
                self.metrics.record_rejected();
                Err(QueueError::Closed)
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn metrics(&self) -> QueueMetrics {
        self.metrics.snapshot()
    }
}

/// Consumer half. Exactly one exists per queue.
pub struct QueueReceiver {
    rx: UnboundedReceiver<Bytes>,
    metrics: Arc<QueueMetricsCollector>,
}

impl QueueReceiver {
    /// Waits for the next message. Resolves to `None` once every sender is gone
    /// and the queue is empty.
    pub async fn dequeue(&mut self) -> Option<Bytes> {
        let message = self.rx.recv().await?;
        self.metrics.record_dequeue();
        Some(message)
    }

    pub fn try_dequeue(&mut self) -> Option<Bytes> {
        let message = self.rx.try_recv().ok()?;
        self.metrics.record_dequeue();
        Some(message)
    }

    /// Stops accepting new messages; already queued ones stay readable.
    pub fn close(&mut self) {
        self.rx.close();
    }

    /// Empties the queue without delivering anything, counting each message as
    /// dropped. Returns how many were discarded.
    pub fn discard_pending(&mut self) -> usize {
        let mut discarded = 0;
        while self.rx.try_recv().is_ok() {
            self.metrics.record_discarded();
            discarded += 1;
        }
        discarded
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn metrics(&self) -> QueueMetrics {
        self.metrics.snapshot()
    }
}

impl std::fmt::Debug for QueueReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueReceiver")
            .field("len", &self.len())
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}
