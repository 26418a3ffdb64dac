// Lock-free publish statistics using atomic operations
//
// Written by the shipping worker, read by any thread through the provider.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug)]
pub struct PublishStats {
    published: AtomicU64,
    failed: AtomicU64,
    panicked: AtomicU64,
    bytes_sent: AtomicU64,
    last_publish_time: AtomicU64,
}

impl Default for PublishStats {
    fn default() -> Self {
        Self::new()
    }
}

impl PublishStats {
    pub fn new() -> Self {
        Self {
            published: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            panicked: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            last_publish_time: AtomicU64::new(0),
        }
    }

    pub fn record_published(&self, bytes: u64) {
        self.published.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes, Ordering::Relaxed);

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        self.last_publish_time.store(now, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// A panic inside the publisher counts as a failure too.
    pub fn record_panicked(&self) {
        self.panicked.fetch_add(1, Ordering::Relaxed);
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PublishStatsSnapshot {
        PublishStatsSnapshot {
            published: self.published.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            last_publish_time: self.last_publish_time.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`PublishStats`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishStatsSnapshot {
    pub published: u64,
    pub failed: u64,
    pub panicked: u64,
    pub bytes_sent: u64,
    /// Unix seconds of the last successful publish, 0 if none.
    pub last_publish_time: u64,
}

impl PublishStatsSnapshot {
    pub fn attempted(&self) -> u64 {
        self.published + self.failed
    }

    pub fn success_rate(&self) -> f64 {
        let attempted = self.attempted();
        if attempted == 0 {
            1.0
        } else {
            self.published as f64 / attempted as f64
        }
    }
}
