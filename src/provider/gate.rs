use crate::domain::{LogLevel, Severity};
use std::sync::atomic::{AtomicU32, Ordering};

/// Mutable severity threshold shared by every emit call of a provider.
///
/// Reads and writes are single relaxed atomic operations: a new mask is visible
/// to subsequent emits as soon as the store lands, last writer wins, and a
/// reader never sees a half-written mask.
#[derive(Debug, Default)]
pub struct SeverityGate {
    mask: AtomicU32,
}

impl SeverityGate {
    pub fn new(level: LogLevel) -> Self {
        Self {
            mask: AtomicU32::new(level.bits()),
        }
    }

    pub fn set(&self, level: LogLevel) {
        self.mask.store(level.bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> LogLevel {
        LogLevel::from_bits_truncate(self.mask.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn allows(&self, severity: Severity) -> bool {
        self.mask.load(Ordering::Relaxed) & severity.bit() != 0
    }
}
