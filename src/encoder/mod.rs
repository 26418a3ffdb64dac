//! Turns emit calls into encoded records.
//!
//! The encoder samples the environment at call time, stamps the record with a
//! fresh correlation id and the calling thread's identity, and serializes it
//! to the bytes that travel through the queue.

pub mod environment;
pub mod serializer;

pub use environment::{EnvironmentInfo, SystemEnvironment};
pub use serializer::{MessageSerializer, SerializationError, SerializerFormat};

use crate::domain::{LogMessage, Severity};
use bytes::Bytes;
use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_ID: u64 = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
}

/// Stable numeric id of the calling thread, assigned on first use.
pub fn current_thread_id() -> u64 {
    THREAD_ID.with(|id| *id)
}

/// Iterates an error followed by every nested `source()`.
pub fn error_chain<'a>(
    error: &'a (dyn Error + 'static),
) -> impl Iterator<Item = &'a (dyn Error + 'static)> {
    std::iter::successors(Some(error), |&e| e.source())
}

/// The two records emitted per link of an error chain: the cause's message and
/// its detail rendering.
pub fn describe_cause(cause: &(dyn Error + 'static)) -> (String, String) {
    (cause.to_string(), format!("{cause:?}"))
}

#[derive(Clone)]
pub struct EventEncoder {
    environment: Arc<dyn EnvironmentInfo>,
    serializer: MessageSerializer,
}

impl EventEncoder {
    pub fn new(environment: Arc<dyn EnvironmentInfo>, serializer: MessageSerializer) -> Self {
        Self {
            environment,
            serializer,
        }
    }

    pub fn serializer(&self) -> &MessageSerializer {
        &self.serializer
    }

    pub fn environment(&self) -> &Arc<dyn EnvironmentInfo> {
        &self.environment
    }

    pub fn build(
        &self,
        level: Severity,
        category: &str,
        message: &str,
        identifier: Option<&str>,
    ) -> LogMessage {
        let env = &self.environment;
        let thread = std::thread::current();

        LogMessage {
            id: Uuid::new_v4().to_string(),
            application: env.application_name(),
            category: category.to_string(),
            date: chrono::Utc::now(),
            hostname: env.host(),
            ip_address: env.ip_address(),
            ip_address_remote: env.ip_address_remote(),
            level,
            message: message.to_string(),
            message_identifier: identifier.map(str::to_string),
            operation: env.operation(),
            process_id: env.process_id(),
            user_agent: env.user_agent(),
            thread_id: current_thread_id(),
            thread_name: thread.name().map(str::to_string),
        }
    }

    pub fn encode(
        &self,
        level: Severity,
        category: &str,
        message: &str,
        identifier: Option<&str>,
    ) -> Result<Bytes, SerializationError> {
        let record = self.build(level, category, message, identifier);
        Ok(Bytes::from(self.serializer.serialize_record(&record)?))
    }
}

impl std::fmt::Debug for EventEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEncoder")
            .field("serializer", &self.serializer)
            .finish_non_exhaustive()
    }
}
