//! The emit surface shared by every log provider.
//!
//! A provider owns a [`SeverityGate`] and a single write path. The per-level
//! methods, error-chain tracing and payload serialization are default methods
//! built on those two, so every provider filters and expands calls the same way.

pub mod gate;
pub mod tracing_adapter;

pub use gate::SeverityGate;
pub use tracing_adapter::TracingProvider;

use crate::domain::{LogLevel, Severity};
use crate::encoder::{MessageSerializer, SerializationError, SerializerFormat, describe_cause, error_chain};
use serde::Serialize;
use std::error::Error;

pub trait LogProvider: Send + Sync {
    fn gate(&self) -> &SeverityGate;

    fn serializer(&self) -> &MessageSerializer;

    /// Writes one record. Callers have already passed the severity gate.
    fn write(&self, severity: Severity, category: &str, message: &str, identifier: Option<&str>);

    fn set_level(&self, level: LogLevel) {
        self.gate().set(level);
    }

    fn level(&self) -> LogLevel {
        self.gate().get()
    }

    fn enabled(&self, severity: Severity) -> bool {
        self.gate().allows(severity)
    }

    fn log(&self, severity: Severity, category: &str, message: &str) {
        if self.enabled(severity) {
            self.write(severity, category, message, None);
        }
    }

    fn fatal(&self, category: &str, message: &str) {
        self.log(Severity::Fatal, category, message);
    }

    fn error(&self, category: &str, message: &str) {
        self.log(Severity::Error, category, message);
    }

    fn warning(&self, category: &str, message: &str) {
        self.log(Severity::Warning, category, message);
    }

    fn info(&self, category: &str, message: &str) {
        self.log(Severity::Info, category, message);
    }

    fn trace(&self, category: &str, message: &str) {
        self.log(Severity::Trace, category, message);
    }

    fn debug(&self, category: &str, message: &str) {
        self.log(Severity::Debug, category, message);
    }

    /// Writes `message`, then two records per link of the error chain.
    fn trace_with_error(&self, category: &str, message: &str, error: &(dyn Error + 'static)) {
        if !self.enabled(Severity::Trace) {
            return;
        }
        self.write(Severity::Trace, category, message, None);
        self.write_error_chain(category, error);
    }

    /// Writes the message and detail of `error` and of every nested source, in
    /// order from outermost to innermost.
    fn trace_error(&self, category: &str, error: &(dyn Error + 'static)) {
        if !self.enabled(Severity::Trace) {
            return;
        }
        self.write_error_chain(category, error);
    }

    fn write_error_chain(&self, category: &str, error: &(dyn Error + 'static)) {
        for cause in error_chain(error) {
            let (message, detail) = describe_cause(cause);
            self.write(Severity::Trace, category, &message, None);
            self.write(Severity::Trace, category, &detail, None);
        }
    }

    fn debug_with_identifier(&self, category: &str, content: &str, identifier: &str) {
        if self.enabled(Severity::Debug) {
            self.write(Severity::Debug, category, content, Some(identifier));
        }
    }

    /// Serializes `payload` (default format unless `format` is given) and writes
    /// it as a debug record. Serialization failures are returned to the caller.
    fn debug_payload<T>(
        &self,
        category: &str,
        payload: &T,
        identifier: &str,
        format: Option<SerializerFormat>,
    ) -> Result<(), SerializationError>
    where
        T: Serialize + ?Sized,
        Self: Sized,
    {
        if !self.enabled(Severity::Debug) {
            return Ok(());
        }

        let serialized = match format {
            Some(format) => self.serializer().serialize_as(payload, format)?,
            None => self.serializer().serialize(payload)?,
        };
        self.write(Severity::Debug, category, &serialized, Some(identifier));
        Ok(())
    }
}
