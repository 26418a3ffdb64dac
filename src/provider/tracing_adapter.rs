use super::{LogProvider, SeverityGate};
use crate::domain::{LogLevel, Severity};
use crate::encoder::MessageSerializer;
use tracing::{debug, error, info, warn};

/// Severity-gated pass-through to the `tracing` macros.
///
/// Fatal and Error map to `error!`, Warning to `warn!`, Info and Trace to
/// `info!`, Debug to `debug!`. The category and identifier travel as fields.
#[derive(Debug, Default)]
pub struct TracingProvider {
    gate: SeverityGate,
    serializer: MessageSerializer,
}

impl TracingProvider {
    pub fn new(level: LogLevel) -> Self {
        Self {
            gate: SeverityGate::new(level),
            serializer: MessageSerializer::default(),
        }
    }

    pub fn with_serializer(mut self, serializer: MessageSerializer) -> Self {
        self.serializer = serializer;
        self
    }
}

impl LogProvider for TracingProvider {
    fn gate(&self) -> &SeverityGate {
        &self.gate
    }

    fn serializer(&self) -> &MessageSerializer {
        &self.serializer
    }

    fn write(&self, severity: Severity, category: &str, message: &str, identifier: Option<&str>) {
        match severity {
            Severity::Fatal => error!(category, identifier, fatal = true, "{message}"),
            Severity::Error => error!(category, identifier, "{message}"),
            Severity::Warning => warn!(category, identifier, "{message}"),
            Severity::Info | Severity::Trace => info!(category, identifier, "{message}"),
            Severity::Debug => debug!(category, identifier, "{message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::io;
    use std::sync::Arc;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture(f: impl FnOnce()) -> String {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(captured.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = captured.0.lock().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_levels_map_to_tracing() {
        let provider = TracingProvider::new(LogLevel::ALL);
        let output = capture(|| {
            provider.warning("disk", "almost full");
            provider.trace("sync", "step 3");
            provider.debug_with_identifier("cache", "miss", "key-1");
        });

        assert!(output.contains("WARN"));
        assert!(output.contains("almost full"));
        assert!(output.contains("category=\"disk\""));
        assert!(output.contains(" INFO"));
        assert!(output.contains("step 3"));
        assert!(output.contains("DEBUG"));
        assert!(output.contains("identifier=\"key-1\""));
    }

    #[test]
    fn test_gate_filters_before_tracing() {
        let provider = TracingProvider::new(LogLevel::PRODUCTION);
        let output = capture(|| {
            provider.info("app", "hidden");
            provider.fatal("app", "shown");
        });

        assert!(!output.contains("hidden"));
        assert!(output.contains("shown"));
        assert!(output.contains("fatal=true"));
    }
}
