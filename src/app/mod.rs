pub mod config;
pub mod logging_system;
pub mod shutdown;

pub use config::{Config, ConfigError, DiagnosticLevel, LogFormat, ShipperConfig};
pub use logging_system::{LoggingError, LoggingSystem, setup_logging};
pub use shutdown::install_signal_handlers;

use crate::domain::ShipperError;
use crate::provider::LogProvider;
use crate::sender::ManagementPublisher;
use crate::shipper::LogShipper;
use anyhow::Context;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Ships lines from an async reader until EOF or cancellation.
pub struct App {
    config: Config,
    shipper: Arc<LogShipper>,
    cancel: CancellationToken,
}

impl App {
    pub async fn from_config(config: Config) -> Result<Self, ShipperError> {
        let cancel = CancellationToken::new();
        let publisher = ManagementPublisher::new(config.management_config());
        let builder = LogShipper::builder(config.shipper_config()).cancellation(&cancel);

        // Startup blocks until the worker has declared the exchange.
        let shipper = tokio::task::spawn_blocking(move || builder.start(publisher))
            .await
            .map_err(|e| ShipperError::Worker(format!("Startup task failed: {e}")))??;

        Ok(Self {
            config,
            shipper: Arc::new(shipper),
            cancel,
        })
    }

    pub fn shipper(&self) -> &Arc<LogShipper> {
        &self.shipper
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Emits every line of `input` at the configured severity and category,
    /// then shuts the shipper down. Returns the number of lines read.
    pub async fn run<R>(self, input: R) -> anyhow::Result<u64>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        let mut count = 0u64;

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    info!("Cancellation requested; stopping input");
                    break;
                }
                line = lines.next_line() => match line.context("Failed to read input")? {
                    Some(line) if line.trim().is_empty() => {}
                    Some(line) => {
                        count += 1;
                        self.shipper.log(self.config.severity, &self.config.category, &line);
                    }
                    None => {
                        info!("Input closed after {} lines", count);
                        break;
                    }
                },
            }
        }

        let shipper = self.shipper.clone();
        let released = tokio::task::spawn_blocking(move || shipper.shutdown())
            .await
            .context("Shutdown task failed")?;
        if !released {
            warn!("Log shipper was already shut down");
        }

        let stats = self.shipper.publish_stats();
        let queue = self.shipper.queue_metrics();
        info!(
            "Shipped {} of {} lines ({} failed, {} dropped at shutdown)",
            stats.published, count, stats.failed, queue.dropped
        );
        Ok(count)
    }
}

pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

pub async fn main() -> anyhow::Result<()> {
    let config = Config::from_args(std::env::args_os())?;
    setup_logging(config.log_level, config.log_format)?;

    info!("Starting rask-log-shipper v{}", get_version());
    info!(
        "Configuration: broker_url={}, vhost={}, exchange={}, level={}",
        config.broker_url, config.vhost, config.exchange, config.level
    );

    let app = App::from_config(config)
        .await
        .context("Failed to start log shipper")?;
    let signals = install_signal_handlers(app.cancellation_token());

    let stdin = BufReader::new(tokio::io::stdin());
    let result = app.run(stdin).await;
    signals.abort();

    result.map(|_| ())
}
