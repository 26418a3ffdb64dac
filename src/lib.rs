#![deny(rust_2024_compatibility)]
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
#![allow(
    clippy::cast_lossless,            // Infallible casts are clear enough with `as`
    clippy::cast_possible_truncation, // Counters and durations stay within bounds
    clippy::cast_precision_loss,      // Acceptable for metrics/display
    clippy::missing_errors_doc,       // Internal API
    clippy::missing_panics_doc,       // Internal API
    clippy::module_name_repetitions,  // e.g. QueueError in buffer::queue
    clippy::must_use_candidate,       // Annotated selectively on critical APIs
    clippy::doc_markdown              // Internal API
)]

//! Asynchronous structured log shipping to a fanout exchange.
//!
//! Callers emit through the [`LogProvider`] surface of a [`LogShipper`]. Each
//! accepted record is encoded on the calling thread, queued, and published by
//! a single background worker, so emitting never waits on the broker.

pub mod app;
pub mod buffer;
pub mod domain;
pub mod encoder;
pub mod provider;
pub mod sender;
pub mod shipper;

pub use app::{App, Config, ShipperConfig};
pub use domain::{LogLevel, LogMessage, Severity, ShipperError};
pub use encoder::{EnvironmentInfo, SerializerFormat, SystemEnvironment};
pub use provider::{LogProvider, TracingProvider};
pub use sender::{Channel, ExchangeKind, ManagementPublisher, PublishError, Publisher};
pub use shipper::{LogShipper, LogShipperBuilder, WorkerState};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
