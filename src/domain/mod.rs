//! Domain layer for rask-log-shipper.
//!
//! Contains the canonical types shared across all modules:
//! - `LogMessage`: the record shipped to the broker
//! - `Severity` / `LogLevel`: single severity and the enabled-severity mask
//! - `ShipperError`: top-level error type

pub mod error;
pub mod log_level;
pub mod log_message;

pub use error::ShipperError;
pub use log_level::{LevelParseError, LogLevel, Severity};
pub use log_message::LogMessage;
