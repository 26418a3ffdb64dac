use crate::app::ConfigError;
use crate::buffer::QueueError;
use crate::encoder::SerializationError;
use crate::sender::PublishError;
use thiserror::Error;

/// Top-level error type for the shipping pipeline.
///
/// Only configuration, startup transport and serialization failures ever reach
/// a caller; transport failures while draining stay inside the worker.
#[derive(Error, Debug)]
pub enum ShipperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    #[error("Startup failed: {0}")]
    Startup(#[from] PublishError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Worker error: {0}")]
    Worker(String),
}
