use super::ConfigError;
use crate::domain::LogLevel;
use crate::encoder::SerializerFormat;
use serde::{Deserialize, Serialize};

pub const DEFAULT_EXCHANGE: &str = "rask.logs";

/// Settings the shipping pipeline itself needs, independent of the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipperConfig {
    /// Name stamped into every record's `application` field.
    pub application_name: String,
    /// Fanout exchange every record is published to.
    pub exchange: String,
    /// Initial severity mask; adjustable afterwards through the provider.
    pub level: LogLevel,
    /// Default format for serialized debug payloads.
    pub serializer_format: SerializerFormat,
}

impl Default for ShipperConfig {
    fn default() -> Self {
        Self {
            application_name: env!("CARGO_PKG_NAME").to_string(),
            exchange: DEFAULT_EXCHANGE.to_string(),
            level: LogLevel::PRODUCTION,
            serializer_format: SerializerFormat::Json,
        }
    }
}

impl ShipperConfig {
    pub fn new(application_name: impl Into<String>, exchange: impl Into<String>) -> Self {
        Self {
            application_name: application_name.into(),
            exchange: exchange.into(),
            ..Self::default()
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.exchange.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "Exchange name must not be empty".to_string(),
            ));
        }
        if self.application_name.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "Application name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
