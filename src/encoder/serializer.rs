use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML serialization failed: {0}")]
    Toml(#[from] toml::ser::Error),
}

/// Text formats a structured payload can be rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SerializerFormat {
    #[default]
    Json,
    PrettyJson,
    Toml,
}

/// Renders records and payloads to text.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageSerializer {
    default_format: SerializerFormat,
}

impl MessageSerializer {
    pub fn new(default_format: SerializerFormat) -> Self {
        Self { default_format }
    }

    pub fn default_format(&self) -> SerializerFormat {
        self.default_format
    }

    pub fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, SerializationError> {
        self.serialize_as(value, self.default_format)
    }

    pub fn serialize_as<T: Serialize + ?Sized>(
        &self,
        value: &T,
        format: SerializerFormat,
    ) -> Result<String, SerializationError> {
        match format {
            SerializerFormat::Json => Ok(serde_json::to_string(value)?),
            SerializerFormat::PrettyJson => Ok(serde_json::to_string_pretty(value)?),
            SerializerFormat::Toml => Ok(toml::to_string(value)?),
        }
    }

    /// Wire form of a record. Always compact JSON regardless of the payload
    /// default, since consumers of the exchange parse it line by line.
    pub fn serialize_record<T: Serialize + ?Sized>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, SerializationError> {
        Ok(serde_json::to_vec(value)?)
    }
}
