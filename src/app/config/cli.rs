use super::groups::{DEFAULT_EXCHANGE, ShipperConfig};
use super::serde_helpers::{load_env_path_opt, load_env_string, load_env_var};
use super::{ConfigError, DiagnosticLevel, LogFormat};
use crate::domain::{LogLevel, Severity};
use crate::encoder::SerializerFormat;
use crate::sender::ManagementConfig;
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
#[serde(default)]
pub struct Config {
    /// RabbitMQ management API base URL
    #[arg(long, env = "RASK_BROKER_URL", default_value = "http://localhost:15672")]
    pub broker_url: String,

    /// Virtual host the exchange lives in
    #[arg(long, env = "RASK_VHOST", default_value = "/")]
    pub vhost: String,

    /// Fanout exchange receiving every shipped record
    #[arg(long, env = "RASK_EXCHANGE", default_value = DEFAULT_EXCHANGE)]
    pub exchange: String,

    /// Broker user
    #[arg(long, env = "RASK_USERNAME", default_value = "guest")]
    pub username: String,

    /// Broker password
    #[arg(long, env = "RASK_PASSWORD", default_value = "guest", hide_env_values = true)]
    pub password: String,

    /// Application name stamped into every record
    #[arg(long, env = "RASK_APPLICATION", default_value = env!("CARGO_PKG_NAME"))]
    pub application_name: String,

    /// Severities to ship, e.g. "production", "all" or "fatal|error|warning"
    #[arg(long, env = "RASK_LEVEL", default_value = "production")]
    pub level: LogLevel,

    /// Category assigned to lines read from stdin
    #[arg(long, env = "RASK_CATEGORY", default_value = "stdin")]
    pub category: String,

    /// Severity assigned to lines read from stdin
    #[arg(long, env = "RASK_SEVERITY", default_value = "info")]
    pub severity: Severity,

    /// Default format for serialized debug payloads
    #[arg(long, env = "RASK_PAYLOAD_FORMAT", value_enum, default_value = "json")]
    pub payload_format: SerializerFormat,

    /// Verbosity of the shipper's own diagnostics
    #[arg(long, env = "LOG_LEVEL", value_enum, default_value = "info")]
    pub log_level: DiagnosticLevel,

    /// Format of the shipper's own diagnostics
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "compact")]
    pub log_format: LogFormat,

    /// Per-request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "30")]
    pub request_timeout_secs: u64,

    /// Connection timeout in seconds
    #[arg(long, env = "CONNECTION_TIMEOUT_SECS", default_value = "10")]
    pub connection_timeout_secs: u64,

    /// Enable gzip for management API responses
    #[arg(long, env = "ENABLE_COMPRESSION")]
    pub enable_compression: bool,

    /// Configuration file path (optional)
    #[arg(long, env = "CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    #[serde(skip)]
    #[arg(skip)]
    pub request_timeout: Duration,

    #[serde(skip)]
    #[arg(skip)]
    pub connection_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            broker_url: "http://localhost:15672".to_string(),
            vhost: "/".to_string(),
            exchange: DEFAULT_EXCHANGE.to_string(),
            username: "guest".to_string(),
            password: "guest".to_string(),
            application_name: env!("CARGO_PKG_NAME").to_string(),
            level: LogLevel::PRODUCTION,
            category: "stdin".to_string(),
            severity: Severity::Info,
            payload_format: SerializerFormat::Json,
            log_level: DiagnosticLevel::Info,
            log_format: LogFormat::Compact,
            request_timeout_secs: 30,
            connection_timeout_secs: 10,
            enable_compression: false,
            config_file: None,
            request_timeout: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut config = Config::parse_from(args);

        if let Some(path) = config.config_file.clone() {
            config = Self::from_file(path)?;
        }

        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        load_env_string("RASK_BROKER_URL", &mut config.broker_url);
        load_env_string("RASK_VHOST", &mut config.vhost);
        load_env_string("RASK_EXCHANGE", &mut config.exchange);
        load_env_string("RASK_USERNAME", &mut config.username);
        load_env_string("RASK_PASSWORD", &mut config.password);
        load_env_string("RASK_APPLICATION", &mut config.application_name);
        load_env_var("RASK_LEVEL", &mut config.level)?;
        load_env_string("RASK_CATEGORY", &mut config.category);
        load_env_var("RASK_SEVERITY", &mut config.severity)?;

        if let Ok(format) = std::env::var("RASK_PAYLOAD_FORMAT") {
            config.payload_format = SerializerFormat::from_str(&format, true).map_err(|_| {
                ConfigError::EnvError(format!(
                    "Invalid RASK_PAYLOAD_FORMAT: {format}. Valid values: json, pretty-json, toml"
                ))
            })?;
        }

        load_env_var("LOG_LEVEL", &mut config.log_level)?;
        load_env_var("LOG_FORMAT", &mut config.log_format)?;
        load_env_var("REQUEST_TIMEOUT_SECS", &mut config.request_timeout_secs)?;
        load_env_var("CONNECTION_TIMEOUT_SECS", &mut config.connection_timeout_secs)?;
        load_env_var("ENABLE_COMPRESSION", &mut config.enable_compression)?;
        load_env_path_opt("CONFIG_FILE", &mut config.config_file);

        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config: Config = toml::from_str(&content)?;
        config.config_file = Some(path.as_ref().to_path_buf());
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn post_process(&mut self) -> Result<(), ConfigError> {
        self.request_timeout = Duration::from_secs(self.request_timeout_secs);
        self.connection_timeout = Duration::from_secs(self.connection_timeout_secs);
        Ok(())
    }

    pub fn shipper_config(&self) -> ShipperConfig {
        ShipperConfig {
            application_name: self.application_name.clone(),
            exchange: self.exchange.clone(),
            level: self.level,
            serializer_format: self.payload_format,
        }
    }

    pub fn management_config(&self) -> ManagementConfig {
        ManagementConfig {
            broker_url: self.broker_url.clone(),
            vhost: self.vhost.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            timeout: self.request_timeout,
            connection_timeout: self.connection_timeout,
            enable_compression: self.enable_compression,
            ..ManagementConfig::default()
        }
    }
}
