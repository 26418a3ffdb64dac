use super::{Config, ConfigError};
use url::Url;

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let broker_url = Url::parse(&self.broker_url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid broker URL '{}': {}", self.broker_url, e))
        })?;
        if !matches!(broker_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(format!(
                "Broker URL '{}' must use http or https",
                self.broker_url
            )));
        }

        if self.vhost.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "Virtual host must not be empty".to_string(),
            ));
        }

        if self.category.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "Category must not be empty".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if self.connection_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Connection timeout must be greater than 0".to_string(),
            ));
        }

        self.shipper_config().validate()
    }
}
