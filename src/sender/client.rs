use super::publisher::PublishError;
use reqwest::{Client, ClientBuilder, Response};
use std::time::Duration;
use url::Url;

/// Settings for talking to a RabbitMQ management API.
#[derive(Debug, Clone)]
pub struct ManagementConfig {
    pub broker_url: String,
    pub vhost: String,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
    pub connection_timeout: Duration,
    pub user_agent: String,
    pub enable_compression: bool,
}

impl Default for ManagementConfig {
    fn default() -> Self {
        Self {
            broker_url: "http://localhost:15672".to_string(),
            vhost: "/".to_string(),
            username: "guest".to_string(),
            password: "guest".to_string(),
            timeout: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(10),
            user_agent: format!("rask-log-shipper/{}", env!("CARGO_PKG_VERSION")),
            enable_compression: true,
        }
    }
}

/// Thin reqwest wrapper that knows the management API's URL layout.
#[derive(Debug, Clone)]
pub struct ManagementClient {
    client: Client,
    config: ManagementConfig,
    base_url: Url,
}

impl ManagementClient {
    pub fn new(config: ManagementConfig) -> Result<Self, PublishError> {
        let base_url: Url = config.broker_url.parse().map_err(|e| {
            PublishError::InvalidConfiguration(format!(
                "Invalid broker URL '{}': {}",
                config.broker_url, e
            ))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(PublishError::InvalidConfiguration(format!(
                "Broker URL '{}' cannot carry a path",
                config.broker_url
            )));
        }

        let mut client_builder = ClientBuilder::new()
            .timeout(config.timeout)
            .connect_timeout(config.connection_timeout)
            .user_agent(&config.user_agent);

        if config.enable_compression {
            client_builder = client_builder.gzip(true);
        }

        let client = client_builder.build().map_err(|e| {
            PublishError::InvalidConfiguration(format!("Failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    pub fn config(&self) -> &ManagementConfig {
        &self.config
    }

    /// `{broker}/api/{segments..}` with every segment percent-encoded, so the
    /// default vhost `/` becomes `%2F`.
    pub fn api_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").extend(segments);
        }
        url
    }

    pub fn vhost_url(&self) -> Url {
        self.api_url(&["vhosts", &self.config.vhost])
    }

    pub fn exchange_url(&self, exchange: &str) -> Url {
        self.api_url(&["exchanges", &self.config.vhost, exchange])
    }

    pub fn publish_url(&self, exchange: &str) -> Url {
        self.api_url(&["exchanges", &self.config.vhost, exchange, "publish"])
    }

    pub fn get(&self, url: Url) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .basic_auth(&self.config.username, Some(&self.config.password))
    }

    pub fn put(&self, url: Url) -> reqwest::RequestBuilder {
        self.client
            .put(url)
            .basic_auth(&self.config.username, Some(&self.config.password))
    }

    pub fn post(&self, url: Url) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .basic_auth(&self.config.username, Some(&self.config.password))
    }
}

/// Maps a non-success response to [`PublishError::HttpError`].
pub async fn ensure_success(response: Response) -> Result<Response, PublishError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .text()
        .await
        .unwrap_or_else(|_| status.to_string());
    Err(PublishError::HttpError {
        status: status.as_u16(),
        message,
    })
}
