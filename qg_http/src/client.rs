use std::time::Duration;

use reqwest::Client;
use reqwest::ClientBuilder;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;

use crate::errors::HttpError;
use crate::errors::Result;

/// Header carrying the RapidAPI application key
pub const API_KEY_HEADER: &str = "x-rapidapi-key";

/// Header naming the RapidAPI host being called
pub const API_HOST_HEADER: &str = "x-rapidapi-host";

/// Configuration for HTTP client.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Maximum idle connections per host (default: 4)
    pub pool_max_idle_per_host: usize,

    /// Idle timeout for connections (default: 90s)
    pub pool_idle_timeout: Duration,

    /// Connection establishment timeout (default: 10s)
    pub connect_timeout: Duration,

    /// Total request timeout (default: 30s)
    pub request_timeout: Duration,

    /// TCP keepalive interval (default: 60s)
    pub tcp_keepalive: Duration,

    /// Enable TCP_NODELAY (default: true)
    pub tcp_nodelay: bool,

    /// User-Agent sent with every request
    pub user_agent: String,

    /// Enable Hickory DNS for async resolution (default: true)
    pub hickory_dns: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            pool_max_idle_per_host: 4,
            pool_idle_timeout: Duration::from_secs(90),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            tcp_keepalive: Duration::from_secs(60),
            tcp_nodelay: true,
            user_agent: concat!("qg_http/", env!("CARGO_PKG_VERSION")).to_string(),
            hickory_dns: true,
        }
    }
}

impl HttpClientConfig {
    /// Longer timeouts for slow providers.
    pub fn patient() -> Self {
        Self { connect_timeout: Duration::from_secs(30), request_timeout: Duration::from_secs(120), ..Default::default() }
    }
}

/// Credentials sent as default headers on every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    pub key: String,
    pub host: Option<String>,
}

impl ApiCredentials {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into(), host: None }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    fn to_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        let mut key = HeaderValue::from_str(&self.key).map_err(|_| HttpError::InvalidHeader(API_KEY_HEADER.to_string()))?;
        key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key);

        if let Some(host) = &self.host {
            let host = HeaderValue::from_str(host).map_err(|_| HttpError::InvalidHeader(API_HOST_HEADER.to_string()))?;
            headers.insert(API_HOST_HEADER, host);
        }

        Ok(headers)
    }
}

pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration and no credentials
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default(), None)
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig, credentials: Option<&ApiCredentials>) -> Result<Self> {
        let mut builder = ClientBuilder::new()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .tcp_nodelay(config.tcp_nodelay)
            .tcp_keepalive(Some(config.tcp_keepalive))
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            // TLS with rustls
            .use_rustls_tls()
            .min_tls_version(reqwest::tls::Version::TLS_1_2)
            .gzip(true)
            .brotli(true);

        if let Some(credentials) = credentials {
            builder = builder.default_headers(credentials.to_headers()?);
        }

        if config.hickory_dns {
            builder = builder.hickory_dns(true);
        }

        let client = builder.build()?;

        Ok(Self { client, config })
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Get the client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Create a GET request builder
    pub fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.get(url)
    }

    /// Create a POST request builder
    pub fn post(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.post(url)
    }

    /// Send a prepared request without any pacing
    pub async fn execute(&self, request: reqwest::Request) -> Result<reqwest::Response> {
        Ok(self.client.execute(request).await?)
    }
}
