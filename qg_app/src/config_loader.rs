use std::path::Path;
use std::time::Duration;

use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use qg_http::ApiCredentials;
use qg_http::HttpClientConfig;
use qg_pacer::PacerSettings;
use serde::Deserialize;

/// Prefix for environment overrides, e.g. `QG__PACER__MIN_INTERVAL_SECS=20`
pub const ENV_PREFIX: &str = "QG";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub max_rejection_retries: u32,
    pub user_agent: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self { connect_timeout_secs: 10, request_timeout_secs: 30, max_rejection_retries: 3, user_agent: None }
    }
}

impl HttpSettings {
    pub fn client_config(&self) -> HttpClientConfig {
        let mut config = HttpClientConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..Default::default()
        };
        if let Some(user_agent) = &self.user_agent {
            config.user_agent = user_agent.clone();
        }
        config
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Value for the `x-rapidapi-host` header
    pub host: Option<String>,
    /// Environment variable holding the API key
    pub key_env: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self { host: None, key_env: "RAPIDAPI_KEY".to_string() }
    }
}

impl ApiSettings {
    /// Credentials from the configured environment variable, if it is set
    pub fn credentials(&self) -> Option<ApiCredentials> {
        let key = std::env::var(&self.key_env).ok().filter(|key| !key.is_empty())?;
        let credentials = ApiCredentials::new(key);
        Some(match &self.host {
            Some(host) => credentials.with_host(host.clone()),
            None => credentials,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Default level when `RUST_LOG` is unset
    pub level: String,
    /// Directory for hourly log files; stderr only when unset
    pub dir: Option<String>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self { level: "info".to_string(), dir: None }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pacer: PacerSettings,
    pub http: HttpSettings,
    pub api: ApiSettings,
    pub log: LogSettings,
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX).prefix_separator("__").separator("__")
}

/// Load the app config from a file, with environment overrides on top
pub fn load_app_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, ConfigError> {
    let config = Config::builder().add_source(File::from(path.as_ref())).add_source(env_source()).build()?;

    config.try_deserialize()
}

/// Load app config with fallback to defaults plus environment overrides
pub fn load_app_config_or_default(path: &str) -> AppConfig {
    match load_app_config(path) {
        Ok(config) => {
            tracing::info!("Loaded config from {path}");
            config
        }
        Err(err) => {
            tracing::warn!("Failed to load config from {}: {}. Using defaults.", path, err);
            Config::builder().add_source(env_source()).build().and_then(|c| c.try_deserialize()).unwrap_or_default()
        }
    }
}
