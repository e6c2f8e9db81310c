use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Prefix shared by every environment variable the service reads.
pub const ENV_PREFIX: &str = "SENTENCE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading error: {message}")]
    LoadError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Invalid listen address: {source}")]
    InvalidAddress {
        #[from]
        source: std::net::AddrParseError,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_service_version")]
    pub service_version: String,
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default = "default_otlp_endpoint")]
    pub otlp_endpoint: String,
    #[serde(default = "default_tracing_enabled")]
    pub tracing_enabled: bool,
    #[serde(default = "default_enable_json_logging")]
    pub enable_json_logging: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Config {
    /// Load configuration from `SENTENCE_*` environment variables.
    pub fn from_environment() -> Result<Self, ConfigError> {
        Self::from_source(config::Environment::with_prefix(ENV_PREFIX))
    }

    /// Load configuration from an explicit environment source.
    pub fn from_source(source: config::Environment) -> Result<Self, ConfigError> {
        debug!("Loading configuration from environment");

        let config = Config {
            server: load_section(source.clone(), "server")?,
            observability: load_section(source, "observability")?,
        };

        config.validate()?;

        info!("Configuration loaded successfully");
        debug!("Configuration: {:?}", config);

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError {
                message: "Server port cannot be 0".to_string(),
            });
        }

        if self.server.shutdown_timeout_seconds == 0 {
            return Err(ConfigError::ValidationError {
                message: "Shutdown timeout cannot be 0".to_string(),
            });
        }

        if self.observability.service_name.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "Service name cannot be empty".to_string(),
            });
        }

        if self.observability.tracing_enabled && self.observability.otlp_endpoint.trim().is_empty()
        {
            return Err(ConfigError::ValidationError {
                message: "OTLP endpoint cannot be empty when tracing is enabled".to_string(),
            });
        }

        Ok(())
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.host.parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_seconds)
    }
}

fn load_section<T>(source: config::Environment, section: &str) -> Result<T, ConfigError>
where
    T: for<'de> Deserialize<'de>,
{
    let settings = config::Config::builder()
        .add_source(source)
        .build()
        .map_err(|e| ConfigError::LoadError {
            message: format!("Failed to load {} config: {}", section, e),
        })?;

    settings
        .try_deserialize()
        .map_err(|e| ConfigError::LoadError {
            message: format!("Failed to deserialize {} config: {}", section, e),
        })
}

// Default value functions
pub(crate) fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub(crate) fn default_port() -> u16 {
    8080
}

pub(crate) fn default_shutdown_timeout() -> u64 {
    5
}

pub(crate) fn default_service_name() -> String {
    "simple_http_sentence".to_string()
}

pub(crate) fn default_service_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

pub(crate) fn default_environment() -> String {
    "local".to_string()
}

pub(crate) fn default_otlp_endpoint() -> String {
    "http://otel-collector:4317".to_string()
}

pub(crate) fn default_tracing_enabled() -> bool {
    true
}

pub(crate) fn default_enable_json_logging() -> bool {
    false
}

pub(crate) fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests;
