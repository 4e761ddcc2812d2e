//! Proxy server configuration settings

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config.yml";

/// Main configuration for the proxy server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Server listening address
    pub listen_addr: SocketAddr,

    /// Log level configuration
    pub log_level: String,

    /// Upstream request timeout in seconds (time until response headers)
    pub request_timeout: u64,

    /// Which transport relays requests upstream
    pub transport: TransportKind,

    /// HTTP client configuration
    pub http_client: HttpClientConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Available upstream transports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// hyper client with rustls (default)
    Hyper,
    /// reqwest client
    Reqwest,
}

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    /// Maximum idle connections per host
    pub max_idle_per_host: u32,

    /// Idle timeout in seconds
    pub idle_timeout_secs: u64,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,

    /// Enable TCP keepalive
    pub tcp_keepalive: bool,

    /// TCP keepalive interval in seconds
    pub tcp_keepalive_interval_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Emit one structured transaction record per relay at debug level
    pub log_transactions: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            log_level: "info".to_string(),
            request_timeout: 30,
            transport: TransportKind::Hyper,
            http_client: HttpClientConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: 50,
            idle_timeout_secs: 90,
            connect_timeout_secs: 10,
            tcp_keepalive: true,
            tcp_keepalive_interval_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_transactions: true,
        }
    }
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hyper" => Ok(TransportKind::Hyper),
            "reqwest" => Ok(TransportKind::Reqwest),
            other => Err(format!("Unknown transport: {}", other)),
        }
    }
}

impl ProxyConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))
    }

    /// Load configuration from YAML file (when present) with environment variable overrides
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_config_with(path, |key| std::env::var(key).ok())
    }

    /// Load configuration from YAML file (when present), taking overrides from `lookup`
    pub fn load_config_with<P, F>(path: P, lookup: F) -> Result<Self>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let mut config = if path.as_ref().exists() {
            Self::from_yaml_file(path.as_ref())?
        } else {
            Self::default()
        };

        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("PROXY_LISTEN_ADDR") {
            self.listen_addr = addr
                .parse()
                .with_context(|| format!("Invalid PROXY_LISTEN_ADDR '{}'", addr))?;
        }

        if let Some(log_level) = lookup("RUST_LOG") {
            self.log_level = log_level;
        }

        if let Some(timeout) = lookup("PROXY_REQUEST_TIMEOUT") {
            self.request_timeout = timeout
                .parse()
                .with_context(|| format!("Invalid PROXY_REQUEST_TIMEOUT '{}'", timeout))?;
        }

        if let Some(transport) = lookup("PROXY_TRANSPORT") {
            self.transport = transport.parse().map_err(anyhow::Error::msg)?;
        }

        if let Some(max_idle) = lookup("PROXY_MAX_IDLE_PER_HOST") {
            self.http_client.max_idle_per_host = max_idle
                .parse()
                .with_context(|| format!("Invalid PROXY_MAX_IDLE_PER_HOST '{}'", max_idle))?;
        }

        if let Some(timeout) = lookup("PROXY_IDLE_TIMEOUT_SECS") {
            self.http_client.idle_timeout_secs = timeout
                .parse()
                .with_context(|| format!("Invalid PROXY_IDLE_TIMEOUT_SECS '{}'", timeout))?;
        }

        if let Some(timeout) = lookup("PROXY_CONNECT_TIMEOUT_SECS") {
            self.http_client.connect_timeout_secs = timeout
                .parse()
                .with_context(|| format!("Invalid PROXY_CONNECT_TIMEOUT_SECS '{}'", timeout))?;
        }

        Ok(())
    }

    /// Reject settings the transports cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout == 0 {
            anyhow::bail!("request_timeout must be greater than zero");
        }
        if self.http_client.connect_timeout_secs == 0 {
            anyhow::bail!("http_client.connect_timeout_secs must be greater than zero");
        }
        Ok(())
    }
}
