//! Server management CLI commands

use crate::config::settings::{ProxyConfig, TransportKind, DEFAULT_CONFIG_PATH};
use crate::proxy::server::ProxyServer;
use anyhow::{Context, Result};
use clap::Args;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, Args)]
pub struct ServerArgs {
    /// YAML configuration file (defaults are used when it does not exist)
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// HTTP proxy listening address
    #[arg(long)]
    pub listen_addr: Option<String>,

    /// Upstream request timeout in seconds
    #[arg(long)]
    pub request_timeout: Option<u64>,

    /// Upstream transport implementation
    #[arg(long, value_enum)]
    pub transport: Option<TransportKind>,

    /// Log level
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Default for ServerArgs {
    fn default() -> Self {
        Self {
            config: PathBuf::from(DEFAULT_CONFIG_PATH),
            listen_addr: None,
            request_timeout: None,
            transport: None,
            log_level: None,
        }
    }
}

impl ServerArgs {
    /// Load the configuration file and layer CLI arguments on top
    pub fn to_config(&self) -> Result<ProxyConfig> {
        self.to_config_with(|key| std::env::var(key).ok())
    }

    /// Same as [`to_config`](Self::to_config) with overrides taken from `lookup`
    pub fn to_config_with<F>(&self, lookup: F) -> Result<ProxyConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ProxyConfig::load_config_with(&self.config, lookup)?;
        self.apply_to(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// Override configuration values with the arguments that were given
    pub fn apply_to(&self, config: &mut ProxyConfig) -> Result<()> {
        debug!("Applying CLI arguments to ProxyConfig");

        if let Some(listen_addr) = &self.listen_addr {
            config.listen_addr = listen_addr
                .parse::<SocketAddr>()
                .with_context(|| format!("Invalid listen address '{}'", listen_addr))?;
        }
        if let Some(timeout) = self.request_timeout {
            config.request_timeout = timeout;
        }
        if let Some(transport) = self.transport {
            config.transport = transport;
        }
        if let Some(log_level) = &self.log_level {
            config.log_level = log_level.clone();
        }

        Ok(())
    }

    /// Start the proxy server with an already resolved configuration
    pub async fn start_server(config: ProxyConfig) -> Result<()> {
        info!("📋 Server Configuration:");
        info!("   HTTP proxy: {}", config.listen_addr);
        info!("   Transport: {:?}", config.transport);
        info!("   Request timeout: {}s", config.request_timeout);
        info!("   Log level: {}", config.log_level);

        let server = ProxyServer::with_config(&config)?;
        server.start().await?;
        Ok(())
    }
}
