//! Hyper-based upstream transport
//!
//! This module provides the default [`Transport`]: a shared hyper client with
//! connection pooling that reaches both `http://` and `https://` upstreams:
//! - Connection reuse and persistent connections
//! - Request timeout until the upstream response headers arrive

use async_trait::async_trait;
use hyper::client::HttpConnector;
use hyper::{Body, Client, Request, Response};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::settings::ProxyConfig;
use crate::proxy::core::{Transport, TransportError};

/// Configuration for the pooled upstream client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Maximum idle connections per host (default: 50)
    pub max_idle_per_host: usize,
    /// How long to keep idle connections alive (default: 90 seconds)
    pub idle_timeout: Duration,
    /// Timeout for establishing new connections (default: 10 seconds)
    pub connect_timeout: Duration,
    /// Timeout until upstream response headers arrive (default: 30 seconds)
    pub request_timeout: Duration,
    /// Enable TCP keepalive (default: true)
    pub tcp_keepalive: bool,
    /// TCP keepalive interval (default: 30 seconds)
    pub tcp_keepalive_interval: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: 50,
            idle_timeout: Duration::from_secs(90),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            tcp_keepalive: true,
            tcp_keepalive_interval: Some(Duration::from_secs(30)),
        }
    }
}

impl ClientConfig {
    /// Create client config from the proxy configuration
    pub fn from_config(config: &ProxyConfig) -> Self {
        let http_client = &config.http_client;
        Self {
            max_idle_per_host: http_client.max_idle_per_host as usize,
            idle_timeout: Duration::from_secs(http_client.idle_timeout_secs),
            connect_timeout: Duration::from_secs(http_client.connect_timeout_secs),
            request_timeout: Duration::from_secs(config.request_timeout),
            tcp_keepalive: http_client.tcp_keepalive,
            tcp_keepalive_interval: Some(Duration::from_secs(http_client.tcp_keepalive_interval_secs)),
        }
    }
}

/// Pooled hyper client used as the default upstream transport
pub struct HyperTransport {
    client: Client<HttpsConnector<HttpConnector>, Body>,
    config: ClientConfig,
}

impl HyperTransport {
    /// Create a transport with default configuration
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Create a transport with custom configuration
    pub fn with_config(config: ClientConfig) -> Self {
        info!("🚀 Initializing hyper transport with connection pooling");
        info!("   Max idle connections per host: {}", config.max_idle_per_host);
        info!("   Idle timeout: {:?}", config.idle_timeout);
        info!("   Connect timeout: {:?}", config.connect_timeout);
        info!("   Request timeout: {:?}", config.request_timeout);
        info!("   TCP keepalive enabled: {}", config.tcp_keepalive);

        let mut http_connector = HttpConnector::new();
        // Absolute https:// URIs are handled by the TLS layer wrapping this connector
        http_connector.enforce_http(false);
        http_connector.set_connect_timeout(Some(config.connect_timeout));
        http_connector.set_nodelay(true);
        if config.tcp_keepalive {
            http_connector.set_keepalive(config.tcp_keepalive_interval);
        }

        let https_connector = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .wrap_connector(http_connector);

        let client = Client::builder()
            .pool_idle_timeout(config.idle_timeout)
            .pool_max_idle_per_host(config.max_idle_per_host)
            .build(https_connector);

        Self { client, config }
    }

    /// Create a transport from the proxy configuration
    pub fn from_config(config: &ProxyConfig) -> Self {
        Self::with_config(ClientConfig::from_config(config))
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn execute(&self, request: Request<Body>) -> Result<Response<Body>, TransportError> {
        debug!("📡 hyper → {} {}", request.method(), request.uri());

        match tokio::time::timeout(self.config.request_timeout, self.client.request(request)).await {
            Ok(result) => result.map_err(TransportError::from),
            Err(_) => Err(TransportError::Timeout(format!(
                "no response headers within {:?}",
                self.config.request_timeout
            ))),
        }
    }

    fn name(&self) -> &'static str {
        "hyper"
    }
}
