//! Reqwest-based upstream transport

use async_trait::async_trait;
use hyper::{Body, Request, Response};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::settings::ProxyConfig;
use crate::proxy::core::{Transport, TransportError};

/// Upstream transport backed by a reqwest client.
///
/// Redirects are handed back to the caller instead of being followed, and
/// both bodies stream without buffering.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport from the proxy configuration
    pub fn from_config(config: &ProxyConfig) -> Result<Self, reqwest::Error> {
        let http_client = &config.http_client;

        info!("🚀 Initializing reqwest transport");
        info!("   Request timeout: {}s", config.request_timeout);
        info!("   Connect timeout: {}s", http_client.connect_timeout_secs);
        info!("   Max idle connections per host: {}", http_client.max_idle_per_host);

        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(http_client.connect_timeout_secs))
            .pool_idle_timeout(Duration::from_secs(http_client.idle_timeout_secs))
            .pool_max_idle_per_host(http_client.max_idle_per_host as usize)
            .timeout(Duration::from_secs(config.request_timeout));

        if http_client.tcp_keepalive {
            builder = builder.tcp_keepalive(Duration::from_secs(http_client.tcp_keepalive_interval_secs));
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: Request<Body>) -> Result<Response<Body>, TransportError> {
        let (parts, body) = request.into_parts();
        debug!("📡 reqwest → {} {}", parts.method, parts.uri);

        let upstream = self
            .client
            .request(parts.method, parts.uri.to_string())
            .headers(parts.headers)
            .body(reqwest::Body::wrap_stream(body))
            .send()
            .await
            .map_err(TransportError::from)?;

        let status = upstream.status();
        let headers = upstream.headers().clone();
        let body = Body::wrap_stream(upstream.bytes_stream());

        let mut response = Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }

    fn name(&self) -> &'static str {
        "reqwest"
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_request() || err.is_body() || err.is_decode() {
            TransportError::Protocol(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}
