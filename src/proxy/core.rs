//! Core relay abstractions
//!
//! This module defines the request/response pair that flows through a relay,
//! the [`Transport`] capability used to reach the destination, and the error
//! taxonomy shared by every transport implementation.

use async_trait::async_trait;
use hyper::header::HeaderMap;
use hyper::{Body, Method, Request, Response, StatusCode, Uri};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWrite;

use crate::config::settings::{ProxyConfig, TransportKind};
use crate::error::Error;
use crate::proxy::http_client::HyperTransport;
use crate::proxy::reqwest_impl::ReqwestTransport;
use crate::proxy::streaming;

/// An inbound request as received from the caller
#[derive(Debug)]
pub struct RelayRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Body,
    /// Caller address in `host[:port]` form
    pub client_addr: String,
}

impl RelayRequest {
    /// Create a request with no headers and an empty body
    pub fn new(method: Method, uri: Uri, client_addr: impl Into<String>) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: Body::empty(),
            client_addr: client_addr.into(),
        }
    }

    /// Build a relay request from a request accepted by the hyper server
    pub fn from_hyper(request: Request<Body>, remote_addr: SocketAddr) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            client_addr: remote_addr.to_string(),
        }
    }
}

/// The caller-facing response produced by a successful relay
#[derive(Debug)]
pub struct RelayResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Body,
}

impl RelayResponse {
    /// Convert into a hyper response; the body keeps streaming.
    pub fn into_hyper(self) -> Response<Body> {
        let mut response = Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }

    /// Stream the body into `writer`, returning the number of bytes written.
    ///
    /// Status and headers are considered committed once this is called, so a
    /// failure part way through surfaces as [`RelayError::StreamingFailure`].
    pub async fn copy_body_to<W>(self, writer: &mut W) -> Result<u64, RelayError>
    where
        W: AsyncWrite + Unpin,
    {
        streaming::copy_body(self.body, writer).await
    }
}

/// Failure reported by a [`Transport`]
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("upstream timed out: {0}")]
    Timeout(String),

    #[error("upstream protocol error: {0}")]
    Protocol(String),

    #[error("transport error: {0}")]
    Other(String),
}

impl TransportError {
    /// Short classification used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::Connect(_) => "connect",
            TransportError::Timeout(_) => "timeout",
            TransportError::Protocol(_) => "protocol",
            TransportError::Other(_) => "other",
        }
    }

}

impl From<hyper::Error> for TransportError {
    fn from(err: hyper::Error) -> Self {
        if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_parse() || err.is_incomplete_message() || err.is_closed() {
            TransportError::Protocol(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

/// Errors returned by [`relay`](crate::proxy::relay::relay)
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The transport produced no response; nothing was written to the caller.
    #[error("transport failure: {0}")]
    TransportFailure(#[from] TransportError),

    /// The body copy failed after status and headers were committed.
    #[error("streaming failure: {0}")]
    StreamingFailure(String),

    /// The inbound request cannot be relayed as given.
    #[error("malformed input: {0}")]
    MalformedInput(String),
}

impl RelayError {
    /// Status code the server loop answers with when no response was sent yet
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::TransportFailure(TransportError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            RelayError::TransportFailure(_) => StatusCode::BAD_GATEWAY,
            // Never written to the caller: a body copy only fails after the
            // response head has been committed.
            RelayError::StreamingFailure(_) => StatusCode::BAD_GATEWAY,
            RelayError::MalformedInput(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// Capability that executes one prepared request against its destination.
///
/// Implementations own connection pooling, DNS, TLS and timeouts. The relay
/// calls `execute` exactly once per inbound request and never retries.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: Request<Body>) -> Result<Response<Body>, TransportError>;

    /// Get the implementation name
    fn name(&self) -> &'static str;
}

/// Factory for creating upstream transports
pub struct TransportFactory;

impl TransportFactory {
    /// Create the transport selected in the configuration
    pub fn from_config(config: &ProxyConfig) -> crate::Result<Arc<dyn Transport>> {
        match config.transport {
            TransportKind::Hyper => Ok(Arc::new(HyperTransport::from_config(config))),
            TransportKind::Reqwest => {
                let transport = ReqwestTransport::from_config(config)
                    .map_err(|e| Error::TransportSetup(format!("Failed to create reqwest client: {}", e)))?;
                Ok(Arc::new(transport))
            }
        }
    }
}
