//! Proxy server module

// Relay pipeline
pub mod core;
pub mod headers;
pub mod relay;
pub mod streaming;

// Upstream transports
pub mod http_client;
pub mod reqwest_impl;

pub mod server;

// Re-exports
pub use self::core::{RelayError, RelayRequest, RelayResponse, Transport, TransportError, TransportFactory};
pub use headers::{append_client_address, copy, sanitize, HOP_HEADERS};
pub use http_client::HyperTransport;
pub use relay::relay;
pub use reqwest_impl::ReqwestTransport;
pub use server::ProxyServer;
