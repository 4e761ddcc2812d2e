//! Relay Forward Proxy - a single-hop HTTP forward proxy
//!
//! Each inbound request is relayed to the upstream named by its absolute URL.
//! Hop-by-hop headers are stripped in both directions and the caller's address
//! is appended to `X-Forwarded-For`. The upstream leg goes through a pluggable
//! [`Transport`](proxy::core::Transport), backed by hyper or reqwest.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod proxy;
pub mod utils;

// Re-export commonly used items
pub use config::settings::ProxyConfig;
pub use error::{Error, Result};
pub use logging::{init_logger, init_logger_with_config, log_transaction};
pub use models::RelayLog;
pub use proxy::core::{RelayError, RelayRequest, RelayResponse, Transport, TransportError, TransportFactory};
pub use proxy::relay::relay;
pub use proxy::server::ProxyServer;
