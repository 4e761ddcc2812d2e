//! Configuration loading for the proxy server

pub mod settings;

pub use settings::{HttpClientConfig, LoggingConfig, ProxyConfig, TransportKind, DEFAULT_CONFIG_PATH};
