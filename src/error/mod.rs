//! Error handling module for the proxy server

use thiserror::Error;

use crate::proxy::core::RelayError;

/// Custom error type for the proxy server
#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),

    #[error("Transport setup error: {0}")]
    TransportSetup(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Result type for the proxy server
pub type Result<T> = std::result::Result<T, Error>;

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Unknown(err.to_string())
    }
}
