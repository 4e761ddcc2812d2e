use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// One relayed request and its outcome, written to the transaction log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayLog {
    pub timestamp: DateTime<Utc>,

    // Inbound request
    pub method: String,
    pub url: String,
    pub client_addr: String,

    // Outcome
    pub status_code: Option<u16>,
    pub duration_ms: u64,
    pub transport: String,
    pub error: Option<String>,
}

impl RelayLog {
    pub fn new(method: String, url: String, client_addr: String, transport: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            method,
            url,
            client_addr,
            status_code: None,
            duration_ms: 0,
            transport: transport.to_string(),
            error: None,
        }
    }

    pub fn succeeded(mut self, status_code: u16, duration_ms: u64) -> Self {
        self.status_code = Some(status_code);
        self.duration_ms = duration_ms;
        self
    }

    // `status_code` is what the caller received from the proxy itself
    pub fn failed(mut self, status_code: u16, error: String, duration_ms: u64) -> Self {
        self.status_code = Some(status_code);
        self.error = Some(error);
        self.duration_ms = duration_ms;
        self
    }
}
