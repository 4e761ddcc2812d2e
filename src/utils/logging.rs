//! Logging utility functions for relay operations

use crate::log_debug;
use crate::log_relay_transaction;
use crate::models::RelayLog;
use crate::proxy::core::RelayError;
use std::net::SocketAddr;
use tracing::{info, warn};

/// Log incoming request information
pub fn log_incoming_request(method: &str, uri: &str, remote_addr: &SocketAddr) {
    info!("📥 {} {} {}", remote_addr, method, uri);
}

/// Log a relay that produced a response
pub fn log_relay_success(entry: &RelayLog, log_transactions: bool) {
    info!(
        "✅ {} {} → {} ({}ms)",
        entry.method,
        entry.url.chars().take(80).collect::<String>(),
        entry.status_code.unwrap_or_default(),
        entry.duration_ms
    );
    if log_transactions {
        log_relay_transaction!(entry);
    }
}

/// Log a relay that failed before any response reached the caller
pub fn log_relay_failure(entry: &RelayLog, error: &RelayError, log_transactions: bool) {
    match error {
        RelayError::MalformedInput(_) => {
            info!("🚫 {} {} rejected: {}", entry.method, entry.url, error);
        }
        _ => {
            warn!(
                "❌ {} {} failed after {}ms [{}]: {}",
                entry.method,
                entry.url,
                entry.duration_ms,
                failure_class(error),
                error
            );
        }
    }
    log_debug!("❌ RELAY FAILURE:\n  Client: {}\n  Transport: {}\n  Error: {:?}",
               entry.client_addr, entry.transport, error);
    if log_transactions {
        log_relay_transaction!(entry);
    }
}

/// Short classification of a relay failure for log lines
pub fn failure_class(error: &RelayError) -> &'static str {
    match error {
        RelayError::TransportFailure(transport) => transport.kind(),
        RelayError::StreamingFailure(_) => "streaming",
        RelayError::MalformedInput(_) => "malformed",
    }
}
