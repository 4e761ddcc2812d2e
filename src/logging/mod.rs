use crate::models::RelayLog;
use anyhow::Result;
use log::{debug, error, info, trace, warn, LevelFilter};
use std::sync::Once;
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

static INIT: Once = Once::new();

/// Initialize the global logger with environment variable support
/// Uses RUST_LOG environment variable for configuration, "info" otherwise
pub fn init_logger() {
    let level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    init_logger_with_config(&level);
}

/// Initialize logger with a filter directive such as "info" or "relay_forward_proxy=debug"
/// This should be called once at the start of the application
pub fn init_logger_with_config(log_level: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_new(log_level).unwrap_or_else(|e| {
            eprintln!("Warning: invalid log level '{}' ({}), using 'info'", log_level, e);
            EnvFilter::new("info")
        });

        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(true)
            .with_level(true)
            .with_ansi(true)
            .finish();
        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("Warning: Failed to install tracing subscriber: {}", e);
            return;
        }

        // Bridge log events to tracing (after subscriber is set up)
        if let Err(e) = LogTracer::init() {
            eprintln!("Warning: Failed to initialize LogTracer: {:?}", e);
        }

        log::set_max_level(level_filter(log_level));
    });
}

/// Most verbose `log` level mentioned in a filter directive
fn level_filter(log_level: &str) -> LevelFilter {
    log_level
        .split(',')
        .filter_map(|directive| directive.rsplit('=').next())
        .filter_map(|level| level.trim().parse::<LevelFilter>().ok())
        .max()
        .unwrap_or(LevelFilter::Info)
}

/// Log a relay transaction using log (bridged to tracing via tracing-log)
pub fn log_transaction(log_entry: &RelayLog) -> Result<()> {
    let log_message = serde_json::to_string(log_entry)?;

    // Log using debug level so it only appears in debug mode
    debug!("TRANSACTION: {}", log_message);

    Ok(())
}

/// Log an error message
pub fn log_error(message: &str) {
    error!("{}", message);
}

/// Log an info message
pub fn log_info(message: &str) {
    info!("{}", message);
}

/// Log a warning message
pub fn log_warning(message: &str) {
    warn!("{}", message);
}

/// Log a debug message
pub fn log_debug(message: &str) {
    debug!("{}", message);
}

/// Log a trace message
pub fn log_trace(message: &str) {
    trace!("{}", message);
}

/// Convenience macro for logging relay transactions
#[macro_export]
macro_rules! log_relay_transaction {
    ($log_entry:expr) => {
        if let Err(e) = $crate::logging::log_transaction($log_entry) {
            eprintln!("Failed to log transaction: {}", e);
        }
    };
}

/// Convenience macro for logging errors
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::logging::log_error(&format!($($arg)*));
    };
}

/// Convenience macro for logging info messages
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logging::log_info(&format!($($arg)*));
    };
}

/// Convenience macro for logging warning messages
#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)*) => {
        $crate::logging::log_warning(&format!($($arg)*));
    };
}

/// Convenience macro for logging debug messages
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::logging::log_debug(&format!($($arg)*));
    };
}

/// Convenience macro for logging trace messages
#[macro_export]
macro_rules! log_trace {
    ($($arg:tt)*) => {
        $crate::logging::log_trace(&format!($($arg)*));
    };
}
