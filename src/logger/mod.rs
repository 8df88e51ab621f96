//! Logger module
//!
//! Installs the `tracing` subscriber and provides named logging helpers for:
//! - Server lifecycle logging
//! - Request handling and access logging
//! - Error and warning logging

use std::fmt::Display;
use std::net::SocketAddr;
use std::time::Duration;

use hyper::{Method, StatusCode};
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, LogFormat, LoggingConfig};
use crate::registry::Registries;

/// Initialize the global subscriber from configuration
///
/// Should be called once at application startup. `RUST_LOG`, when set,
/// takes precedence over the configured level.
pub fn init(config: &LoggingConfig) -> Result<(), ConfigError> {
    let filter = env_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    let installed = match config.format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| ConfigError::Logger(e.to_string()))
}

/// `RUST_LOG` if set and valid, else the configured level
fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, ConfigError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| ConfigError::InvalidLogLevel {
            level: config.level.clone(),
            reason: e.to_string(),
        }),
    }
}

pub fn log_server_start(addr: &SocketAddr, registries: &Registries) {
    tracing::info!(
        listen_addr = %addr,
        chain_registry_directory = %registries.chains(),
        validator_registry_directory = %registries.validators(),
        "planetarium service started and listening"
    );
}

pub fn log_endpoint(endpoint: &str, description: &str) {
    tracing::debug!(endpoint, "hosting {description}");
}

pub fn log_handling(method: &str) {
    tracing::info!(method, "handling request");
}

pub fn log_handled(method: &str) {
    tracing::info!(method, "successfully handled request");
}

pub fn log_handler_error(method: &str, err: &dyn Display, context: &str) {
    tracing::error!(method, error = %err, "{context} while handling request");
}

pub fn log_access(method: &Method, path: &str, status: StatusCode, bytes: u64, elapsed: Duration) {
    tracing::info!(
        target: "access",
        %method,
        path,
        status = status.as_u16(),
        bytes,
        elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
        "request served"
    );
}

pub fn log_accept_error(err: &std::io::Error) {
    tracing::error!(error = %err, "failed to accept connection");
}

pub fn log_connection_error(peer_addr: &SocketAddr, err: &hyper::Error) {
    if err.is_incomplete_message() || err.is_timeout() {
        tracing::debug!(peer = %peer_addr, error = %err, "connection closed early");
    } else {
        tracing::warn!(peer = %peer_addr, error = %err, "failed to serve connection");
    }
}

pub fn log_signal_received(signal: &str) {
    tracing::info!(signal, "received shutdown signal");
}

pub fn log_shutdown_requested(in_flight_grace: Duration) {
    tracing::info!(
        grace_secs = in_flight_grace.as_secs(),
        "shutdown requested, no longer accepting connections"
    );
}

pub fn log_shutdown_complete(drained: bool) {
    if drained {
        tracing::info!("planetarium server terminated");
    } else {
        tracing::warn!("planetarium server terminated with connections still open");
    }
}

pub fn log_error(message: &str) {
    tracing::error!("{message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("{message}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::PoisonError;
    use tracing_subscriber::filter::LevelFilter;

    use crate::config::ENV_LOCK;

    fn logging(level: &str) -> LoggingConfig {
        LoggingConfig {
            level: level.to_string(),
            format: LogFormat::Pretty,
            access_log: true,
        }
    }

    #[test]
    fn test_rust_log_overrides_configured_level() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        std::env::set_var("RUST_LOG", "debug");
        let filter = env_filter(&logging("warn"));
        std::env::remove_var("RUST_LOG");

        assert_eq!(filter.unwrap().max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn test_configured_level_without_rust_log() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        std::env::remove_var("RUST_LOG");

        let filter = env_filter(&logging("warn")).unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn test_invalid_configured_level() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        std::env::remove_var("RUST_LOG");

        let err = env_filter(&logging("planetarium=loud")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLogLevel { .. }));
    }
}
