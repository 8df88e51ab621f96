// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub registry: RegistryConfig,
    pub logging: LoggingConfig,
}

/// Listener and connection settings
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    /// Upper bound on reading a request's headers; nothing else is timed out
    pub read_header_timeout_secs: u64,
    /// How long shutdown waits for in-flight connections
    pub shutdown_grace_secs: u64,
}

/// Registry directories served under `/v1/chains` and `/v1/validators`
///
/// Both are required; they are optional here only so that a missing value
/// surfaces as a [`ConfigError`](super::ConfigError) naming the flag instead
/// of a deserializer message.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RegistryConfig {
    #[serde(default)]
    pub chain_registry_directory: Option<PathBuf>,
    #[serde(default)]
    pub validator_registry_directory: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
    pub access_log: bool,
}

/// Log line rendering
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Values supplied on the command line; each one, when present, wins over
/// every other configuration source
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub chain_registry_directory: Option<PathBuf>,
    pub validator_registry_directory: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
}
