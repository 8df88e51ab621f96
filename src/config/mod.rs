// Configuration module entry point
// Layers defaults, an optional config file, PLANETARIUM_* environment
// variables and command-line flags into one validated Config

mod types;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

pub use types::{CliOverrides, Config, LogFormat, LoggingConfig, RegistryConfig, ServerConfig};

/// Listening port used when nothing else is configured
pub const DEFAULT_PORT: u16 = 5353;

/// Prefix of environment variables read by the loader, e.g. `PLANETARIUM_SERVER__PORT`
pub const ENV_PREFIX: &str = "PLANETARIUM";

/// Errors raised while assembling configuration, before the server exists
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("--{0} is required")]
    MissingDirectory(&'static str),

    #[error("--{flag} must point at an existing directory: {}", path.display())]
    NotADirectory { flag: &'static str, path: PathBuf },

    #[error("invalid listen address '{addr}': {reason}")]
    InvalidAddress { addr: String, reason: String },

    #[error("invalid log level '{level}': {reason}")]
    InvalidLogLevel { level: String, reason: String },

    #[error("failed to install log subscriber: {0}")]
    Logger(String),
}

impl Config {
    /// Load configuration from an optional file, the environment and CLI overrides.
    /// A file that does not exist is ignored, matching a deployment with no config file.
    pub fn load_from(path: Option<&Path>, overrides: &CliOverrides) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("server.read_header_timeout_secs", 3)?
            .set_default("server.shutdown_grace_secs", 10)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .set_default("logging.access_log", true)?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.host", overrides.host.clone())?
            .set_override_option("server.port", overrides.port.map(i64::from))?
            .set_override_option(
                "registry.chain_registry_directory",
                overrides
                    .chain_registry_directory
                    .as_ref()
                    .map(|p| p.display().to_string()),
            )?
            .set_override_option(
                "registry.validator_registry_directory",
                overrides
                    .validator_registry_directory
                    .as_ref()
                    .map(|p| p.display().to_string()),
            )?
            .set_override_option("logging.level", overrides.log_level.clone())?
            .set_override_option("logging.format", overrides.log_format.clone())?
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.registry.directories()?;
        Ok(cfg)
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|e: std::net::AddrParseError| ConfigError::InvalidAddress {
            reason: e.to_string(),
            addr,
        })
    }

    pub const fn read_header_timeout(&self) -> Duration {
        Duration::from_secs(self.read_header_timeout_secs)
    }

    pub const fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl RegistryConfig {
    /// Chain and validator registry directories, in that order
    pub fn directories(&self) -> Result<(&Path, &Path), ConfigError> {
        let chains = require_directory(
            self.chain_registry_directory.as_deref(),
            "chain-registry-directory",
        )?;
        let validators = require_directory(
            self.validator_registry_directory.as_deref(),
            "validator-registry-directory",
        )?;
        Ok((chains, validators))
    }
}

/// Serializes tests that read or write process environment variables
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

fn require_directory<'a>(dir: Option<&'a Path>, flag: &'static str) -> Result<&'a Path, ConfigError> {
    let dir = dir
        .filter(|d| !d.as_os_str().is_empty())
        .ok_or(ConfigError::MissingDirectory(flag))?;
    if !dir.is_dir() {
        return Err(ConfigError::NotADirectory {
            flag,
            path: dir.to_path_buf(),
        });
    }
    Ok(dir)
}
