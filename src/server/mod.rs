// Server module entry
// Owns what request handling needs and runs the accept loop

pub mod connection;
pub mod listener;
pub mod signal;

// `loop` is a keyword and cannot name a module, so use server_loop
#[path = "loop.rs"]
pub mod server_loop;

use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{Config, ConfigError, ServerConfig};
use crate::git::{CommitSource, GitCli};
use crate::handler::Router;
use crate::logger;
use crate::registry::Registries;
use crate::API_VERSION;

pub use listener::create_listener;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Connection level settings of the accept loop
#[derive(Debug, Clone, Copy)]
pub struct ServeOptions {
    pub read_header_timeout: Duration,
    pub shutdown_grace: Duration,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            read_header_timeout: Duration::from_secs(3),
            shutdown_grace: Duration::from_secs(10),
        }
    }
}

impl From<&ServerConfig> for ServeOptions {
    fn from(cfg: &ServerConfig) -> Self {
        Self {
            read_header_timeout: cfg.read_header_timeout(),
            shutdown_grace: cfg.shutdown_grace(),
        }
    }
}

/// The registry server: both registries, the route table and the commit
/// source behind the health endpoint.
///
/// Shared read-only by every connection; nothing in it changes after
/// construction.
pub struct Server {
    registries: Registries,
    router: Router,
    commits: Arc<dyn CommitSource>,
    access_log: bool,
}

impl Server {
    pub fn new(
        chain_registry: impl AsRef<Path>,
        validator_registry: impl AsRef<Path>,
        commits: Arc<dyn CommitSource>,
    ) -> Self {
        Self {
            registries: Registries::new(chain_registry, validator_registry),
            router: Router::new(API_VERSION),
            commits,
            access_log: true,
        }
    }

    /// Server over the configured directories, reading commits with `git`
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let (chains, validators) = config.registry.directories()?;
        Ok(Self::new(chains, validators, Arc::new(GitCli::default()))
            .with_access_log(config.logging.access_log))
    }

    #[must_use]
    pub const fn with_access_log(mut self, enabled: bool) -> Self {
        self.access_log = enabled;
        self
    }

    pub const fn registries(&self) -> &Registries {
        &self.registries
    }

    pub const fn router(&self) -> &Router {
        &self.router
    }

    pub fn commits(&self) -> &dyn CommitSource {
        self.commits.as_ref()
    }

    pub const fn access_log(&self) -> bool {
        self.access_log
    }

    /// Bind the configured address and serve until SIGINT or SIGTERM
    pub async fn start(self: Arc<Self>, cfg: &ServerConfig) -> Result<(), ServerError> {
        let addr = cfg.socket_addr()?;
        let listener = create_listener(addr).map_err(|source| ServerError::Bind { addr, source })?;
        logger::log_server_start(&addr, &self.registries);

        self.serve_with_shutdown(listener, ServeOptions::from(cfg), signal::shutdown_signal())
            .await;
        Ok(())
    }

    /// Serve connections from `listener` until `shutdown` resolves
    pub async fn serve_with_shutdown<F>(
        self: Arc<Self>,
        listener: TcpListener,
        options: ServeOptions,
        shutdown: F,
    ) where
        F: Future<Output = ()>,
    {
        server_loop::run(self, listener, options, shutdown).await;
    }
}
