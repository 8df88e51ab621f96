//! Planetarium: HTTP access to a Cosmos chain registry checkout and a
//! validator registry checkout.
//!
//! Both registries are served as static trees under `/v1/chains` and
//! `/v1/validators`, together with two JSON helpers: the list of chain
//! names and a health record built from the checkouts' git metadata.

pub mod config;
pub mod git;
pub mod handler;
pub mod health;
pub mod http;
pub mod logger;
pub mod registry;
pub mod server;

pub use server::Server;

/// Path segment every endpoint is mounted under
pub const API_VERSION: &str = "v1";
