//! Registry module
//!
//! A registry is an externally maintained (git) directory with one
//! subdirectory per chain or validator. This module owns the normalized
//! root paths and the listing of top-level chain names.

mod lister;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use lister::{is_chain_name, list_chains};

/// Filesystem failures while enumerating a registry
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read registry directory {}: {source}", path.display())]
    ReadRoot { path: PathBuf, source: io::Error },

    #[error("failed to read registry entry {}: {source}", path.display())]
    ReadEntry { path: PathBuf, source: io::Error },
}

/// URL namespace under `/{version}/` that maps onto one registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Chains,
    Validators,
}

impl Namespace {
    pub const ALL: [Self; 2] = [Self::Chains, Self::Validators];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chains => "chains",
            Self::Validators => "validators",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root directory of a registry with trailing separators removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryRoot(PathBuf);

impl RegistryRoot {
    /// Normalize a user supplied directory.
    ///
    /// Rebuilding the path from its components drops trailing and repeated
    /// separators (`registry/` and `registry//` both become `registry`),
    /// while `/` stays `/`.
    pub fn new(raw: impl AsRef<Path>) -> Self {
        let normalized: PathBuf = raw.as_ref().components().collect();
        Self(normalized)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for RegistryRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.display().fmt(f)
    }
}

/// The pair of registries a server exposes
#[derive(Debug, Clone)]
pub struct Registries {
    chains: RegistryRoot,
    validators: RegistryRoot,
}

impl Registries {
    pub fn new(chain_registry: impl AsRef<Path>, validator_registry: impl AsRef<Path>) -> Self {
        Self {
            chains: RegistryRoot::new(chain_registry),
            validators: RegistryRoot::new(validator_registry),
        }
    }

    pub const fn chains(&self) -> &RegistryRoot {
        &self.chains
    }

    pub const fn validators(&self) -> &RegistryRoot {
        &self.validators
    }

    pub const fn root(&self, namespace: Namespace) -> &RegistryRoot {
        match namespace {
            Namespace::Chains => &self.chains,
            Namespace::Validators => &self.validators,
        }
    }
}
