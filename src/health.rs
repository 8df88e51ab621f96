//! Registry health
//!
//! Health here means freshness and identity of the registry checkouts, not
//! liveness of the process: a registry whose commit cannot be read makes
//! the whole record unhealthy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::git::{CommitSource, GitError};
use crate::registry::Registries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Health record returned by `/v1/health`.
///
/// Commit and age fields are empty strings when their query failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub status: HealthStatus,
    pub chain_registry_commit: String,
    pub validator_registry_commit: String,
    pub chain_registry_age: String,
    pub validator_registry_age: String,
}

impl HealthRecord {
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Query commit hash and commit time of both registries.
///
/// All four queries run to completion even when some fail; every failure
/// is logged and downgrades the status.
pub async fn check_registries(commits: &dyn CommitSource, registries: &Registries) -> HealthRecord {
    let chains = registries.chains().path();
    let validators = registries.validators().path();

    let (chain_age, validator_age, chain_commit, validator_commit) = tokio::join!(
        commits.latest_commit_timestamp(chains),
        commits.latest_commit_timestamp(validators),
        commits.latest_commit_hash(chains),
        commits.latest_commit_hash(validators),
    );

    let mut status = HealthStatus::Healthy;
    let record = HealthRecord {
        chain_registry_age: settle(chain_age, &mut status, "git commit age", "chain registry"),
        validator_registry_age: settle(
            validator_age,
            &mut status,
            "git commit age",
            "validator registry",
        ),
        chain_registry_commit: settle(chain_commit, &mut status, "git commit", "chain registry"),
        validator_registry_commit: settle(
            validator_commit,
            &mut status,
            "git commit",
            "validator registry",
        ),
        status,
    };

    log_staleness("chain registry", &record.chain_registry_age);
    log_staleness("validator registry", &record.validator_registry_age);
    record
}

fn settle(
    result: Result<String, GitError>,
    status: &mut HealthStatus,
    query: &str,
    registry: &str,
) -> String {
    match result {
        Ok(value) => value.trim().to_string(),
        Err(err) => {
            tracing::error!(error = %err, registry, "error retrieving {query}");
            *status = HealthStatus::Unhealthy;
            String::new()
        }
    }
}

/// Seconds elapsed between a Unix timestamp string and `now`
fn commit_age_secs(timestamp: &str, now: DateTime<Utc>) -> Option<i64> {
    let secs = timestamp.trim().parse::<i64>().ok()?;
    let committed_at = DateTime::<Utc>::from_timestamp(secs, 0)?;
    Some((now - committed_at).num_seconds())
}

fn log_staleness(registry: &str, timestamp: &str) {
    if let Some(age) = commit_age_secs(timestamp, Utc::now()) {
        tracing::debug!(registry, age_secs = age, "latest registry commit");
    }
}
