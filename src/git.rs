//! Commit metadata of registry checkouts
//!
//! The health endpoint only needs two facts per registry: the commit it
//! is on and when that commit was made. [`CommitSource`] abstracts how
//! they are obtained so tests can run without a git repository on disk.

use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

/// Failure of a single commit query
#[derive(Debug, Error)]
pub enum GitError {
    #[error("failed to run git in {}: {source}", dir.display())]
    Spawn {
        dir: PathBuf,
        source: std::io::Error,
    },

    #[error("git exited with {status} in {}: {stderr}", dir.display())]
    Exit {
        dir: PathBuf,
        status: ExitStatus,
        stderr: String,
    },

    #[error("git produced non UTF-8 output in {}", dir.display())]
    NonUtf8 { dir: PathBuf },
}

/// Source of commit metadata for a checkout directory
#[async_trait]
pub trait CommitSource: Send + Sync {
    /// Full hash of `HEAD`
    async fn latest_commit_hash(&self, dir: &Path) -> Result<String, GitError>;

    /// Committer timestamp of the latest commit, in Unix seconds
    async fn latest_commit_timestamp(&self, dir: &Path) -> Result<String, GitError>;
}

/// [`CommitSource`] backed by the `git` command line
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
}

impl GitCli {
    /// Use a specific git executable instead of the one on `PATH`
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run(&self, dir: &Path, args: &[&str]) -> Result<String, GitError> {
        let output = Command::new(&self.program)
            .args(args)
            .current_dir(dir)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| GitError::Spawn {
                dir: dir.to_path_buf(),
                source,
            })?;

        if !output.status.success() {
            return Err(GitError::Exit {
                dir: dir.to_path_buf(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8(output.stdout).map_err(|_| GitError::NonUtf8 {
            dir: dir.to_path_buf(),
        })?;
        Ok(stdout.trim().to_string())
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::with_program("git")
    }
}

#[async_trait]
impl CommitSource for GitCli {
    async fn latest_commit_hash(&self, dir: &Path) -> Result<String, GitError> {
        self.run(dir, &["rev-parse", "HEAD"]).await
    }

    async fn latest_commit_timestamp(&self, dir: &Path) -> Result<String, GitError> {
        self.run(dir, &["log", "-1", "--format=%ct"]).await
    }
}
