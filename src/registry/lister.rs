//! Top-level chain listing
//!
//! Reads only the immediate children of a registry root; nothing below the
//! first level is ever opened, so chain content trees are never walked.

use std::path::Path;

use tokio::fs;

use super::RegistryError;

/// Subdirectory that groups testnets; it is not a chain itself
const TESTNETS_DIR: &str = "testnets";

/// Whether a first-level directory name denotes a chain.
///
/// Hidden (`.git`), metadata (`_IBC`, `_non-cosmos`) and the `testnets`
/// directory (any letter case) are excluded.
pub fn is_chain_name(name: &str) -> bool {
    !name.starts_with('.') && !name.starts_with('_') && !name.eq_ignore_ascii_case(TESTNETS_DIR)
}

/// List chain names directly under `root`, sorted by name.
///
/// Non-directory entries are ignored, as are symlinks. Any I/O error aborts
/// the whole listing; no partial result is returned.
pub async fn list_chains(root: &Path) -> Result<Vec<String>, RegistryError> {
    let mut entries = fs::read_dir(root)
        .await
        .map_err(|source| RegistryError::ReadRoot {
            path: root.to_path_buf(),
            source,
        })?;

    let mut chains = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(source) => {
                return Err(RegistryError::ReadEntry {
                    path: root.to_path_buf(),
                    source,
                })
            }
        };

        let name = entry.file_name().to_string_lossy().into_owned();
        tracing::debug!(item = %name, "examining item");

        let file_type = entry
            .file_type()
            .await
            .map_err(|source| RegistryError::ReadEntry {
                path: entry.path(),
                source,
            })?;
        if !file_type.is_dir() {
            tracing::debug!(item = %name, "item is not a directory");
            continue;
        }

        if is_chain_name(&name) {
            chains.push(name);
        } else {
            tracing::debug!(item = %name, "skipping hidden, metadata or testnet directory");
        }
    }

    chains.sort_unstable();
    Ok(chains)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as stdfs;

    #[test]
    fn test_is_chain_name() {
        assert!(is_chain_name("cosmoshub"));
        assert!(is_chain_name("Osmosis"));
        assert!(is_chain_name("testnets-archive"));
        assert!(!is_chain_name(".git"));
        assert!(!is_chain_name(".github"));
        assert!(!is_chain_name("_IBC"));
        assert!(!is_chain_name("_non-cosmos"));
        assert!(!is_chain_name("testnets"));
        assert!(!is_chain_name("TestNets"));
    }

    #[tokio::test]
    async fn test_filters_first_level_directories() {
        let root = tempfile::tempdir().unwrap();
        for dir in ["cosmoshub", ".git", "_IBC", "testnets", "Osmosis"] {
            stdfs::create_dir(root.path().join(dir)).unwrap();
        }

        let chains = list_chains(root.path()).await.unwrap();
        assert_eq!(chains, vec!["Osmosis".to_string(), "cosmoshub".to_string()]);
    }

    #[tokio::test]
    async fn test_ignores_files_and_nested_directories() {
        let root = tempfile::tempdir().unwrap();
        stdfs::create_dir_all(root.path().join("juno/images/deep/deeper")).unwrap();
        stdfs::create_dir_all(root.path().join("testnets/junotestnet")).unwrap();
        stdfs::write(root.path().join("README.md"), "# registry").unwrap();
        stdfs::write(root.path().join("juno/chain.json"), "{}").unwrap();

        let chains = list_chains(root.path()).await.unwrap();
        assert_eq!(chains, vec!["juno".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_root() {
        let root = tempfile::tempdir().unwrap();
        assert!(list_chains(root.path()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_only_excluded_entries() {
        let root = tempfile::tempdir().unwrap();
        for dir in [".github", "_template", "TESTNETS"] {
            stdfs::create_dir(root.path().join(dir)).unwrap();
        }
        assert!(list_chains(root.path()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_root_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("does-not-exist");

        let err = list_chains(&missing).await.unwrap_err();
        assert!(matches!(err, RegistryError::ReadRoot { .. }));
        assert!(err.to_string().contains("does-not-exist"));
    }

    #[tokio::test]
    async fn test_root_with_trailing_separator() {
        let root = tempfile::tempdir().unwrap();
        stdfs::create_dir(root.path().join("akash")).unwrap();
        let with_slash = format!("{}/", root.path().display());

        let chains = list_chains(Path::new(&with_slash)).await.unwrap();
        assert_eq!(chains, vec!["akash".to_string()]);
    }
}
