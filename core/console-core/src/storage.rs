//! Storage configuration and path management.
//!
//! All on-disk locations used by the console live under one root so tests can
//! inject a temp directory and production code never hunts for paths.
//!
//! ```text
//! ~/.admin-console/
//! ├── config.json    ConsoleConfig
//! ├── session.json   persisted token entries (FileTokenStore)
//! └── logs/          rolling CLI logs
//! ```

use std::path::{Path, PathBuf};

use crate::error::{ConsoleError, Result};

const ROOT_DIR_NAME: &str = ".admin-console";

/// Central configuration for all console storage paths.
///
/// Production code uses [`StorageConfig::from_home`], which points to
/// `~/.admin-console/`. Tests use [`StorageConfig::with_root`] for isolation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    root: PathBuf,
}

impl StorageConfig {
    pub fn from_home() -> Result<Self> {
        let home = dirs::home_dir().ok_or(ConsoleError::HomeDirNotFound)?;
        Ok(Self {
            root: home.join(ROOT_DIR_NAME),
        })
    }

    /// Creates a StorageConfig with a custom root directory.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to config.json (console preferences and endpoints).
    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.json")
    }

    /// Path to session.json (persisted access token entries).
    pub fn token_file(&self) -> PathBuf {
        self.root.join("session.json")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_under_root() {
        let storage = StorageConfig::with_root(PathBuf::from("/tmp/console-test"));
        assert_eq!(
            storage.config_file(),
            PathBuf::from("/tmp/console-test/config.json")
        );
        assert_eq!(
            storage.token_file(),
            PathBuf::from("/tmp/console-test/session.json")
        );
        assert_eq!(storage.logs_dir(), PathBuf::from("/tmp/console-test/logs"));
    }
}
