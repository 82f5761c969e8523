//! Persistent access-token storage.
//!
//! The session manager is the only writer. Everything else reaches the token
//! through request signing ([`crate::SessionManager::authorize`]).
//!
//! # File Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "entries": { "access_token": "..." }
//! }
//! ```
//!
//! Entries are keyed so several consoles (or environments) can share one file.
//! Empty, corrupt, or wrong-version files load as an empty store: the token is
//! never server truth and is re-validated on every start anyway.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use fs_err as fs;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{ConsoleError, Result};

const STORE_VERSION: u32 = 1;

pub trait TokenStore {
    fn load(&self) -> Option<String>;

    fn save(&mut self, token: &str) -> Result<()>;

    /// Removes the token. Returns whether a token was present.
    fn clear(&mut self) -> Result<bool>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryTokenStore {
    token: Option<String>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.clone()
    }

    fn save(&mut self, token: &str) -> Result<()> {
        self.token = Some(token.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<bool> {
        Ok(self.token.take().is_some())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

impl Default for StoreFile {
    fn default() -> Self {
        StoreFile {
            version: STORE_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

/// File-backed token store scoped to a single key.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    key: String,
    entries: BTreeMap<String, String>,
}

impl FileTokenStore {
    pub fn open(path: &Path, key: &str) -> Self {
        FileTokenStore {
            path: path.to_path_buf(),
            key: key.to_string(),
            entries: read_entries(path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        let parent = self.path.parent().ok_or_else(|| {
            ConsoleError::io(
                "resolving token store directory",
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no parent"),
            )
        })?;
        fs::create_dir_all(parent)
            .map_err(|err| ConsoleError::io("creating token store directory", err))?;

        let store_file = StoreFile {
            version: STORE_VERSION,
            entries: self.entries.clone(),
        };
        let content = serde_json::to_string_pretty(&store_file)
            .map_err(|err| ConsoleError::json("serializing token store", err))?;

        let mut temp_file = NamedTempFile::new_in(parent)
            .map_err(|err| ConsoleError::io("creating temp token file", err))?;
        temp_file
            .write_all(content.as_bytes())
            .map_err(|err| ConsoleError::io("writing temp token file", err))?;
        temp_file
            .flush()
            .map_err(|err| ConsoleError::io("flushing temp token file", err))?;
        temp_file
            .persist(&self.path)
            .map_err(|err| ConsoleError::io("persisting token store", err.error))?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<String> {
        self.entries
            .get(&self.key)
            .filter(|token| !token.is_empty())
            .cloned()
    }

    fn save(&mut self, token: &str) -> Result<()> {
        self.entries.insert(self.key.clone(), token.to_string());
        self.persist()
    }

    fn clear(&mut self) -> Result<bool> {
        if self.entries.remove(&self.key).is_none() {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }
}

fn read_entries(path: &Path) -> BTreeMap<String, String> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
        Err(err) => {
            tracing::warn!(error = %err, "Failed to read token store, starting empty");
            return BTreeMap::new();
        }
    };

    if content.trim().is_empty() {
        return BTreeMap::new();
    }

    match serde_json::from_str::<StoreFile>(&content) {
        Ok(store_file) if store_file.version == STORE_VERSION => store_file.entries,
        Ok(store_file) => {
            tracing::warn!(
                version = store_file.version,
                expected = STORE_VERSION,
                "Unsupported token store version, starting empty"
            );
            BTreeMap::new()
        }
        Err(err) => {
            tracing::warn!(error = %err, "Corrupt token store, starting empty");
            BTreeMap::new()
        }
    }
}
