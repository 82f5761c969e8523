//! Console configuration loading and saving.
//!
//! The config file is optional: a missing file yields defaults. Every field is
//! individually defaulted so older files keep loading as fields are added.

use std::io::Write;
use std::time::Duration;

use fs_err as fs;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{ConsoleError, Result};
use crate::storage::StorageConfig;

/// Overrides `api_base_url` when set and non-empty.
pub const API_URL_ENV: &str = "ADMIN_CONSOLE_API_URL";

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Subtracted from a token's reported lifetime before the next refresh is armed.
pub const DEFAULT_REFRESH_MARGIN_SECS: i64 = 10;
const DEFAULT_PAGE_LIMIT: u32 = 10;
const DEFAULT_SIGN_IN_ROUTE: &str = "/signin";
const DEFAULT_TOKEN_KEY: &str = "access_token";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub refresh_margin_secs: i64,
    pub default_page_limit: u32,
    /// Route the session manager navigates to when authentication is required.
    pub sign_in_route: String,
    /// Key under which the access token is persisted.
    pub token_key: String,
    /// Roles permitted to use the console. Empty means any non-empty role.
    pub allowed_roles: Vec<String>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            refresh_margin_secs: DEFAULT_REFRESH_MARGIN_SECS,
            default_page_limit: DEFAULT_PAGE_LIMIT,
            sign_in_route: DEFAULT_SIGN_IN_ROUTE.to_string(),
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            allowed_roles: Vec::new(),
        }
    }
}

impl ConsoleConfig {
    /// Loads the config, falling back to defaults when the file is missing or
    /// malformed. Environment overrides are applied either way.
    pub fn load(storage: &StorageConfig) -> Self {
        let mut config = match Self::try_load(storage) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to load console config; using defaults");
                Self::default()
            }
        };
        config.apply_env_overrides();
        config
    }

    /// Loads the config file strictly. A missing file is not an error.
    pub fn try_load(storage: &StorageConfig) -> Result<Self> {
        let path = storage.config_file();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => return Err(ConsoleError::io("reading console config", err)),
        };

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_str(&content).map_err(|err| ConsoleError::ConfigMalformed {
            path,
            details: err.to_string(),
        })
    }

    pub fn save(&self, storage: &StorageConfig) -> Result<()> {
        let path = storage.config_file();
        let parent = path.parent().unwrap_or(storage.root());
        fs::create_dir_all(parent)
            .map_err(|err| ConsoleError::io("creating config directory", err))?;

        let content = serde_json::to_string_pretty(self)
            .map_err(|err| ConsoleError::json("serializing console config", err))?;
        let mut temp_file = NamedTempFile::new_in(parent)
            .map_err(|err| ConsoleError::io("creating temp config file", err))?;
        temp_file
            .write_all(content.as_bytes())
            .map_err(|err| ConsoleError::io("writing temp config file", err))?;
        temp_file
            .persist(&path)
            .map_err(|err| ConsoleError::io("persisting console config", err.error))?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            let url = url.trim();
            if !url.is_empty() {
                self.api_base_url = url.to_string();
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Returns true if `role` may use the console.
    pub fn role_allowed(&self, role: &str) -> bool {
        let role = role.trim();
        if role.is_empty() {
            return false;
        }
        self.allowed_roles.is_empty() || self.allowed_roles.iter().any(|allowed| allowed == role)
    }
}
