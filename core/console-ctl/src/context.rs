//! Wiring shared by every subcommand.

use std::sync::Arc;

use console_core::{
    ConsoleConfig, FileTokenStore, HttpClient, MemoryNavigator, SessionManager, StorageConfig,
};

use crate::CtlError;

/// Location the CLI pretends to be on. Sign-in navigation lands here too.
const CONSOLE_ORIGIN: &str = "console://local/";

pub struct Context {
    pub storage: StorageConfig,
    pub config: ConsoleConfig,
    pub client: Arc<HttpClient>,
}

impl Context {
    pub fn load(storage: StorageConfig) -> Result<Self, CtlError> {
        let config = ConsoleConfig::load(&storage);
        let client = Arc::new(HttpClient::new(&config)?);
        tracing::debug!(api = %config.api_base_url, root = %storage.root().display(), "Context loaded");
        Ok(Self {
            storage,
            config,
            client,
        })
    }

    /// A navigator positioned at `route` under the CLI's origin.
    pub fn navigator(&self, route: &str) -> Result<Arc<MemoryNavigator>, CtlError> {
        let location = format!("{}{}", CONSOLE_ORIGIN, route.trim_start_matches('/'));
        Ok(Arc::new(MemoryNavigator::parse(&location)?))
    }

    /// An inline session manager over the persisted token.
    pub fn session(&self, navigator: Arc<MemoryNavigator>) -> SessionManager {
        let store = FileTokenStore::open(&self.storage.token_file(), &self.config.token_key);
        SessionManager::new(self.config.clone(), Box::new(store), navigator)
            .with_api(self.client.clone())
    }
}
