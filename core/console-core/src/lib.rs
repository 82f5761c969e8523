//! # console-core
//!
//! Core library for the admin console: session lifecycle, per-page filter
//! state, and keeping list queries in step with the page's URL.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. Timers are deadlines the host
//!   polls, and network calls either run inline or are queued for the host.
//! - **Not thread-safe**: Clients provide their own synchronization (`Mutex`, `RwLock`).
//! - **Graceful degradation**: Missing or corrupt files fall back to defaults, not errors.
//! - **Injected seams**: Token storage, navigation, notices, clock and backend
//!   are traits, so every flow runs in tests without a browser or a server.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use console_core::*;
//!
//! let storage = StorageConfig::from_home()?;
//! let config = ConsoleConfig::load(&storage);
//! let store = FileTokenStore::open(&storage.token_file(), &config.token_key);
//! let api = Arc::new(HttpClient::new(&config)?);
//! let nav = Arc::new(MemoryNavigator::parse("http://localhost/")?);
//!
//! let mut session = SessionManager::new(config, Box::new(store), nav).with_api(api);
//! session.start();
//! ```

// Public modules
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod filters;
pub mod navigation;
pub mod notify;
pub mod query;
pub mod session;
pub mod storage;
pub mod timer;
pub mod token_store;

// Re-export commonly used items at crate root
pub use client::{HttpClient, ListApi, SessionApi};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ConsoleConfig;
pub use error::{ConsoleError, Result};
pub use filters::{FilterItem, FilterMap, FilterStore, FilterValue};
pub use navigation::{page_from_url, MemoryNavigator, Navigator};
pub use notify::{Notice, NoticeLevel, Notifier, TracingNotifier};
pub use query::{FetchTicket, PageRequest, PaginationQuery, QuerySynchronizer};
pub use session::{
    Effect, RefreshedToken, SessionEvent, SessionManager, SessionRequest, SessionSnapshot,
    SessionStatus,
};
pub use storage::StorageConfig;
pub use timer::{RefreshTimer, TimerHandle};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
