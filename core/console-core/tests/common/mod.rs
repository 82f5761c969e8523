#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use console_api::{Product, RefreshResponse, UserProfile};
use console_core::{
    ConsoleConfig, ConsoleError, ManualClock, MemoryNavigator, Notice, Notifier, Result,
    SessionApi, SessionManager, TokenStore,
};

pub const SIGN_IN: &str = "/signin";

/// Backend double answering from per-endpoint queues.
///
/// An empty refresh or profile queue answers with a transport error so a test
/// never silently succeeds on an unscripted call.
#[derive(Default)]
pub struct ScriptedApi {
    refresh: Mutex<VecDeque<Result<RefreshResponse>>>,
    profile: Mutex<VecDeque<Result<UserProfile>>>,
    products: Mutex<VecDeque<Result<Vec<Product>>>>,
    logout: Mutex<VecDeque<Result<()>>>,
    calls: Mutex<Vec<&'static str>>,
}

impl ScriptedApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_refresh(&self, result: Result<RefreshResponse>) {
        lock(&self.refresh).push_back(result);
    }

    pub fn push_profile(&self, result: Result<UserProfile>) {
        lock(&self.profile).push_back(result);
    }

    pub fn push_products(&self, result: Result<Vec<Product>>) {
        lock(&self.products).push_back(result);
    }

    pub fn push_logout(&self, result: Result<()>) {
        lock(&self.logout).push_back(result);
    }

    pub fn calls(&self, endpoint: &str) -> usize {
        lock(&self.calls).iter().filter(|c| **c == endpoint).count()
    }

    fn record(&self, endpoint: &'static str) {
        lock(&self.calls).push(endpoint);
    }
}

impl SessionApi for ScriptedApi {
    fn refresh(&self, _token: &str) -> Result<RefreshResponse> {
        self.record("refresh");
        lock(&self.refresh)
            .pop_front()
            .unwrap_or_else(|| Err(ConsoleError::Transport("unscripted refresh".into())))
    }

    fn profile(&self, _token: &str) -> Result<UserProfile> {
        self.record("profile");
        lock(&self.profile)
            .pop_front()
            .unwrap_or_else(|| Err(ConsoleError::Transport("unscripted profile".into())))
    }

    fn logout(&self, _token: &str) -> Result<()> {
        self.record("logout");
        lock(&self.logout).pop_front().unwrap_or(Ok(()))
    }

    fn products(&self, _token: &str) -> Result<Vec<Product>> {
        self.record("products");
        lock(&self.products).pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Token store whose contents stay observable after it is boxed into a manager.
#[derive(Clone, Default)]
pub struct SharedStore {
    token: Arc<Mutex<Option<String>>>,
    clears: Arc<Mutex<usize>>,
}

impl SharedStore {
    pub fn with_token(token: &str) -> Self {
        let store = Self::default();
        *lock(&store.token) = Some(token.to_string());
        store
    }

    pub fn token(&self) -> Option<String> {
        lock(&self.token).clone()
    }

    /// Number of clears that actually removed a token.
    pub fn clears(&self) -> usize {
        *lock(&self.clears)
    }
}

impl TokenStore for SharedStore {
    fn load(&self) -> Option<String> {
        self.token()
    }

    fn save(&mut self, token: &str) -> Result<()> {
        *lock(&self.token) = Some(token.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<bool> {
        let removed = lock(&self.token).take().is_some();
        if removed {
            *lock(&self.clears) += 1;
        }
        Ok(removed)
    }
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        lock(&self.notices).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        lock(&self.notices).push(notice);
    }
}

pub struct Harness {
    pub api: Arc<ScriptedApi>,
    pub store: SharedStore,
    pub nav: Arc<MemoryNavigator>,
    pub notices: RecordingNotifier,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new(token: Option<&str>) -> Self {
        Self {
            api: ScriptedApi::new(),
            store: token.map(SharedStore::with_token).unwrap_or_default(),
            nav: Arc::new(MemoryNavigator::parse("https://console.test/dashboard").unwrap()),
            notices: RecordingNotifier::default(),
            clock: Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap())),
        }
    }

    fn base(&self) -> SessionManager {
        let config = ConsoleConfig {
            sign_in_route: SIGN_IN.to_string(),
            ..ConsoleConfig::default()
        };
        SessionManager::new(config, Box::new(self.store.clone()), self.nav.clone())
            .with_notifier(Box::new(self.notices.clone()))
            .with_clock(self.clock.clone())
    }

    /// Manager that performs requests inline against the scripted API.
    pub fn inline(&self) -> SessionManager {
        self.base().with_api(self.api.clone())
    }

    /// Manager that queues requests for the test to answer.
    pub fn deferred(&self) -> SessionManager {
        self.base()
    }

    /// Navigations pushed since the harness was built.
    pub fn pushes(&self) -> usize {
        self.nav.history_len() - 1
    }
}

pub fn admin() -> UserProfile {
    UserProfile::with_role("admin")
}

pub fn refreshed(token: &str, expiry: i64) -> Result<RefreshResponse> {
    Ok(RefreshResponse::new(token, expiry))
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
