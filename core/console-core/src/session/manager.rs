//! Executes session transitions against the token store, timer, navigator and
//! backend.
//!
//! # Teardown
//!
//! Every entry into `AuthRequired` goes through [`SessionManager::dispatch`],
//! which runs one teardown path: cancel the refresh timer, drop the loaded user
//! and products, clear the token if one is stored. Each step is a no-op when
//! already done, so repeated unauthorized signals cost nothing.
//!
//! # Abandoned Responses
//!
//! A response processed while the token store is empty belongs to a session
//! that was logged out or torn down in the meantime, and is dropped.
//!
//! # I/O Modes
//!
//! With an API attached ([`SessionManager::with_api`]) requests run inline. Without
//! one, requests queue up for the host ([`SessionManager::take_requests`]), which
//! reports completions through the `on_*_response` handlers in whatever order
//! they arrive.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use console_api::{Product, RefreshResponse, UserProfile};

use crate::clock::{Clock, SystemClock};
use crate::client::SessionApi;
use crate::config::ConsoleConfig;
use crate::error::{ConsoleError, Result};
use crate::navigation::{is_at_route, Navigator};
use crate::notify::{Notice, Notifier, TracingNotifier};
use crate::timer::{refresh_delay, RefreshTimer, TimerHandle};
use crate::token_store::TokenStore;

use super::transition::next_transition;
use super::types::{
    Effect, RefreshedToken, SessionEvent, SessionRequest, SessionSnapshot, SessionStatus,
};

pub struct SessionManager {
    config: ConsoleConfig,
    store: Box<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
    api: Option<Arc<dyn SessionApi>>,
    notifier: Box<dyn Notifier>,
    clock: Arc<dyn Clock>,
    status: SessionStatus,
    user: Option<UserProfile>,
    products: Vec<Product>,
    timer: RefreshTimer,
    refresh_in_flight: bool,
    profile_in_flight: bool,
    outbox: VecDeque<SessionRequest>,
}

impl SessionManager {
    /// Creates a manager in `Unknown`. Call [`SessionManager::start`] to begin.
    pub fn new(
        config: ConsoleConfig,
        store: Box<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            config,
            store,
            navigator,
            api: None,
            notifier: Box::new(TracingNotifier),
            clock: Arc::new(SystemClock),
            status: SessionStatus::Unknown,
            user: None,
            products: Vec::new(),
            timer: RefreshTimer::new(),
            refresh_in_flight: false,
            profile_in_flight: false,
            outbox: VecDeque::new(),
        }
    }

    pub fn with_api(mut self, api: Arc<dyn SessionApi>) -> Self {
        self.api = Some(api);
        self
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    /// Handle of the armed refresh timer, if any.
    pub fn refresh_timer(&self) -> Option<TimerHandle> {
        self.timer.handle()
    }

    /// When the host should next call [`SessionManager::tick`].
    pub fn next_wakeup(&self) -> Option<DateTime<Utc>> {
        self.timer.deadline()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            user: self.user.clone(),
            products: self.products.clone(),
            next_refresh_at: self.timer.deadline(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Operations
    // ─────────────────────────────────────────────────────────────────────

    /// Leaves `Unknown`: either straight to `AuthRequired` or via a silent refresh.
    pub fn start(&mut self) {
        if self.status != SessionStatus::Unknown {
            tracing::debug!(status = ?self.status, "Session already started");
            return;
        }
        let event = if self.store.load().is_some() {
            SessionEvent::TokenFound
        } else {
            SessionEvent::TokenMissing
        };
        self.dispatch(event);
    }

    /// Forces a status from outside the manager.
    ///
    /// `AuthRequired` is the unauthorized path and is idempotent. `ValidateAccess`
    /// re-validates the profile (or lands on `AuthSuccessful` when a user is
    /// already loaded). `AuthSuccessful` is only honoured with a loaded user, and
    /// `Unknown` cannot be re-entered.
    pub fn set_status(&mut self, next: SessionStatus) {
        match next {
            SessionStatus::AuthRequired => self.dispatch(SessionEvent::Unauthorized),
            SessionStatus::ValidateAccess | SessionStatus::AuthSuccessful
                if self.user.is_some() =>
            {
                self.enter(SessionStatus::AuthSuccessful);
            }
            SessionStatus::ValidateAccess => {
                self.enter(SessionStatus::ValidateAccess);
                self.run(Effect::FetchProfile);
            }
            SessionStatus::AuthSuccessful | SessionStatus::Unknown => {
                tracing::warn!(requested = ?next, current = ?self.status, "Ignoring status override");
            }
        }
    }

    /// Stores a token issued by the external sign-in flow and validates it.
    pub fn adopt_token(&mut self, token: &str) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ConsoleError::MissingToken);
        }
        self.store.save(token)?;
        self.user = None;
        self.products.clear();
        tracing::info!("Adopted new access token");
        self.refresh();
        Ok(())
    }

    /// Refreshes the access token.
    ///
    /// Returns the new token when the refresh completed inline. A deferred
    /// manager queues the request and returns `None`; so does a call made while
    /// another refresh is outstanding.
    pub fn refresh(&mut self) -> Option<RefreshedToken> {
        if self.refresh_in_flight {
            tracing::debug!("Refresh already in flight");
            return None;
        }
        let Some(token) = self.store.load() else {
            tracing::info!("No access token to refresh");
            self.dispatch(SessionEvent::RefreshFailed);
            return None;
        };

        self.refresh_in_flight = true;
        match self.api.clone() {
            Some(api) => {
                let result = api.refresh(&token);
                self.on_refresh_response(result)
            }
            None => {
                self.outbox.push_back(SessionRequest::Refresh { token });
                None
            }
        }
    }

    /// Ends the session locally. The remote invalidation is best effort.
    pub fn logout(&mut self) {
        if let Some(token) = self.store.load() {
            match self.api.clone() {
                Some(api) => {
                    if let Err(err) = api.logout(&token) {
                        tracing::warn!(error = %err, "Remote logout failed; continuing locally");
                    }
                }
                None => self.outbox.push_back(SessionRequest::Logout { token }),
            }
        }
        tracing::info!("Logging out");
        self.dispatch(SessionEvent::Logout);
    }

    /// Runs an authenticated call with the current token. A 401 from `call`
    /// forces `AuthRequired` before the error is returned.
    pub fn authorize<T>(&mut self, call: impl FnOnce(&str) -> Result<T>) -> Result<T> {
        let token = self.store.load().ok_or(ConsoleError::MissingToken)?;
        let result = call(&token);
        if result.as_ref().is_err_and(|err| err.is_unauthorized()) {
            tracing::info!("Authenticated call was rejected");
            self.dispatch(SessionEvent::Unauthorized);
        }
        result
    }

    /// Refreshes if the timer is due. Returns whether it fired.
    pub fn tick(&mut self) -> bool {
        let now = self.clock.now();
        match self.timer.take_due(now) {
            Some(handle) => {
                tracing::debug!(handle = handle.id(), "Refresh timer fired");
                self.refresh();
                true
            }
            None => false,
        }
    }

    /// Refreshes for a host-scheduled timer callback. Stale handles are ignored.
    pub fn on_timer_fired(&mut self, handle: TimerHandle) -> bool {
        if !self.timer.fire(handle) {
            tracing::debug!(handle = handle.id(), "Ignoring stale refresh timer");
            return false;
        }
        self.refresh();
        true
    }

    /// Drains requests queued by a deferred manager.
    pub fn take_requests(&mut self) -> Vec<SessionRequest> {
        self.outbox.drain(..).collect()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Completions
    // ─────────────────────────────────────────────────────────────────────

    pub fn on_refresh_response(&mut self, result: Result<RefreshResponse>) -> Option<RefreshedToken> {
        self.refresh_in_flight = false;
        if self.store.load().is_none() {
            tracing::debug!("Ignoring refresh response for abandoned session");
            return None;
        }

        let response = match result {
            Ok(response) => response,
            Err(ConsoleError::Unauthorized) => {
                tracing::info!("Refresh rejected as unauthorized");
                self.dispatch(SessionEvent::Unauthorized);
                return None;
            }
            Err(err) => {
                tracing::warn!(error = %err, "Token refresh failed");
                self.dispatch(SessionEvent::RefreshFailed);
                return None;
            }
        };

        let (Some(token), Some(expiry_in_seconds)) =
            (response.token(), response.access_token_expiry_in_seconds)
        else {
            tracing::warn!("Refresh response carried no token or expiry");
            self.dispatch(SessionEvent::RefreshFailed);
            return None;
        };
        let access_token = token.to_string();

        if let Err(err) = self.store.save(&access_token) {
            tracing::warn!(error = %err, "Failed to persist refreshed token");
            self.dispatch(SessionEvent::RefreshFailed);
            return None;
        }

        self.dispatch(SessionEvent::RefreshSucceeded {
            user_loaded: self.user.is_some(),
            expiry_in_seconds,
        });
        Some(RefreshedToken {
            access_token,
            expiry_in_seconds,
        })
    }

    pub fn on_profile_response(&mut self, result: Result<UserProfile>) {
        self.profile_in_flight = false;
        if self.store.load().is_none() {
            tracing::debug!("Ignoring profile response for abandoned session");
            return;
        }
        if self.status != SessionStatus::ValidateAccess {
            tracing::debug!(status = ?self.status, "Ignoring profile response outside validation");
            return;
        }

        match result {
            Ok(profile) if self.config.role_allowed(&profile.role) => {
                tracing::info!(role = %profile.role, "Access validated");
                self.user = Some(profile);
                self.dispatch(SessionEvent::ProfileAccepted);
            }
            Ok(profile) => {
                tracing::warn!(role = %profile.role, "Profile role not permitted");
                self.dispatch(SessionEvent::ProfileRejected);
            }
            Err(ConsoleError::Unauthorized) => self.dispatch(SessionEvent::Unauthorized),
            Err(err) => {
                tracing::warn!(error = %err, "Profile fetch failed");
                self.notifier.notify(Notice::error(err.to_string()));
                self.dispatch(SessionEvent::ProfileFailed);
            }
        }
    }

    pub fn on_products_response(&mut self, result: Result<Vec<Product>>) {
        if self.store.load().is_none() {
            tracing::debug!("Ignoring product list for abandoned session");
            return;
        }

        match result {
            Ok(products) => {
                tracing::debug!(count = products.len(), "Product list loaded");
                self.products = products;
            }
            Err(ConsoleError::Unauthorized) => self.dispatch(SessionEvent::Unauthorized),
            Err(err) => {
                tracing::warn!(error = %err, "Failed to load product list");
                self.notifier
                    .notify(Notice::warning(format!("Could not load products: {}", err)));
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // State Machine
    // ─────────────────────────────────────────────────────────────────────

    fn dispatch(&mut self, event: SessionEvent) {
        let transition = next_transition(self.status, event);
        tracing::debug!(event = ?event, from = ?self.status, to = ?transition.status, "Session event");
        self.enter(transition.status);
        for effect in transition.effects {
            self.run(effect);
        }
    }

    fn enter(&mut self, status: SessionStatus) {
        let previous = self.status;
        self.status = status;
        if previous != status {
            tracing::info!(from = ?previous, to = ?status, "Session status changed");
        }
        if status == SessionStatus::AuthRequired {
            self.teardown();
        }
    }

    fn teardown(&mut self) {
        if let Some(handle) = self.timer.cancel() {
            tracing::debug!(handle = handle.id(), "Cancelled refresh timer");
        }
        self.user = None;
        self.products.clear();
        self.refresh_in_flight = false;
        self.profile_in_flight = false;

        if self.store.load().is_some() {
            match self.store.clear() {
                Ok(_) => tracing::debug!("Cleared access token"),
                Err(err) => tracing::warn!(error = %err, "Failed to clear access token"),
            }
        }
    }

    fn run(&mut self, effect: Effect) {
        match effect {
            Effect::Refresh => {
                self.refresh();
            }
            Effect::ArmRefreshTimer { expiry_in_seconds } => {
                let delay = refresh_delay(expiry_in_seconds, self.config.refresh_margin_secs);
                let handle = self.timer.arm(self.clock.now(), delay);
                tracing::debug!(
                    handle = handle.id(),
                    delay_secs = delay.num_seconds(),
                    "Armed refresh timer"
                );
            }
            Effect::FetchProfile => self.fetch_profile(),
            Effect::LoadProducts => self.load_products(),
            Effect::NavigateToSignIn { forced } => {
                let route = self.config.sign_in_route.clone();
                if !forced && is_at_route(&self.navigator.location(), &route) {
                    tracing::debug!(route = %route, "Already on sign-in route");
                    return;
                }
                self.navigator.push(&route);
            }
        }
    }

    fn fetch_profile(&mut self) {
        if self.profile_in_flight {
            tracing::debug!("Profile fetch already in flight");
            return;
        }
        let Some(token) = self.store.load() else {
            return;
        };

        self.profile_in_flight = true;
        match self.api.clone() {
            Some(api) => {
                let result = api.profile(&token);
                self.on_profile_response(result);
            }
            None => self.outbox.push_back(SessionRequest::Profile { token }),
        }
    }

    fn load_products(&mut self) {
        let Some(token) = self.store.load() else {
            return;
        };
        match self.api.clone() {
            Some(api) => {
                let result = api.products(&token);
                self.on_products_response(result);
            }
            None => self.outbox.push_back(SessionRequest::Products { token }),
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("status", &self.status)
            .field("user", &self.user)
            .field("refresh_timer", &self.timer.handle())
            .field("refresh_in_flight", &self.refresh_in_flight)
            .field("profile_in_flight", &self.profile_in_flight)
            .finish_non_exhaustive()
    }
}
