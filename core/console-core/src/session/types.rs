//! Session status, events, and effects.

use chrono::{DateTime, Utc};
use console_api::{Product, UserProfile};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Unknown,
    AuthRequired,
    ValidateAccess,
    AuthSuccessful,
}

/// Inputs to the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Startup found no persisted token.
    TokenMissing,
    /// Startup found a persisted token.
    TokenFound,
    RefreshSucceeded {
        user_loaded: bool,
        expiry_in_seconds: i64,
    },
    /// Network failure, error status, or a success body without a token.
    RefreshFailed,
    ProfileAccepted,
    /// Profile loaded but its role is empty or not permitted.
    ProfileRejected,
    ProfileFailed,
    Logout,
    /// Any authenticated call was answered with 401.
    Unauthorized,
}

/// Work the manager performs after entering the transition's status.
///
/// Teardown (timer cancel, token clear) is not listed: it runs for every entry
/// into `AuthRequired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Refresh,
    ArmRefreshTimer { expiry_in_seconds: i64 },
    FetchProfile,
    LoadProducts,
    /// `forced` navigates even when already on the sign-in route.
    NavigateToSignIn { forced: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub status: SessionStatus,
    pub effects: Vec<Effect>,
}

impl Transition {
    pub(crate) fn to(status: SessionStatus) -> Self {
        Self {
            status,
            effects: Vec::new(),
        }
    }

    pub(crate) fn with(status: SessionStatus, effects: Vec<Effect>) -> Self {
        Self { status, effects }
    }
}

/// Network work requested by the manager.
///
/// Inline managers perform these immediately; deferred managers queue them
/// for the host (see [`crate::SessionManager::take_requests`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionRequest {
    Refresh { token: String },
    Profile { token: String },
    Products { token: String },
    /// Fire-and-forget; its outcome is never reported back.
    Logout { token: String },
}

/// Result of a successful refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshedToken {
    pub access_token: String,
    pub expiry_in_seconds: i64,
}

/// Serializable view of the session for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub user: Option<UserProfile>,
    pub products: Vec<Product>,
    pub next_refresh_at: Option<DateTime<Utc>>,
}
