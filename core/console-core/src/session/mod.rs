//! Session Lifecycle
//!
//! Owns the access token's life: silent refresh at startup, profile validation,
//! proactive refresh before expiry, logout, and the unauthorized path.
//!
//! ```text
//!            TokenMissing                      ProfileRejected / ProfileFailed
//!  Unknown ─────────────────► AuthRequired ◄──────────────────────────────┐
//!     │                          ▲    ▲                                   │
//!     │ TokenFound               │    │ RefreshFailed / Logout /          │
//!     ▼                          │    │ Unauthorized (from anywhere)      │
//!  Refresh ── RefreshFailed ─────┘    │                                   │
//!     │                               │                                   │
//!     │ RefreshSucceeded (no user)    │                                   │
//!     └──────────────────────► ValidateAccess ────────────────────────────┘
//!                                     │
//!                                     │ ProfileAccepted
//!                                     ▼
//!                              AuthSuccessful ◄── RefreshSucceeded (user loaded)
//! ```
//!
//! # Module Structure
//!
//! - [`transition`]: Pure `(status, event) -> (status, effects)` table
//! - [`manager`]: Runs effects against the store, timer, navigator and backend
//! - [`types`]: Status, events, effects and request types

mod manager;
pub mod transition;
mod types;

pub use manager::SessionManager;
pub use transition::next_transition;
pub use types::{
    Effect, RefreshedToken, SessionEvent, SessionRequest, SessionSnapshot, SessionStatus,
    Transition,
};
