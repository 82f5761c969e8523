//! Maps session events to status transitions and effects.
//! Events that make no sense in the current status leave it unchanged.

use super::types::{Effect, SessionEvent, SessionStatus, Transition};

pub fn next_transition(current: SessionStatus, event: SessionEvent) -> Transition {
    use crate::session::types::SessionStatus::*;

    match (current, event) {
        (Unknown, SessionEvent::TokenMissing) => Transition::to(AuthRequired),
        (Unknown, SessionEvent::TokenFound) => Transition::with(Unknown, vec![Effect::Refresh]),
        (_, SessionEvent::TokenMissing | SessionEvent::TokenFound) => Transition::to(current),

        (
            _,
            SessionEvent::RefreshSucceeded {
                user_loaded: false,
                expiry_in_seconds,
            },
        ) => Transition::with(
            ValidateAccess,
            vec![
                Effect::ArmRefreshTimer { expiry_in_seconds },
                Effect::FetchProfile,
            ],
        ),
        (
            _,
            SessionEvent::RefreshSucceeded {
                user_loaded: true,
                expiry_in_seconds,
            },
        ) => Transition::with(
            AuthSuccessful,
            vec![Effect::ArmRefreshTimer { expiry_in_seconds }],
        ),
        (_, SessionEvent::RefreshFailed) => Transition::to(AuthRequired),

        (ValidateAccess, SessionEvent::ProfileAccepted) => {
            Transition::with(AuthSuccessful, vec![Effect::LoadProducts])
        }
        (ValidateAccess, SessionEvent::ProfileRejected) => Transition::with(
            AuthRequired,
            vec![Effect::NavigateToSignIn { forced: false }],
        ),
        (ValidateAccess, SessionEvent::ProfileFailed) => Transition::to(AuthRequired),
        (
            _,
            SessionEvent::ProfileAccepted
            | SessionEvent::ProfileRejected
            | SessionEvent::ProfileFailed,
        ) => Transition::to(current),

        (_, SessionEvent::Logout) => Transition::to(AuthRequired),

        // Already torn down: a second 401 must not navigate again.
        (AuthRequired, SessionEvent::Unauthorized) => Transition::to(AuthRequired),
        (_, SessionEvent::Unauthorized) => Transition::with(
            AuthRequired,
            vec![Effect::NavigateToSignIn { forced: true }],
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::types::SessionStatus::*;

    fn refreshed(user_loaded: bool) -> SessionEvent {
        SessionEvent::RefreshSucceeded {
            user_loaded,
            expiry_in_seconds: 300,
        }
    }

    #[test]
    fn test_missing_token_requires_auth() {
        assert_eq!(
            next_transition(Unknown, SessionEvent::TokenMissing),
            Transition::to(AuthRequired)
        );
    }

    #[test]
    fn test_found_token_triggers_refresh() {
        assert_eq!(
            next_transition(Unknown, SessionEvent::TokenFound),
            Transition::with(Unknown, vec![Effect::Refresh])
        );
    }

    #[test]
    fn test_startup_events_ignored_after_startup() {
        assert_eq!(
            next_transition(AuthSuccessful, SessionEvent::TokenMissing),
            Transition::to(AuthSuccessful)
        );
        assert_eq!(
            next_transition(AuthRequired, SessionEvent::TokenFound),
            Transition::to(AuthRequired)
        );
    }

    #[test]
    fn test_refresh_without_user_validates_access() {
        for from in [Unknown, AuthRequired, ValidateAccess, AuthSuccessful] {
            assert_eq!(
                next_transition(from, refreshed(false)),
                Transition::with(
                    ValidateAccess,
                    vec![
                        Effect::ArmRefreshTimer {
                            expiry_in_seconds: 300
                        },
                        Effect::FetchProfile
                    ]
                )
            );
        }
    }

    #[test]
    fn test_refresh_with_user_skips_validation() {
        assert_eq!(
            next_transition(AuthSuccessful, refreshed(true)),
            Transition::with(
                AuthSuccessful,
                vec![Effect::ArmRefreshTimer {
                    expiry_in_seconds: 300
                }]
            )
        );
    }

    #[test]
    fn test_refresh_failure_requires_auth_from_any_state() {
        for from in [Unknown, AuthRequired, ValidateAccess, AuthSuccessful] {
            assert_eq!(
                next_transition(from, SessionEvent::RefreshFailed),
                Transition::to(AuthRequired)
            );
        }
    }

    #[test]
    fn test_profile_accepted_loads_products() {
        assert_eq!(
            next_transition(ValidateAccess, SessionEvent::ProfileAccepted),
            Transition::with(AuthSuccessful, vec![Effect::LoadProducts])
        );
    }

    #[test]
    fn test_profile_rejected_navigates_unforced() {
        assert_eq!(
            next_transition(ValidateAccess, SessionEvent::ProfileRejected),
            Transition::with(
                AuthRequired,
                vec![Effect::NavigateToSignIn { forced: false }]
            )
        );
    }

    #[test]
    fn test_profile_failure_requires_auth() {
        assert_eq!(
            next_transition(ValidateAccess, SessionEvent::ProfileFailed),
            Transition::to(AuthRequired)
        );
    }

    #[test]
    fn test_profile_events_outside_validation_are_ignored() {
        assert_eq!(
            next_transition(AuthRequired, SessionEvent::ProfileAccepted),
            Transition::to(AuthRequired)
        );
        assert_eq!(
            next_transition(AuthSuccessful, SessionEvent::ProfileFailed),
            Transition::to(AuthSuccessful)
        );
    }

    #[test]
    fn test_logout_requires_auth() {
        assert_eq!(
            next_transition(AuthSuccessful, SessionEvent::Logout),
            Transition::to(AuthRequired)
        );
    }

    #[test]
    fn test_unauthorized_forces_navigation_once() {
        assert_eq!(
            next_transition(AuthSuccessful, SessionEvent::Unauthorized),
            Transition::with(
                AuthRequired,
                vec![Effect::NavigateToSignIn { forced: true }]
            )
        );
        assert_eq!(
            next_transition(AuthRequired, SessionEvent::Unauthorized),
            Transition::to(AuthRequired)
        );
    }
}
