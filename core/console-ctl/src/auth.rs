//! Session subcommands: token adoption, status, watch and logout.

use std::thread;
use std::time::Duration;

use chrono::Utc;
use console_core::{SessionManager, SessionStatus};

use crate::context::Context;
use crate::CtlError;

/// Longest single sleep in `watch`, so a suspended machine catches up quickly.
const MAX_WATCH_SLEEP: Duration = Duration::from_secs(60);

pub fn adopt(ctx: &Context, token: &str) -> Result<(), CtlError> {
    let mut session = ctx.session(ctx.navigator("/")?);
    session.adopt_token(token)?;
    print_snapshot(&session)?;
    require_signed_in(&session)
}

pub fn status(ctx: &Context) -> Result<(), CtlError> {
    let mut session = ctx.session(ctx.navigator("/")?);
    session.start();
    print_snapshot(&session)?;
    require_signed_in(&session)
}

pub fn watch(ctx: &Context) -> Result<(), CtlError> {
    let mut session = ctx.session(ctx.navigator("/")?);
    session.start();
    require_signed_in(&session)?;

    tracing::info!("Watching session");
    while session.status() != SessionStatus::AuthRequired {
        let Some(deadline) = session.next_wakeup() else {
            tracing::warn!("No refresh scheduled; stopping");
            break;
        };
        let wait = (deadline - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO)
            .min(MAX_WATCH_SLEEP);
        thread::sleep(wait);
        if session.tick() {
            tracing::info!(status = ?session.status(), next = ?session.next_wakeup(), "Session refreshed");
        }
    }

    tracing::info!("Session ended");
    Ok(())
}

/// Remote failures are only logged; the local session always ends.
pub fn logout(ctx: &Context) -> Result<(), CtlError> {
    let mut session = ctx.session(ctx.navigator("/")?);
    session.logout();
    println!("Signed out");
    Ok(())
}

fn print_snapshot(session: &SessionManager) -> Result<(), CtlError> {
    println!("{}", serde_json::to_string_pretty(&session.snapshot())?);
    Ok(())
}

fn require_signed_in(session: &SessionManager) -> Result<(), CtlError> {
    match session.status() {
        SessionStatus::AuthSuccessful => Ok(()),
        status => Err(CtlError::NotSignedIn(status)),
    }
}
