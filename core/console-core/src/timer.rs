//! Cancellable one-shot timer for token refresh.
//!
//! At most one timer is armed at any instant: [`RefreshTimer::arm`] cancels the
//! previous handle before storing the new one, so callers never need a separate
//! cancel at each arming site.
//!
//! The timer does not sleep or spawn. A host either polls [`RefreshTimer::take_due`]
//! from its event loop, or schedules its own callback for [`RefreshTimer::deadline`]
//! and reports back with [`RefreshTimer::fire`]. Handles are generation-numbered,
//! so a callback belonging to a cancelled timer is recognized and dropped.

use chrono::{DateTime, Duration, Utc};

/// Upper bound on a single refresh delay. Longer server-reported lifetimes are
/// refreshed early rather than scheduled past what `chrono` can represent.
pub const MAX_REFRESH_DELAY_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy)]
struct Armed {
    handle: TimerHandle,
    deadline: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct RefreshTimer {
    next_id: u64,
    armed: Option<Armed>,
}

impl RefreshTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the timer `delay` after `now`, cancelling any armed timer first.
    /// Negative delays are clamped to zero.
    pub fn arm(&mut self, now: DateTime<Utc>, delay: Duration) -> TimerHandle {
        if let Some(previous) = self.cancel() {
            tracing::debug!(handle = previous.id(), "Cancelled refresh timer before re-arming");
        }

        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        let delay = delay.max(Duration::zero());
        let deadline = now
            .checked_add_signed(delay)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.armed = Some(Armed { handle, deadline });
        handle
    }

    /// Cancels the armed timer, returning its handle. No-op when nothing is armed.
    pub fn cancel(&mut self) -> Option<TimerHandle> {
        self.armed.take().map(|armed| armed.handle)
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn handle(&self) -> Option<TimerHandle> {
        self.armed.map(|armed| armed.handle)
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.armed.map(|armed| armed.deadline)
    }

    /// Disarms and returns the handle if the deadline has passed.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> Option<TimerHandle> {
        match self.armed {
            Some(armed) if armed.deadline <= now => {
                self.armed = None;
                Some(armed.handle)
            }
            _ => None,
        }
    }

    /// Consumes a fire notification from an external scheduler.
    ///
    /// Returns false for stale handles (the timer was cancelled or re-armed
    /// after the callback was scheduled).
    pub fn fire(&mut self, handle: TimerHandle) -> bool {
        match self.armed {
            Some(armed) if armed.handle == handle => {
                self.armed = None;
                true
            }
            _ => false,
        }
    }
}

/// Delay before the next refresh: the reported lifetime minus the safety
/// margin, floored at zero and capped at [`MAX_REFRESH_DELAY_SECS`].
pub fn refresh_delay(expiry_in_seconds: i64, margin_secs: i64) -> Duration {
    let secs = expiry_in_seconds
        .saturating_sub(margin_secs)
        .clamp(0, MAX_REFRESH_DELAY_SECS);
    Duration::seconds(secs)
}
