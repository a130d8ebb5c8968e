//! Expiration bookkeeping for issued credentials.

use chrono::{DateTime, Duration, Utc};

/// Default safety margin subtracted from a credential's real expiration.
pub const DEFAULT_EXPIRATION_WINDOW: std::time::Duration = std::time::Duration::from_secs(5 * 60);

/// Tracks when the most recently issued credential should be refreshed.
///
/// The stored deadline is the credential's true expiration minus the refresh
/// window, so [`needs_refresh`](Expiry::needs_refresh) turns true slightly
/// before the credential actually stops working.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry {
    expires_at: Option<DateTime<Utc>>,
    refresh_window: Duration,
}

impl Default for Expiry {
    fn default() -> Self {
        Self {
            expires_at: None,
            refresh_window: Duration::zero(),
        }
    }
}

impl Expiry {
    /// Creates an expiry tracker with nothing recorded yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new deadline of `expiration - window`.
    ///
    /// Overwrites whatever was recorded before. A deadline that would fall
    /// before the earliest representable instant is clamped to it, which
    /// still reads as "needs refresh".
    pub fn set_expiration(&mut self, expiration: DateTime<Utc>, window: Duration) {
        self.refresh_window = window;
        self.expires_at = Some(
            expiration
                .checked_sub_signed(window)
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        );
    }

    /// Returns the recorded refresh deadline, if any.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns the window used for the last recorded deadline.
    pub fn refresh_window(&self) -> Duration {
        self.refresh_window
    }

    /// Returns `true` if a credential must be fetched at `now`.
    ///
    /// Nothing recorded yet counts as needing a refresh.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(deadline) => now >= deadline,
            None => true,
        }
    }

    /// Same as [`needs_refresh`](Expiry::needs_refresh) evaluated at the current time.
    pub fn is_expired(&self) -> bool {
        self.needs_refresh(Utc::now())
    }
}
