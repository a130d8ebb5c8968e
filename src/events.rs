//! Structured events emitted by the provider.
//!
//! The provider reports what it did through an injected [`EventSink`]. The
//! default [`TracingSink`] forwards events to `tracing`; tests can swap in a
//! recording sink and assert on events directly.

use crate::session::SessionKey;
use std::time::Duration;

/// Something the provider did while serving a retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// A retrieval has started.
    RetrieveStarted {
        /// Cache key
        key: SessionKey,
    },

    /// A usable session was found in the cache.
    CacheHit {
        /// Cache key
        key: SessionKey,
    },

    /// The cache lookup failed; a new session will be requested.
    CacheMiss {
        /// Cache key
        key: SessionKey,
        /// Why the lookup failed
        reason: String,
    },

    /// A new session is being requested from the token service.
    SessionCreating {
        /// Profile the session is for
        profile_name: String,
        /// Whether an MFA code is attached
        mfa: bool,
    },

    /// Credentials are being handed back to the caller.
    CredentialsRetrieved {
        /// Access key id, masked for display
        masked_access_key: String,
        /// Time left until the credential's real expiration
        expires_in: Duration,
    },
}

/// Receives provider events.
pub trait EventSink: Send + Sync {
    /// Handles one event. Must not block for long.
    fn emit(&self, event: &ProviderEvent);
}

/// Forwards events to `tracing`.
///
/// Served credentials and new sessions are logged at `info`, the start of a
/// retrieval and cache activity at `debug`. Nothing is logged at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &ProviderEvent) {
        match event {
            ProviderEvent::RetrieveStarted { key } => {
                tracing::debug!(
                    profile = %key.profile_name,
                    "getting credentials with GetSessionToken"
                );
            }
            ProviderEvent::CacheHit { key } => {
                tracing::debug!(profile = %key.profile_name, "using cached session");
            }
            ProviderEvent::CacheMiss { key, reason } => {
                tracing::debug!(profile = %key.profile_name, %reason, "session lookup missed");
            }
            ProviderEvent::SessionCreating { profile_name, mfa } => {
                tracing::info!(profile = %profile_name, mfa, "creating new session token");
            }
            ProviderEvent::CredentialsRetrieved {
                masked_access_key,
                expires_in,
            } => {
                tracing::info!(
                    access_key = %masked_access_key,
                    expires_in_secs = expires_in.as_secs(),
                    "using session token {}, expires in {:?}",
                    masked_access_key,
                    expires_in
                );
            }
        }
    }
}
