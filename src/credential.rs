//! Credential value types.

use chrono::{DateTime, Utc};
use std::fmt;

/// Number of trailing characters of an access key id left visible by
/// [`mask_access_key`].
const VISIBLE_KEY_CHARS: usize = 4;

/// Placeholder printed in place of secret material.
const REDACTED: &str = "<redacted>";

/// Short-lived credential returned by
/// [`SessionTokenProvider::retrieve`](crate::SessionTokenProvider::retrieve).
///
/// Values are immutable; each retrieval produces a new one. `Debug` output
/// never includes the secret key or session token, and masks the access key.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// Access key id
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Session token
    pub session_token: String,
    /// When the credential stops being accepted by the service
    pub expiration: DateTime<Utc>,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_key_id", &mask_access_key(&self.access_key_id))
            .field("secret_access_key", &REDACTED)
            .field("session_token", &REDACTED)
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Long-lived credential used to authenticate the session-token request.
///
/// Supplied by the caller; tokenmux never derives or refreshes it.
#[derive(Clone, PartialEq, Eq)]
pub struct MasterCredentials {
    /// Access key id
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Optional session token (when the master credential is itself temporary)
    pub session_token: Option<String>,
}

impl MasterCredentials {
    /// Creates master credentials from a static key pair.
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    /// Attaches a session token.
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }
}

impl fmt::Debug for MasterCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MasterCredentials")
            .field("access_key_id", &mask_access_key(&self.access_key_id))
            .field("secret_access_key", &REDACTED)
            .field("session_token", &self.session_token.as_ref().map(|_| REDACTED))
            .finish()
    }
}

/// Masks an access key id for display.
///
/// Only the last four characters are kept; everything before them is
/// replaced with `*`. Keys of four characters or fewer are masked entirely,
/// so the full identifier is never revealed.
///
/// # Example
///
/// ```
/// use tokenmux::credential::mask_access_key;
///
/// assert_eq!(mask_access_key("ASIAEXAMPLEKEY1234"), "**************1234");
/// assert_eq!(mask_access_key("ABCD"), "****");
/// ```
pub fn mask_access_key(key: &str) -> String {
    let len = key.chars().count();
    if len <= VISIBLE_KEY_CHARS {
        return "*".repeat(len);
    }

    let visible: String = key.chars().skip(len - VISIBLE_KEY_CHARS).collect();
    format!("{}{}", "*".repeat(len - VISIBLE_KEY_CHARS), visible)
}
