//! Error types for tokenmux operations.

use thiserror::Error;

/// Result type alias using [`TokenmuxError`].
pub type Result<T> = std::result::Result<T, TokenmuxError>;

/// Errors that can occur while obtaining or caching session credentials.
///
/// All errors implement `std::error::Error` and can be chained with `source()`.
///
/// Errors raised by collaborators (session cache, MFA code source, transport
/// client) are surfaced from
/// [`SessionTokenProvider::retrieve`](crate::SessionTokenProvider::retrieve)
/// exactly as the collaborator produced them. The one exception is a failed
/// cache lookup, which the provider treats as a miss.
#[derive(Debug, Error)]
pub enum TokenmuxError {
    /// No cached session exists for the key (or it has expired).
    #[error("session not found: {0}")]
    NotFound(String),

    /// The session cache could not be read or written.
    #[error("session cache unavailable: {0}")]
    CacheUnavailable(String),

    /// A one-time MFA code could not be obtained.
    #[error("MFA code unavailable: {0}")]
    MfaCodeUnavailable(String),

    /// A one-time MFA code was obtained but is malformed.
    #[error("invalid MFA code: {0}")]
    InvalidMfaCode(String),

    /// Profile name failed validation.
    #[error("invalid profile name: {0}")]
    InvalidProfileName(String),

    /// Provider configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The token service refused or failed to issue a session.
    #[error("session token issuance failed: {0}")]
    Issuance(String),

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error (catch-all).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TokenmuxError {
    /// Returns `true` if this error means "no cached session for this key".
    ///
    /// The provider does not rely on this distinction (every lookup failure is
    /// a miss), but cache implementations and callers can use it to tell an
    /// empty cache apart from a broken one.
    ///
    /// # Example
    ///
    /// ```
    /// use tokenmux::TokenmuxError;
    ///
    /// assert!(TokenmuxError::NotFound("default".to_string()).is_not_found());
    /// assert!(!TokenmuxError::CacheUnavailable("disk full".to_string()).is_not_found());
    /// ```
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
