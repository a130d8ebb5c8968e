//! Session-token transport contract.
//!
//! The provider never talks to the network itself. It builds a
//! [`SessionTokenRequest`] and hands it to a [`SessionTokenClient`] together
//! with the master credentials. Retry and backoff, if wanted, belong in the
//! client implementation.

use crate::{MasterCredentials, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;

/// Parameters of a single session-token request.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionTokenRequest {
    /// Requested session lifetime in whole seconds
    pub duration_seconds: i64,
    /// MFA device serial, present only for MFA-protected profiles
    pub serial_number: Option<String>,
    /// One-time code, present exactly when `serial_number` is
    pub token_code: Option<String>,
}

impl SessionTokenRequest {
    /// Creates a request without MFA.
    pub fn new(duration_seconds: i64) -> Self {
        Self {
            duration_seconds,
            serial_number: None,
            token_code: None,
        }
    }

    /// Attaches an MFA device serial and one-time code.
    pub fn with_mfa(mut self, serial_number: impl Into<String>, token_code: impl Into<String>) -> Self {
        self.serial_number = Some(serial_number.into());
        self.token_code = Some(token_code.into());
        self
    }
}

impl fmt::Debug for SessionTokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTokenRequest")
            .field("duration_seconds", &self.duration_seconds)
            .field("serial_number", &self.serial_number)
            .field("token_code", &self.token_code.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Raw session returned by the token service.
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedSession {
    /// Access key id
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Session token
    pub session_token: String,
    /// When the session expires
    pub expiration: DateTime<Utc>,
}

impl fmt::Debug for IssuedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedSession")
            .field(
                "access_key_id",
                &crate::credential::mask_access_key(&self.access_key_id),
            )
            .field("expiration", &self.expiration)
            .finish_non_exhaustive()
    }
}

/// Client for the session-token issuing service.
///
/// # Implementations
///
/// - [`StsClient`](crate::backends::sts::StsClient) (feature `aws`)
/// - [`MockSessionTokenClient`](crate::backends::mock::MockSessionTokenClient) (feature `mock`)
#[async_trait]
pub trait SessionTokenClient: Send + Sync {
    /// Issues a new session, authenticating with `master`.
    ///
    /// # Errors
    ///
    /// Any service or transport failure. The provider returns it unchanged.
    async fn get_session_token(
        &self,
        request: &SessionTokenRequest,
        master: &MasterCredentials,
    ) -> Result<IssuedSession>;
}
