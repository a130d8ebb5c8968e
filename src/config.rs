//! Configuration for session-token providers.

use crate::expiry::DEFAULT_EXPIRATION_WINDOW;
use crate::validation::validate_profile_name;
use crate::{Result, TokenmuxError};
use std::time::Duration;

/// Default lifetime requested for new session tokens (1 hour).
pub const DEFAULT_SESSION_DURATION: Duration = Duration::from_secs(3600);

/// Environment variable holding the session lifetime in seconds.
pub const ENV_SESSION_TTL: &str = "AWS_SESSION_TOKEN_TTL";

/// Environment variable holding the MFA device serial.
pub const ENV_MFA_SERIAL: &str = "AWS_MFA_SERIAL";

/// Environment variable holding the region used for the token service.
pub const ENV_REGION: &str = "AWS_REGION";

/// Configuration for a [`SessionTokenProvider`](crate::SessionTokenProvider).
///
/// Use the builder pattern for ergonomic configuration:
///
/// ```
/// use std::time::Duration;
/// use tokenmux::ProviderConfig;
///
/// let config = ProviderConfig::new("work")
///     .with_session_duration(Duration::from_secs(900))
///     .with_mfa_serial("arn:aws:iam::123456789012:mfa/alice")
///     .with_expiration_window(Duration::from_secs(60));
///
/// assert!(config.mfa_required());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Profile the credentials are issued for
    pub profile_name: String,

    /// Lifetime requested for new sessions (default: 1 hour)
    pub session_duration: Duration,

    /// MFA device serial; empty means MFA is not required
    pub mfa_serial: String,

    /// Margin subtracted from the real expiration (default: 5 minutes)
    pub expiration_window: Duration,

    /// Region for the token service, if not taken from the environment
    pub region: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            profile_name: "default".to_string(),
            session_duration: DEFAULT_SESSION_DURATION,
            mfa_serial: String::new(),
            expiration_window: DEFAULT_EXPIRATION_WINDOW,
            region: None,
        }
    }
}

impl ProviderConfig {
    /// Creates a configuration for the named profile with default settings.
    ///
    /// # Example
    ///
    /// ```
    /// use tokenmux::ProviderConfig;
    ///
    /// let config = ProviderConfig::new("work");
    /// assert_eq!(config.profile_name, "work");
    /// assert!(!config.mfa_required());
    /// ```
    pub fn new(profile_name: impl Into<String>) -> Self {
        Self {
            profile_name: profile_name.into(),
            ..Default::default()
        }
    }

    /// Builds a configuration for `profile_name`, overriding defaults from
    /// `AWS_SESSION_TOKEN_TTL` (seconds), `AWS_MFA_SERIAL` and `AWS_REGION`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenmuxError::InvalidConfig`] if the TTL variable is set but
    /// is not a whole number of seconds.
    pub fn from_env(profile_name: impl Into<String>) -> Result<Self> {
        let mut config = Self::new(profile_name);

        if let Ok(ttl) = std::env::var(ENV_SESSION_TTL) {
            let secs: u64 = ttl.trim().parse().map_err(|_| {
                TokenmuxError::InvalidConfig(format!(
                    "{} must be a number of seconds, got {:?}",
                    ENV_SESSION_TTL, ttl
                ))
            })?;
            config.session_duration = Duration::from_secs(secs);
        }

        if let Ok(serial) = std::env::var(ENV_MFA_SERIAL) {
            config.mfa_serial = serial;
        }

        if let Ok(region) = std::env::var(ENV_REGION) {
            config.region = Some(region);
        }

        Ok(config)
    }

    /// Sets the lifetime requested for new sessions.
    ///
    /// The token service enforces its own minimum and maximum; values outside
    /// its range are rejected at issuance time, not here.
    pub fn with_session_duration(mut self, duration: Duration) -> Self {
        self.session_duration = duration;
        self
    }

    /// Sets the MFA device serial. An empty string disables MFA.
    pub fn with_mfa_serial(mut self, serial: impl Into<String>) -> Self {
        self.mfa_serial = serial.into();
        self
    }

    /// Sets the refresh window subtracted from each credential's expiration.
    pub fn with_expiration_window(mut self, window: Duration) -> Self {
        self.expiration_window = window;
        self
    }

    /// Sets the token service region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Returns `true` if new sessions must carry an MFA code.
    pub fn mfa_required(&self) -> bool {
        !self.mfa_serial.is_empty()
    }

    /// Session duration in whole seconds, as sent to the token service.
    pub fn duration_seconds(&self) -> i64 {
        i64::try_from(self.session_duration.as_secs()).unwrap_or(i64::MAX)
    }

    /// Checks that the configuration can drive a provider.
    ///
    /// # Errors
    ///
    /// - [`TokenmuxError::InvalidProfileName`]: profile name fails validation
    /// - [`TokenmuxError::InvalidConfig`]: session duration is shorter than a
    ///   second, or the refresh window is not shorter than the session
    pub fn validate(&self) -> Result<()> {
        validate_profile_name(&self.profile_name)?;

        if self.session_duration.as_secs() == 0 {
            return Err(TokenmuxError::InvalidConfig(
                "session duration must be at least one second".to_string(),
            ));
        }

        if self.expiration_window >= self.session_duration {
            return Err(TokenmuxError::InvalidConfig(format!(
                "expiration window ({}s) must be shorter than the session duration ({}s)",
                self.expiration_window.as_secs(),
                self.session_duration.as_secs()
            )));
        }

        Ok(())
    }
}
